//! Builds an initial record set from a data file.

use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::domain::TVError;
use crate::record::{ColorTag, Column as TableColumn, ColumnKind, ID_FIELD, Record, Value};

#[derive(Debug, PartialEq)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

struct LoadedColumn {
    name: String,
    kind: ColumnKind,
    values: Vec<Option<Value>>,
}

impl LoadedColumn {
    /// Field key in the records. Headers keep their case only as titles.
    fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Records read from a file, with a column descriptor per file column.
#[derive(Debug)]
pub struct LoadedTable {
    pub name: String,
    pub records: Vec<Record>,
    pub columns: Vec<TableColumn>,
}

/// Expands `~` and environment variables in a user supplied path.
pub fn expand_path(path: &str) -> Result<PathBuf, TVError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| TVError::LoadingFailed(format!("cannot expand {path}: {e}")))
}

pub fn load_records(path: &Path) -> Result<LoadedTable, TVError> {
    let file_info = get_file_info(path.to_path_buf())?;
    debug!(
        "Loading {:?} ({} bytes, {:?})",
        file_info.path, file_info.file_size, file_info.file_type
    );
    let frame = match file_info.file_type {
        FileType::CSV => load_csv(&file_info.path)?,
        FileType::PARQUET => load_parquet(&file_info.path)?,
        FileType::ARROW => load_arrow(&file_info.path)?,
    };

    // Every column is converted in its own task.
    let start_time = Instant::now();
    let df = frame.collect()?;
    let loaded: Result<Vec<LoadedColumn>, _> = df
        .get_column_names()
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect();
    let loaded = loaded?;
    info!(
        "Converting {} columns took {}ms",
        loaded.len(),
        start_time.elapsed().as_millis()
    );

    let name = file_info
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();
    let (records, columns) = build_records(loaded)?;
    Ok(LoadedTable {
        name,
        records,
        columns,
    })
}

fn build_records(loaded: Vec<LoadedColumn>) -> Result<(Vec<Record>, Vec<TableColumn>), TVError> {
    let id_idx = loaded
        .iter()
        .position(|c| c.name.eq_ignore_ascii_case(ID_FIELD))
        .ok_or_else(|| TVError::LoadingFailed("data has no \"id\" column".into()))?;
    let nrows = loaded[id_idx].values.len();

    let mut records = Vec::with_capacity(nrows);
    for row in 0..nrows {
        let id = match &loaded[id_idx].values[row] {
            Some(Value::Number(n)) if n.fract() == 0.0 => format!("{n:.0}"),
            Some(v) => v.to_string(),
            None => return Err(TVError::LoadingFailed(format!("row {} has no id", row + 1))),
        };
        let mut record = Record::new(id);
        for (cidx, column) in loaded.iter().enumerate() {
            if cidx == id_idx {
                continue;
            }
            if let Some(value) = &column.values[row] {
                record = record.with(column.key(), value.clone());
            }
        }
        records.push(record);
    }

    let mut columns = vec![TableColumn::new(ID_FIELD, "ID", ColumnKind::Text)];
    columns.extend(
        loaded
            .iter()
            .enumerate()
            .filter(|(cidx, _)| *cidx != id_idx)
            .map(|(_, c)| TableColumn::new(c.key(), c.name.clone(), c.kind)),
    );
    Ok((records, columns))
}

fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<LoadedColumn, PolarsError> {
    let column = df.column(col_name)?;

    if is_numeric_type(column.dtype()) && !col_name.eq_ignore_ascii_case(ID_FIELD) {
        let col = column.cast(&DataType::Float64)?;
        let values = col.f64()?.into_iter().map(|v| v.map(Value::Number)).collect();
        return Ok(LoadedColumn {
            name: col_name.to_string(),
            kind: ColumnKind::Number,
            values,
        });
    }

    let col = column.cast(&DataType::String)?;
    let series = col.str()?;
    let texts: Vec<Option<String>> = series
        .into_iter()
        .map(|v| v.map(|s| s.replace("\r\n", " ↵ ").replace('\n', " ↵ ")))
        .collect();

    // A color column only stays a color column if every value parses.
    if col_name.eq_ignore_ascii_case("color")
        && texts.iter().flatten().all(|s| ColorTag::parse(s).is_some())
    {
        let values = texts
            .iter()
            .map(|v| v.as_deref().and_then(ColorTag::parse).map(Value::Color))
            .collect();
        return Ok(LoadedColumn {
            name: col_name.to_string(),
            kind: ColumnKind::Color,
            values,
        });
    }

    Ok(LoadedColumn {
        name: col_name.to_string(),
        kind: ColumnKind::Text,
        values: texts.into_iter().map(|v| v.map(Value::Text)).collect(),
    })
}

fn detect_file_type(path: &Path) -> Result<FileType, TVError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        _ => Err(TVError::UnknownFileType),
    }
}

fn get_file_info(path: PathBuf) -> Result<FileInfo, TVError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TVError::FileNotFound,
        ErrorKind::PermissionDenied => TVError::PermissionDenied,
        _ => TVError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(TVError::LoadingFailed("Not a file!".into()));
    }

    let file_size = metadata.len();
    let file_type = detect_file_type(&path)?;

    Ok(FileInfo {
        path,
        file_size,
        file_type,
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

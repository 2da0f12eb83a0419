use std::fmt;
use std::io::Error;
use std::path::PathBuf;

use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

use crate::display::{DisplayOptions, SelectionMode};

/// Errors reported by table state operations. None of them are fatal and a
/// failed operation leaves the state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    NotFound(String),
    IndexOutOfRange { index: usize, len: usize },
    DuplicateId(String),
    ImmutableField(String),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::NotFound(id) => write!(f, "no record with id \"{id}\""),
            TableError::IndexOutOfRange { index, len } => {
                write!(f, "index {index} is out of range for {len} rows")
            }
            TableError::DuplicateId(id) => write!(f, "a record with id \"{id}\" already exists"),
            TableError::ImmutableField(field) => write!(f, "field \"{field}\" cannot be changed"),
        }
    }
}

impl std::error::Error for TableError {}

// Application level errors.
#[derive(Debug)]
pub enum TVError {
    IoError(Error),
    PolarsError(PolarsError),
    TableError(TableError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl fmt::Display for TVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TVError::IoError(e) => write!(f, "io error: {e}"),
            TVError::PolarsError(e) => write!(f, "could not read data: {e}"),
            TVError::TableError(e) => write!(f, "{e}"),
            TVError::LoadingFailed(reason) => write!(f, "loading failed: {reason}"),
            TVError::FileNotFound => f.write_str("file not found"),
            TVError::PermissionDenied => f.write_str("permission denied"),
            TVError::UnknownFileType => f.write_str("unknown file type"),
        }
    }
}

impl std::error::Error for TVError {}

impl From<Error> for TVError {
    fn from(err: Error) -> Self {
        TVError::IoError(err)
    }
}

impl From<PolarsError> for TVError {
    fn from(err: PolarsError) -> Self {
        TVError::PolarsError(err)
    }
}

impl From<TableError> for TVError {
    fn from(err: TableError) -> Self {
        TVError::TableError(err)
    }
}

#[derive(Debug, Clone)]
pub struct TVConfig {
    pub event_poll_time: u64,
    pub data_file: Option<PathBuf>,
    pub display: DisplayOptions,
    pub selection: Option<SelectionMode>,
    pub read_only: bool,
}

impl Default for TVConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            data_file: None,
            display: DisplayOptions::default(),
            selection: Some(SelectionMode::Single),
            read_only: false,
        }
    }
}

/// What the cell editor is editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    pub id: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MoveBeginning,
    MoveEnd,
    SortCurrentColumn,
    SortColumn(usize),
    ResetOrder,
    Select,
    ClearSelection,
    MoveRowUp,
    MoveRowDown,
    Edit,
    Delete,
    Add,
    CopySelection,
    ToggleColorize,
    ToggleHeader,
    ToggleFooter,
    CycleLayout,
    CycleSelectionMode,
    Help,
    Exit,
    Resize(usize, usize),
    Hover(u16, u16),
    Click(u16, u16),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
 q        quit
 ↑ ↓ j k  move cursor
 ← → h l  change column
 g G      first / last row
 s        sort by current column
 1..9     sort by column
 r        reset to insertion order
 space    select / toggle row
 Esc      clear selection, close popup
 J K      move row down / up
 e        edit cell
 d        delete row
 a        add a missing fruit
 y        copy selected rows
 c        toggle colorize
 t        toggle header
 f        toggle footer
 L        cycle layout
 m        cycle selection mode
 ?        this help";

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Name of the pseudo-field that reads a record's identifier.
pub const ID_FIELD: &str = "id";

/// Named display colors a record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColorTag {
    Black,
    Blue,
    Brown,
    Gray,
    Green,
    Orange,
    Pink,
    Purple,
    Red,
    White,
    Yellow,
}

impl ColorTag {
    pub const ALL: [ColorTag; 11] = [
        ColorTag::Black,
        ColorTag::Blue,
        ColorTag::Brown,
        ColorTag::Gray,
        ColorTag::Green,
        ColorTag::Orange,
        ColorTag::Pink,
        ColorTag::Purple,
        ColorTag::Red,
        ColorTag::White,
        ColorTag::Yellow,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColorTag::Black => "black",
            ColorTag::Blue => "blue",
            ColorTag::Brown => "brown",
            ColorTag::Gray => "gray",
            ColorTag::Green => "green",
            ColorTag::Orange => "orange",
            ColorTag::Pink => "pink",
            ColorTag::Purple => "purple",
            ColorTag::Red => "red",
            ColorTag::White => "white",
            ColorTag::Yellow => "yellow",
        }
    }

    /// Case-insensitive lookup by name. "grey" is accepted as well.
    pub fn parse(name: &str) -> Option<ColorTag> {
        let lowered = name.trim().to_lowercase();
        if lowered == "grey" {
            return Some(ColorTag::Gray);
        }
        ColorTag::ALL.into_iter().find(|c| c.name() == lowered)
    }
}

impl fmt::Display for ColorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Color(ColorTag),
}

impl Value {
    fn kind_rank(&self) -> u8 {
        match self {
            Value::Number(_) => 0,
            Value::Text(_) => 1,
            Value::Color(_) => 2,
        }
    }

    /// Natural total order: numbers, then text, then colors.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Color(a), Value::Color(b)) => a.name().cmp(b.name()),
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<ColorTag> {
        match self {
            Value::Color(c) => Some(*c),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{n}"),
            Value::Color(c) => write!(f, "{c}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<ColorTag> for Value {
    fn from(c: ColorTag) -> Self {
        Value::Color(c)
    }
}

/// One row of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder style field assignment.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Reads a field. The id is exposed as a text value under `"id"`.
    pub fn get(&self, field: &str) -> Option<Value> {
        if field == ID_FIELD {
            return Some(Value::Text(self.id.clone()));
        }
        self.fields.get(field).cloned()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    /// Compares two records on one field. Missing values sort last.
    pub fn cmp_field(&self, other: &Record, field: &str) -> Ordering {
        match (self.get(field), other.get(field)) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
    Color,
}

/// Describes one rendered column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub key: String,
    pub title: String,
    pub kind: ColumnKind,
    pub sortable: bool,
    pub suffix: Option<String>,
}

impl Column {
    pub fn new(key: impl Into<String>, title: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            kind,
            sortable: kind != ColumnKind::Color,
            suffix: None,
        }
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// Renders the cell of `record` for this column.
    pub fn format(&self, record: &Record) -> String {
        match record.get(&self.key) {
            None => String::from("∅"),
            Some(Value::Number(n)) => match &self.suffix {
                Some(s) => format!("{n:.0} {s}"),
                None if n.fract() == 0.0 => format!("{n:.0}"),
                None => format!("{n}"),
            },
            Some(v) => v.to_string(),
        }
    }

    /// Parses user input into a value of this column's kind.
    pub fn parse(&self, input: &str) -> Option<Value> {
        let input = input.trim();
        match self.kind {
            ColumnKind::Text => Some(Value::Text(input.to_string())),
            ColumnKind::Number => {
                let digits = match &self.suffix {
                    Some(s) => input.strip_suffix(s.as_str()).unwrap_or(input).trim(),
                    None => input,
                };
                digits.parse::<f64>().ok().map(Value::Number)
            }
            ColumnKind::Color => ColorTag::parse(input).map(Value::Color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_order_within_and_across_kinds() {
        assert_eq!(Value::Number(2.0).total_cmp(&Value::Number(10.0)), Ordering::Less);
        assert_eq!(Value::from("b").total_cmp(&Value::from("a")), Ordering::Greater);
        assert_eq!(Value::Number(99.0).total_cmp(&Value::from("a")), Ordering::Less);
        assert_eq!(
            Value::Color(ColorTag::Red).total_cmp(&Value::Color(ColorTag::Blue)),
            Ordering::Greater
        );
    }

    #[test]
    fn missing_fields_sort_last() {
        let a = Record::new("a").with("weight", 3.0);
        let b = Record::new("b");
        assert_eq!(a.cmp_field(&b, "weight"), Ordering::Less);
        assert_eq!(b.cmp_field(&a, "weight"), Ordering::Greater);
        assert_eq!(b.cmp_field(&b, "weight"), Ordering::Equal);
    }

    #[test]
    fn id_is_readable_as_a_field() {
        let r = Record::new("🍌").with("name", "Banana");
        assert_eq!(r.get(ID_FIELD), Some(Value::from("🍌")));
        assert_eq!(r.get("name"), Some(Value::from("Banana")));
        assert_eq!(r.get("weight"), None);
    }

    #[test]
    fn color_names_parse_case_insensitively() {
        assert_eq!(ColorTag::parse("Brown"), Some(ColorTag::Brown));
        assert_eq!(ColorTag::parse(" grey "), Some(ColorTag::Gray));
        assert_eq!(ColorTag::parse("mauve"), None);
    }

    #[test]
    fn column_formats_and_parses_with_suffix() {
        let col = Column::new("weight", "Weight", ColumnKind::Number).suffix("g");
        let r = Record::new("🍌").with("weight", 118.0);
        assert_eq!(col.format(&r), "118 g");
        assert_eq!(col.parse("120 g"), Some(Value::Number(120.0)));
        assert_eq!(col.parse("12"), Some(Value::Number(12.0)));
        assert_eq!(col.parse("heavy"), None);
        assert_eq!(col.format(&Record::new("x")), "∅");
    }
}

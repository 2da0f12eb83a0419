use crate::record::{ColorTag, Column, ColumnKind, Record};

pub fn fruit(id: &str, name: &str, weight: f64, color: ColorTag) -> Record {
    Record::new(id)
        .with("name", name)
        .with("weight", weight)
        .with("color", color)
}

/// The demo fruit basket.
pub fn bootstrap() -> Vec<Record> {
    vec![
        fruit("🍌", "Banana", 118.0, ColorTag::Brown),
        fruit("🍓", "Strawberry", 12.0, ColorTag::Red),
        fruit("🍊", "Orange", 190.0, ColorTag::Orange),
        fruit("🥝", "Kiwi", 75.0, ColorTag::Green),
        fruit("🍇", "Grape", 7.0, ColorTag::Purple),
        fruit("🫐", "Blueberry", 2.0, ColorTag::Blue),
    ]
}

pub fn columns() -> Vec<Column> {
    vec![
        Column::new("id", "ID", ColumnKind::Text),
        Column::new("name", "Name", ColumnKind::Text),
        Column::new("weight", "Weight", ColumnKind::Number).suffix("g"),
        Column::new("color", "Color", ColumnKind::Color),
    ]
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single cell: either text, written as given, or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Whole numbers are written without a fractional part, like they are typed
            CellValue::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => {
                write!(formatter, "{number:.0}")
            }
            CellValue::Number(number) => write!(formatter, "{number}"),
            CellValue::Text(text) => write!(formatter, "{text}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Number(f64::from(value))
    }
}

/// One row of tabular data: values looked up by their data key. The keys keep the order
/// in which they were inserted, which decides the column order of spreadsheet exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Row(Vec<(String, CellValue)>);

impl Row {
    pub fn new() -> Self {
        Row(Vec::new())
    }

    /// Returns the row with the value set under the key.
    pub fn with<K: Into<String>, V: Into<CellValue>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets the value under the key, keeping the position of a key which was already present.
    pub fn insert<K: Into<String>, V: Into<CellValue>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing_key, _)| *existing_key == key) {
            Some((_, existing_value)) => *existing_value = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.0
            .iter()
            .find(|(existing_key, _)| existing_key == key)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iterator: I) -> Self {
        let mut row = Row::new();
        for (key, value) in iterator {
            row.insert(key, value);
        }
        row
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    // A null is treated the same as an absent key
                    Value::Null => return None,
                    Value::Number(number) => match number.as_f64() {
                        Some(number) => CellValue::Number(number),
                        None => CellValue::Text(number.to_string()),
                    },
                    Value::String(text) => CellValue::Text(text),
                    other => CellValue::Text(other.to_string()),
                };
                Some((key, value))
            })
            .collect()
    }
}

impl From<Row> for Map<String, Value> {
    fn from(row: Row) -> Self {
        row.0
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    CellValue::Number(number) => Value::from(number),
                    CellValue::Text(text) => Value::String(text),
                };
                (key, value)
            })
            .collect()
    }
}

/// A column of a table: its header label, the key its values are looked up by and,
/// optionally, a fixed width in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    pub header: String,
    pub data_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
}

impl TableColumn {
    pub fn new<H: Into<String>, K: Into<String>>(header: H, data_key: K) -> Self {
        TableColumn {
            header: header.into(),
            data_key: data_key.into(),
            width: None,
        }
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }
}

/// Columns and rows of a table. The column order decides the order cells are laid out
/// in, whatever the order of the keys inside the rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    pub columns: Vec<TableColumn>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl TableSpec {
    pub fn new(columns: Vec<TableColumn>, rows: Vec<Row>) -> Self {
        TableSpec { columns, rows }
    }

    /// The text of the cell of the row in the column, empty when the row has no such key.
    pub fn cell_text(&self, row: &Row, column: &TableColumn) -> String {
        row.get(&column.data_key)
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// The header labels, in column order.
    pub fn headers(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|column| column.header.as_str())
            .collect()
    }

    /// The texts of every row, in column order.
    pub fn row_texts(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| self.cell_text(row, column))
                    .collect()
            })
            .collect()
    }
}

/// A titled table, the unit report templates are made of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTable {
    pub title: String,
    pub columns: Vec<TableColumn>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl ReportTable {
    pub fn new<T: Into<String>>(title: T, columns: Vec<TableColumn>, rows: Vec<Row>) -> Self {
        ReportTable {
            title: title.into(),
            columns,
            rows,
        }
    }

    pub fn to_spec(&self) -> TableSpec {
        TableSpec::new(self.columns.clone(), self.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_keep_the_insertion_order_of_their_keys() {
        let row: Row = serde_json::from_str(
            r#"{ "Reference": "FX-0042", "Amount": 1250000, "Rate": 1547.25, "Desk": null }"#,
        )
        .unwrap();
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["Reference", "Amount", "Rate"]);
        assert_eq!(row.get("Amount"), Some(&CellValue::Number(1250000.0)));
        assert_eq!(row.get("Desk"), None);

        let serialized = serde_json::to_string(&row).unwrap();
        assert_eq!(
            serialized,
            r#"{"Reference":"FX-0042","Amount":1250000.0,"Rate":1547.25}"#
        );
    }

    #[test]
    fn inserting_an_existing_key_keeps_its_position() {
        let row = Row::new().with("a", 1.0).with("b", "x").with("a", "replaced");
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&CellValue::from("replaced")));
    }

    #[test]
    fn cells_follow_the_column_order_and_missing_keys_are_empty() {
        let table = TableSpec::new(
            vec![
                TableColumn::new("A", "a"),
                TableColumn::new("B", "b"),
                TableColumn::new("C", "c"),
            ],
            vec![
                Row::new().with("c", "3").with("a", "1").with("b", "2"),
                Row::new().with("b", 2.5),
            ],
        );
        assert_eq!(table.headers(), vec!["A", "B", "C"]);
        assert_eq!(
            table.row_texts(),
            vec![
                vec!["1".to_string(), "2".to_string(), "3".to_string()],
                vec![String::new(), "2.5".to_string(), String::new()],
            ]
        );
    }

    #[test]
    fn whole_numbers_are_displayed_without_fraction() {
        assert_eq!(CellValue::Number(42.0).to_string(), "42");
        assert_eq!(CellValue::Number(-0.5).to_string(), "-0.5");
        assert_eq!(CellValue::from("1,200").to_string(), "1,200");
    }
}

use crate::errors::{JaxpError, Result};
use crate::types::{Column, ColumnKey, Value};
use ahash::AHashMap;

/// One record: value-carrying columns, addressable by position and by name.
#[derive(Debug, Clone, Default)]
pub struct Row {
    columns: Vec<Column>,
    positions: AHashMap<String, usize>,
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<Column>) -> Self {
        let mut row = Self::new();
        for column in columns {
            row.push(column);
        }
        row
    }

    /// Appends a column. A later column with a repeated name takes over the
    /// name lookup; both stay reachable by position.
    pub fn push(&mut self, column: Column) {
        self.positions.insert(column.name.clone(), self.columns.len());
        self.columns.push(column);
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn position<'a>(&self, key: impl Into<ColumnKey<'a>>) -> Option<usize> {
        match key.into() {
            ColumnKey::Index(i) if i < self.columns.len() => Some(i),
            ColumnKey::Index(_) => None,
            ColumnKey::Name(name) => self.positions.get(name).copied(),
        }
    }

    pub fn column<'a>(&self, key: impl Into<ColumnKey<'a>>) -> Option<&Column> {
        self.position(key).map(|i| &self.columns[i])
    }

    pub fn column_mut<'a>(&mut self, key: impl Into<ColumnKey<'a>>) -> Option<&mut Column> {
        self.position(key).map(move |i| &mut self.columns[i])
    }

    /// Value of a column; `None` when the column is missing or has no value.
    pub fn get_column_value<'a>(&self, key: impl Into<ColumnKey<'a>>) -> Option<&Value> {
        self.column(key).and_then(|c| c.value.as_ref())
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let column = self
            .column_mut(name)
            .ok_or_else(|| JaxpError::column_not_found(name))?;
        column.value = Some(value.into());
        Ok(())
    }

    /// Values in column order. With `quote_check`, values of quoted types
    /// come back as ready-made `'...'` text literals.
    pub fn get_column_values(&self, quote_check: bool) -> Vec<Value> {
        self.columns
            .iter()
            .map(|c| {
                let value = c.value.clone().unwrap_or(Value::Null);
                if quote_check && c.has_quotes() {
                    Value::Text(value.to_literal(true))
                } else {
                    value
                }
            })
            .collect()
    }

    pub fn get_column_names(&self, exclude_auto_increment: bool) -> Vec<String> {
        column_names(&self.columns, exclude_auto_increment)
    }

    pub fn clear_values(&mut self) {
        for column in &mut self.columns {
            column.value = None;
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let object = self
            .columns
            .iter()
            .map(|c| {
                let value = c.value.as_ref().map(Value::to_json).unwrap_or(serde_json::Value::Null);
                (c.name.clone(), value)
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(object)
    }
}

/// Unique column names in order of first appearance. Excluding auto
/// increment drops the columns flagged as primary key.
pub(crate) fn column_names(columns: &[Column], exclude_auto_increment: bool) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for column in columns {
        if names.iter().any(|n| n == &column.name) {
            continue;
        }
        if exclude_auto_increment && column.is_primary_key() {
            continue;
        }
        names.push(column.name.clone());
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnType;

    fn sample_row() -> Row {
        Row::from_columns(vec![
            Column::with_type("id", ColumnType::Numeric)
                .with_flags("primary_key")
                .with_value(7),
            Column::with_type("title", ColumnType::String).with_value("Alpha"),
            Column::with_type("views", ColumnType::Numeric),
        ])
    }

    #[test]
    fn test_access_by_name_and_position() {
        let row = sample_row();
        assert_eq!(row.get_column_value(1usize), Some(&Value::from("Alpha")));
        assert_eq!(row.get_column_value("title"), Some(&Value::from("Alpha")));
        assert_eq!(row.get_column_value("views"), None);
        assert_eq!(row.get_column_value(9usize), None);
        assert_eq!(row.get_column_value("missing"), None);
    }

    #[test]
    fn test_column_names_exclude_primary_key() {
        let row = sample_row();
        assert_eq!(row.get_column_names(false), vec!["id", "title", "views"]);
        assert_eq!(row.get_column_names(true), vec!["title", "views"]);
    }

    #[test]
    fn test_column_names_are_unique() {
        let mut row = sample_row();
        row.push(Column::with_type("title", ColumnType::String).with_value("Again"));
        assert_eq!(row.get_column_names(false), vec!["id", "title", "views"]);
        // later duplicate wins the name lookup
        assert_eq!(row.get_column_value("title"), Some(&Value::from("Again")));
        assert_eq!(row.get_column_value(1usize), Some(&Value::from("Alpha")));
    }

    #[test]
    fn test_column_values_with_quote_check() {
        let row = sample_row();
        assert_eq!(
            row.get_column_values(false),
            vec![Value::from(7), Value::from("Alpha"), Value::Null]
        );
        assert_eq!(
            row.get_column_values(true),
            vec![Value::from(7), Value::from("'Alpha'"), Value::Null]
        );
    }

    #[test]
    fn test_set_value_and_clear() {
        let mut row = sample_row();
        row.set_value("views", 12).unwrap();
        assert_eq!(row.get_column_value("views"), Some(&Value::from(12)));
        assert!(matches!(
            row.set_value("nope", 1),
            Err(JaxpError::ColumnNotFound(_))
        ));

        row.clear_values();
        assert!(row.columns().iter().all(|c| c.value.is_none()));
    }

    #[test]
    fn test_to_json() {
        let json = sample_row().to_json();
        assert_eq!(json["id"], 7);
        assert_eq!(json["title"], "Alpha");
        assert!(json["views"].is_null());
    }
}

use crate::errors::{JaxpError, Result};
use crate::row::{column_names, Row};
use crate::store::Store;
use crate::types::{Column, ColumnKey, Value};
use log::warn;

/// Schema columns plus the rows loaded for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub name: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn with_schema(name: &str, columns: Vec<Column>) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(Column::to_schema).collect(),
            rows: Vec::new(),
        }
    }

    /// Runs `query` (default `SELECT * FROM <name>`) and replaces schema and
    /// rows with its result. Statements that produce no rows, and failed
    /// statements, leave the table empty. Returns whether a result set was
    /// loaded.
    pub fn load(&mut self, store: &mut dyn Store, query: Option<&str>) -> bool {
        let default_query;
        let sql = match query {
            Some(q) if !q.trim().is_empty() => q,
            _ => {
                default_query = format!("SELECT * FROM {}", self.name);
                default_query.as_str()
            }
        };

        self.columns.clear();
        self.rows.clear();

        let result = match store.query(sql) {
            Ok(Some(result)) => result,
            Ok(None) => return false,
            Err(e) => {
                warn!("loading table '{}' failed: {}", self.name, e);
                return false;
            }
        };

        self.columns = result
            .fields
            .iter()
            .map(|f| Column::new(&f.name, &f.type_name, &f.flags))
            .collect();

        for cells in result.rows {
            let row = self
                .columns
                .iter()
                .zip(cells)
                .map(|(schema, cell)| Column {
                    value: Some(cell),
                    ..schema.clone()
                })
                .collect();
            self.rows.push(Row::from_columns(row));
        }
        true
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row. Its column names must line up with the schema; a table
    /// without schema adopts the row's.
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if self.columns.is_empty() {
            self.columns = row.columns().iter().map(Column::to_schema).collect();
        } else if row.get_column_names(false) != self.get_column_names(false)
            || row.len() != self.columns.len()
        {
            return Err(JaxpError::InvalidArgument(format!(
                "row does not match the schema of table '{}'",
                self.name
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Row with every schema column and no values.
    pub fn blank_row(&self) -> Row {
        Row::from_columns(self.columns.iter().map(Column::to_schema).collect())
    }

    pub fn get_value<'a>(&self, row_index: usize, key: impl Into<ColumnKey<'a>>) -> Result<Option<&Value>> {
        let row = self
            .rows
            .get(row_index)
            .ok_or_else(|| JaxpError::row_index(row_index, self.rows.len()))?;
        let key = key.into();
        let column = row.column(key).ok_or_else(|| match key {
            ColumnKey::Index(i) => JaxpError::column_index(i, row.len()),
            ColumnKey::Name(name) => JaxpError::column_not_found(name),
        })?;
        Ok(column.value.as_ref())
    }

    pub fn get_column_names(&self, exclude_auto_increment: bool) -> Vec<String> {
        column_names(&self.columns, exclude_auto_increment)
    }

    /// Rows ordered by `column`, without touching the table's own order.
    /// The sort is stable in both directions. Nulls come first, then
    /// numbers, then text.
    pub fn sort_by(&self, column: &str, reverse: bool) -> Vec<&Row> {
        let mut sorted: Vec<&Row> = self.rows.iter().collect();
        sorted.sort_by(|a, b| {
            let left = a.get_column_value(column).unwrap_or(&Value::Null);
            let right = b.get_column_value(column).unwrap_or(&Value::Null);
            let ordering = left.total_cmp(right);
            if reverse {
                ordering.reverse()
            } else {
                ordering
            }
        });
        sorted
    }

    /// Positional projection: one vector of cells per row.
    pub fn to_cells(&self) -> Vec<Vec<Option<Value>>> {
        self.rows
            .iter()
            .map(|r| r.columns().iter().map(|c| c.value.clone()).collect())
            .collect()
    }

    /// Keyed projection: one JSON object per row.
    pub fn to_json_rows(&self) -> serde_json::Value {
        serde_json::Value::Array(self.rows.iter().map(Row::to_json).collect())
    }
}

//! Statement façade over a [`Store`].
//!
//! Store failures never surface as errors here: they are logged and read as
//! zero affected rows or an empty result. The only error a statement
//! operation returns is [`JaxpError::NotConnected`].

use crate::conditions::{BoolOperator, Conditions};
use crate::database::Database;
use crate::errors::{JaxpError, Result};
use crate::row::Row;
use crate::settings::Settings;
use crate::store::{ConnectionSettings, SqliteStore, Store};
use crate::table::Table;
use crate::types::Value;
use log::{debug, info, warn};

/// Name given to tables built from [`Handler::select`].
pub const QUERY_RESULTS: &str = "QueryResults";
/// Name given to tables built from [`Handler::filter`].
pub const FILTER_RESULTS: &str = "FilterResults";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFormat {
    #[default]
    Table,
    Array,
}

/// Output of [`Handler::select`].
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Table(Table),
    Cells(Vec<Vec<Option<Value>>>),
}

impl Selection {
    pub fn len(&self) -> usize {
        match self {
            Selection::Table(table) => table.row_count(),
            Selection::Cells(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_table(self) -> Option<Table> {
        match self {
            Selection::Table(table) => Some(table),
            Selection::Cells(_) => None,
        }
    }
}

/// Output of [`Handler::filter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Filtered {
    Table(Table),
    Rows(Vec<Row>),
}

impl Filtered {
    pub fn rows(&self) -> &[Row] {
        match self {
            Filtered::Table(table) => table.rows(),
            Filtered::Rows(rows) => rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerOptions {
    /// `update` leaves out columns whose value is null, zero, `""` or `"0"`.
    /// Columns without any value are always left out.
    pub skip_empty_values: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            skip_empty_values: true,
        }
    }
}

pub struct Handler<S: Store = SqliteStore> {
    pub connection_settings: ConnectionSettings,
    options: HandlerOptions,
    store: Option<S>,
    database: Option<Database>,
}

impl<S: Store> Handler<S> {
    pub fn new(connection_settings: ConnectionSettings) -> Self {
        Self::with_options(connection_settings, HandlerOptions::default())
    }

    pub fn with_options(connection_settings: ConnectionSettings, options: HandlerOptions) -> Self {
        Self {
            connection_settings,
            options,
            store: None,
            database: None,
        }
    }

    /// Connects with the configured credentials and selects the configured
    /// database, when one is set.
    pub fn open(settings: &Settings) -> Result<Self> {
        let mut handler = Self::new(settings.connection_settings());
        handler.connect()?;
        if let Some(name) = settings.store.database.as_deref() {
            handler.select_database(name)?;
        }
        Ok(handler)
    }

    pub fn options(&self) -> HandlerOptions {
        self.options
    }

    pub fn connect(&mut self) -> Result<()> {
        let store = S::connect(&self.connection_settings)
            .map_err(|e| JaxpError::Connection(e.to_string()))?;
        info!("connected to {}", self.connection_settings.server);
        self.store = Some(store);
        self.database = None;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_some() && self.database.is_some()
    }

    pub fn select_database(&mut self, name: &str) -> Result<()> {
        let store = self.store.as_mut().ok_or(JaxpError::NotConnected)?;
        store
            .select_database(name)
            .map_err(|e| JaxpError::Connection(e.to_string()))?;
        self.database = Some(Database::new(name));
        Ok(())
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    pub fn store(&self) -> Option<&S> {
        self.store.as_ref()
    }

    fn ready(&mut self) -> Result<(&mut S, &mut Database)> {
        match (self.store.as_mut(), self.database.as_mut()) {
            (Some(store), Some(database)) => Ok((store, database)),
            _ => Err(JaxpError::NotConnected),
        }
    }

    /// Runs a statement; `None` when the store rejected it.
    fn run(&mut self, sql: &str) -> Result<Option<u64>> {
        let (store, _) = self.ready()?;
        match store.execute(sql) {
            Ok(affected) => Ok(Some(affected)),
            Err(e) => {
                warn!("statement failed: {} ({})", sql, e);
                Ok(None)
            }
        }
    }

    pub fn load_table(&mut self, name: &str) -> Result<&Table> {
        let (store, database) = self.ready()?;
        Ok(database.load_table(store, name))
    }

    pub fn reload_table(&mut self, name: &str) -> Result<&Table> {
        let (store, database) = self.ready()?;
        Ok(database.reload_table(store, name))
    }

    pub fn load_all_tables(&mut self) -> Result<usize> {
        let (store, database) = self.ready()?;
        Ok(database.load_all_tables(store))
    }

    /// Runs any statement and returns the affected row count.
    pub fn execute(&mut self, sql: &str) -> Result<u64> {
        Ok(self.run(sql)?.unwrap_or(0))
    }

    pub fn select(&mut self, sql: &str, format: ResultFormat) -> Result<Selection> {
        let (store, _) = self.ready()?;
        let mut table = Table::new(QUERY_RESULTS);
        table.load(store, Some(sql));
        Ok(match format {
            ResultFormat::Table => Selection::Table(table),
            ResultFormat::Array => Selection::Cells(table.to_cells()),
        })
    }

    pub fn query(&mut self, sql: &str, format: ResultFormat) -> Result<Selection> {
        self.select(sql, format)
    }

    /// Inserts `row` into `table`, leaving out primary-key columns. Returns
    /// the generated id (0 when the insert failed), or -1 when
    /// `return_insert_id` is false.
    pub fn insert(&mut self, row: &Row, table: &Table, return_insert_id: bool) -> Result<i64> {
        let names = row.get_column_names(true);
        let values: Vec<String> = names
            .iter()
            .filter_map(|name| row.column(name.as_str()))
            .map(|column| column.literal())
            .collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name,
            names.join(", "),
            values.join(", ")
        );
        let inserted = self.run(&sql)?;

        if !return_insert_id {
            return Ok(-1);
        }
        match (inserted, self.store.as_ref()) {
            (Some(_), Some(store)) => Ok(store.last_insert_id()),
            _ => Ok(0),
        }
    }

    /// Sets every non-key column of `row` that carries a value. Without
    /// conditions every row of `table` is updated.
    pub fn update(&mut self, table: &Table, row: &Row, conditions: Option<&Conditions>) -> Result<u64> {
        let skip_empty = self.options.skip_empty_values;
        let assignments: Vec<String> = row
            .get_column_names(true)
            .iter()
            .filter_map(|name| row.column(name.as_str()))
            .filter(|column| match &column.value {
                Some(value) => !skip_empty || value.is_truthy(),
                None => false,
            })
            .map(|column| format!("{} = {}", column.name, column.literal()))
            .collect();

        if assignments.is_empty() {
            self.ready()?;
            debug!("nothing to update in {}", table.name);
            return Ok(0);
        }

        let mut sql = format!("UPDATE {} SET {}", table.name, assignments.join(", "));
        if let Some(conditions) = conditions {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.render(BoolOperator::And));
        }
        self.execute(&sql)
    }

    pub fn delete(&mut self, table: &Table, conditions: &Conditions) -> Result<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            table.name,
            conditions.render(BoolOperator::And)
        );
        self.execute(&sql)
    }

    pub fn truncate(&mut self, table: &Table) -> Result<u64> {
        let (store, _) = self.ready()?;
        let sql = store.truncate_statement(&table.name);
        self.execute(&sql)
    }

    /// In-memory filter over already loaded rows; never touches the store.
    /// Every match must hold. `None` when no row qualifies.
    pub fn filter(&self, table: &Table, conditions: &Conditions, format: ResultFormat) -> Option<Filtered> {
        if table.is_empty() {
            return Some(match format {
                ResultFormat::Table => Filtered::Table(Table::with_schema(FILTER_RESULTS, table.columns().to_vec())),
                ResultFormat::Array => Filtered::Rows(Vec::new()),
            });
        }

        let matched: Vec<Row> = table
            .rows()
            .iter()
            .filter(|row| {
                conditions
                    .matches()
                    .iter()
                    .all(|m| m.match_against(row.get_column_value(m.column.name.as_str())))
            })
            .cloned()
            .collect();

        if matched.is_empty() {
            return None;
        }

        Some(match format {
            ResultFormat::Table => {
                let mut results = Table::with_schema(FILTER_RESULTS, table.columns().to_vec());
                for row in matched {
                    // rows come from `table`, so they share its schema
                    if let Err(e) = results.push_row(row) {
                        warn!("dropping filtered row: {}", e);
                    }
                }
                Filtered::Table(results)
            }
            ResultFormat::Array => Filtered::Rows(matched),
        })
    }

    /// Blank record shaped like `table`, ready to fill before insert/update.
    pub fn create_row(&self, table: &Table) -> Row {
        table.blank_row()
    }
}

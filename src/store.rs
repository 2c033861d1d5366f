//! Backing-store seam.
//!
//! The handler only talks to a [`Store`]: connect, select a database,
//! execute a statement, fetch field metadata and rows. [`SqliteStore`] is
//! the bundled driver.

use crate::types::Value;
use ahash::AHashMap;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// `server` value that keeps every database in memory.
pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub server: String,
    pub username: String,
    pub password: String,
}

impl ConnectionSettings {
    pub fn new(server: &str, username: &str, password: &str) -> Self {
        Self {
            server: server.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY, "", "")
    }
}

/// Field metadata of a result: name, declared type and space-separated flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub type_name: String,
    pub flags: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub fields: Vec<FieldInfo>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no database selected")]
    NoDatabase,

    #[error("failed to open database at {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("failed to execute statement: {0}")]
    Execute(#[source] rusqlite::Error),

    #[error("failed to query database: {0}")]
    Query(#[source] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait Store {
    fn connect(settings: &ConnectionSettings) -> Result<Self, StoreError>
    where
        Self: Sized;

    fn select_database(&mut self, name: &str) -> Result<(), StoreError>;

    /// Runs a statement and returns the number of affected rows.
    fn execute(&mut self, sql: &str) -> Result<u64, StoreError>;

    /// Runs a statement; `None` when it does not produce rows.
    fn query(&mut self, sql: &str) -> Result<Option<ResultSet>, StoreError>;

    fn last_insert_id(&self) -> i64;

    fn list_tables(&mut self) -> Result<Vec<String>, StoreError>;

    fn truncate_statement(&self, table: &str) -> String {
        format!("TRUNCATE {}", table)
    }
}

static BASE_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)^\s*select\b.+?\bfrom\s+[`"]?(\w+)[`"]?\s*(?:;?\s*$|where\b|order\s+by\b|limit\b|group\s+by\b)"#,
    )
    .expect("base table pattern")
});

static SELECT_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*select\s+(?:distinct\s+)?(.+?)\s+from\b").expect("select list pattern")
});

static PLAIN_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:[`"]?\w+[`"]?\.)?(?:\*|[`"]?(\w+)[`"]?)$"#).expect("select item pattern")
});

static TRAILING_ALIAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[`"]?(\w+)[`"]?$"#).expect("alias pattern"));

/// Table a plain single-table `SELECT` reads from.
fn base_table(sql: &str) -> Option<String> {
    BASE_TABLE
        .captures(sql)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Splits on commas outside parentheses.
fn split_select_list(list: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(list[start..].trim());
    items
}

/// Which result columns of a `SELECT` are direct references to base-table
/// columns of the same name. Only those may borrow the table's field flags.
#[derive(Debug, Default, PartialEq)]
struct SelectShape {
    table: String,
    star: bool,
    plain: Vec<String>,
    aliased: Vec<String>,
}

impl SelectShape {
    fn parse(sql: &str) -> Option<Self> {
        let table = base_table(sql)?;
        let list = SELECT_LIST.captures(sql)?.get(1)?.as_str();

        let mut shape = SelectShape {
            table,
            ..Default::default()
        };
        for item in split_select_list(list) {
            match PLAIN_ITEM.captures(item) {
                Some(caps) => match caps.get(1) {
                    Some(name) => shape.plain.push(name.as_str().to_string()),
                    None => shape.star = true,
                },
                None => {
                    if let Some(alias) = TRAILING_ALIAS.captures(item).and_then(|c| c.get(1)) {
                        shape.aliased.push(alias.as_str().to_string());
                    }
                }
            }
        }
        Some(shape)
    }

    fn references(&self, column: &str) -> bool {
        (self.star || self.plain.iter().any(|p| p == column))
            && !self.aliased.iter().any(|a| a == column)
    }
}

fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::from(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

/// SQLite driver. `server` is either [`IN_MEMORY`] or a directory holding
/// one `<name>.sqlite3` file per database. Credentials are ignored.
#[derive(Debug)]
pub struct SqliteStore {
    settings: ConnectionSettings,
    conn: Option<Connection>,
    database: Option<String>,
}

impl SqliteStore {
    pub fn database_name(&self) -> Option<&str> {
        self.database.as_deref()
    }

    fn conn(&self) -> Result<&Connection, StoreError> {
        self.conn.as_ref().ok_or(StoreError::NoDatabase)
    }

    fn database_path(&self, name: &str) -> PathBuf {
        Path::new(&self.settings.server).join(format!("{}.sqlite3", name))
    }

    /// Declared type and flags per column, from `PRAGMA table_info`.
    fn table_info(&self, table: &str) -> Result<AHashMap<String, (String, String)>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({})", table))
            .map_err(StoreError::Query)?;
        let mut rows = stmt.query([]).map_err(StoreError::Query)?;

        let mut info = AHashMap::new();
        while let Some(row) = rows.next().map_err(StoreError::Query)? {
            let name: String = row.get(1).map_err(StoreError::Query)?;
            let declared: String = row.get(2).map_err(StoreError::Query)?;
            let not_null: i64 = row.get(3).map_err(StoreError::Query)?;
            let pk: i64 = row.get(5).map_err(StoreError::Query)?;

            let mut flags = Vec::new();
            if not_null != 0 || pk > 0 {
                flags.push("not_null");
            }
            if pk > 0 {
                flags.push("primary_key");
                if declared.eq_ignore_ascii_case("integer") {
                    flags.push("auto_increment");
                }
            }
            info.insert(name, (declared, flags.join(" ")));
        }
        Ok(info)
    }
}

impl Store for SqliteStore {
    fn connect(settings: &ConnectionSettings) -> Result<Self, StoreError> {
        if settings.server != IN_MEMORY {
            std::fs::create_dir_all(&settings.server)?;
        }
        info!("sqlite store ready at {}", settings.server);
        Ok(Self {
            settings: settings.clone(),
            conn: None,
            database: None,
        })
    }

    fn select_database(&mut self, name: &str) -> Result<(), StoreError> {
        let conn = if self.settings.server == IN_MEMORY {
            Connection::open_in_memory().map_err(|source| StoreError::Open {
                path: PathBuf::from(IN_MEMORY),
                source,
            })?
        } else {
            let path = self.database_path(name);
            Connection::open(&path).map_err(|source| StoreError::Open { path, source })?
        };
        info!("selected database {}", name);
        self.conn = Some(conn);
        self.database = Some(name.to_string());
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> Result<u64, StoreError> {
        debug!("{}", sql);
        let affected = self.conn()?.execute(sql, []).map_err(StoreError::Execute)?;
        Ok(affected as u64)
    }

    fn query(&mut self, sql: &str) -> Result<Option<ResultSet>, StoreError> {
        debug!("{}", sql);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(StoreError::Query)?;

        if stmt.column_count() == 0 {
            stmt.execute([]).map_err(StoreError::Execute)?;
            return Ok(None);
        }

        let declared: Vec<(String, Option<String>)> = stmt
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), c.decl_type().map(str::to_string)))
            .collect();

        let mut result_rows = Vec::new();
        let mut rows = stmt.query([]).map_err(StoreError::Query)?;
        while let Some(row) = rows.next().map_err(StoreError::Query)? {
            let mut cells = Vec::with_capacity(declared.len());
            for i in 0..declared.len() {
                cells.push(value_from_ref(row.get_ref(i).map_err(StoreError::Query)?));
            }
            result_rows.push(cells);
        }
        drop(rows);
        drop(stmt);

        let shape = SelectShape::parse(sql);
        let info = match &shape {
            Some(shape) => self.table_info(&shape.table)?,
            None => AHashMap::new(),
        };

        let fields = declared
            .into_iter()
            .map(|(name, decl_type)| {
                let (pragma_type, flags) = match &shape {
                    Some(shape) if shape.references(&name) => info.get(&name).cloned().unwrap_or_default(),
                    _ => Default::default(),
                };
                FieldInfo {
                    type_name: decl_type.unwrap_or(pragma_type),
                    name,
                    flags,
                }
            })
            .collect();

        Ok(Some(ResultSet {
            fields,
            rows: result_rows,
        }))
    }

    fn last_insert_id(&self) -> i64 {
        self.conn.as_ref().map(Connection::last_insert_rowid).unwrap_or(0)
    }

    fn list_tables(&mut self) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .map_err(StoreError::Query)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(StoreError::Query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Query)?;
        Ok(names)
    }

    fn truncate_statement(&self, table: &str) -> String {
        format!("DELETE FROM {}", table)
    }
}

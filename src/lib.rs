pub mod colour;
pub mod conditions;
pub mod database;
pub mod date;
pub mod errors;
pub mod filesystem;
pub mod handler;
pub mod row;
pub mod settings;
pub mod store;
pub mod table;
pub mod text;
pub mod types;

pub use colour::Rgb;
pub use conditions::{BoolOperator, ComparisonOperator, Conditions, Match};
pub use database::Database;
pub use date::DateValue;
pub use errors::{JaxpError, Result};
pub use filesystem::FileDescriptor;
pub use handler::{Filtered, Handler, HandlerOptions, ResultFormat, Selection};
pub use row::Row;
pub use settings::{init_logging, Settings};
pub use store::{ConnectionSettings, SqliteStore, Store, StoreError};
pub use table::Table;
pub use types::{Column, ColumnKey, ColumnType, Value};

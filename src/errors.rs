use thiserror::Error;

pub type Result<T> = std::result::Result<T, JaxpError>;

#[derive(Error, Debug)]
pub enum JaxpError {
    // Handler state
    #[error("Not connected: no database has been selected")]
    NotConnected,

    #[error("Connection error: {0}")]
    Connection(String),

    // Conditions
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    // Table / row lookups
    #[error("{kind} index {index} out of range (len {len})")]
    IndexError {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Settings
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JaxpError {
    pub fn invalid_operator(op: &str) -> Self {
        JaxpError::InvalidOperator(op.to_string())
    }

    pub fn invalid_argument(msg: &str) -> Self {
        JaxpError::InvalidArgument(msg.to_string())
    }

    pub fn row_index(index: usize, len: usize) -> Self {
        JaxpError::IndexError { kind: "Row", index, len }
    }

    pub fn column_index(index: usize, len: usize) -> Self {
        JaxpError::IndexError { kind: "Column", index, len }
    }

    pub fn column_not_found(name: &str) -> Self {
        JaxpError::ColumnNotFound(name.to_string())
    }

    pub fn config(msg: &str) -> Self {
        JaxpError::Config(msg.to_string())
    }
}

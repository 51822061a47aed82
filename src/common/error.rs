use thiserror::Error;

use super::types::TxnStatus;

/// Database error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelicError {
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("Index '{key}' not found on table '{table}'")]
    IndexNotFound { table: String, key: String },

    #[error("Index '{key}' already exists on table '{table}'")]
    IndexAlreadyExists { table: String, key: String },

    #[error("Duplicate primary key '{key}' in table '{table}'")]
    DuplicateKey { table: String, key: String },

    #[error("Transaction '{0}' not found")]
    TxnNotFound(String),

    #[error("Transaction '{0}' already exists")]
    TxnAlreadyExists(String),

    #[error("Transaction '{id}' is not active (status: {status})")]
    TxnNotActive { id: String, status: TxnStatus },

    #[error("Transaction '{txn}' timed out waiting for lock on '{resource}'")]
    LockTimeout { txn: String, resource: String },

    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

pub type Result<T> = std::result::Result<T, RelicError>;

//! Relic - an embeddable transactional record store in Rust
//!
//! This crate provides hash-indexed tables, a transaction manager with
//! checkpoint-based rollback, a lock-based concurrency controller, a
//! secondary-index manager and a nested-loop join processor. It is
//! consumed by an external command dispatcher that hands over
//! normalized commands and receives results or typed failures; the
//! core never parses text and performs no authorization.
//!
//! # Architecture
//!
//! The system is organized into several layers:
//!
//! - **Record Layer** (`record`): dynamic values, records, column
//!   schemas and structured predicates
//!   - `Value`: closed sum of number, string and boolean with explicit
//!     coercion at comparison/join boundaries
//!   - `Predicate`: ordered, implicitly ANDed column comparisons
//!
//! - **Table Store** (`storage`): tables with ordered columns and
//!   keyed records; CRUD primitives and predicate evaluation
//!
//! - **Index Manager** (`index`): secondary single/composite indexes,
//!   kept consistent with the Table Store on every record mutation
//!
//! - **Lock Manager** (`lock`): per-resource read/write lock state with
//!   FIFO wait queues and timeout-based release; the sole
//!   serialization mechanism of the store
//!
//! - **Transaction Manager** (`txn`): begin/execute/commit/rollback
//!   with full-state checkpoints and an append-only operation log
//!
//! - **Execution** (`execution`): the normalized command set, the core
//!   engine applying commands, and the nested-loop join processor
//!
//! # Example
//!
//! ```rust,no_run
//! use relic::{Command, Database, Projection};
//! use relic::record::{Column, DataType, Record};
//!
//! let db = Database::new();
//!
//! db.execute(&Command::CreateTable {
//!     name: "students".into(),
//!     columns: vec![
//!         Column::new("id", DataType::Number).primary_key(),
//!         Column::new("name", DataType::Text),
//!     ],
//! }).unwrap();
//!
//! db.execute(&Command::Insert {
//!     table: "students".into(),
//!     key: None,
//!     record: Record::new().with("id", 1).with("name", "Alice"),
//! }).unwrap();
//!
//! // Transactional path: rollback restores the checkpoint.
//! db.begin("tx1").unwrap();
//! db.execute_in("tx1", &Command::Insert {
//!     table: "students".into(),
//!     key: None,
//!     record: Record::new().with("id", 2).with("name", "Bob"),
//! }).unwrap();
//! db.rollback("tx1").unwrap();
//!
//! let rows = db.execute(&Command::Select {
//!     table: "students".into(),
//!     columns: Projection::All,
//!     predicate: None,
//! }).unwrap().into_rows();
//! assert_eq!(rows.len(), 1);
//! ```

pub mod common;
pub mod database;
pub mod execution;
pub mod index;
pub mod lock;
pub mod record;
pub mod storage;
pub mod txn;

// Re-export commonly used types at the crate root
pub use common::{LockMode, RelicError, ResourceId, Result, TxnStatus};
pub use database::{Database, Snapshot};
pub use execution::{Command, CommandOutput, Projection};

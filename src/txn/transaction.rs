use std::collections::HashMap;
use std::time::SystemTime;

use crate::common::TxnStatus;
use crate::storage::Table;

/// One entry in a transaction's operation log. Every attempted command
/// is recorded, whether or not it eventually succeeded.
#[derive(Debug, Clone)]
pub struct Operation {
    pub command: String,
    pub timestamp: SystemTime,
}

/// Observability summary of one tracked transaction.
#[derive(Debug, Clone)]
pub struct TxnSummary {
    pub id: String,
    pub status: TxnStatus,
    pub locks: Vec<String>,
    pub operations: usize,
}

/// A tracked transaction: status, checkpoint and operation log.
/// The checkpoint is a deep copy of all tables taken at begin and is
/// present only while the transaction is active.
#[derive(Debug)]
pub struct Transaction {
    id: String,
    status: TxnStatus,
    checkpoint: Option<HashMap<String, Table>>,
    operations: Vec<Operation>,
}

impl Transaction {
    pub fn new(id: &str, checkpoint: HashMap<String, Table>) -> Self {
        Self {
            id: id.to_string(),
            status: TxnStatus::Active,
            checkpoint: Some(checkpoint),
            operations: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> TxnStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Appends an attempted command to the log.
    pub fn record_operation(&mut self, command: String) {
        self.operations.push(Operation {
            command,
            timestamp: SystemTime::now(),
        });
    }

    /// Terminates as committed: the checkpoint is discarded.
    pub fn commit(&mut self) {
        self.checkpoint = None;
        self.status = TxnStatus::Committed;
    }

    /// Terminates as rolled back, yielding the checkpoint to restore.
    pub fn roll_back(&mut self) -> HashMap<String, Table> {
        self.status = TxnStatus::RolledBack;
        self.checkpoint.take().unwrap_or_default()
    }

    /// Force-terminates: locks go, table state stays as-is.
    pub fn abort(&mut self) {
        self.checkpoint = None;
        self.status = TxnStatus::Aborted;
    }
}

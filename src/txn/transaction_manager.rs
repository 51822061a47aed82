use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::common::{RelicError, Result, TxnStatus};
use crate::execution::{Command, CommandOutput, Engine};
use crate::lock::LockManager;

use super::{Transaction, TxnSummary};

/// The Transaction Manager: orchestrates begin/execute/commit/rollback,
/// takes checkpoints and drives the Lock Manager.
///
/// Lock ordering: the transaction table is always locked before the
/// engine, and neither is ever held across a blocking lock acquisition.
pub struct TransactionManager {
    engine: Arc<Mutex<Engine>>,
    locks: Arc<LockManager>,
    txns: Mutex<HashMap<String, Transaction>>,
}

impl TransactionManager {
    pub fn new(engine: Arc<Mutex<Engine>>, locks: Arc<LockManager>) -> Self {
        Self {
            engine,
            locks,
            txns: Mutex::new(HashMap::new()),
        }
    }

    /// Starts a transaction, taking a full deep copy of all tables as
    /// its checkpoint. An id is rejected while it is still tracked,
    /// whatever its status, until `forget` cleans it up.
    pub fn begin(&self, id: &str) -> Result<()> {
        let mut txns = self.txns.lock();
        if txns.contains_key(id) {
            return Err(RelicError::TxnAlreadyExists(id.to_string()));
        }
        let checkpoint = self.engine.lock().checkpoint();
        txns.insert(id.to_string(), Transaction::new(id, checkpoint));
        debug!(txn = %id, "transaction started");
        Ok(())
    }

    /// Executes a command inside a transaction. The attempted command
    /// is appended to the operation log whatever the outcome. The
    /// required lock is acquired first (suspending the caller if
    /// needed); on lock timeout or execution failure the transaction
    /// stays active and the caller decides whether to retry or roll
    /// back.
    pub fn execute(&self, id: &str, command: &Command) -> Result<CommandOutput> {
        {
            let mut txns = self.txns.lock();
            let txn = txns
                .get_mut(id)
                .ok_or_else(|| RelicError::TxnNotFound(id.to_string()))?;
            if !txn.is_active() {
                return Err(RelicError::TxnNotActive {
                    id: id.to_string(),
                    status: txn.status(),
                });
            }
            txn.record_operation(command.to_string());
        }

        if let Some((resource, mode)) = command.lock_requirement() {
            self.locks.acquire(id, &resource, mode)?;
        }

        // The transaction may have been rolled back or force-terminated
        // while this caller was suspended on the lock. The re-check and
        // the apply share one critical section on the transaction table,
        // so a concurrent rollback cannot restore its checkpoint between
        // the check passing and the mutation landing.
        let stale = {
            let txns = self.txns.lock();
            match txns.get(id) {
                Some(txn) if txn.is_active() => {
                    return self.engine.lock().apply(command);
                }
                Some(txn) => Err(RelicError::TxnNotActive {
                    id: id.to_string(),
                    status: txn.status(),
                }),
                None => Err(RelicError::TxnNotFound(id.to_string())),
            }
        };
        // Any lock granted after the transaction terminated outlived its
        // owner; drop it so the resource is not held forever.
        self.locks.release_all(id);
        stale
    }

    /// Commits: releases every held lock (waking queued waiters per
    /// resource), discards the checkpoint, status becomes committed.
    pub fn commit(&self, id: &str) -> Result<()> {
        {
            let mut txns = self.txns.lock();
            let txn = txns
                .get_mut(id)
                .ok_or_else(|| RelicError::TxnNotFound(id.to_string()))?;
            if !txn.is_active() {
                return Err(RelicError::TxnNotActive {
                    id: id.to_string(),
                    status: txn.status(),
                });
            }
            txn.commit();
        }
        self.locks.release_all(id);
        debug!(txn = %id, "transaction committed");
        Ok(())
    }

    /// Rolls back: restores all tables from the checkpoint (the
    /// checkpoint is database-wide, so concurrent commits to other
    /// tables during this transaction's lifetime are discarded too),
    /// releases locks, status becomes rolled-back.
    pub fn rollback(&self, id: &str) -> Result<()> {
        {
            let mut txns = self.txns.lock();
            let txn = txns
                .get_mut(id)
                .ok_or_else(|| RelicError::TxnNotFound(id.to_string()))?;
            if !txn.is_active() {
                return Err(RelicError::TxnNotActive {
                    id: id.to_string(),
                    status: txn.status(),
                });
            }
            let checkpoint = txn.roll_back();
            self.engine.lock().restore(checkpoint);
        }
        self.locks.release_all(id);
        debug!(txn = %id, "transaction rolled back");
        Ok(())
    }

    /// Operational escape hatch: force-terminates every active
    /// transaction, releasing its locks and leaving table state as-is.
    /// Returns the number of transactions terminated.
    pub fn terminate_all(&self) -> usize {
        let terminated: Vec<String> = {
            let mut txns = self.txns.lock();
            txns.values_mut()
                .filter(|txn| txn.is_active())
                .map(|txn| {
                    txn.abort();
                    txn.id().to_string()
                })
                .collect()
        };
        for id in &terminated {
            self.locks.release_all(id);
            debug!(txn = %id, "transaction aborted");
        }
        terminated.len()
    }

    /// Stops tracking a terminated transaction so its id can be reused.
    pub fn forget(&self, id: &str) -> Result<()> {
        let mut txns = self.txns.lock();
        match txns.get(id) {
            None => Err(RelicError::TxnNotFound(id.to_string())),
            Some(txn) if txn.is_active() => Err(RelicError::TxnNotActive {
                id: id.to_string(),
                status: txn.status(),
            }),
            Some(_) => {
                txns.remove(id);
                Ok(())
            }
        }
    }

    pub fn status(&self, id: &str) -> Result<TxnStatus> {
        self.txns
            .lock()
            .get(id)
            .map(|txn| txn.status())
            .ok_or_else(|| RelicError::TxnNotFound(id.to_string()))
    }

    /// Summaries of every tracked transaction, sorted by id.
    pub fn list(&self) -> Vec<TxnSummary> {
        let txns = self.txns.lock();
        let mut summaries: Vec<TxnSummary> = txns
            .values()
            .map(|txn| TxnSummary {
                id: txn.id().to_string(),
                status: txn.status(),
                locks: self
                    .locks
                    .held_resources(txn.id())
                    .iter()
                    .map(|r| r.to_string())
                    .collect(),
                operations: txn.operation_count(),
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }
}

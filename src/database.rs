use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

use crate::common::{Result, STATEMENT_TXN_PREFIX};
use crate::execution::{Command, CommandOutput, Engine};
use crate::index::IndexView;
use crate::lock::{LockManager, LockStats};
use crate::storage::Table;
use crate::txn::{TransactionManager, TxnSummary};

/// Full-state snapshot handed to the persist hook after state-changing
/// operations. An opaque durability side-channel, not a correctness
/// guarantee: no ordering with respect to in-flight operations is
/// promised.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tables: HashMap<String, Table>,
    pub indexes: IndexView,
    pub transactions: Vec<TxnSummary>,
    pub statements: u64,
}

type PersistHook = Box<dyn Fn(&Snapshot) + Send + Sync>;

/// The embeddable record store: the single owned aggregate of tables,
/// indexes and transactions behind an explicit ownership boundary.
///
/// Direct (non-transactional) mutating commands run inside an implicit
/// single-statement transaction, so every mutating path goes through
/// the lock manager. Direct selects and joins read the aggregate
/// without touching the lock manager.
pub struct Database {
    engine: Arc<Mutex<Engine>>,
    locks: Arc<LockManager>,
    txns: TransactionManager,
    persist: Option<PersistHook>,
    statements: AtomicU64,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        Self::with_lock_manager(LockManager::new())
    }

    /// Mostly for tests: a database whose lock waits give up after
    /// `timeout` instead of the default.
    pub fn with_lock_timeout(timeout: Duration) -> Self {
        Self::with_lock_manager(LockManager::with_timeout(timeout))
    }

    fn with_lock_manager(locks: LockManager) -> Self {
        let engine = Arc::new(Mutex::new(Engine::new()));
        let locks = Arc::new(locks);
        let txns = TransactionManager::new(Arc::clone(&engine), Arc::clone(&locks));
        Self {
            engine,
            locks,
            txns,
            persist: None,
            statements: AtomicU64::new(0),
        }
    }

    /// Installs the persistence hook, called with a full-state snapshot
    /// after every state-changing operation.
    pub fn set_persist_hook(&mut self, hook: impl Fn(&Snapshot) + Send + Sync + 'static) {
        self.persist = Some(Box::new(hook));
    }

    /// Executes a command on the non-transactional path.
    ///
    /// Mutating commands acquire their lock under a synthetic
    /// single-statement transaction id and release it right after, so
    /// they serialize correctly against explicit transactions. The
    /// drop-table exemption of the transactional path applies here too.
    pub fn execute(&self, command: &Command) -> Result<CommandOutput> {
        let seq = self.statements.fetch_add(1, Ordering::Relaxed);

        if !command.is_mutating() {
            return self.engine.lock().apply(command);
        }

        let stmt_id = format!("{}{}", STATEMENT_TXN_PREFIX, seq);
        trace!(statement = %stmt_id, command = %command, "implicit transaction");

        let locked = match command.lock_requirement() {
            Some((resource, mode)) => {
                self.locks.acquire(&stmt_id, &resource, mode)?;
                true
            }
            None => false,
        };

        let result = self.engine.lock().apply(command);
        if locked {
            self.locks.release_all(&stmt_id);
        }

        let output = result?;
        self.run_persist_hook();
        Ok(output)
    }

    /// `execute` plus an elapsed-time measurement for the dispatcher.
    pub fn execute_timed(&self, command: &Command) -> Result<(CommandOutput, Duration)> {
        let start = Instant::now();
        let output = self.execute(command)?;
        Ok((output, start.elapsed()))
    }

    // --- Transactional path ---------------------------------------------

    pub fn begin(&self, txn_id: &str) -> Result<()> {
        self.txns.begin(txn_id)
    }

    pub fn execute_in(&self, txn_id: &str, command: &Command) -> Result<CommandOutput> {
        let output = self.txns.execute(txn_id, command)?;
        if command.is_mutating() {
            self.run_persist_hook();
        }
        Ok(output)
    }

    pub fn commit(&self, txn_id: &str) -> Result<()> {
        self.txns.commit(txn_id)?;
        self.run_persist_hook();
        Ok(())
    }

    pub fn rollback(&self, txn_id: &str) -> Result<()> {
        self.txns.rollback(txn_id)?;
        self.run_persist_hook();
        Ok(())
    }

    /// Force-terminates every active transaction; returns the count.
    pub fn terminate_all(&self) -> usize {
        let count = self.txns.terminate_all();
        if count > 0 {
            self.run_persist_hook();
        }
        count
    }

    /// Stops tracking a terminated transaction so its id can be reused.
    pub fn forget(&self, txn_id: &str) -> Result<()> {
        self.txns.forget(txn_id)
    }

    // --- Observability --------------------------------------------------

    pub fn transactions(&self) -> Vec<TxnSummary> {
        self.txns.list()
    }

    pub fn lock_stats(&self) -> LockStats {
        self.locks.stats()
    }

    pub fn indexes(&self) -> IndexView {
        self.engine.lock().indexes().get_indexes()
    }

    pub fn snapshot(&self) -> Snapshot {
        let (tables, indexes) = {
            let engine = self.engine.lock();
            (engine.store().snapshot(), engine.indexes().get_indexes())
        };
        Snapshot {
            tables,
            indexes,
            transactions: self.txns.list(),
            statements: self.statements.load(Ordering::Relaxed),
        }
    }

    fn run_persist_hook(&self) {
        if let Some(hook) = &self.persist {
            hook(&self.snapshot());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::Projection;
    use crate::record::{Column, DataType, Record};
    use std::sync::atomic::AtomicUsize;

    fn create_students(db: &Database) {
        db.execute(&Command::CreateTable {
            name: "students".into(),
            columns: vec![
                Column::new("id", DataType::Number).primary_key(),
                Column::new("name", DataType::Text),
            ],
        })
        .unwrap();
    }

    #[test]
    fn test_direct_path_roundtrip() {
        let db = Database::new();
        create_students(&db);
        db.execute(&Command::Insert {
            table: "students".into(),
            key: None,
            record: Record::new().with("id", 1).with("name", "Alice"),
        })
        .unwrap();

        let rows = db
            .execute(&Command::Select {
                table: "students".into(),
                columns: Projection::All,
                predicate: None,
            })
            .unwrap()
            .into_rows();
        assert_eq!(rows.len(), 1);

        // The implicit statement transaction released its lock.
        assert_eq!(db.lock_stats().total_locks, 0);
    }

    #[test]
    fn test_persist_hook_fires_on_mutation_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let mut db = Database::new();
        db.set_persist_hook(move |snapshot| {
            seen.fetch_add(1, Ordering::SeqCst);
            assert!(snapshot.statements > 0);
        });

        create_students(&db);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        db.execute(&Command::Select {
            table: "students".into(),
            columns: Projection::All,
            predicate: None,
        })
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        db.execute(&Command::Insert {
            table: "students".into(),
            key: None,
            record: Record::new().with("id", 1).with("name", "Alice"),
        })
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_execute_timed_reports_duration() {
        let db = Database::new();
        create_students(&db);
        let (output, elapsed) = db
            .execute_timed(&Command::Select {
                table: "students".into(),
                columns: Projection::All,
                predicate: None,
            })
            .unwrap();
        assert_eq!(output.row_count(), 0);
        assert!(elapsed <= Duration::from_secs(1));
    }

    #[test]
    fn test_failed_mutation_releases_implicit_lock() {
        let db = Database::new();
        create_students(&db);
        let err = db
            .execute(&Command::Insert {
                table: "missing".into(),
                key: None,
                record: Record::new().with("id", 1),
            })
            .unwrap_err();
        assert!(matches!(err, crate::common::RelicError::TableNotFound(_)));
        assert_eq!(db.lock_stats().total_locks, 0);
        assert_eq!(db.lock_stats().waiting, 0);
    }
}

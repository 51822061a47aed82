use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::common::{LockMode, RelicError, ResourceId, Result, DEFAULT_LOCK_TIMEOUT};

/// One granted claim on a resource.
#[derive(Debug, Clone)]
struct LockHold {
    txn: String,
    mode: LockMode,
}

/// A suspended acquire call: woken through `signal` once granted,
/// removed by its owner on timeout.
struct WaitEntry {
    txn: String,
    mode: LockMode,
    arrival: Instant,
    signal: Sender<()>,
}

#[derive(Default)]
struct LockState {
    /// Resource -> current holders (readers share; a writer is alone)
    holders: HashMap<ResourceId, Vec<LockHold>>,
    /// Transaction -> resources it holds, in acquisition order
    held: HashMap<String, Vec<ResourceId>>,
    /// Resource -> FIFO wait queue
    waiters: HashMap<ResourceId, Vec<WaitEntry>>,
}

impl LockState {
    /// Compatibility rule: an empty resource grants anything; a writer
    /// is compatible with nothing held by others; a reader only needs
    /// the absence of a foreign writer. A transaction that is the sole
    /// holder may upgrade its read lock to write in place.
    fn grantable(&self, resource: &ResourceId, txn: &str, mode: LockMode) -> bool {
        let holds = match self.holders.get(resource) {
            Some(holds) if !holds.is_empty() => holds,
            _ => return true,
        };
        if holds
            .iter()
            .any(|h| h.txn == txn && h.mode == LockMode::Write)
        {
            return true;
        }
        match mode {
            LockMode::Read => !holds
                .iter()
                .any(|h| h.txn != txn && h.mode == LockMode::Write),
            LockMode::Write => holds.iter().all(|h| h.txn == txn),
        }
    }

    /// Records a grant. Re-acquiring an already held lock is a no-op
    /// except for the read-to-write upgrade, which rewrites the mode.
    fn grant(&mut self, resource: &ResourceId, txn: &str, mode: LockMode) {
        let holds = self.holders.entry(resource.clone()).or_default();
        match holds.iter_mut().find(|h| h.txn == txn) {
            Some(hold) => {
                if mode == LockMode::Write {
                    hold.mode = LockMode::Write;
                }
            }
            None => holds.push(LockHold {
                txn: txn.to_string(),
                mode,
            }),
        }

        let held = self.held.entry(txn.to_string()).or_default();
        if !held.contains(resource) {
            held.push(resource.clone());
        }
    }

    /// Resolves a resource's wait queue after a release event. Waiters
    /// are considered in arrival order; one grantable writer beats any
    /// number of grantable readers, otherwise every now-grantable
    /// reader is admitted in one pass.
    fn process_queue(&mut self, resource: &ResourceId) {
        let mut queue = match self.waiters.remove(resource) {
            Some(queue) => queue,
            None => return,
        };
        queue.sort_by_key(|w| w.arrival);

        let writer_pos = queue.iter().position(|w| {
            w.mode == LockMode::Write && self.grantable(resource, &w.txn, LockMode::Write)
        });

        if let Some(pos) = writer_pos {
            let entry = queue.remove(pos);
            self.grant(resource, &entry.txn, LockMode::Write);
            trace!(txn = %entry.txn, resource = %resource, "granted queued write lock");
            let _ = entry.signal.send(());
        } else {
            let mut remaining = Vec::with_capacity(queue.len());
            for entry in queue.drain(..) {
                if entry.mode == LockMode::Read
                    && self.grantable(resource, &entry.txn, LockMode::Read)
                {
                    self.grant(resource, &entry.txn, LockMode::Read);
                    trace!(txn = %entry.txn, resource = %resource, "granted queued read lock");
                    let _ = entry.signal.send(());
                } else {
                    remaining.push(entry);
                }
            }
            queue = remaining;
        }

        if !queue.is_empty() {
            self.waiters.insert(resource.clone(), queue);
        }
    }
}

/// Lock counters for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockStats {
    pub total_locks: usize,
    pub read_locks: usize,
    pub write_locks: usize,
    pub waiting: usize,
}

/// The Lock Manager: per-resource read/write lock state with FIFO wait
/// queues and timeout-based release.
///
/// This is the sole serialization mechanism of the store and must be
/// safe under real parallel threads. `acquire` is the only operation
/// that may suspend its caller; the internal state mutex is always
/// dropped before suspending, so a waiter never blocks the manager.
pub struct LockManager {
    state: Mutex<LockState>,
    timeout: Duration,
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LockManager {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Acquires a lock for a transaction, suspending the caller when
    /// the resource is not immediately grantable. Fails with
    /// `LockTimeout` once the fixed timeout elapses; the timed-out wait
    /// entry is removed and no other waiter or holder is affected.
    pub fn acquire(&self, txn: &str, resource: &ResourceId, mode: LockMode) -> Result<()> {
        let receiver = {
            let mut state = self.state.lock();
            if state.grantable(resource, txn, mode) {
                state.grant(resource, txn, mode);
                trace!(txn = %txn, resource = %resource, mode = %mode, "lock granted");
                return Ok(());
            }

            let (signal, receiver) = bounded(1);
            state
                .waiters
                .entry(resource.clone())
                .or_default()
                .push(WaitEntry {
                    txn: txn.to_string(),
                    mode,
                    arrival: Instant::now(),
                    signal,
                });
            receiver
        };

        debug!(txn = %txn, resource = %resource, mode = %mode, "suspended waiting for lock");
        match receiver.recv_timeout(self.timeout) {
            Ok(()) => Ok(()),
            Err(_) => {
                let mut state = self.state.lock();
                let still_queued = match state.waiters.get_mut(resource) {
                    Some(queue) => {
                        match queue.iter().position(|w| w.txn == txn && w.mode == mode) {
                            Some(pos) => {
                                queue.remove(pos);
                                if queue.is_empty() {
                                    state.waiters.remove(resource);
                                }
                                true
                            }
                            None => false,
                        }
                    }
                    None => false,
                };
                if still_queued {
                    debug!(txn = %txn, resource = %resource, "lock wait timed out");
                    Err(RelicError::LockTimeout {
                        txn: txn.to_string(),
                        resource: resource.to_string(),
                    })
                } else {
                    // Granted in the window between the timeout firing and
                    // this removal attempt; the grant stands.
                    Ok(())
                }
            }
        }
    }

    /// Releases every lock a transaction holds, resolving each affected
    /// resource's wait queue in turn.
    pub fn release_all(&self, txn: &str) {
        let mut state = self.state.lock();
        let resources = state.held.remove(txn).unwrap_or_default();
        for resource in resources {
            if let Some(holds) = state.holders.get_mut(&resource) {
                holds.retain(|h| h.txn != txn);
                if holds.is_empty() {
                    state.holders.remove(&resource);
                }
            }
            state.process_queue(&resource);
        }
        debug!(txn = %txn, "released all locks");
    }

    /// A held read or write lock satisfies a read check; only a held
    /// write lock satisfies a write check.
    pub fn has_lock(&self, txn: &str, resource: &ResourceId, mode: LockMode) -> bool {
        let state = self.state.lock();
        state
            .holders
            .get(resource)
            .map_or(false, |holds| {
                holds.iter().any(|h| {
                    h.txn == txn
                        && match mode {
                            LockMode::Read => true,
                            LockMode::Write => h.mode == LockMode::Write,
                        }
                })
            })
    }

    /// Resources currently held by a transaction, in acquisition order.
    pub fn held_resources(&self, txn: &str) -> Vec<ResourceId> {
        self.state
            .lock()
            .held
            .get(txn)
            .cloned()
            .unwrap_or_default()
    }

    pub fn stats(&self) -> LockStats {
        let state = self.state.lock();
        let mut stats = LockStats::default();
        for holds in state.holders.values() {
            for hold in holds {
                stats.total_locks += 1;
                match hold.mode {
                    LockMode::Read => stats.read_locks += 1,
                    LockMode::Write => stats.write_locks += 1,
                }
            }
        }
        stats.waiting = state.waiters.values().map(|q| q.len()).sum();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> ResourceId {
        ResourceId::table(name)
    }

    #[test]
    fn test_shared_readers() {
        let locks = LockManager::new();
        let resource = table("students");
        locks.acquire("t1", &resource, LockMode::Read).unwrap();
        locks.acquire("t2", &resource, LockMode::Read).unwrap();

        let stats = locks.stats();
        assert_eq!(stats.read_locks, 2);
        assert_eq!(stats.write_locks, 0);
    }

    #[test]
    fn test_writer_excludes() {
        let locks = LockManager::with_timeout(Duration::from_millis(50));
        let resource = table("students");
        locks.acquire("t1", &resource, LockMode::Write).unwrap();

        let err = locks.acquire("t2", &resource, LockMode::Read).unwrap_err();
        assert!(matches!(err, RelicError::LockTimeout { .. }));
        let err = locks.acquire("t2", &resource, LockMode::Write).unwrap_err();
        assert!(matches!(err, RelicError::LockTimeout { .. }));
    }

    #[test]
    fn test_reacquire_is_noop() {
        let locks = LockManager::new();
        let resource = table("students");
        locks.acquire("t1", &resource, LockMode::Write).unwrap();
        locks.acquire("t1", &resource, LockMode::Write).unwrap();
        locks.acquire("t1", &resource, LockMode::Read).unwrap();
        assert_eq!(locks.stats().total_locks, 1);
    }

    #[test]
    fn test_sole_holder_upgrade() {
        let locks = LockManager::with_timeout(Duration::from_millis(50));
        let resource = table("students");
        locks.acquire("t1", &resource, LockMode::Read).unwrap();
        locks.acquire("t1", &resource, LockMode::Write).unwrap();
        assert!(locks.has_lock("t1", &resource, LockMode::Write));

        // Upgrade is refused once a second reader is present.
        locks.release_all("t1");
        locks.acquire("t1", &resource, LockMode::Read).unwrap();
        locks.acquire("t2", &resource, LockMode::Read).unwrap();
        let err = locks.acquire("t1", &resource, LockMode::Write).unwrap_err();
        assert!(matches!(err, RelicError::LockTimeout { .. }));
    }

    #[test]
    fn test_has_lock_semantics() {
        let locks = LockManager::new();
        let resource = table("students");
        locks.acquire("t1", &resource, LockMode::Read).unwrap();
        assert!(locks.has_lock("t1", &resource, LockMode::Read));
        assert!(!locks.has_lock("t1", &resource, LockMode::Write));

        locks.acquire("t2", &table("other"), LockMode::Write).unwrap();
        assert!(locks.has_lock("t2", &table("other"), LockMode::Read));
        assert!(locks.has_lock("t2", &table("other"), LockMode::Write));
    }

    #[test]
    fn test_release_wakes_waiter() {
        use std::sync::Arc;
        use std::thread;

        let locks = Arc::new(LockManager::new());
        let resource = table("students");
        locks.acquire("t1", &resource, LockMode::Write).unwrap();

        let locks2 = Arc::clone(&locks);
        let resource2 = resource.clone();
        let waiter = thread::spawn(move || locks2.acquire("t2", &resource2, LockMode::Write));

        thread::sleep(Duration::from_millis(50));
        assert_eq!(locks.stats().waiting, 1);
        locks.release_all("t1");

        waiter.join().unwrap().unwrap();
        assert!(locks.has_lock("t2", &resource, LockMode::Write));
    }

    #[test]
    fn test_timeout_leaves_other_waiters_untouched() {
        use std::sync::Arc;
        use std::thread;

        let locks = Arc::new(LockManager::with_timeout(Duration::from_millis(200)));
        let resource = table("students");
        locks.acquire("t1", &resource, LockMode::Write).unwrap();

        // t2 enqueues first and times out; t3 enqueues later, so its
        // deadline is still open when t1 releases.
        let locks2 = Arc::clone(&locks);
        let r2 = resource.clone();
        let t2 = thread::spawn(move || locks2.acquire("t2", &r2, LockMode::Write));

        thread::sleep(Duration::from_millis(100));
        let locks3 = Arc::clone(&locks);
        let r3 = resource.clone();
        let t3 = thread::spawn(move || locks3.acquire("t3", &r3, LockMode::Write));

        assert!(t2.join().unwrap().is_err());
        assert!(locks.has_lock("t1", &resource, LockMode::Write));
        locks.release_all("t1");

        t3.join().unwrap().unwrap();
        assert!(locks.has_lock("t3", &resource, LockMode::Write));
    }
}

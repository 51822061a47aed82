use std::time::Duration;

/// Default time a lock waiter suspends before failing with `LockTimeout`
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Delimiter joining column names in a composite index key,
/// and joining stringified column values in a computed index entry
pub const COMPOSITE_DELIMITER: &str = "|";

/// Prefix for the synthetic transaction ids used by implicit
/// single-statement transactions on the non-transactional path
pub const STATEMENT_TXN_PREFIX: &str = "stmt-";

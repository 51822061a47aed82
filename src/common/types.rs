use std::fmt;

/// Lock mode for a resource claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Shared lock - many concurrent readers are compatible
    Read,
    /// Exclusive lock - compatible with nothing else on the resource
    Write,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Read => write!(f, "read"),
            LockMode::Write => write!(f, "write"),
        }
    }
}

/// Lifecycle status of a transaction.
///
/// Transitions: `Active -> Committed | RolledBack | Aborted`.
/// Terminal states have no outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxnStatus {
    Active,
    Committed,
    RolledBack,
    /// Force-terminated by an administrative operation; table state left as-is
    Aborted,
}

impl TxnStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, TxnStatus::Active)
    }
}

impl fmt::Display for TxnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnStatus::Active => write!(f, "active"),
            TxnStatus::Committed => write!(f, "committed"),
            TxnStatus::RolledBack => write!(f, "rolled-back"),
            TxnStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// Identifies a lockable resource: a whole table or a single record.
/// Callers choose the granularity per operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Table(String),
    Record { table: String, key: String },
}

impl ResourceId {
    /// Table-granularity resource. Table names are case-insensitive.
    pub fn table(name: &str) -> Self {
        ResourceId::Table(name.to_lowercase())
    }

    /// Record-granularity resource within a table.
    pub fn record(table: &str, key: &str) -> Self {
        ResourceId::Record {
            table: table.to_lowercase(),
            key: key.to_string(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Table(name) => write!(f, "{}", name),
            ResourceId::Record { table, key } => write!(f, "{}:{}", table, key),
        }
    }
}

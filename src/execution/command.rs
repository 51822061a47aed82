use std::fmt;

use crate::common::{LockMode, ResourceId};
use crate::record::{Column, Predicate, Record, Value};

/// Column list of a select.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    All,
    Columns(Vec<String>),
}

impl Projection {
    pub fn columns(names: &[&str]) -> Self {
        Projection::Columns(names.iter().map(|n| n.to_string()).collect())
    }

    pub(crate) fn as_column_list(&self) -> Option<&[String]> {
        match self {
            Projection::All => None,
            Projection::Columns(cols) => Some(cols),
        }
    }
}

/// A normalized command handed over by the external dispatcher.
/// The core never parses text; the dispatcher has already resolved
/// names, assignments, predicates and literals.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTable {
        name: String,
        columns: Vec<Column>,
    },
    DropTable {
        name: String,
    },
    Insert {
        table: String,
        /// Storage key for tables without a primary key; ignored (and
        /// overridden by the stringified primary-key value) otherwise.
        key: Option<String>,
        record: Record,
    },
    Update {
        table: String,
        assignments: Vec<(String, Value)>,
        predicate: Option<Predicate>,
    },
    Delete {
        table: String,
        predicate: Option<Predicate>,
    },
    Select {
        table: String,
        columns: Projection,
        predicate: Option<Predicate>,
    },
    CreateIndex {
        table: String,
        columns: Vec<String>,
    },
    DropIndex {
        table: String,
        columns: Vec<String>,
    },
    Join {
        left: String,
        right: String,
        left_column: String,
        right_column: String,
        /// Projected columns; empty means all columns from both sides
        columns: Vec<String>,
    },
}

impl Command {
    /// The table a command targets.
    pub fn target_table(&self) -> &str {
        match self {
            Command::CreateTable { name, .. } | Command::DropTable { name } => name,
            Command::Insert { table, .. }
            | Command::Update { table, .. }
            | Command::Delete { table, .. }
            | Command::Select { table, .. }
            | Command::CreateIndex { table, .. }
            | Command::DropIndex { table, .. } => table,
            Command::Join { left, .. } => left,
        }
    }

    /// The lock a transactional execution must acquire before running
    /// this command: write mode for schema and record mutations, read
    /// mode otherwise. Drop-table runs without a lock and succeeds even
    /// while other transactions hold the table.
    pub fn lock_requirement(&self) -> Option<(ResourceId, LockMode)> {
        let resource = ResourceId::table(self.target_table());
        match self {
            Command::DropTable { .. } => None,
            Command::CreateTable { .. }
            | Command::Insert { .. }
            | Command::Update { .. }
            | Command::Delete { .. }
            | Command::CreateIndex { .. }
            | Command::DropIndex { .. } => Some((resource, LockMode::Write)),
            Command::Select { .. } | Command::Join { .. } => Some((resource, LockMode::Read)),
        }
    }

    /// True when executing this command can change database state.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Command::Select { .. } | Command::Join { .. })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::CreateTable { name, columns } => {
                write!(f, "create table {} ({} columns)", name, columns.len())
            }
            Command::DropTable { name } => write!(f, "drop table {}", name),
            Command::Insert { table, .. } => write!(f, "insert into {}", table),
            Command::Update {
                table, predicate, ..
            } => match predicate {
                Some(p) => write!(f, "update {} where {}", table, p),
                None => write!(f, "update {}", table),
            },
            Command::Delete { table, predicate } => match predicate {
                Some(p) => write!(f, "delete from {} where {}", table, p),
                None => write!(f, "delete from {}", table),
            },
            Command::Select {
                table, predicate, ..
            } => match predicate {
                Some(p) => write!(f, "select from {} where {}", table, p),
                None => write!(f, "select from {}", table),
            },
            Command::CreateIndex { table, columns } => {
                write!(f, "create index on {} ({})", table, columns.join(", "))
            }
            Command::DropIndex { table, columns } => {
                write!(f, "drop index on {} ({})", table, columns.join(", "))
            }
            Command::Join {
                left,
                right,
                left_column,
                right_column,
                ..
            } => write!(
                f,
                "join {} and {} on {} = {}",
                left, right, left_column, right_column
            ),
        }
    }
}

/// Result of executing a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// Schema or index change with nothing further to report
    Unit,
    /// Number of records touched by an insert/update/delete
    RowCount(usize),
    /// Records returned by a select or join
    Rows(Vec<Record>),
}

impl CommandOutput {
    pub fn row_count(&self) -> usize {
        match self {
            CommandOutput::Unit => 0,
            CommandOutput::RowCount(n) => *n,
            CommandOutput::Rows(rows) => rows.len(),
        }
    }

    pub fn into_rows(self) -> Vec<Record> {
        match self {
            CommandOutput::Rows(rows) => rows,
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CompareOp, DataType};

    #[test]
    fn test_lock_requirements() {
        let insert = Command::Insert {
            table: "Students".into(),
            key: None,
            record: Record::new(),
        };
        assert_eq!(
            insert.lock_requirement(),
            Some((ResourceId::table("students"), LockMode::Write))
        );

        let select = Command::Select {
            table: "students".into(),
            columns: Projection::All,
            predicate: None,
        };
        assert_eq!(
            select.lock_requirement(),
            Some((ResourceId::table("students"), LockMode::Read))
        );

        let drop = Command::DropTable {
            name: "students".into(),
        };
        assert_eq!(drop.lock_requirement(), None);
    }

    #[test]
    fn test_display_is_log_friendly() {
        let cmd = Command::Update {
            table: "students".into(),
            assignments: vec![("age".into(), Value::Number(25.0))],
            predicate: Some(Predicate::simple("id", CompareOp::Eq, 1)),
        };
        assert_eq!(cmd.to_string(), "update students where id = 1");

        let cmd = Command::CreateTable {
            name: "students".into(),
            columns: vec![Column::new("id", DataType::Number)],
        };
        assert_eq!(cmd.to_string(), "create table students (1 columns)");
    }
}

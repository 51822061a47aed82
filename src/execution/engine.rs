use std::collections::HashMap;

use crate::common::Result;
use crate::index::IndexManager;
use crate::record::Record;
use crate::storage::{Table, TableStore};

use super::{nested_loop_join, Command, CommandOutput};

/// The single-owner core aggregate: the Table Store plus the Index
/// Manager, mutated together so every index stays consistent with the
/// data it covers.
///
/// The engine has no locking of its own; the `Database` keeps it
/// behind a mutex and serializes callers through the lock manager.
#[derive(Debug, Default)]
pub struct Engine {
    store: TableStore,
    indexes: IndexManager,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            store: TableStore::new(),
            indexes: IndexManager::new(),
        }
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    pub fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    /// Executes one normalized command against the aggregate.
    pub fn apply(&mut self, command: &Command) -> Result<CommandOutput> {
        match command {
            Command::CreateTable { name, columns } => {
                self.store.create_table(name, columns.clone())?;
                Ok(CommandOutput::Unit)
            }

            Command::DropTable { name } => {
                let table = self.store.drop_table(name)?;
                // A table and its indexes go down as a single action.
                self.indexes.table_dropped(table.name());
                Ok(CommandOutput::Unit)
            }

            Command::Insert { table, key, record } => {
                let stored = self.store.table_mut(table)?;
                let (record_key, displaced) = stored.insert(key.as_deref(), record.clone())?;
                let inserted: Record = stored
                    .record(&record_key)
                    .cloned()
                    .unwrap_or_else(|| record.clone());
                let table = table.to_lowercase();
                // A keyed insert over an existing key replaced that
                // record; its index entries must go before the new ones
                // come in.
                if let Some(old) = displaced {
                    self.indexes.record_deleted(&table, &record_key, &old);
                }
                self.indexes.record_inserted(&table, &record_key, &inserted);
                Ok(CommandOutput::RowCount(1))
            }

            Command::Update {
                table,
                assignments,
                predicate,
            } => {
                let updates = self
                    .store
                    .table_mut(table)?
                    .update(assignments, predicate.as_ref())?;
                let table = table.to_lowercase();
                for update in &updates {
                    self.indexes.record_updated(&table, update);
                }
                Ok(CommandOutput::RowCount(updates.len()))
            }

            Command::Delete { table, predicate } => {
                let removed = self.store.table_mut(table)?.delete(predicate.as_ref());
                let table = table.to_lowercase();
                for (key, record) in &removed {
                    self.indexes.record_deleted(&table, key, record);
                }
                Ok(CommandOutput::RowCount(removed.len()))
            }

            Command::Select {
                table,
                columns,
                predicate,
            } => {
                let rows = self
                    .store
                    .table(table)?
                    .select(columns.as_column_list(), predicate.as_ref());
                Ok(CommandOutput::Rows(rows))
            }

            Command::CreateIndex { table, columns } => {
                let table = self.store.table(table)?;
                self.indexes.create_index(table, columns)?;
                Ok(CommandOutput::Unit)
            }

            Command::DropIndex { table, columns } => {
                // Surface a missing table as such before the index check.
                self.store.table(table)?;
                self.indexes.drop_index(table, columns)?;
                Ok(CommandOutput::Unit)
            }

            Command::Join {
                left,
                right,
                left_column,
                right_column,
                columns,
            } => {
                let left = self.store.table(left)?;
                let right = self.store.table(right)?;
                let rows = nested_loop_join(left, right, left_column, right_column, columns)?;
                Ok(CommandOutput::Rows(rows))
            }
        }
    }

    /// Deep copy of all tables, taken as a transaction checkpoint.
    pub fn checkpoint(&self) -> HashMap<String, Table> {
        self.store.snapshot()
    }

    /// Restores a checkpoint over the current tables and rebuilds every
    /// index from the restored data.
    pub fn restore(&mut self, checkpoint: HashMap<String, Table>) {
        self.store.restore(checkpoint);
        let Engine { store, indexes } = self;
        for table in store.tables().values() {
            indexes.rebuild(table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::RelicError;
    use crate::execution::Projection;
    use crate::record::{Column, CompareOp, DataType, Predicate, Value};

    fn engine_with_students() -> Engine {
        let mut engine = Engine::new();
        engine
            .apply(&Command::CreateTable {
                name: "students".into(),
                columns: vec![
                    Column::new("id", DataType::Number).primary_key(),
                    Column::new("name", DataType::Text),
                    Column::new("age", DataType::Number),
                ],
            })
            .unwrap();
        for (id, name, age) in [(1, "Alice", 20), (2, "Bob", 21)] {
            engine
                .apply(&Command::Insert {
                    table: "students".into(),
                    key: None,
                    record: Record::new().with("id", id).with("name", name).with("age", age),
                })
                .unwrap();
        }
        engine
    }

    #[test]
    fn test_insert_maintains_index() {
        let mut engine = engine_with_students();
        engine
            .apply(&Command::CreateIndex {
                table: "students".into(),
                columns: vec!["age".into()],
            })
            .unwrap();

        engine
            .apply(&Command::Insert {
                table: "students".into(),
                key: None,
                record: Record::new().with("id", 3).with("name", "Carol").with("age", 20),
            })
            .unwrap();

        assert_eq!(
            engine.indexes().lookup("students", &["age".into()], "20"),
            Some(vec!["1".to_string(), "3".to_string()])
        );
    }

    #[test]
    fn test_update_and_delete_maintain_index() {
        let mut engine = engine_with_students();
        engine
            .apply(&Command::CreateIndex {
                table: "students".into(),
                columns: vec!["age".into()],
            })
            .unwrap();

        engine
            .apply(&Command::Update {
                table: "students".into(),
                assignments: vec![("age".into(), Value::Number(22.0))],
                predicate: Some(Predicate::simple("id", CompareOp::Eq, 1)),
            })
            .unwrap();
        assert_eq!(
            engine.indexes().lookup("students", &["age".into()], "20"),
            None
        );
        assert_eq!(
            engine.indexes().lookup("students", &["age".into()], "22"),
            Some(vec!["1".to_string()])
        );

        engine
            .apply(&Command::Delete {
                table: "students".into(),
                predicate: Some(Predicate::simple("id", CompareOp::Eq, 1)),
            })
            .unwrap();
        assert_eq!(
            engine.indexes().lookup("students", &["age".into()], "22"),
            None
        );
    }

    #[test]
    fn test_drop_table_drops_indexes() {
        let mut engine = engine_with_students();
        engine
            .apply(&Command::CreateIndex {
                table: "students".into(),
                columns: vec!["age".into()],
            })
            .unwrap();
        engine
            .apply(&Command::DropTable {
                name: "students".into(),
            })
            .unwrap();
        assert!(engine.indexes().get_indexes().is_empty());
        let err = engine
            .apply(&Command::Select {
                table: "students".into(),
                columns: Projection::All,
                predicate: None,
            })
            .unwrap_err();
        assert_eq!(err, RelicError::TableNotFound("students".into()));
    }

    #[test]
    fn test_restore_rebuilds_indexes() {
        let mut engine = engine_with_students();
        engine
            .apply(&Command::CreateIndex {
                table: "students".into(),
                columns: vec!["age".into()],
            })
            .unwrap();

        let checkpoint = engine.checkpoint();
        engine
            .apply(&Command::Insert {
                table: "students".into(),
                key: None,
                record: Record::new().with("id", 3).with("name", "Carol").with("age", 19),
            })
            .unwrap();
        assert!(engine
            .indexes()
            .lookup("students", &["age".into()], "19")
            .is_some());

        engine.restore(checkpoint);
        assert_eq!(
            engine.indexes().lookup("students", &["age".into()], "19"),
            None
        );
        assert_eq!(
            engine.indexes().lookup("students", &["age".into()], "20"),
            Some(vec!["1".to_string()])
        );
    }
}

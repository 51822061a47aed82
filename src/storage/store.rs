use std::collections::HashMap;

use crate::common::{RelicError, Result};
use crate::record::Column;

use super::Table;

/// The Table Store: owns every table in the database.
///
/// The store itself is not thread-safe; the owning `Database` keeps it
/// behind a mutex and serializes access through the lock manager.
#[derive(Debug, Clone, Default)]
pub struct TableStore {
    /// Lowercased table name -> table
    tables: HashMap<String, Table>,
}

impl TableStore {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    pub fn create_table(&mut self, name: &str, columns: Vec<Column>) -> Result<()> {
        let key = name.to_lowercase();
        if self.tables.contains_key(&key) {
            return Err(RelicError::TableAlreadyExists(key));
        }
        self.tables.insert(key.clone(), Table::new(&key, columns));
        Ok(())
    }

    /// Removes a table, returning it so the caller can tear down its
    /// indexes in the same action.
    pub fn drop_table(&mut self, name: &str) -> Result<Table> {
        let key = name.to_lowercase();
        self.tables
            .remove(&key)
            .ok_or(RelicError::TableNotFound(key))
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        let key = name.to_lowercase();
        self.tables
            .get(&key)
            .ok_or(RelicError::TableNotFound(key))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        let key = name.to_lowercase();
        self.tables
            .get_mut(&key)
            .ok_or(RelicError::TableNotFound(key))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&name.to_lowercase())
    }

    pub fn tables(&self) -> &HashMap<String, Table> {
        &self.tables
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Deep copy of every table, used as a transaction checkpoint.
    pub fn snapshot(&self) -> HashMap<String, Table> {
        self.tables.clone()
    }

    /// Replaces the whole table map with a previously taken snapshot.
    pub fn restore(&mut self, snapshot: HashMap<String, Table>) {
        self.tables = snapshot;
    }
}

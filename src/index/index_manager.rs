use std::collections::{BTreeSet, HashMap};

use crate::common::{RelicError, Result, COMPOSITE_DELIMITER};
use crate::record::Record;
use crate::storage::{RowUpdate, Table};

/// One secondary index: the component columns (in declaration order)
/// and the computed-key to record-key-set mapping.
#[derive(Debug, Clone, Default)]
struct Index {
    columns: Vec<String>,
    /// Computed string key -> ordered set of record keys
    entries: HashMap<String, BTreeSet<String>>,
}

impl Index {
    fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            entries: HashMap::new(),
        }
    }

    /// Computes a record's index key: the stringified value of each
    /// component column in order, joined with the composite delimiter.
    /// A missing value contributes an empty string.
    fn key_for(&self, record: &Record) -> String {
        self.columns
            .iter()
            .map(|col| record.get(col).map(|v| v.key_string()).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(COMPOSITE_DELIMITER)
    }

    fn add(&mut self, record_key: &str, record: &Record) {
        self.entries
            .entry(self.key_for(record))
            .or_default()
            .insert(record_key.to_string());
    }

    fn remove(&mut self, record_key: &str, record: &Record) {
        let key = self.key_for(record);
        if let Some(set) = self.entries.get_mut(&key) {
            set.remove(record_key);
            if set.is_empty() {
                self.entries.remove(&key);
            }
        }
    }
}

/// Introspection view: `table -> index-key -> (value -> record keys)`.
pub type IndexView = HashMap<String, HashMap<String, HashMap<String, Vec<String>>>>;

/// The Index Manager: owns every secondary (single or composite) index
/// and keeps them consistent with the Table Store on every record
/// mutation.
#[derive(Debug, Clone, Default)]
pub struct IndexManager {
    /// Lowercased table name -> index key -> index
    indexes: HashMap<String, HashMap<String, Index>>,
}

impl IndexManager {
    pub fn new() -> Self {
        Self {
            indexes: HashMap::new(),
        }
    }

    /// Joins the (lowercased) component columns into the index key.
    fn index_key(columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| c.to_lowercase())
            .collect::<Vec<_>>()
            .join(COMPOSITE_DELIMITER)
    }

    /// Creates an index over the given columns of a table and populates
    /// it from the table's current records. The column list is
    /// order-sensitive: an index on `(a, b)` is distinct from one on
    /// `(b, a)`.
    pub fn create_index(&mut self, table: &Table, columns: &[String]) -> Result<()> {
        if columns.is_empty() {
            return Err(RelicError::InvalidCommand(
                "an index needs at least one column".to_string(),
            ));
        }
        for column in columns {
            if !table.has_column(column) {
                return Err(RelicError::ColumnNotFound {
                    table: table.name().to_string(),
                    column: column.to_lowercase(),
                });
            }
        }

        let key = Self::index_key(columns);
        let table_indexes = self.indexes.entry(table.name().to_string()).or_default();
        if table_indexes.contains_key(&key) {
            return Err(RelicError::IndexAlreadyExists {
                table: table.name().to_string(),
                key,
            });
        }

        let mut index = Index::new(columns.iter().map(|c| c.to_lowercase()).collect());
        for (record_key, record) in table.records() {
            index.add(record_key, record);
        }
        table_indexes.insert(key, index);
        Ok(())
    }

    /// Drops an index. When the table then has no remaining indexes its
    /// empty index container is removed too.
    pub fn drop_index(&mut self, table: &str, columns: &[String]) -> Result<()> {
        let table = table.to_lowercase();
        let key = Self::index_key(columns);

        let table_indexes = self
            .indexes
            .get_mut(&table)
            .ok_or_else(|| RelicError::IndexNotFound {
                table: table.clone(),
                key: key.clone(),
            })?;
        if table_indexes.remove(&key).is_none() {
            return Err(RelicError::IndexNotFound { table, key });
        }
        if table_indexes.is_empty() {
            self.indexes.remove(&table);
        }
        Ok(())
    }

    /// Returns the full index structure for introspection.
    pub fn get_indexes(&self) -> IndexView {
        self.indexes
            .iter()
            .map(|(table, table_indexes)| {
                let view = table_indexes
                    .iter()
                    .map(|(key, index)| {
                        let entries = index
                            .entries
                            .iter()
                            .map(|(value, keys)| {
                                (value.clone(), keys.iter().cloned().collect::<Vec<_>>())
                            })
                            .collect();
                        (key.clone(), entries)
                    })
                    .collect();
                (table.clone(), view)
            })
            .collect()
    }

    /// Looks up the record keys grouped under a computed value key.
    pub fn lookup(&self, table: &str, columns: &[String], value_key: &str) -> Option<Vec<String>> {
        self.indexes
            .get(&table.to_lowercase())?
            .get(&Self::index_key(columns))?
            .entries
            .get(value_key)
            .map(|set| set.iter().cloned().collect())
    }

    pub fn has_index(&self, table: &str, columns: &[String]) -> bool {
        self.indexes
            .get(&table.to_lowercase())
            .map_or(false, |t| t.contains_key(&Self::index_key(columns)))
    }

    // --- Maintenance contract -------------------------------------------
    // Every record mutation in an indexed table flows through one of
    // these hooks so each affected index stays consistent with the data.

    pub fn record_inserted(&mut self, table: &str, record_key: &str, record: &Record) {
        if let Some(table_indexes) = self.indexes.get_mut(&table.to_lowercase()) {
            for index in table_indexes.values_mut() {
                index.add(record_key, record);
            }
        }
    }

    pub fn record_updated(&mut self, table: &str, update: &RowUpdate) {
        if let Some(table_indexes) = self.indexes.get_mut(&table.to_lowercase()) {
            for index in table_indexes.values_mut() {
                index.remove(&update.old_key, &update.before);
                index.add(&update.new_key, &update.after);
            }
        }
    }

    pub fn record_deleted(&mut self, table: &str, record_key: &str, record: &Record) {
        if let Some(table_indexes) = self.indexes.get_mut(&table.to_lowercase()) {
            for index in table_indexes.values_mut() {
                index.remove(record_key, record);
            }
        }
    }

    /// Drops every index of a table (part of `drop_table`).
    pub fn table_dropped(&mut self, table: &str) {
        self.indexes.remove(&table.to_lowercase());
    }

    /// Recomputes every index of a table from its current records.
    /// Used after a rollback replaced the table contents wholesale.
    pub fn rebuild(&mut self, table: &Table) {
        if let Some(table_indexes) = self.indexes.get_mut(table.name()) {
            for index in table_indexes.values_mut() {
                index.entries.clear();
                for (record_key, record) in table.records() {
                    index.add(record_key, record);
                }
            }
        }
    }
}

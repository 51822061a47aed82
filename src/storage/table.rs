use std::collections::HashMap;

use crate::common::{RelicError, Result};
use crate::record::{Column, Predicate, Record, Value};

/// Describes one record changed by an update. The storage key can
/// change when an assignment touches the primary-key column.
#[derive(Debug, Clone)]
pub struct RowUpdate {
    pub old_key: String,
    pub new_key: String,
    pub before: Record,
    pub after: Record,
}

/// A named collection of typed columns and keyed records.
///
/// Records live in a hash map keyed by a string record key. For a table
/// with a declared primary key the record key is always the stringified
/// primary-key value; otherwise it is whatever key the caller supplied
/// at insert time.
#[derive(Debug, Clone)]
pub struct Table {
    /// Table name, lowercased (identifiers are case-insensitive)
    name: String,
    /// Ordered column definitions
    columns: Vec<Column>,
    /// Map from column name to position for fast lookup
    name_to_index: HashMap<String, usize>,
    /// Record key -> record
    records: HashMap<String, Record>,
    /// Names of columns carrying a primary-key constraint, in schema order.
    /// Only the first is meaningful for the storage-key rule.
    primary_keys: Vec<String>,
}

impl Table {
    pub fn new(name: &str, columns: Vec<Column>) -> Self {
        let mut name_to_index = HashMap::new();
        let mut primary_keys = Vec::new();

        for (i, col) in columns.iter().enumerate() {
            name_to_index.insert(col.name().to_string(), i);
            if col.is_primary_key() {
                primary_keys.push(col.name().to_string());
            }
        }

        Self {
            name: name.to_lowercase(),
            columns,
            name_to_index,
            records: HashMap::new(),
            primary_keys,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.name_to_index
            .get(&name.to_lowercase())
            .and_then(|&i| self.columns.get(i))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.name_to_index.contains_key(&name.to_lowercase())
    }

    /// The column driving the storage-key rule, if one is declared.
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_keys.first().map(|s| s.as_str())
    }

    pub fn primary_keys(&self) -> &[String] {
        &self.primary_keys
    }

    pub fn records(&self) -> &HashMap<String, Record> {
        &self.records
    }

    pub fn record(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts a record and returns its effective storage key, along
    /// with the record it displaced, if any.
    ///
    /// If the table declares a primary key, the key argument is ignored
    /// and the storage key becomes the stringified primary-key value;
    /// a record already stored under that value fails with
    /// `DuplicateKey`. Without a declared primary key the caller must
    /// supply a key, and re-using a key replaces the stored record (the
    /// displaced record is returned so the caller can unindex it).
    /// `NotNull` columns must be present in the record.
    pub fn insert(&mut self, key: Option<&str>, record: Record) -> Result<(String, Option<Record>)> {
        for col in &self.columns {
            if col.is_not_null() && !record.contains(col.name()) {
                return Err(RelicError::InvalidCommand(format!(
                    "column '{}' of table '{}' may not be null",
                    col.name(),
                    self.name
                )));
            }
        }

        let storage_key = match self.primary_key() {
            Some(pk) => {
                let value = record.get(pk).ok_or_else(|| {
                    RelicError::InvalidCommand(format!(
                        "record is missing primary key column '{}' of table '{}'",
                        pk, self.name
                    ))
                })?;
                let storage_key = value.key_string();
                if self.records.contains_key(&storage_key) {
                    return Err(RelicError::DuplicateKey {
                        table: self.name.clone(),
                        key: storage_key,
                    });
                }
                storage_key
            }
            None => key
                .map(|k| k.to_string())
                .ok_or_else(|| {
                    RelicError::InvalidCommand(format!(
                        "insert into '{}' requires a record key (table has no primary key)",
                        self.name
                    ))
                })?,
        };

        let displaced = self.records.insert(storage_key.clone(), record);
        Ok((storage_key, displaced))
    }

    /// Applies assignments to every record matching the predicate
    /// (all records when the predicate is None). Returns one entry per
    /// changed record. An assignment that touches the primary-key
    /// column re-keys the record; a re-key that collides with an
    /// existing record fails with `DuplicateKey` before any record is
    /// touched.
    pub fn update(
        &mut self,
        assignments: &[(String, Value)],
        predicate: Option<&Predicate>,
    ) -> Result<Vec<RowUpdate>> {
        let matching: Vec<String> = self
            .records
            .iter()
            .filter(|(_, record)| predicate.map_or(true, |p| p.matches(record)))
            .map(|(key, _)| key.clone())
            .collect();

        // Pre-check primary-key collisions so a failed update changes nothing.
        if let Some(pk) = self.primary_key().map(|s| s.to_string()) {
            if let Some((_, new_value)) = assignments
                .iter()
                .find(|(column, _)| column.to_lowercase() == pk)
            {
                let new_key = new_value.key_string();
                let collides = self.records.contains_key(&new_key)
                    && !matching.iter().any(|k| k == &new_key);
                if matching.len() > 1 || collides {
                    return Err(RelicError::DuplicateKey {
                        table: self.name.clone(),
                        key: new_key,
                    });
                }
            }
        }

        let mut updates = Vec::with_capacity(matching.len());
        for old_key in matching {
            let mut record = match self.records.remove(&old_key) {
                Some(r) => r,
                None => continue,
            };
            let before = record.clone();
            for (column, value) in assignments {
                record.set(column, value.clone());
            }

            let new_key = match self.primary_key() {
                Some(pk) => record
                    .get(pk)
                    .map(|v| v.key_string())
                    .unwrap_or_else(|| old_key.clone()),
                None => old_key.clone(),
            };

            self.records.insert(new_key.clone(), record.clone());
            updates.push(RowUpdate {
                old_key,
                new_key,
                before,
                after: record,
            });
        }

        Ok(updates)
    }

    /// Removes every record matching the predicate (all records when
    /// the predicate is None). Returns the removed (key, record) pairs.
    pub fn delete(&mut self, predicate: Option<&Predicate>) -> Vec<(String, Record)> {
        let matching: Vec<String> = self
            .records
            .iter()
            .filter(|(_, record)| predicate.map_or(true, |p| p.matches(record)))
            .map(|(key, _)| key.clone())
            .collect();

        matching
            .into_iter()
            .filter_map(|key| self.records.remove(&key).map(|record| (key, record)))
            .collect()
    }

    /// Returns records matching the predicate, projected onto the given
    /// columns when an explicit list is supplied (None means all
    /// columns). A projected column missing from a record is absent in
    /// the output, not an error.
    pub fn select(
        &self,
        columns: Option<&[String]>,
        predicate: Option<&Predicate>,
    ) -> Vec<Record> {
        self.records
            .values()
            .filter(|record| predicate.map_or(true, |p| p.matches(record)))
            .map(|record| match columns {
                Some(cols) => record.project(cols),
                None => record.clone(),
            })
            .collect()
    }
}

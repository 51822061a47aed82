use std::collections::HashMap;

use super::Value;

/// One row of a table: a column-name to value mapping.
/// Column names are stored lowercased; lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    values: HashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Fluent constructor helper.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set(column, value.into());
        self
    }

    pub fn set(&mut self, column: &str, value: Value) {
        self.values.insert(column.to_lowercase(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(&column.to_lowercase())
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.values.remove(&column.to_lowercase())
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(&column.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Projects this record onto the given columns. A column the record
    /// does not carry is simply absent from the projection, not an error.
    pub fn project(&self, columns: &[String]) -> Record {
        let mut projected = Record::new();
        for column in columns {
            if let Some(value) = self.get(column) {
                projected.set(column, value.clone());
            }
        }
        projected
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.set(&column, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let record = Record::new().with("Name", "Alice").with("AGE", 20);
        assert_eq!(record.get("name"), Some(&Value::String("Alice".into())));
        assert_eq!(record.get("Age"), Some(&Value::Number(20.0)));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_projection_skips_missing_columns() {
        let record = Record::new().with("id", 1).with("name", "Alice");
        let projected = record.project(&["id".to_string(), "email".to_string()]);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected.get("id"), Some(&Value::Number(1.0)));
        assert!(!projected.contains("email"));
    }
}

use std::fmt;

/// Declared column types. Values stay dynamically typed at runtime;
/// the declared type is descriptive metadata carried by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Number,
    Text,
    Boolean,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Number => write!(f, "number"),
            DataType::Text => write!(f, "text"),
            DataType::Boolean => write!(f, "boolean"),
        }
    }
}

/// Column constraints. `PrimaryKey` drives the storage-key and
/// uniqueness rules; `NotNull` rejects inserts missing the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    PrimaryKey,
    NotNull,
}

/// A single column in a table schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    data_type: DataType,
    constraints: Vec<Constraint>,
}

impl Column {
    /// Creates a new column definition. Names are case-insensitive
    /// identifiers and are stored lowercased.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into().to_lowercase(),
            data_type,
            constraints: Vec::new(),
        }
    }

    /// Adds a constraint to this column definition.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        if !self.constraints.contains(&constraint) {
            self.constraints.push(constraint);
        }
        self
    }

    /// Shorthand for `.constraint(Constraint::PrimaryKey)`.
    pub fn primary_key(self) -> Self {
        self.constraint(Constraint::PrimaryKey)
    }

    /// Shorthand for `.constraint(Constraint::NotNull)`.
    pub fn not_null(self) -> Self {
        self.constraint(Constraint::NotNull)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_primary_key(&self) -> bool {
        self.constraints.contains(&Constraint::PrimaryKey)
    }

    pub fn is_not_null(&self) -> bool {
        self.constraints.contains(&Constraint::NotNull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_constraints() {
        let col = Column::new("ID", DataType::Number).primary_key().not_null();
        assert_eq!(col.name(), "id");
        assert!(col.is_primary_key());
        assert!(col.is_not_null());
    }

    #[test]
    fn test_duplicate_constraint_ignored() {
        let col = Column::new("id", DataType::Number)
            .primary_key()
            .primary_key();
        assert_eq!(col.constraints().len(), 1);
    }
}

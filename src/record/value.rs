use std::cmp::Ordering;
use std::fmt;

/// Represents a dynamically typed value stored in a record.
/// The store is loosely typed: a column's declared type does not
/// constrain the values held under it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Numeric value (integers and floats share one representation)
    Number(f64),

    /// String value
    String(String),

    /// Boolean value
    Boolean(bool),
}

impl Value {
    /// Types a bareword token the way the external dispatcher does:
    /// a token that parses as a number becomes numeric, `true`/`false`
    /// (case-insensitive) becomes boolean, a single- or double-quoted
    /// token becomes a string with the quotes stripped, and anything
    /// else stays a string.
    pub fn from_token(token: &str) -> Value {
        let trimmed = token.trim();
        if (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2)
            || (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
        {
            return Value::String(trimmed[1..trimmed.len() - 1].to_string());
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            return Value::Number(n);
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Value::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Value::Boolean(false);
        }
        Value::String(trimmed.to_string())
    }

    /// Stringified form used as a storage key or an index entry key.
    /// Integral numbers render without a fractional part, so that
    /// `Number(1.0)` keys as `"1"`.
    pub fn key_string(&self) -> String {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Value::String(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
        }
    }

    /// Returns the numeric interpretation of this value, if any.
    /// Strings that parse as numbers coerce; booleans do not.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Boolean(_) => None,
        }
    }

    /// Loose equality with cross-type coercion, used at comparison and
    /// join boundaries: `Number(1)` equals `String("1")`, and
    /// `Boolean(true)` equals `String("true")` (case-insensitive).
    pub fn loosely_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,

            (Value::Number(a), Value::String(_)) => other.as_number() == Some(*a),
            (Value::String(_), Value::Number(b)) => self.as_number() == Some(*b),

            (Value::Boolean(a), Value::String(s)) | (Value::String(s), Value::Boolean(a)) => {
                (*a && s.eq_ignore_ascii_case("true")) || (!*a && s.eq_ignore_ascii_case("false"))
            }

            _ => false,
        }
    }

    /// Compares two values for ordering, coercing number/string pairs.
    /// Returns None if the values are not comparable (e.g. boolean
    /// against number, or a string that does not parse as a number
    /// against a number).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),

            // Cross-type numeric comparisons
            (Value::Number(a), Value::String(_)) => {
                other.as_number().and_then(|b| a.partial_cmp(&b))
            }
            (Value::String(_), Value::Number(b)) => {
                self.as_number().and_then(|a| a.partial_cmp(b))
            }

            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(_) => write!(f, "{}", self.key_string()),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

// Convenience conversions
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

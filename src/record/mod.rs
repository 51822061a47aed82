mod predicate;
mod record;
mod schema;
mod value;

pub use predicate::{CompareOp, Comparison, Predicate};
pub use record::Record;
pub use schema::{Column, Constraint, DataType};
pub use value::Value;

mod store;
mod table;

pub use store::TableStore;
pub use table::{RowUpdate, Table};

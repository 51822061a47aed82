mod transaction;
mod transaction_manager;

pub use transaction::{Operation, Transaction, TxnSummary};
pub use transaction_manager::TransactionManager;

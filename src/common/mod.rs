mod config;
mod error;
mod types;

pub use config::*;
pub use error::{RelicError, Result};
pub use types::{LockMode, ResourceId, TxnStatus};

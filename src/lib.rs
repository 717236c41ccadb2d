pub mod amount;
pub mod command;
pub mod csv;
pub mod engine;
pub mod model;
pub mod session;

pub use amount::Amount;
pub use engine::{Engine, LedgerConfig};
pub use model::{AccountId, Operation, Transaction, TransactionKind, TxId};

//! Account Store module
//!
//! Persistence layer for accounts: the repository operations and the
//! transfer evaluator, both backed by PostgreSQL.

mod accounts;
mod error;
mod transfer;

pub use accounts::{AccountStore, BatchDelete};
pub use error::StoreError;
pub use transfer::{TransferEvaluator, TransferOutcome, TransferRequest};

//! bankd Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod domain;
pub mod store;

// Used by the binaries, exported for tests as well
pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use domain::{Account, AccountPatch, Holder, HolderError, NewAccount};
pub use error::{AppError, AppResult};
pub use store::{
    AccountStore, BatchDelete, StoreError, TransferEvaluator, TransferOutcome, TransferRequest,
};

//! Domain module
//!
//! Core domain types and business logic.

pub mod account;

pub use account::{Account, AccountPatch, Holder, HolderError, NewAccount};

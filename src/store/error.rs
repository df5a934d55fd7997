//! Account Store Errors
//!
//! Error types surfaced by the account store and transfer evaluator.
//! Raw driver errors never cross the store boundary except through the
//! `Database` variant.

/// Errors that can occur in the account store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An account for the same holder pair already exists
    #[error("Account already exists for holder {first_name} {last_name}")]
    DuplicateAccount {
        first_name: String,
        last_name: String,
    },

    /// No account with the given id
    #[error("Account not found: {0}")]
    NotFound(i64),

    /// A write touched an unexpected number of rows
    #[error("Write integrity violation: expected {expected} row(s), affected {affected}")]
    WriteIntegrity { expected: u64, affected: u64 },

    /// Transfer request failed shape validation
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),

    /// Source account balance cannot cover the transfer amount
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: f64, available: f64 },

    /// A balance write inside the transfer transaction did not apply
    /// cleanly; the transaction was rolled back
    #[error("Transfer atomicity violation: {0}")]
    TransferAtomicity(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Check if this error means the caller sent a bad request rather
    /// than the store failing
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateAccount { .. }
                | StoreError::NotFound(_)
                | StoreError::InvalidTransfer(_)
                | StoreError::InsufficientFunds { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::DuplicateAccount {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
        };
        assert_eq!(err.to_string(), "Account already exists for holder Jane Doe");

        let err = StoreError::WriteIntegrity {
            expected: 1,
            affected: 0,
        };
        assert_eq!(
            err.to_string(),
            "Write integrity violation: expected 1 row(s), affected 0"
        );

        let err = StoreError::InsufficientFunds {
            required: 100.0,
            available: 25.5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: required 100, available 25.5"
        );
    }

    #[test]
    fn test_client_fault_classification() {
        assert!(StoreError::NotFound(7).is_client_fault());
        assert!(StoreError::InvalidTransfer("self transfer".to_string()).is_client_fault());
        assert!(!StoreError::WriteIntegrity {
            expected: 1,
            affected: 2
        }
        .is_client_fault());
        assert!(!StoreError::TransferAtomicity("debit".to_string()).is_client_fault());
    }
}

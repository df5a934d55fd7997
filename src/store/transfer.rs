//! Transfer Evaluator
//!
//! Moves funds between two accounts as one atomic unit. Each request
//! walks a three-phase pipeline: validate (shape checks, then row-locked
//! existence and funds checks), apply (pure balance arithmetic), commit
//! (both balance writes inside the same transaction). Rejection at any
//! phase rolls the transaction back and leaves both balances untouched.

use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};

use super::StoreError;

/// A request to move funds between two accounts.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    pub from_account: i64,
    pub to_account: i64,
    pub amount: f64,
}

impl TransferRequest {
    /// Shape checks that need no database access.
    ///
    /// # Errors
    /// - `InvalidTransfer` for a non-finite or non-positive amount, or
    ///   when source and destination are the same account
    pub fn validate(&self) -> Result<(), StoreError> {
        if !self.amount.is_finite() {
            return Err(StoreError::InvalidTransfer(format!(
                "amount must be finite (got {})",
                self.amount
            )));
        }
        if self.amount <= 0.0 {
            return Err(StoreError::InvalidTransfer(format!(
                "amount must be positive (got {})",
                self.amount
            )));
        }
        if self.from_account == self.to_account {
            return Err(StoreError::InvalidTransfer(
                "source and destination accounts must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// A request that passed validation against locked account rows.
#[derive(Debug, Clone, PartialEq)]
struct ValidatedTransfer {
    from_account: i64,
    to_account: i64,
    amount: f64,
    from_balance: f64,
    to_balance: f64,
}

impl ValidatedTransfer {
    /// Pure arithmetic: both post-transfer balances.
    fn apply(&self) -> AppliedTransfer {
        AppliedTransfer {
            from_account: self.from_account,
            to_account: self.to_account,
            amount: self.amount,
            from_balance_after: self.from_balance - self.amount,
            to_balance_after: self.to_balance + self.amount,
        }
    }
}

/// Both new balances, ready to commit.
#[derive(Debug, Clone, PartialEq)]
struct AppliedTransfer {
    from_account: i64,
    to_account: i64,
    amount: f64,
    from_balance_after: f64,
    to_balance_after: f64,
}

/// Result of a committed transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub from_account: i64,
    pub to_account: i64,
    pub amount: f64,
    /// Source account balance after the transfer
    pub account_balance_after: f64,
}

/// Executes transfers against the accounts table
#[derive(Debug, Clone)]
pub struct TransferEvaluator {
    pool: PgPool,
}

impl TransferEvaluator {
    /// Create a new TransferEvaluator with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run one transfer end to end.
    pub async fn execute(&self, request: &TransferRequest) -> Result<TransferOutcome, StoreError> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        let validated = validate_against_accounts(&mut tx, request).await?;
        let applied = validated.apply();
        commit(tx, &applied).await?;

        tracing::info!(
            "Transferred {} from account {} to account {}",
            applied.amount,
            applied.from_account,
            applied.to_account
        );

        Ok(TransferOutcome {
            from_account: applied.from_account,
            to_account: applied.to_account,
            amount: applied.amount,
            account_balance_after: applied.from_balance_after,
        })
    }
}

/// Lock both account rows and check existence and funds.
///
/// Rows are locked in ascending-id order so two opposite transfers
/// cannot deadlock on each other.
async fn validate_against_accounts(
    tx: &mut Transaction<'_, Postgres>,
    request: &TransferRequest,
) -> Result<ValidatedTransfer, StoreError> {
    let first = request.from_account.min(request.to_account);
    let second = request.from_account.max(request.to_account);

    let first_balance = lock_balance(tx, first).await?;
    let second_balance = lock_balance(tx, second).await?;

    let (from_balance, to_balance) = if first == request.from_account {
        (first_balance, second_balance)
    } else {
        (second_balance, first_balance)
    };

    if from_balance < request.amount {
        return Err(StoreError::InsufficientFunds {
            required: request.amount,
            available: from_balance,
        });
    }

    Ok(ValidatedTransfer {
        from_account: request.from_account,
        to_account: request.to_account,
        amount: request.amount,
        from_balance,
        to_balance,
    })
}

/// Lock one account row and return its balance.
async fn lock_balance(tx: &mut Transaction<'_, Postgres>, id: i64) -> Result<f64, StoreError> {
    let balance: Option<f64> =
        sqlx::query_scalar("SELECT balance FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

    balance.ok_or(StoreError::NotFound(id))
}

/// Persist both new balances and commit.
///
/// Each write must touch exactly one row, otherwise the transaction is
/// rolled back and neither balance changes.
async fn commit(
    mut tx: Transaction<'_, Postgres>,
    applied: &AppliedTransfer,
) -> Result<(), StoreError> {
    let debit = sqlx::query("UPDATE accounts SET balance = $2 WHERE id = $1")
        .bind(applied.from_account)
        .bind(applied.from_balance_after)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if debit != 1 {
        tx.rollback().await?;
        tracing::error!(
            "Debit of account {} affected {} rows, transfer rolled back",
            applied.from_account,
            debit
        );
        return Err(StoreError::TransferAtomicity(format!(
            "debit of account {} affected {} rows",
            applied.from_account, debit
        )));
    }

    let credit = sqlx::query("UPDATE accounts SET balance = $2 WHERE id = $1")
        .bind(applied.to_account)
        .bind(applied.to_balance_after)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if credit != 1 {
        tx.rollback().await?;
        tracing::error!(
            "Credit of account {} affected {} rows, transfer rolled back",
            applied.to_account,
            credit
        );
        return Err(StoreError::TransferAtomicity(format!(
            "credit of account {} affected {} rows",
            applied.to_account, credit
        )));
    }

    tx.commit().await?;

    Ok(())
}

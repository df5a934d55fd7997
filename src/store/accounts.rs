//! Account Store
//!
//! Repository over the accounts table. Every write verifies the number
//! of rows it touched; a mismatch surfaces as `WriteIntegrity` instead
//! of being silently swallowed.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Account, AccountPatch, NewAccount};

use super::StoreError;

/// Named unique constraints on the accounts table
const HOLDER_CONSTRAINT: &str = "accounts_holder_key";
const NUMBER_CONSTRAINT: &str = "accounts_number_key";

/// Attempts at drawing a non-colliding random account number
const MAX_NUMBER_ATTEMPTS: u32 = 3;

/// Outcome of a batch delete: which ids went away, which were absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDelete {
    pub deleted: Vec<i64>,
    pub missing: Vec<i64>,
}

impl BatchDelete {
    /// Partition the requested ids against the set the statement actually
    /// deleted. Duplicate requests for an id count once; request order is
    /// preserved within each partition.
    fn partition(requested: &[i64], deleted_rows: Vec<i64>) -> Self {
        let deleted_set: HashSet<i64> = deleted_rows.into_iter().collect();
        let mut seen = HashSet::new();
        let mut deleted = Vec::new();
        let mut missing = Vec::new();

        for &id in requested {
            if !seen.insert(id) {
                continue;
            }
            if deleted_set.contains(&id) {
                deleted.push(id);
            } else {
                missing.push(id);
            }
        }

        Self { deleted, missing }
    }

    /// True when every requested id was deleted.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Account repository backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct AccountStore {
    pool: PgPool,
}

impl AccountStore {
    /// Create a new AccountStore with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new account from the draft.
    ///
    /// Runs as one transaction: a duplicate-holder check, the insert, and
    /// a returned-row-count verification. A concurrent create for the
    /// same holder loses at the unique constraint, which maps to
    /// `DuplicateAccount`; a random account-number collision gets a fresh
    /// number and another attempt.
    pub async fn create(&self, mut draft: NewAccount) -> Result<Account, StoreError> {
        for attempt in 1..MAX_NUMBER_ATTEMPTS {
            match self.try_create(&draft).await {
                Err(StoreError::Database(e)) if is_number_collision(&e) => {
                    tracing::warn!(
                        "Account number {} collided, retrying with a fresh one (attempt {}/{})",
                        draft.number,
                        attempt,
                        MAX_NUMBER_ATTEMPTS
                    );
                    draft = draft.with_fresh_number();
                }
                other => return other,
            }
        }

        // Last attempt propagates whatever the database says
        self.try_create(&draft).await
    }

    /// Single create attempt
    async fn try_create(&self, draft: &NewAccount) -> Result<Account, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Duplicate-holder check inside the transaction; the unique
        // constraint backstops the race this check cannot close.
        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM accounts WHERE first_name = $1 AND last_name = $2",
        )
        .bind(draft.holder.first_name())
        .bind(draft.holder.last_name())
        .fetch_one(&mut *tx)
        .await?;

        if existing > 0 {
            return Err(StoreError::DuplicateAccount {
                first_name: draft.holder.first_name().to_string(),
                last_name: draft.holder.last_name().to_string(),
            });
        }

        let rows: Vec<(i64, DateTime<Utc>)> = sqlx::query_as(
            r#"
            INSERT INTO accounts (first_name, last_name, number, balance, gold_member, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at
            "#,
        )
        .bind(draft.holder.first_name())
        .bind(draft.holder.last_name())
        .bind(draft.number)
        .bind(draft.balance)
        .bind(draft.gold_member)
        .bind(draft.created_at)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            translate_unique_violation(e, draft.holder.first_name(), draft.holder.last_name())
        })?;

        if rows.len() != 1 {
            tracing::error!(
                "Insert for holder {} returned {} rows, expected 1",
                draft.holder,
                rows.len()
            );
            return Err(StoreError::WriteIntegrity {
                expected: 1,
                affected: rows.len() as u64,
            });
        }

        tx.commit().await?;

        let (id, created_at) = rows[0];
        Ok(Account {
            id,
            first_name: draft.holder.first_name().to_string(),
            last_name: draft.holder.last_name().to_string(),
            number: draft.number,
            balance: draft.balance,
            gold_member: draft.gold_member,
            created_at,
        })
    }

    /// Delete one account by id.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let affected = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        match affected {
            1 => Ok(()),
            0 => Err(StoreError::NotFound(id)),
            n => {
                tracing::error!("Delete of account {} affected {} rows", id, n);
                Err(StoreError::WriteIntegrity {
                    expected: 1,
                    affected: n,
                })
            }
        }
    }

    /// Delete a batch of accounts in one statement.
    ///
    /// Absent ids do not fail the call; the outcome reports the deleted
    /// and missing partitions so callers can tell a partial result from a
    /// complete one. An empty request is a complete no-op.
    pub async fn delete_many(&self, ids: &[i64]) -> Result<BatchDelete, StoreError> {
        if ids.is_empty() {
            return Ok(BatchDelete::partition(ids, Vec::new()));
        }

        let deleted_rows: Vec<i64> =
            sqlx::query_scalar("DELETE FROM accounts WHERE id = ANY($1) RETURNING id")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(BatchDelete::partition(ids, deleted_rows))
    }

    /// Persist the mutable columns of an existing account.
    ///
    /// `id` and `created_at` never change. Renaming into another
    /// account's holder pair maps to `DuplicateAccount`.
    pub async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let affected = sqlx::query(
            r#"
            UPDATE accounts
            SET first_name = $2, last_name = $3, number = $4, balance = $5, gold_member = $6
            WHERE id = $1
            "#,
        )
        .bind(account.id)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.number)
        .bind(account.balance)
        .bind(account.gold_member)
        .execute(&self.pool)
        .await
        .map_err(|e| translate_unique_violation(e, &account.first_name, &account.last_name))?
        .rows_affected();

        match affected {
            1 => Ok(()),
            0 => Err(StoreError::NotFound(account.id)),
            n => {
                tracing::error!("Update of account {} affected {} rows", account.id, n);
                Err(StoreError::WriteIntegrity {
                    expected: 1,
                    affected: n,
                })
            }
        }
    }

    /// Update holder names and/or the gold flag, keyed by id.
    ///
    /// Runs as one transaction with the row locked, so the merge cannot
    /// interleave with a transfer. The balance column is never written
    /// here; balances change only through transfers.
    pub async fn update_profile(
        &self,
        id: i64,
        patch: &AccountPatch,
    ) -> Result<Account, StoreError> {
        let mut tx = self.pool.begin().await?;

        let account: Option<Account> = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, number, balance, gold_member, created_at
            FROM accounts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let mut account = account.ok_or(StoreError::NotFound(id))?;
        patch.apply_to(&mut account);

        let affected = sqlx::query(
            "UPDATE accounts SET first_name = $2, last_name = $3, gold_member = $4 WHERE id = $1",
        )
        .bind(account.id)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.gold_member)
        .execute(&mut *tx)
        .await
        .map_err(|e| translate_unique_violation(e, &account.first_name, &account.last_name))?
        .rows_affected();

        if affected != 1 {
            tracing::error!("Profile update of account {} affected {} rows", id, affected);
            return Err(StoreError::WriteIntegrity {
                expected: 1,
                affected,
            });
        }

        tx.commit().await?;

        Ok(account)
    }

    /// Fetch one account by id; absence is `NotFound`, not a transport
    /// error.
    pub async fn get_by_id(&self, id: i64) -> Result<Account, StoreError> {
        let account: Option<Account> = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, number, balance, gold_member, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        account.ok_or(StoreError::NotFound(id))
    }

    /// All gold-member accounts, lowest id first. No members is an empty
    /// list, not an error.
    pub async fn list_gold_members(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, number, balance, gold_member, created_at
            FROM accounts
            WHERE gold_member
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }
}

/// Translate a unique-constraint violation on the holder pair into the
/// duplicate-account error; anything else stays a database error.
fn translate_unique_violation(err: sqlx::Error, first_name: &str, last_name: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() && db_err.constraint() == Some(HOLDER_CONSTRAINT) {
            return StoreError::DuplicateAccount {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
            };
        }
    }
    StoreError::Database(err)
}

/// True for a unique-constraint violation on the account number.
fn is_number_collision(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(NUMBER_CONSTRAINT)
        }
        _ => false,
    }
}

//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::domain::{Account, AccountPatch, Holder, NewAccount};
use crate::error::AppError;
use crate::store::{AccountStore, TransferEvaluator, TransferRequest};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub number: i64,
    pub balance: f64,
    pub gold_member: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            first_name: account.first_name,
            last_name: account.last_name,
            number: account.number,
            balance: account.balance,
            gold_member: account.gold_member,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gold_member: Option<bool>,
}

impl From<UpdateAccountRequest> for AccountPatch {
    fn from(request: UpdateAccountRequest) -> Self {
        Self {
            first_name: request.first_name,
            last_name: request.last_name,
            gold_member: request.gold_member,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchDeleteResponse {
    pub deleted: Vec<i64>,
    pub not_found: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub from_account: i64,
    pub to_account: i64,
    pub amount: f64,
    pub account_balance_after: f64,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<PgPool> {
    Router::new()
        // Account endpoints
        .route("/accounts", post(create_account))
        .route("/accounts", delete(delete_accounts))
        .route("/accounts/gold", get(list_gold_members))
        .route("/accounts/:id", get(get_account))
        .route("/accounts/:id", patch(update_account))
        .route("/accounts/:id", delete(delete_account))
        // Transfers
        .route("/transfers", post(transfer))
}

// =========================================================================
// POST /accounts
// =========================================================================

/// Create a new account
async fn create_account(
    State(pool): State<PgPool>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let holder = Holder::new(request.first_name, request.last_name)?;
    let store = AccountStore::new(pool);

    let account = store.create(NewAccount::open(holder)).await?;

    tracing::info!(
        "Created account {} for {} {}",
        account.id,
        account.first_name,
        account.last_name
    );

    Ok((StatusCode::CREATED, Json(account.into())))
}

// =========================================================================
// GET /accounts/:id
// =========================================================================

/// Get account by id
async fn get_account(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<Json<AccountResponse>, AppError> {
    let store = AccountStore::new(pool);

    let account = store.get_by_id(id).await?;

    Ok(Json(account.into()))
}

// =========================================================================
// PATCH /accounts/:id
// =========================================================================

/// Update account holder names or the gold flag
///
/// The balance is not a profile field; it only moves through transfers.
async fn update_account(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let patch = AccountPatch::from(request);
    patch.validate()?;

    let store = AccountStore::new(pool);

    let account = store.update_profile(id, &patch).await?;

    Ok(Json(account.into()))
}

// =========================================================================
// DELETE /accounts/:id
// =========================================================================

/// Delete one account
async fn delete_account(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let store = AccountStore::new(pool);

    store.delete(id).await?;
    tracing::info!("Deleted account {}", id);

    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// DELETE /accounts (batch)
// =========================================================================

/// Delete a batch of accounts; the body is a plain id array.
///
/// Responds 200 only when every requested id was deleted; a partial
/// outcome is 404 with both partitions in the body.
async fn delete_accounts(
    State(pool): State<PgPool>,
    Json(ids): Json<Vec<i64>>,
) -> Result<(StatusCode, Json<BatchDeleteResponse>), AppError> {
    let store = AccountStore::new(pool);

    let outcome = store.delete_many(&ids).await?;

    let status = if outcome.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };

    Ok((
        status,
        Json(BatchDeleteResponse {
            deleted: outcome.deleted,
            not_found: outcome.missing,
        }),
    ))
}

// =========================================================================
// GET /accounts/gold
// =========================================================================

/// List gold-member accounts
async fn list_gold_members(
    State(pool): State<PgPool>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let store = AccountStore::new(pool);

    let accounts = store.list_gold_members().await?;

    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

// =========================================================================
// POST /transfers
// =========================================================================

/// Transfer funds between two accounts
async fn transfer(
    State(pool): State<PgPool>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, AppError> {
    let evaluator = TransferEvaluator::new(pool);

    let outcome = evaluator.execute(&request).await?;

    Ok(Json(TransferResponse {
        from_account: outcome.from_account,
        to_account: outcome.to_account,
        amount: outcome.amount,
        account_balance_after: outcome.account_balance_after,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_account_request_deserialize() {
        let json = r#"{
            "first_name": "Jane",
            "last_name": "Doe"
        }"#;

        let request: CreateAccountRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.first_name, "Jane");
        assert_eq!(request.last_name, "Doe");
    }

    #[test]
    fn test_update_account_request_defaults() {
        let request: UpdateAccountRequest = serde_json::from_str("{}").unwrap();
        assert!(request.first_name.is_none());
        assert!(request.last_name.is_none());
        assert!(request.gold_member.is_none());

        let request: UpdateAccountRequest =
            serde_json::from_str(r#"{"gold_member": true}"#).unwrap();
        assert_eq!(request.gold_member, Some(true));

        let patch = AccountPatch::from(request);
        assert_eq!(patch.gold_member, Some(true));
        assert!(patch.first_name.is_none());
    }

    #[test]
    fn test_batch_delete_body_is_plain_id_array() {
        let ids: Vec<i64> = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_account_response_field_names() {
        let response = AccountResponse {
            id: 1,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            number: 42,
            balance: 0.0,
            gold_member: false,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&response).unwrap();
        for key in [
            "id",
            "first_name",
            "last_name",
            "number",
            "balance",
            "gold_member",
            "created_at",
        ] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
    }
}

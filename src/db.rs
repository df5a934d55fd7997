//! Database module
//!
//! Connection manager: builds the PostgreSQL pool from configuration,
//! verifies connectivity, and ensures the accounts schema exists.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::config::Config;

/// Table backing the account store
const ACCOUNTS_TABLE: &str = "accounts";

/// DDL for the accounts table. Both unique constraints are named so
/// violation errors can be told apart when translating them.
const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id          BIGSERIAL PRIMARY KEY,
    first_name  VARCHAR(150) NOT NULL,
    last_name   VARCHAR(150) NOT NULL,
    number      BIGINT NOT NULL,
    balance     DOUBLE PRECISION NOT NULL DEFAULT 0,
    gold_member BOOLEAN NOT NULL DEFAULT FALSE,
    created_at  TIMESTAMPTZ NOT NULL,
    CONSTRAINT accounts_holder_key UNIQUE (first_name, last_name),
    CONSTRAINT accounts_number_key UNIQUE (number)
)
"#;

/// Build the connection pool and verify connectivity with a ping.
///
/// A failure here is fatal at startup; callers do not retry.
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(&config.database_url)?.options([(
        "statement_timeout",
        config.database_statement_timeout_ms.to_string(),
    )]);

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.database_acquire_timeout)
        .connect_with(options)
        .await?;

    // Connectivity check before the pool is handed out
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Ensure the accounts table exists, creating it when absent.
///
/// Safe to call on every startup: the existence check reads
/// information_schema and the DDL is idempotent, so concurrent startups
/// converge on the same schema.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = $1
        )
        "#,
    )
    .bind(ACCOUNTS_TABLE)
    .fetch_one(pool)
    .await?;

    if exists {
        tracing::debug!("Table '{}' already exists", ACCOUNTS_TABLE);
        return Ok(());
    }

    sqlx::query(CREATE_ACCOUNTS_TABLE).execute(pool).await?;
    tracing::info!("Created table '{}'", ACCOUNTS_TABLE);

    Ok(())
}

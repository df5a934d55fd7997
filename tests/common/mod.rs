//! Common test utilities

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Setup test database - ensure the schema exists and start from an
/// empty accounts table. Database tests assume serial execution
/// (`cargo test -- --ignored --test-threads=1`).
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    bankd::db::ensure_schema(&pool)
        .await
        .expect("Failed to ensure schema");

    sqlx::query("TRUNCATE TABLE accounts RESTART IDENTITY")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}

/// Fund an account directly; the API itself only moves balances through
/// transfers.
pub async fn set_balance(pool: &PgPool, id: i64, balance: f64) {
    let affected = sqlx::query("UPDATE accounts SET balance = $2 WHERE id = $1")
        .bind(id)
        .bind(balance)
        .execute(pool)
        .await
        .expect("Failed to set balance")
        .rows_affected();

    assert_eq!(affected, 1, "expected exactly one account to be funded");
}

/// Read one balance straight from the table.
pub async fn balance_of(pool: &PgPool, id: i64) -> f64 {
    sqlx::query_scalar("SELECT balance FROM accounts WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("Failed to read balance")
}

//! Pagekit test utilities.
//!
//! Helpers for integration testing: an in-memory SQLite store seeded with
//! transaction rows, fixture builders, and tracing setup.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Table the fixtures are written to.
pub const TRANSACTIONS_TABLE: &str = "transactions";

/// Table for the person fixtures.
pub const PEOPLE_TABLE: &str = "people";

/// A transaction row as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: i64,
    pub account_number: String,
    pub trx_date: String,
    pub trx_amount: f64,
    pub trx_type: String,
    pub cif: String,
}

/// Create a test transaction with default values.
pub fn test_transaction(account_number: &str, trx_amount: f64, trx_type: &str) -> TestTransaction {
    TestTransaction {
        account_number: account_number.to_string(),
        trx_date: "2024-01-01".to_string(),
        trx_amount,
        trx_type: trx_type.to_string(),
        cif: "ABC123".to_string(),
    }
}

/// A transaction builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestTransaction {
    pub account_number: String,
    pub trx_date: String,
    pub trx_amount: f64,
    pub trx_type: String,
    pub cif: String,
}

impl TestTransaction {
    /// Set the transaction date (`YYYY-MM-DD`).
    pub fn on(mut self, trx_date: &str) -> Self {
        self.trx_date = trx_date.to_string();
        self
    }

    /// Set the customer identifier.
    pub fn with_cif(mut self, cif: &str) -> Self {
        self.cif = cif.to_string();
        self
    }
}

/// Three rows: amounts 100/200/300, types income/expense/income, one
/// account and one customer each.
pub fn standard_transactions() -> Vec<TestTransaction> {
    vec![
        test_transaction("123", 100.0, "income")
            .on("2024-01-01")
            .with_cif("ABC123"),
        test_transaction("456", 200.0, "expense")
            .on("2024-01-02")
            .with_cif("DEF456"),
        test_transaction("789", 300.0, "income")
            .on("2024-01-03")
            .with_cif("GHI789"),
    ]
}

/// Open a single-connection in-memory SQLite pool.
///
/// Every connection to `sqlite::memory:` is its own database, so the pool is
/// pinned to one connection that never expires.
pub async fn memory_pool() -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

/// Create the transactions table and insert `rows` in order (ids from 1).
pub async fn transactions_pool(rows: &[TestTransaction]) -> Result<SqlitePool, sqlx::Error> {
    let pool = memory_pool().await?;

    sqlx::query(
        r#"
        CREATE TABLE transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_number TEXT NOT NULL,
            trx_date TEXT NOT NULL,
            trx_amount REAL NOT NULL,
            trx_type TEXT NOT NULL,
            cif TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    for row in rows {
        sqlx::query(
            "INSERT INTO transactions (account_number, trx_date, trx_amount, trx_type, cif) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&row.account_number)
        .bind(&row.trx_date)
        .bind(row.trx_amount)
        .bind(&row.trx_type)
        .bind(&row.cif)
        .execute(&pool)
        .await?;
    }

    Ok(pool)
}

/// A person row as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub age: i64,
}

/// John (30), Jane (25) and Doe (35, no email).
pub async fn people_pool() -> Result<SqlitePool, sqlx::Error> {
    let pool = memory_pool().await?;

    sqlx::query(
        r#"
        CREATE TABLE people (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT,
            age INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    let people: [(&str, Option<&str>, i64); 3] = [
        ("John", Some("john@example.com"), 30),
        ("Jane", Some("jane@example.com"), 25),
        ("Doe", None, 35),
    ];
    for (name, email, age) in people {
        sqlx::query("INSERT INTO people (name, email, age) VALUES (?, ?, ?)")
            .bind(name)
            .bind(email)
            .bind(age)
            .execute(&pool)
            .await?;
    }

    Ok(pool)
}

/// Install a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,pagekit=debug,sqlx=warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_builder() {
        let trx = test_transaction("123", 50.0, "expense")
            .on("2024-03-01")
            .with_cif("XYZ");

        assert_eq!(trx.account_number, "123");
        assert_eq!(trx.trx_date, "2024-03-01");
        assert_eq!(trx.cif, "XYZ");
    }

    #[test]
    fn test_standard_transactions() {
        let rows = standard_transactions();
        let total: f64 = rows.iter().map(|r| r.trx_amount).sum();
        assert_eq!(rows.len(), 3);
        assert_eq!(total, 600.0);
    }

    #[tokio::test]
    async fn test_transactions_pool_round_trip() {
        let pool = transactions_pool(&standard_transactions()).await.unwrap();
        let rows: Vec<Transaction> = sqlx::query_as("SELECT * FROM transactions ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[2].trx_amount, 300.0);
    }

    #[tokio::test]
    async fn test_people_pool() {
        let pool = people_pool().await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM people")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 3);
    }
}

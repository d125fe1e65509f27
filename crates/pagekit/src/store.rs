//! Store seam: the already-open database handle a paginator runs against.
//!
//! The engine never opens connections. Callers hand in a pool, and every
//! operation here is one independent round trip.

use async_trait::async_trait;
use sea_query::{PostgresQueryBuilder, SelectStatement, SqliteQueryBuilder};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Database, FromRow, PgPool, Row, SqlitePool};

use crate::pagination::query_builder::BUCKET_TEXT;
use crate::pagination::types::Bucket;

/// SQL dialect a query is rendered for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Resolve a dialect by name, falling back to PostgreSQL.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Dialect::Postgres,
            "sqlite" | "sqlite3" => Dialect::Sqlite,
            other => {
                tracing::warn!(dialect = other, "unknown dialect, using postgres");
                Dialect::Postgres
            }
        }
    }

    /// Render a statement to SQL text.
    pub fn render(self, statement: &SelectStatement) -> String {
        match self {
            Dialect::Postgres => statement.to_string(PostgresQueryBuilder),
            Dialect::Sqlite => statement.to_string(SqliteQueryBuilder),
        }
    }

    /// Floating point type numeric aggregates are cast to.
    pub fn float_type(self) -> &'static str {
        match self {
            Dialect::Postgres => "DOUBLE PRECISION",
            Dialect::Sqlite => "REAL",
        }
    }
}

/// An open store that can execute rendered queries.
#[async_trait]
pub trait Store: Send + Sync {
    /// Driver database type.
    type Db: Database;

    /// Dialect used to render queries for this store.
    fn dialect(&self) -> Dialect;

    /// Fetch typed rows.
    async fn fetch_rows<T>(&self, sql: &str) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, <Self::Db as Database>::Row> + Send + Unpin;

    /// Fetch a single `COUNT(*)` result.
    async fn fetch_count(&self, sql: &str) -> Result<i64, sqlx::Error>;

    /// Fetch a single numeric aggregate. NULL (no rows) yields `None`.
    async fn fetch_number(&self, sql: &str) -> Result<Option<f64>, sqlx::Error>;

    /// Fetch `(value, count)` pairs.
    async fn fetch_buckets(&self, sql: &str) -> Result<Vec<Bucket>, sqlx::Error>;
}

#[async_trait]
impl Store for PgPool {
    type Db = sqlx::Postgres;

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch_rows<T>(&self, sql: &str) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, <Self::Db as Database>::Row> + Send + Unpin,
    {
        sqlx::query_as::<sqlx::Postgres, T>(sql).fetch_all(self).await
    }

    async fn fetch_count(&self, sql: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<sqlx::Postgres, i64>(sql).fetch_one(self).await
    }

    async fn fetch_number(&self, sql: &str) -> Result<Option<f64>, sqlx::Error> {
        sqlx::query_scalar::<sqlx::Postgres, Option<f64>>(sql)
            .fetch_one(self)
            .await
    }

    async fn fetch_buckets(&self, sql: &str) -> Result<Vec<Bucket>, sqlx::Error> {
        let rows = sqlx::query(sql).fetch_all(self).await?;
        rows.iter().map(pg_bucket).collect()
    }
}

#[async_trait]
impl Store for SqlitePool {
    type Db = sqlx::Sqlite;

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch_rows<T>(&self, sql: &str) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, <Self::Db as Database>::Row> + Send + Unpin,
    {
        sqlx::query_as::<sqlx::Sqlite, T>(sql).fetch_all(self).await
    }

    async fn fetch_count(&self, sql: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<sqlx::Sqlite, i64>(sql).fetch_one(self).await
    }

    async fn fetch_number(&self, sql: &str) -> Result<Option<f64>, sqlx::Error> {
        sqlx::query_scalar::<sqlx::Sqlite, Option<f64>>(sql)
            .fetch_one(self)
            .await
    }

    async fn fetch_buckets(&self, sql: &str) -> Result<Vec<Bucket>, sqlx::Error> {
        let rows = sqlx::query(sql).fetch_all(self).await?;
        rows.iter().map(sqlite_bucket).collect()
    }
}

/// Decode a bucket row from PostgreSQL (`value, count, value_text`).
///
/// Integer, float and boolean values keep their JSON type; anything else
/// (dates, timestamps, numerics, uuids, text) comes from the text column.
fn pg_bucket(row: &PgRow) -> Result<Bucket, sqlx::Error> {
    let value = if let Ok(v) = row.try_get::<Option<i64>, _>(0) {
        v.map(serde_json::Value::from)
    } else if let Ok(v) = row.try_get::<Option<i32>, _>(0) {
        v.map(serde_json::Value::from)
    } else if let Ok(v) = row.try_get::<Option<i16>, _>(0) {
        v.map(serde_json::Value::from)
    } else if let Ok(v) = row.try_get::<Option<f64>, _>(0) {
        v.map(serde_json::Value::from)
    } else if let Ok(v) = row.try_get::<Option<f32>, _>(0) {
        v.map(serde_json::Value::from)
    } else if let Ok(v) = row.try_get::<Option<bool>, _>(0) {
        v.map(serde_json::Value::from)
    } else {
        row.try_get::<Option<String>, _>(BUCKET_TEXT)?
            .map(serde_json::Value::from)
    };

    Ok(Bucket {
        value: value.unwrap_or(serde_json::Value::Null),
        count: row.try_get("count")?,
    })
}

/// Decode a bucket row from SQLite (`value, count, value_text`).
fn sqlite_bucket(row: &SqliteRow) -> Result<Bucket, sqlx::Error> {
    let value = if let Ok(v) = row.try_get::<Option<i64>, _>(0) {
        v.map(serde_json::Value::from)
    } else if let Ok(v) = row.try_get::<Option<f64>, _>(0) {
        v.map(serde_json::Value::from)
    } else {
        row.try_get::<Option<String>, _>(BUCKET_TEXT)?
            .map(serde_json::Value::from)
    };

    Ok(Bucket {
        value: value.unwrap_or(serde_json::Value::Null),
        count: row.try_get("count")?,
    })
}

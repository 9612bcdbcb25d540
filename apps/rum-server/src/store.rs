//! RUM sample persistence

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::models::{DbRumSample, RumSample};

/// Append-only store of RUM samples
#[async_trait]
pub trait RumStore: Send + Sync {
    async fn append(&self, sample: &RumSample) -> Result<(), sqlx::Error>;

    /// Samples ordered by timestamp ascending, optionally filtered by exact `pageUrl`
    async fn query(&self, page_url: Option<&str>) -> Result<Vec<RumSample>, sqlx::Error>;
}

/// SQLite-backed [`RumStore`]
#[derive(Clone)]
pub struct SqliteRumStore {
    pool: SqlitePool,
}

impl SqliteRumStore {
    /// Connect and run migrations
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        tracing::info!("Connecting to database: {}", database_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database, used by tests
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        // Each connection to :memory: is its own database, so keep exactly one
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        tracing::info!("Running database migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rum_samples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                inp REAL NOT NULL,
                element TEXT NOT NULL,
                device TEXT,
                browser TEXT,
                os TEXT,
                connection TEXT,
                page_url TEXT,
                received_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_rum_samples_page_url ON rum_samples(page_url, timestamp)
            "#,
        )
        .execute(pool)
        .await?;

        tracing::info!("Migrations complete");
        Ok(())
    }
}

#[async_trait]
impl RumStore for SqliteRumStore {
    async fn append(&self, sample: &RumSample) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO rum_samples (timestamp, inp, element, device, browser, os, connection, page_url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sample.timestamp)
        .bind(sample.inp)
        .bind(&sample.element)
        .bind(&sample.device)
        .bind(&sample.browser)
        .bind(&sample.os)
        .bind(&sample.connection)
        .bind(&sample.page_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query(&self, page_url: Option<&str>) -> Result<Vec<RumSample>, sqlx::Error> {
        let rows: Vec<DbRumSample> = sqlx::query_as(
            r#"
            SELECT timestamp, inp, element, device, browser, os, connection, page_url
            FROM rum_samples
            WHERE (?1 IS NULL OR page_url = ?1)
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(page_url)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RumSample::from).collect())
    }
}

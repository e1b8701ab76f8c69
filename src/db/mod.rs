// Database module - provides data access layer

use std::str::FromStr;
use std::time::Duration;

use color_eyre::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

pub mod models;
pub use models::*;

mod error;
pub use error::StoreError;

mod answer;
mod category;
mod migrations;
mod question;
mod quiz;
mod user;

// Main database handle
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        // Verify connection
        let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await?;
        color_eyre::eyre::ensure!(one == 1, "connection check failed");

        migrations::run(&pool).await?;

        tracing::info!("database connection has been verified");

        Ok(Self { pool })
    }

    /// Raw pool access for diagnostics and tests.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Write transaction that takes the SQLite write lock at `BEGIN`, so a
    /// second writer waits on the busy timeout instead of failing with `SQLITE_BUSY`.
    pub(crate) async fn write_tx(&self) -> Result<Tx<'static>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    pub async fn migration_applied(&self, version: &str) -> Result<bool> {
        let applied: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?)",
        )
        .bind(version)
        .fetch_one(&self.pool)
        .await?;

        Ok(applied)
    }
}

pub(crate) type Tx<'c> = sqlx::Transaction<'c, sqlx::Sqlite>;

pub(crate) fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

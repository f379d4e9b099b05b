//! SQLite-backed persistence for every MailAggregator entity.
//!
//! A single logical transactional store behind a `Store` struct holding a
//! `SqlitePool`. Every operation is a real method backed by parameterized
//! `sqlx::query` calls; `insert_message_if_new` relies on the
//! `UNIQUE(account_id, message_id)` index and catches the resulting
//! constraint violation to implement the "return existing row" contract
//! without a pre-check race.

pub mod accounts;
pub mod error;
pub mod maintenance;
pub mod messages;
pub mod poll_status;
pub mod push_filters;
pub mod rules;
pub mod settings;
pub mod types;

use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub use error::{Result, StoreError};
pub use types::*;

/// Run the store's migrations against a pool. Call once at startup, before
/// constructing a [`Store`].
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// SQLite-backed implementation of every persistence operation the rest of
/// the workspace needs.
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Connect with a fresh pool and run migrations. Use for the top-level
    /// application database.
    pub async fn connect(database_url: &str) -> Result<Self> {
        // `ON DELETE CASCADE` in the migration is inert unless foreign keys
        // are switched on per-connection; SQLite defaults this off.
        let options = SqliteConnectOptions::from_str(database_url)?
            .foreign_keys(true)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Build a store from an existing pool. Migrations must already have run.
    #[must_use]
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// In-memory store for tests — migrates immediately.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

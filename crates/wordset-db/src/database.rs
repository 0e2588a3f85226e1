use crate::{repos::Repos, Error, Result};
use futures_util::future::BoxFuture;
use sqlx::{
    pool::PoolConnection,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite, SqliteConnection,
};
use std::{str::FromStr, time::Duration};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

tokio::task_local! {
    // Set while an `atomic` closure is running on the current task.
    static IN_TRANSACTION: ();
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://wordset.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Unit-of-work store.
///
/// Hands out stateless repositories together with an execution handle: either
/// a pooled connection (`acquire`) or the connection of an open transaction
/// (`atomic`). It is the only component that opens transactions.
///
/// Transactions run on a dedicated single-connection `writer` pool: a deferred
/// SQLite transaction that reads before writing fails with `SQLITE_BUSY` when
/// another connection committed in between, instead of waiting for the lock.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    writer: Pool<Sqlite>,
}

impl Database {
    /// Create new database connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| Error::Connection(format!("{}: {}", config.url, e)))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options.clone())
            .await?;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        tracing::info!(url = %config.url, "connected to database");

        Ok(Self { pool, writer })
    }

    /// Private in-memory database with the schema applied.
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled and also serves
    /// as the writer.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self {
            writer: pool.clone(),
            pool,
        };
        db.init_schema().await?;
        Ok(db)
    }

    /// Initialize database schema
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS study_sets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                phrase_language TEXT NOT NULL,
                definition_language TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS definitions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                study_set_id INTEGER NOT NULL,
                phrase TEXT NOT NULL,
                meaning TEXT NOT NULL,
                sentences TEXT NOT NULL DEFAULT '[]',
                FOREIGN KEY (study_set_id) REFERENCES study_sets(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                study_set_id INTEGER NOT NULL,
                state TEXT NOT NULL DEFAULT 'pending'
                    CHECK (state IN ('pending', 'done', 'failed')),
                failure TEXT,
                created_at TEXT NOT NULL,
                finished_at TEXT,
                FOREIGN KEY (study_set_id) REFERENCES study_sets(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Create indexes
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_study_sets_owner ON study_sets(owner_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_definitions_study_set ON definitions(study_set_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_state ON tasks(state)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub fn repos(&self) -> Repos {
        Repos::default()
    }

    /// Pooled connection for reads that need no cross-statement consistency.
    /// Each statement runs in its own implicit transaction. Writes go through
    /// [`Database::atomic`] so they share the writer connection.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        if IN_TRANSACTION.try_with(|_| ()).is_ok() {
            return Err(Error::NestedTransaction);
        }
        Ok(self.pool.acquire().await?)
    }

    /// Run `f` inside one transaction.
    ///
    /// Commits when `f` returns `Ok`. When `f` returns `Err` the transaction is
    /// rolled back and that same error is returned; only a failed rollback
    /// replaces it, with [`Error::Rollback`]. If the returned future is dropped
    /// before completion the open transaction is rolled back on drop.
    ///
    /// Calling `atomic` (or `acquire`) from inside `f` fails fast with
    /// [`Error::NestedTransaction`] instead of opening a second transaction.
    pub async fn atomic<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut SqliteConnection, Repos) -> BoxFuture<'c, std::result::Result<T, E>>,
        E: From<Error> + std::fmt::Display,
    {
        if IN_TRANSACTION.try_with(|_| ()).is_ok() {
            return Err(Error::NestedTransaction.into());
        }

        let mut tx = self.writer.begin().await.map_err(Error::from)?;

        let outcome = IN_TRANSACTION.scope((), f(&mut *tx, self.repos())).await;

        match outcome {
            Ok(value) => {
                tx.commit().await.map_err(Error::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(
                        error = %err,
                        rollback_error = %rollback_err,
                        "failed to roll back transaction"
                    );
                    return Err(Error::Rollback {
                        cause: err.to_string(),
                        source: rollback_err,
                    }
                    .into());
                }
                tracing::debug!(error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }

    /// Fail every task left `pending` by a previous process.
    ///
    /// Workers live inside the process that created them, so at startup no
    /// pending task has an owner any more.
    pub async fn reap_pending_tasks(&self) -> Result<u64> {
        let reaped = self
            .atomic(|conn, repos| {
                Box::pin(async move {
                    repos
                        .tasks
                        .fail_all_pending(conn, wordset_core::FailureReason::Interrupted)
                        .await
                })
            })
            .await?;

        if reaped > 0 {
            tracing::warn!(count = reaped, "marked orphaned pending tasks as failed");
        }

        Ok(reaped)
    }

    pub async fn close(&self) {
        self.writer.close().await;
        self.pool.close().await;
    }
}

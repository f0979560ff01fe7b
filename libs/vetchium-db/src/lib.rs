//! Database access layer.
//!
//! Wraps a SeaORM connection behind [`Db`] and narrows the driver error
//! surface to the four kinds the rest of the system is allowed to depend on:
//! not-found, unique-violation, invalid-state and transient backend failure.
//! Handlers translate these to HTTP statuses; domain code never inspects
//! `sea_orm::DbErr` directly.
//!
//! Transactions run through [`Db::with_tx`], which commits iff the closure
//! returns `Ok`. The global pool and each regional pool expose the same
//! combinator, so multi-plane coordinators pick the pool and keep the calling
//! convention.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Boxed future type used by the [`Db::with_tx`] closure.
pub type TxFuture<'c, T, E> = Pin<Box<dyn Future<Output = std::result::Result<T, E>> + Send + 'c>>;

/// The error taxonomy surfaced by the persistence ports.
#[derive(Debug, Error)]
pub enum DbError {
    /// The requested row does not exist (or has expired out of view).
    #[error("record not found")]
    NotFound,

    /// A unique index rejected the write. This is a documented business
    /// outcome (409) for signup and claim races, not a bug.
    #[error("unique constraint violation")]
    UniqueViolation,

    /// The row exists but is not in a state that permits the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Anything else: connection loss, timeouts, driver faults.
    #[error(transparent)]
    Backend(sea_orm::DbErr),
}

impl From<sea_orm::DbErr> for DbError {
    fn from(e: sea_orm::DbErr) -> Self {
        if matches!(e, sea_orm::DbErr::RecordNotFound(_)) {
            return DbError::NotFound;
        }
        match e.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => DbError::UniqueViolation,
            _ => DbError::Backend(e),
        }
    }
}

/// Supported engines. Production runs Postgres; tests run SQLite in memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

/// Connection pool options applied at connect time.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    pub max_conns: u32,
    pub min_conns: u32,
    pub acquire_timeout: Duration,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: 10,
            min_conns: 0,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// A pooled database handle.
///
/// Cloning is cheap (the underlying pool is shared). One `Db` exists for the
/// global store and one per configured region.
#[derive(Clone)]
pub struct Db {
    engine: DbEngine,
    sea: DatabaseConnection,
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Db {
    /// Detect the engine from a DSN scheme.
    ///
    /// # Errors
    /// Returns `DbError::InvalidState` if the scheme is not recognized.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        let s = dsn.trim_start();
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::InvalidState(format!("unknown DSN scheme: {dsn}")))
        }
    }

    /// Connect a pool for the given DSN.
    ///
    /// # Errors
    /// Returns an error if the DSN is invalid or the connection fails.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = Self::detect(dsn)?;
        let mut conn_opts = ConnectOptions::new(dsn.to_owned());
        conn_opts
            .max_connections(opts.max_conns)
            .min_connections(opts.min_conns)
            .acquire_timeout(opts.acquire_timeout)
            .sqlx_logging(false);
        let sea = Database::connect(conn_opts).await.map_err(DbError::from)?;
        Ok(Self { engine, sea })
    }

    #[must_use]
    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// Borrow the underlying connection for non-transactional queries.
    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        &self.sea
    }

    /// Execute a closure inside a transaction, mapping infrastructure errors
    /// into the caller's error type.
    ///
    /// The transaction commits iff the closure returns `Ok`; on `Err` it is
    /// rolled back and the closure's error propagates unchanged. Rollback
    /// failures are logged, never surfaced over the business error.
    ///
    /// # Errors
    /// Returns `E` if beginning or committing the transaction fails (mapped
    /// from [`DbError`]) or if the closure returns an error.
    pub async fn with_tx<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        E: From<DbError> + Send,
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> TxFuture<'c, T, E> + Send,
        T: Send,
    {
        let txn = self
            .sea
            .begin()
            .await
            .map_err(DbError::from)
            .map_err(E::from)?;

        match f(&txn).await {
            Ok(v) => {
                txn.commit().await.map_err(DbError::from).map_err(E::from)?;
                Ok(v)
            }
            Err(e) => {
                if let Err(rb) = txn.rollback().await {
                    tracing::warn!(error = %rb, "transaction rollback failed");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ConnectionTrait;

    async fn memory_db() -> Db {
        let db = Db::connect("sqlite::memory:", ConnectOpts::default())
            .await
            .expect("sqlite memory connect");
        db.conn()
            .execute_unprepared("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)")
            .await
            .expect("create table");
        db
    }

    async fn count_items(db: &Db) -> i64 {
        let row = db
            .conn()
            .query_one(sea_orm::Statement::from_string(
                sea_orm::DatabaseBackend::Sqlite,
                "SELECT COUNT(*) AS n FROM items",
            ))
            .await
            .expect("query")
            .expect("row");
        row.try_get::<i64>("", "n").expect("count column")
    }

    #[test]
    fn engine_detection() {
        assert_eq!(Db::detect("sqlite::memory:").unwrap(), DbEngine::Sqlite);
        assert_eq!(
            Db::detect("postgres://localhost/app").unwrap(),
            DbEngine::Postgres
        );
        assert!(Db::detect("mongodb://localhost").is_err());
    }

    #[tokio::test]
    async fn with_tx_commits_on_ok() {
        let db = memory_db().await;
        db.with_tx::<_, DbError, _>(|tx| {
            Box::pin(async move {
                tx.execute_unprepared("INSERT INTO items (name) VALUES ('a')")
                    .await?;
                Ok(())
            })
        })
        .await
        .expect("tx");
        assert_eq!(count_items(&db).await, 1);
    }

    #[tokio::test]
    async fn with_tx_rolls_back_on_err() {
        let db = memory_db().await;
        let res: std::result::Result<(), DbError> = db
            .with_tx(|tx| {
                Box::pin(async move {
                    tx.execute_unprepared("INSERT INTO items (name) VALUES ('a')")
                        .await?;
                    Err(DbError::InvalidState("boom".into()))
                })
            })
            .await;
        assert!(res.is_err());
        assert_eq!(count_items(&db).await, 0);
    }

    #[tokio::test]
    async fn unique_violation_maps_to_taxonomy() {
        let db = memory_db().await;
        db.conn()
            .execute_unprepared("INSERT INTO items (name) VALUES ('dup')")
            .await
            .expect("first insert");
        let err = db
            .conn()
            .execute_unprepared("INSERT INTO items (name) VALUES ('dup')")
            .await
            .expect_err("duplicate insert");
        assert!(matches!(DbError::from(err), DbError::UniqueViolation));
    }
}

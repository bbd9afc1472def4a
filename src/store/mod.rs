//! Wallet store backends and the unit-of-work boundary
//!
//! # Components
//!
//! - `memory` - In-process store with per-row async locks (tests, simulation)
//! - `postgres` - PostgreSQL store using `SELECT ... FOR UPDATE` row locks
//!
//! [`run_in_transaction`] is the only place sessions are opened and closed.

pub mod memory;
pub mod postgres;

pub use memory::{InMemorySession, InMemoryWalletStore};
pub use postgres::{Database, PostgresWalletStore};

use crate::core::WalletStore;
use crate::types::StoreError;
use futures::future::BoxFuture;
use std::time::Duration;
use tracing::warn;

/// Run `f` inside one store session
///
/// Commits when `f` returns `Ok`, rolls back when it returns `Err`. If `f`
/// panics or the returned future is dropped before completion, the session is
/// dropped uncommitted and the store discards it, so no exit path leaves a
/// partial update behind.
///
/// The closure receives the store and the open session and must box its
/// future, the same shape as `sqlx` transaction callbacks:
///
/// ```ignore
/// run_in_transaction(&store, move |store, session| {
///     Box::pin(async move { Ok(store.get(session, &address).await?) })
/// })
/// .await
/// ```
pub async fn run_in_transaction<S, T, E, F>(store: &S, f: F) -> Result<T, E>
where
    S: WalletStore + ?Sized,
    E: From<StoreError> + std::fmt::Display,
    F: for<'s> FnOnce(&'s S, &'s mut S::Session) -> BoxFuture<'s, Result<T, E>>,
{
    let mut session = store.begin().await?;

    let outcome = f(store, &mut session).await;

    match outcome {
        Ok(value) => {
            store.commit(session).await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = store.rollback(session).await {
                warn!(error = %err, rollback_error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

/// Store settings shared by both backends
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Maximum time a session waits for a row lock (`None` waits forever)
    pub lock_timeout: Option<Duration>,
    /// PostgreSQL pool size
    pub max_connections: u32,
    /// PostgreSQL connection string, required by the postgres backend
    pub database_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Some(Duration::from_secs(5)),
            max_connections: 10,
            database_url: None,
        }
    }
}

//! In-memory wallet store
//!
//! Rows live in a `DashMap` keyed by address. Each row carries its own async
//! mutex that plays the role of a database row lock: a session acquires it in
//! `get_for_update` (or implicitly in `create` and `set_balance`) and keeps the
//! owned guard until the session ends.
//!
//! # Visibility
//!
//! - Balance writes are staged in the session and published at commit.
//! - Rows inserted by `create` stay invisible to other sessions until the
//!   creating session commits, and are removed again if it rolls back.
//! - A `create` that meets another session's uncommitted row waits for that
//!   session. It fails with `AlreadyExists` only if the other session commits.
//! - Publishing happens under a write gate that unlocked readers (`get`, `list`)
//!   take for reading, so they never observe half of a commit.

use crate::core::WalletStore;
use crate::store::StoreConfig;
use crate::types::{Address, Balance, StoreError, Wallet};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::warn;

#[derive(Debug)]
struct Row {
    lock: Arc<Mutex<()>>,
    balance: AtomicI64,
    committed: AtomicBool,
}

impl Row {
    fn pending(balance: Balance) -> Self {
        Row {
            lock: Arc::new(Mutex::new(())),
            balance: AtomicI64::new(balance),
            committed: AtomicBool::new(false),
        }
    }

    fn is_committed(&self) -> bool {
        self.committed.load(Ordering::Acquire)
    }

    fn balance(&self) -> Balance {
        self.balance.load(Ordering::Acquire)
    }
}

type RowTable = DashMap<Address, Arc<Row>>;

/// Thread-safe in-memory wallet store
///
/// Cloning is cheap and every clone shares the same rows, so one store can be
/// handed to many concurrent tasks.
#[derive(Debug, Clone)]
pub struct InMemoryWalletStore {
    rows: Arc<RowTable>,
    publish: Arc<RwLock<()>>,
    lock_timeout: Option<Duration>,
}

/// Lock held by a session, with the row it protects
struct HeldRow {
    row: Arc<Row>,
    _guard: OwnedMutexGuard<()>,
}

/// Open session on an [`InMemoryWalletStore`]
///
/// Dropping the session without committing rolls it back.
pub struct InMemorySession {
    rows: Arc<RowTable>,
    held: HashMap<Address, HeldRow>,
    staged: HashMap<Address, Balance>,
    created: Vec<Address>,
    committed: bool,
}

impl InMemorySession {
    /// This session's view of a row it holds the lock for
    fn view(&self, address: &Address) -> Option<Wallet> {
        let held = self.held.get(address)?;
        let balance = self
            .staged
            .get(address)
            .copied()
            .unwrap_or_else(|| held.row.balance());
        Some(Wallet::new(address.clone(), balance))
    }
}

impl fmt::Debug for InMemorySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemorySession")
            .field("locked", &self.held.keys().collect::<Vec<_>>())
            .field("staged", &self.staged)
            .field("created", &self.created)
            .finish()
    }
}

impl Drop for InMemorySession {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Row guards are still held here; fields drop after this body.
        for address in &self.created {
            if let Some(held) = self.held.get(address) {
                self.rows
                    .remove_if(address, |_, row| Arc::ptr_eq(row, &held.row));
            }
        }
    }
}

impl InMemoryWalletStore {
    /// Create an empty store whose lock waits never time out
    pub fn new() -> Self {
        Self {
            rows: Arc::new(DashMap::new()),
            publish: Arc::new(RwLock::new(())),
            lock_timeout: None,
        }
    }

    /// Create an empty store using the lock timeout from `config`
    pub fn with_config(config: &StoreConfig) -> Self {
        Self::new().with_lock_timeout(config.lock_timeout)
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Option<Duration>) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Number of rows, including rows whose creation is not yet committed
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    async fn lock_row(
        &self,
        address: &Address,
        row: &Arc<Row>,
    ) -> Result<OwnedMutexGuard<()>, StoreError> {
        let acquire = Arc::clone(&row.lock).lock_owned();
        match self.lock_timeout {
            Some(limit) => tokio::time::timeout(limit, acquire).await.map_err(|_| {
                warn!(address = %address, timeout_ms = limit.as_millis() as u64, "Lock wait timed out");
                StoreError::lock_timeout(address)
            }),
            None => Ok(acquire.await),
        }
    }
}

impl Default for InMemoryWalletStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    type Session = InMemorySession;

    async fn begin(&self) -> Result<InMemorySession, StoreError> {
        Ok(InMemorySession {
            rows: Arc::clone(&self.rows),
            held: HashMap::new(),
            staged: HashMap::new(),
            created: Vec::new(),
            committed: false,
        })
    }

    async fn commit(&self, mut session: InMemorySession) -> Result<(), StoreError> {
        {
            if let Some(address) = session
                .staged
                .keys()
                .find(|address| !session.held.contains_key(*address))
            {
                return Err(StoreError::row_count(address, 0));
            }

            let _publish = self.publish.write().await;
            for (address, balance) in session.staged.drain() {
                if let Some(held) = session.held.get(&address) {
                    held.row.balance.store(balance, Ordering::Release);
                }
            }
            for address in &session.created {
                if let Some(held) = session.held.get(address) {
                    held.row.committed.store(true, Ordering::Release);
                }
            }
            session.committed = true;
        }
        // Releases every row lock held by the session
        drop(session);
        Ok(())
    }

    async fn rollback(&self, session: InMemorySession) -> Result<(), StoreError> {
        drop(session);
        Ok(())
    }

    async fn get_for_update(
        &self,
        session: &mut InMemorySession,
        address: &Address,
    ) -> Result<Option<Wallet>, StoreError> {
        if let Some(wallet) = session.view(address) {
            return Ok(Some(wallet));
        }

        let Some(row) = self.rows.get(address).map(|entry| Arc::clone(entry.value())) else {
            return Ok(None);
        };

        let guard = self.lock_row(address, &row).await?;

        // The creator of this row rolled back while we were waiting
        if !row.is_committed() {
            return Ok(None);
        }

        let wallet = Wallet::new(address.clone(), row.balance());
        session.held.insert(
            address.clone(),
            HeldRow {
                row,
                _guard: guard,
            },
        );
        Ok(Some(wallet))
    }

    async fn get(
        &self,
        session: &mut InMemorySession,
        address: &Address,
    ) -> Result<Option<Wallet>, StoreError> {
        if let Some(wallet) = session.view(address) {
            return Ok(Some(wallet));
        }

        let _publish = self.publish.read().await;
        Ok(self
            .rows
            .get(address)
            .filter(|entry| entry.value().is_committed())
            .map(|entry| Wallet::new(address.clone(), entry.value().balance())))
    }

    async fn create(
        &self,
        session: &mut InMemorySession,
        address: &Address,
        balance: Balance,
    ) -> Result<Wallet, StoreError> {
        if balance < 0 {
            return Err(StoreError::constraint_violation(address, "balance must not be negative"));
        }

        if session.held.contains_key(address) {
            return Err(StoreError::already_exists(address));
        }

        loop {
            let row = Arc::new(Row::pending(balance));
            // Fresh mutex, never contended
            let guard = Arc::clone(&row.lock).lock_owned().await;

            let existing = match self.rows.entry(address.clone()) {
                Entry::Occupied(entry) => Arc::clone(entry.get()),
                Entry::Vacant(entry) => {
                    entry.insert(Arc::clone(&row));
                    session.held.insert(
                        address.clone(),
                        HeldRow {
                            row,
                            _guard: guard,
                        },
                    );
                    session.created.push(address.clone());
                    return Ok(Wallet::new(address.clone(), balance));
                }
            };

            if existing.is_committed() {
                return Err(StoreError::already_exists(address));
            }

            // Another session's insert is pending: wait for it to finish, as a
            // unique index does. A rolled-back row is gone once its lock frees.
            let _pending = self.lock_row(address, &existing).await?;
            if existing.is_committed() {
                return Err(StoreError::already_exists(address));
            }
        }
    }

    async fn set_balance(
        &self,
        session: &mut InMemorySession,
        address: &Address,
        balance: Balance,
    ) -> Result<(), StoreError> {
        if balance < 0 {
            return Err(StoreError::constraint_violation(address, "balance must not be negative"));
        }

        // An update locks the row it touches, as UPDATE does in a database
        if !session.held.contains_key(address)
            && self.get_for_update(session, address).await?.is_none()
        {
            return Err(StoreError::row_count(address, 0));
        }

        session.staged.insert(address.clone(), balance);
        Ok(())
    }

    async fn list(&self, _session: &mut InMemorySession) -> Result<Vec<Wallet>, StoreError> {
        let _publish = self.publish.read().await;
        let mut wallets: Vec<Wallet> = self
            .rows
            .iter()
            .filter(|entry| entry.value().is_committed())
            .map(|entry| Wallet::new(entry.key().clone(), entry.value().balance()))
            .collect();
        wallets.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(wallets)
    }
}

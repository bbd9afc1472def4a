//! Core traits for wallet storage and address validation
//!
//! This module defines the trait abstractions that let the transfer engine run
//! unchanged against the in-memory store and the PostgreSQL store.

use crate::types::{Address, Balance, StoreError, Wallet};
use async_trait::async_trait;

/// Transactional wallet storage
///
/// Every data operation takes the session it runs in. A session is the unit of
/// work: its writes become visible to other sessions only after
/// [`commit`](WalletStore::commit), and dropping a session that was not
/// committed rolls it back. Callers normally go through
/// [`run_in_transaction`](crate::store::run_in_transaction) instead of calling
/// `begin`/`commit`/`rollback` themselves.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Open transactional session
    type Session: Send;

    /// Open a new session
    async fn begin(&self) -> Result<Self::Session, StoreError>;

    /// Make the session's writes durable and release its locks
    async fn commit(&self, session: Self::Session) -> Result<(), StoreError>;

    /// Discard the session's writes and release its locks
    async fn rollback(&self, session: Self::Session) -> Result<(), StoreError>;

    /// Read a wallet and lock it exclusively until the session ends
    ///
    /// Blocks while another session holds the lock. Returns `Ok(None)` when no
    /// committed wallet with this address exists once the lock is obtained.
    async fn get_for_update(
        &self,
        session: &mut Self::Session,
        address: &Address,
    ) -> Result<Option<Wallet>, StoreError>;

    /// Read a wallet without locking it
    async fn get(
        &self,
        session: &mut Self::Session,
        address: &Address,
    ) -> Result<Option<Wallet>, StoreError>;

    /// Insert a new wallet
    ///
    /// Fails with [`StoreError::AlreadyExists`] when the address is taken, as
    /// decided by the store's uniqueness constraint. If another session's insert
    /// of the same address is still pending, waits for that session to end and
    /// only fails if it committed. The new row stays locked by this session
    /// until it ends.
    async fn create(
        &self,
        session: &mut Self::Session,
        address: &Address,
        balance: Balance,
    ) -> Result<Wallet, StoreError>;

    /// Overwrite the balance of exactly one existing wallet
    ///
    /// Fails with [`StoreError::RowCount`] if no row was updated.
    async fn set_balance(
        &self,
        session: &mut Self::Session,
        address: &Address,
        balance: Balance,
    ) -> Result<(), StoreError>;

    /// All committed wallets ordered by address
    async fn list(&self, session: &mut Self::Session) -> Result<Vec<Wallet>, StoreError>;
}

/// Pure address-format predicate
///
/// Any `Fn(&str) -> bool` closure is a validator, which keeps tests free to
/// plug in their own address syntax.
pub trait AddressValidator: Send + Sync {
    fn is_valid(&self, address: &str) -> bool;
}

impl<F> AddressValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid(&self, address: &str) -> bool {
        self(address)
    }
}

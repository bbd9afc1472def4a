//! Transactional transfer engine
//!
//! This module provides the `TransferEngine`, which moves tokens between two
//! wallets inside a single store session.
//!
//! # Lock ordering
//!
//! Two transfers over the same pair of wallets in opposite directions (A→B and
//! B→A) would deadlock if each locked its source first. The engine never locks
//! by role: it always locks the smaller address first under the byte-wise
//! [`Address`] order, then the larger one. Every transfer acquires its two
//! locks in the same global order, so no cycle of waiting sessions can form.
//!
//! # Destination creation
//!
//! A destination that does not exist yet is created with a zero balance inside
//! the same session, while the order above is still respected. If another
//! session is creating it at the same time, the store makes the engine wait
//! for that session: a commit sends the engine back to lock the existing row,
//! a rollback lets the engine's own insert go through. Source wallets are never
//! created.

use std::sync::Arc;

use tracing::{debug, info};

use super::traits::{AddressValidator, WalletStore};
use crate::store::run_in_transaction;
use crate::types::{Address, Amount, Balance, StoreError, Wallet, WalletError};

/// Role a wallet plays in the transfer being executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Source,
    Destination,
}

/// Transfer orchestrator
///
/// Stateless apart from its store and validator handles; clones share both and
/// can run concurrently from any number of tasks.
pub struct TransferEngine<S: WalletStore> {
    store: Arc<S>,
    validator: Arc<dyn AddressValidator>,
}

impl<S: WalletStore> Clone for TransferEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            validator: Arc::clone(&self.validator),
        }
    }
}

impl<S: WalletStore> TransferEngine<S> {
    pub fn new(store: Arc<S>, validator: Arc<dyn AddressValidator>) -> Self {
        Self { store, validator }
    }

    /// Move `amount` tokens from `from` to `to`
    ///
    /// # Returns
    ///
    /// The new balance of the source wallet.
    ///
    /// # Errors
    ///
    /// Checked before any session is opened, in this order:
    /// - `InvalidAmount` if `amount <= 0`
    /// - `SelfTransfer` if both addresses are equal
    /// - `InvalidAddress` if either address fails validation
    ///
    /// Checked under lock, rolling the session back:
    /// - `SourceNotFound` if the source wallet does not exist
    /// - `InsufficientBalance` if the source holds less than `amount`
    /// - `BalanceOverflow` if the destination balance would overflow
    /// - `StoreFailure` for any store error, including lock-wait timeouts
    pub async fn transfer(&self, from: &str, to: &str, amount: Amount) -> Result<Balance, WalletError> {
        if amount <= 0 {
            return Err(WalletError::invalid_amount(amount));
        }
        if from == to {
            return Err(WalletError::self_transfer(from));
        }
        let from = self.validate(from)?;
        let to = self.validate(to)?;

        debug!(from = %from, to = %to, amount, "Transfer requested");

        let result = run_in_transaction(self.store.as_ref(), move |store, session| {
            Box::pin(async move { apply_transfer(store, session, &from, &to, amount).await })
        })
        .await;

        match &result {
            Ok(new_balance) => info!(amount, new_balance, "Transfer committed"),
            Err(err) => debug!(error = %err, kind = err.kind(), "Transfer rolled back"),
        }
        result
    }

    fn validate(&self, address: &str) -> Result<Address, WalletError> {
        if self.validator.is_valid(address) {
            Ok(Address::new(address))
        } else {
            Err(WalletError::invalid_address(address))
        }
    }
}

/// Transfer steps executed inside an open session
async fn apply_transfer<S: WalletStore + ?Sized>(
    store: &S,
    session: &mut S::Session,
    from: &Address,
    to: &Address,
    amount: Amount,
) -> Result<Balance, WalletError> {
    let (first, second) = Address::lock_order(from, to);

    let first_wallet = lock_wallet(store, session, first, role_of(first, from)).await?;
    let second_wallet = lock_wallet(store, session, second, role_of(second, from)).await?;

    // Both locks held: ordering no longer matters, pick wallets by identity
    let (from_wallet, to_wallet) = if first == from {
        (first_wallet, second_wallet)
    } else {
        (second_wallet, first_wallet)
    };

    if from_wallet.balance < amount {
        return Err(WalletError::insufficient_balance(from, from_wallet.balance, amount));
    }

    let new_from = from_wallet.balance - amount;
    let new_to = to_wallet
        .balance
        .checked_add(amount)
        .ok_or_else(|| WalletError::balance_overflow(to))?;

    store.set_balance(session, from, new_from).await?;
    store.set_balance(session, to, new_to).await?;

    debug!(from = %from, to = %to, new_from, new_to, "Balances staged");
    Ok(new_from)
}

fn role_of(address: &Address, from: &Address) -> Role {
    if address == from {
        Role::Source
    } else {
        Role::Destination
    }
}

/// Lock one wallet of the transfer, creating a missing destination
async fn lock_wallet<S: WalletStore + ?Sized>(
    store: &S,
    session: &mut S::Session,
    address: &Address,
    role: Role,
) -> Result<Wallet, WalletError> {
    if let Some(wallet) = store.get_for_update(session, address).await? {
        return Ok(wallet);
    }

    if role == Role::Source {
        return Err(WalletError::source_not_found(address));
    }

    // The store waits out a competing insert, so a conflict means the other
    // session committed the row and one more locked read finds it.
    match store.create(session, address, 0).await {
        Ok(wallet) => {
            debug!(address = %address, "Destination wallet created");
            Ok(wallet)
        }
        Err(StoreError::AlreadyExists { .. }) => {
            debug!(address = %address, "Destination created concurrently, locking it");
            store
                .get_for_update(session, address)
                .await?
                .ok_or_else(|| WalletError::from(StoreError::row_count(address, 0)))
        }
        Err(err) => Err(err.into()),
    }
}

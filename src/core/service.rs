//! Wallet service facade
//!
//! `WalletService` is what outer layers (the CLI, an HTTP or GraphQL server)
//! call. It validates addresses, delegates reads and provisioning to the store
//! and passes transfers through to the [`TransferEngine`].

use std::sync::Arc;

use tracing::info;

use super::engine::TransferEngine;
use super::traits::{AddressValidator, WalletStore};
use crate::store::run_in_transaction;
use crate::types::{Address, Amount, Balance, StoreError, Wallet, WalletError};

/// Facade over the store and the transfer engine
pub struct WalletService<S: WalletStore> {
    store: Arc<S>,
    validator: Arc<dyn AddressValidator>,
    engine: TransferEngine<S>,
}

impl<S: WalletStore> Clone for WalletService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            validator: Arc::clone(&self.validator),
            engine: self.engine.clone(),
        }
    }
}

impl<S: WalletStore> WalletService<S> {
    pub fn new(store: Arc<S>, validator: Arc<dyn AddressValidator>) -> Self {
        let engine = TransferEngine::new(Arc::clone(&store), Arc::clone(&validator));
        Self {
            store,
            validator,
            engine,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Read a wallet without locking it
    ///
    /// Fails with `InvalidAddress` or `WalletNotFound`.
    pub async fn get_wallet(&self, address: &str) -> Result<Wallet, WalletError> {
        let address = self.validate(address)?;

        run_in_transaction(self.store.as_ref(), move |store, session| {
            Box::pin(async move {
                store
                    .get(session, &address)
                    .await?
                    .ok_or_else(|| WalletError::wallet_not_found(&address))
            })
        })
        .await
    }

    /// Provision a new wallet with an initial balance
    ///
    /// Fails with `InvalidAddress`, `InvalidAmount` for a negative balance, or
    /// `AlreadyExists` when the address is taken.
    pub async fn create_wallet(&self, address: &str, balance: Balance) -> Result<Wallet, WalletError> {
        let address = self.validate(address)?;
        if balance < 0 {
            return Err(WalletError::invalid_amount(balance));
        }

        let wallet = run_in_transaction(self.store.as_ref(), move |store, session| {
            Box::pin(async move {
                store
                    .create(session, &address, balance)
                    .await
                    .map_err(|err| match err {
                        StoreError::AlreadyExists { address } => WalletError::AlreadyExists { address },
                        other => WalletError::from(other),
                    })
            })
        })
        .await?;

        info!(address = %wallet.address, balance = wallet.balance, "Wallet created");
        Ok(wallet)
    }

    /// Return the wallet at `address`, creating it with `balance` if missing
    ///
    /// An existing wallet is returned unchanged. The flag is `true` when this
    /// call created the wallet.
    pub async fn ensure_wallet(&self, address: &str, balance: Balance) -> Result<(Wallet, bool), WalletError> {
        match self.create_wallet(address, balance).await {
            Ok(wallet) => Ok((wallet, true)),
            Err(WalletError::AlreadyExists { .. }) => {
                let wallet = self.get_wallet(address).await?;
                Ok((wallet, false))
            }
            Err(err) => Err(err),
        }
    }

    /// Move tokens between two wallets; see [`TransferEngine::transfer`]
    pub async fn transfer(&self, from: &str, to: &str, amount: Amount) -> Result<Balance, WalletError> {
        self.engine.transfer(from, to, amount).await
    }

    /// All committed wallets ordered by address
    pub async fn list_wallets(&self) -> Result<Vec<Wallet>, WalletError> {
        run_in_transaction(self.store.as_ref(), |store, session| {
            Box::pin(async move { store.list(session).await.map_err(WalletError::from) })
        })
        .await
    }

    fn validate(&self, address: &str) -> Result<Address, WalletError> {
        if self.validator.is_valid(address) {
            Ok(Address::new(address))
        } else {
            Err(WalletError::invalid_address(address))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HexAddressValidator;
    use crate::store::InMemoryWalletStore;
    use rstest::rstest;

    const FIRST: &str = "0x0000000000000000000000000000000000000001";
    const SECOND: &str = "0x0000000000000000000000000000000000000002";

    fn service() -> WalletService<InMemoryWalletStore> {
        WalletService::new(Arc::new(InMemoryWalletStore::new()), Arc::new(HexAddressValidator))
    }

    #[tokio::test]
    async fn test_create_wallet() {
        let service = service();

        let wallet = service.create_wallet(FIRST, 100).await.unwrap();
        assert_eq!(wallet, Wallet::new(Address::new(FIRST), 100));

        let duplicate = service.create_wallet(FIRST, 150).await;
        assert_eq!(duplicate, Err(WalletError::already_exists(&Address::new(FIRST))));

        // The duplicate attempt left the original untouched
        assert_eq!(service.get_wallet(FIRST).await.unwrap().balance, 100);
    }

    #[tokio::test]
    async fn test_get_wallet() {
        let service = service();
        service.create_wallet(FIRST, 100).await.unwrap();

        let wallet = service.get_wallet(FIRST).await.unwrap();
        assert_eq!(wallet.address.as_str(), FIRST);
        assert_eq!(wallet.balance, 100);

        let missing = service.get_wallet(SECOND).await;
        assert_eq!(missing, Err(WalletError::wallet_not_found(&Address::new(SECOND))));
    }

    #[rstest]
    #[case::too_short("0x123")]
    #[case::no_prefix("0000000000000000000000000000000000000001ab")]
    #[case::empty("")]
    #[tokio::test]
    async fn test_invalid_addresses_are_rejected(#[case] address: &str) {
        let service = service();

        assert_eq!(
            service.get_wallet(address).await,
            Err(WalletError::invalid_address(address))
        );
        assert_eq!(
            service.create_wallet(address, 1).await,
            Err(WalletError::invalid_address(address))
        );
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn test_negative_initial_balance_is_rejected() {
        let service = service();

        let result = service.create_wallet(FIRST, -1).await;

        assert_eq!(result, Err(WalletError::invalid_amount(-1)));
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_wallet_is_first_or_create() {
        let service = service();

        let (wallet, created) = service.ensure_wallet(FIRST, 1_000_000).await.unwrap();
        assert!(created);
        assert_eq!(wallet.balance, 1_000_000);

        service.transfer(FIRST, SECOND, 400_000).await.unwrap();

        let (wallet, created) = service.ensure_wallet(FIRST, 1_000_000).await.unwrap();
        assert!(!created);
        assert_eq!(wallet.balance, 600_000);
    }

    #[tokio::test]
    async fn test_transfer_passes_through_to_engine() {
        let service = service();
        service.create_wallet(FIRST, 100).await.unwrap();
        service.create_wallet(SECOND, 200).await.unwrap();

        assert_eq!(service.transfer(FIRST, SECOND, 60).await, Ok(40));
        assert_eq!(service.get_wallet(FIRST).await.unwrap().balance, 40);
        assert_eq!(service.get_wallet(SECOND).await.unwrap().balance, 260);
    }

    #[tokio::test]
    async fn test_list_wallets() {
        let service = service();
        service.create_wallet(SECOND, 2).await.unwrap();
        service.create_wallet(FIRST, 1).await.unwrap();

        let wallets = service.list_wallets().await.unwrap();

        assert_eq!(
            wallets,
            vec![
                Wallet::new(Address::new(FIRST), 1),
                Wallet::new(Address::new(SECOND), 2),
            ]
        );
    }
}

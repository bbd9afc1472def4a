//! Core business logic module
//!
//! This module contains the wallet ledger components:
//! - `traits` - Store and address-validator abstractions
//! - `validator` - Default hex address validator
//! - `engine` - Transactional transfer engine (lock ordering, balance checks)
//! - `service` - Facade used by outer layers

pub mod engine;
pub mod service;
pub mod traits;
pub mod validator;

pub use engine::TransferEngine;
pub use service::WalletService;
pub use traits::{AddressValidator, WalletStore};
pub use validator::HexAddressValidator;

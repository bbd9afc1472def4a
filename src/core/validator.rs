//! Address format validation
//!
//! The default validator accepts Ethereum-style addresses: the `0x` prefix
//! followed by exactly 40 hexadecimal digits. Digit casing is not checked.

use super::traits::AddressValidator;

/// Length of a valid address including the `0x` prefix
pub const ADDRESS_LENGTH: usize = 42;

/// Validator for `0x`-prefixed, 20-byte hex addresses
#[derive(Debug, Clone, Copy, Default)]
pub struct HexAddressValidator;

impl AddressValidator for HexAddressValidator {
    fn is_valid(&self, address: &str) -> bool {
        if address.len() != ADDRESS_LENGTH {
            return false;
        }

        match address.strip_prefix("0x") {
            Some(digits) => digits.bytes().all(|b| b.is_ascii_hexdigit()),
            None => false,
        }
    }
}

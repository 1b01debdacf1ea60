//! Caller identities for the marketplace ledger.
//!
//! An [`Address`] is the opaque, equality-comparable identity the ledger
//! authorizes against. Addresses are base58-encoded Ed25519 public keys;
//! a [`Wallet`] holds the keypair an address is derived from.

use std::fmt;

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// An opaque caller identity (base58-encoded 32-byte public key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Creates an address from a base58-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid base58 or does not decode
    /// to 32 bytes.
    pub fn from_base58(s: &str) -> Result<Self, CoreError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CoreError::InvalidAddress(format!("invalid base58: {e}")))?;

        if bytes.len() != 32 {
            return Err(CoreError::InvalidAddress(format!(
                "address must be 32 bytes, got {}",
                bytes.len()
            )));
        }

        Ok(Self(s.to_string()))
    }

    /// Derives an address from an Ed25519 public key.
    #[must_use]
    pub fn from_public_key(key: &VerifyingKey) -> Self {
        Self(bs58::encode(key.as_bytes()).into_string())
    }

    /// Returns the base58-encoded address string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An Ed25519 keypair from which a caller [`Address`] is derived.
///
/// The ledger itself never signs anything — caller authentication is the
/// execution substrate's job — but the harness and tests use wallets to mint
/// distinct identities.
pub struct Wallet {
    signing_key: SigningKey,
    address: Address,
}

impl Wallet {
    /// Generates a fresh wallet with a random keypair.
    #[must_use]
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let address = Address::from_public_key(&signing_key.verifying_key());
        Self {
            signing_key,
            address,
        }
    }

    /// Returns the wallet's address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Returns the wallet's public key.
    #[must_use]
    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_wallets_are_unique() {
        let a = Wallet::generate();
        let b = Wallet::generate();
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn address_roundtrips_through_base58() {
        let wallet = Wallet::generate();
        let parsed = Address::from_base58(wallet.address().as_str()).unwrap();
        assert_eq!(&parsed, wallet.address());
    }

    #[test]
    fn address_matches_public_key() {
        let wallet = Wallet::generate();
        let derived = Address::from_public_key(&wallet.public_key());
        assert_eq!(&derived, wallet.address());
    }

    #[test]
    fn from_base58_rejects_garbage() {
        assert!(Address::from_base58("not-base58-0OIl").is_err());
        // Valid base58 but wrong length
        assert!(Address::from_base58("abc").is_err());
    }

    #[test]
    fn address_serde_roundtrip() {
        let wallet = Wallet::generate();
        let json = serde_json::to_string(wallet.address()).unwrap();
        let restored: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(&restored, wallet.address());
    }
}

//! Hex-encoded Ed25519 key store.
//!
//! Two key pairs with distinct duties: the **root** key signs policy
//! manifests (and only manifests), the **constable** key signs warrants.
//! Key material is hex on disk and decoded into `ed25519_dalek` types at
//! the call sites that need it. Loading happens once at boot; there is no
//! rotation path.

use std::path::Path;

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use warden_contracts::{WardenError, WardenResult};

/// One hex-encoded Ed25519 key pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPair {
    /// 32-byte verifying key, hex.
    pub public: String,
    /// 32-byte signing key, hex.
    pub private: String,
}

impl KeyPair {
    /// Generate a fresh pair from the OS entropy source.
    pub fn generate() -> Self {
        let signing = SigningKey::generate(&mut OsRng);
        Self {
            public: hex::encode(signing.verifying_key().to_bytes()),
            private: hex::encode(signing.to_bytes()),
        }
    }
}

/// The on-disk key store: `{"root": {...}, "constable": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyStore {
    /// Signs policy manifests.
    pub root: KeyPair,
    /// Signs warrants.
    pub constable: KeyPair,
}

impl KeyStore {
    /// Generate both key pairs.
    pub fn generate() -> Self {
        Self {
            root: KeyPair::generate(),
            constable: KeyPair::generate(),
        }
    }

    /// Load the store from a JSON file. Fatal at boot on any failure.
    pub fn load(path: &Path) -> WardenResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| WardenError::KeyStore {
            reason: format!("cannot read key store '{}': {}", path.display(), e),
        })?;
        serde_json::from_str(&contents).map_err(|e| WardenError::KeyStore {
            reason: format!("key store '{}' unparsable: {}", path.display(), e),
        })
    }

    /// Write the store as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> WardenResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| WardenError::KeyStore {
            reason: format!("key store serialization failed: {}", e),
        })?;
        std::fs::write(path, json).map_err(|e| WardenError::KeyStore {
            reason: format!("cannot write key store '{}': {}", path.display(), e),
        })
    }
}

/// Decode a hex signing key.
pub fn signing_key_from_hex(hex_key: &str) -> WardenResult<SigningKey> {
    let bytes = hex::decode(hex_key).map_err(|e| WardenError::KeyStore {
        reason: format!("signing key is not valid hex: {}", e),
    })?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|_| WardenError::KeyStore {
        reason: "signing key must be exactly 32 bytes".to_string(),
    })?;
    Ok(SigningKey::from_bytes(&bytes))
}

/// Decode a hex verifying key.
pub fn verifying_key_from_hex(hex_key: &str) -> WardenResult<VerifyingKey> {
    let bytes = hex::decode(hex_key).map_err(|e| WardenError::KeyStore {
        reason: format!("verifying key is not valid hex: {}", e),
    })?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|_| WardenError::KeyStore {
        reason: "verifying key must be exactly 32 bytes".to_string(),
    })?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| WardenError::KeyStore {
        reason: format!("verifying key rejected: {}", e),
    })
}

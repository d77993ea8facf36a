//! Warrant issuance and validation.
//!
//! The constable key signs the canonical serialization of exactly six
//! fields: action, agent id, decision, expiry, nonce, timestamp (field
//! names in that (alphabetical) order, which is the canonical payload
//! layout). Mutating any signed field invalidates the warrant.
//!
//! Validation is pure: it mutates nothing, and every failure mode (expired,
//! bad key, bad hex, bad signature) returns `false` rather than raising.
//! The kernel never checks previously-seen nonces; a verifying service
//! that cares about replay must track them itself.

use chrono::Utc;
use ed25519_dalek::{Signature, Signer, Verifier};
use serde::Serialize;

use warden_contracts::{Warrant, WardenResult};

use crate::keys::{signing_key_from_hex, verifying_key_from_hex};

/// The signed payload: every warrant field except the signature itself,
/// in canonical (alphabetical) field order.
#[derive(Serialize)]
struct WarrantPayload<'a> {
    action: &'a str,
    agent_id: &'a str,
    allowed: bool,
    expiry: i64,
    nonce: u64,
    timestamp: i64,
}

fn canonical_payload(
    action: &str,
    agent_id: &str,
    allowed: bool,
    expiry: i64,
    nonce: u64,
    timestamp: i64,
) -> Vec<u8> {
    serde_json::to_vec(&WarrantPayload {
        action,
        agent_id,
        allowed,
        expiry,
        nonce,
        timestamp,
    })
    .expect("warrant payload must always serialize to JSON")
}

/// Issues and validates warrants with the constable key.
pub struct WarrantAuthority {
    signing_key: ed25519_dalek::SigningKey,
}

impl WarrantAuthority {
    /// Build an authority from the hex constable signing key.
    pub fn new(constable_private_hex: &str) -> WardenResult<Self> {
        Ok(Self {
            signing_key: signing_key_from_hex(constable_private_hex)?,
        })
    }

    /// Issue a signed warrant. `expiry = timestamp + ttl_secs`.
    ///
    /// Denials are issued exactly like grants; a denial is a provable,
    /// non-repudiable fact.
    pub fn issue(
        &self,
        action: &str,
        agent_id: &str,
        allowed: bool,
        timestamp: i64,
        nonce: u64,
        ttl_secs: i64,
    ) -> Warrant {
        let expiry = timestamp + ttl_secs;
        let payload = canonical_payload(action, agent_id, allowed, expiry, nonce, timestamp);
        let signature = self.signing_key.sign(&payload);

        Warrant {
            action: action.to_string(),
            agent_id: agent_id.to_string(),
            allowed,
            timestamp,
            nonce,
            expiry,
            signature: hex::encode(signature.to_bytes()),
        }
    }

    /// Validate against the constable public key at an explicit clock.
    ///
    /// Expiry is checked first; a warrant past `timestamp + ttl` is invalid
    /// even with a correct signature. Any decoding or verification failure
    /// returns `false`.
    pub fn validate_at(warrant: &Warrant, constable_public_hex: &str, now: i64) -> bool {
        if now > warrant.expiry {
            return false;
        }

        let Ok(verifying_key) = verifying_key_from_hex(constable_public_hex) else {
            return false;
        };
        let Ok(sig_bytes) = hex::decode(&warrant.signature) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(sig_bytes) else {
            return false;
        };

        let payload = canonical_payload(
            &warrant.action,
            &warrant.agent_id,
            warrant.allowed,
            warrant.expiry,
            warrant.nonce,
            warrant.timestamp,
        );

        verifying_key
            .verify(&payload, &Signature::from_bytes(&sig_bytes))
            .is_ok()
    }

    /// Validate against the constable public key at the current wall clock.
    pub fn validate(warrant: &Warrant, constable_public_hex: &str) -> bool {
        Self::validate_at(warrant, constable_public_hex, Utc::now().timestamp())
    }
}

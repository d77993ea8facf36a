//! The capability token attesting one allow/deny decision.
//!
//! A `Warrant` is signed by the constable key over exactly six fields:
//! action, agent id, decision, timestamp, nonce, and expiry. Mutating any of
//! them invalidates the signature. Denials are warrants too: a provable,
//! non-repudiable record that the request was refused.
//!
//! The kernel increments the nonce per issuance but never checks
//! previously-seen nonces; replay protection belongs to the verifying
//! service, which must keep its own seen-nonce set.

use serde::{Deserialize, Serialize};

/// A signed, time-boxed, nonce-tagged attestation of one decision.
///
/// Issued once and immutable thereafter. Verification (in warden-crypto)
/// is pure and never mutates the warrant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warrant {
    /// The action name the decision covers.
    pub action: String,
    /// The agent the decision covers.
    pub agent_id: String,
    /// The decision itself.
    pub allowed: bool,
    /// Issuance time, unix seconds. An integer so the signed payload is
    /// bit-stable across serializations.
    pub timestamp: i64,
    /// Monotonically increasing per kernel instance.
    pub nonce: u64,
    /// `timestamp + ttl`, unix seconds.
    pub expiry: i64,
    /// Hex-encoded Ed25519 signature over the other six fields.
    pub signature: String,
}

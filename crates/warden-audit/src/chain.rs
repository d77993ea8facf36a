//! Hash-chain primitives: entry hashing and chain integrity verification.
//!
//! Any external auditor can replay the ledger file and recompute every hash
//! as proof of non-tampering by recomputation rather than trust.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use warden_contracts::Trace;

use crate::entry::AuditEntry;

/// The hash preimage: an `AuditEntry` minus its own `curr_hash`.
///
/// Serialized field order matches `AuditEntry` exactly; `inputs` is a
/// `BTreeMap`, so key order inside it is stable too.
#[derive(Serialize)]
struct EntryPreimage<'a> {
    prev_hash: &'a str,
    ts: &'a DateTime<Utc>,
    agent_id: &'a str,
    policy_name: &'a str,
    inputs: &'a BTreeMap<String, String>,
    decision: bool,
    trace: &'a Trace,
}

/// Compute the SHA-256 hash (lowercase hex) an entry's `curr_hash` must
/// hold.
pub fn hash_entry(entry: &AuditEntry) -> String {
    let preimage = EntryPreimage {
        prev_hash: &entry.prev_hash,
        ts: &entry.ts,
        agent_id: &entry.agent_id,
        policy_name: &entry.policy_name,
        inputs: &entry.inputs,
        decision: entry.decision,
        trace: &entry.trace,
    };

    // serde_json::to_vec is deterministic for a fixed struct shape: no
    // whitespace, declaration-order keys.
    let bytes =
        serde_json::to_vec(&preimage).expect("audit preimage must always serialize to JSON");

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

/// Verify a chain of entries.
///
/// Valid means both rules hold for every entry:
///
/// 1. **Linkage**: `prev_hash` equals the predecessor's `curr_hash`
///    (genesis sentinel for the first entry).
/// 2. **Content**: `curr_hash` equals the recomputed hash of the entry's
///    own fields.
///
/// An empty chain is valid.
pub fn verify_chain(entries: &[AuditEntry]) -> bool {
    let mut expected_prev = AuditEntry::GENESIS_HASH.to_string();

    for entry in entries {
        if entry.prev_hash != expected_prev {
            return false;
        }
        if entry.curr_hash != hash_entry(entry) {
            return false;
        }
        expected_prev = entry.curr_hash.clone();
    }

    true
}

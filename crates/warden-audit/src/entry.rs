//! Audit ledger entry type.
//!
//! `AuditEntry` is one line of the decision ledger. Entries form a
//! singly-linked hash chain: each commits to its predecessor through
//! `prev_hash`, and to its own content through `curr_hash`. Modifying any
//! field of a committed entry, or reordering entries, breaks the chain
//! and is detected by recomputation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_contracts::Trace;

/// One committed decision in the ledger.
///
/// Stored as one JSON object per line, fields in declaration order. The
/// hash preimage is the entry serialized without `curr_hash` (see
/// [`crate::chain::hash_entry`]), so field order here is part of the wire
/// contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// `curr_hash` of the previous entry, or [`AuditEntry::GENESIS_HASH`].
    pub prev_hash: String,
    /// Wall-clock commit time (UTC).
    pub ts: DateTime<Utc>,
    /// The agent the decision was made for.
    pub agent_id: String,
    /// The policy that produced the decision.
    pub policy_name: String,
    /// Key-sorted snapshot of the evaluation context.
    pub inputs: BTreeMap<String, String>,
    /// The decision.
    pub decision: bool,
    /// Per-clause results in evaluation order.
    pub trace: Trace,
    /// SHA-256 (hex) over the canonical bytes of every field above.
    pub curr_hash: String,
}

impl AuditEntry {
    /// The sentinel `prev_hash` of the first entry in every chain.
    ///
    /// 64 ASCII zeros: not the hash of any real data, so genesis detection
    /// is unambiguous.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

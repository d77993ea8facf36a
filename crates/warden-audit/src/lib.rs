//! # warden-audit
//!
//! Append-only, SHA-256 hash-chained decision ledger for WARDEN.
//!
//! ## Overview
//!
//! Every governance decision is committed as an [`AuditEntry`] linking to
//! its predecessor by hash. Tampering with any committed entry, even a
//! single byte, breaks the chain, which [`verify_chain`] detects by
//! recomputation. The ledger is a plain JSONL file any external auditor can
//! replay without trusting the kernel.

pub mod chain;
pub mod entry;
pub mod log;

pub use chain::{hash_entry, verify_chain};
pub use entry::AuditEntry;
pub use log::{read_entries, MerkleAuditLog};

// ── Tests ─────────────────────────────────────────────────────────────────────

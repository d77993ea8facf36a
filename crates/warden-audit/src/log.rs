//! The file-backed, append-only decision ledger.
//!
//! Storage is one JSON object per line. On open, the ledger recovers its
//! chain position from the last well-formed line (genesis when the file is
//! missing or holds no parsable entry). Every append (read last hash,
//! build entry, hash, write, advance) runs inside one critical section:
//! two unserialized writers computing `curr_hash` from the same stale
//! `prev_hash` would fork the chain.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, info, warn};

use warden_contracts::{Trace, WardenError, WardenResult};

use crate::chain::hash_entry;
use crate::entry::AuditEntry;

struct LogState {
    file: File,
    last_hash: String,
}

/// Append-only hash-chained ledger over a JSONL file.
pub struct MerkleAuditLog {
    path: PathBuf,
    state: Mutex<LogState>,
}

impl MerkleAuditLog {
    /// Open (or create) the ledger at `path`, recovering the last hash.
    pub fn open(path: impl Into<PathBuf>) -> WardenResult<Self> {
        let path = path.into();
        let last_hash = recover_last_hash(&path);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| WardenError::AuditWriteFailed {
                reason: format!("cannot open ledger '{}': {}", path.display(), e),
            })?;

        info!(path = %path.display(), last_hash = %&last_hash[..16], "audit ledger open");

        Ok(Self {
            path,
            state: Mutex::new(LogState { file, last_hash }),
        })
    }

    /// Commit one decision and return its `curr_hash`.
    pub fn append(
        &self,
        agent_id: &str,
        policy_name: &str,
        inputs: BTreeMap<String, String>,
        decision: bool,
        trace: Trace,
    ) -> WardenResult<String> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| WardenError::AuditWriteFailed {
                reason: format!("ledger lock poisoned: {}", e),
            })?;

        let mut entry = AuditEntry {
            prev_hash: state.last_hash.clone(),
            ts: Utc::now(),
            agent_id: agent_id.to_string(),
            policy_name: policy_name.to_string(),
            inputs,
            decision,
            trace,
            curr_hash: String::new(),
        };
        entry.curr_hash = hash_entry(&entry);

        let line = serde_json::to_string(&entry).map_err(|e| WardenError::AuditWriteFailed {
            reason: format!("entry serialization failed: {}", e),
        })?;

        writeln!(state.file, "{}", line).map_err(|e| WardenError::AuditWriteFailed {
            reason: format!("ledger write failed: {}", e),
        })?;
        state.file.flush().map_err(|e| WardenError::AuditWriteFailed {
            reason: format!("ledger flush failed: {}", e),
        })?;

        state.last_hash = entry.curr_hash.clone();
        debug!(agent_id, policy_name, decision, hash = %&entry.curr_hash[..16], "decision committed");

        Ok(entry.curr_hash)
    }

    /// The `curr_hash` of the most recently committed entry, or the genesis
    /// sentinel.
    pub fn last_hash(&self) -> String {
        self.state
            .lock()
            .map(|s| s.last_hash.clone())
            .unwrap_or_else(|_| AuditEntry::GENESIS_HASH.to_string())
    }

    /// Read every committed entry back from storage, in commit order.
    ///
    /// Fails on an unparsable line: replay is strict, unlike open-time
    /// recovery, because a verifier must never silently skip entries.
    pub fn read_entries(&self) -> WardenResult<Vec<AuditEntry>> {
        read_entries(&self.path)
    }
}

/// Strict replay of a ledger file.
pub fn read_entries(path: &Path) -> WardenResult<Vec<AuditEntry>> {
    let file = File::open(path).map_err(|e| WardenError::ConfigError {
        reason: format!("cannot read ledger '{}': {}", path.display(), e),
    })?;

    let mut entries = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| WardenError::ConfigError {
            reason: format!("ledger line {}: {}", idx + 1, e),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: AuditEntry =
            serde_json::from_str(&line).map_err(|e| WardenError::ConfigError {
                reason: format!("ledger line {} unparsable: {}", idx + 1, e),
            })?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Best-effort recovery of the chain position from an existing file.
///
/// Missing file, empty file, or no parsable line all yield the genesis
/// sentinel; a fresh chain starts rather than refusing to boot.
fn recover_last_hash(path: &Path) -> String {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return AuditEntry::GENESIS_HASH.to_string(),
    };

    let mut last = AuditEntry::GENESIS_HASH.to_string();
    for line in BufReader::new(file).lines() {
        let Ok(line) = line else { break };
        match serde_json::from_str::<AuditEntry>(&line) {
            Ok(entry) => last = entry.curr_hash,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unparsable ledger line during recovery");
            }
        }
    }
    last
}

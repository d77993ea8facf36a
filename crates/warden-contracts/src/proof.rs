//! Decision proofs and per-clause traces.
//!
//! A `DecisionProof` is the full "why" behind one allow/deny decision. It is
//! immutable once produced and travels with the decision into the audit
//! ledger and back to the caller for feedback-driven re-planning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ordered::OrderedMap;

/// Per-clause boolean results from one policy evaluation, in evaluation
/// order.
///
/// The order matters: it mirrors clause declaration order, which is also the
/// order results were fed back into the context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace(OrderedMap<bool>);

impl Trace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a clause result. Overwrites in place on a repeated name.
    pub fn record(&mut self, clause: impl Into<String>, result: bool) {
        self.0.insert(clause, result);
    }

    /// Look up a clause result by name.
    pub fn get(&self, clause: &str) -> Option<bool> {
        self.0.get(clause).copied()
    }

    /// Iterate over `(clause, result)` in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }

    /// True if every recorded clause passed. Vacuously true when empty.
    pub fn all(&self) -> bool {
        self.0.values().all(|v| *v)
    }

    /// True if any recorded clause passed.
    pub fn any(&self) -> bool {
        self.0.values().any(|v| *v)
    }

    /// Number of recorded clauses.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no clause has been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The immutable outcome of evaluating one policy against one context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionProof {
    /// The final combined decision.
    pub allowed: bool,
    /// Per-clause results in evaluation order.
    pub trace: Trace,
    /// Name of the policy that produced this decision.
    pub policy_name: String,
    /// Wall-clock time (UTC) the evaluation completed.
    pub timestamp: DateTime<Utc>,
}

impl DecisionProof {
    /// Build a proof stamped with the current time.
    pub fn new(allowed: bool, trace: Trace, policy_name: impl Into<String>) -> Self {
        Self {
            allowed,
            trace,
            policy_name: policy_name.into(),
            timestamp: Utc::now(),
        }
    }
}

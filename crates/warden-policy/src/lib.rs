//! # warden-policy
//!
//! Clause-based policy model and evaluation engine for WARDEN.
//!
//! A policy is an ordered set of named boolean clauses plus a combination
//! rule. Clauses are expression templates over the oracle's token language;
//! each clause's result feeds back into the evaluation context so later
//! clauses, and the combination rule, can reference it. The result of an
//! evaluation is a [`DecisionProof`](warden_contracts::DecisionProof)
//! carrying the full per-clause trace.

pub mod engine;
pub mod policy;
pub mod template;

pub use engine::PolicyEngine;
pub use policy::{Clause, Combination, Policy};
pub use template::ExprTemplate;

// ── Tests ─────────────────────────────────────────────────────────────────────

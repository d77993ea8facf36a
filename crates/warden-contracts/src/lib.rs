//! # warden-contracts
//!
//! Shared types, wire formats, and the error taxonomy for the WARDEN
//! governance kernel.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod context;
pub mod error;
pub mod ordered;
pub mod policy;
pub mod proof;
pub mod warrant;

pub use context::Context;
pub use error::{WardenError, WardenResult};
pub use ordered::OrderedMap;
pub use policy::{ClauseMap, PolicyDef, COMBINATION_AND, COMBINATION_OR};
pub use proof::{DecisionProof, Trace};
pub use warrant::Warrant;

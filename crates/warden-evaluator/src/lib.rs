//! # warden-evaluator
//!
//! The expression-oracle seam for the WARDEN governance kernel.
//!
//! Policies are boolean checks written in the oracle's stack-calculator
//! token language. This crate provides the [`Evaluator`] trait and both
//! implementations:
//!
//! - [`StackMachine`]: in-process, no external dependencies, used by tests
//!   and single-binary deployments.
//! - [`SubprocessEvaluator`]: a persistent external oracle process spoken
//!   to over the length-prefixed binary protocol in [`wire`], restarted on
//!   failure with bounded backoff.
//!
//! Neither implementation caches: every evaluation is a fresh round trip.

pub mod machine;
pub mod subprocess;
pub mod traits;
pub mod wire;

pub use machine::StackMachine;
pub use subprocess::SubprocessEvaluator;
pub use traits::Evaluator;

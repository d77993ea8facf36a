//! Error taxonomy for the WARDEN governance kernel.
//!
//! Only two failure classes are fatal, and both occur at boot: a policy
//! manifest that does not verify, and a key store that cannot be loaded.
//! Every error on the request path degrades to a denial instead of
//! propagating: "fail closed, stay alive" is the contract every component
//! upholds.

use thiserror::Error;

/// The unified error type for the WARDEN crates.
#[derive(Debug, Error)]
pub enum WardenError {
    /// The policy manifest failed signature verification or could not be
    /// read. Fatal: the kernel must refuse to boot on an untrusted manifest.
    #[error("policy manifest verification failed: {reason}")]
    ManifestVerification { reason: String },

    /// The key store file is missing, unparsable, or holds invalid key
    /// material. Fatal at boot.
    #[error("key store error: {reason}")]
    KeyStore { reason: String },

    /// The selected policy name is absent from the verified manifest.
    /// Denies the request; never fatal.
    #[error("policy '{name}' not found in verified manifest")]
    PolicyNotFound { name: String },

    /// The per-agent token bucket is empty. Denies before any policy
    /// evaluation takes place.
    #[error("rate limit exceeded for agent '{agent_id}'")]
    RateLimitExceeded { agent_id: String },

    /// A single clause could not be evaluated (malformed template, unbound
    /// placeholder, evaluator fault). Recorded as `false` in the trace;
    /// sibling clauses still run.
    #[error("clause '{clause}' failed to evaluate: {reason}")]
    ClauseEvaluation { clause: String, reason: String },

    /// The requested action name is not in the action registry.
    /// Denies immediately without selecting a policy.
    #[error("unknown action '{action}'")]
    UnknownAction { action: String },

    /// The evaluator process is dead and could not be restarted.
    /// Denies the evaluation; the kernel keeps running.
    #[error("evaluator unavailable: {reason}")]
    EvaluatorUnavailable { reason: String },

    /// The expression oracle rejected the expression itself (malformed
    /// token, operand starvation, integer division by zero). The policy
    /// engine maps this to a denied boolean for the offending clause.
    #[error("expression fault: {reason}")]
    ExpressionFault { reason: String },

    /// A presented signature failed verification. On the incident-context
    /// path this becomes a `false` flag, not an escaping error.
    #[error("signature verification failed: {reason}")]
    SignatureInvalid { reason: String },

    /// The audit ledger could not persist an entry.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// A configuration value is missing or malformed (bad template, bad
    /// combination rule, unreadable path).
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the WARDEN crates.
pub type WardenResult<T> = Result<T, WardenError>;

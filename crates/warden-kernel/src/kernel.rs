//! The governance kernel: the single trust domain everything routes
//! through.
//!
//! Boot order is fixed: key store → manifest verification → policy
//! compilation → audit ledger → limiter/engine/authority. A manifest that
//! does not verify, or a key store that does not load, prevents boot;
//! nothing after boot is fatal.
//!
//! Per request: rate gate → action lookup → policy selection → context
//! build → clause evaluation → audit append → nonce bump → warrant. Every
//! exit from the pipeline, including the failure exits, produces a signed
//! warrant, so callers always hold a provable record of what was decided.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tracing::{info, warn};

use warden_audit::MerkleAuditLog;
use warden_contracts::{Context, DecisionProof, Trace, Warrant, WardenError, WardenResult};
use warden_crypto::{load_verified, KeyStore, WarrantAuthority};
use warden_evaluator::{Evaluator, StackMachine, SubprocessEvaluator};
use warden_policy::{Policy, PolicyEngine};

use crate::limiter::RateLimiter;
use crate::registry;

/// Which oracle implementation the kernel evaluates clauses with.
#[derive(Debug, Clone)]
pub enum EvaluatorKind {
    /// The in-process stack machine.
    Embedded,
    /// An external oracle binary spoken to over the wire protocol.
    Subprocess(PathBuf),
}

/// Everything the kernel needs to boot.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Signed policy manifest (JSON).
    pub manifest_path: PathBuf,
    /// Key store file (JSON, hex Ed25519 material).
    pub keys_path: PathBuf,
    /// Audit chain file (JSONL, append-only).
    pub audit_path: PathBuf,
    /// Token-bucket burst capacity per agent.
    pub rate_capacity: f64,
    /// Token refill rate per agent, tokens/second.
    pub rate_per_sec: f64,
    /// Warrant lifetime in seconds.
    pub warrant_ttl_secs: i64,
    /// Oracle selection.
    pub evaluator: EvaluatorKind,
}

impl KernelConfig {
    /// Reference configuration: embedded oracle, 5-token burst refilling
    /// at 1/s, 60-second warrants.
    pub fn new(
        manifest_path: impl Into<PathBuf>,
        keys_path: impl Into<PathBuf>,
        audit_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            keys_path: keys_path.into(),
            audit_path: audit_path.into(),
            rate_capacity: 5.0,
            rate_per_sec: 1.0,
            warrant_ttl_secs: 60,
            evaluator: EvaluatorKind::Embedded,
        }
    }
}

/// The outcome of `verify_action`: always a warrant, plus the proof when a
/// policy was actually evaluated (absent on the rate-limit and
/// policy-not-found exits).
#[derive(Debug)]
pub struct VerifiedAction {
    /// Signed attestation of the decision.
    pub warrant: Warrant,
    /// The trace-carrying proof, for feedback-driven re-planning.
    pub proof: Option<DecisionProof>,
}

/// The top-level orchestrator. One instance is one trust domain.
pub struct GovernanceKernel {
    policies: HashMap<String, Policy>,
    engine: PolicyEngine,
    audit: MerkleAuditLog,
    limiter: RateLimiter,
    authority: WarrantAuthority,
    constable_public: String,
    /// Process-lifetime issuance counter. Monotonic, never checked against
    /// past values here; replay detection is the verifier's duty.
    nonce: AtomicU64,
    ttl_secs: i64,
}

impl std::fmt::Debug for GovernanceKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernanceKernel")
            .field("policies", &self.policies.keys().collect::<Vec<_>>())
            .field("constable_public", &self.constable_public)
            .field("nonce", &self.nonce)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl GovernanceKernel {
    /// Secure boot. Fatal on an unloadable key store, an unverified
    /// manifest, an uncompilable policy, or an unopenable audit ledger.
    pub fn boot(config: KernelConfig) -> WardenResult<Self> {
        let keys = KeyStore::load(&config.keys_path)?;

        let defs = load_verified(&config.manifest_path, &keys.root.public)?;
        let mut policies = HashMap::with_capacity(defs.len());
        for (name, def) in &defs {
            policies.insert(name.clone(), Policy::compile(def)?);
        }

        let audit = MerkleAuditLog::open(&config.audit_path)?;

        let evaluator: Box<dyn Evaluator> = match &config.evaluator {
            EvaluatorKind::Embedded => Box::new(StackMachine::new()),
            EvaluatorKind::Subprocess(path) => Box::new(SubprocessEvaluator::new(path)),
        };

        info!(policies = policies.len(), "governance kernel booted");

        Ok(Self {
            policies,
            engine: PolicyEngine::new(evaluator),
            audit,
            limiter: RateLimiter::new(config.rate_capacity, config.rate_per_sec),
            authority: WarrantAuthority::new(&keys.constable.private)?,
            constable_public: keys.constable.public,
            nonce: AtomicU64::new(0),
            ttl_secs: config.warrant_ttl_secs,
        })
    }

    /// The constable public key warrants verify against.
    pub fn constable_public(&self) -> &str {
        &self.constable_public
    }

    /// Decide one action for one agent and return a signed warrant.
    ///
    /// Never panics and never errors on the request path: every failure
    /// mode degrades to a denied warrant.
    pub fn verify_action(
        &self,
        agent_id: &str,
        action: &str,
        role_mask: u32,
        overrides: Option<&Context>,
    ) -> VerifiedAction {
        // Rate gate runs before anything touches the oracle.
        if !self.limiter.allowed(agent_id) {
            warn!(agent_id, action, "rate limit exceeded");
            let mut inputs = BTreeMap::new();
            inputs.insert("action".to_string(), action.to_string());
            inputs.insert("role_mask".to_string(), role_mask.to_string());
            self.append_or_warn(agent_id, "RateLimitExceeded", inputs, false, Trace::new());
            return VerifiedAction {
                warrant: self.issue_warrant(action, agent_id, false),
                proof: None,
            };
        }

        // Unknown actions deny immediately, bypassing selection, evaluation,
        // and the ledger.
        let Some(action_id) = registry::action_id(action) else {
            warn!(agent_id, action, "unknown action");
            let mut trace = Trace::new();
            trace.record("unknown_action", false);
            return VerifiedAction {
                warrant: self.issue_warrant(action, agent_id, false),
                proof: Some(DecisionProof::new(false, trace, "Unknown")),
            };
        };

        let policy_name = select_policy(overrides);
        let mut context = build_context(role_mask, action_id, overrides);

        let Some(policy) = self.policies.get(policy_name) else {
            warn!(agent_id, policy_name, "selected policy not in verified manifest");
            self.append_or_warn(agent_id, policy_name, context.snapshot(), false, Trace::new());
            return VerifiedAction {
                warrant: self.issue_warrant(action, agent_id, false),
                proof: None,
            };
        };

        let proof = self.engine.evaluate(policy, &mut context);

        // A decision that cannot be witnessed cannot be granted.
        let audited = self
            .append_or_warn(
                agent_id,
                policy_name,
                context.snapshot(),
                proof.allowed,
                proof.trace.clone(),
            )
            .is_some();
        let allowed = proof.allowed && audited;

        VerifiedAction {
            warrant: self.issue_warrant(action, agent_id, allowed),
            proof: Some(proof),
        }
    }

    /// Evaluate without issuing a warrant, for callers that only need the
    /// trace. Skips the rate gate; the decision is still committed to the
    /// ledger.
    pub fn evaluate(
        &self,
        role_mask: u32,
        action: &str,
        overrides: Option<&Context>,
    ) -> WardenResult<DecisionProof> {
        let Some(action_id) = registry::action_id(action) else {
            let mut trace = Trace::new();
            trace.record("unknown_action", false);
            return Ok(DecisionProof::new(false, trace, "Unknown"));
        };

        let policy_name = select_policy(overrides);
        let mut context = build_context(role_mask, action_id, overrides);
        self.evaluate_policy("system", policy_name, &mut context)
    }

    /// Evaluate a named policy against a caller-derived context, committing
    /// the decision to the ledger. This is the composition surface domain
    /// resolvers build on instead of subclassing the kernel.
    pub fn evaluate_policy(
        &self,
        agent_id: &str,
        policy_name: &str,
        context: &mut Context,
    ) -> WardenResult<DecisionProof> {
        let policy = self
            .policies
            .get(policy_name)
            .ok_or_else(|| WardenError::PolicyNotFound {
                name: policy_name.to_string(),
            })?;

        let proof = self.engine.evaluate(policy, context);
        self.append_or_warn(
            agent_id,
            policy_name,
            context.snapshot(),
            proof.allowed,
            proof.trace.clone(),
        );
        Ok(proof)
    }

    /// Issue a warrant for an externally-derived decision, bumping the
    /// instance nonce.
    pub fn issue_warrant(&self, action: &str, agent_id: &str, allowed: bool) -> Warrant {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst) + 1;
        self.authority.issue(
            action,
            agent_id,
            allowed,
            Utc::now().timestamp(),
            nonce,
            self.ttl_secs,
        )
    }

    /// Replay the ledger and return its entries.
    pub fn audit_entries(&self) -> WardenResult<Vec<warden_audit::AuditEntry>> {
        self.audit.read_entries()
    }

    /// Append to the ledger, degrading to a logged warning on failure.
    /// Returns the entry hash when the commit succeeded.
    fn append_or_warn(
        &self,
        agent_id: &str,
        policy_name: &str,
        inputs: BTreeMap<String, String>,
        decision: bool,
        trace: Trace,
    ) -> Option<String> {
        match self
            .audit
            .append(agent_id, policy_name, inputs, decision, trace)
        {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!(agent_id, policy_name, error = %e, "audit append failed; decision degrades to denial");
                None
            }
        }
    }
}

/// The policy selection rule table. Deliberately a closed, explicit rule
/// set: the default policy, switched to epoch governance whenever the
/// caller supplies an `epoch` signal at all.
fn select_policy(overrides: Option<&Context>) -> &'static str {
    match overrides {
        Some(ctx) if ctx.contains("epoch") => "EpochGov",
        _ => "StandardAccess",
    }
}

fn build_context(role_mask: u32, action_id: u32, overrides: Option<&Context>) -> Context {
    let mut context = Context::new();
    context.set("role_mask", role_mask.to_string());
    context.set("action_id", action_id.to_string());
    if let Some(extra) = overrides {
        for (k, v) in extra.iter() {
            context.set(k, v.clone());
        }
    }
    context
}

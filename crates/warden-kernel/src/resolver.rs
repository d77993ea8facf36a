//! Domain resolvers: composition over the kernel, not inheritance.
//!
//! A resolver owns its domain's signature verification and context
//! derivation, then hands the derived context to the kernel's
//! `evaluate_policy`/`issue_warrant` surface. The kernel never learns what
//! an "incident" or a "trade" is; resolvers never touch kernel internals.
//!
//! Signature checks here follow the incident-context rule: an invalid or
//! missing signature becomes a `"0"` flag fed into the policy, never an
//! error escaping to the caller.

use std::collections::HashMap;

use ed25519_dalek::{Signature, Verifier};
use tracing::warn;

use warden_contracts::{Context, DecisionProof, Warrant, WardenResult};
use warden_crypto::verifying_key_from_hex;

use crate::kernel::GovernanceKernel;

/// Known co-signers for a resolver's domain, role name → hex public key.
#[derive(Debug, Clone, Default)]
pub struct SignerRegistry {
    keys: HashMap<String, String>,
}

impl SignerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a role's verifying key.
    pub fn register(&mut self, role: impl Into<String>, public_hex: impl Into<String>) {
        self.keys.insert(role.into(), public_hex.into());
    }

    /// Registered role names.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// Verify `sig_hex` by `role` over `message`. Every failure mode
    /// (unknown role, bad key, bad hex, bad signature) is `false`.
    pub fn verify(&self, role: &str, message: &[u8], sig_hex: &str) -> bool {
        let Some(public_hex) = self.keys.get(role) else {
            return false;
        };
        let Ok(key) = verifying_key_from_hex(public_hex) else {
            warn!(role, "registered verifying key unusable");
            return false;
        };
        let Ok(sig_bytes) = hex::decode(sig_hex) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(sig_bytes) else {
            return false;
        };

        let valid = key
            .verify(message, &Signature::from_bytes(&sig_bytes))
            .is_ok();
        if !valid {
            warn!(role, "signature verification failed; flag stays 0");
        }
        valid
    }
}

/// One incident presented for resolution.
#[derive(Debug, Clone)]
pub struct Incident {
    /// The action a granting warrant would authorize.
    pub action: String,
    /// The system or agent the warrant is issued to.
    pub agent_id: String,
    /// Severity, 0-100.
    pub severity: u32,
    /// The evidence blob co-signers signed over.
    pub evidence: String,
    /// `(role, hex signature)` pairs presented with the incident.
    pub signatures: Vec<(String, String)>,
}

/// Resolves incidents through a named escalation policy.
///
/// Context derivation: `severity`, plus one `<role>_sig` flag per
/// registered role: `"1"` only when that role presented a signature that
/// verifies over the incident evidence.
pub struct IncidentResolver<'k> {
    kernel: &'k GovernanceKernel,
    signers: SignerRegistry,
    policy_name: String,
}

impl<'k> IncidentResolver<'k> {
    /// Build a resolver over `kernel` for `policy_name`.
    pub fn new(
        kernel: &'k GovernanceKernel,
        signers: SignerRegistry,
        policy_name: impl Into<String>,
    ) -> Self {
        Self {
            kernel,
            signers,
            policy_name: policy_name.into(),
        }
    }

    /// Derive context, evaluate, commit to the ledger, and issue a warrant.
    ///
    /// Errors only when the escalation policy itself is absent from the
    /// verified manifest.
    pub fn resolve(&self, incident: &Incident) -> WardenResult<(Warrant, DecisionProof)> {
        let mut context = Context::new();
        context.set("severity", incident.severity.to_string());

        for role in self.signers.roles() {
            let presented = incident
                .signatures
                .iter()
                .find(|(r, _)| r == role)
                .map(|(_, sig)| sig.as_str());

            let verified = presented
                .map(|sig| self.signers.verify(role, incident.evidence.as_bytes(), sig))
                .unwrap_or(false);

            context.set(format!("{}_sig", role), if verified { "1" } else { "0" });
        }

        let proof =
            self.kernel
                .evaluate_policy(&incident.agent_id, &self.policy_name, &mut context)?;
        let warrant = self
            .kernel
            .issue_warrant(&incident.action, &incident.agent_id, proof.allowed);

        Ok((warrant, proof))
    }
}

//! # warden-kernel
//!
//! The WARDEN governance kernel: the trust-and-access layer between an
//! agent and the tools it may invoke.
//!
//! On boot the kernel loads its key store, verifies the signed policy
//! manifest against the root key, compiles the policies, and opens the
//! hash-chained audit ledger. Per request it applies the per-agent rate
//! gate, selects a policy, evaluates it clause by clause through the
//! expression oracle, commits the decision to the ledger, and issues a
//! constable-signed warrant, for denials as much as for grants.

pub mod kernel;
pub mod limiter;
pub mod registry;
pub mod resolver;

pub use kernel::{EvaluatorKind, GovernanceKernel, KernelConfig, VerifiedAction};
pub use limiter::RateLimiter;
pub use resolver::{Incident, IncidentResolver, SignerRegistry};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::Path;

    use ed25519_dalek::Signer;

    use warden_contracts::Context;
    use warden_crypto::{sign_manifest, signing_key_from_hex, KeyPair, KeyStore, WarrantAuthority};

    use super::registry::{ROLE_ADMIN, ROLE_GUEST, ROLE_USER};
    use super::{GovernanceKernel, Incident, IncidentResolver, KernelConfig, SignerRegistry};

    // ── Fixture ───────────────────────────────────────────────────────────────

    /// Write keys + signed manifest into `dir` and boot a kernel.
    fn boot_kernel(dir: &Path, rate_capacity: f64) -> GovernanceKernel {
        let keys = KeyStore::generate();
        keys.save(&dir.join("keys.json")).unwrap();

        let manifest =
            sign_manifest(super::registry::builtin_policies(), &keys.root.private).unwrap();
        std::fs::write(
            dir.join("policies.json"),
            serde_json::to_string_pretty(&manifest).unwrap(),
        )
        .unwrap();

        let mut config = KernelConfig::new(
            dir.join("policies.json"),
            dir.join("keys.json"),
            dir.join("audit.chain"),
        );
        config.rate_capacity = rate_capacity;
        config.rate_per_sec = 1.0;
        GovernanceKernel::boot(config).unwrap()
    }

    fn epoch(value: u32) -> Context {
        let mut ctx = Context::new();
        ctx.set("epoch", value.to_string());
        ctx
    }

    // ── Standard access ───────────────────────────────────────────────────────

    #[test]
    fn admin_bit_allows_any_action() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = boot_kernel(dir.path(), 100.0);

        for action in ["READ_FILE", "DELETE_FILE", "DELETE_DB", "SYSTEM_REBOOT"] {
            let outcome = kernel.verify_action("root-agent", action, ROLE_ADMIN, None);
            assert!(outcome.warrant.allowed, "admin must pass for {}", action);
            let proof = outcome.proof.unwrap();
            assert_eq!(proof.trace.get("is_admin"), Some(true));
        }
    }

    #[test]
    fn guest_is_confined_to_the_safe_band() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = boot_kernel(dir.path(), 100.0);

        let outcome = kernel.verify_action("guest-agent", "READ_FILE", ROLE_GUEST, None);
        assert!(outcome.warrant.allowed);
        assert_eq!(outcome.proof.unwrap().trace.get("is_safe_action"), Some(true));

        for action in ["WRITE_FILE", "DELETE_FILE", "DELETE_DB"] {
            let outcome = kernel.verify_action("guest-agent", action, ROLE_GUEST, None);
            assert!(!outcome.warrant.allowed, "guest must be denied {}", action);
            let proof = outcome.proof.unwrap();
            assert_eq!(proof.trace.get("is_admin"), Some(false));
            assert_eq!(proof.trace.get("is_safe_action"), Some(false));
        }
    }

    #[test]
    fn unknown_action_denies_without_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = boot_kernel(dir.path(), 100.0);

        let outcome = kernel.verify_action("agent", "LAUNCH_NUKES", ROLE_ADMIN, None);
        assert!(!outcome.warrant.allowed);

        let proof = outcome.proof.unwrap();
        assert_eq!(proof.policy_name, "Unknown");
        assert_eq!(proof.trace.len(), 1);
        assert_eq!(proof.trace.get("unknown_action"), Some(false));

        // Nothing reached the ledger for this request.
        assert!(kernel.audit_entries().unwrap().is_empty());
    }

    // ── Warrants ──────────────────────────────────────────────────────────────

    #[test]
    fn issued_warrants_validate_against_constable_key() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = boot_kernel(dir.path(), 100.0);

        let outcome = kernel.verify_action("agent", "READ_FILE", ROLE_USER, None);
        assert!(WarrantAuthority::validate(
            &outcome.warrant,
            kernel.constable_public()
        ));

        // A denial is equally provable.
        let denied = kernel.verify_action("agent", "DELETE_DB", ROLE_USER, None);
        assert!(!denied.warrant.allowed);
        assert!(WarrantAuthority::validate(
            &denied.warrant,
            kernel.constable_public()
        ));
    }

    #[test]
    fn nonces_increase_monotonically() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = boot_kernel(dir.path(), 100.0);

        let a = kernel.verify_action("agent", "READ_FILE", ROLE_USER, None);
        let b = kernel.verify_action("agent", "READ_FILE", ROLE_USER, None);
        let c = kernel.verify_action("agent", "LAUNCH_NUKES", ROLE_USER, None);

        assert!(a.warrant.nonce < b.warrant.nonce);
        assert!(b.warrant.nonce < c.warrant.nonce);
    }

    // ── Epoch governance ──────────────────────────────────────────────────────

    #[test]
    fn epoch_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = boot_kernel(dir.path(), 100.0);

        // Epoch 0 is normal mode: everyone acts, under the epoch policy.
        let outcome = kernel.verify_action("agent", "NET_CONNECT", ROLE_GUEST, Some(&epoch(0)));
        assert!(outcome.warrant.allowed);
        let proof = outcome.proof.unwrap();
        assert_eq!(proof.policy_name, "EpochGov");
        assert_eq!(proof.trace.get("is_normal_mode"), Some(true));

        // Without the epoch signal the default policy applies.
        let outcome = kernel.verify_action("agent", "READ_FILE", ROLE_GUEST, None);
        assert_eq!(outcome.proof.unwrap().policy_name, "StandardAccess");

        // Epoch 1 switches to EpochGov and locks guests out.
        let outcome = kernel.verify_action("agent", "NET_CONNECT", ROLE_GUEST, Some(&epoch(1)));
        assert!(!outcome.warrant.allowed);
        let proof = outcome.proof.unwrap();
        assert_eq!(proof.policy_name, "EpochGov");
        assert_eq!(proof.trace.get("is_normal_mode"), Some(false));
        assert_eq!(proof.trace.get("is_emergency_mode"), Some(true));
        assert_eq!(proof.trace.get("is_admin"), Some(false));

        // Admins ride out the emergency.
        let outcome = kernel.verify_action("agent", "NET_CONNECT", ROLE_ADMIN, Some(&epoch(1)));
        assert!(outcome.warrant.allowed);
        assert_eq!(outcome.proof.unwrap().trace.get("is_admin"), Some(true));
    }

    // ── Rate limiting ─────────────────────────────────────────────────────────

    #[test]
    fn rate_gate_denies_before_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = boot_kernel(dir.path(), 2.0);

        assert!(kernel.verify_action("noisy", "READ_FILE", ROLE_USER, None).warrant.allowed);
        assert!(kernel.verify_action("noisy", "READ_FILE", ROLE_USER, None).warrant.allowed);

        let limited = kernel.verify_action("noisy", "READ_FILE", ROLE_USER, None);
        assert!(!limited.warrant.allowed);
        assert!(limited.proof.is_none(), "no policy ran for the limited request");

        // The denial is still witnessed in the ledger, tagged as such.
        let entries = kernel.audit_entries().unwrap();
        assert_eq!(entries.last().unwrap().policy_name, "RateLimitExceeded");
        assert!(!entries.last().unwrap().decision);

        // Other agents are unaffected.
        assert!(kernel.verify_action("quiet", "READ_FILE", ROLE_USER, None).warrant.allowed);
    }

    // ── Audit chain ───────────────────────────────────────────────────────────

    #[test]
    fn decisions_form_a_valid_chain() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = boot_kernel(dir.path(), 100.0);

        kernel.verify_action("a", "READ_FILE", ROLE_GUEST, None);
        kernel.verify_action("b", "DELETE_DB", ROLE_GUEST, None);
        kernel.verify_action("c", "DEPLOY", ROLE_ADMIN, None);

        let entries = kernel.audit_entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert!(warden_audit::verify_chain(&entries));

        // Inputs carry the snapshot the decision was made from, clause
        // feedback included.
        assert_eq!(entries[0].inputs.get("action_id").map(String::as_str), Some("101"));
        assert_eq!(entries[0].inputs.get("is_safe_action").map(String::as_str), Some("1"));
    }

    // ── Lower-level evaluate ──────────────────────────────────────────────────

    #[test]
    fn evaluate_returns_proof_without_warrant() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = boot_kernel(dir.path(), 100.0);

        let proof = kernel.evaluate(ROLE_GUEST, "READ_FILE", None).unwrap();
        assert!(proof.allowed);
        assert_eq!(proof.policy_name, "StandardAccess");
    }

    // ── Treasury (two-key turn) ───────────────────────────────────────────────

    fn treasury_context(amount: u64, alpha: bool, beta: bool) -> Context {
        let mut ctx = Context::new();
        ctx.set("amount", amount.to_string());
        ctx.set("alpha_verified", if alpha { "1" } else { "0" });
        ctx.set("beta_verified", if beta { "1" } else { "0" });
        ctx
    }

    #[test]
    fn treasury_two_key_turn() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = boot_kernel(dir.path(), 100.0);

        // Micro-trade: one key turns.
        let mut ctx = treasury_context(5_000, true, false);
        let proof = kernel.evaluate_policy("treasury", "TreasuryGuard_v1", &mut ctx).unwrap();
        assert!(proof.allowed);

        // Macro-trade: solo attempt fails, dual succeeds.
        let mut ctx = treasury_context(50_000, true, false);
        let proof = kernel.evaluate_policy("treasury", "TreasuryGuard_v1", &mut ctx).unwrap();
        assert!(!proof.allowed);
        assert_eq!(proof.trace.get("auth_logic"), Some(false));

        let mut ctx = treasury_context(50_000, true, true);
        let proof = kernel.evaluate_policy("treasury", "TreasuryGuard_v1", &mut ctx).unwrap();
        assert!(proof.allowed);

        // The circuit breaker overrides everything.
        let mut ctx = treasury_context(5_000_000, true, true);
        let proof = kernel.evaluate_policy("treasury", "TreasuryGuard_v1", &mut ctx).unwrap();
        assert!(!proof.allowed);
        assert_eq!(proof.trace.get("circuit_breaker"), Some(false));
    }

    #[test]
    fn evaluate_policy_unknown_name_errors() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = boot_kernel(dir.path(), 100.0);

        let mut ctx = Context::new();
        let err = kernel.evaluate_policy("x", "NoSuchPolicy", &mut ctx).unwrap_err();
        assert!(matches!(err, warden_contracts::WardenError::PolicyNotFound { .. }));
    }

    // ── Tiered multi-signature escalation ─────────────────────────────────────

    fn incident(severity: u32, signatures: Vec<(String, String)>) -> Incident {
        Incident {
            action: "SOC_ESCALATION".to_string(),
            agent_id: "soc-system".to_string(),
            severity,
            evidence: format!("incident-log-{}", severity),
            signatures,
        }
    }

    fn sign_evidence(pair: &KeyPair, evidence: &str) -> String {
        let key = signing_key_from_hex(&pair.private).unwrap();
        hex::encode(key.sign(evidence.as_bytes()).to_bytes())
    }

    #[test]
    fn soc_tiered_multisignature_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = boot_kernel(dir.path(), 100.0);

        let investigator = KeyPair::generate();
        let human = KeyPair::generate();

        let mut signers = SignerRegistry::new();
        signers.register("investigator", &investigator.public);
        signers.register("human", &human.public);
        let resolver = IncidentResolver::new(&kernel, signers, "SOCMatrix");

        // Severity 82, investigator alone: the two-signature tier is not met.
        let solo = incident(
            82,
            vec![(
                "investigator".to_string(),
                sign_evidence(&investigator, "incident-log-82"),
            )],
        );
        let (warrant, proof) = resolver.resolve(&solo).unwrap();
        assert!(!warrant.allowed);
        assert_eq!(proof.trace.get("investigator_signed"), Some(true));
        assert_eq!(proof.trace.get("human_signed"), Some(false));

        // Same severity with both signatures: granted.
        let dual = incident(
            82,
            vec![
                (
                    "investigator".to_string(),
                    sign_evidence(&investigator, "incident-log-82"),
                ),
                ("human".to_string(), sign_evidence(&human, "incident-log-82")),
            ],
        );
        let (warrant, proof) = resolver.resolve(&dual).unwrap();
        assert!(warrant.allowed);
        assert!(proof.allowed);
        assert!(WarrantAuthority::validate(&warrant, kernel.constable_public()));

        // Severity 99: the kill switch forces denial however many sign.
        let panic = incident(
            99,
            vec![
                (
                    "investigator".to_string(),
                    sign_evidence(&investigator, "incident-log-99"),
                ),
                ("human".to_string(), sign_evidence(&human, "incident-log-99")),
            ],
        );
        let (warrant, proof) = resolver.resolve(&panic).unwrap();
        assert!(!warrant.allowed);
        assert_eq!(proof.trace.get("kill_switch"), Some(true));
    }

    #[test]
    fn invalid_cosignature_is_a_false_flag_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = boot_kernel(dir.path(), 100.0);

        let investigator = KeyPair::generate();
        let impostor = KeyPair::generate();

        let mut signers = SignerRegistry::new();
        signers.register("investigator", &investigator.public);
        signers.register("human", &investigator.public);
        let resolver = IncidentResolver::new(&kernel, signers, "SOCMatrix");

        // The "human" signature is from the wrong key: it must flag 0 and
        // the resolution must still complete.
        let inc = incident(
            82,
            vec![
                (
                    "investigator".to_string(),
                    sign_evidence(&investigator, "incident-log-82"),
                ),
                ("human".to_string(), sign_evidence(&impostor, "incident-log-82")),
            ],
        );
        let (warrant, proof) = resolver.resolve(&inc).unwrap();
        assert!(!warrant.allowed);
        assert_eq!(proof.trace.get("human_signed"), Some(false));
    }

    // ── Secure boot ───────────────────────────────────────────────────────────

    #[test]
    fn boot_refuses_manifest_signed_by_wrong_key() {
        let dir = tempfile::tempdir().unwrap();

        let keys = KeyStore::generate();
        keys.save(&dir.path().join("keys.json")).unwrap();

        // Manifest signed by a different root.
        let rogue = KeyStore::generate();
        let manifest =
            sign_manifest(super::registry::builtin_policies(), &rogue.root.private).unwrap();
        std::fs::write(
            dir.path().join("policies.json"),
            serde_json::to_string(&manifest).unwrap(),
        )
        .unwrap();

        let config = KernelConfig::new(
            dir.path().join("policies.json"),
            dir.path().join("keys.json"),
            dir.path().join("audit.chain"),
        );
        let err = GovernanceKernel::boot(config).unwrap_err();
        assert!(matches!(
            err,
            warden_contracts::WardenError::ManifestVerification { .. }
        ));
    }

    #[test]
    fn boot_refuses_missing_key_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = KernelConfig::new(
            dir.path().join("policies.json"),
            dir.path().join("keys.json"),
            dir.path().join("audit.chain"),
        );
        assert!(GovernanceKernel::boot(config).is_err());
    }
}

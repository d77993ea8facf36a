//! Demo scenarios exercising the kernel end to end.
//!
//! Each scenario boots a real kernel from files in the working directory
//! (generating keys and a signed manifest on first run) and drives it the
//! way a governed agent system would: request, inspect the trace, escalate,
//! retry.

use std::path::Path;

use ed25519_dalek::Signer;

use warden_contracts::WardenResult;
use warden_crypto::{sign_manifest, signing_key_from_hex, KeyPair, KeyStore, WarrantAuthority};
use warden_kernel::registry::{builtin_policies, ROLE_ADMIN, ROLE_GUEST};
use warden_kernel::{
    GovernanceKernel, Incident, IncidentResolver, KernelConfig, SignerRegistry, VerifiedAction,
};

/// Boot a kernel out of `dir`, generating keys and a signed manifest on
/// first run.
pub fn boot_from_dir(dir: &Path) -> WardenResult<GovernanceKernel> {
    std::fs::create_dir_all(dir).ok();

    let keys_path = dir.join("keys.json");
    if !keys_path.exists() {
        println!("[setup] generating key store at {}", keys_path.display());
        KeyStore::generate().save(&keys_path)?;
    }
    let keys = KeyStore::load(&keys_path)?;

    let manifest_path = dir.join("policies.json");
    if !manifest_path.exists() {
        println!("[setup] signing builtin policy manifest");
        let manifest = sign_manifest(builtin_policies(), &keys.root.private)?;
        std::fs::write(
            &manifest_path,
            serde_json::to_string_pretty(&manifest).map_err(|e| {
                warden_contracts::WardenError::ConfigError {
                    reason: format!("manifest serialization failed: {}", e),
                }
            })?,
        )
        .map_err(|e| warden_contracts::WardenError::ConfigError {
            reason: format!("cannot write manifest: {}", e),
        })?;
    }

    GovernanceKernel::boot(KernelConfig::new(
        manifest_path,
        keys_path,
        dir.join("audit.chain"),
    ))
}

fn report(label: &str, outcome: &VerifiedAction) {
    let verdict = if outcome.warrant.allowed { "GRANTED" } else { "DENIED" };
    print!("  {:<40} {}", label, verdict);
    if let Some(proof) = &outcome.proof {
        let trace: Vec<String> = proof
            .trace
            .iter()
            .map(|(name, v)| format!("{}={}", name, if v { 1 } else { 0 }))
            .collect();
        print!("  [{}] {}", proof.policy_name, trace.join(" "));
    }
    println!();
}

// ── Scenario: standard access ─────────────────────────────────────────────────

/// Guests stay inside the safe action band; admins pass everywhere.
pub fn access(dir: &Path) -> WardenResult<()> {
    println!("\n=== Standard Access ===");
    let kernel = boot_from_dir(dir)?;

    report("guest READ_FILE", &kernel.verify_action("guest-1", "READ_FILE", ROLE_GUEST, None));
    report("guest DELETE_FILE", &kernel.verify_action("guest-1", "DELETE_FILE", ROLE_GUEST, None));
    report("admin DELETE_FILE", &kernel.verify_action("ops-1", "DELETE_FILE", ROLE_ADMIN, None));
    report("admin LAUNCH_NUKES (unknown)", &kernel.verify_action("ops-1", "LAUNCH_NUKES", ROLE_ADMIN, None));

    Ok(())
}

// ── Scenario: epoch governance ────────────────────────────────────────────────

/// The epoch signal switches policy: epoch 0 is normal mode, and only
/// admins act during an emergency.
pub fn epoch(dir: &Path) -> WardenResult<()> {
    println!("\n=== Epoch Governance ===");
    let kernel = boot_from_dir(dir)?;

    let mut normal = warden_contracts::Context::new();
    normal.set("epoch", "0");
    let mut emergency = warden_contracts::Context::new();
    emergency.set("epoch", "1");

    report("guest NET_CONNECT @ epoch 0", &kernel.verify_action("guest-1", "NET_CONNECT", ROLE_GUEST, Some(&normal)));
    report("guest NET_CONNECT @ epoch 1", &kernel.verify_action("guest-1", "NET_CONNECT", ROLE_GUEST, Some(&emergency)));
    report("admin NET_CONNECT @ epoch 1", &kernel.verify_action("ops-1", "NET_CONNECT", ROLE_ADMIN, Some(&emergency)));

    Ok(())
}

// ── Scenario: two-key treasury ────────────────────────────────────────────────

/// Trades below 10k need one verified signer; above, two; nothing clears
/// the 1M circuit breaker.
pub fn treasury(dir: &Path) -> WardenResult<()> {
    println!("\n=== Two-Key Treasury ===");
    let kernel = boot_from_dir(dir)?;

    for (amount, alpha, beta, label) in [
        (5_000u64, true, false, "micro-trade, Alpha alone"),
        (50_000, true, false, "macro-trade, Alpha alone"),
        (50_000, true, true, "macro-trade, Alpha + Beta"),
        (5_000_000, true, true, "over the circuit breaker"),
    ] {
        let mut ctx = warden_contracts::Context::new();
        ctx.set("amount", amount.to_string());
        ctx.set("alpha_verified", if alpha { "1" } else { "0" });
        ctx.set("beta_verified", if beta { "1" } else { "0" });

        let proof = kernel.evaluate_policy("treasury", "TreasuryGuard_v1", &mut ctx)?;
        let warrant = kernel.issue_warrant("BUY_ASSET", "treasury", proof.allowed);
        println!(
            "  ${:<9} {:<26} {}  nonce={}",
            amount,
            label,
            if proof.allowed { "GRANTED" } else { "DENIED" },
            warrant.nonce
        );
    }

    // The ledger witnessed all four decisions; prove the chain.
    let entries = kernel.audit_entries()?;
    println!(
        "  ledger: {} entries, chain valid: {}",
        entries.len(),
        warden_audit::verify_chain(&entries)
    );

    Ok(())
}

// ── Scenario: SOC escalation ──────────────────────────────────────────────────

fn sign_evidence(pair: &KeyPair, evidence: &str) -> WardenResult<String> {
    let key = signing_key_from_hex(&pair.private)?;
    Ok(hex::encode(key.sign(evidence.as_bytes()).to_bytes()))
}

/// Tiered multi-signature incident response with a severity kill switch.
pub fn soc(dir: &Path) -> WardenResult<()> {
    println!("\n=== SOC Escalation Matrix ===");
    let kernel = boot_from_dir(dir)?;

    let investigator = KeyPair::generate();
    let human = KeyPair::generate();
    println!("  investigator key {}", &investigator.public[..8]);
    println!("  human key        {}", &human.public[..8]);

    let mut signers = SignerRegistry::new();
    signers.register("investigator", &investigator.public);
    signers.register("human", &human.public);
    let resolver = IncidentResolver::new(&kernel, signers, "SOCMatrix");

    let run = |severity: u32, with_human: bool, label: &str| -> WardenResult<()> {
        let evidence = format!("incident-log-{}", severity);
        let mut signatures = vec![(
            "investigator".to_string(),
            sign_evidence(&investigator, &evidence)?,
        )];
        if with_human {
            signatures.push(("human".to_string(), sign_evidence(&human, &evidence)?));
        }

        let (warrant, proof) = resolver.resolve(&Incident {
            action: "SOC_ESCALATION".to_string(),
            agent_id: "soc-system".to_string(),
            severity,
            evidence,
            signatures,
        })?;

        let trace: Vec<String> = proof
            .trace
            .iter()
            .map(|(name, v)| format!("{}={}", name, if v { 1 } else { 0 }))
            .collect();
        println!(
            "  sev {:<3} {:<28} {}  {}",
            severity,
            label,
            if warrant.allowed { "GRANTED" } else { "DENIED" },
            trace.join(" ")
        );
        Ok(())
    };

    run(82, false, "investigator acting solo")?;
    run(82, true, "human co-signs")?;
    run(99, true, "kill switch severity")?;

    // Warrants, grants and denials alike, verify against the constable.
    let sample = kernel.issue_warrant("SOC_ESCALATION", "soc-system", false);
    println!(
        "  denial warrant verifies: {}",
        WarrantAuthority::validate(&sample, kernel.constable_public())
    );

    Ok(())
}

/// Run every scenario in sequence against one shared kernel directory.
pub fn run_all(dir: &Path) -> WardenResult<()> {
    access(dir)?;
    epoch(dir)?;
    treasury(dir)?;
    soc(dir)?;
    Ok(())
}

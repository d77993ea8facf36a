//! WARDEN Governance Kernel CLI
//!
//! Operational tooling plus end-to-end demo scenarios, all driving the real
//! kernel components: signed manifests, the embedded oracle, the hash
//! chain, and constable warrants.
//!
//! Usage:
//!   cargo run -p warden-cli -- keygen
//!   cargo run -p warden-cli -- sign-manifest
//!   cargo run -p warden-cli -- verify-chain
//!   cargo run -p warden-cli -- demo run-all

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use warden_crypto::{sign_manifest, KeyStore};
use warden_kernel::registry::builtin_policies;

mod scenarios;

// ── CLI definition ────────────────────────────────────────────────────────────

/// WARDEN: policy-decision kernel for autonomous agents.
#[derive(Parser)]
#[command(
    name = "warden",
    about = "WARDEN governance kernel tooling and demos",
    long_about = "Generates keys, signs policy manifests, verifies audit chains,\n\
                  and runs demo scenarios against the real governance kernel."
)]
struct Cli {
    /// Working directory for keys, manifest, and the audit chain.
    #[arg(long, default_value = ".warden", global = true)]
    dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate root + constable key pairs into <dir>/keys.json.
    Keygen,
    /// Sign the builtin policy set with the root key into <dir>/policies.json.
    SignManifest,
    /// Replay <dir>/audit.chain and verify the hash chain.
    VerifyChain,
    /// Run a demo scenario against a kernel booted from <dir>.
    Demo {
        #[command(subcommand)]
        scenario: Scenario,
    },
}

#[derive(Subcommand)]
enum Scenario {
    /// All scenarios in sequence.
    RunAll,
    /// Standard role/action-band access control.
    Access,
    /// Epoch-switched emergency governance.
    Epoch,
    /// Two-key-turn treasury guard.
    Treasury,
    /// Tiered multi-signature SOC escalation with kill switch.
    Soc,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Structured logging; RUST_LOG=debug shows per-clause evaluation.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Keygen => keygen(&cli.dir),
        Command::SignManifest => sign(&cli.dir),
        Command::VerifyChain => verify_chain(&cli.dir),
        Command::Demo { scenario } => {
            print_banner();
            match scenario {
                Scenario::RunAll => scenarios::run_all(&cli.dir),
                Scenario::Access => scenarios::access(&cli.dir),
                Scenario::Epoch => scenarios::epoch(&cli.dir),
                Scenario::Treasury => scenarios::treasury(&cli.dir),
                Scenario::Soc => scenarios::soc(&cli.dir),
            }
        }
    };

    if let Err(e) = result {
        eprintln!("warden error: {}", e);
        std::process::exit(1);
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn keygen(dir: &std::path::Path) -> warden_contracts::WardenResult<()> {
    std::fs::create_dir_all(dir).ok();
    let path = dir.join("keys.json");
    let keys = KeyStore::generate();
    keys.save(&path)?;

    println!("wrote {}", path.display());
    println!("root public:      {}", keys.root.public);
    println!("constable public: {}", keys.constable.public);
    Ok(())
}

fn sign(dir: &std::path::Path) -> warden_contracts::WardenResult<()> {
    let keys = KeyStore::load(&dir.join("keys.json"))?;
    let manifest = sign_manifest(builtin_policies(), &keys.root.private)?;

    let path = dir.join("policies.json");
    let json = serde_json::to_string_pretty(&manifest).map_err(|e| {
        warden_contracts::WardenError::ConfigError {
            reason: format!("manifest serialization failed: {}", e),
        }
    })?;
    std::fs::write(&path, json).map_err(|e| warden_contracts::WardenError::ConfigError {
        reason: format!("cannot write manifest: {}", e),
    })?;

    println!(
        "signed {} policies into {} with root key {}",
        manifest.policies.len(),
        path.display(),
        &keys.root.public[..16]
    );
    Ok(())
}

fn verify_chain(dir: &std::path::Path) -> warden_contracts::WardenResult<()> {
    let path = dir.join("audit.chain");
    let entries = warden_audit::read_entries(&path)?;
    let valid = warden_audit::verify_chain(&entries);

    println!(
        "{}: {} entries, chain {}",
        path.display(),
        entries.len(),
        if valid { "VALID" } else { "BROKEN" }
    );

    if !valid {
        std::process::exit(2);
    }
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("WARDEN Policy-Decision Kernel");
    println!("===============================");
    println!();
    println!("Pipeline per request:");
    println!("  [1] Rate gate (per-agent token bucket)");
    println!("  [2] Policy selection (explicit rule table)");
    println!("  [3] Clause evaluation through the expression oracle, with feedback");
    println!("  [4] Hash-chained audit commit");
    println!("  [5] Constable-signed warrant; denials are warrants too");
    println!();
}

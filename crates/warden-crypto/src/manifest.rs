//! Signed policy manifests, the "secure boot" of the kernel.
//!
//! A manifest is a root-signed bundle of policy definitions. Nothing trusts
//! a policy until the whole bundle's signature verifies against the root
//! public key; there is no path that accepts a subset. Verification runs
//! once at kernel construction; there is no warm-reload.
//!
//! The signature covers the canonical serialization of the `policies`
//! payload: `serde_json::to_vec` over a `BTreeMap` keyed by policy name
//! (sorted), with each policy's clauses in document order (clause order is
//! semantic and must be committed to).

use std::collections::BTreeMap;
use std::path::Path;

use ed25519_dalek::{Signature, Signer, Verifier};
use serde::{Deserialize, Serialize};
use tracing::info;

use warden_contracts::{PolicyDef, WardenError, WardenResult};

use crate::keys::{signing_key_from_hex, verifying_key_from_hex};

/// The on-disk manifest: `{"signature": hex, "policies": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyManifest {
    /// Hex Ed25519 signature over the canonical `policies` bytes.
    pub signature: String,
    /// Policy definitions by name.
    pub policies: BTreeMap<String, PolicyDef>,
}

/// The exact bytes the root key signs.
pub fn canonical_policies_bytes(policies: &BTreeMap<String, PolicyDef>) -> Vec<u8> {
    serde_json::to_vec(policies).expect("policy map must always serialize to JSON")
}

/// Sign a policy set with the root signing key.
pub fn sign_manifest(
    policies: BTreeMap<String, PolicyDef>,
    root_private_hex: &str,
) -> WardenResult<PolicyManifest> {
    let signing_key = signing_key_from_hex(root_private_hex)?;
    let signature = signing_key.sign(&canonical_policies_bytes(&policies));
    Ok(PolicyManifest {
        signature: hex::encode(signature.to_bytes()),
        policies,
    })
}

/// Verify a parsed manifest against the root public key.
fn verify_manifest(manifest: &PolicyManifest, root_public_hex: &str) -> WardenResult<()> {
    let verifying_key =
        verifying_key_from_hex(root_public_hex).map_err(|e| WardenError::ManifestVerification {
            reason: format!("root public key unusable: {}", e),
        })?;

    let sig_bytes = hex::decode(&manifest.signature).map_err(|e| {
        WardenError::ManifestVerification {
            reason: format!("signature is not valid hex: {}", e),
        }
    })?;
    let sig_bytes: [u8; 64] =
        sig_bytes
            .try_into()
            .map_err(|_| WardenError::ManifestVerification {
                reason: "signature must be exactly 64 bytes".to_string(),
            })?;
    let signature = Signature::from_bytes(&sig_bytes);

    verifying_key
        .verify(&canonical_policies_bytes(&manifest.policies), &signature)
        .map_err(|_| WardenError::ManifestVerification {
            reason: "policy tampering detected: signature does not match payload".to_string(),
        })
}

/// Load a manifest file and return its policies only if the signature
/// verifies.
///
/// Fails closed: I/O errors, malformed JSON, and signature mismatches are
/// all `ManifestVerification`; the caller cannot distinguish "tampered"
/// from "unreadable" and must refuse to boot either way.
pub fn load_verified(
    path: &Path,
    root_public_hex: &str,
) -> WardenResult<BTreeMap<String, PolicyDef>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        WardenError::ManifestVerification {
            reason: format!("cannot read manifest '{}': {}", path.display(), e),
        }
    })?;
    let manifest: PolicyManifest = serde_json::from_str(&contents).map_err(|e| {
        WardenError::ManifestVerification {
            reason: format!("manifest '{}' unparsable: {}", path.display(), e),
        }
    })?;

    verify_manifest(&manifest, root_public_hex)?;

    info!(
        path = %path.display(),
        policies = manifest.policies.len(),
        "policy manifest verified"
    );
    Ok(manifest.policies)
}

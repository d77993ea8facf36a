//! # warden-crypto
//!
//! The Ed25519 trust chain for WARDEN.
//!
//! Three pieces, each small and auditable:
//!
//! - [`KeyStore`]: root and constable key pairs, hex on disk, loaded once at
//!   boot.
//! - [`manifest`]: root-signed policy bundles; the kernel refuses to boot
//!   on anything that does not verify (all-or-nothing, fail closed).
//! - [`WarrantAuthority`]: constable-signed, expiring, nonce-tagged
//!   warrants attesting every decision, denials included.

pub mod keys;
pub mod manifest;
pub mod warrant;

pub use keys::{signing_key_from_hex, verifying_key_from_hex, KeyPair, KeyStore};
pub use manifest::{canonical_policies_bytes, load_verified, sign_manifest, PolicyManifest};
pub use warrant::WarrantAuthority;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use warden_contracts::{ClauseMap, PolicyDef, WardenError};

    use super::{load_verified, sign_manifest, KeyStore, WarrantAuthority};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn small_policy_set() -> BTreeMap<String, PolicyDef> {
        let mut clauses = ClauseMap::new();
        clauses.insert("is_admin", "{role_mask} 4 \"&\" 4 \"=\"".to_string());
        let mut policies = BTreeMap::new();
        policies.insert(
            "StandardAccess".to_string(),
            PolicyDef {
                name: "StandardAccess".to_string(),
                clauses,
                combination: "OR".to_string(),
            },
        );
        policies
    }

    fn issue_sample(keys: &KeyStore) -> warden_contracts::Warrant {
        let authority = WarrantAuthority::new(&keys.constable.private).unwrap();
        authority.issue("READ_FILE", "agent-7", true, 1_700_000_000, 1, 60)
    }

    // ── Warrant round trips ───────────────────────────────────────────────────

    #[test]
    fn warrant_round_trip_validates() {
        let keys = KeyStore::generate();
        let warrant = issue_sample(&keys);

        assert_eq!(warrant.expiry, warrant.timestamp + 60);
        assert!(WarrantAuthority::validate_at(
            &warrant,
            &keys.constable.public,
            warrant.timestamp + 1
        ));
    }

    #[test]
    fn denied_warrant_also_validates() {
        let keys = KeyStore::generate();
        let authority = WarrantAuthority::new(&keys.constable.private).unwrap();
        let warrant = authority.issue("DELETE_DB", "agent-7", false, 1_700_000_000, 2, 60);

        assert!(!warrant.allowed);
        assert!(WarrantAuthority::validate_at(
            &warrant,
            &keys.constable.public,
            warrant.timestamp
        ));
    }

    #[test]
    fn mutating_any_signed_field_invalidates() {
        let keys = KeyStore::generate();
        let base = issue_sample(&keys);
        let now = base.timestamp + 1;

        let mut w = base.clone();
        w.action = "DELETE_DB".to_string();
        assert!(!WarrantAuthority::validate_at(&w, &keys.constable.public, now));

        let mut w = base.clone();
        w.agent_id = "impostor".to_string();
        assert!(!WarrantAuthority::validate_at(&w, &keys.constable.public, now));

        let mut w = base.clone();
        w.allowed = false;
        assert!(!WarrantAuthority::validate_at(&w, &keys.constable.public, now));

        let mut w = base.clone();
        w.timestamp += 1;
        assert!(!WarrantAuthority::validate_at(&w, &keys.constable.public, now));

        let mut w = base.clone();
        w.nonce += 1;
        assert!(!WarrantAuthority::validate_at(&w, &keys.constable.public, now));

        let mut w = base.clone();
        w.expiry += 3600;
        assert!(!WarrantAuthority::validate_at(&w, &keys.constable.public, now));
    }

    #[test]
    fn flipping_a_signature_bit_invalidates() {
        let keys = KeyStore::generate();
        let mut warrant = issue_sample(&keys);
        let now = warrant.timestamp + 1;

        // Flip the low bit of the first signature byte.
        let mut sig = hex::decode(&warrant.signature).unwrap();
        sig[0] ^= 0x01;
        warrant.signature = hex::encode(sig);

        assert!(!WarrantAuthority::validate_at(&warrant, &keys.constable.public, now));
    }

    #[test]
    fn expired_warrant_is_invalid_even_with_good_signature() {
        let keys = KeyStore::generate();
        let warrant = issue_sample(&keys);

        assert!(WarrantAuthority::validate_at(
            &warrant,
            &keys.constable.public,
            warrant.expiry
        ));
        assert!(!WarrantAuthority::validate_at(
            &warrant,
            &keys.constable.public,
            warrant.expiry + 1
        ));
    }

    #[test]
    fn wrong_key_never_validates() {
        let keys = KeyStore::generate();
        let other = KeyStore::generate();
        let warrant = issue_sample(&keys);

        assert!(!WarrantAuthority::validate_at(
            &warrant,
            &other.constable.public,
            warrant.timestamp
        ));
        // Garbage key material is false, not a panic.
        assert!(!WarrantAuthority::validate_at(&warrant, "zz-not-hex", warrant.timestamp));
    }

    // ── Manifest secure boot ──────────────────────────────────────────────────

    #[test]
    fn signed_manifest_loads() {
        let keys = KeyStore::generate();
        let manifest = sign_manifest(small_policy_set(), &keys.root.private).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.json");
        std::fs::write(&path, serde_json::to_string_pretty(&manifest).unwrap()).unwrap();

        let policies = load_verified(&path, &keys.root.public).unwrap();
        assert_eq!(policies.len(), 1);
        assert!(policies.contains_key("StandardAccess"));
    }

    #[test]
    fn tampered_payload_fails_closed() {
        let keys = KeyStore::generate();
        let mut manifest = sign_manifest(small_policy_set(), &keys.root.private).unwrap();

        // Loosen the admin check after signing.
        let def = manifest.policies.get_mut("StandardAccess").unwrap();
        def.clauses.insert("is_admin", "1 1 \"=\"".to_string());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.json");
        std::fs::write(&path, serde_json::to_string(&manifest).unwrap()).unwrap();

        let err = load_verified(&path, &keys.root.public).unwrap_err();
        assert!(matches!(err, WardenError::ManifestVerification { .. }));
    }

    #[test]
    fn tampered_signature_fails_closed() {
        let keys = KeyStore::generate();
        let mut manifest = sign_manifest(small_policy_set(), &keys.root.private).unwrap();

        let mut sig = hex::decode(&manifest.signature).unwrap();
        sig[10] ^= 0x80;
        manifest.signature = hex::encode(sig);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.json");
        std::fs::write(&path, serde_json::to_string(&manifest).unwrap()).unwrap();

        assert!(load_verified(&path, &keys.root.public).is_err());
    }

    #[test]
    fn missing_manifest_fails_closed() {
        let keys = KeyStore::generate();
        let err = load_verified(std::path::Path::new("/nonexistent/policies.json"), &keys.root.public)
            .unwrap_err();
        assert!(matches!(err, WardenError::ManifestVerification { .. }));
    }

    #[test]
    fn wrong_root_key_fails_closed() {
        let keys = KeyStore::generate();
        let other = KeyStore::generate();
        let manifest = sign_manifest(small_policy_set(), &keys.root.private).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.json");
        std::fs::write(&path, serde_json::to_string(&manifest).unwrap()).unwrap();

        assert!(load_verified(&path, &other.root.public).is_err());
    }

    // ── Key store ─────────────────────────────────────────────────────────────

    #[test]
    fn key_store_round_trips_through_disk() {
        let keys = KeyStore::generate();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");

        keys.save(&path).unwrap();
        let loaded = KeyStore::load(&path).unwrap();

        assert_eq!(loaded.root.public, keys.root.public);
        assert_eq!(loaded.constable.private, keys.constable.private);
    }

    #[test]
    fn missing_key_store_is_fatal() {
        let err = KeyStore::load(std::path::Path::new("/nonexistent/keys.json")).unwrap_err();
        assert!(matches!(err, WardenError::KeyStore { .. }));
    }
}

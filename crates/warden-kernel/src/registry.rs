//! Action registry, role masks, and the builtin policy set.
//!
//! Action ids are banded by risk:
//!   100-199 safe / read only
//!   200-299 write / modification
//!   300-399 network
//!   900-999 system / admin

use std::collections::BTreeMap;

use warden_contracts::{ClauseMap, PolicyDef};

// ── Roles ─────────────────────────────────────────────────────────────────────

/// Guest role bit.
pub const ROLE_GUEST: u32 = 1;
/// User role bit.
pub const ROLE_USER: u32 = 2;
/// Admin role bit.
pub const ROLE_ADMIN: u32 = 4;

// ── Risk bands ────────────────────────────────────────────────────────────────

/// Upper id of the safe band.
pub const RISK_LOW: u32 = 199;
/// Upper id of the write band.
pub const RISK_MED: u32 = 299;
/// Upper id of the network band.
pub const RISK_HIGH: u32 = 399;

// ── Actions ───────────────────────────────────────────────────────────────────

/// The action table. Unknown names deny immediately without a policy
/// evaluation.
const ACTIONS: &[(&str, u32)] = &[
    ("READ_FILE", 101),
    ("LIST_DIR", 102),
    ("WRITE_FILE", 201),
    ("DELETE_FILE", 202),
    ("NET_SCAN", 301),
    ("NET_CONNECT", 302),
    ("SYSTEM_REBOOT", 901),
    ("DELETE_DB", 902),
    ("DEPLOY", 903),
];

/// Resolve an action name to its numeric id.
pub fn action_id(name: &str) -> Option<u32> {
    ACTIONS
        .iter()
        .find(|(action, _)| *action == name)
        .map(|(_, id)| *id)
}

// ── Builtin policies ──────────────────────────────────────────────────────────

fn clauses(pairs: &[(&str, &str)]) -> ClauseMap {
    let mut map = ClauseMap::new();
    for (name, template) in pairs {
        map.insert(*name, template.to_string());
    }
    map
}

/// The policy set the reference manifest ships with.
///
/// These are definitions, not trusted policies; they only become effective
/// after being signed into a manifest and verified at boot.
pub fn builtin_policies() -> BTreeMap<String, PolicyDef> {
    let mut policies = BTreeMap::new();

    // Admin bit, or an action id inside the safe band (100-199).
    policies.insert(
        "StandardAccess".to_string(),
        PolicyDef {
            name: "StandardAccess".to_string(),
            clauses: clauses(&[
                ("is_admin", "{role_mask} 4 \"&\" 4 \"=\""),
                (
                    "is_safe_action",
                    "{action_id} 200 \"<\" {action_id} 99 \">\" \"&\"",
                ),
            ]),
            combination: "OR".to_string(),
        },
    );

    // Epoch 0 is normal operation; any later epoch locks out everyone but
    // admins. The emergency clause is informative: it shows up in the
    // trace but does not grant anything.
    policies.insert(
        "EpochGov".to_string(),
        PolicyDef {
            name: "EpochGov".to_string(),
            clauses: clauses(&[
                ("is_normal_mode", "{epoch} 0 \"=\""),
                ("is_emergency_mode", "{epoch} 1 \"=\""),
                ("is_admin", "{role_mask} 4 \"&\" 4 \"=\""),
            ]),
            combination: "{is_normal_mode} {is_admin} \"|\"".to_string(),
        },
    );

    // Raw truth table for agent state transitions; the gatekeeper combines
    // per transition, so the policy itself is a permissive OR.
    policies.insert(
        "Lifecycle".to_string(),
        PolicyDef {
            name: "Lifecycle".to_string(),
            clauses: clauses(&[
                ("high_quality", "{quality_score} 80 \">\""),
                ("tests_passed", "{test_result} 1 \"=\""),
                ("is_admin", "{role_mask} 4 \"&\" 4 \"=\""),
                ("rate_limit_ok", "{request_id} 1000 \"<\""),
            ]),
            combination: "OR".to_string(),
        },
    );

    // Two-key turn: below 10k one verified signer suffices, at or above 10k
    // both must sign, and nothing moves past the 1M circuit breaker.
    policies.insert(
        "TreasuryGuard_v1".to_string(),
        PolicyDef {
            name: "TreasuryGuard_v1".to_string(),
            clauses: clauses(&[
                ("circuit_breaker", "{amount} 1000000 \"<\""),
                (
                    "auth_logic",
                    "{amount} 10000 \"<\" {alpha_verified} 1 \"=\" \"&\" \
                     {amount} 10000 \">=\" {alpha_verified} 1 \"=\" {beta_verified} 1 \"=\" \"&\" \"&\" \
                     \"|\"",
                ),
            ]),
            combination: "AND".to_string(),
        },
    );

    // Tiered escalation matrix: low severity needs the investigator alone,
    // high severity needs investigator + human, and severity past 95 is the
    // kill switch, denied no matter who signed.
    policies.insert(
        "SOCMatrix".to_string(),
        PolicyDef {
            name: "SOCMatrix".to_string(),
            clauses: clauses(&[
                ("is_low_severity", "{severity} 70 \"<\""),
                ("investigator_signed", "{investigator_sig} 1 \"=\""),
                ("human_signed", "{human_sig} 1 \"=\""),
                ("kill_switch", "{severity} 95 \">\""),
            ]),
            combination: "{is_low_severity} {investigator_signed} \"&\" \
                          {investigator_signed} {human_signed} \"&\" \"|\" \
                          {kill_switch} 0 \"=\" \"&\""
                .to_string(),
        },
    );

    policies
}

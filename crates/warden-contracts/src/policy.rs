//! Policy definition wire format.
//!
//! A `PolicyDef` is the untyped, serializable form a policy takes inside a
//! signed manifest. The warden-policy crate compiles it into a validated
//! `Policy` with parsed templates; nothing trusts a `PolicyDef` until the
//! manifest signature has been checked.

use serde::{Deserialize, Serialize};

use crate::ordered::OrderedMap;

/// Ordered map of clause name to expression template.
///
/// Declaration order is semantic: clauses evaluate top to bottom, and later
/// clauses may reference earlier clauses' results by name.
pub type ClauseMap = OrderedMap<String>;

/// The combination rule's two literal forms.
///
/// Anything other than these two tokens is treated as an expression template
/// over clause names.
pub const COMBINATION_AND: &str = "AND";
/// See [`COMBINATION_AND`].
pub const COMBINATION_OR: &str = "OR";

/// One policy as it appears in a manifest.
///
/// Wire form:
/// ```json
/// {
///   "name": "StandardAccess",
///   "clauses": { "is_admin": "{role_mask} 4 \"&\" 4 \"=\"" },
///   "combination": "OR"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDef {
    /// Policy name, unique within a manifest.
    pub name: String,
    /// Clause templates in declaration (evaluation) order.
    pub clauses: ClauseMap,
    /// `"AND"`, `"OR"`, or an expression template over clause names.
    pub combination: String,
}

//! Compiled policies.
//!
//! A `Policy` is the validated form of a `PolicyDef`: every clause template
//! parsed, the combination rule resolved. Compilation is the only way to
//! construct one, so a policy that reaches the engine is structurally sound.

use warden_contracts::{PolicyDef, WardenError, WardenResult, COMBINATION_AND, COMBINATION_OR};

use crate::template::ExprTemplate;

/// How a policy's clause results merge into one decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Combination {
    /// Logical AND over all clause results.
    And,
    /// Logical OR over all clause results.
    Or,
    /// A second-order expression over clause results, each bound as `1`/`0`
    /// by clause name. This is how tiered, severity-gated, multi-signature
    /// gates are expressed without new code.
    Expr(ExprTemplate),
}

/// One named boolean check within a policy.
#[derive(Debug, Clone)]
pub struct Clause {
    /// Clause name; also the context key its result is written back under.
    pub name: String,
    /// The check itself.
    pub template: ExprTemplate,
}

/// A compiled policy: ordered clauses plus a combination rule.
#[derive(Debug, Clone)]
pub struct Policy {
    name: String,
    clauses: Vec<Clause>,
    combination: Combination,
}

impl Policy {
    /// Compile a wire-format definition.
    ///
    /// Fails with `ConfigError` if any clause template or a template-form
    /// combination rule does not parse. Clause order is preserved from the
    /// definition; it is the evaluation order.
    pub fn compile(def: &PolicyDef) -> WardenResult<Self> {
        let mut clauses = Vec::with_capacity(def.clauses.len());
        for (name, text) in def.clauses.iter() {
            let template = ExprTemplate::parse(text).map_err(|e| WardenError::ConfigError {
                reason: format!("policy '{}', clause '{}': {}", def.name, name, e),
            })?;
            clauses.push(Clause {
                name: name.to_string(),
                template,
            });
        }

        let combination = match def.combination.as_str() {
            COMBINATION_AND => Combination::And,
            COMBINATION_OR => Combination::Or,
            other => Combination::Expr(ExprTemplate::parse(other).map_err(|e| {
                WardenError::ConfigError {
                    reason: format!("policy '{}', combination rule: {}", def.name, e),
                }
            })?),
        };

        Ok(Self {
            name: def.name.clone(),
            clauses,
            combination,
        })
    }

    /// Policy name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clauses in evaluation order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// The combination rule.
    pub fn combination(&self) -> &Combination {
        &self.combination
    }
}

//! The clause-pipeline policy engine.
//!
//! Evaluation is a two-level process:
//!
//! 1. Each clause, in declaration order, is bound against the context and
//!    sent to the oracle. Its boolean result is recorded in the trace AND
//!    written back into the context as `"1"`/`"0"` under the clause's own
//!    name, so later clauses can reference earlier outcomes.
//! 2. The combination rule merges the trace: a plain AND/OR fold, or a
//!    second-order expression over the clause results.
//!
//! Clause failures of any kind (unbound placeholder, dirty context value,
//! oracle fault, dead oracle) are isolated: the clause records `false` and
//! its siblings still evaluate. Nothing on this path raises.

use std::sync::Mutex;

use tracing::{debug, warn};

use warden_contracts::{Context, DecisionProof, Trace};
use warden_evaluator::Evaluator;

use crate::policy::{Clause, Combination, Policy};
use crate::template::ExprTemplate;

/// Evaluates policies through a single serialized oracle connection.
///
/// The mutex is load-bearing: the oracle connection is one stateless
/// request/response stream with no multiplexing, so concurrent callers
/// must not interleave write/read pairs.
pub struct PolicyEngine {
    evaluator: Mutex<Box<dyn Evaluator>>,
}

impl PolicyEngine {
    /// Build an engine around any oracle implementation.
    pub fn new(evaluator: Box<dyn Evaluator>) -> Self {
        Self {
            evaluator: Mutex::new(evaluator),
        }
    }

    /// Evaluate `policy` against `context`, producing a `DecisionProof`.
    ///
    /// Mutates `context` by appending each clause's result; the caller
    /// snapshots it afterwards for the audit ledger.
    pub fn evaluate(&self, policy: &Policy, context: &mut Context) -> DecisionProof {
        let mut trace = Trace::new();

        for clause in policy.clauses() {
            let result = self.evaluate_clause(policy.name(), clause, context);
            trace.record(&clause.name, result);
            context.set(&clause.name, if result { "1" } else { "0" });
        }

        let allowed = match policy.combination() {
            Combination::And => trace.all(),
            Combination::Or => trace.any(),
            Combination::Expr(template) => {
                self.evaluate_combination(policy.name(), template, &trace)
            }
        };

        debug!(
            policy = policy.name(),
            allowed,
            clauses = trace.len(),
            "policy evaluated"
        );

        DecisionProof::new(allowed, trace, policy.name())
    }

    fn evaluate_clause(&self, policy: &str, clause: &Clause, context: &Context) -> bool {
        let tokens = match clause.template.bind(context) {
            Ok(tokens) => tokens,
            Err(reason) => {
                warn!(policy, clause = %clause.name, %reason, "clause bind failed; recording false");
                return false;
            }
        };

        self.run_oracle(&tokens).unwrap_or_else(|reason| {
            warn!(policy, clause = %clause.name, %reason, "clause evaluation failed; recording false");
            false
        })
    }

    /// Bind clause results as `"1"`/`"0"` into the combination expression
    /// and evaluate it through the same oracle.
    fn evaluate_combination(&self, policy: &str, template: &ExprTemplate, trace: &Trace) -> bool {
        let flags: Context = trace
            .iter()
            .map(|(name, result)| (name, if result { "1" } else { "0" }))
            .collect();

        let tokens = match template.bind(&flags) {
            Ok(tokens) => tokens,
            Err(reason) => {
                warn!(policy, %reason, "combination bind failed; denying");
                return false;
            }
        };

        self.run_oracle(&tokens).unwrap_or_else(|reason| {
            warn!(policy, %reason, "combination evaluation failed; denying");
            false
        })
    }

    /// One serialized oracle round trip; `"1"` is the only allow.
    fn run_oracle(&self, tokens: &[String]) -> Result<bool, String> {
        let mut evaluator = self
            .evaluator
            .lock()
            .map_err(|_| "evaluator lock poisoned".to_string())?;

        match evaluator.evaluate(tokens) {
            Ok(line) => Ok(line == "1"),
            Err(e) => Err(e.to_string()),
        }
    }
}

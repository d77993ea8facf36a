//! The evaluator trait: WARDEN's boundary to the expression oracle.
//!
//! Policy logic never depends on process topology. The engine sees only this
//! trait; whether the expression is evaluated in-process by `StackMachine`
//! or by an external oracle over the wire protocol is a construction-time
//! choice.

use warden_contracts::WardenResult;

/// A stack-based boolean/arithmetic expression evaluator.
///
/// `evaluate` takes the expression as pre-stripped tokens and returns the
/// oracle's single response line: the decimal string result. Boolean
/// expressions yield exactly `"1"` or `"0"`.
///
/// Implementations are not required to be thread-safe; callers must
/// serialize access (the policy engine wraps its evaluator in a mutex).
/// Every call is a fresh evaluation; no implementation may cache results.
pub trait Evaluator: Send {
    /// Evaluate one token list and return the result line.
    ///
    /// Errors mean the expression could not be evaluated at all (malformed
    /// input, operand starvation, dead oracle). Callers on the policy path
    /// map any error to boolean false.
    fn evaluate(&mut self, tokens: &[String]) -> WardenResult<String>;
}

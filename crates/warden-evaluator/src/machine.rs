//! In-process implementation of the oracle's token language.
//!
//! The oracle is a stack calculator over 64-bit cells. Floats are
//! "bit-blind": there is one stack, and float operations reinterpret the top
//! cells as IEEE-754 doubles (`0x3FF0000000000000 fp` prints `1.000000`).
//! Integer literals may be written in decimal, hex (`0x…`), or binary
//! (`0b…`), with an optional leading sign; a literal containing `.` parses
//! as a double and is pushed as its bit pattern.
//!
//! Every evaluation starts from an empty stack; expressions are
//! independent, exactly as the wire-protocol client guarantees for the
//! external oracle.
//!
//! Any malformed token, operand starvation, or integer division by zero
//! aborts the evaluation with the oracle's fixed diagnostic line.

use warden_contracts::{WardenError, WardenResult};

use crate::traits::Evaluator;

/// The oracle's fixed diagnostic for any rejected expression.
pub const DIAGNOSTIC: &str = "Error: Invalid operation or insufficient arguments.";

/// How the final stack top is rendered on output.
enum OutputMode {
    Decimal,
    Hex,
    Binary,
    /// `fp` already produced the output line.
    Fixed(String),
}

/// The embedded stack evaluator.
///
/// Stateless between calls; safe to construct once and reuse.
#[derive(Debug, Default)]
pub struct StackMachine;

impl StackMachine {
    /// Create a machine.
    pub fn new() -> Self {
        Self
    }

    fn run(tokens: &[String]) -> WardenResult<String> {
        let mut stack: Vec<i64> = Vec::new();
        let mut mode = OutputMode::Decimal;

        for token in tokens {
            if let Some(value) = parse_literal(token) {
                stack.push(value);
                continue;
            }

            match token.as_str() {
                // Integer arithmetic.
                "+" => int_binop(&mut stack, |a, b| a.checked_add(b))?,
                "-" => int_binop(&mut stack, |a, b| a.checked_sub(b))?,
                "*" => int_binop(&mut stack, |a, b| a.checked_mul(b))?,
                "/" => int_binop(&mut stack, |a, b| a.checked_div(b))?,
                "%" => int_binop(&mut stack, |a, b| a.checked_rem(b))?,
                "^" => int_binop(&mut stack, |a, b| {
                    u32::try_from(b).ok().and_then(|e| a.checked_pow(e))
                })?,

                // Stack manipulation.
                "d" => {
                    let top = *stack.last().ok_or_else(fault)?;
                    stack.push(top);
                }
                "s" => {
                    let len = stack.len();
                    if len < 2 {
                        return Err(fault());
                    }
                    stack.swap(len - 1, len - 2);
                }
                "x" => {
                    stack.pop().ok_or_else(fault)?;
                }

                // Bitwise.
                "&" => int_binop(&mut stack, |a, b| Some(a & b))?,
                "|" => int_binop(&mut stack, |a, b| Some(a | b))?,
                "~" => {
                    let top = stack.pop().ok_or_else(fault)?;
                    stack.push(!top);
                }
                "l" => int_binop(&mut stack, |a, b| {
                    u32::try_from(b).ok().and_then(|s| a.checked_shl(s))
                })?,
                "r" => int_binop(&mut stack, |a, b| {
                    u32::try_from(b).ok().and_then(|s| a.checked_shr(s))
                })?,

                // Comparisons yield 1/0.
                "=" => int_binop(&mut stack, |a, b| Some(i64::from(a == b)))?,
                "<" => int_binop(&mut stack, |a, b| Some(i64::from(a < b)))?,
                ">" => int_binop(&mut stack, |a, b| Some(i64::from(a > b)))?,
                ">=" => int_binop(&mut stack, |a, b| Some(i64::from(a >= b)))?,
                "<=" => int_binop(&mut stack, |a, b| Some(i64::from(a <= b)))?,

                // Math algorithms.
                "g" => int_binop(&mut stack, |a, b| Some(gcd(a, b)))?,
                "!" => {
                    let n = stack.pop().ok_or_else(fault)?;
                    stack.push(factorial(n)?);
                }

                // Output radix for the final integer result.
                "h" => mode = OutputMode::Hex,
                "b" => mode = OutputMode::Binary,

                // Float operations over bit patterns.
                "f+" => float_binop(&mut stack, |a, b| a + b)?,
                "f-" => float_binop(&mut stack, |a, b| a - b)?,
                "f*" => float_binop(&mut stack, |a, b| a * b)?,
                "f/" => float_binop(&mut stack, |a, b| a / b)?,
                "fmin" => float_binop(&mut stack, f64::min)?,
                "fmax" => float_binop(&mut stack, f64::max)?,
                "sqrt" => float_unop(&mut stack, f64::sqrt)?,
                "fabs" => float_unop(&mut stack, f64::abs)?,
                "fneg" => float_unop(&mut stack, |f| -f)?,
                "fp" => {
                    let top = *stack.last().ok_or_else(fault)?;
                    mode = OutputMode::Fixed(format!("{:.6}", f64::from_bits(top as u64)));
                }

                // Bridge casts between the integer and float views.
                "flt" => {
                    let top = stack.pop().ok_or_else(fault)?;
                    stack.push((top as f64).to_bits() as i64);
                }
                "int" => {
                    let top = stack.pop().ok_or_else(fault)?;
                    stack.push(f64::from_bits(top as u64) as i64);
                }

                _ => return Err(fault()),
            }
        }

        match mode {
            OutputMode::Fixed(line) => Ok(line),
            OutputMode::Decimal => {
                let top = stack.last().ok_or_else(fault)?;
                Ok(top.to_string())
            }
            OutputMode::Hex => {
                let top = *stack.last().ok_or_else(fault)?;
                Ok(format_radix(top, "0x", |v| format!("{:X}", v)))
            }
            OutputMode::Binary => {
                let top = *stack.last().ok_or_else(fault)?;
                Ok(format_radix(top, "0b", |v| format!("{:b}", v)))
            }
        }
    }
}

impl Evaluator for StackMachine {
    fn evaluate(&mut self, tokens: &[String]) -> WardenResult<String> {
        Self::run(tokens)
    }
}

fn fault() -> WardenError {
    WardenError::ExpressionFault {
        reason: DIAGNOSTIC.to_string(),
    }
}

/// Pop `b` then `a`, push `op(a, b)`. `None` from the op means the operation
/// was invalid for those operands (division by zero, overflow, bad shift).
fn int_binop(stack: &mut Vec<i64>, op: impl Fn(i64, i64) -> Option<i64>) -> WardenResult<()> {
    let b = stack.pop().ok_or_else(fault)?;
    let a = stack.pop().ok_or_else(fault)?;
    stack.push(op(a, b).ok_or_else(fault)?);
    Ok(())
}

fn float_binop(stack: &mut Vec<i64>, op: impl Fn(f64, f64) -> f64) -> WardenResult<()> {
    let b = stack.pop().ok_or_else(fault)?;
    let a = stack.pop().ok_or_else(fault)?;
    let result = op(f64::from_bits(a as u64), f64::from_bits(b as u64));
    stack.push(result.to_bits() as i64);
    Ok(())
}

fn float_unop(stack: &mut Vec<i64>, op: impl Fn(f64) -> f64) -> WardenResult<()> {
    let a = stack.pop().ok_or_else(fault)?;
    stack.push(op(f64::from_bits(a as u64)).to_bits() as i64);
    Ok(())
}

/// Radix-aware literal parsing: decimal, `0x…`, `0b…`, optional sign.
/// A token containing `.` parses as a double and yields its bit pattern.
fn parse_literal(token: &str) -> Option<i64> {
    if token.contains('.') {
        return token.parse::<f64>().ok().map(|f| f.to_bits() as i64);
    }

    let (negative, rest) = match token.strip_prefix('-') {
        Some(rest) if !rest.is_empty() => (true, rest),
        _ => (false, token),
    };

    let magnitude = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X"))
    {
        // Parse as u64 so full-width bit patterns like 0x3FF0000000000000
        // round-trip; reinterpret as i64.
        u64::from_str_radix(hex, 16).ok()? as i64
    } else if let Some(bin) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        u64::from_str_radix(bin, 2).ok()? as i64
    } else {
        rest.parse::<i64>().ok()?
    };

    Some(if negative {
        magnitude.checked_neg()?
    } else {
        magnitude
    })
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a as i64
}

fn factorial(n: i64) -> WardenResult<i64> {
    // 20! is the largest factorial representable in i64.
    if !(0..=20).contains(&n) {
        return Err(fault());
    }
    Ok((1..=n).product())
}

fn format_radix(value: i64, prefix: &str, digits: impl Fn(u64) -> String) -> String {
    if value < 0 {
        format!("-{}{}", prefix, digits(value.unsigned_abs()))
    } else {
        format!("{}{}", prefix, digits(value as u64))
    }
}

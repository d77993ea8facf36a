//! Validated expression templates.
//!
//! A clause template is a whitespace-separated token sequence where each
//! token is either a literal oracle token (one quote layer stripped at parse
//! time) or a named placeholder written `{name}`. Placeholders are bound
//! explicitly at evaluation time (there is no string interpolation), and a
//! bound value must itself be one clean token. A context value containing
//! whitespace or quote characters can therefore never smuggle extra tokens
//! into the expression; binding fails and the clause fails closed.

use warden_contracts::{Context, WardenError, WardenResult};
use warden_evaluator::wire::strip_quotes;

/// One parsed template token.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplateToken {
    /// Sent to the oracle verbatim.
    Literal(String),
    /// Replaced by the named context value at bind time.
    Placeholder(String),
}

/// A parsed, structurally-validated expression template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprTemplate {
    tokens: Vec<TemplateToken>,
}

impl ExprTemplate {
    /// Parse a template string.
    ///
    /// Fails with `ConfigError` on an empty template, a malformed
    /// placeholder name, or a `{`/`}` appearing anywhere except as a whole
    /// `{name}` token; policies with broken templates are rejected at
    /// construction, not discovered at request time.
    pub fn parse(text: &str) -> WardenResult<Self> {
        let mut tokens = Vec::new();

        for raw in text.split_whitespace() {
            let stripped = strip_quotes(raw);

            if let Some(name) = stripped
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                if name.is_empty()
                    || !name
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Err(WardenError::ConfigError {
                        reason: format!("invalid placeholder '{{{}}}' in template", name),
                    });
                }
                tokens.push(TemplateToken::Placeholder(name.to_string()));
            } else if stripped.contains('{') || stripped.contains('}') {
                return Err(WardenError::ConfigError {
                    reason: format!(
                        "placeholder must be a whole token, found '{}'",
                        stripped
                    ),
                });
            } else {
                tokens.push(TemplateToken::Literal(stripped.to_string()));
            }
        }

        if tokens.is_empty() {
            return Err(WardenError::ConfigError {
                reason: "empty expression template".to_string(),
            });
        }

        Ok(Self { tokens })
    }

    /// Bind every placeholder from `context` and return the final token
    /// list, ready for the oracle.
    ///
    /// The error is a bare reason string; the caller attributes it to the
    /// clause being evaluated.
    pub fn bind(&self, context: &Context) -> Result<Vec<String>, String> {
        self.tokens
            .iter()
            .map(|token| match token {
                TemplateToken::Literal(lit) => Ok(lit.clone()),
                TemplateToken::Placeholder(name) => {
                    let value = context
                        .get(name)
                        .ok_or_else(|| format!("unbound placeholder '{}'", name))?;
                    validate_bound_value(name, value)?;
                    Ok(value.to_string())
                }
            })
            .collect()
    }

    /// Placeholder names referenced by this template, in order of first use.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            TemplateToken::Placeholder(name) => Some(name.as_str()),
            TemplateToken::Literal(_) => None,
        })
    }
}

/// A bound value must be exactly one clean oracle token.
fn validate_bound_value(name: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("context value for '{}' is empty", name));
    }
    if value.chars().any(char::is_whitespace) || value.contains('"') || value.contains('\'') {
        return Err(format!(
            "context value for '{}' contains whitespace or quote characters",
            name
        ));
    }
    Ok(())
}

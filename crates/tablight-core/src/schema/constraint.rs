use crate::{Result, Value};

use std::fmt;
use std::rc::Rc;

/// Importance of a finding, ordered from least to most severe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

/// A structural constraint attached to a field or column.
///
/// Violations are not errors in the `Result` sense. `check` produces the
/// finding message that flows into the highlight result model.
#[derive(Clone)]
pub struct Constraint {
    kind: ConstraintKind,
    severity: Severity,
    message: Option<String>,
}

#[derive(Clone)]
enum ConstraintKind {
    /// The value must be non-blank.
    Required,
    /// The textual form must not exceed the given character count.
    MaxTextLength(usize),
    /// The textual form must match the expression.
    RegExp(regex::Regex),
    /// An arbitrary predicate; `false` means the value is rejected.
    Custom(Rc<dyn Fn(&Value) -> bool>),
}

impl Constraint {
    pub fn required() -> Self {
        Self::new(ConstraintKind::Required)
    }

    pub fn max_text_length(max: usize) -> Self {
        Self::new(ConstraintKind::MaxTextLength(max))
    }

    pub fn reg_exp(pattern: &str) -> Result<Self> {
        let re = regex::Regex::new(pattern)?;
        Ok(Self::new(ConstraintKind::RegExp(re)))
    }

    pub fn custom(check: impl Fn(&Value) -> bool + 'static) -> Self {
        Self::new(ConstraintKind::Custom(Rc::new(check)))
    }

    fn new(kind: ConstraintKind) -> Self {
        Constraint {
            kind,
            severity: Severity::Error,
            message: None,
        }
    }

    /// Overrides the severity of findings produced by this constraint.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Overrides the default finding message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// A small integer identifying the constraint kind, unique per kind.
    /// Used as the finding id so that re-checks replace prior findings of
    /// the same kind instead of stacking.
    pub fn kind_code(&self) -> u32 {
        match self.kind {
            ConstraintKind::Required => 1,
            ConstraintKind::MaxTextLength(_) => 2,
            ConstraintKind::RegExp(_) => 3,
            ConstraintKind::Custom(_) => 4,
        }
    }

    /// Checks `value`, returning the finding message when violated and
    /// `None` when the value passes.
    pub fn check(&self, value: &Value, subject: &str) -> Option<String> {
        let violated = match &self.kind {
            ConstraintKind::Required => value.is_blank(),
            ConstraintKind::MaxTextLength(max) => value.text_len() > *max,
            ConstraintKind::RegExp(re) => !re.is_match(&value.to_display()),
            ConstraintKind::Custom(check) => !check(value),
        };
        if !violated {
            return None;
        }
        if let Some(msg) = &self.message {
            return Some(msg.clone());
        }
        Some(match &self.kind {
            ConstraintKind::Required => format!("\u{201c}{}\u{201d} is not defined", subject),
            ConstraintKind::MaxTextLength(max) => {
                format!("\u{201c}{}\u{201d} exceeds maximum length {}", subject, max)
            }
            ConstraintKind::RegExp(_) | ConstraintKind::Custom(_) => {
                format!("\u{201c}{}\u{201d} has an incorrect value", subject)
            }
        })
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            ConstraintKind::Required => "Required".to_string(),
            ConstraintKind::MaxTextLength(max) => format!("MaxTextLength({})", max),
            ConstraintKind::RegExp(re) => format!("RegExp({:?})", re.as_str()),
            ConstraintKind::Custom(_) => "Custom".to_string(),
        };
        fmt.debug_struct("Constraint")
            .field("kind", &kind)
            .field("severity", &self.severity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank() {
        let c = Constraint::required();
        assert!(c.check(&Value::Null, "code").is_some());
        assert!(c.check(&Value::from("  "), "code").is_some());
        assert!(c.check(&Value::from("x"), "code").is_none());
    }

    #[test]
    fn max_text_length() {
        let c = Constraint::max_text_length(3);
        assert!(c.check(&Value::from("abc"), "code").is_none());
        assert!(c.check(&Value::from("abcd"), "code").is_some());
    }

    #[test]
    fn reg_exp() {
        let c = Constraint::reg_exp("^[A-Z]+$").unwrap();
        assert!(c.check(&Value::from("ABC"), "code").is_none());
        assert!(c.check(&Value::from("abc"), "code").is_some());
    }

    #[test]
    fn custom_message_wins() {
        let c = Constraint::required().with_message("fill in the code");
        assert_eq!(
            c.check(&Value::Null, "code").as_deref(),
            Some("fill in the code")
        );
    }
}

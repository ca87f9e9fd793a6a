mod facet;
pub use facet::Facet;

/// A typed cell or field value.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Null value
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// Signed 64-bit integer
    I64(i64),

    /// 64-bit float
    F64(f64),

    /// String value
    String(String),
}

impl Value {
    /// Returns a `Value` representing null
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True when the value carries no user-entered content: null or a
    /// blank/whitespace-only string. Used for base-key gating.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The textual form of this value used when composing index key strings.
    ///
    /// Strings are trimmed and optionally lowercased; `false` folds to the
    /// empty component, same as null or an empty string.
    pub fn fold_key(&self, case_insensitive: bool) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(false) => String::new(),
            Self::Bool(true) => "true".into(),
            Self::I64(v) => v.to_string(),
            Self::F64(v) => v.to_string(),
            Self::String(s) => {
                let trimmed = s.trim();
                if case_insensitive {
                    trimmed.to_lowercase()
                } else {
                    trimmed.to_string()
                }
            }
        }
    }

    /// Human-readable form for finding messages.
    pub fn to_display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(v) => v.to_string(),
            Self::I64(v) => v.to_string(),
            Self::F64(v) => v.to_string(),
            Self::String(s) => s.clone(),
        }
    }

    /// Character count of the textual form, for length constraints.
    pub fn text_len(&self) -> usize {
        self.to_display().chars().count()
    }
}

impl From<bool> for Value {
    fn from(src: bool) -> Self {
        Self::Bool(src)
    }
}

impl From<i64> for Value {
    fn from(src: i64) -> Self {
        Self::I64(src)
    }
}

impl From<f64> for Value {
    fn from(src: f64) -> Self {
        Self::F64(src)
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Self::String(src.to_string())
    }
}

impl From<String> for Value {
    fn from(src: String) -> Self {
        Self::String(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_key_trims_and_lowercases() {
        let v = Value::from("  Alpha  ");
        assert_eq!(v.fold_key(false), "Alpha");
        assert_eq!(v.fold_key(true), "alpha");
    }

    #[test]
    fn fold_key_false_is_empty() {
        assert_eq!(Value::from(false).fold_key(false), "");
        assert_eq!(Value::from(true).fold_key(false), "true");
        assert_eq!(Value::Null.fold_key(false), "");
    }

    #[test]
    fn blankness() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("   ").is_blank());
        assert!(!Value::from("x").is_blank());
        assert!(!Value::from(0_i64).is_blank());
        assert!(!Value::from(false).is_blank());
    }
}

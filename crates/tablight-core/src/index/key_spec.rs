use crate::{Error, Facet, Result, Value};

/// Separator between key components. A character that cannot occur in
/// trimmed single-line cell text, so composed keys never collide with each
/// other through concatenation.
pub const KEY_SEPARATOR: char = '\u{2029}';

/// One column's contribution to a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumn {
    /// Zero-based column position in the source.
    pub column: usize,

    /// Fold the component to lowercase before composing.
    pub case_insensitive: bool,

    /// Which facet of the cell to read.
    pub facet: Facet,
}

/// Describes how row keys are composed: which columns participate, in what
/// order, and how each component is folded.
///
/// Two specs with equal [`signature`]s compose identical keys for identical
/// rows, which is what lets [`IndexCache`] share indices.
///
/// [`signature`]: KeySpec::signature
/// [`IndexCache`]: crate::index::IndexCache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    columns: Vec<KeyColumn>,
}

impl KeySpec {
    /// A spec reading the display facet of `columns`, case sensitive.
    pub fn simple(columns: &[usize]) -> Self {
        KeySpec {
            columns: columns
                .iter()
                .map(|&column| KeyColumn {
                    column,
                    case_insensitive: false,
                    facet: Facet::DISPLAY,
                })
                .collect(),
        }
    }

    /// A spec with per-column folding flags and facets. The three lists
    /// must have equal length.
    pub fn new(
        columns: &[usize],
        case_insensitive: &[bool],
        facets: &[Facet],
    ) -> Result<Self> {
        if columns.len() != case_insensitive.len() || columns.len() != facets.len() {
            return Err(Error::arity_mismatch(
                columns.len(),
                case_insensitive.len().min(facets.len()),
            ));
        }
        Ok(KeySpec {
            columns: columns
                .iter()
                .zip(case_insensitive)
                .zip(facets)
                .map(|((&column, &case_insensitive), &facet)| KeyColumn {
                    column,
                    case_insensitive,
                    facet,
                })
                .collect(),
        })
    }

    pub fn from_columns(columns: Vec<KeyColumn>) -> Self {
        KeySpec { columns }
    }

    pub fn columns(&self) -> &[KeyColumn] {
        &self.columns
    }

    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    /// Column positions, in spec order.
    pub fn positions(&self) -> Vec<usize> {
        self.columns.iter().map(|c| c.column).collect()
    }

    /// The largest column position the spec reads, or `None` when empty.
    pub fn max_position(&self) -> Option<usize> {
        self.columns.iter().map(|c| c.column).max()
    }

    /// A string uniquely identifying this spec. Each column contributes its
    /// position (suffixed with `@` when case-insensitive) and its facet
    /// number, all joined with [`KEY_SEPARATOR`].
    pub fn signature(&self) -> String {
        let mut parts = Vec::with_capacity(self.columns.len() * 2);
        for c in &self.columns {
            if c.case_insensitive {
                parts.push(format!("{}@", c.column));
            } else {
                parts.push(c.column.to_string());
            }
            parts.push(c.facet.0.to_string());
        }
        join(&parts)
    }

    /// Composes the key string for one tuple of values, in spec order.
    /// Errors when the tuple's arity does not match the spec's.
    pub fn compose_key(&self, values: &[Value]) -> Result<String> {
        if values.len() != self.columns.len() {
            return Err(Error::arity_mismatch(self.columns.len(), values.len()));
        }
        let parts: Vec<String> = self
            .columns
            .iter()
            .zip(values)
            .map(|(c, v)| v.fold_key(c.case_insensitive))
            .collect();
        Ok(join(&parts))
    }
}

fn join(parts: &[String]) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(KEY_SEPARATOR);
        }
        out.push_str(part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_encodes_folding_and_facets() {
        let spec = KeySpec::new(&[2, 0], &[true, false], &[Facet::DISPLAY, Facet::RAW]).unwrap();
        let sig = spec.signature();
        let parts: Vec<&str> = sig.split(KEY_SEPARATOR).collect();
        assert_eq!(parts, vec!["2@", "0", "0", "1"]);
    }

    #[test]
    fn compose_key_checks_arity() {
        let spec = KeySpec::simple(&[0, 1, 2]);
        let err = spec.compose_key(&[Value::from("x")]).unwrap_err();
        assert!(err.is_arity_mismatch());
        assert_eq!(err.to_string(), "expected 3 key values, got 1");
    }

    #[test]
    fn compose_key_folds_components() {
        let spec = KeySpec::new(&[0, 1], &[true, false], &[Facet::DISPLAY, Facet::DISPLAY])
            .unwrap();
        let key = spec
            .compose_key(&[Value::from(" Abc "), Value::from(false)])
            .unwrap();
        assert_eq!(key, format!("abc{}", KEY_SEPARATOR));
    }

    #[test]
    fn mismatched_lists_are_rejected() {
        let err = KeySpec::new(&[0, 1], &[true], &[Facet::DISPLAY]).unwrap_err();
        assert!(err.is_arity_mismatch());
    }
}

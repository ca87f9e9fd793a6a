mod adhoc;
mod arity_mismatch;
mod duplicate_key;
mod invariant;
mod not_found;
mod reentrant_check;

use adhoc::AdhocError;
use arity_mismatch::ArityMismatchError;
use duplicate_key::DuplicateKeyError;
use invariant::InvariantError;
use not_found::NotFoundError;
use reentrant_check::ReentrantCheckError;

use std::sync::Arc;

/// Return early with a formatted [`Error`].
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Create a formatted [`Error`] value.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur in Tablight.
///
/// Every variant represents a configuration or usage mistake on the caller's
/// side; data-content problems (a failed constraint, a duplicated key) are
/// never errors and flow through the highlight result model instead.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    ArityMismatch(ArityMismatchError),
    DuplicateKey(DuplicateKeyError),
    Invariant(InvariantError),
    NotFound(NotFoundError),
    ReentrantCheck(ReentrantCheckError),
    Unknown,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context
    /// is shown first, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: Error) -> Error {
        self.context_impl(consequent)
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let mut err = consequent;
        if err.inner.is_none() {
            err = Error::from(ErrorKind::Unknown);
        }
        let inner = err.inner.as_mut().unwrap();
        assert!(
            inner.cause.is_none(),
            "consequent error must not already have a cause"
        );
        Arc::get_mut(inner).unwrap().cause = Some(self);
        err
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }

    #[doc(hidden)]
    pub fn from_args(args: core::fmt::Arguments<'_>) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::new(args)))
    }

    /// A value-count vs. key-column-count mismatch on an index query.
    pub fn arity_mismatch(expected: usize, actual: usize) -> Error {
        Error::from(ErrorKind::ArityMismatch(ArityMismatchError {
            expected,
            actual,
        }))
    }

    /// A query against an unregistered property, dataset or index entry.
    pub fn not_found(what: impl Into<String>) -> Error {
        Error::from(ErrorKind::NotFound(NotFoundError { what: what.into() }))
    }

    /// Re-registration of an already-registered key.
    pub fn duplicate_key(what: impl Into<String>) -> Error {
        Error::from(ErrorKind::DuplicateKey(DuplicateKeyError {
            what: what.into(),
        }))
    }

    /// The dirty set was mutated during its own batch execution.
    pub fn reentrant_check(count: usize) -> Error {
        Error::from(ErrorKind::ReentrantCheck(ReentrantCheckError { count }))
    }

    /// A broken usage invariant (caller-level contract violation).
    pub fn invariant(what: impl Into<String>) -> Error {
        Error::from(ErrorKind::Invariant(InvariantError { what: what.into() }))
    }

    pub fn is_arity_mismatch(&self) -> bool {
        matches!(self.kind(), ErrorKind::ArityMismatch(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound(_))
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self.kind(), ErrorKind::DuplicateKey(_))
    }

    pub fn is_reentrant_check(&self) -> bool {
        matches!(self.kind(), ErrorKind::ReentrantCheck(_))
    }

    pub fn is_invariant(&self) -> bool {
        matches!(self.kind(), ErrorKind::Invariant(_))
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            ArityMismatch(err) => core::fmt::Display::fmt(err, f),
            DuplicateKey(err) => core::fmt::Display::fmt(err, f),
            Invariant(err) => core::fmt::Display::fmt(err, f),
            NotFound(err) => core::fmt::Display::fmt(err, f),
            ReentrantCheck(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown tablight error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

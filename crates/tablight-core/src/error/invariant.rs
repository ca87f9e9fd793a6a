/// Error for a broken usage invariant, e.g. querying by value on an index
/// with a customization hook installed, or an unbalanced start/unblock call.
#[derive(Debug)]
pub(super) struct InvariantError {
    pub(super) what: String,
}

impl std::error::Error for InvariantError {}

impl core::fmt::Display for InvariantError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invariant violated: {}", self.what)
    }
}

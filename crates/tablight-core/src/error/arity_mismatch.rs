/// Error when the number of query values does not match the key-column count
/// of the index being queried.
#[derive(Debug)]
pub(super) struct ArityMismatchError {
    pub(super) expected: usize,
    pub(super) actual: usize,
}

impl std::error::Error for ArityMismatchError {}

impl core::fmt::Display for ArityMismatchError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "expected {} key values, got {}",
            self.expected, self.actual
        )
    }
}

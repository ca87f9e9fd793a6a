/// Error when a lookup targets an unregistered property, dataset or entry.
#[derive(Debug)]
pub(super) struct NotFoundError {
    pub(super) what: String,
}

impl std::error::Error for NotFoundError {}

impl core::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "not found: {}", self.what)
    }
}

/// Error when re-registering a key that is already present.
#[derive(Debug)]
pub(super) struct DuplicateKeyError {
    pub(super) what: String,
}

impl std::error::Error for DuplicateKeyError {}

impl core::fmt::Display for DuplicateKeyError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "already registered: {}", self.what)
    }
}

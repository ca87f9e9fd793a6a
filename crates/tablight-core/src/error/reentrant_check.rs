/// Error when new check requests are registered while the batch that should
/// have drained them is still executing. Structural checks must be pure with
/// respect to the engine's own dirty set; looping here would re-trigger
/// forever.
#[derive(Debug)]
pub(super) struct ReentrantCheckError {
    pub(super) count: usize,
}

impl std::error::Error for ReentrantCheckError {}

impl core::fmt::Display for ReentrantCheckError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} check requests registered during batch execution",
            self.count
        )
    }
}

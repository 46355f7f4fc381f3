//! Error conversion helpers for source file reads

use std::io;

use crate::application::LoadError;
use crate::domain::SourceEntry;

/// Extension trait for converting `io::Result` into a per-source `LoadError`.
pub trait IoResultExt<T> {
    /// Attach the source entry's URI to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// let content = fs.read_to_string(&entry.path).with_source_context(&entry)?;
    /// ```
    fn with_source_context(self, source: &SourceEntry) -> Result<T, LoadError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_source_context(self, source: &SourceEntry) -> Result<T, LoadError> {
        self.map_err(|e| LoadError::SourceRead {
            uri: source.uri(),
            source: e,
        })
    }
}

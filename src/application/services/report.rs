use crate::application::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::application::LoadError;

/// Outcome of a load: every diagnostic plus the per-item checked failures.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub diagnostics: Diagnostics,
    pub failures: Vec<LoadError>,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a per-item failure and its diagnostic.
    pub fn fail(&mut self, error: LoadError, location: Option<Location>) {
        let kind = match &error {
            LoadError::SourceRead { .. } => DiagnosticKind::SourceRead,
            LoadError::SourceDate { .. } => DiagnosticKind::SourceDate,
        };
        let message = match &error {
            LoadError::SourceRead { source, .. } => format!("{error}: {source}"),
            LoadError::SourceDate { .. } => error.to_string(),
        };
        self.diagnostics.error(kind, message, location);
        self.failures.push(error);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

//! Buffered overlay directives (`.COPY`, `.MOD`, `.FORGET`)

use std::sync::Arc;

use crate::domain::entities::SourceEntry;
use crate::domain::provenance::SourceMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Copy,
    Mod,
    Forget,
}

/// One directive line plus everything needed to replay it after scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayDirective {
    pub kind: DirectiveKind,
    /// Raw line, unmodified from the source file
    pub line: String,
    pub source: Arc<SourceEntry>,
    /// 1-based
    pub line_number: usize,
    /// SOURCE metadata active when the line was read
    pub source_map: Option<SourceMap>,
}

impl OverlayDirective {
    pub fn new(
        kind: DirectiveKind,
        line: &str,
        source: Arc<SourceEntry>,
        line_number: usize,
        source_map: Option<SourceMap>,
    ) -> Self {
        Self {
            kind,
            line: line.to_string(),
            source,
            line_number,
            source_map,
        }
    }
}

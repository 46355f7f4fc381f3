//! Buffered load diagnostics
//!
//! Every problem found while loading is collected here and returned to the
//! caller instead of being broadcast to listeners. Each push is mirrored to
//! `tracing` so a configured subscriber sees the same stream live.

use std::fmt;

use tracing::{error, warn};

use crate::domain::SourceEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Error taxonomy of the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Token without a colon or starting with one
    MalformedToken,
    /// No parser for the tag, neither kind-specific nor generic
    UnknownTag,
    /// A registered parser rejected its value
    TagParseFailure,
    DeprecatedTag,
    /// Directive name field that cannot be split into its parts
    MalformedDirective,
    /// `.COPY` or `.MOD` target not in the graph
    MissingBaseObject,
    DuplicateObject,
    SourceDate,
    SourceRead,
    UnresolvedReference,
}

/// Where a diagnostic originated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub uri: String,
    /// 1-based; `None` for file- or object-level problems
    pub line: Option<usize>,
}

impl Location {
    pub fn line(source: &SourceEntry, line: usize) -> Self {
        Self {
            uri: source.uri(),
            line: Some(line),
        }
    }

    pub fn file(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            line: None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.uri, line),
            None => f.write_str(&self.uri),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: Option<Location>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{}: {}", loc, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        let location = diagnostic
            .location
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        match diagnostic.severity {
            Severity::Warning => warn!(kind = ?diagnostic.kind, %location, "{}", diagnostic.message),
            Severity::Error => error!(kind = ?diagnostic.kind, %location, "{}", diagnostic.message),
        }
        self.items.push(diagnostic);
    }

    pub fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>, location: Option<Location>) {
        self.push(Diagnostic {
            severity: Severity::Error,
            kind,
            message: message.into(),
            location,
        });
    }

    pub fn warn(&mut self, kind: DiagnosticKind, message: impl Into<String>, location: Option<Location>) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            location,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.items.iter().filter(|d| d.kind == kind).collect()
    }

    pub fn error_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

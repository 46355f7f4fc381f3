//! Domain layer: entities, line format and the object graph
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod directive;
pub mod entities;
pub mod error;
pub mod graph;
pub mod line;
pub mod provenance;

pub use directive::{DirectiveKind, OverlayDirective};
pub use entities::*;
pub use error::DomainError;
pub use graph::{ObjectGraph, ObjectId};
pub use provenance::{parse_source_date, Provenance, SourceMap};

/// Expand environment variables in a path string.
///
/// Supports `$VAR`, `${VAR}` and `~`; unexpandable input is returned as is.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

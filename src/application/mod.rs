//! Application layer: loading services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod diagnostics;
pub mod error;
pub mod error_ext;
pub mod hooks;
pub mod registry;
pub mod services;
pub mod tokens;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location, Severity};
pub use error::{ApplicationError, ApplicationResult, LoadError};
pub use error_ext::IoResultExt;
pub use hooks::{DefaultHooks, GraphReferenceResolver, KindHooks, ReferenceResolver};
pub use registry::{Dispatch, ParseContext, TagError, TagParser, TagResult, TokenRegistry};
pub use tokens::standard_registry;

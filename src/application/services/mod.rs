//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem) but are themselves
//! concrete structs, not traits.

mod builder;
mod collector;
mod conflict;
mod load;
mod loader;
mod merge;
mod report;

pub use builder::ObjectBuilder;
pub use collector::{CollectedDirectives, DirectiveCollector, ModGroup};
pub use conflict::{resolve as resolve_conflict, OverridePolicy, Resolution};
pub use load::{LoadOptions, LoadService};
pub use loader::ObjectFileLoader;
pub use merge::MergeEngine;
pub use report::LoadReport;

//! LST object loader
//!
//! Reads tab-separated LST data files, builds kind-typed domain objects into
//! an [`domain::ObjectGraph`], applies `.COPY`/`.MOD`/`.FORGET` overlays and
//! resolves cross-object references once everything is loaded.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

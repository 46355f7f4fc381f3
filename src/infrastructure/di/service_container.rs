//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::LoadService;
use crate::application::{standard_registry, TokenRegistry};
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraResult;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Tag parsers, frozen after construction
    pub registry: Arc<TokenRegistry>,

    pub load_service: LoadService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> InfraResult<Self> {
        let registry = Arc::new(standard_registry(settings.warn_deprecated)?);
        let options = settings.load_options()?;
        let load_service = LoadService::new(Arc::clone(&fs), Arc::clone(&registry), options);

        Ok(Self {
            settings: Arc::new(settings),
            fs,
            registry,
            load_service,
        })
    }
}

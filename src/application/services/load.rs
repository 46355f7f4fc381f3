//! Load service: the public entry point of a load cycle
//!
//! Groups the caller's ordered source list by kind, runs one loader per kind
//! and finishes with the deferred reference passes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::hooks::{DefaultHooks, GraphReferenceResolver, KindHooks, ReferenceResolver};
use crate::application::registry::TokenRegistry;
use crate::application::services::conflict::OverridePolicy;
use crate::application::services::loader::ObjectFileLoader;
use crate::application::services::report::LoadReport;
use crate::domain::{ObjectGraph, ObjectKind, PlannedSource, SourceEntry};
use crate::infrastructure::traits::FileSystem;

/// Caller-facing knobs of a load cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub allow_override: bool,
    /// Kinds whose same-key definitions are all kept
    pub retain_duplicates: HashSet<ObjectKind>,
}

impl LoadOptions {
    pub fn policy_for(&self, kind: ObjectKind) -> OverridePolicy {
        OverridePolicy {
            allow_override: self.allow_override,
            retain_duplicates: self.retain_duplicates.contains(&kind),
        }
    }
}

pub struct LoadService {
    fs: Arc<dyn FileSystem>,
    registry: Arc<TokenRegistry>,
    options: LoadOptions,
    hooks: HashMap<ObjectKind, Arc<dyn KindHooks>>,
    resolver: Arc<dyn ReferenceResolver>,
}

impl LoadService {
    pub fn new(fs: Arc<dyn FileSystem>, registry: Arc<TokenRegistry>, options: LoadOptions) -> Self {
        Self {
            fs,
            registry,
            options,
            hooks: HashMap::new(),
            resolver: Arc::new(GraphReferenceResolver),
        }
    }

    pub fn with_hooks(mut self, kind: ObjectKind, hooks: Arc<dyn KindHooks>) -> Self {
        self.hooks.insert(kind, hooks);
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ReferenceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// A loader for one kind, wired with this service's collaborators.
    pub fn loader(&self, kind: ObjectKind) -> ObjectFileLoader {
        let hooks = self
            .hooks
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::new(DefaultHooks));
        ObjectFileLoader::new(
            kind,
            Arc::clone(&self.fs),
            Arc::clone(&self.registry),
            hooks,
            self.options.policy_for(kind),
        )
    }

    /// Load every planned source into `graph`.
    ///
    /// Kinds are processed in the order they first appear; files of one kind
    /// keep their relative order. Per-item problems end up in the report and
    /// never abort the cycle.
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub fn load(&self, graph: &mut ObjectGraph, sources: &[PlannedSource]) -> LoadReport {
        let mut report = LoadReport::new();

        let mut order: Vec<ObjectKind> = Vec::new();
        let mut by_kind: HashMap<ObjectKind, Vec<SourceEntry>> = HashMap::new();
        for planned in sources {
            by_kind
                .entry(planned.kind)
                .or_insert_with(|| {
                    order.push(planned.kind);
                    Vec::new()
                })
                .push(planned.entry.clone());
        }

        for kind in order {
            let entries = by_kind.remove(&kind).unwrap_or_default();
            self.loader(kind).load_files(graph, &entries, &mut report);
        }

        let constructed = self.resolver.construct_deferred(graph, &mut report.diagnostics);
        let unresolved = self.resolver.resolve(graph, &mut report.diagnostics);

        info!(
            objects = graph.len(),
            constructed,
            unresolved,
            errors = report.diagnostics.error_count(),
            "load complete"
        );
        report
    }
}

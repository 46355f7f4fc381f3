//! Per-kind LST file loader
//!
//! Scans every source file of one kind in order, builds plain definitions
//! immediately and defers overlay directives to the merge passes.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::diagnostics::Location;
use crate::application::hooks::KindHooks;
use crate::application::registry::TokenRegistry;
use crate::application::services::builder::ObjectBuilder;
use crate::application::services::collector::DirectiveCollector;
use crate::application::services::conflict::OverridePolicy;
use crate::application::services::merge::MergeEngine;
use crate::application::services::report::LoadReport;
use crate::application::IoResultExt;
use crate::domain::line::{content_lines, LineKind};
use crate::domain::{ObjectGraph, ObjectKind, SourceEntry, SourceMap};
use crate::infrastructure::traits::FileSystem;

pub struct ObjectFileLoader {
    fs: Arc<dyn FileSystem>,
    builder: ObjectBuilder,
    collector: DirectiveCollector,
}

impl ObjectFileLoader {
    pub fn new(
        kind: ObjectKind,
        fs: Arc<dyn FileSystem>,
        registry: Arc<TokenRegistry>,
        hooks: Arc<dyn KindHooks>,
        policy: OverridePolicy,
    ) -> Self {
        Self {
            fs,
            builder: ObjectBuilder::new(kind, registry, hooks, policy),
            collector: DirectiveCollector::new(),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.builder.kind()
    }

    /// Keys dropped by include/exclude filters during the last load.
    pub fn excluded(&self) -> &HashSet<String> {
        self.builder.excluded()
    }

    /// Load one ordered batch of files, then apply the buffered directives.
    ///
    /// A repeated entry is loaded once. An unreadable file is reported and
    /// skipped; the rest of the batch still loads.
    #[instrument(level = "debug", skip_all, fields(kind = %self.builder.kind(), files = entries.len()))]
    pub fn load_files(&mut self, graph: &mut ObjectGraph, entries: &[SourceEntry], report: &mut LoadReport) {
        self.builder.begin_cycle();

        let mut seen: HashSet<&SourceEntry> = HashSet::new();
        for entry in entries {
            if !seen.insert(entry) {
                debug!(uri = %entry.uri(), "duplicate source entry, skipping");
                continue;
            }
            self.load_file(graph, Arc::new(entry.clone()), report);
        }

        let directives = self.collector.take();
        debug!(objects = graph.count(self.builder.kind()), "scan done");
        MergeEngine::new(&mut self.builder).run(graph, report, directives);
    }

    fn load_file(&mut self, graph: &mut ObjectGraph, source: Arc<SourceEntry>, report: &mut LoadReport) {
        self.builder.begin_file();

        let content = match self.fs.read_to_string(&source.path).with_source_context(&source) {
            Ok(content) => content,
            Err(e) => {
                warn!(uri = %source.uri(), "source unreadable");
                report.fail(e, Some(Location::file(source.uri())));
                return;
            }
        };
        debug!(uri = %source.uri(), campaign = %source.campaign.name, "loading");

        let mut source_map: Option<SourceMap> = None;
        for (line_number, line) in content_lines(&content) {
            match self.collector.offer(line, line_number, &source, source_map.as_ref()) {
                None => {}
                Some(LineKind::Source) => source_map = Some(SourceMap::parse_line(line)),
                Some(_) => {
                    if let Err(e) =
                        self.builder
                            .build_or_continue(graph, report, &source, line_number, line, source_map.as_ref())
                    {
                        report.fail(e, Some(Location::line(&source, line_number)));
                    }
                }
            }
        }
    }
}

//! Merge engine: applies buffered overlay directives
//!
//! Passes run in a fixed order once all files of a kind were scanned:
//! COPY, then MOD, then FORGET. Within a pass directives keep file order.

use tracing::{debug, instrument};

use crate::application::diagnostics::{DiagnosticKind, Location};
use crate::application::services::builder::ObjectBuilder;
use crate::application::services::collector::{CollectedDirectives, ModGroup};
use crate::application::services::report::LoadReport;
use crate::application::LoadError;
use crate::domain::line::{classify, parse_token, tag_section, tokenize_tags, LineKind};
use crate::domain::{ObjectGraph, OverlayDirective};

pub struct MergeEngine<'b> {
    builder: &'b mut ObjectBuilder,
}

impl<'b> MergeEngine<'b> {
    pub fn new(builder: &'b mut ObjectBuilder) -> Self {
        Self { builder }
    }

    #[instrument(level = "debug", skip_all, fields(kind = %self.builder.kind()))]
    pub fn run(&mut self, graph: &mut ObjectGraph, report: &mut LoadReport, directives: CollectedDirectives) {
        debug!(
            copies = directives.copies.len(),
            mods = directives.mods.len(),
            forgets = directives.forgets.len(),
            "applying overlay directives"
        );
        self.copy_pass(graph, report, &directives.copies);
        self.mod_pass(graph, report, &directives.mods);
        self.forget_pass(graph, &directives.forgets);
    }

    /// `Base.COPY=New`: clone the live base under a new name, apply the
    /// remaining tokens, then complete it like a fresh definition.
    fn copy_pass(&mut self, graph: &mut ObjectGraph, report: &mut LoadReport, copies: &[OverlayDirective]) {
        let kind = self.builder.kind();
        let mut created = 0;
        for d in copies {
            let LineKind::Copy { base, copy_name } = classify(&d.line) else {
                continue;
            };
            let location = Location::line(&d.source, d.line_number);
            let (base, copy_name) = (base.trim(), copy_name.trim());

            if copy_name.is_empty() {
                report.diagnostics.error(
                    DiagnosticKind::MalformedDirective,
                    format!("copy of {kind} '{base}' has no target name"),
                    Some(location),
                );
                continue;
            }
            let Some(original) = graph.get_keyed(kind, base).and_then(|id| graph.get(id)) else {
                report.diagnostics.error(
                    DiagnosticKind::MissingBaseObject,
                    format!("cannot copy {kind} '{base}': object not found"),
                    Some(location),
                );
                continue;
            };

            let mut copy = original.copy_as(copy_name);
            copy.stamp(&d.source);
            self.builder
                .dispatch_tokens(report, &d.source, d.line_number, &mut copy, tokenize_tags(tag_section(&d.line)));
            match self
                .builder
                .complete_object(graph, report, &d.source, d.source_map.as_ref(), copy)
            {
                Ok(Some(_)) => created += 1,
                Ok(None) => {}
                Err(e) => report.fail(e, Some(location)),
            }
        }
        debug!(created, "copy pass done");
    }

    /// `Key.MOD`: every line of a group edits the live object in place; the
    /// object is completed once after the whole group.
    fn mod_pass(&mut self, graph: &mut ObjectGraph, report: &mut LoadReport, mods: &[ModGroup]) {
        let kind = self.builder.kind();
        let mut modified = 0;
        for group in mods {
            let key = group.key.trim();
            let Some(first) = group.directives.first() else {
                continue;
            };
            if self.builder.is_excluded(key) {
                debug!(%key, "mod target excluded, skipping");
                continue;
            }
            let Some(id) = graph.get_keyed(kind, key) else {
                report.diagnostics.error(
                    DiagnosticKind::MissingBaseObject,
                    format!("cannot modify {kind} '{key}': object not found"),
                    Some(Location::line(&first.source, first.line_number)),
                );
                continue;
            };

            for d in &group.directives {
                let Some(object) = graph.get_mut(id) else {
                    break;
                };
                object.provenance.clear_dirty();
                let previous_key = object.key_name.clone();

                let mut tokens = Vec::new();
                if let LineKind::Mod {
                    inline: Some(inline), ..
                } = classify(&d.line)
                {
                    tokens.push(parse_token(inline));
                }
                tokens.extend(tokenize_tags(tag_section(&d.line)));
                self.builder
                    .dispatch_tokens(report, &d.source, d.line_number, object, tokens);

                if object.provenance.is_dirty() {
                    if let Some(map) = &d.source_map {
                        if let Err(e) = map.apply_to(&mut object.provenance) {
                            let error = LoadError::SourceDate {
                                uri: d.source.uri(),
                                key: object.key_name.clone(),
                                source: e,
                            };
                            report.fail(error, Some(Location::line(&d.source, d.line_number)));
                        }
                    }
                }
                self.builder
                    .rekey(graph, report, Location::line(&d.source, d.line_number), id, &previous_key);
            }

            modified += 1;
            if let Err(e) = self.builder.complete_live(graph, &first.source, None, id) {
                report.fail(e, Some(Location::line(&first.source, first.line_number)));
            }
        }
        debug!(modified, "mod pass done");
    }

    /// `Key.FORGET`: remove every object registered under the key. Excluded
    /// or unknown keys are skipped silently.
    fn forget_pass(&mut self, graph: &mut ObjectGraph, forgets: &[OverlayDirective]) {
        let kind = self.builder.kind();
        let hooks = self.builder.hooks();
        let mut forgotten = 0;
        for d in forgets {
            let LineKind::Forget { key } = classify(&d.line) else {
                continue;
            };
            let key = key.trim();
            if self.builder.is_excluded(key) {
                debug!(%key, "forget target excluded, skipping");
                continue;
            }
            let ids = graph.all_keyed(kind, key);
            if ids.is_empty() {
                debug!(%key, "nothing to forget");
                continue;
            }
            forgotten += ids.len();
            for id in ids {
                hooks.forget(graph, id);
            }
        }
        debug!(forgotten, "forget pass done");
    }
}

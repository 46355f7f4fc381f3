//! Object builder: definition lines to graph objects
//!
//! Creates (or continues) an object per definition line, dispatches its tags,
//! and completes it: source metadata, include/exclude filtering, kind hooks
//! and identity conflict resolution.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::diagnostics::{DiagnosticKind, Location};
use crate::application::hooks::KindHooks;
use crate::application::registry::{Dispatch, ParseContext, TokenRegistry};
use crate::application::services::conflict::{self, OverridePolicy, Resolution};
use crate::application::services::report::LoadReport;
use crate::application::LoadError;
use crate::domain::line::{name_field, tag_section, tokenize_tags, Token};
use crate::domain::{DomainError, DomainObject, ObjectGraph, ObjectId, ObjectKind, SourceEntry, SourceMap};

pub struct ObjectBuilder {
    kind: ObjectKind,
    registry: Arc<TokenRegistry>,
    hooks: Arc<dyn KindHooks>,
    policy: OverridePolicy,
    /// Keys dropped by include/exclude filters this cycle
    excluded: HashSet<String>,
    /// Objects created by earlier lines of the current file
    in_progress: HashMap<String, ObjectId>,
}

impl ObjectBuilder {
    pub fn new(
        kind: ObjectKind,
        registry: Arc<TokenRegistry>,
        hooks: Arc<dyn KindHooks>,
        policy: OverridePolicy,
    ) -> Self {
        Self {
            kind,
            registry,
            hooks,
            policy,
            excluded: HashSet::new(),
            in_progress: HashMap::new(),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn hooks(&self) -> Arc<dyn KindHooks> {
        Arc::clone(&self.hooks)
    }

    pub fn is_excluded(&self, key: &str) -> bool {
        self.excluded.contains(key)
    }

    pub fn excluded(&self) -> &HashSet<String> {
        &self.excluded
    }

    pub(crate) fn begin_cycle(&mut self) {
        self.excluded.clear();
        self.in_progress.clear();
    }

    pub(crate) fn begin_file(&mut self) {
        self.in_progress.clear();
    }

    /// Handle one definition line.
    ///
    /// A name already built by an earlier line of the same file continues
    /// that object, so a differing redefinition within one file merges into
    /// the first definition instead of raising a duplicate. Kinds that retain
    /// duplicates never continue: every line builds its own object. Returns
    /// the live handle when the object ended up in the graph.
    #[instrument(level = "trace", skip(self, graph, report, source, line, source_map))]
    pub fn build_or_continue(
        &mut self,
        graph: &mut ObjectGraph,
        report: &mut LoadReport,
        source: &SourceEntry,
        line_number: usize,
        line: &str,
        source_map: Option<&SourceMap>,
    ) -> Result<Option<ObjectId>, LoadError> {
        let name = name_field(line).trim();
        let tokens = tokenize_tags(tag_section(line));

        let continued = if self.policy.retain_duplicates {
            None
        } else {
            self.in_progress.get(name).copied()
        };
        if let Some(id) = continued {
            if let Some(object) = graph.get_mut(id) {
                let previous_key = object.key_name.clone();
                self.dispatch_tokens(report, source, line_number, object, tokens);
                self.rekey(graph, report, Location::line(source, line_number), id, &previous_key);
                self.complete_live(graph, source, source_map, id)?;
                return Ok(Some(id));
            }
        }

        let mut object = DomainObject::new(self.kind, name);
        object.stamp(source);
        self.dispatch_tokens(report, source, line_number, &mut object, tokens);
        let id = self.complete_object(graph, report, source, source_map, object)?;
        if let Some(id) = id {
            self.in_progress.insert(name.to_string(), id);
        }
        Ok(id)
    }

    /// Dispatch every token in order. Failures are reported and skipped; the
    /// remaining tokens are still applied.
    pub fn dispatch_tokens(
        &self,
        report: &mut LoadReport,
        source: &SourceEntry,
        line_number: usize,
        target: &mut DomainObject,
        tokens: Vec<Result<Token<'_>, DomainError>>,
    ) {
        for token in tokens {
            let location = Location::line(source, line_number);
            let Token { tag, value } = match token {
                Ok(token) => token,
                Err(e) => {
                    report
                        .diagnostics
                        .error(DiagnosticKind::MalformedToken, e.to_string(), Some(location));
                    continue;
                }
            };

            let mut ctx = ParseContext {
                kind: self.kind,
                source,
                line: line_number,
                diagnostics: &mut report.diagnostics,
            };
            let outcome = match self.registry.dispatch(&mut ctx, target, tag, value) {
                Dispatch::NotRegistered => self.registry.dispatch_generic(&mut ctx, target, tag, value),
                outcome => outcome,
            };

            match outcome {
                Dispatch::Parsed => {}
                Dispatch::Failed(e) => report.diagnostics.error(
                    DiagnosticKind::TagParseFailure,
                    format!(
                        "error parsing token {tag} in {} {}: {}: {e}",
                        self.kind,
                        target.display_name,
                        value.unwrap_or_default()
                    ),
                    Some(location),
                ),
                Dispatch::NotRegistered => report.diagnostics.error(
                    DiagnosticKind::UnknownTag,
                    format!(
                        "illegal {} tag '{tag}' for {} in campaign {}",
                        self.kind, target.display_name, source.campaign.name
                    ),
                    Some(location),
                ),
            }
        }
    }

    /// Complete a freshly built (not yet stored) object.
    ///
    /// Returns the handle it was stored under, or `None` when it was excluded
    /// or lost an identity conflict. A malformed SOURCE date fails this object
    /// only.
    pub fn complete_object(
        &mut self,
        graph: &mut ObjectGraph,
        report: &mut LoadReport,
        source: &SourceEntry,
        source_map: Option<&SourceMap>,
        mut object: DomainObject,
    ) -> Result<Option<ObjectId>, LoadError> {
        if let Some(map) = source_map {
            map.apply_to(&mut object.provenance)
                .map_err(|e| LoadError::SourceDate {
                    uri: source.uri(),
                    key: object.key_name.clone(),
                    source: e,
                })?;
        }

        if !object.has_identity() || !source.admits(&object.key_name) {
            debug!(kind = %self.kind, key = %object.key_name, "excluded");
            self.excluded.insert(object.key_name);
            return Ok(None);
        }

        self.hooks.finish_object(&mut object);

        let Some(existing_id) = graph.get_keyed(self.kind, &object.key_name) else {
            return Ok(Some(graph.insert(object)));
        };
        let Some(existing) = graph.get(existing_id) else {
            return Ok(Some(graph.insert(object)));
        };
        if *existing == object {
            return Ok(Some(graph.replace(existing_id, object)));
        }

        match conflict::resolve(self.policy, existing, &object) {
            Resolution::Replace => {
                info!(
                    kind = %self.kind,
                    key = %object.key_name,
                    from = ?existing.source_uri,
                    to = ?object.source_uri,
                    "newer source overrides definition"
                );
                self.hooks.forget(graph, existing_id);
                Ok(Some(graph.insert(object)))
            }
            Resolution::Retain => Ok(Some(graph.insert(object))),
            Resolution::KeepExisting => {
                debug!(kind = %self.kind, key = %object.key_name, "existing definition kept");
                Ok(None)
            }
            Resolution::Duplicate => {
                report.diagnostics.error(
                    DiagnosticKind::DuplicateObject,
                    format!(
                        "duplicate {} '{}': already defined in {}, ignoring definition in {}",
                        self.kind,
                        object.key_name,
                        existing.source_uri.as_deref().unwrap_or("<unknown>"),
                        object.source_uri.as_deref().unwrap_or("<unknown>"),
                    ),
                    Some(Location::file(source.uri())),
                );
                Ok(None)
            }
        }
    }

    /// Move a live object whose `KEY` changed to its new key.
    ///
    /// Renaming onto a key held by another object is an identity conflict.
    /// When the holder wins, the rename is undone and reported as a
    /// duplicate; when the renamed object wins, the holder is forgotten.
    pub fn rekey(
        &self,
        graph: &mut ObjectGraph,
        report: &mut LoadReport,
        location: Location,
        id: ObjectId,
        previous_key: &str,
    ) {
        let Some(object) = graph.get(id) else {
            return;
        };
        if object.key_name == previous_key {
            return;
        }
        let holder = graph
            .all_keyed(self.kind, &object.key_name)
            .into_iter()
            .find(|other| *other != id)
            .and_then(|other| graph.get(other).map(|held| (other, held)));

        if let Some((holder_id, held)) = holder {
            let resolution = conflict::resolve(self.policy, held, object);
            let key = object.key_name.clone();
            let held_uri = held.source_uri.clone();
            match resolution {
                Resolution::Retain => {}
                Resolution::Replace => {
                    info!(kind = %self.kind, key = %key, from = previous_key, "renamed object overrides definition");
                    self.hooks.forget(graph, holder_id);
                }
                Resolution::KeepExisting | Resolution::Duplicate => {
                    report.diagnostics.error(
                        DiagnosticKind::DuplicateObject,
                        format!(
                            "cannot rename {} '{previous_key}' to '{key}': already defined in {}",
                            self.kind,
                            held_uri.as_deref().unwrap_or("<unknown>"),
                        ),
                        Some(location),
                    );
                    if let Some(object) = graph.get_mut(id) {
                        object.key_name = previous_key.to_string();
                    }
                    return;
                }
            }
        }
        graph.reindex(id, previous_key);
    }

    /// Complete an object that already lives in the graph (continuation lines
    /// and `.MOD` groups).
    ///
    /// A filter that rejects the key records it as excluded but leaves the
    /// live object in place.
    pub fn complete_live(
        &mut self,
        graph: &mut ObjectGraph,
        source: &SourceEntry,
        source_map: Option<&SourceMap>,
        id: ObjectId,
    ) -> Result<(), LoadError> {
        let Some(object) = graph.get_mut(id) else {
            return Ok(());
        };
        if let Some(map) = source_map {
            map.apply_to(&mut object.provenance)
                .map_err(|e| LoadError::SourceDate {
                    uri: source.uri(),
                    key: object.key_name.clone(),
                    source: e,
                })?;
        }
        if !object.has_identity() || !source.admits(&object.key_name) {
            debug!(kind = %self.kind, key = %object.key_name, "excluded");
            self.excluded.insert(object.key_name.clone());
            return Ok(());
        }
        self.hooks.finish_object(object);
        Ok(())
    }
}

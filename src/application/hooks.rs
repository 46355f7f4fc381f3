//! Extension points owned by surrounding layers
//!
//! Kind-specific finishing and forgetting, plus the post-load reference
//! resolution pass.

use std::collections::BTreeSet;

use tracing::debug;

use crate::application::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::domain::{DomainObject, Link, ObjectGraph, ObjectId, ObjectKind, RefPolicy};

/// Per-kind behaviour the loader calls into.
pub trait KindHooks: Send + Sync {
    /// Last chance to adjust an included object before it is stored.
    fn finish_object(&self, _object: &mut DomainObject) {}

    /// Remove an object from the graph, unlinking whatever the kind requires.
    fn forget(&self, graph: &mut ObjectGraph, id: ObjectId) {
        graph.remove(id);
    }
}

/// Hooks with no kind-specific behaviour.
#[derive(Debug, Default)]
pub struct DefaultHooks;

impl KindHooks for DefaultHooks {}

/// Post-load resolution of references recorded by tag parsers.
pub trait ReferenceResolver: Send + Sync {
    /// Materialise objects that were referenced but never defined.
    /// Returns how many were created.
    fn construct_deferred(&self, graph: &mut ObjectGraph, diagnostics: &mut Diagnostics) -> usize;

    /// Resolve every recorded reference against the complete graph.
    /// Returns how many stayed unresolved.
    fn resolve(&self, graph: &mut ObjectGraph, diagnostics: &mut Diagnostics) -> usize;
}

/// Resolves references by key lookup in the graph.
#[derive(Debug, Default)]
pub struct GraphReferenceResolver;

impl ReferenceResolver for GraphReferenceResolver {
    fn construct_deferred(&self, graph: &mut ObjectGraph, _diagnostics: &mut Diagnostics) -> usize {
        let wanted: BTreeSet<(ObjectKind, String)> = graph
            .ids()
            .into_iter()
            .filter_map(|id| graph.get(id))
            .flat_map(|o| o.references.iter())
            .filter(|r| r.policy == RefPolicy::ConstructIfMissing)
            .filter(|r| !graph.contains_key(r.kind, &r.key))
            .map(|r| (r.kind, r.key.clone()))
            .collect();

        for (kind, key) in &wanted {
            debug!(%kind, key, "constructing deferred object");
            graph.insert(DomainObject::new(*kind, key));
        }
        wanted.len()
    }

    fn resolve(&self, graph: &mut ObjectGraph, diagnostics: &mut Diagnostics) -> usize {
        let mut unresolved = 0;
        for id in graph.ids() {
            let Some(object) = graph.get(id) else {
                continue;
            };
            let mut links: std::collections::BTreeMap<String, Vec<Link>> = Default::default();
            for reference in &object.references {
                match graph.get_keyed(reference.kind, &reference.key) {
                    Some(target) => links.entry(reference.tag.clone()).or_default().push(Link {
                        kind: reference.kind,
                        target,
                    }),
                    None => {
                        unresolved += 1;
                        diagnostics.error(
                            DiagnosticKind::UnresolvedReference,
                            format!(
                                "{} {} references unknown {} '{}' via {}",
                                object.kind, object.key_name, reference.kind, reference.key, reference.tag
                            ),
                            object.source_uri.clone().map(Location::file),
                        );
                    }
                }
            }
            if let Some(object) = graph.get_mut(id) {
                object.links = links;
            }
        }
        unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_construct_if_missing_reference_when_resolving_then_target_is_created_and_linked() {
        let mut graph = ObjectGraph::new();
        let mut elf = DomainObject::new(ObjectKind::Race, "Elf");
        elf.add_reference("LANGAUTO", ObjectKind::Language, "Elven", RefPolicy::ConstructIfMissing);
        let elf_id = graph.insert(elf);
        let mut diagnostics = Diagnostics::new();

        let resolver = GraphReferenceResolver;
        assert_eq!(resolver.construct_deferred(&mut graph, &mut diagnostics), 1);
        assert_eq!(resolver.resolve(&mut graph, &mut diagnostics), 0);

        let elven = graph.get_keyed(ObjectKind::Language, "Elven").unwrap();
        let links = &graph.get(elf_id).unwrap().links["LANGAUTO"];
        assert_eq!(links[0].target, elven);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn given_required_reference_to_missing_object_when_resolving_then_reports_error() {
        let mut graph = ObjectGraph::new();
        let mut fighter = DomainObject::new(ObjectKind::Class, "Fighter");
        fighter.add_reference("ABILITY", ObjectKind::Ability, "Cleave", RefPolicy::Require);
        graph.insert(fighter);
        let mut diagnostics = Diagnostics::new();

        let resolver = GraphReferenceResolver;
        assert_eq!(resolver.construct_deferred(&mut graph, &mut diagnostics), 0);
        assert_eq!(resolver.resolve(&mut graph, &mut diagnostics), 1);
        assert_eq!(diagnostics.of_kind(DiagnosticKind::UnresolvedReference).len(), 1);
    }
}

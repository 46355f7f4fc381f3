use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{DomainObject, ObjectKind};

/// Handle to an object in the graph.
///
/// Handles of removed objects never alias a later insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(Index);

/// Caller-owned store of every loaded object, keyed by (kind, key name).
///
/// Uses a generational arena so `.FORGET` can drop objects while handles held
/// elsewhere simply stop resolving.
#[derive(Debug, Default)]
pub struct ObjectGraph {
    arena: Arena<DomainObject>,
    /// Insertion-ordered handles per key; more than one only under a
    /// duplicate-retaining policy
    keyed: HashMap<(ObjectKind, String), Vec<ObjectId>>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "trace", skip(self, object), fields(kind = %object.kind, key = %object.key_name))]
    pub fn insert(&mut self, object: DomainObject) -> ObjectId {
        let slot = (object.kind, object.key_name.clone());
        let id = ObjectId(self.arena.insert(object));
        self.keyed.entry(slot).or_default().push(id);
        id
    }

    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, id: ObjectId) -> Option<DomainObject> {
        let object = self.arena.remove(id.0)?;
        let slot = (object.kind, object.key_name.clone());
        if let Some(ids) = self.keyed.get_mut(&slot) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.keyed.remove(&slot);
            }
        }
        Some(object)
    }

    /// Remove `old` and insert `new` in its place.
    pub fn replace(&mut self, old: ObjectId, new: DomainObject) -> ObjectId {
        self.remove(old);
        self.insert(new)
    }

    pub fn get(&self, id: ObjectId) -> Option<&DomainObject> {
        self.arena.get(id.0)
    }

    /// Mutable access for in-place modification.
    ///
    /// Changing `key_name` through this handle must be followed by
    /// [`ObjectGraph::reindex`].
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut DomainObject> {
        self.arena.get_mut(id.0)
    }

    /// First live object registered under the key.
    pub fn get_keyed(&self, kind: ObjectKind, key: &str) -> Option<ObjectId> {
        self.keyed
            .get(&(kind, key.to_string()))
            .and_then(|ids| ids.first().copied())
    }

    pub fn all_keyed(&self, kind: ObjectKind, key: &str) -> Vec<ObjectId> {
        self.keyed
            .get(&(kind, key.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains_key(&self, kind: ObjectKind, key: &str) -> bool {
        self.get_keyed(kind, key).is_some()
    }

    /// Move an object's handle from `previous_key` to its current key name.
    pub fn reindex(&mut self, id: ObjectId, previous_key: &str) {
        let Some(object) = self.arena.get(id.0) else {
            return;
        };
        let kind = object.kind;
        let current = object.key_name.clone();
        if current == previous_key {
            return;
        }
        let old_slot = (kind, previous_key.to_string());
        if let Some(ids) = self.keyed.get_mut(&old_slot) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.keyed.remove(&old_slot);
            }
        }
        self.keyed.entry((kind, current)).or_default().push(id);
    }

    /// Handles of one kind, sorted by key name.
    pub fn ids_of(&self, kind: ObjectKind) -> Vec<ObjectId> {
        let mut ids: Vec<(&str, ObjectId)> = self
            .arena
            .iter()
            .filter(|(_, o)| o.kind == kind)
            .map(|(idx, o)| (o.key_name.as_str(), ObjectId(idx)))
            .collect();
        ids.sort_by(|a, b| a.0.cmp(b.0));
        ids.into_iter().map(|(_, id)| id).collect()
    }

    pub fn objects_of(&self, kind: ObjectKind) -> Vec<&DomainObject> {
        self.ids_of(kind)
            .into_iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.arena.iter().map(|(idx, _)| ObjectId(idx)).collect()
    }

    pub fn count(&self, kind: ObjectKind) -> usize {
        self.arena.iter().filter(|(_, o)| o.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_removed_object_when_looking_up_then_handle_is_dead() {
        let mut graph = ObjectGraph::new();
        let id = graph.insert(DomainObject::new(ObjectKind::Class, "Fighter"));
        assert!(graph.remove(id).is_some());
        assert!(graph.get(id).is_none());
        assert!(graph.get_keyed(ObjectKind::Class, "Fighter").is_none());

        let again = graph.insert(DomainObject::new(ObjectKind::Class, "Fighter"));
        assert_ne!(id, again);
    }

    #[test]
    fn given_same_key_in_two_kinds_when_looking_up_then_kinds_are_separate() {
        let mut graph = ObjectGraph::new();
        let class = graph.insert(DomainObject::new(ObjectKind::Class, "Monk"));
        let ability = graph.insert(DomainObject::new(ObjectKind::Ability, "Monk"));
        assert_eq!(graph.get_keyed(ObjectKind::Class, "Monk"), Some(class));
        assert_eq!(graph.get_keyed(ObjectKind::Ability, "Monk"), Some(ability));
    }

    #[test]
    fn given_renamed_key_when_reindexed_then_new_key_resolves() {
        let mut graph = ObjectGraph::new();
        let id = graph.insert(DomainObject::new(ObjectKind::Race, "Elf "));
        graph.get_mut(id).unwrap().key_name = "Elf".to_string();
        graph.reindex(id, "Elf ");
        assert_eq!(graph.get_keyed(ObjectKind::Race, "Elf"), Some(id));
        assert!(graph.get_keyed(ObjectKind::Race, "Elf ").is_none());
    }
}

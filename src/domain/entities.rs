//! Domain entities: core data structures

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::graph::ObjectId;
use crate::domain::provenance::Provenance;

/// Category of domain object a loader produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Class,
    Race,
    Ability,
    Spell,
    Equipment,
    Skill,
    Template,
    Deity,
    Domain,
    Language,
    Kit,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 11] = [
        ObjectKind::Class,
        ObjectKind::Race,
        ObjectKind::Ability,
        ObjectKind::Spell,
        ObjectKind::Equipment,
        ObjectKind::Skill,
        ObjectKind::Template,
        ObjectKind::Deity,
        ObjectKind::Domain,
        ObjectKind::Language,
        ObjectKind::Kit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Class => "class",
            ObjectKind::Race => "race",
            ObjectKind::Ability => "ability",
            ObjectKind::Spell => "spell",
            ObjectKind::Equipment => "equipment",
            ObjectKind::Skill => "skill",
            ObjectKind::Template => "template",
            ObjectKind::Deity => "deity",
            ObjectKind::Domain => "domain",
            ObjectKind::Language => "language",
            ObjectKind::Kit => "kit",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ObjectKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| DomainError::UnknownKind(s.to_string()))
    }
}

/// Campaign (book) a source file belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Campaign {
    pub name: String,
    /// Publication date, used for override recency
    pub date: Option<NaiveDate>,
}

impl Campaign {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            date: None,
        }
    }

    pub fn dated(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            date: Some(date),
        }
    }
}

/// One input file plus its campaign association and key filters.
///
/// Owned by the caller; the loader only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub campaign: Campaign,
    /// When non-empty, only these keys are loaded from the file
    pub include: Vec<String>,
    /// When non-empty (and `include` is empty), these keys are skipped
    pub exclude: Vec<String>,
}

impl SourceEntry {
    pub fn new(path: impl Into<PathBuf>, campaign: Campaign) -> Self {
        Self {
            path: path.into(),
            campaign,
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn with_include(mut self, keys: &[&str]) -> Self {
        self.include = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_exclude(mut self, keys: &[&str]) -> Self {
        self.exclude = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn uri(&self) -> String {
        self.path.display().to_string()
    }

    /// Apply the include/exclude filter to a key.
    ///
    /// An include list wins over an exclude list when both are present.
    pub fn admits(&self, key: &str) -> bool {
        if !self.include.is_empty() {
            return self.include.iter().any(|k| k == key);
        }
        !self.exclude.iter().any(|k| k == key)
    }
}

/// A source entry tagged with the kind of object its file defines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSource {
    pub kind: ObjectKind,
    pub entry: SourceEntry,
}

impl PlannedSource {
    pub fn new(kind: ObjectKind, entry: SourceEntry) -> Self {
        Self { kind, entry }
    }
}

/// Attribute payload stored by tag parsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
    List(Vec<String>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::List(items) => f.write_str(&items.join("|")),
        }
    }
}

/// How a missing reference target is treated during deferred resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefPolicy {
    /// Target must be defined by some source file
    Require,
    /// Target is created on demand if no source file defines it
    ConstructIfMissing,
}

/// Symbolic reference recorded by a tag parser, resolved after loading.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub tag: String,
    pub kind: ObjectKind,
    pub key: String,
    pub policy: RefPolicy,
}

/// Resolved relationship between two live objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub kind: ObjectKind,
    pub target: ObjectId,
}

/// A named, keyed entity of a specific kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainObject {
    pub kind: ObjectKind,
    /// Identity within the kind (case-sensitive)
    pub key_name: String,
    pub display_name: String,
    /// File that defines/owns the object
    pub source_uri: Option<String>,
    pub campaign: Option<String>,
    pub provenance: Provenance,
    pub attributes: BTreeMap<String, Value>,
    pub references: Vec<Reference>,
    /// Filled by deferred resolution, keyed by the tag that recorded it
    pub links: BTreeMap<String, Vec<Link>>,
}

impl DomainObject {
    pub fn new(kind: ObjectKind, name: &str) -> Self {
        Self {
            kind,
            key_name: name.to_string(),
            display_name: name.to_string(),
            source_uri: None,
            campaign: None,
            provenance: Provenance::default(),
            attributes: BTreeMap::new(),
            references: Vec::new(),
            links: BTreeMap::new(),
        }
    }

    /// Stamp ownership from the source entry that defines this object.
    pub fn stamp(&mut self, source: &SourceEntry) {
        self.source_uri = Some(source.uri());
        self.campaign = Some(source.campaign.name.clone());
        self.provenance.date = source.campaign.date;
    }

    /// Clone under a new name, keeping every attribute and reference.
    pub fn copy_as(&self, name: &str) -> Self {
        let mut copy = self.clone();
        copy.key_name = name.to_string();
        copy.display_name = name.to_string();
        copy.source_uri = None;
        copy.campaign = None;
        copy.provenance = Provenance::default();
        copy.links.clear();
        copy
    }

    pub fn source_date(&self) -> Option<NaiveDate> {
        self.provenance.date
    }

    pub fn get(&self, tag: &str) -> Option<&Value> {
        self.attributes.get(tag)
    }

    pub fn set(&mut self, tag: &str, value: Value) {
        self.attributes.insert(tag.to_string(), value);
    }

    /// Append to a list attribute, creating it when absent.
    pub fn append(&mut self, tag: &str, items: impl IntoIterator<Item = String>) {
        let entry = self
            .attributes
            .entry(tag.to_string())
            .or_insert_with(|| Value::List(Vec::new()));
        match entry {
            Value::List(list) => list.extend(items),
            other => {
                let mut list = vec![other.to_string()];
                list.extend(items);
                *other = Value::List(list);
            }
        }
    }

    pub fn clear(&mut self, tag: &str) {
        self.attributes.remove(tag);
    }

    pub fn add_reference(&mut self, tag: &str, kind: ObjectKind, key: &str, policy: RefPolicy) {
        self.references.push(Reference {
            tag: tag.to_string(),
            kind,
            key: key.to_string(),
            policy,
        });
    }

    pub fn clear_references(&mut self, tag: &str) {
        self.references.retain(|r| r.tag != tag);
    }

    /// Blank key or display names never enter the graph.
    pub fn has_identity(&self) -> bool {
        !self.key_name.trim().is_empty() && !self.display_name.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_kind_name_in_any_case_when_parsing_then_resolves() {
        assert_eq!("Class".parse::<ObjectKind>().unwrap(), ObjectKind::Class);
        assert_eq!(" SPELL ".parse::<ObjectKind>().unwrap(), ObjectKind::Spell);
        assert!("weapon".parse::<ObjectKind>().is_err());
    }

    #[test]
    fn given_include_and_exclude_when_filtering_then_include_wins() {
        let entry = SourceEntry::new("a.lst", Campaign::new("Core"))
            .with_include(&["Fighter"])
            .with_exclude(&["Fighter", "Wizard"]);
        assert!(entry.admits("Fighter"));
        assert!(!entry.admits("Wizard"));
        assert!(!entry.admits("Rogue"));
    }

    #[test]
    fn given_text_attribute_when_appending_then_promotes_to_list() {
        let mut obj = DomainObject::new(ObjectKind::Race, "Elf");
        obj.set("TYPE", Value::Text("Humanoid".into()));
        obj.append("TYPE", ["Fey".to_string()]);
        assert_eq!(
            obj.get("TYPE"),
            Some(&Value::List(vec!["Humanoid".into(), "Fey".into()]))
        );
    }
}

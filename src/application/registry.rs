//! Tag parser registry and dispatch
//!
//! Maps `(kind, tag)` to a parser. Populated once before loading and shared
//! read-only (behind an `Arc`) afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::trace;

use crate::application::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DomainError, DomainObject, ObjectKind, SourceEntry};

/// Failure reported by a tag parser. Never aborts the line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("{tag} requires a value")]
    MissingValue { tag: String },

    #[error("invalid {tag} value '{value}': {reason}")]
    InvalidValue {
        tag: String,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Domain(#[from] DomainError),
}

impl TagError {
    pub fn invalid(tag: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            tag: tag.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

pub type TagResult = Result<(), TagError>;

/// Per-line state handed to tag parsers.
#[derive(Debug)]
pub struct ParseContext<'a> {
    pub kind: ObjectKind,
    pub source: &'a SourceEntry,
    pub line: usize,
    pub diagnostics: &'a mut Diagnostics,
}

impl ParseContext<'_> {
    pub fn location(&self) -> Location {
        Location::line(self.source, self.line)
    }
}

/// A token plugin.
///
/// Parsers may only mutate the object they are handed; relationships to other
/// objects are recorded as references and resolved after loading.
pub trait TagParser: Send + Sync {
    fn parse(
        &self,
        ctx: &mut ParseContext<'_>,
        target: &mut DomainObject,
        tag: &str,
        value: Option<&str>,
    ) -> TagResult;

    /// Deprecation notice for this use of the tag, if any.
    fn deprecation(&self, _target: &DomainObject, _tag: &str, _value: Option<&str>) -> Option<String> {
        None
    }
}

/// Result of dispatching one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Parsed,
    Failed(TagError),
    NotRegistered,
}

pub struct TokenRegistry {
    by_kind: HashMap<(ObjectKind, String), Arc<dyn TagParser>>,
    /// Fallback parsers valid for every kind
    generic: HashMap<String, Arc<dyn TagParser>>,
    warn_deprecated: bool,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRegistry")
            .field("by_kind", &self.by_kind.len())
            .field("generic", &self.generic.len())
            .field("warn_deprecated", &self.warn_deprecated)
            .finish()
    }
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self {
            by_kind: HashMap::new(),
            generic: HashMap::new(),
            warn_deprecated: true,
        }
    }

    pub fn set_warn_deprecated(&mut self, warn: bool) {
        self.warn_deprecated = warn;
    }

    /// Register a kind-specific parser. A second registration for the same
    /// `(kind, tag)` is a startup error.
    pub fn register(
        &mut self,
        kind: ObjectKind,
        tag: &str,
        parser: Arc<dyn TagParser>,
    ) -> ApplicationResult<()> {
        let slot = (kind, tag.to_string());
        if self.by_kind.contains_key(&slot) {
            return Err(ApplicationError::duplicate_parser(Some(kind), tag));
        }
        self.by_kind.insert(slot, parser);
        Ok(())
    }

    /// Register a parser on the generic fallback path.
    pub fn register_generic(&mut self, tag: &str, parser: Arc<dyn TagParser>) -> ApplicationResult<()> {
        if self.generic.contains_key(tag) {
            return Err(ApplicationError::duplicate_parser(None, tag));
        }
        self.generic.insert(tag.to_string(), parser);
        Ok(())
    }

    pub fn is_registered(&self, kind: ObjectKind, tag: &str) -> bool {
        self.by_kind.contains_key(&(kind, tag.to_string()))
    }

    pub fn is_generic(&self, tag: &str) -> bool {
        self.generic.contains_key(tag)
    }

    /// Dispatch to the parser registered for `(ctx.kind, tag)`.
    pub fn dispatch(
        &self,
        ctx: &mut ParseContext<'_>,
        target: &mut DomainObject,
        tag: &str,
        value: Option<&str>,
    ) -> Dispatch {
        match self.by_kind.get(&(ctx.kind, tag.to_string())) {
            Some(parser) => self.invoke(parser.as_ref(), ctx, target, tag, value),
            None => Dispatch::NotRegistered,
        }
    }

    /// Dispatch to the generic fallback parser for `tag`.
    pub fn dispatch_generic(
        &self,
        ctx: &mut ParseContext<'_>,
        target: &mut DomainObject,
        tag: &str,
        value: Option<&str>,
    ) -> Dispatch {
        match self.generic.get(tag) {
            Some(parser) => self.invoke(parser.as_ref(), ctx, target, tag, value),
            None => Dispatch::NotRegistered,
        }
    }

    fn invoke(
        &self,
        parser: &dyn TagParser,
        ctx: &mut ParseContext<'_>,
        target: &mut DomainObject,
        tag: &str,
        value: Option<&str>,
    ) -> Dispatch {
        if self.warn_deprecated {
            if let Some(notice) = parser.deprecation(target, tag, value) {
                let location = Some(ctx.location());
                ctx.diagnostics.warn(
                    DiagnosticKind::DeprecatedTag,
                    format!("deprecated tag {tag} in {}: {notice}", target.key_name),
                    location,
                );
            }
        }
        trace!(kind = %ctx.kind, tag, ?value, "dispatch");
        match parser.parse(ctx, target, tag, value) {
            Ok(()) => Dispatch::Parsed,
            Err(e) => Dispatch::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Campaign, Value};

    struct Echo;

    impl TagParser for Echo {
        fn parse(
            &self,
            _ctx: &mut ParseContext<'_>,
            target: &mut DomainObject,
            tag: &str,
            value: Option<&str>,
        ) -> TagResult {
            target.set(tag, Value::Text(value.unwrap_or_default().to_string()));
            Ok(())
        }
    }

    #[test]
    fn given_parser_registered_twice_when_registering_then_fails() {
        let mut registry = TokenRegistry::new();
        registry
            .register(ObjectKind::Class, "HD", Arc::new(Echo))
            .unwrap();
        let err = registry
            .register(ObjectKind::Class, "HD", Arc::new(Echo))
            .unwrap_err();
        assert!(matches!(err, ApplicationError::DuplicateParser { .. }));
        // other kinds are independent
        registry
            .register(ObjectKind::Race, "HD", Arc::new(Echo))
            .unwrap();
    }

    #[test]
    fn given_unregistered_tag_when_dispatching_then_not_registered() {
        let registry = TokenRegistry::new();
        let source = SourceEntry::new("x.lst", Campaign::new("Core"));
        let mut diagnostics = Diagnostics::new();
        let mut ctx = ParseContext {
            kind: ObjectKind::Class,
            source: &source,
            line: 1,
            diagnostics: &mut diagnostics,
        };
        let mut target = DomainObject::new(ObjectKind::Class, "Fighter");
        assert_eq!(
            registry.dispatch(&mut ctx, &mut target, "HD", Some("10")),
            Dispatch::NotRegistered
        );
    }
}

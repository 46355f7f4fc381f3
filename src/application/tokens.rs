//! Standard tag parsers
//!
//! A small stock set covering identity, typing, provenance and a few
//! kind-specific tags. Anything else is reported as an unknown tag.

use std::sync::Arc;

use crate::application::registry::{ParseContext, TagError, TagParser, TagResult, TokenRegistry};
use crate::application::ApplicationResult;
use crate::domain::line::CLEAR;
use crate::domain::{DomainObject, ObjectKind, RefPolicy, Value};

fn required<'v>(tag: &str, value: Option<&'v str>) -> Result<&'v str, TagError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(TagError::MissingValue { tag: tag.to_string() }),
    }
}

/// `KEY:` renames the object's identity; the display name stays.
#[derive(Debug)]
pub struct KeyParser;

impl TagParser for KeyParser {
    fn parse(&self, _ctx: &mut ParseContext<'_>, target: &mut DomainObject, tag: &str, value: Option<&str>) -> TagResult {
        target.key_name = required(tag, value)?.to_string();
        Ok(())
    }
}

/// Stores the value verbatim, replacing any earlier one.
#[derive(Debug)]
pub struct TextParser;

impl TagParser for TextParser {
    fn parse(&self, _ctx: &mut ParseContext<'_>, target: &mut DomainObject, tag: &str, value: Option<&str>) -> TagResult {
        target.set(tag, Value::Text(required(tag, value)?.to_string()));
        Ok(())
    }
}

/// Appends separated items. `.CLEAR` empties the list; `.CLEAR<sep>a<sep>b`
/// empties it and appends the rest.
#[derive(Debug)]
pub struct ListParser {
    pub separator: char,
}

impl TagParser for ListParser {
    fn parse(&self, _ctx: &mut ParseContext<'_>, target: &mut DomainObject, tag: &str, value: Option<&str>) -> TagResult {
        let mut rest = required(tag, value)?;
        if let Some(after) = rest.strip_prefix(CLEAR) {
            target.clear(tag);
            rest = after.strip_prefix(self.separator).unwrap_or(after);
        }
        let items: Vec<String> = rest
            .split(self.separator)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if !items.is_empty() {
            target.append(tag, items);
        }
        Ok(())
    }
}

/// `SOURCE*` tags write into the object's provenance.
#[derive(Debug)]
pub struct SourceParser;

impl TagParser for SourceParser {
    fn parse(&self, _ctx: &mut ParseContext<'_>, target: &mut DomainObject, tag: &str, value: Option<&str>) -> TagResult {
        target.provenance.set_field(tag, required(tag, value)?)?;
        Ok(())
    }
}

/// Positive integer, optionally accepting a keyword meaning "unlimited".
#[derive(Debug)]
pub struct PositiveIntParser {
    pub unlimited: Option<&'static str>,
}

impl TagParser for PositiveIntParser {
    fn parse(&self, _ctx: &mut ParseContext<'_>, target: &mut DomainObject, tag: &str, value: Option<&str>) -> TagResult {
        let raw = required(tag, value)?;
        if self.unlimited.is_some_and(|word| raw.eq_ignore_ascii_case(word)) {
            target.set(tag, Value::Text(raw.to_ascii_uppercase()));
            return Ok(());
        }
        match raw.parse::<i64>() {
            Ok(n) if n > 0 => {
                target.set(tag, Value::Integer(n));
                Ok(())
            }
            Ok(_) => Err(TagError::invalid(tag, raw, "must be positive")),
            Err(e) => Err(TagError::invalid(tag, raw, e.to_string())),
        }
    }
}

/// Old spelling of another tag. Parses through the canonical parser and
/// stores under the canonical tag.
pub struct DeprecatedAlias {
    pub canonical: &'static str,
    pub inner: Arc<dyn TagParser>,
}

impl TagParser for DeprecatedAlias {
    fn parse(&self, ctx: &mut ParseContext<'_>, target: &mut DomainObject, _tag: &str, value: Option<&str>) -> TagResult {
        self.inner.parse(ctx, target, self.canonical, value)
    }

    fn deprecation(&self, _target: &DomainObject, _tag: &str, _value: Option<&str>) -> Option<String> {
        Some(format!("use {} instead", self.canonical))
    }
}

/// `|`-separated keys of another kind, recorded as references for the
/// post-load resolution pass.
#[derive(Debug)]
pub struct ReferenceParser {
    pub kind: ObjectKind,
    pub policy: RefPolicy,
}

impl TagParser for ReferenceParser {
    fn parse(&self, _ctx: &mut ParseContext<'_>, target: &mut DomainObject, tag: &str, value: Option<&str>) -> TagResult {
        let mut rest = required(tag, value)?;
        if let Some(after) = rest.strip_prefix(CLEAR) {
            target.clear_references(tag);
            rest = after.strip_prefix('|').unwrap_or(after);
        }
        for key in rest.split('|').map(str::trim).filter(|k| !k.is_empty()) {
            target.add_reference(tag, self.kind, key, self.policy);
        }
        Ok(())
    }
}

/// Registry with the stock parsers installed.
pub fn standard_registry(warn_deprecated: bool) -> ApplicationResult<TokenRegistry> {
    let mut registry = TokenRegistry::new();
    registry.set_warn_deprecated(warn_deprecated);

    let text: Arc<dyn TagParser> = Arc::new(TextParser);
    let source: Arc<dyn TagParser> = Arc::new(SourceParser);
    registry.register_generic("KEY", Arc::new(KeyParser))?;
    registry.register_generic("OUTPUTNAME", Arc::clone(&text))?;
    registry.register_generic("DESC", Arc::clone(&text))?;
    registry.register_generic("TYPE", Arc::new(ListParser { separator: '.' }))?;
    registry.register_generic("SR", Arc::new(ListParser { separator: '|' }))?;
    for tag in ["SOURCEPAGE", "SOURCELONG", "SOURCESHORT", "SOURCEWEB", "SOURCEDATE"] {
        registry.register_generic(tag, Arc::clone(&source))?;
    }

    let hd: Arc<dyn TagParser> = Arc::new(PositiveIntParser { unlimited: None });
    registry.register(ObjectKind::Class, "HD", Arc::clone(&hd))?;
    registry.register(
        ObjectKind::Class,
        "HITDIE",
        Arc::new(DeprecatedAlias {
            canonical: "HD",
            inner: hd,
        }),
    )?;
    registry.register(
        ObjectKind::Class,
        "MAXLEVEL",
        Arc::new(PositiveIntParser {
            unlimited: Some("NOLIMIT"),
        }),
    )?;
    registry.register(
        ObjectKind::Class,
        "ABILITY",
        Arc::new(ReferenceParser {
            kind: ObjectKind::Ability,
            policy: RefPolicy::Require,
        }),
    )?;

    registry.register(
        ObjectKind::Race,
        "LANGAUTO",
        Arc::new(ReferenceParser {
            kind: ObjectKind::Language,
            policy: RefPolicy::ConstructIfMissing,
        }),
    )?;

    registry.register(ObjectKind::Spell, "SCHOOL", Arc::clone(&text))?;
    registry.register(ObjectKind::Spell, "CLASSES", text)?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diagnostics::Diagnostics;
    use crate::application::registry::Dispatch;
    use crate::domain::{Campaign, SourceEntry};
    use rstest::rstest;

    fn dispatch(kind: ObjectKind, target: &mut DomainObject, tag: &str, value: &str) -> (Dispatch, Diagnostics) {
        let registry = standard_registry(true).unwrap();
        let source = SourceEntry::new("core.lst", Campaign::new("Core"));
        let mut diagnostics = Diagnostics::new();
        let mut ctx = ParseContext {
            kind,
            source: &source,
            line: 1,
            diagnostics: &mut diagnostics,
        };
        let outcome = match registry.dispatch(&mut ctx, target, tag, Some(value)) {
            Dispatch::NotRegistered => registry.dispatch_generic(&mut ctx, target, tag, Some(value)),
            other => other,
        };
        (outcome, diagnostics)
    }

    #[rstest]
    #[case("10", Some(Value::Integer(10)))]
    #[case("0", None)]
    #[case("ten", None)]
    fn given_hd_value_when_parsing_then_only_positive_integers_stick(
        #[case] raw: &str,
        #[case] expected: Option<Value>,
    ) {
        let mut fighter = DomainObject::new(ObjectKind::Class, "Fighter");
        let (outcome, _) = dispatch(ObjectKind::Class, &mut fighter, "HD", raw);
        assert_eq!(outcome == Dispatch::Parsed, expected.is_some());
        assert_eq!(fighter.get("HD"), expected.as_ref());
    }

    #[test]
    fn given_hitdie_when_parsing_then_stored_as_hd_with_deprecation_warning() {
        let mut fighter = DomainObject::new(ObjectKind::Class, "Fighter");
        let (outcome, diagnostics) = dispatch(ObjectKind::Class, &mut fighter, "HITDIE", "8");
        assert_eq!(outcome, Dispatch::Parsed);
        assert_eq!(fighter.get("HD"), Some(&Value::Integer(8)));
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn given_type_with_clear_when_parsing_then_list_restarts() {
        let mut elf = DomainObject::new(ObjectKind::Race, "Elf");
        dispatch(ObjectKind::Race, &mut elf, "TYPE", "Humanoid.Base");
        dispatch(ObjectKind::Race, &mut elf, "TYPE", ".CLEAR.Fey");
        assert_eq!(elf.get("TYPE"), Some(&Value::List(vec!["Fey".into()])));
    }

    #[test]
    fn given_class_tag_on_race_when_dispatching_then_not_registered() {
        let mut elf = DomainObject::new(ObjectKind::Race, "Elf");
        let (outcome, _) = dispatch(ObjectKind::Race, &mut elf, "HD", "8");
        assert_eq!(outcome, Dispatch::NotRegistered);
    }

    #[test]
    fn given_sourcepage_when_parsing_then_provenance_is_dirty() {
        let mut fighter = DomainObject::new(ObjectKind::Class, "Fighter");
        dispatch(ObjectKind::Class, &mut fighter, "SOURCEPAGE", "p.32");
        assert_eq!(fighter.provenance.page.as_deref(), Some("p.32"));
        assert!(fighter.provenance.is_dirty());
    }
}

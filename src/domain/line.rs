//! LST line format: record splitting, tokenizing and directive classification
//!
//! A line is `NAME<TAB>TAG:value<TAB>TAG:value...`. Directive lines carry a
//! reserved suffix inside the name field (`Base.COPY=New`, `Key.MOD`,
//! `Key.FORGET`); `SOURCE...` lines set book metadata for later lines.

use crate::domain::error::DomainError;

pub const FIELD_SEPARATOR: char = '\t';
pub const COMMENT_CHAR: char = '#';
pub const SOURCE_PREFIX: &str = "SOURCE";
pub const COPY_SUFFIX: &str = ".COPY";
pub const MOD_SUFFIX: &str = ".MOD";
pub const FORGET_SUFFIX: &str = ".FORGET";
/// Value recognised by many tag parsers as "reset to empty".
pub const CLEAR: &str = ".CLEAR";

/// Non-blank, non-comment records with their 1-based line numbers.
///
/// Accepts `\n` and `\r\n` record separators.
pub fn content_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with(COMMENT_CHAR))
}

/// One `TAG:value` token. `value` is `None` when the colon ends the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub tag: &'a str,
    pub value: Option<&'a str>,
}

/// A line split into its name field and tag tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedLine<'a> {
    pub name: &'a str,
    /// In line order; malformed tokens are kept as errors so callers can
    /// report them and carry on
    pub tokens: Vec<Result<Token<'a>, DomainError>>,
}

/// Parse a single trimmed token.
pub fn parse_token(raw: &str) -> Result<Token<'_>, DomainError> {
    match raw.find(':') {
        None => Err(DomainError::TokenWithoutColon(raw.to_string())),
        Some(0) => Err(DomainError::TokenStartsWithColon(raw.to_string())),
        Some(idx) => {
            let value = &raw[idx + 1..];
            Ok(Token {
                tag: &raw[..idx],
                value: (!value.is_empty()).then_some(value),
            })
        }
    }
}

/// Tokenize the tag section of a line (everything after the name field).
pub fn tokenize_tags(rest: &str) -> Vec<Result<Token<'_>, DomainError>> {
    rest.split(FIELD_SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(parse_token)
        .collect()
}

pub fn name_field(line: &str) -> &str {
    line.split_once(FIELD_SEPARATOR)
        .map_or(line, |(name, _)| name)
}

/// Everything after the first field separator (empty when there is none).
pub fn tag_section(line: &str) -> &str {
    line.split_once(FIELD_SEPARATOR)
        .map_or("", |(_, rest)| rest)
}

pub fn tokenize(line: &str) -> TokenizedLine<'_> {
    TokenizedLine {
        name: name_field(line),
        tokens: tokenize_tags(tag_section(line)),
    }
}

/// What a line asks the loader to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `SOURCE...` metadata line
    Source,
    Copy {
        base: &'a str,
        copy_name: &'a str,
    },
    Mod {
        key: &'a str,
        /// Text glued to the suffix inside the name field (`Key.MODHD:12`)
        inline: Option<&'a str>,
    },
    Forget {
        key: &'a str,
    },
    Definition {
        name: &'a str,
    },
}

/// Suffixes are found by substring search and only count after position 0.
fn find_suffix(name: &str, suffix: &str) -> Option<usize> {
    name.find(suffix).filter(|&idx| idx > 0)
}

pub fn classify(line: &str) -> LineKind<'_> {
    if line.starts_with(SOURCE_PREFIX) {
        return LineKind::Source;
    }
    let name = name_field(line);
    if let Some(idx) = find_suffix(name, COPY_SUFFIX) {
        let after = &name[idx + COPY_SUFFIX.len()..];
        return LineKind::Copy {
            base: &name[..idx],
            copy_name: after.strip_prefix('=').unwrap_or(after),
        };
    }
    if let Some(idx) = find_suffix(name, MOD_SUFFIX) {
        let after = name[idx + MOD_SUFFIX.len()..].trim();
        return LineKind::Mod {
            key: &name[..idx],
            inline: (!after.is_empty()).then_some(after),
        };
    }
    if let Some(idx) = find_suffix(name, FORGET_SUFFIX) {
        return LineKind::Forget { key: &name[..idx] };
    }
    LineKind::Definition { name }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_trailing_colon_when_parsing_token_then_value_is_none() {
        let token = parse_token("HD:").unwrap();
        assert_eq!(token.tag, "HD");
        assert_eq!(token.value, None);
    }

    #[test]
    fn given_value_with_colons_when_parsing_token_then_splits_at_first() {
        let token = parse_token("DESC:Note: see page 4").unwrap();
        assert_eq!(token.tag, "DESC");
        assert_eq!(token.value, Some("Note: see page 4"));
    }

    #[test]
    fn given_crlf_and_comments_when_splitting_then_keeps_numbering() {
        let content = "# header\r\nFighter\tHD:10\r\n\r\nWizard\tHD:4";
        let lines: Vec<_> = content_lines(content).collect();
        assert_eq!(lines, vec![(2, "Fighter\tHD:10"), (4, "Wizard\tHD:4")]);
    }

    #[test]
    fn given_suffix_at_start_when_classifying_then_is_definition() {
        assert_eq!(
            classify(".MODNothing\tHD:1"),
            LineKind::Definition {
                name: ".MODNothing"
            }
        );
    }
}

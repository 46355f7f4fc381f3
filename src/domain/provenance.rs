//! Source metadata: SOURCE lines and per-object provenance

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::error::DomainError;

pub const SOURCE_LONG: &str = "SOURCELONG";
pub const SOURCE_SHORT: &str = "SOURCESHORT";
pub const SOURCE_WEB: &str = "SOURCEWEB";
pub const SOURCE_PAGE: &str = "SOURCEPAGE";
pub const SOURCE_DATE: &str = "SOURCEDATE";

/// Book/page metadata attached to a domain object.
///
/// Setters mark the provenance dirty so a `.MOD` line that touches it can be
/// detected without hashing.
#[derive(Debug, Clone, Default, Eq)]
pub struct Provenance {
    pub long: Option<String>,
    pub short: Option<String>,
    pub web: Option<String>,
    pub page: Option<String>,
    pub date: Option<NaiveDate>,
    dirty: bool,
}

impl PartialEq for Provenance {
    fn eq(&self, other: &Self) -> bool {
        self.long == other.long
            && self.short == other.short
            && self.web == other.web
            && self.page == other.page
            && self.date == other.date
    }
}

impl Provenance {
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Set one field by its SOURCE key. Unknown keys are ignored.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), DomainError> {
        let value = value.trim();
        match key {
            SOURCE_LONG => self.long = Some(value.to_string()),
            SOURCE_SHORT => self.short = Some(value.to_string()),
            SOURCE_WEB => self.web = Some(value.to_string()),
            SOURCE_PAGE => self.page = Some(value.to_string()),
            SOURCE_DATE => self.date = Some(parse_source_date(value)?),
            _ => return Ok(()),
        }
        self.dirty = true;
        Ok(())
    }

    pub fn has_book(&self) -> bool {
        self.long.is_some() || self.short.is_some()
    }
}

/// Parse `YYYY-MM-DD` or `YYYY-MM` (first of month).
pub fn parse_source_date(value: &str) -> Result<NaiveDate, DomainError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d"))
        .map_err(|_| DomainError::InvalidSourceDate {
            value: value.to_string(),
        })
}

/// Metadata captured from a `SOURCE` line, active for later lines of the
/// same file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    entries: BTreeMap<String, String>,
}

impl SourceMap {
    /// Parse a tab-separated `SOURCExxx:value` line. Tokens without a colon are
    /// dropped.
    pub fn parse_line(line: &str) -> Self {
        let entries = line
            .split('\t')
            .map(str::trim)
            .filter_map(|token| token.split_once(':'))
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every entry. A malformed date fails the whole application, but
    /// fields already written stay written.
    pub fn apply_to(&self, provenance: &mut Provenance) -> Result<(), DomainError> {
        for (key, value) in &self.entries {
            provenance.set_field(key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_year_month_when_parsing_date_then_uses_first_of_month() {
        let date = parse_source_date("2003-10").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2003, 10, 1).unwrap());
    }

    #[test]
    fn given_garbage_when_parsing_date_then_errors() {
        assert!(matches!(
            parse_source_date("Oct 2003"),
            Err(DomainError::InvalidSourceDate { .. })
        ));
    }

    #[test]
    fn given_source_line_when_applied_then_fills_provenance() {
        let map = SourceMap::parse_line(
            "SOURCELONG:Player's Handbook\tSOURCESHORT:PHB\tSOURCEDATE:2000-08",
        );
        let mut prov = Provenance::default();
        map.apply_to(&mut prov).unwrap();
        assert_eq!(prov.long.as_deref(), Some("Player's Handbook"));
        assert_eq!(prov.short.as_deref(), Some("PHB"));
        assert_eq!(prov.date, NaiveDate::from_ymd_opt(2000, 8, 1));
        assert!(prov.is_dirty());
    }

    #[test]
    fn given_dirty_flag_when_comparing_then_ignored() {
        let mut a = Provenance::default();
        a.set_field(SOURCE_PAGE, "12").unwrap();
        let mut b = a.clone();
        b.clear_dirty();
        assert_eq!(a, b);
    }
}

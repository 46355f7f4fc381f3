//! TOML load plan
//!
//! Carries the caller's ordered source list to the loader. Paths are
//! expanded (`~`, `$VAR`) and resolved against the plan's directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::domain::{expand_env_vars, parse_source_date, Campaign, ObjectKind, PlannedSource, SourceEntry};
use crate::infrastructure::traits::FileSystem;
use crate::infrastructure::{InfraError, InfraResult};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPlan {
    #[serde(default, rename = "source")]
    sources: Vec<RawSource>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSource {
    kind: String,
    path: String,
    campaign: String,
    date: Option<String>,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    pub path: PathBuf,
    pub sources: Vec<PlannedSource>,
}

impl LoadPlan {
    /// Read and parse a plan file.
    pub fn read(fs: &dyn FileSystem, path: &Path) -> InfraResult<Self> {
        let content = fs
            .read_to_string(path)
            .map_err(|e| InfraError::io(format!("read load plan {}", path.display()), e))?;
        Self::parse(&content, path)
    }

    /// Parse plan text; relative source paths resolve against `path`'s parent.
    pub fn parse(content: &str, path: &Path) -> InfraResult<Self> {
        let raw: RawPlan = toml::from_str(content).map_err(|e| InfraError::manifest(path, e.to_string()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        let sources = raw
            .sources
            .into_iter()
            .map(|s| -> InfraResult<PlannedSource> {
                let kind = s
                    .kind
                    .parse::<ObjectKind>()
                    .map_err(|e| InfraError::manifest(path, e.to_string()))?;
                let campaign = match s.date.as_deref() {
                    Some(date) => {
                        let date = parse_source_date(date)
                            .map_err(|e| InfraError::manifest(path, format!("campaign {}: {e}", s.campaign)))?;
                        Campaign::dated(s.campaign, date)
                    }
                    None => Campaign::new(s.campaign),
                };
                let mut entry = SourceEntry::new(base.join(expand_env_vars(&s.path)), campaign);
                entry.include = s.include;
                entry.exclude = s.exclude;
                Ok(PlannedSource::new(kind, entry))
            })
            .collect::<InfraResult<Vec<_>>>()?;

        debug!(plan = %path.display(), sources = sources.len(), "load plan parsed");
        Ok(Self {
            path: path.to_path_buf(),
            sources,
        })
    }

    /// Directory the plan lives in (where a local config is looked up).
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn given_plan_with_relative_paths_when_parsed_then_resolved_against_plan_dir() {
        let text = r#"
[[source]]
kind = "class"
path = "core/classes.lst"
campaign = "Core"
date = "2000-08"

[[source]]
kind = "Race"
path = "/abs/races.lst"
campaign = "Core"
exclude = ["Orc"]
"#;
        let plan = LoadPlan::parse(text, Path::new("/data/plan.toml")).unwrap();

        assert_eq!(plan.sources.len(), 2);
        let first = &plan.sources[0];
        assert_eq!(first.kind, ObjectKind::Class);
        assert_eq!(first.entry.path, PathBuf::from("/data/core/classes.lst"));
        assert_eq!(first.entry.campaign.date, NaiveDate::from_ymd_opt(2000, 8, 1));
        let second = &plan.sources[1];
        assert_eq!(second.kind, ObjectKind::Race);
        assert_eq!(second.entry.path, PathBuf::from("/abs/races.lst"));
        assert_eq!(second.entry.exclude, vec!["Orc".to_string()]);
    }

    #[test]
    fn given_bad_date_when_parsed_then_manifest_error() {
        let text = r#"
[[source]]
kind = "class"
path = "a.lst"
campaign = "Core"
date = "August"
"#;
        let err = LoadPlan::parse(text, Path::new("plan.toml")).unwrap_err();
        assert!(matches!(err, InfraError::Manifest { .. }));
    }

    #[test]
    fn given_unknown_kind_when_parsed_then_manifest_error() {
        let text = r#"
[[source]]
kind = "weapon"
path = "a.lst"
campaign = "Core"
"#;
        assert!(LoadPlan::parse(text, Path::new("plan.toml")).is_err());
    }
}

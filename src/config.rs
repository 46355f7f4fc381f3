//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/lstloader/lstloader.toml`
//! 3. Local config: `<plan_dir>/.lstloader.toml` (next to the load plan)
//! 4. Environment variables: `LSTLOADER_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::LoadOptions;
use crate::application::ApplicationError;
use crate::domain::ObjectKind;

/// Raw settings for intermediate parsing.
///
/// Every field is optional so layered merging can tell "not specified"
/// (`None`) apart from an explicit value, including an explicit empty array.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub allow_override: Option<bool>,
    pub retain_duplicates: Option<Vec<String>>,
    pub warn_deprecated: Option<bool>,
}

/// Unified configuration for lstloader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Newer-dated sources replace same-key definitions from older ones
    pub allow_override: bool,
    /// Object kinds whose same-key definitions are all kept
    pub retain_duplicates: Vec<String>,
    /// Report deprecated tags as warnings
    pub warn_deprecated: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allow_override: false,
            retain_duplicates: vec!["spell".into()],
            warn_deprecated: true,
        }
    }
}

/// Get the XDG config directory for lstloader.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "lstloader").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("lstloader.toml"))
}

/// Get the path to the local config file next to a load plan.
pub fn local_config_path(plan_dir: &Path) -> PathBuf {
    plan_dir.join(".lstloader.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - Duplicates are de-duplicated
    ///
    /// # Examples
    /// ```ignore
    /// merge_array(&["spell"], &["ability"])        // → ["ability", "spell"]
    /// merge_array(&["spell"], &["!spell", "kit"])  // → ["kit"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for item in overlay {
            if let Some(negated) = item.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(item.clone());
            }
        }

        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Merge overlay config onto self (base) with union semantics for arrays.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            allow_override: overlay.allow_override.unwrap_or(self.allow_override),
            retain_duplicates: overlay
                .retain_duplicates
                .as_ref()
                .map(|o| Self::merge_array(&self.retain_duplicates, o))
                .unwrap_or_else(|| self.retain_duplicates.clone()),
            warn_deprecated: overlay.warn_deprecated.unwrap_or(self.warn_deprecated),
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            allow_override: global.allow_override.unwrap_or(self.allow_override),
            retain_duplicates: global
                .retain_duplicates
                .clone()
                .unwrap_or_else(|| self.retain_duplicates.clone()),
            warn_deprecated: global.warn_deprecated.unwrap_or(self.warn_deprecated),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `plan_dir` - Optional directory of the load plan, for local config
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE
    /// - Global → Local: UNION with `!item` negation
    /// - Any → Env vars: REPLACE
    pub fn load(plan_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = plan_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Apply LSTLOADER_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("LSTLOADER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("retain_duplicates")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_bool("allow_override") {
            settings.allow_override = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("retain_duplicates") {
            settings.retain_duplicates = val;
        }
        if let Ok(val) = config.get_bool("warn_deprecated") {
            settings.warn_deprecated = val;
        }

        Ok(settings)
    }

    /// Kinds named in `retain_duplicates`; unknown names are a config error.
    pub fn retained_kinds(&self) -> Result<HashSet<ObjectKind>, ApplicationError> {
        self.retain_duplicates
            .iter()
            .map(|name| {
                name.parse::<ObjectKind>().map_err(|e| ApplicationError::Config {
                    message: format!("retain_duplicates: {e}"),
                })
            })
            .collect()
    }

    /// Loader options derived from these settings.
    pub fn load_options(&self) -> Result<LoadOptions, ApplicationError> {
        Ok(LoadOptions {
            allow_override: self.allow_override,
            retain_duplicates: self.retained_kinds()?,
        })
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# lstloader configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/lstloader/lstloader.toml  (defines your baseline)
#   Local:  <plan_dir>/.lstloader.toml          (per data set additions)
#   Env:    LSTLOADER_* environment variables    (explicit overrides)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global. Use "!kind" to REMOVE an inherited item:
#     retain_duplicates = ["ability", "!spell"]

# Let a newer-dated source replace a same-key definition from an older one
# allow_override = false

# Object kinds whose same-key definitions are all kept
# retain_duplicates = ["spell"]

# Report deprecated tags as warnings
# warn_deprecated = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_settings_when_created_then_spells_are_retained() {
        let settings = Settings::default();
        assert!(!settings.allow_override);
        assert!(settings.warn_deprecated);
        assert_eq!(settings.retain_duplicates, vec!["spell".to_string()]);
    }

    #[test]
    fn test_merge_array_union() {
        let base = vec!["a".to_string(), "b".to_string()];
        let overlay = vec!["c".to_string()];
        let result = Settings::merge_array(&base, &overlay);

        assert_eq!(result, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_merge_array_negation() {
        let base = vec!["a".to_string(), "b".to_string()];
        let overlay = vec!["!a".to_string(), "c".to_string()];
        let result = Settings::merge_array(&base, &overlay);

        assert!(!result.contains(&"a".to_string()), "a should be removed by !a");
        assert_eq!(result, vec!["b", "c"]);
    }

    #[test]
    fn test_merge_array_negation_nonexistent() {
        let base = vec!["a".to_string(), "b".to_string()];
        let overlay = vec!["!x".to_string()];
        let result = Settings::merge_array(&base, &overlay);

        assert_eq!(result, vec!["a", "b"]);
    }

    #[test]
    fn test_merge_array_duplicates() {
        let base = vec!["a".to_string(), "b".to_string()];
        let overlay = vec!["a".to_string(), "c".to_string()];
        let result = Settings::merge_array(&base, &overlay);

        assert_eq!(result.len(), 3);
    }

    #[test]
    fn given_global_array_when_applied_then_replaces_defaults() {
        let global = RawSettings {
            retain_duplicates: Some(vec!["ability".to_string()]),
            ..Default::default()
        };
        let result = Settings::default().apply_global(&global);
        assert_eq!(result.retain_duplicates, vec!["ability".to_string()]);
        assert!(result.warn_deprecated);
    }

    #[test]
    fn given_local_scalars_when_merged_then_override_base() {
        let local = RawSettings {
            allow_override: Some(true),
            warn_deprecated: Some(false),
            retain_duplicates: None,
        };
        let result = Settings::default().merge_with(&local);
        assert!(result.allow_override);
        assert!(!result.warn_deprecated);
        assert_eq!(result.retain_duplicates, vec!["spell".to_string()]);
    }

    #[test]
    fn given_unknown_kind_when_resolving_retained_kinds_then_config_error() {
        let settings = Settings {
            retain_duplicates: vec!["spell".into(), "weapon".into()],
            ..Default::default()
        };
        assert!(matches!(
            settings.retained_kinds(),
            Err(ApplicationError::Config { .. })
        ));
    }

    #[test]
    fn given_settings_when_serialized_then_toml_contains_fields() {
        let toml = Settings::default().to_toml().unwrap();
        assert!(toml.contains("allow_override = false"));
        assert!(toml.contains("retain_duplicates"));
    }
}

//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/shortlist/shortlist.toml`
//! 3. Local config: file given with `--config` (TOML, or JSON by extension)
//! 4. Environment variables: `SHORTLIST_*` prefix

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::options::{ConstraintsConfig, EngineConfig, TradeoffsConfig, TreeSettings};
use crate::application::ApplicationError;
use crate::util::path::expand_path;

/// Output preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplaySettings {
    /// Number of ranked options to print.
    pub top: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { top: 5 }
    }
}

/// `[engine]` as written in one settings file.
///
/// `None` means the file left the key out and the lower layer shows through;
/// `Some(vec![])` is an explicit empty list.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RawEngineConfig {
    pub ignored_columns: Option<Vec<String>>,
    pub column_aliases: Option<BTreeMap<String, String>>,
    pub constraints: Option<ConstraintsConfig>,
    pub tradeoffs: Option<TradeoffsConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawTreeSettings {
    pub max_depth: Option<usize>,
    pub min_samples_split: Option<usize>,
    pub min_samples_leaf: Option<usize>,
    pub id_prefix: Option<String>,
    pub features: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDisplaySettings {
    pub top: Option<usize>,
}

/// One settings file before it is layered over the others.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub engine: RawEngineConfig,
    pub tree: RawTreeSettings,
    pub display: RawDisplaySettings,
}

/// Lay `overlay` over `base` as a set: plain entries are added, `!name`
/// removes `name`. The result is sorted and free of duplicates.
///
/// ```ignore
/// merge_array(&["notes", "sku"], &["!sku", "ports"]) // ["notes", "ports"]
/// ```
pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut merged: BTreeSet<String> = base.iter().cloned().collect();
    for entry in overlay {
        match entry.strip_prefix('!') {
            Some(removed) => {
                merged.remove(removed);
            }
            None => {
                merged.insert(entry.clone());
            }
        }
    }
    merged.into_iter().collect()
}

fn merge_engine(base: &EngineConfig, overlay: &RawEngineConfig) -> EngineConfig {
    let mut column_aliases = base.column_aliases.clone();
    if let Some(aliases) = &overlay.column_aliases {
        column_aliases.extend(aliases.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    EngineConfig {
        ignored_columns: overlay
            .ignored_columns
            .as_ref()
            .map(|o| merge_array(&base.ignored_columns, o))
            .unwrap_or_else(|| base.ignored_columns.clone()),
        column_aliases,
        constraints: overlay
            .constraints
            .clone()
            .unwrap_or_else(|| base.constraints.clone()),
        tradeoffs: overlay
            .tradeoffs
            .clone()
            .unwrap_or_else(|| base.tradeoffs.clone()),
    }
}

fn apply_global_engine(base: &EngineConfig, global: &RawEngineConfig) -> EngineConfig {
    EngineConfig {
        ignored_columns: global
            .ignored_columns
            .clone()
            .unwrap_or_else(|| base.ignored_columns.clone()),
        column_aliases: global
            .column_aliases
            .clone()
            .unwrap_or_else(|| base.column_aliases.clone()),
        constraints: global
            .constraints
            .clone()
            .unwrap_or_else(|| base.constraints.clone()),
        tradeoffs: global
            .tradeoffs
            .clone()
            .unwrap_or_else(|| base.tradeoffs.clone()),
    }
}

fn merge_tree(base: &TreeSettings, overlay: &RawTreeSettings) -> TreeSettings {
    TreeSettings {
        max_depth: overlay.max_depth.unwrap_or(base.max_depth),
        min_samples_split: overlay.min_samples_split.unwrap_or(base.min_samples_split),
        min_samples_leaf: overlay.min_samples_leaf.unwrap_or(base.min_samples_leaf),
        id_prefix: overlay
            .id_prefix
            .clone()
            .unwrap_or_else(|| base.id_prefix.clone()),
        features: overlay.features.clone().or_else(|| base.features.clone()),
    }
}

/// Unified configuration for shortlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    /// Filtering and scoring configuration
    pub engine: EngineConfig,
    /// Regression tree parameters
    pub tree: TreeSettings,
    /// Output preferences
    pub display: DisplaySettings,
}

/// Per-user config directory, e.g. `~/.config/shortlist`.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "shortlist").map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("shortlist.toml"))
}

/// Parse one settings file; `.json` files as JSON, anything else as TOML.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let fail = |action: &str, e: &dyn std::fmt::Display| ApplicationError::Config {
        message: format!("{} {}: {}", action, path.display(), e),
    };
    let content = std::fs::read_to_string(path).map_err(|e| fail("read", &e))?;
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    {
        serde_json::from_str(&content).map_err(|e| fail("parse", &e))
    } else {
        toml::from_str(&content).map_err(|e| fail("parse", &e))
    }
}

impl Settings {
    /// Layer a local settings file over `self`.
    ///
    /// Scalars the file sets win. `ignoredColumns` goes through [`merge_array`],
    /// `columnAliases` entries are added to the inherited map, and the
    /// `constraints`, `tradeoffs` and `tree.features` sections replace what
    /// was inherited.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            engine: merge_engine(&self.engine, &overlay.engine),
            tree: merge_tree(&self.tree, &overlay.tree),
            display: DisplaySettings {
                top: overlay.display.top.unwrap_or(self.display.top),
            },
        }
    }

    /// Layer the global settings file over the compiled defaults.
    ///
    /// Every list and map the global file sets replaces the default outright.
    pub fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            engine: apply_global_engine(&self.engine, &global.engine),
            tree: merge_tree(&self.tree, &global.tree),
            display: DisplaySettings {
                top: global.display.top.unwrap_or(self.display.top),
            },
        }
    }

    /// Resolve settings from every layer, lowest precedence first: compiled
    /// defaults, the global file, the `--config` file, then `SHORTLIST_*`
    /// environment variables.
    ///
    /// A global file is optional; a `--config` file that does not exist is an error.
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut settings = Self::default();

        if let Some(global) = global_config_path().filter(|p| p.is_file()) {
            settings = settings.apply_global(&load_raw_settings(&global)?);
        }

        if let Some(path) = local {
            let path = expand_path(path);
            if !path.is_file() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            settings = settings.merge_with(&load_raw_settings(&path)?);
        }

        Self::apply_env_overrides(settings)
    }

    /// `SHORTLIST_<SECTION>__<KEY>` variables replace whatever the files set,
    /// e.g. `SHORTLIST_TREE__MAX_DEPTH=6` or `SHORTLIST_ENGINE__IGNORED_COLUMNS=notes,sku`.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let env = Config::builder()
            .add_source(
                Environment::with_prefix("SHORTLIST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("engine.ignored_columns")
                    .with_list_parse_key("tree.features"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(value) = env.get::<usize>("tree.max_depth") {
            settings.tree.max_depth = value;
        }
        if let Ok(value) = env.get::<usize>("tree.min_samples_split") {
            settings.tree.min_samples_split = value;
        }
        if let Ok(value) = env.get::<usize>("tree.min_samples_leaf") {
            settings.tree.min_samples_leaf = value;
        }
        if let Ok(value) = env.get_string("tree.id_prefix") {
            settings.tree.id_prefix = value;
        }
        if let Ok(value) = env.get::<Vec<String>>("tree.features") {
            settings.tree.features = Some(value);
        }
        if let Ok(value) = env.get::<usize>("display.top") {
            settings.display.top = value;
        }
        if let Ok(value) = env.get::<Vec<String>>("engine.ignored_columns") {
            settings.engine.ignored_columns = value;
        }

        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Commented example settings file.
    pub fn template() -> String {
        r#"# shortlist configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/shortlist/shortlist.toml  (defines your baseline)
#   Local:  shortlist run --config <file>        (per-dataset additions)
#   Env:    SHORTLIST_* environment variables    (explicit overrides)
#           e.g. SHORTLIST_TREE__MAX_DEPTH=6
#
# Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local ignoredColumns UNION with global; "!name" removes an inherited entry.
#   Local columnAliases extend global; local constraints/tradeoffs replace them.

[engine]
# Columns never filtered, scored or split on
# ignoredColumns = ["notes"]

[engine.columnAliases]
# price = "price_inr"
# battery = "battery_hours"

[engine.constraints]
# Only these columns are filtered (takes precedence over excludeColumns)
# includeColumns = ["category", "ram_gb", "price_inr"]
# excludeColumns = ["name"]

[engine.constraints.defaults.numeric]
# Bound numeric columns by their observed range
# useDatasetRange = false
# min = 0
# max = 1000000

[engine.constraints.defaults.categorical]
# includes = []
# exact = false

# [engine.constraints.overrides.price]
# max = 150000

# [engine.constraints.overrides.category]
# includes = ["laptop"]
# exact = true

[engine.tradeoffs]
# Columns to score on, in contribution order
# selected = ["battery_hours", "ram_gb", "price"]

[engine.tradeoffs.defaults]
# weight = 1.0
# direction = "higher_is_better"

# [engine.tradeoffs.overrides.price]
# weight = 2.0
# direction = "lower_is_better"

[tree]
# max_depth = 4
# min_samples_split = 4
# min_samples_leaf = 2
# id_prefix = "cart"
# features = ["chip", "ram_gb", "price_inr"]

[display]
# top = 5
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

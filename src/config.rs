//! # Config Module
//!
//! Resolves the JSON configuration file into a fully populated [`Settings`]
//! value. Resolution happens once, before rendering; everything downstream
//! reads `Settings` fields directly without further fallbacks.
//!
//! ## Merge rules
//!
//! The user file is merged over the built-in defaults:
//! - top-level keys in the file replace the default value,
//! - when both sides hold an object, the two are merged one level deep
//!   (keys of the file's object win, nested objects inside it replace wholesale),
//! - arrays replace wholesale,
//! - `null` keeps the default.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Project-local config file, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".claude-limitline.json";
/// User-global config file, looked up in `~/.claude/`.
pub const USER_CONFIG_FILE: &str = "claude-limitline.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("config does not match the settings schema: {0}")]
    Schema(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStyle {
    #[default]
    Powerline,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompactMode {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarStyle {
    #[default]
    Text,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Simple,
    Smart,
}

/// Segments that can appear in `segmentOrder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Directory,
    Git,
    Model,
    Block,
    Weekly,
    Context,
}

impl SegmentKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "directory" => Some(Self::Directory),
            "git" => Some(Self::Git),
            "model" => Some(Self::Model),
            "block" => Some(Self::Block),
            "weekly" => Some(Self::Weekly),
            "context" => Some(Self::Context),
            _ => None,
        }
    }
}

/// Unknown keywords fall back to the field's default instead of rejecting the
/// whole file.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplaySettings {
    #[serde(deserialize_with = "lenient")]
    pub style: LayoutStyle,
    /// Glyph mode: Nerd Font symbols and the powerline layout
    pub use_nerd_fonts: bool,
    #[serde(deserialize_with = "lenient")]
    pub compact_mode: CompactMode,
    /// Terminal width below which `auto` switches to compact rendering
    pub compact_width: u16,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            style: LayoutStyle::Powerline,
            use_nerd_fonts: true,
            compact_mode: CompactMode::Auto,
            compact_width: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToggleSettings {
    pub enabled: bool,
}

impl Default for ToggleSettings {
    fn default() -> Self {
        ToggleSettings { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlockSettings {
    pub enabled: bool,
    #[serde(deserialize_with = "lenient")]
    pub display_style: BarStyle,
    pub bar_width: usize,
    pub show_time_remaining: bool,
}

impl Default for BlockSettings {
    fn default() -> Self {
        BlockSettings {
            enabled: true,
            display_style: BarStyle::Text,
            bar_width: DEFAULT_BAR_WIDTH,
            show_time_remaining: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeeklySettings {
    pub enabled: bool,
    #[serde(deserialize_with = "lenient")]
    pub display_style: BarStyle,
    pub bar_width: usize,
    pub show_week_progress: bool,
    #[serde(deserialize_with = "lenient")]
    pub view_mode: ViewMode,
}

impl Default for WeeklySettings {
    fn default() -> Self {
        WeeklySettings {
            enabled: true,
            display_style: BarStyle::Text,
            bar_width: DEFAULT_BAR_WIDTH,
            show_week_progress: true,
            view_mode: ViewMode::Simple,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BudgetSettings {
    /// Minutes a fetched snapshot stays fresh
    pub poll_interval: u32,
    /// Percent at which usage segments switch to the warning palette
    pub warning_threshold: f64,
    /// Weekly reset day for the schedule estimate, 0 = Sunday
    pub reset_day: Option<u8>,
    pub reset_hour: Option<u8>,
    pub reset_minute: Option<u8>,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        BudgetSettings {
            poll_interval: 15,
            warning_threshold: 80.0,
            reset_day: None,
            reset_hour: None,
            reset_minute: None,
        }
    }
}

pub const DEFAULT_BAR_WIDTH: usize = 10;
pub const MAX_BAR_WIDTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub display: DisplaySettings,
    pub directory: ToggleSettings,
    pub git: ToggleSettings,
    pub model: ToggleSettings,
    pub block: BlockSettings,
    pub weekly: WeeklySettings,
    pub context: ToggleSettings,
    pub budget: BudgetSettings,
    pub theme: String,
    pub segment_order: Vec<String>,
    pub show_trend: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            display: DisplaySettings::default(),
            directory: ToggleSettings::default(),
            git: ToggleSettings::default(),
            model: ToggleSettings::default(),
            block: BlockSettings::default(),
            weekly: WeeklySettings::default(),
            context: ToggleSettings::default(),
            budget: BudgetSettings::default(),
            theme: "dark".to_string(),
            segment_order: ["directory", "git", "model", "block", "weekly"]
                .into_iter()
                .map(String::from)
                .collect(),
            show_trend: true,
        }
    }
}

impl Settings {
    /// Segment kinds in display order; unknown names are dropped.
    pub fn segments(&self) -> Vec<SegmentKind> {
        self.segment_order
            .iter()
            .filter_map(|name| {
                let kind = SegmentKind::parse(name);
                if kind.is_none() {
                    debug!(%name, "ignoring unknown segment");
                }
                kind
            })
            .collect()
    }

    /// Replace out-of-range values with their defaults.
    fn validated(mut self) -> Self {
        self.block.bar_width = bar_width(self.block.bar_width);
        self.weekly.bar_width = bar_width(self.weekly.bar_width);
        if !self.budget.warning_threshold.is_finite() {
            self.budget.warning_threshold = BudgetSettings::default().warning_threshold;
        }
        self.budget.reset_day = self.budget.reset_day.filter(|d| *d <= 6);
        self.budget.reset_hour = self.budget.reset_hour.filter(|h| *h <= 23);
        self.budget.reset_minute = self.budget.reset_minute.filter(|m| *m <= 59);
        self
    }
}

fn bar_width(width: usize) -> usize {
    match width {
        0 => DEFAULT_BAR_WIDTH,
        w => w.min(MAX_BAR_WIDTH),
    }
}

/// Merge `overrides` over `defaults` following the module-level rules.
pub fn merge_values(defaults: Value, overrides: Value) -> Value {
    let (Value::Object(mut result), Value::Object(overrides)) = (defaults, overrides) else {
        return Value::Null;
    };
    for (key, source) in overrides {
        if source.is_null() {
            continue;
        }
        let merged = match (result.remove(&key), source) {
            (Some(Value::Object(mut target)), Value::Object(source)) => {
                for (inner_key, inner_value) in source {
                    if !inner_value.is_null() {
                        target.insert(inner_key, inner_value);
                    }
                }
                Value::Object(target)
            }
            (_, source) => source,
        };
        result.insert(key, merged);
    }
    Value::Object(result)
}

/// Build settings from a parsed user config object.
pub fn resolve(overrides: Value) -> Result<Settings, ConfigError> {
    let defaults = serde_json::to_value(Settings::default())?;
    let merged = match overrides {
        Value::Object(_) => merge_values(defaults, overrides),
        _ => defaults,
    };
    let settings: Settings = serde_json::from_value(merged)?;
    Ok(settings.validated())
}

/// Read and resolve one config file.
pub fn load_file(path: &Path) -> Result<Settings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let overrides: Value = serde_json::from_str(&content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    resolve(overrides)
}

/// Config files in lookup order: an explicit path if given, otherwise the
/// project-local file and then the user-global one.
pub fn candidate_paths(explicit: Option<&Path>, cwd: Option<&Path>) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.to_path_buf()];
    }
    let mut paths = Vec::new();
    if let Some(dir) = cwd {
        paths.push(dir.join(PROJECT_CONFIG_FILE));
    }
    if let Some(b) = directories::BaseDirs::new() {
        paths.push(b.home_dir().join(".claude").join(USER_CONFIG_FILE));
    }
    paths
}

/// First existing config that loads cleanly wins; defaults otherwise.
pub fn load_settings(paths: &[PathBuf]) -> Settings {
    for path in paths {
        if !path.exists() {
            continue;
        }
        match load_file(path) {
            Ok(settings) => {
                debug!(path = %path.display(), "loaded config");
                return settings;
            }
            Err(err) => debug!(error = %err, "failed to load config"),
        }
    }
    debug!("using default config");
    Settings::default()
}

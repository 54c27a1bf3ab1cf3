//! Optional TOML defaults file.
//!
//! Loaded from `--config PATH`, else `<config dir>/termplot/config.toml`.
//! Every section uses `#[serde(default)]` so a minimal or empty file is
//! valid. Command-line values always win over file values.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use super::BackendKind;

/// Top-level defaults file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileDefaults {
    /// Rendering defaults.
    #[serde(default)]
    pub display: DisplayDefaults,

    /// Follow-mode timing.
    #[serde(default)]
    pub refresh: RefreshDefaults,

    /// Log file location.
    #[serde(default)]
    pub logging: LoggingDefaults,
}

/// `[display]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayDefaults {
    /// Backend used when `--backend` is not given.
    #[serde(default)]
    pub backend: Option<BackendKind>,

    /// Enable the dark theme.
    #[serde(default)]
    pub dark_theme: bool,

    /// Canvas color name or `#rrggbb`.
    #[serde(default)]
    pub canvas_color: Option<String>,

    /// Axes color name or `#rrggbb`.
    #[serde(default)]
    pub axes_color: Option<String>,

    /// Ticks color name or `#rrggbb`.
    #[serde(default)]
    pub ticks_color: Option<String>,

    /// Draw grid lines.
    #[serde(default)]
    pub grid: bool,

    /// Strip all colors.
    #[serde(default)]
    pub colorless: bool,
}

/// `[refresh]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshDefaults {
    /// Seconds between redraws in follow mode.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
}

impl Default for RefreshDefaults {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingDefaults {
    /// Directory for rotated JSON logs; console only when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_interval_secs() -> f64 {
    5.0
}

/// Load defaults from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_file_defaults(path: &Path) -> anyhow::Result<FileDefaults> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let defaults: FileDefaults = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config at {}", path.display()))?;
    Ok(defaults)
}

/// Default location of the defaults file, if a config directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "termplot")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load `explicit` if given, else the default location when that file exists.
///
/// A missing default file yields [`FileDefaults::default`]; a missing
/// explicit file is an error.
///
/// # Errors
///
/// Returns an error if a file that should be read cannot be read or parsed.
pub fn resolve_file_defaults(explicit: Option<&Path>) -> anyhow::Result<FileDefaults> {
    if let Some(path) = explicit {
        return load_file_defaults(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => load_file_defaults(&path),
        _ => Ok(FileDefaults::default()),
    }
}

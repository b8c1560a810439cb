//! Site configuration module.
//!
//! Handles loading, validating, and merging the site's `config.toml`. Stock
//! defaults are serialized to a TOML table and the user's file is merged on
//! top, so the file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── config.toml              # Optional, all keys optional
//! └── pages/                   # content_root: the tree pages are resolved from
//!     ├── menu1/
//!     │   ├── meta.json
//!     │   └── article1/
//!     │       ├── meta.json
//!     │       └── article.md
//!     └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! content_root = "pages"    # Directory holding the content tree
//!
//! [files]
//! meta = "meta.json"        # Per-directory metadata descriptor
//! article = "article.md"    # Markdown body; its presence makes an article
//!
//! [render]
//! heading_offset = 1        # Added to every heading level (h1 -> h2)
//! tables = true             # Pipe tables in markdown
//!
//! [processing]
//! max_threads = 4           # Cap for parallel directory listing (omit for auto)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the site root.
pub const CONFIG_FILE: &str = "config.toml";

/// Deepest heading level markdown can produce.
const MAX_HEADING_OFFSET: u8 = 5;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory, relative to the site root, that holds the content tree.
    pub content_root: String,
    /// Names of the per-entry files.
    pub files: FilesConfig,
    /// Markdown rendering settings.
    pub render: RenderConfig,
    /// Parallel listing settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_root: "pages".to_string(),
            files: FilesConfig::default(),
            render: RenderConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.heading_offset > MAX_HEADING_OFFSET {
            return Err(ConfigError::Validation(format!(
                "render.heading_offset must be 0-{MAX_HEADING_OFFSET}"
            )));
        }
        for (key, name) in [("files.meta", &self.files.meta), ("files.article", &self.files.article)] {
            if name.is_empty() || name.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a plain file name"
                )));
            }
        }
        if self.files.meta == self.files.article {
            return Err(ConfigError::Validation(
                "files.meta and files.article must differ".into(),
            ));
        }
        Ok(())
    }
}

/// Per-entry file names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    pub meta: String,
    pub article: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            meta: "meta.json".to_string(),
            article: "article.md".to_string(),
        }
    }
}

/// Markdown rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Levels added to every heading, capped at h6. The default of one
    /// leaves h1 to the page chrome.
    pub heading_offset: u8,
    /// Enable pipe tables.
    pub tables: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            heading_offset: 1,
            tables: true,
        }
    }
}

/// Parallel listing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of threads used to list ancestor directories.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least one
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_threads
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the site root.
pub fn load_config(site_root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(site_root)?;
    resolve_config(base, overlay)
}

/// A fully-commented stock `config.toml`, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# dirpage configuration
# =====================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Directory (relative to this file) holding the content tree.
content_root = "pages"

# ---------------------------------------------------------------------------
# Per-entry files
# ---------------------------------------------------------------------------
[files]
# JSON descriptor every content directory must carry.
meta = "meta.json"

# Markdown body. A directory with this file is an article, without it a menu.
article = "article.md"

# ---------------------------------------------------------------------------
# Markdown rendering
# ---------------------------------------------------------------------------
[render]
# Added to every heading level, capped at h6. 1 keeps <h1> for the page title.
heading_offset = 1

# Pipe tables (| a | b |).
tables = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Threads used to list ancestor directories in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        SiteConfig::default().validate().unwrap();
    }

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(load_config(tmp.path()).unwrap(), SiteConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_its_keys() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "[render]\nheading_offset = 2\n",
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.render.heading_offset, 2);
        assert!(config.render.tables);
        assert_eq!(config.files.meta, "meta.json");
        assert_eq!(config.content_root, "pages");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[render]\nheadings = 2\n").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn heading_offset_is_bounded() {
        let mut config = SiteConfig::default();
        config.render.heading_offset = 6;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn file_names_must_be_plain_and_distinct() {
        let mut config = SiteConfig::default();
        config.files.article = "body/article.md".into();
        assert!(config.validate().is_err());

        let mut config = SiteConfig::default();
        config.files.article = config.files.meta.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn merge_keeps_base_keys_missing_from_overlay() {
        let base: toml::Value = toml::from_str("a = 1\n[t]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[t]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["t"]["x"].as_integer(), Some(1));
        assert_eq!(merged["t"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(stock_defaults_value().unwrap(), Some(value)).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn effective_threads_clamps_to_cores() {
        let cores = std::thread::available_parallelism().unwrap().get();
        let capped = ProcessingConfig {
            max_threads: Some(cores + 10),
        };
        assert_eq!(effective_threads(&capped), cores);
        let zero = ProcessingConfig {
            max_threads: Some(0),
        };
        assert_eq!(effective_threads(&zero), 1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }
}

//! triagectl configuration
//!
//! Configuration lives in `<config dir>/triagectl/config.toml`. Every field
//! has a default, so a missing file or section is not an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::build::BuildLevel;
use crate::columns::ColumnKey;
use crate::compare::CompareMode;
use crate::error::{TriageError, TriageResult};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "TRIAGECTL_CONFIG";
const CONFIG_DIR: &str = "triagectl";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL the endpoint paths are joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Row ceiling for search and count (valid: 1-10000)
    #[serde(default = "default_max_number")]
    pub max_number: usize,

    /// Group ceiling (valid: 1-100)
    #[serde(default = "default_max_groups")]
    pub max_groups: usize,

    #[serde(default = "default_active_field")]
    pub active_field: ColumnKey,

    #[serde(default)]
    pub compare: CompareMode,

    #[serde(default)]
    pub build_level: BuildLevel,

    #[serde(default = "default_show_build_result")]
    pub show_build_result: bool,
}

fn default_max_number() -> usize {
    100
}

fn default_max_groups() -> usize {
    6
}

fn default_active_field() -> ColumnKey {
    ColumnKey::ShortMsg
}

fn default_show_build_result() -> bool {
    true
}

impl ViewConfig {
    pub fn effective_max_number(&self) -> usize {
        self.max_number.clamp(1, 10_000)
    }

    pub fn effective_max_groups(&self) -> usize {
        self.max_groups.clamp(1, 100)
    }

    /// Non-groupable columns fall back to the default field
    pub fn effective_active_field(&self) -> ColumnKey {
        if self.active_field.is_groupable() {
            self.active_field
        } else {
            default_active_field()
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            max_number: default_max_number(),
            max_groups: default_max_groups(),
            active_field: default_active_field(),
            compare: CompareMode::default(),
            build_level: BuildLevel::default(),
            show_build_result: default_show_build_result(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl TriageConfig {
    /// Discover the config path with fallback chain
    ///
    /// Priority:
    /// 1. Explicit --config flag
    /// 2. $TRIAGECTL_CONFIG
    /// 3. <config dir>/triagectl/config.toml
    pub fn discover_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from the discovered path; defaults when nothing is there
    pub fn load(explicit: Option<&Path>) -> TriageResult<Self> {
        match Self::discover_path(explicit) {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> TriageResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| TriageError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> TriageResult<Self> {
        toml::from_str(content).map_err(|e| TriageError::Config(e.to_string()))
    }

    pub fn save_to(&self, path: &Path) -> TriageResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| TriageError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}

//! Checker settings.
//!
//! Settings may come from a JSON or YAML file; the CLI layers its flags on top.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::exports::default_registry_path;
use crate::ConfigError;

/// File name suffix of applet build outputs.
pub const DEFAULT_APPLET_SUFFIX: &str = ".app.elf";

/// Per-binary parse budget.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Serializable checker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Trusted export definition. `None` means the registry under the kernel root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exports: Option<PathBuf>,
    /// Directory inputs expand to entries ending in this suffix.
    pub applet_suffix: String,
    /// Worker threads; `1` checks sequentially.
    pub jobs: usize,
    /// Wall-clock parse budget per binary, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            exports: None,
            applet_suffix: DEFAULT_APPLET_SUFFIX.to_string(),
            jobs: 1,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl CheckConfig {
    /// Load settings from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let settings_error =
            |message: String| ConfigError::Settings { path: path.to_path_buf(), message };

        let ext = path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&text).map_err(|e| settings_error(e.to_string()))
            }
            _ => serde_json::from_str(&text).map_err(|e| settings_error(e.to_string())),
        }
    }

    /// Export source to load, resolving the default against `kernel_root`.
    pub fn exports_path(&self, kernel_root: &Path) -> PathBuf {
        self.exports.clone().unwrap_or_else(|| default_registry_path(kernel_root))
    }

    /// Reject settings that would fail every binary regardless of content.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                setting: "timeout_ms",
                message: "the per-binary parse timeout must be at least 1ms".to_string(),
            });
        }
        if self.applet_suffix.is_empty() {
            return Err(ConfigError::Invalid {
                setting: "applet_suffix",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

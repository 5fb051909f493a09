pub mod commands;
pub mod logging;

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Exit status used when the kernel export table cannot be loaded.
pub const CONFIG_ERROR_EXIT: u8 = 3;

/// Exit status for failures unrelated to applet conformance (e.g. broken stdout).
pub const INTERNAL_ERROR_EXIT: u8 = 4;

/// Absolute form of the kernel source root.
///
/// A root that does not exist still yields an absolute path; the export loader
/// then reports the missing registry under it.
pub fn resolve_kernel_root(root: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = root.canonicalize() {
        return Ok(canonical);
    }
    let cwd = env::current_dir().context("Failed to get current directory")?;
    Ok(cwd.join(root))
}

/// True when `err` was caused by an unusable export table or checker config.
pub fn is_config_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<applet_check_core::ConfigError>())
}

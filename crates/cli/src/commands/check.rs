use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use applet_check_core::batch::{expand_inputs, run_batch, BatchOptions, BatchReport, BatchStatus};
use applet_check_core::config::CheckConfig;
use applet_check_core::exports::ExportTable;

use crate::resolve_kernel_root;
use crate::commands::report::{write_json_report, write_text_report};

/// Inputs for [`check_command`], already separated from CLI parsing.
#[derive(Debug, Clone, Default)]
pub struct CheckArgs {
    /// Applet images or build directories.
    pub paths: Vec<PathBuf>,
    /// Kernel source root used to locate the default export registry.
    pub kernel_root: PathBuf,
    /// Optional settings file (JSON or YAML).
    pub config: Option<PathBuf>,
    pub exports: Option<PathBuf>,
    pub suffix: Option<String>,
    pub jobs: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub json: bool,
}

/// Resolve settings: file first, then flag overrides.
pub fn resolve_config(args: &CheckArgs) -> Result<CheckConfig> {
    let mut config = match &args.config {
        Some(path) => CheckConfig::load(path)
            .with_context(|| format!("Failed to load checker config {}", path.display()))?,
        None => CheckConfig::default(),
    };
    if let Some(exports) = &args.exports {
        config.exports = Some(exports.clone());
    }
    if let Some(suffix) = &args.suffix {
        config.applet_suffix = suffix.clone();
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    config.validate()?;
    Ok(config)
}

/// Load the trusted export table named by `config`.
pub fn load_exports(config: &CheckConfig, kernel_root: &Path) -> Result<ExportTable> {
    let root = resolve_kernel_root(kernel_root)?;
    let path = config.exports_path(&root);
    ExportTable::load(&path)
        .with_context(|| format!("Failed to load kernel export table from {}", path.display()))
}

/// Check every applet named by `args`, writing to stdout/stderr.
pub fn check_command(args: &CheckArgs) -> Result<BatchStatus> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    check_command_to(args, &mut stdout.lock(), &mut stderr.lock())
}

/// Same as [`check_command`] with explicit output streams.
///
/// Pass lines go to `out`, failure blocks to `diag`. In JSON mode the whole
/// report goes to `out`.
pub fn check_command_to(
    args: &CheckArgs,
    out: &mut dyn Write,
    diag: &mut dyn Write,
) -> Result<BatchStatus> {
    let config = resolve_config(args)?;
    // Loaded before any binary is touched; a bad table aborts the run here.
    let exports = load_exports(&config, &args.kernel_root)?;

    let expansion = expand_inputs(&args.paths, &config.applet_suffix);
    let options = BatchOptions { jobs: config.jobs, timeout: config.timeout() };
    let outcomes = run_batch(&expansion.candidates, &exports, options);
    let report = BatchReport::new(&outcomes, expansion.empty_inputs);

    log::info!(
        "checked {} applets: {} passed, {} failed",
        report.summary.checked,
        report.summary.passed,
        report.summary.failed
    );

    if args.json {
        write_json_report(&report, out)?;
    } else {
        write_text_report(&outcomes, &report.summary, out, diag)?;
    }

    Ok(report.summary.status)
}

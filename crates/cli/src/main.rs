use std::path::PathBuf;
use std::process::ExitCode;

use applet_check::commands::{check_command, list_exports_command, CheckArgs};
use applet_check::{is_config_error, logging, CONFIG_ERROR_EXIT, INTERNAL_ERROR_EXIT};
use clap::{ArgAction, Parser};

/// Loader ABI conformance checker for Magnolia ELF applets.
///
/// Each applet must be a shared object with a non-zero entry point, use only
/// relocation kinds the kernel loader implements for its architecture, and
/// import only symbols the kernel exports.
///
/// Exit status: 0 all passed, 1 some applet failed, 2 no applets found,
/// 3 the kernel export table could not be loaded, 4 any other error.
#[derive(Parser, Debug)]
#[command(name = "applet-check", version)]
struct Cli {
    /// ELF file(s) or build directories containing `*.app.elf` outputs.
    #[arg(required_unless_present = "list_exports")]
    paths: Vec<PathBuf>,

    /// Kernel source root; the export registry is looked up beneath it.
    #[arg(long, default_value = ".")]
    kernel_root: PathBuf,

    /// Export table source (kernel C registry, or a .json/.yaml manifest).
    #[arg(long)]
    exports: Option<PathBuf>,

    /// Checker settings file (JSON or YAML). Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// File name suffix selected when expanding directories.
    #[arg(long)]
    suffix: Option<String>,

    /// Number of binaries checked in parallel.
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Per-binary parse timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Emit a JSON report on stdout instead of text lines.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Print the kernel export table and exit.
    #[arg(long, default_value_t = false)]
    list_exports: bool,

    /// More log output on stderr (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, default_value_t = false, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(logging::level_for(cli.verbose, cli.quiet));

    let args = CheckArgs {
        paths: cli.paths,
        kernel_root: cli.kernel_root,
        config: cli.config,
        exports: cli.exports,
        suffix: cli.suffix,
        jobs: cli.jobs,
        timeout_ms: cli.timeout_ms,
        json: cli.json,
    };

    let result = if cli.list_exports {
        list_exports_command(&args).map(|()| 0)
    } else {
        check_command(&args).map(|status| status.exit_code())
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            if is_config_error(&err) {
                ExitCode::from(CONFIG_ERROR_EXIT)
            } else {
                ExitCode::from(INTERNAL_ERROR_EXIT)
            }
        }
    }
}

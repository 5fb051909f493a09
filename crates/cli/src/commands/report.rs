use std::io::Write;

use anyhow::{Context, Result};
use applet_check_core::batch::{BatchReport, BatchResult, BatchStatus, BinaryOutcome};

/// Indent used for the lines under a `[FAIL]` header.
const DETAIL_INDENT: &str = "       ";

/// Human-readable report: one `[OK]` line per passing binary on `out`, one
/// block per failing binary on `diag`.
pub fn write_text_report(
    outcomes: &[BinaryOutcome],
    summary: &BatchResult,
    out: &mut dyn Write,
    diag: &mut dyn Write,
) -> Result<()> {
    if summary.status == BatchStatus::NoCandidates {
        writeln!(diag, "No ELF files found.")?;
        return Ok(());
    }

    for outcome in outcomes {
        if outcome.passed() {
            writeln!(out, "[OK]   {}", outcome.path.display())?;
            continue;
        }

        writeln!(diag, "[FAIL] {}", outcome.path.display())?;
        if let Some(binary) = &outcome.binary {
            writeln!(
                diag,
                "{DETAIL_INDENT}Machine={} Arch={} Type={} Entry={:#x}",
                binary.machine, binary.architecture, binary.object_kind, binary.entry_address
            )?;
        }
        for diagnostic in outcome.verdict.diagnostics() {
            writeln!(diag, "{DETAIL_INDENT}- {diagnostic}")?;
        }
    }

    Ok(())
}

/// Whole report as pretty JSON.
pub fn write_json_report(report: &BatchReport, out: &mut dyn Write) -> Result<()> {
    let serialized =
        serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")?;
    writeln!(out, "{serialized}")?;
    Ok(())
}

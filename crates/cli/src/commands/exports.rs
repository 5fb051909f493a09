use std::io::{self, Write};

use anyhow::Result;

use crate::commands::check::{load_exports, resolve_config, CheckArgs};

/// Print the resolved kernel export table, one name per line, sorted.
pub fn list_exports_command(args: &CheckArgs) -> Result<()> {
    let stdout = io::stdout();
    list_exports_to(args, &mut stdout.lock())
}

pub fn list_exports_to(args: &CheckArgs, out: &mut dyn Write) -> Result<()> {
    let config = resolve_config(args)?;
    let exports = load_exports(&config, &args.kernel_root)?;

    if args.json {
        let names: Vec<&str> = exports.iter().collect();
        let manifest = serde_json::json!({ "symbols": names });
        writeln!(out, "{}", serde_json::to_string_pretty(&manifest)?)?;
        return Ok(());
    }

    for name in exports.iter() {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

//! applet-check-core
//!
//! Pre-flight checker for applets loaded by the Magnolia kernel's minimal ELF
//! loader.
//!
//! The loader supports a fixed handful of relocation kinds per CPU family and
//! resolves imports against one kernel-owned export table. This crate rejects,
//! ahead of deployment, any applet image the loader could not actually load:
//! - `arch`: target architectures and the loader's relocation allow-sets.
//! - `exports`: the trusted kernel export table.
//! - `reader`: extraction of header, relocations and imports from an ELF image.
//! - `check`: the four conformance rules, producing a `Verdict`.
//! - `batch`: input expansion, (optionally parallel) checking and aggregation.
//! - `config`: checker settings.
//!
//! All substantive logic lives here so it can be tested without the CLI.

pub mod arch;
pub mod batch;
pub mod check;
pub mod config;
mod error;
pub mod exports;
pub mod reader;

pub use error::{ConfigError, ParseError};

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

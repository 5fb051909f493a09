//! The kernel's export table: symbol names the applet loader can resolve.
//!
//! The table is owned by the kernel, not by this crate. Two source shapes are
//! understood:
//! - a machine-readable manifest (`.json`, `.yaml`/`.yml`) of the form
//!   `{ "symbols": ["memcpy", ...] }`;
//! - the kernel's C symbol registry, scraped between the table declaration and
//!   its `M_ELFSYM_END` terminator.
//!
//! A missing marker is a [`ConfigError`], never an empty table.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Declaration that opens the exported symbol table in the kernel registry.
pub const TABLE_START_MARKER: &str = "static const struct m_elfsym g_kernel_libc_syms[]";

/// Terminator row of the kernel symbol table.
pub const TABLE_END_MARKER: &str = "M_ELFSYM_END";

const EXPORT_DIRECTIVE: &str = "M_ELFSYM_EXPORT(";

/// Location of the registry relative to the kernel source root.
pub const DEFAULT_REGISTRY_PATH: &str = "main/kernel/core/elf/m_elf_symbol.c";

/// Immutable set of exported symbol names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTable {
    symbols: BTreeSet<String>,
}

/// Manifest shape shared by the JSON and YAML sources.
#[derive(Debug, Deserialize)]
struct ExportManifest {
    symbols: Vec<String>,
}

impl ExportTable {
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Exported names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    /// Load from `path`, choosing the parser by file extension.
    ///
    /// Manifests must be valid UTF-8; the C registry is decoded lossily.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

        let ext = path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase());
        let table = match ext.as_deref() {
            Some("json") => Self::from_json(manifest_text(&bytes, path)?, path)?,
            Some("yaml") | Some("yml") => Self::from_yaml(manifest_text(&bytes, path)?, path)?,
            _ => Self::from_c_source(&String::from_utf8_lossy(&bytes), path)?,
        };

        log::info!("loaded {} kernel exports from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parse a JSON manifest.
    pub fn from_json(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let manifest: ExportManifest = serde_json::from_str(text).map_err(|e| {
            ConfigError::Manifest { path: origin.to_path_buf(), message: e.to_string() }
        })?;
        Ok(Self::from_names(manifest.symbols))
    }

    /// Parse a YAML manifest.
    pub fn from_yaml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let manifest: ExportManifest = serde_yaml::from_str(text).map_err(|e| {
            ConfigError::Manifest { path: origin.to_path_buf(), message: e.to_string() }
        })?;
        Ok(Self::from_names(manifest.symbols))
    }

    /// Scrape the kernel C registry.
    ///
    /// Only the block from [`TABLE_START_MARKER`] up to the first
    /// [`TABLE_END_MARKER`] after it is considered. Each line contributes
    /// either the identifier of an `M_ELFSYM_EXPORT(ident)` directive or the
    /// quoted name of a `{ "name", ... }` row.
    pub fn from_c_source(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let start = text.find(TABLE_START_MARKER).ok_or_else(|| ConfigError::MissingMarker {
            path: origin.to_path_buf(),
            marker: TABLE_START_MARKER,
        })?;
        let block = &text[start..];
        let end = block.find(TABLE_END_MARKER).ok_or_else(|| ConfigError::MissingMarker {
            path: origin.to_path_buf(),
            marker: TABLE_END_MARKER,
        })?;

        let mut symbols = BTreeSet::new();
        for line in block[..end].lines() {
            if let Some(name) = export_directive(line) {
                symbols.insert(name.to_string());
            }
            if let Some(name) = quoted_row(line) {
                symbols.insert(name.to_string());
            }
        }
        Ok(Self { symbols })
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { symbols: names.into_iter().map(Into::into).collect() }
    }
}

fn manifest_text<'a>(bytes: &'a [u8], origin: &Path) -> Result<&'a str, ConfigError> {
    std::str::from_utf8(bytes).map_err(|e| ConfigError::Manifest {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })
}

/// Default registry location under a kernel source root.
pub fn default_registry_path(kernel_root: &Path) -> PathBuf {
    kernel_root.join(DEFAULT_REGISTRY_PATH)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `M_ELFSYM_EXPORT( ident )` -> `ident`.
fn export_directive(line: &str) -> Option<&str> {
    let at = line.find(EXPORT_DIRECTIVE)?;
    let rest = &line[at + EXPORT_DIRECTIVE.len()..];
    let close = rest.find(')')?;
    let ident = rest[..close].trim();
    if !ident.is_empty() && ident.chars().all(is_ident_char) {
        Some(ident)
    } else {
        None
    }
}

/// `{ "name", ... }` -> `name`.
fn quoted_row(line: &str) -> Option<&str> {
    let brace = line.find('{')?;
    let rest = line[brace + 1..].trim_start();
    let rest = rest.strip_prefix('"')?;
    let close = rest.find('"')?;
    let name = &rest[..close];
    if name.is_empty() || !rest[close + 1..].trim_start().starts_with(',') {
        return None;
    }
    Some(name)
}

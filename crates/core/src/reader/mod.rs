//! Extraction of loader-relevant facts from one applet image.
//!
//! The reader makes no judgment; it only records what the image says. All
//! checking happens in [`crate::check`].

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use goblin::elf::header::{self, ET_CORE, ET_DYN, ET_EXEC, ET_NONE, ET_REL};
use goblin::elf::reloc::RelocSection;
use goblin::elf::section_header::SHN_UNDEF;
use goblin::elf::sym::Symtab;
use goblin::elf::Elf;
use goblin::strtab::Strtab;
use serde::{Deserialize, Serialize};

use crate::arch::{relocation_name, Architecture};
use crate::ParseError;

/// ELF object type (`e_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    None,
    Relocatable,
    Executable,
    SharedObject,
    Core,
    Other(u16),
}

impl ObjectKind {
    pub fn from_e_type(e_type: u16) -> Self {
        match e_type {
            ET_NONE => ObjectKind::None,
            ET_REL => ObjectKind::Relocatable,
            ET_EXEC => ObjectKind::Executable,
            ET_DYN => ObjectKind::SharedObject,
            ET_CORE => ObjectKind::Core,
            other => ObjectKind::Other(other),
        }
    }

    pub fn is_shared_object(&self) -> bool {
        matches!(self, ObjectKind::SharedObject)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::None => f.write_str("NONE (None)"),
            ObjectKind::Relocatable => f.write_str("REL (Relocatable file)"),
            ObjectKind::Executable => f.write_str("EXEC (Executable file)"),
            ObjectKind::SharedObject => f.write_str("DYN (Shared object file)"),
            ObjectKind::Core => f.write_str("CORE (Core file)"),
            ObjectKind::Other(n) => write!(f, "<unknown>: {n:#x}"),
        }
    }
}

/// Everything the checker needs to know about one candidate image.
///
/// Built once per check and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateBinary {
    pub path: PathBuf,
    pub object_kind: ObjectKind,
    /// Machine identifier as named in the ELF header (e.g. `XTENSA`).
    pub machine: String,
    pub architecture: Architecture,
    /// Program entry point; `0` means the entry symbol was never set.
    pub entry_address: u64,
    /// Relocation kind of every row, in file order, duplicates kept.
    pub relocations: Vec<String>,
    /// Names referenced but not defined anywhere in the image.
    pub imported_symbols: BTreeSet<String>,
}

/// Read and parse the image at `path`.
pub fn read_binary(path: &Path) -> Result<CandidateBinary, ParseError> {
    let bytes = fs::read(path)?;
    parse_binary(path, &bytes)
}

/// Like [`read_binary`], but gives up after `timeout`.
///
/// The parse runs on its own thread; if it stalls the thread is abandoned and
/// the binary is reported as a [`ParseError::Timeout`].
pub fn read_with_timeout(path: &Path, timeout: Duration) -> Result<CandidateBinary, ParseError> {
    let (tx, rx) = mpsc::channel();
    let owned = path.to_path_buf();
    thread::Builder::new()
        .name("applet-parse".to_string())
        .spawn(move || {
            // The receiver may already have timed out.
            let _ = tx.send(read_binary(&owned));
        })
        .map_err(|err| ParseError::Spawn(err.to_string()))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            log::warn!("parsing {} exceeded {}ms", path.display(), timeout.as_millis());
            Err(ParseError::Timeout(timeout))
        }
        Err(RecvTimeoutError::Disconnected) => Err(ParseError::WorkerLost),
    }
}

/// Parse an in-memory image. `path` is only recorded, never opened.
pub fn parse_binary(path: &Path, bytes: &[u8]) -> Result<CandidateBinary, ParseError> {
    let elf = Elf::parse(bytes)?;

    let machine = header::machine_to_str(elf.header.e_machine).to_string();
    let architecture = Architecture::detect(&machine);
    let relocations = relocation_tags(&elf);
    let imported_symbols = imported_symbols(&elf);

    log::debug!(
        "{}: machine={} type={} entry={:#x} relocs={} imports={}",
        path.display(),
        machine,
        elf.header.e_type,
        elf.header.e_entry,
        relocations.len(),
        imported_symbols.len()
    );

    Ok(CandidateBinary {
        path: path.to_path_buf(),
        object_kind: ObjectKind::from_e_type(elf.header.e_type),
        machine,
        architecture,
        entry_address: elf.header.e_entry,
        relocations,
        imported_symbols,
    })
}

fn section_tags(e_machine: u16, section: &RelocSection<'_>) -> Vec<String> {
    section.iter().map(|reloc| relocation_name(e_machine, reloc.r_type)).collect()
}

/// Relocation kinds of every relocation section, in section order.
///
/// Stripped images without section headers fall back to the dynamic tables.
fn relocation_tags(elf: &Elf<'_>) -> Vec<String> {
    let e_machine = elf.header.e_machine;

    if !elf.section_headers.is_empty() {
        return elf
            .shdr_relocs
            .iter()
            .flat_map(|(_, section)| section_tags(e_machine, section))
            .collect();
    }

    let mut tags = section_tags(e_machine, &elf.dynrelas);
    tags.extend(section_tags(e_machine, &elf.dynrels));
    tags.extend(section_tags(e_machine, &elf.pltrelocs));
    tags
}

fn undefined_and_defined(symtab: &Symtab<'_>, strtab: &Strtab<'_>) -> (Vec<String>, Vec<String>) {
    let mut undefined = Vec::new();
    let mut defined = Vec::new();
    for sym in symtab.iter() {
        let name = match strtab.get_at(sym.st_name) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        if sym.st_shndx == SHN_UNDEF as usize {
            undefined.push(name);
        } else {
            defined.push(name);
        }
    }
    (undefined, defined)
}

/// Names marked undefined in `.dynsym` or `.symtab`, minus names the image
/// also defines itself.
fn imported_symbols(elf: &Elf<'_>) -> BTreeSet<String> {
    let (mut undefined, mut defined) = undefined_and_defined(&elf.dynsyms, &elf.dynstrtab);
    let (sym_undef, sym_def) = undefined_and_defined(&elf.syms, &elf.strtab);
    undefined.extend(sym_undef);
    defined.extend(sym_def);

    let defined: BTreeSet<String> = defined.into_iter().collect();
    undefined.into_iter().filter(|name| !defined.contains(name)).collect()
}

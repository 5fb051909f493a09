//! Conformance rules applied to one [`CandidateBinary`].
//!
//! | Rule | Requirement |
//! |------|-------------|
//! | **Object kind** | image is a shared object (`ET_DYN`) |
//! | **Entry** | entry address is non-zero (`-e app_main` was passed at link time) |
//! | **Relocations** | every relocation kind is handled by the loader for this architecture |
//! | **Symbols** | every undefined symbol is in the kernel export table |
//!
//! All rules always run; a verdict carries every violation found, never just
//! the first. Checking is a pure function of the binary, the policy and the
//! export table.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::arch::RelocationPolicy;
use crate::exports::ExportTable;
use crate::reader::{CandidateBinary, ObjectKind};
use crate::ParseError;

/// One violated rule and the data that violates it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("cannot parse binary: {0}")]
    Parse(ParseError),

    #[error("expected ET_DYN; got Type={observed}")]
    ObjectKind { observed: ObjectKind },

    #[error("entry point is 0 (expected non-default entry)")]
    EntryUnset,

    #[error("no loader relocation support for machine {machine:?}")]
    UnknownArchitecture { machine: String },

    /// Sorted, distinct.
    #[error("unsupported relocation types: {}", .0.join(", "))]
    UnsupportedRelocations(Vec<String>),

    /// Sorted, distinct.
    #[error("undefined symbols not exported by kernel: {}", .0.join(", "))]
    UnexportedSymbols(Vec<String>),
}

/// Outcome of checking one binary. Passing iff there are no diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    diagnostics: Vec<Diagnostic>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Verdict for a binary that could not be read at all.
    pub fn parse_failure(err: ParseError) -> Self {
        Self { diagnostics: vec![Diagnostic::Parse(err)] }
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Check `binary` against its architecture's loader policy and `exports`.
pub fn check(binary: &CandidateBinary, exports: &ExportTable) -> Verdict {
    check_against(binary, RelocationPolicy::for_arch(binary.architecture), exports)
}

/// Check `binary` against an explicit relocation `policy`.
pub fn check_against(
    binary: &CandidateBinary,
    policy: RelocationPolicy,
    exports: &ExportTable,
) -> Verdict {
    let mut verdict = Verdict::default();

    if !binary.object_kind.is_shared_object() {
        verdict.push(Diagnostic::ObjectKind { observed: binary.object_kind });
    }

    if binary.entry_address == 0 {
        verdict.push(Diagnostic::EntryUnset);
    }

    if !policy.is_defined() {
        verdict.push(Diagnostic::UnknownArchitecture { machine: binary.machine.clone() });
    }
    let bad_relocs = policy.disallowed(&binary.relocations);
    if !bad_relocs.is_empty() {
        verdict.push(Diagnostic::UnsupportedRelocations(bad_relocs.into_iter().collect()));
    }

    let missing = unexported(&binary.imported_symbols, exports);
    if !missing.is_empty() {
        verdict.push(Diagnostic::UnexportedSymbols(missing.into_iter().collect()));
    }

    log::debug!(
        "{}: {} ({} diagnostics)",
        binary.path.display(),
        if verdict.passed() { "pass" } else { "fail" },
        verdict.diagnostics.len()
    );
    verdict
}

fn unexported(imports: &BTreeSet<String>, exports: &ExportTable) -> BTreeSet<String> {
    imports.iter().filter(|name| !exports.contains(name)).cloned().collect()
}

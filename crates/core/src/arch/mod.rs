//! Target architectures and the relocation policy the kernel loader implements
//! for each of them.
//!
//! The loader carries one small relocation handler per CPU family. Anything
//! outside the handler's `switch` is rejected at load time, so the allow-sets
//! below are closed: a conformant applet may only contain these kinds.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

mod names;

pub use names::relocation_name;

/// CPU families the applet loader knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    Xtensa,
    Riscv,
    /// Any machine the loader has no relocation handler for.
    Unknown,
}

impl Architecture {
    /// Every architecture with a loader relocation handler.
    pub const SUPPORTED: [Architecture; 2] = [Architecture::Xtensa, Architecture::Riscv];

    /// Classify a machine/ISA identifier by token matching.
    ///
    /// Accepts both the short ELF names (`XTENSA`, `RISCV`) and the longer
    /// descriptive forms printed by binutils (`Tensilica Xtensa Processor`,
    /// `RISC-V`).
    pub fn detect(machine: &str) -> Self {
        let upper = machine.to_ascii_uppercase();
        if upper.contains("XTENSA") {
            Architecture::Xtensa
        } else if upper.contains("RISCV") || upper.contains("RISC-V") || upper.contains("RISC V") {
            Architecture::Riscv
        } else {
            Architecture::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Xtensa => "xtensa",
            Architecture::Riscv => "riscv",
            Architecture::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const XTENSA_ALLOWED: &[&str] = &[
    "R_XTENSA_NONE",
    "R_XTENSA_RTLD",
    "R_XTENSA_GLOB_DAT",
    "R_XTENSA_JMP_SLOT",
    "R_XTENSA_RELATIVE",
];

const RISCV_ALLOWED: &[&str] =
    &["R_RISCV_NONE", "R_RISCV_32", "R_RISCV_RELATIVE", "R_RISCV_JUMP_SLOT"];

/// Relocation kinds the loader accepts for one architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationPolicy {
    /// The loader implements exactly these kinds.
    Closed(&'static [&'static str]),
    /// The loader has no handler for this architecture; no relocation is
    /// loadable and the binary cannot be accepted at all.
    Undefined,
}

impl RelocationPolicy {
    /// Policy lookup. Never falls back to "no restriction".
    pub fn for_arch(arch: Architecture) -> Self {
        match arch {
            Architecture::Xtensa => RelocationPolicy::Closed(XTENSA_ALLOWED),
            Architecture::Riscv => RelocationPolicy::Closed(RISCV_ALLOWED),
            Architecture::Unknown => RelocationPolicy::Undefined,
        }
    }

    pub fn allows(&self, tag: &str) -> bool {
        match self {
            RelocationPolicy::Closed(allowed) => allowed.contains(&tag),
            RelocationPolicy::Undefined => false,
        }
    }

    /// Distinct tags from `relocations` this policy rejects, sorted.
    pub fn disallowed<'a, I>(&self, relocations: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        relocations.into_iter().filter(|tag| !self.allows(tag)).cloned().collect()
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, RelocationPolicy::Closed(_))
    }
}

//! Applet images and a kernel registry for end-to-end runs.
//!
//! Applets are RISC-V relocatables written by `object`, then patched into
//! shared objects with a non-zero entry.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use object::write::{Object, Relocation, StandardSection, Symbol, SymbolSection};
use object::{
    Architecture, BinaryFormat, Endianness, RelocationFlags, SymbolFlags, SymbolKind, SymbolScope,
};

pub const R_RISCV_RELATIVE: u32 = 3;
pub const R_RISCV_JUMP_SLOT: u32 = 5;
pub const R_RISCV_CALL_PLT: u32 = 19;

/// An applet as the CLI sees it.
#[derive(Debug, Clone)]
pub struct Fixture {
    /// `None` leaves the image relocatable with entry 0.
    pub shared_entry: Option<u32>,
    pub relocations: Vec<u32>,
    pub imports: Vec<&'static str>,
}

impl Fixture {
    pub fn conformant() -> Self {
        Self {
            shared_entry: Some(0x4200),
            relocations: vec![R_RISCV_RELATIVE, R_RISCV_JUMP_SLOT],
            imports: vec!["memcpy"],
        }
    }

    pub fn write_to(&self, dir: &Path, file_name: &str) -> PathBuf {
        let mut obj = Object::new(BinaryFormat::Elf, Architecture::Riscv32, Endianness::Little);
        let text = obj.section_id(StandardSection::Text);
        obj.append_section_data(text, &[0u8; 32], 4);

        let symbol = |name: &str, section| Symbol {
            name: name.as_bytes().to_vec(),
            value: 0,
            size: 0,
            kind: SymbolKind::Text,
            scope: SymbolScope::Dynamic,
            weak: false,
            section,
            flags: SymbolFlags::None,
        };
        obj.add_symbol(symbol("app_main", SymbolSection::Section(text)));
        let imports: Vec<_> = self
            .imports
            .iter()
            .map(|name| obj.add_symbol(symbol(*name, SymbolSection::Undefined)))
            .collect();

        for (index, r_type) in self.relocations.iter().enumerate() {
            let relocation = Relocation {
                offset: index as u64 * 4,
                symbol: imports[0],
                addend: 0,
                flags: RelocationFlags::Elf { r_type: *r_type },
            };
            obj.add_relocation(text, relocation).expect("add relocation");
        }

        let mut bytes = obj.write().expect("write applet");
        if let Some(entry) = self.shared_entry {
            // ELF32 header: e_type at 16, e_entry at 24. ET_DYN is 3.
            bytes[16..18].copy_from_slice(&3u16.to_le_bytes());
            bytes[24..28].copy_from_slice(&entry.to_le_bytes());
        }

        let path = dir.join(file_name);
        std::fs::write(&path, bytes).expect("write applet file");
        path
    }
}

pub const REGISTRY_SOURCE: &str = r#"
static const struct m_elfsym g_kernel_libc_syms[] = {
    { "memcpy", (void *)memcpy },
    { "malloc", (void *)m_libc_malloc },
    M_ELFSYM_EXPORT(strlen),
    M_ELFSYM_END
};
"#;

/// Write a kernel registry exporting `memcpy`, `malloc` and `strlen`.
pub fn write_registry(dir: &Path) -> PathBuf {
    let path = dir.join("m_elf_symbol.c");
    std::fs::write(&path, REGISTRY_SOURCE).expect("write registry");
    path
}

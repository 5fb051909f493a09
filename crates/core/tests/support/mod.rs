//! ELF fixtures for reader and batch tests.
//!
//! `object` only writes relocatable files, so shared-object fixtures are
//! produced by patching `e_type`/`e_entry` in the ELF32 header afterwards.
//! Images without section headers are assembled by hand in [`stripped_image`].

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use object::write::{Object, Relocation, StandardSection, Symbol, SymbolSection};
use object::{
    Architecture, BinaryFormat, Endianness, RelocationFlags, SymbolFlags, SymbolKind, SymbolScope,
};

pub const R_RISCV_32: u32 = 1;
pub const R_RISCV_64: u32 = 2;
pub const R_RISCV_RELATIVE: u32 = 3;
pub const R_RISCV_JUMP_SLOT: u32 = 5;
pub const R_RISCV_CALL_PLT: u32 = 19;

pub const R_XTENSA_NONE: u32 = 0;
pub const R_XTENSA_JMP_SLOT: u32 = 4;
pub const R_XTENSA_RELATIVE: u32 = 5;
pub const R_XTENSA_DIFF32: u32 = 18;

const ET_DYN: u16 = 3;
const E_TYPE_OFFSET: usize = 16;
const E_ENTRY_OFFSET: usize = 24;

/// Description of an applet fixture.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub arch: Architecture,
    /// `None` leaves the object relocatable; `Some(entry)` patches it into a
    /// shared object with that entry address.
    pub shared_entry: Option<u32>,
    /// Relocation types applied to `.text`, in order; each targets the first import.
    pub relocations: Vec<u32>,
    pub imports: Vec<&'static str>,
    pub defined: Vec<&'static str>,
}

impl Fixture {
    /// Loadable applet importing only `memcpy`.
    pub fn conformant() -> Self {
        Self {
            arch: Architecture::Riscv32,
            shared_entry: Some(0x4200),
            relocations: vec![R_RISCV_RELATIVE, R_RISCV_JUMP_SLOT],
            imports: vec!["memcpy"],
            defined: vec!["app_main"],
        }
    }

    /// Xtensa applet with the NONE/RELATIVE/JMP_SLOT relocations a typical
    /// ESP32 build emits, importing only `memcpy`.
    pub fn xtensa_conformant() -> Self {
        Self {
            arch: Architecture::Xtensa,
            relocations: vec![R_XTENSA_NONE, R_XTENSA_RELATIVE, R_XTENSA_JMP_SLOT],
            ..Self::conformant()
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut obj = Object::new(BinaryFormat::Elf, self.arch, Endianness::Little);
        let text = obj.section_id(StandardSection::Text);
        obj.append_section_data(text, &[0u8; 64], 4);

        for (index, name) in self.defined.iter().enumerate() {
            obj.add_symbol(Symbol {
                name: name.as_bytes().to_vec(),
                value: (index as u64) * 8,
                size: 8,
                kind: SymbolKind::Text,
                scope: SymbolScope::Dynamic,
                weak: false,
                section: SymbolSection::Section(text),
                flags: SymbolFlags::None,
            });
        }

        let imports: Vec<_> = self
            .imports
            .iter()
            .map(|name| {
                obj.add_symbol(Symbol {
                    name: name.as_bytes().to_vec(),
                    value: 0,
                    size: 0,
                    kind: SymbolKind::Text,
                    scope: SymbolScope::Dynamic,
                    weak: false,
                    section: SymbolSection::Undefined,
                    flags: SymbolFlags::None,
                })
            })
            .collect();

        if let Some(&target) = imports.first() {
            for (index, r_type) in self.relocations.iter().enumerate() {
                obj.add_relocation(
                    text,
                    Relocation {
                        offset: (index as u64) * 4,
                        symbol: target,
                        addend: 0,
                        flags: RelocationFlags::Elf { r_type: *r_type },
                    },
                )
                .expect("add relocation");
            }
        }

        let mut bytes = obj.write().expect("write fixture object");
        if let Some(entry) = self.shared_entry {
            bytes[E_TYPE_OFFSET..E_TYPE_OFFSET + 2].copy_from_slice(&ET_DYN.to_le_bytes());
            bytes[E_ENTRY_OFFSET..E_ENTRY_OFFSET + 4].copy_from_slice(&entry.to_le_bytes());
        }
        bytes
    }

    pub fn write_to(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        std::fs::write(&path, self.build()).expect("write fixture file");
        path
    }
}

pub const EM_XTENSA: u16 = 94;
pub const EM_RISCV: u16 = 243;

const EHDR_SIZE: u32 = 52;
const PHDR_SIZE: u32 = 32;
const SYM_SIZE: u32 = 16;
const RELA_SIZE: u32 = 12;

const PT_LOAD: u32 = 1;
const PT_DYNAMIC: u32 = 2;

const DT_NULL: u32 = 0;
const DT_PLTRELSZ: u32 = 2;
const DT_STRTAB: u32 = 5;
const DT_SYMTAB: u32 = 6;
const DT_RELA: u32 = 7;
const DT_RELASZ: u32 = 8;
const DT_RELAENT: u32 = 9;
const DT_STRSZ: u32 = 10;
const DT_SYMENT: u32 = 11;
const DT_PLTREL: u32 = 20;
const DT_JMPREL: u32 = 23;

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn align4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

/// Appends `Elf32_Rela` rows against symbol 1; returns their file offset.
fn push_rela_rows(body: &mut Vec<u8>, base: u32, rows: &[u32]) -> u32 {
    let at = base + body.len() as u32;
    for (index, r_type) in rows.iter().enumerate() {
        push_u32(body, 0x100 + index as u32 * 4);
        push_u32(body, (1 << 8) | *r_type);
        push_u32(body, 0);
    }
    at
}

/// ELF32 shared object with a `PT_DYNAMIC` segment and no section headers.
///
/// `rela` rows land in `DT_RELA`, `plt` rows in `DT_JMPREL`. Every row
/// references dynamic symbol 1, the undefined `import`. One `PT_LOAD` maps the
/// whole file at address 0, so addresses equal file offsets.
pub fn stripped_image(
    machine: u16,
    entry: u32,
    rela: &[u32],
    plt: &[u32],
    import: &str,
) -> Vec<u8> {
    let mut body = Vec::new();
    let base = EHDR_SIZE + 2 * PHDR_SIZE;

    let dynstr = base;
    body.push(0);
    body.extend_from_slice(import.as_bytes());
    body.push(0);
    let dynstr_size = body.len() as u32;
    align4(&mut body);

    let dynsym = base + body.len() as u32;
    body.extend_from_slice(&[0u8; SYM_SIZE as usize]);
    push_u32(&mut body, 1); // st_name
    push_u32(&mut body, 0); // st_value
    push_u32(&mut body, 0); // st_size
    body.push(0x12); // STB_GLOBAL | STT_FUNC
    body.push(0);
    push_u16(&mut body, 0); // SHN_UNDEF

    let rela_at = push_rela_rows(&mut body, base, rela);
    let plt_at = push_rela_rows(&mut body, base, plt);

    let dynamic = base + body.len() as u32;
    let entries = [
        (DT_STRTAB, dynstr),
        (DT_STRSZ, dynstr_size),
        (DT_SYMTAB, dynsym),
        (DT_SYMENT, SYM_SIZE),
        (DT_RELA, rela_at),
        (DT_RELASZ, rela.len() as u32 * RELA_SIZE),
        (DT_RELAENT, RELA_SIZE),
        (DT_JMPREL, plt_at),
        (DT_PLTRELSZ, plt.len() as u32 * RELA_SIZE),
        (DT_PLTREL, DT_RELA),
        (DT_NULL, 0),
    ];
    for (tag, value) in entries {
        push_u32(&mut body, tag);
        push_u32(&mut body, value);
    }
    let dynamic_size = base + body.len() as u32 - dynamic;
    let total = base + body.len() as u32;

    let mut image = Vec::with_capacity(total as usize);
    image.extend_from_slice(&[0x7f, b'E', b'L', b'F', 1, 1, 1, 0]);
    image.extend_from_slice(&[0u8; 8]);
    push_u16(&mut image, ET_DYN);
    push_u16(&mut image, machine);
    push_u32(&mut image, 1); // e_version
    push_u32(&mut image, entry);
    push_u32(&mut image, EHDR_SIZE); // e_phoff
    push_u32(&mut image, 0); // e_shoff
    push_u32(&mut image, 0); // e_flags
    push_u16(&mut image, EHDR_SIZE as u16);
    push_u16(&mut image, PHDR_SIZE as u16);
    push_u16(&mut image, 2); // e_phnum
    push_u16(&mut image, 40); // e_shentsize
    push_u16(&mut image, 0); // e_shnum
    push_u16(&mut image, 0); // e_shstrndx

    for (p_type, offset, size) in [(PT_LOAD, 0, total), (PT_DYNAMIC, dynamic, dynamic_size)] {
        push_u32(&mut image, p_type);
        push_u32(&mut image, offset);
        push_u32(&mut image, offset); // p_vaddr
        push_u32(&mut image, offset); // p_paddr
        push_u32(&mut image, size); // p_filesz
        push_u32(&mut image, size); // p_memsz
        push_u32(&mut image, 4); // PF_R
        push_u32(&mut image, 4);
    }

    image.extend_from_slice(&body);
    image
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

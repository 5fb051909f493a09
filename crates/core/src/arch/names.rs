//! Relocation type names, matching the spelling binutils uses.

use goblin::elf::header::{machine_to_str, EM_RISCV, EM_XTENSA};

fn xtensa_name(r_type: u32) -> Option<&'static str> {
    let name = match r_type {
        0 => "R_XTENSA_NONE",
        1 => "R_XTENSA_32",
        2 => "R_XTENSA_RTLD",
        3 => "R_XTENSA_GLOB_DAT",
        4 => "R_XTENSA_JMP_SLOT",
        5 => "R_XTENSA_RELATIVE",
        6 => "R_XTENSA_PLT",
        8 => "R_XTENSA_OP0",
        9 => "R_XTENSA_OP1",
        10 => "R_XTENSA_OP2",
        11 => "R_XTENSA_ASM_EXPAND",
        12 => "R_XTENSA_ASM_SIMPLIFY",
        13 => "R_XTENSA_32_PCREL",
        14 => "R_XTENSA_GNU_VTINHERIT",
        15 => "R_XTENSA_GNU_VTENTRY",
        16 => "R_XTENSA_DIFF8",
        17 => "R_XTENSA_DIFF16",
        18 => "R_XTENSA_DIFF32",
        19 => "R_XTENSA_SLOT0_OP",
        34 => "R_XTENSA_SLOT0_ALT",
        49 => "R_XTENSA_TLSDESC_FN",
        50 => "R_XTENSA_TLSDESC_ARG",
        51 => "R_XTENSA_TLS_DTPOFF",
        52 => "R_XTENSA_TLS_TPOFF",
        53 => "R_XTENSA_TLS_FUNC",
        54 => "R_XTENSA_TLS_ARG",
        55 => "R_XTENSA_TLS_CALL",
        56 => "R_XTENSA_PDIFF8",
        57 => "R_XTENSA_PDIFF16",
        58 => "R_XTENSA_PDIFF32",
        59 => "R_XTENSA_NDIFF8",
        60 => "R_XTENSA_NDIFF16",
        61 => "R_XTENSA_NDIFF32",
        _ => return None,
    };
    Some(name)
}

fn riscv_name(r_type: u32) -> Option<&'static str> {
    let name = match r_type {
        0 => "R_RISCV_NONE",
        1 => "R_RISCV_32",
        2 => "R_RISCV_64",
        3 => "R_RISCV_RELATIVE",
        4 => "R_RISCV_COPY",
        5 => "R_RISCV_JUMP_SLOT",
        6 => "R_RISCV_TLS_DTPMOD32",
        7 => "R_RISCV_TLS_DTPMOD64",
        8 => "R_RISCV_TLS_DTPREL32",
        9 => "R_RISCV_TLS_DTPREL64",
        10 => "R_RISCV_TLS_TPREL32",
        11 => "R_RISCV_TLS_TPREL64",
        12 => "R_RISCV_TLSDESC",
        16 => "R_RISCV_BRANCH",
        17 => "R_RISCV_JAL",
        18 => "R_RISCV_CALL",
        19 => "R_RISCV_CALL_PLT",
        20 => "R_RISCV_GOT_HI20",
        21 => "R_RISCV_TLS_GOT_HI20",
        22 => "R_RISCV_TLS_GD_HI20",
        23 => "R_RISCV_PCREL_HI20",
        24 => "R_RISCV_PCREL_LO12_I",
        25 => "R_RISCV_PCREL_LO12_S",
        26 => "R_RISCV_HI20",
        27 => "R_RISCV_LO12_I",
        28 => "R_RISCV_LO12_S",
        29 => "R_RISCV_TPREL_HI20",
        30 => "R_RISCV_TPREL_LO12_I",
        31 => "R_RISCV_TPREL_LO12_S",
        32 => "R_RISCV_TPREL_ADD",
        33 => "R_RISCV_ADD8",
        34 => "R_RISCV_ADD16",
        35 => "R_RISCV_ADD32",
        36 => "R_RISCV_ADD64",
        37 => "R_RISCV_SUB8",
        38 => "R_RISCV_SUB16",
        39 => "R_RISCV_SUB32",
        40 => "R_RISCV_SUB64",
        43 => "R_RISCV_ALIGN",
        44 => "R_RISCV_RVC_BRANCH",
        45 => "R_RISCV_RVC_JUMP",
        51 => "R_RISCV_RELAX",
        52 => "R_RISCV_SUB6",
        53 => "R_RISCV_SET6",
        54 => "R_RISCV_SET8",
        55 => "R_RISCV_SET16",
        56 => "R_RISCV_SET32",
        57 => "R_RISCV_32_PCREL",
        58 => "R_RISCV_IRELATIVE",
        _ => return None,
    };
    Some(name)
}

/// Name of relocation type `r_type` for ELF machine `e_machine`.
///
/// Numbers missing from a table still produce a distinct tag (e.g.
/// `R_XTENSA_<200>`) so they show up in diagnostics and fail the policy.
pub fn relocation_name(e_machine: u16, r_type: u32) -> String {
    let (known, prefix) = match e_machine {
        EM_XTENSA => (xtensa_name(r_type), "R_XTENSA"),
        EM_RISCV => (riscv_name(r_type), "R_RISCV"),
        // No loader handler exists for other machines; the number is enough.
        other => return format!("R_{}_<{r_type}>", machine_to_str(other)),
    };
    match known {
        Some(name) => name.to_string(),
        None => format!("{prefix}_<{r_type}>"),
    }
}

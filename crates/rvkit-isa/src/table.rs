//! Priority-ordered instruction pattern tables.
//!
//! Each table is a list of `(mask, bits, format, opcode)` records. A word
//! matches a record when `word & mask == bits`; the first match wins, so
//! records that are bit-pattern subsets of later ones must come first
//! (`c.ebreak` before `c.jalr` before `c.add`, `c.jr` before `c.mv`).

use crate::fields::*;
use crate::opcode::Opcode;
use crate::types::{REG_RA, REG_SP};

/// Operand extraction rule for a matched pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    R,
    I,
    S,
    B,
    U,
    J,
    /// Vendor branch: `rs2` holds the tested bit index.
    BitTest,
    /// Vendor branch: `rs2` holds the compared constant.
    ConstCompare,
    /// `c.add`: rd = rs1 = \[11:7\], rs2 = \[6:2\].
    CAdd,
    /// `c.mv`: rd = \[11:7\], rs1 = \[6:2\], rs2 = x0.
    CMv,
    /// `c.jr`: rs1 = \[11:7\], rd = x0.
    CJr,
    /// `c.jalr`: rs1 = \[11:7\], rd = ra.
    CJalr,
    /// `c.addw` and other CA forms: rd = rs1 = short \[9:7\], rs2 = short \[4:2\].
    CArith,
    /// `c.addi`, `c.addiw`: rd = rs1 = \[11:7\].
    CI,
    CAddi16sp,
    CAddi4spn,
    CLui,
    CSw,
    CSd,
    CSwsp,
    CSdsp,
    /// `c.j`: rd = x0.
    CJ,
    /// `c.jal`: rd = ra.
    CJal,
    /// `c.beqz`, `c.bnez`: rs1 = short \[9:7\], rs2 = x0.
    CB,
    /// No operands.
    None,
}

/// Operands extracted from one instruction word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Operands {
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub imm: i64,
}

impl Format {
    /// Extract operands. Compressed formats read the low 16 bits.
    #[must_use]
    pub const fn extract(self, raw: u32) -> Operands {
        let c = raw as u16;
        let (rd, rs1, rs2, imm) = match self {
            Self::R => (decode_rd(raw), decode_rs1(raw), decode_rs2(raw), 0),
            Self::I => (decode_rd(raw), decode_rs1(raw), 0, decode_i_imm(raw) as i64),
            Self::S => (0, decode_rs1(raw), decode_rs2(raw), decode_s_imm(raw) as i64),
            Self::B => (0, decode_rs1(raw), decode_rs2(raw), decode_b_imm(raw) as i64),
            Self::U => (decode_rd(raw), 0, 0, decode_u_imm(raw) as i64),
            Self::J => (decode_rd(raw), 0, 0, decode_j_imm(raw) as i64),
            Self::BitTest => (
                0,
                decode_rs1(raw),
                decode_bit_index(raw),
                decode_vendor_branch_imm(raw) as i64,
            ),
            Self::ConstCompare => (
                0,
                decode_rs1(raw),
                decode_branch_const(raw),
                decode_vendor_branch_imm(raw) as i64,
            ),
            Self::CAdd => (decode_c_rd(c), decode_c_rd(c), decode_c_rs2(c), 0),
            Self::CMv => (decode_c_rd(c), decode_c_rs2(c), 0, 0),
            Self::CJr => (0, decode_c_rd(c), 0, 0),
            Self::CJalr => (REG_RA, decode_c_rd(c), 0, 0),
            Self::CArith => (
                decode_c_rs1_short(c),
                decode_c_rs1_short(c),
                decode_c_rs2_short(c),
                0,
            ),
            Self::CI => (decode_c_rd(c), decode_c_rd(c), 0, decode_ci_imm(c) as i64),
            Self::CAddi16sp => (decode_c_rd(c), decode_c_rd(c), 0, decode_ci16sp_imm(c) as i64),
            Self::CAddi4spn => (decode_c_rs2_short(c), REG_SP, 0, decode_addi4spn_imm(c) as i64),
            Self::CLui => (decode_c_rd(c), 0, 0, decode_ci_lui_imm(c) as i64),
            Self::CSw => (
                0,
                decode_c_rs1_short(c),
                decode_c_rs2_short(c),
                decode_cs_sw_offset(c) as i64,
            ),
            Self::CSd => (
                0,
                decode_c_rs1_short(c),
                decode_c_rs2_short(c),
                decode_cs_sd_offset(c) as i64,
            ),
            Self::CSwsp => (0, REG_SP, decode_c_rs2(c), decode_css_swsp_offset(c) as i64),
            Self::CSdsp => (0, REG_SP, decode_c_rs2(c), decode_css_sdsp_offset(c) as i64),
            Self::CJ => (0, 0, 0, decode_cj_imm(c) as i64),
            Self::CJal => (REG_RA, 0, 0, decode_cj_imm(c) as i64),
            Self::CB => (0, decode_c_rs1_short(c), 0, decode_cb_imm(c) as i64),
            Self::None => (0, 0, 0, 0),
        };
        Operands { rd, rs1, rs2, imm }
    }
}

/// Register widths a pattern applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XlenReq {
    Any,
    Rv32Only,
    Rv64Only,
}

impl XlenReq {
    #[must_use]
    pub const fn allows(self, xlen: u8) -> bool {
        match self {
            Self::Any => true,
            Self::Rv32Only => xlen == 32,
            Self::Rv64Only => xlen == 64,
        }
    }
}

/// One instruction encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InsnPattern {
    pub name: &'static str,
    pub mask: u32,
    pub bits: u32,
    pub format: Format,
    pub opcode: Opcode,
    pub xlen: XlenReq,
}

impl InsnPattern {
    #[must_use]
    pub const fn new(name: &'static str, bits: u32, mask: u32, format: Format, opcode: Opcode) -> Self {
        Self {
            name,
            mask,
            bits,
            format,
            opcode,
            xlen: XlenReq::Any,
        }
    }

    #[must_use]
    pub const fn rv32_only(mut self) -> Self {
        self.xlen = XlenReq::Rv32Only;
        self
    }

    #[must_use]
    pub const fn rv64_only(mut self) -> Self {
        self.xlen = XlenReq::Rv64Only;
        self
    }

    #[inline]
    #[must_use]
    pub const fn matches(&self, raw: u32, xlen: u8) -> bool {
        raw & self.mask == self.bits && self.xlen.allows(xlen)
    }
}

/// A named, ordered table for one instruction length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatternSet {
    pub name: &'static str,
    /// Instruction length in bytes.
    pub length: u8,
    pub patterns: &'static [InsnPattern],
}

impl PatternSet {
    /// First pattern matching `raw`.
    #[must_use]
    pub fn find(&self, raw: u32, xlen: u8) -> Option<&'static InsnPattern> {
        self.patterns.iter().find(|p| p.matches(raw, xlen))
    }
}

use Format as F;
use Opcode as Op;

const BRANCH_MASK: u32 = 0x707f;

/// Base 32-bit encodings.
pub const BASE: PatternSet = PatternSet {
    name: "base",
    length: 4,
    patterns: &[
        InsnPattern::new("add", 0x0000_0033, 0xfe00_707f, F::R, Op::Add),
        InsnPattern::new("addw", 0x0000_003b, 0xfe00_707f, F::R, Op::Addw),
        InsnPattern::new("addi", 0x0000_0013, 0x707f, F::I, Op::Addi),
        InsnPattern::new("addiw", 0x0000_001b, 0x707f, F::I, Op::Addiw),
        InsnPattern::new("auipc", 0x0000_0017, 0x7f, F::U, Op::Auipc),
        InsnPattern::new("lui", 0x0000_0037, 0x7f, F::U, Op::Lui),
        InsnPattern::new("sd", 0x0000_3023, 0x707f, F::S, Op::Sd),
        InsnPattern::new("sw", 0x0000_2023, 0x707f, F::S, Op::Sw),
        InsnPattern::new("jal", 0x0000_006f, 0x7f, F::J, Op::Jal),
        InsnPattern::new("jalr", 0x0000_0067, 0x707f, F::I, Op::Jalr),
        InsnPattern::new("beq", 0x0000_0063, BRANCH_MASK, F::B, Op::Beq),
        InsnPattern::new("bne", 0x0000_1063, BRANCH_MASK, F::B, Op::Bne),
        InsnPattern::new("blt", 0x0000_4063, BRANCH_MASK, F::B, Op::Blt),
        InsnPattern::new("bge", 0x0000_5063, BRANCH_MASK, F::B, Op::Bge),
        InsnPattern::new("bltu", 0x0000_6063, BRANCH_MASK, F::B, Op::Bltu),
        InsnPattern::new("bgeu", 0x0000_7063, BRANCH_MASK, F::B, Op::Bgeu),
        InsnPattern::new("lr.w", 0x1000_202f, 0xf9f0_707f, F::R, Op::Lr),
        InsnPattern::new("lr.d", 0x1000_302f, 0xf9f0_707f, F::R, Op::Lr),
        InsnPattern::new("sc.w", 0x1800_202f, 0xf800_707f, F::R, Op::Sc),
        InsnPattern::new("sc.d", 0x1800_302f, 0xf800_707f, F::R, Op::Sc),
    ],
};

/// Andes vendor branches (custom-2 opcode space).
pub const ANDES: PatternSet = PatternSet {
    name: "andes",
    length: 4,
    patterns: &[
        InsnPattern::new("bbc", 0x0000_705b, 0x4000_707f, F::BitTest, Op::Bbc),
        InsnPattern::new("bbs", 0x4000_705b, 0x4000_707f, F::BitTest, Op::Bbs),
        InsnPattern::new("beqc", 0x0000_505b, 0x707f, F::ConstCompare, Op::Beqc),
        InsnPattern::new("bnec", 0x0000_605b, 0x707f, F::ConstCompare, Op::Bnec),
    ],
};

/// Compressed 16-bit encodings.
pub const COMPRESSED: PatternSet = PatternSet {
    name: "compressed",
    length: 2,
    patterns: &[
        InsnPattern::new("c.ebreak", 0x9002, 0xffff, F::None, Op::Other),
        InsnPattern::new("c.jalr", 0x9002, 0xf07f, F::CJalr, Op::Jalr),
        InsnPattern::new("c.add", 0x9002, 0xf003, F::CAdd, Op::Add),
        InsnPattern::new("c.addw", 0x9c21, 0xfc63, F::CArith, Op::Addw).rv64_only(),
        InsnPattern::new("c.addi", 0x0001, 0xe003, F::CI, Op::Addi),
        InsnPattern::new("c.addiw", 0x2001, 0xe003, F::CI, Op::Addiw).rv64_only(),
        InsnPattern::new("c.jal", 0x2001, 0xe003, F::CJal, Op::Jal).rv32_only(),
        InsnPattern::new("c.addi16sp", 0x6101, 0xef83, F::CAddi16sp, Op::Addi),
        InsnPattern::new("c.addi4spn", 0x0000, 0xe003, F::CAddi4spn, Op::Addi),
        InsnPattern::new("c.lui", 0x6001, 0xe003, F::CLui, Op::Lui),
        InsnPattern::new("c.sd", 0xe000, 0xe003, F::CSd, Op::Sd).rv64_only(),
        InsnPattern::new("c.sw", 0xc000, 0xe003, F::CSw, Op::Sw),
        InsnPattern::new("c.swsp", 0xc002, 0xe003, F::CSwsp, Op::Sw),
        InsnPattern::new("c.sdsp", 0xe002, 0xe003, F::CSdsp, Op::Sd).rv64_only(),
        InsnPattern::new("c.jr", 0x8002, 0xf07f, F::CJr, Op::Jalr),
        InsnPattern::new("c.mv", 0x8002, 0xf003, F::CMv, Op::Add),
        InsnPattern::new("c.j", 0xa001, 0xe003, F::CJ, Op::Jal),
        InsnPattern::new("c.beqz", 0xc001, 0xe003, F::CB, Op::Beq),
        InsnPattern::new("c.bnez", 0xe001, 0xe003, F::CB, Op::Bne),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressed_priority() {
        // c.ebreak (0x9002) also matches c.jalr and c.add.
        assert_eq!(COMPRESSED.find(0x9002, 64).map(|p| p.name), Some("c.ebreak"));
        // c.jalr a0 (0x9502)
        assert_eq!(COMPRESSED.find(0x9502, 64).map(|p| p.name), Some("c.jalr"));
        // c.add a0, a1 (0x952e)
        assert_eq!(COMPRESSED.find(0x952e, 64).map(|p| p.name), Some("c.add"));
        // c.jr ra (0x8082)
        assert_eq!(COMPRESSED.find(0x8082, 64).map(|p| p.name), Some("c.jr"));
        // c.mv s0, sp (0x840a)
        assert_eq!(COMPRESSED.find(0x840a, 64).map(|p| p.name), Some("c.mv"));
        // c.addi16sp (0x713d) shares funct3 with c.lui
        assert_eq!(COMPRESSED.find(0x713d, 64).map(|p| p.name), Some("c.addi16sp"));
        assert_eq!(COMPRESSED.find(0x6505, 64).map(|p| p.name), Some("c.lui"));
    }

    #[test]
    fn test_xlen_dependent_patterns() {
        // 0x2085: c.addiw ra, 1 on RV64, c.jal on RV32
        assert_eq!(COMPRESSED.find(0x2085, 64).map(|p| p.name), Some("c.addiw"));
        assert_eq!(COMPRESSED.find(0x2085, 32).map(|p| p.name), Some("c.jal"));
        // c.sdsp has no RV32 counterpart here
        assert_eq!(COMPRESSED.find(0xec06, 64).map(|p| p.name), Some("c.sdsp"));
        assert_eq!(COMPRESSED.find(0xec06, 32), None);
    }

    #[test]
    fn test_extract_cmv() {
        let ops = Format::CMv.extract(0x840a);
        assert_eq!((ops.rd, ops.rs1, ops.rs2), (8, 2, 0));
    }

    #[test]
    fn test_extract_caddi4spn() {
        // c.addi4spn s0, sp, 32 (0x1000)
        let ops = Format::CAddi4spn.extract(0x1000);
        assert_eq!((ops.rd, ops.rs1, ops.imm), (8, REG_SP, 32));
    }

    #[test]
    fn test_extract_caddw() {
        // c.addw a0, a1 (0x9d2d)
        let ops = Format::CArith.extract(0x9d2d);
        assert_eq!((ops.rd, ops.rs1, ops.rs2), (10, 10, 11));
    }

    #[test]
    fn test_base_lr_sc_masks() {
        // lr.w a0, (a1) (0x1005a52f)
        assert_eq!(BASE.find(0x1005_a52f, 64).map(|p| p.opcode), Some(Op::Lr));
        // sc.d a3, a2, (a0) (0x18c536af)
        assert_eq!(BASE.find(0x18c5_36af, 64).map(|p| p.opcode), Some(Op::Sc));
        // amoadd.w (0x00b5252f) is neither
        assert_eq!(BASE.find(0x00b5_252f, 64), None);
    }
}

//! Bit-field and immediate extraction for RISC-V instruction formats.

/// Decode I-type immediate (bits [31:20] sign-extended).
#[inline]
#[must_use]
pub const fn decode_i_imm(instr: u32) -> i32 {
    (instr as i32) >> 20
}

/// Decode S-type immediate (bits [31:25] | [11:7] sign-extended).
#[inline]
#[must_use]
pub const fn decode_s_imm(instr: u32) -> i32 {
    let imm11_5 = (instr >> 25) & 0x7F;
    let imm4_0 = (instr >> 7) & 0x1F;
    let imm = (imm11_5 << 5) | imm4_0;
    // Sign extend from 12 bits
    ((imm as i32) << 20) >> 20
}

/// Decode B-type immediate (bits [31] | [7] | [30:25] | [11:8] sign-extended, << 1).
#[inline]
#[must_use]
pub const fn decode_b_imm(instr: u32) -> i32 {
    let imm12 = (instr >> 31) & 0x1;
    let imm11 = (instr >> 7) & 0x1;
    let imm10_5 = (instr >> 25) & 0x3F;
    let imm4_1 = (instr >> 8) & 0xF;
    let imm = (imm12 << 12) | (imm11 << 11) | (imm10_5 << 5) | (imm4_1 << 1);
    // Sign extend from 13 bits
    ((imm as i32) << 19) >> 19
}

/// Decode U-type immediate (bits [31:12] << 12).
#[inline]
#[must_use]
pub const fn decode_u_imm(instr: u32) -> i32 {
    (instr & 0xFFFF_F000) as i32
}

/// Decode J-type immediate (bits [31] | [19:12] | [20] | [30:21] sign-extended, << 1).
#[inline]
#[must_use]
pub const fn decode_j_imm(instr: u32) -> i32 {
    let imm20 = (instr >> 31) & 0x1;
    let imm19_12 = (instr >> 12) & 0xFF;
    let imm11 = (instr >> 20) & 0x1;
    let imm10_1 = (instr >> 21) & 0x3FF;
    let imm = (imm20 << 20) | (imm19_12 << 12) | (imm11 << 11) | (imm10_1 << 1);
    // Sign extend from 21 bits
    ((imm as i32) << 11) >> 11
}

/// Extract rd field (bits [11:7]).
#[inline]
#[must_use]
pub const fn decode_rd(instr: u32) -> u8 {
    ((instr >> 7) & 0x1F) as u8
}

/// Extract rs1 field (bits [19:15]).
#[inline]
#[must_use]
pub const fn decode_rs1(instr: u32) -> u8 {
    ((instr >> 15) & 0x1F) as u8
}

/// Extract rs2 field (bits [24:20]).
#[inline]
#[must_use]
pub const fn decode_rs2(instr: u32) -> u8 {
    ((instr >> 20) & 0x1F) as u8
}

// Andes vendor branches

/// Bit index tested by `bbc`/`bbs` (bits [24:20] | [7] << 5).
#[inline]
#[must_use]
pub const fn decode_bit_index(instr: u32) -> u8 {
    (((instr >> 20) & 0x1F) | (((instr >> 7) & 0x1) << 5)) as u8
}

/// Constant compared by `beqc`/`bnec` (bits [24:20] | [7] << 5 | [30] << 6).
#[inline]
#[must_use]
pub const fn decode_branch_const(instr: u32) -> u8 {
    (((instr >> 20) & 0x1F) | (((instr >> 7) & 0x1) << 5) | (((instr >> 30) & 0x1) << 6)) as u8
}

/// Vendor branch offset (bits [31] | [29:25] | [11:8] sign-extended, << 1).
#[inline]
#[must_use]
pub const fn decode_vendor_branch_imm(instr: u32) -> i32 {
    let imm10 = (instr >> 31) & 0x1;
    let imm9_5 = (instr >> 25) & 0x1F;
    let imm4_1 = (instr >> 8) & 0xF;
    let imm = (imm10 << 10) | (imm9_5 << 5) | (imm4_1 << 1);
    // Sign extend from 11 bits
    ((imm as i32) << 21) >> 21
}

// Compressed formats

/// Full register field at bits [11:7].
#[inline]
#[must_use]
pub const fn decode_c_rd(instr: u16) -> u8 {
    ((instr >> 7) & 0x1F) as u8
}

/// Full register field at bits [6:2].
#[inline]
#[must_use]
pub const fn decode_c_rs2(instr: u16) -> u8 {
    ((instr >> 2) & 0x1F) as u8
}

/// Short register (x8-x15) at bits [9:7].
#[inline]
#[must_use]
pub const fn decode_c_rs1_short(instr: u16) -> u8 {
    ((instr >> 7) & 0x7) as u8 + 8
}

/// Short register (x8-x15) at bits [4:2].
#[inline]
#[must_use]
pub const fn decode_c_rs2_short(instr: u16) -> u8 {
    ((instr >> 2) & 0x7) as u8 + 8
}

#[must_use]
pub const fn decode_ci_imm(instr: u16) -> i8 {
    let imm = (((instr >> 2) & 0x1F) | (((instr >> 12) & 0x1) << 5)) as u8;
    ((imm as i8) << 2) >> 2
}

#[must_use]
pub const fn decode_ci_lui_imm(instr: u16) -> i32 {
    let imm = (((instr >> 2) & 0x1F) | (((instr >> 12) & 0x1) << 5)) as u32;
    let imm = imm << 12;
    ((imm as i32) << 14) >> 14
}

#[must_use]
pub const fn decode_ci16sp_imm(instr: u16) -> i16 {
    let imm = (((instr >> 6) & 0x1) << 4)
        | (((instr >> 2) & 0x1) << 5)
        | (((instr >> 5) & 0x1) << 6)
        | (((instr >> 3) & 0x3) << 7)
        | (((instr >> 12) & 0x1) << 9);
    ((imm as i16) << 6) >> 6
}

#[must_use]
pub const fn decode_addi4spn_imm(instr: u16) -> u16 {
    (((instr >> 6) & 0x1) << 2)
        | (((instr >> 5) & 0x1) << 3)
        | (((instr >> 11) & 0x3) << 4)
        | (((instr >> 7) & 0xF) << 6)
}

#[must_use]
pub const fn decode_cj_imm(instr: u16) -> i16 {
    let imm = (((instr >> 3) & 0x7) << 1)
        | (((instr >> 11) & 0x1) << 4)
        | (((instr >> 2) & 0x1) << 5)
        | (((instr >> 7) & 0x1) << 6)
        | (((instr >> 6) & 0x1) << 7)
        | (((instr >> 9) & 0x3) << 8)
        | (((instr >> 8) & 0x1) << 10)
        | (((instr >> 12) & 0x1) << 11);
    ((imm as i16) << 4) >> 4
}

#[must_use]
pub const fn decode_cb_imm(instr: u16) -> i16 {
    let imm = (((instr >> 3) & 0x3) << 1)
        | (((instr >> 10) & 0x3) << 3)
        | (((instr >> 2) & 0x1) << 5)
        | (((instr >> 5) & 0x3) << 6)
        | (((instr >> 12) & 0x1) << 8);
    ((imm as i16) << 7) >> 7
}

#[must_use]
pub const fn decode_cs_sw_offset(instr: u16) -> u8 {
    ((((instr >> 6) & 0x1) << 2) | (((instr >> 10) & 0x7) << 3) | (((instr >> 5) & 0x1) << 6)) as u8
}

#[must_use]
pub const fn decode_cs_sd_offset(instr: u16) -> u8 {
    ((((instr >> 10) & 0x7) << 3) | (((instr >> 5) & 0x3) << 6)) as u8
}

#[must_use]
pub const fn decode_css_swsp_offset(instr: u16) -> u8 {
    ((((instr >> 9) & 0xF) << 2) | (((instr >> 7) & 0x3) << 6)) as u8
}

#[must_use]
pub const fn decode_css_sdsp_offset(instr: u16) -> u16 {
    (((instr >> 10) & 0x7) << 3) | (((instr >> 7) & 0x7) << 6)
}

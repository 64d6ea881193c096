//! Core types for RISC-V ISA: register width and register numbering.

use std::fmt::Debug;

/// Marker type for RV32.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rv32;

/// Marker type for RV64.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rv64;

/// Trait for XLEN-dependent operations.
///
/// Addresses and register values are carried as `u64`; implementations
/// narrow them to the register width.
pub trait Xlen: Copy + Clone + Send + Sync + Default + Debug + 'static {
    /// XLEN value (32 or 64).
    const VALUE: u8;

    /// Bytes per register (4 for RV32, 8 for RV64).
    const REG_BYTES: usize;

    /// Truncate a value to register width.
    fn wrap(val: u64) -> u64;

    /// Interpret a register value as signed.
    fn to_signed(val: u64) -> i64;
}

impl Xlen for Rv32 {
    const VALUE: u8 = 32;
    const REG_BYTES: usize = 4;

    #[inline]
    fn wrap(val: u64) -> u64 {
        val & 0xFFFF_FFFF
    }

    #[inline]
    fn to_signed(val: u64) -> i64 {
        i64::from(val as u32 as i32)
    }
}

impl Xlen for Rv64 {
    const VALUE: u8 = 64;
    const REG_BYTES: usize = 8;

    #[inline]
    fn wrap(val: u64) -> u64 {
        val
    }

    #[inline]
    fn to_signed(val: u64) -> i64 {
        val as i64
    }
}

// Number of registers
pub const NUM_REGS_I: usize = 32;
pub const NUM_REGS_E: usize = 16;

// Register ABI names
pub const REG_ZERO: u8 = 0;
pub const REG_RA: u8 = 1;
pub const REG_SP: u8 = 2;
pub const REG_GP: u8 = 3;
pub const REG_TP: u8 = 4;
pub const REG_T0: u8 = 5;
pub const REG_S0: u8 = 8;
pub const REG_FP: u8 = 8; // Frame pointer alias for s0
pub const REG_S1: u8 = 9;
pub const REG_A0: u8 = 10;
pub const REG_A1: u8 = 11;
pub const REG_A7: u8 = 17;

// Debugger register numbering: x0-x31, pc, then f0-f31.
pub const PC_REGNUM: u32 = 32;
pub const FIRST_FP_REGNUM: u32 = 33;
pub const FA0_REGNUM: u32 = FIRST_FP_REGNUM + 10;
pub const LAST_FP_REGNUM: u32 = FIRST_FP_REGNUM + 31;

/// Register number of integer register `x<n>`.
#[must_use]
pub const fn xreg(n: u8) -> u32 {
    n as u32
}

/// Register number of float register `f<n>`.
#[must_use]
pub const fn freg(n: u8) -> u32 {
    FIRST_FP_REGNUM + n as u32
}

const XREG_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

const FREG_NAMES: [&str; 32] = [
    "ft0", "ft1", "ft2", "ft3", "ft4", "ft5", "ft6", "ft7", "fs0", "fs1", "fa0", "fa1", "fa2",
    "fa3", "fa4", "fa5", "fa6", "fa7", "fs2", "fs3", "fs4", "fs5", "fs6", "fs7", "fs8", "fs9",
    "fs10", "fs11", "ft8", "ft9", "ft10", "ft11",
];

/// Get integer register ABI name.
#[must_use]
pub fn reg_name(reg: u8) -> &'static str {
    XREG_NAMES.get(usize::from(reg)).copied().unwrap_or("??")
}

/// Get the ABI name for a debugger register number.
#[must_use]
pub fn regnum_name(regnum: u32) -> &'static str {
    match regnum {
        0..=31 => XREG_NAMES[regnum as usize],
        PC_REGNUM => "pc",
        FIRST_FP_REGNUM..=LAST_FP_REGNUM => FREG_NAMES[(regnum - FIRST_FP_REGNUM) as usize],
        _ => "??",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xlen_rv32() {
        assert_eq!(Rv32::VALUE, 32);
        assert_eq!(Rv32::REG_BYTES, 4);
        assert_eq!(Rv32::wrap(0x1_0000_0004), 4);
        assert_eq!(Rv32::to_signed(0xFFFF_FFFF), -1);
    }

    #[test]
    fn test_xlen_rv64() {
        assert_eq!(Rv64::VALUE, 64);
        assert_eq!(Rv64::REG_BYTES, 8);
        assert_eq!(Rv64::wrap(0x1_0000_0004), 0x1_0000_0004);
        // 0xFFFFFFFF is positive at 64 bits
        assert_eq!(Rv64::to_signed(0xFFFF_FFFF), 0xFFFF_FFFF);
    }

    #[test]
    fn test_register_names() {
        assert_eq!(reg_name(REG_SP), "sp");
        assert_eq!(reg_name(REG_FP), "s0");
        assert_eq!(reg_name(40), "??");
        assert_eq!(regnum_name(PC_REGNUM), "pc");
        assert_eq!(regnum_name(FA0_REGNUM), "fa0");
        assert_eq!(regnum_name(freg(8)), "fs0");
        assert_eq!(regnum_name(xreg(REG_A0)), "a0");
    }
}

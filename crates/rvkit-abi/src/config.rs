//! Per-target calling convention parameters.

use rvkit_isa::{FA0_REGNUM, REG_A0, xreg};
use thiserror::Error;

/// Float ABI bits in the ELF header `e_flags`.
pub const EF_RISCV_FLOAT_ABI: u32 = 0x0006;
pub const EF_RISCV_FLOAT_ABI_SOFT: u32 = 0x0000;
pub const EF_RISCV_FLOAT_ABI_SINGLE: u32 = 0x0002;
pub const EF_RISCV_FLOAT_ABI_DOUBLE: u32 = 0x0004;
pub const EF_RISCV_FLOAT_ABI_QUAD: u32 = 0x0006;
/// Reduced (16 register) integer file.
pub const EF_RISCV_RVE: u32 = 0x0008;

/// Integer argument registers with the full register file (`a0`-`a7`).
pub const INT_ARG_REGS: u32 = 8;
/// Integer argument registers with the reduced register file (`a0`-`a5`).
pub const INT_ARG_REGS_REDUCED: u32 = 6;
/// Float argument registers (`fa0`-`fa7`).
pub const FLOAT_ARG_REGS: u32 = 8;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiError {
    #[error("unsupported register width of {bits} bits")]
    UnsupportedXlen { bits: u32 },
}

/// Register widths and argument registers of one ABI.
///
/// Widths are in bytes. Register numbers follow the debugger numbering
/// (`x0`-`x31` are 0-31, `f0`-`f31` start at [`rvkit_isa::FIRST_FP_REGNUM`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbiConfig {
    /// Integer register width.
    pub xlen: u32,
    /// Float register width, 0 for soft-float.
    pub flen: u32,
    pub first_int_arg: u32,
    pub last_int_arg: u32,
    pub first_float_arg: u32,
    pub last_float_arg: u32,
}

impl AbiConfig {
    /// ABI with `xlen`/`flen` byte widths, on the full or reduced
    /// integer register file.
    #[must_use]
    pub const fn new(xlen: u32, flen: u32, reduced: bool) -> Self {
        let int_regs = if reduced { INT_ARG_REGS_REDUCED } else { INT_ARG_REGS };
        let first_int_arg = xreg(REG_A0);
        Self {
            xlen,
            flen,
            first_int_arg,
            last_int_arg: first_int_arg + int_regs - 1,
            first_float_arg: FA0_REGNUM,
            last_float_arg: FA0_REGNUM + FLOAT_ARG_REGS - 1,
        }
    }

    #[must_use]
    pub const fn ilp32() -> Self {
        Self::new(4, 0, false)
    }

    #[must_use]
    pub const fn ilp32f() -> Self {
        Self::new(4, 4, false)
    }

    #[must_use]
    pub const fn ilp32d() -> Self {
        Self::new(4, 8, false)
    }

    #[must_use]
    pub const fn ilp32e() -> Self {
        Self::new(4, 0, true)
    }

    #[must_use]
    pub const fn lp64() -> Self {
        Self::new(8, 0, false)
    }

    #[must_use]
    pub const fn lp64f() -> Self {
        Self::new(8, 4, false)
    }

    #[must_use]
    pub const fn lp64d() -> Self {
        Self::new(8, 8, false)
    }

    #[must_use]
    pub const fn lp64q() -> Self {
        Self::new(8, 16, false)
    }

    /// ABI described by an ELF header: register width in bits and `e_flags`.
    ///
    /// # Errors
    ///
    /// Returns [`AbiError::UnsupportedXlen`] unless `xlen_bits` is 32 or 64.
    pub const fn from_elf_flags(xlen_bits: u32, e_flags: u32) -> Result<Self, AbiError> {
        let xlen = match xlen_bits {
            32 => 4,
            64 => 8,
            bits => return Err(AbiError::UnsupportedXlen { bits }),
        };
        let flen = match e_flags & EF_RISCV_FLOAT_ABI {
            EF_RISCV_FLOAT_ABI_SINGLE => 4,
            EF_RISCV_FLOAT_ABI_DOUBLE => 8,
            EF_RISCV_FLOAT_ABI_QUAD => 16,
            _ => 0,
        };
        Ok(Self::new(xlen, flen, e_flags & EF_RISCV_RVE != 0))
    }

    /// Whether float arguments can use float registers.
    #[must_use]
    pub const fn has_fp_abi(&self) -> bool {
        self.flen > 0
    }

    #[must_use]
    pub const fn is_reduced(&self) -> bool {
        self.last_int_arg - self.first_int_arg + 1 < INT_ARG_REGS
    }

    /// ABI name as accepted by `-mabi`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match (self.xlen, self.flen, self.is_reduced()) {
            (4, _, true) => "ilp32e",
            (8, _, true) => "lp64e",
            (4, 4, _) => "ilp32f",
            (4, 8, _) => "ilp32d",
            (4, 16, _) => "ilp32q",
            (4, _, _) => "ilp32",
            (_, 4, _) => "lp64f",
            (_, 8, _) => "lp64d",
            (_, 16, _) => "lp64q",
            _ => "lp64",
        }
    }
}

impl Default for AbiConfig {
    fn default() -> Self {
        Self::lp64d()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_configs() {
        let abi = AbiConfig::lp64d();
        assert_eq!((abi.xlen, abi.flen), (8, 8));
        assert_eq!((abi.first_int_arg, abi.last_int_arg), (10, 17));
        assert_eq!((abi.first_float_arg, abi.last_float_arg), (43, 50));
        assert_eq!(abi.name(), "lp64d");

        let abi = AbiConfig::ilp32e();
        assert_eq!(abi.last_int_arg, 15);
        assert!(abi.is_reduced());
        assert!(!abi.has_fp_abi());
        assert_eq!(abi.name(), "ilp32e");
    }

    #[test]
    fn test_from_elf_flags() {
        assert_eq!(AbiConfig::from_elf_flags(64, 0x5), Ok(AbiConfig::lp64d()));
        assert_eq!(AbiConfig::from_elf_flags(32, EF_RISCV_FLOAT_ABI_SINGLE), Ok(AbiConfig::ilp32f()));
        assert_eq!(AbiConfig::from_elf_flags(32, EF_RISCV_RVE), Ok(AbiConfig::ilp32e()));
        assert_eq!(AbiConfig::from_elf_flags(64, EF_RISCV_FLOAT_ABI_QUAD), Ok(AbiConfig::lp64q()));
        assert_eq!(
            AbiConfig::from_elf_flags(128, 0),
            Err(AbiError::UnsupportedXlen { bits: 128 })
        );
    }
}

//! In-place add/sub relocations used for label differences.

/// ELF relocation types that add or subtract a symbol value in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddSubReloc {
    Add8,
    Add16,
    Add32,
    Add64,
    Sub6,
    Sub8,
    Sub16,
    Sub32,
    Sub64,
}

pub const R_RISCV_ADD8: u32 = 33;
pub const R_RISCV_ADD16: u32 = 34;
pub const R_RISCV_ADD32: u32 = 35;
pub const R_RISCV_ADD64: u32 = 36;
pub const R_RISCV_SUB8: u32 = 37;
pub const R_RISCV_SUB16: u32 = 38;
pub const R_RISCV_SUB32: u32 = 39;
pub const R_RISCV_SUB64: u32 = 40;
pub const R_RISCV_SUB6: u32 = 52;

impl AddSubReloc {
    /// Map an ELF relocation type number.
    #[must_use]
    pub const fn from_type(r_type: u32) -> Option<Self> {
        Some(match r_type {
            R_RISCV_ADD8 => Self::Add8,
            R_RISCV_ADD16 => Self::Add16,
            R_RISCV_ADD32 => Self::Add32,
            R_RISCV_ADD64 => Self::Add64,
            R_RISCV_SUB6 => Self::Sub6,
            R_RISCV_SUB8 => Self::Sub8,
            R_RISCV_SUB16 => Self::Sub16,
            R_RISCV_SUB32 => Self::Sub32,
            R_RISCV_SUB64 => Self::Sub64,
            _ => return None,
        })
    }

    /// Size of the patched field in bits.
    #[must_use]
    pub const fn width_bits(self) -> u32 {
        match self {
            Self::Sub6 | Self::Add8 | Self::Sub8 => 8,
            Self::Add16 | Self::Sub16 => 16,
            Self::Add32 | Self::Sub32 => 32,
            Self::Add64 | Self::Sub64 => 64,
        }
    }

    /// Bits of the field that the relocation writes.
    #[must_use]
    pub const fn dst_mask(self) -> u64 {
        match self {
            Self::Sub6 => 0x3f,
            _ => match self.width_bits() {
                64 => u64::MAX,
                bits => (1_u64 << bits) - 1,
            },
        }
    }

    #[must_use]
    pub const fn is_sub(self) -> bool {
        matches!(
            self,
            Self::Sub6 | Self::Sub8 | Self::Sub16 | Self::Sub32 | Self::Sub64
        )
    }

    /// New field contents given the old contents and the relocation value.
    ///
    /// Bits outside [`dst_mask`](Self::dst_mask) keep their old value.
    #[must_use]
    pub const fn apply(self, old: u64, value: u64) -> u64 {
        let result = if self.is_sub() {
            old.wrapping_sub(value)
        } else {
            old.wrapping_add(value)
        };
        let mask = self.dst_mask();
        let field = match self.width_bits() {
            64 => u64::MAX,
            bits => (1_u64 << bits) - 1,
        };
        ((old & !mask) | (result & mask)) & field
    }
}

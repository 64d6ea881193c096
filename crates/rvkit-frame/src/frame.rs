//! Frame layout recovered from a prologue scan.

use rustc_hash::FxHashMap;
use rvkit_isa::{REG_FP, REG_RA, REG_SP, RegisterReader};

/// Where a frame's base lives and where its callee-saved registers went.
///
/// The frame base is the stack pointer value on entry to the function.
/// Saved-register offsets are relative to it, so they are negative on a
/// downward-growing stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameCache {
    /// Register the frame base is computed from (`sp` or `fp`).
    pub base_reg: u8,
    /// Add to the current value of `base_reg` to get the frame base.
    pub base_offset: i64,
    saved: FxHashMap<u8, i64>,
}

impl FrameCache {
    #[must_use]
    pub fn new(base_reg: u8, base_offset: i64) -> Self {
        Self {
            base_reg,
            base_offset,
            saved: FxHashMap::default(),
        }
    }

    pub fn set_saved(&mut self, reg: u8, offset: i64) {
        self.saved.insert(reg, offset);
    }

    #[must_use]
    pub const fn uses_frame_pointer(&self) -> bool {
        self.base_reg == REG_FP
    }

    /// Offset of `reg`'s save slot from the frame base.
    #[must_use]
    pub fn saved_offset(&self, reg: u8) -> Option<i64> {
        self.saved.get(&reg).copied()
    }

    /// Saved registers and their offsets, by register number.
    #[must_use]
    pub fn saved_registers(&self) -> Vec<(u8, i64)> {
        let mut saved: Vec<_> = self.saved.iter().map(|(&r, &o)| (r, o)).collect();
        saved.sort_unstable();
        saved
    }

    /// Frame base address, given the frame's live registers.
    pub fn frame_base(&self, regs: &impl RegisterReader) -> u64 {
        regs.read_register(self.base_reg)
            .wrapping_add_signed(self.base_offset)
    }

    /// Stack pointer of the caller, which is the frame base.
    pub fn caller_sp(&self, regs: &impl RegisterReader) -> u64 {
        self.frame_base(regs)
    }

    /// Address `reg` was saved at, if the prologue saved it.
    pub fn saved_register_address(&self, reg: u8, regs: &impl RegisterReader) -> Option<u64> {
        let offset = self.saved_offset(reg)?;
        Some(self.frame_base(regs).wrapping_add_signed(offset))
    }

    /// Address holding the caller's pc, which is wherever `ra` was saved.
    pub fn saved_pc_address(&self, regs: &impl RegisterReader) -> Option<u64> {
        self.saved_register_address(REG_RA, regs)
    }
}

impl Default for FrameCache {
    fn default() -> Self {
        Self::new(REG_SP, 0)
    }
}

//! Prologue scanner.
//!
//! Walks a function's entry code tracking each integer register as a
//! [`SymbolicValue`] and recording stack stores. The scan stops at the first
//! instruction that is not a recognized prologue pattern.

use rvkit_isa::{
    DecodedInsn, Decoder, InsnSource, MemoryError, NUM_REGS_I, Opcode, REG_FP, REG_SP, Xlen,
};
use tracing::{debug, trace, trace_span};

use crate::frame::FrameCache;
use crate::stack::StackArea;
use crate::value::{RegisterState, SymbolicValue};

/// Bytes scanned past the function start when no line-table bound is known.
pub const DEFAULT_SCAN_WINDOW: u64 = 100;

/// Address bounds for a prologue scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanLimits {
    /// Caller-supplied upper bound, typically the current pc.
    pub end: Option<u64>,
    /// End of prologue according to line-table information.
    pub post_prologue: Option<u64>,
}

impl ScanLimits {
    /// No caller bound and no line table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            end: None,
            post_prologue: None,
        }
    }

    #[must_use]
    pub const fn with_end(mut self, end: u64) -> Self {
        self.end = Some(end);
        self
    }

    #[must_use]
    pub const fn with_post_prologue(mut self, addr: u64) -> Self {
        self.post_prologue = Some(addr);
        self
    }

    /// First address not scanned for a function starting at `start`.
    #[must_use]
    pub fn bound(&self, start: u64) -> u64 {
        let after = self
            .post_prologue
            .unwrap_or_else(|| start.saturating_add(DEFAULT_SCAN_WINDOW));
        self.end.map_or(after, |end| end.min(after))
    }
}

/// Result of scanning one prologue.
#[derive(Clone, Debug)]
pub struct PrologueScan {
    start: u64,
    end: u64,
    reg_bytes: u8,
    regs: RegisterState,
    stack: StackArea,
    fault: Option<MemoryError>,
}

impl PrologueScan {
    fn new(start: u64, reg_bytes: u8) -> Self {
        Self {
            start,
            end: start,
            reg_bytes,
            regs: RegisterState::new(),
            stack: StackArea::new(REG_SP),
            fault: None,
        }
    }

    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Address of the first instruction after the prologue.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Value of `reg` at [`Self::end`].
    #[must_use]
    pub fn register(&self, reg: u8) -> SymbolicValue {
        self.regs.get(reg)
    }

    #[must_use]
    pub const fn stack(&self) -> &StackArea {
        &self.stack
    }

    /// Fetch fault that cut the scan short, if any.
    #[must_use]
    pub const fn fault(&self) -> Option<MemoryError> {
        self.fault
    }

    /// Net change to `sp` over the prologue, if it is still `sp`-relative.
    #[must_use]
    pub fn stack_adjustment(&self) -> Option<i64> {
        self.regs.get(REG_SP).offset_from(REG_SP)
    }

    /// Frame base and save slots for the frame unwinder.
    ///
    /// The frame is `fp`-based when `fp` holds an `sp`-relative value,
    /// otherwise `sp`-based.
    #[must_use]
    pub fn frame_cache(&self) -> FrameCache {
        let mut cache = match self.regs.get(REG_FP).offset_from(REG_SP) {
            Some(k) => FrameCache::new(REG_FP, -k),
            None => FrameCache::new(REG_SP, -self.stack_adjustment().unwrap_or(0)),
        };
        for reg in (0u8..).take(NUM_REGS_I) {
            if let Some(offset) = self.stack.find_reg(reg, self.reg_bytes) {
                debug!(reg = rvkit_isa::reg_name(reg), offset, "register saved on stack");
                cache.set_saved(reg, offset);
            }
        }
        cache
    }

    /// Apply one instruction. Returns false if it is not part of a prologue.
    fn apply<X: Xlen>(&mut self, insn: &DecodedInsn, pc: u64) -> bool {
        let regs = &mut self.regs;
        match insn.opcode {
            // addi sp, sp, -n / addiw sp, sp, -n
            Opcode::Addi | Opcode::Addiw if insn.rd == REG_SP && insn.rs1 == REG_SP => {
                regs.set(insn.rd, regs.get(insn.rs1).add_constant(insn.imm));
            }
            // sw/sd reg, off(sp) / sw/sd reg, off(s0)
            Opcode::Sw | Opcode::Sd if insn.rs1 == REG_SP || insn.rs1 == REG_FP => {
                let size = if insn.opcode == Opcode::Sw { 4 } else { 8 };
                let addr = regs.get(insn.rs1).add_constant(insn.imm);
                self.stack.store(addr, size, regs.get(insn.rs2));
            }
            // add s0, sp, 0 / addw s0, sp, 0 / mv s0, sp
            Opcode::Add | Opcode::Addw
                if insn.rd == REG_FP && insn.rs1 == REG_SP && insn.rs2 == 0 =>
            {
                regs.set(insn.rd, regs.get(insn.rs1));
            }
            Opcode::Auipc => {
                let value = X::wrap(pc.wrapping_add_signed(insn.imm));
                regs.set(insn.rd, SymbolicValue::Constant(value));
            }
            Opcode::Lui => {
                regs.set(insn.rd, SymbolicValue::Constant(X::wrap(insn.imm as u64)));
            }
            // Includes addi s0, sp, n and the canonical nop.
            Opcode::Addi => {
                regs.set(insn.rd, regs.get(insn.rs1).add_constant(insn.imm));
            }
            Opcode::Add => {
                regs.set(insn.rd, regs.get(insn.rs1).add(regs.get(insn.rs2)));
            }
            _ => return false,
        }
        true
    }
}

/// Scan the prologue of the function at `start`.
///
/// A fetch fault ends the scan at the faulting address; the fault is kept
/// in [`PrologueScan::fault`].
pub fn scan_prologue<X: Xlen>(
    decoder: &Decoder<X>,
    source: &impl InsnSource,
    start: u64,
    limits: ScanLimits,
) -> PrologueScan {
    let bound = limits.bound(start);
    let _span = trace_span!("scan_prologue", start, bound).entered();
    let reg_bytes = u8::try_from(X::REG_BYTES).unwrap_or(8);

    let mut scan = PrologueScan::new(start, reg_bytes);
    let mut pc = start;
    while pc < bound {
        let insn = match decoder.decode_at(source, pc) {
            Ok(insn) => insn,
            Err(err) => {
                debug!(pc, %err, "instruction fetch failed, ending prologue scan");
                scan.fault = Some(err);
                break;
            }
        };
        if !scan.apply::<X>(&insn, pc) {
            trace!(pc, opcode = %insn.opcode, "not a prologue instruction");
            break;
        }
        let Some(next) = pc.checked_add(u64::from(insn.length)) else {
            debug!(pc, "prologue runs off the end of the address space");
            break;
        };
        pc = next;
    }
    scan.end = pc;
    debug!(start, end = pc, "end of prologue");
    scan
}

/// Address of the first instruction after the prologue of the function
/// containing `pc`, which must be the function start when no line-table
/// bound is supplied.
pub fn skip_prologue<X: Xlen>(
    decoder: &Decoder<X>,
    source: &impl InsnSource,
    pc: u64,
    post_prologue: Option<u64>,
) -> u64 {
    if let Some(post) = post_prologue {
        return pc.max(post);
    }
    scan_prologue(decoder, source, pc, ScanLimits::new()).end()
}

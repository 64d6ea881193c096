//! Software single-step support: next-pc computation and breakpoints.

use tracing::debug;

use crate::decode::{DecodedInsn, Decoder, insn_length};
use crate::opcode::Opcode;
use crate::source::{InsnSource, MemoryError};
use crate::types::Xlen;

/// Read access to integer registers.
pub trait RegisterReader {
    fn read_register(&self, reg: u8) -> u64;
}

impl RegisterReader for [u64; 32] {
    fn read_register(&self, reg: u8) -> u64 {
        self.get(usize::from(reg)).copied().unwrap_or(0)
    }
}

impl<F: Fn(u8) -> u64> RegisterReader for F {
    fn read_register(&self, reg: u8) -> u64 {
        self(reg)
    }
}

fn read<X: Xlen>(regs: &impl RegisterReader, reg: u8) -> u64 {
    if reg == 0 { 0 } else { X::wrap(regs.read_register(reg)) }
}

fn offset(pc: u64, imm: i64) -> u64 {
    pc.wrapping_add_signed(imm)
}

/// Whether a decoded conditional branch is taken.
fn branch_taken<X: Xlen>(insn: &DecodedInsn, regs: &impl RegisterReader) -> bool {
    let src1 = read::<X>(regs, insn.rs1);
    let src2 = || read::<X>(regs, insn.rs2);
    let const2 = u64::from(insn.rs2);
    match insn.opcode {
        Opcode::Beq => src1 == src2(),
        Opcode::Bne => src1 != src2(),
        Opcode::Blt => X::to_signed(src1) < X::to_signed(src2()),
        Opcode::Bge => X::to_signed(src1) >= X::to_signed(src2()),
        Opcode::Bltu => src1 < src2(),
        Opcode::Bgeu => src1 >= src2(),
        Opcode::Bbc => src1.checked_shr(u32::from(insn.rs2)).unwrap_or(0) & 1 == 0,
        Opcode::Bbs => src1.checked_shr(u32::from(insn.rs2)).unwrap_or(0) & 1 != 0,
        Opcode::Beqc => src1 == const2,
        Opcode::Bnec => src1 != const2,
        _ => false,
    }
}

/// Address of the instruction executed after the one at `pc`.
///
/// # Errors
///
/// Propagates a fault fetching the instruction.
pub fn next_pc<X: Xlen>(
    decoder: &Decoder<X>,
    source: &impl InsnSource,
    regs: &impl RegisterReader,
    pc: u64,
) -> Result<u64, MemoryError> {
    let insn = decoder.decode_at(source, pc)?;
    let next = match insn.opcode {
        Opcode::Jal => offset(pc, insn.imm),
        Opcode::Jalr => offset(read::<X>(regs, insn.rs1), insn.imm) & !1,
        op if op.is_branch() && branch_taken::<X>(&insn, regs) => offset(pc, insn.imm),
        _ => pc + u64::from(insn.length),
    };
    Ok(X::wrap(next))
}

/// End of an `lr; bne; sc; bne` sequence starting at `pc`.
///
/// Breakpoints cannot be placed inside such a sequence, so it is stepped
/// as a whole. The first `bne` must exit to the address right after the
/// sequence and the second must loop back to `pc`. Returns `None` when the
/// code at `pc` is not such a sequence.
///
/// # Errors
///
/// Propagates a fault fetching any of the four instructions.
pub fn atomic_sequence_end<X: Xlen>(
    decoder: &Decoder<X>,
    source: &impl InsnSource,
    pc: u64,
) -> Result<Option<u64>, MemoryError> {
    let mut cur = pc;

    let insn = decoder.decode_at(source, cur)?;
    if insn.opcode != Opcode::Lr {
        return Ok(None);
    }
    cur += u64::from(insn.length);

    let insn = decoder.decode_at(source, cur)?;
    if insn.opcode != Opcode::Bne {
        return Ok(None);
    }
    let exit = offset(cur, insn.imm);
    cur += u64::from(insn.length);

    let insn = decoder.decode_at(source, cur)?;
    if insn.opcode != Opcode::Sc {
        return Ok(None);
    }
    cur += u64::from(insn.length);

    let insn = decoder.decode_at(source, cur)?;
    if insn.opcode != Opcode::Bne || offset(cur, insn.imm) != pc {
        return Ok(None);
    }
    cur += u64::from(insn.length);

    if cur != exit {
        return Ok(None);
    }
    debug!(start = pc, end = cur, "stepping over atomic sequence");
    Ok(Some(cur))
}

/// Addresses to place single-step breakpoints at.
///
/// # Errors
///
/// Propagates a fault fetching instructions.
pub fn software_single_step<X: Xlen>(
    decoder: &Decoder<X>,
    source: &impl InsnSource,
    regs: &impl RegisterReader,
    pc: u64,
) -> Result<Vec<u64>, MemoryError> {
    if let Some(end) = atomic_sequence_end(decoder, source, pc)? {
        return Ok(vec![end]);
    }
    Ok(vec![next_pc(decoder, source, regs, pc)?])
}

/// Whether to use 2-byte `c.ebreak` breakpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompressedBreakpoints {
    /// Pick per address from alignment and the instruction length.
    #[default]
    Auto,
    Always,
    Never,
}

/// Breakpoint size in bytes (2 or 4) for `addr`.
///
/// # Errors
///
/// In `Auto` mode, propagates a fault reading the first instruction byte.
pub fn breakpoint_kind(
    source: &impl InsnSource,
    addr: u64,
    policy: CompressedBreakpoints,
) -> Result<u8, MemoryError> {
    match policy {
        CompressedBreakpoints::Always => Ok(2),
        CompressedBreakpoints::Never => Ok(4),
        CompressedBreakpoints::Auto => {
            // Only 2-byte aligned addresses imply the C extension.
            if addr & 0x2 != 0 {
                return Ok(2);
            }
            let mut first = [0u8; 1];
            source.read(addr, &mut first)?;
            Ok(if insn_length(u16::from(first[0])) == 2 { 2 } else { 4 })
        }
    }
}

/// Breakpoint instruction bytes for a kind returned by [`breakpoint_kind`].
#[must_use]
pub const fn breakpoint_bytes(kind: u8) -> &'static [u8] {
    const C_EBREAK: [u8; 2] = 0x9002_u16.to_le_bytes();
    const EBREAK: [u8; 4] = 0x0010_0073_u32.to_le_bytes();
    if kind == 2 { &C_EBREAK } else { &EBREAK }
}

/// Align a stack address for a new frame.
#[must_use]
pub const fn frame_align(addr: u64) -> u64 {
    addr & !0xf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ImageSource;
    use crate::types::{Rv32, Rv64};

    fn image(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    fn regs_with(pairs: &[(u8, u64)]) -> [u64; 32] {
        let mut regs = [0; 32];
        for &(r, v) in pairs {
            regs[usize::from(r)] = v;
        }
        regs
    }

    #[test]
    fn test_next_pc_sequential_and_jal() {
        // addi a0, a0, 1; jal ra, 16
        let bytes = image(&[0x0015_0513, 0x0100_00ef]);
        let src = ImageSource::new(0x1000, &bytes);
        let dec = Decoder::<Rv64>::standard();
        let regs = [0u64; 32];
        assert_eq!(next_pc(&dec, &src, &regs, 0x1000).unwrap(), 0x1004);
        assert_eq!(next_pc(&dec, &src, &regs, 0x1004).unwrap(), 0x1014);
    }

    #[test]
    fn test_next_pc_jalr_clears_low_bit() {
        // jalr zero, 3(a0) (0x00350067)
        let bytes = image(&[0x0035_0067]);
        let src = ImageSource::new(0x1000, &bytes);
        let regs = regs_with(&[(10, 0x2000)]);
        let next = next_pc(&Decoder::<Rv64>::standard(), &src, &regs, 0x1000).unwrap();
        assert_eq!(next, 0x2002);
    }

    #[test]
    fn test_next_pc_signed_branch() {
        // blt a0, a1, 8 (0x00b54463)
        let bytes = image(&[0x00b5_4463]);
        let src = ImageSource::new(0x1000, &bytes);
        let dec = Decoder::<Rv32>::standard();
        // -1 < 1 when signed (32-bit)
        let regs = regs_with(&[(10, 0xFFFF_FFFF), (11, 1)]);
        assert_eq!(next_pc(&dec, &src, &regs, 0x1000).unwrap(), 0x1008);
        let regs = regs_with(&[(10, 2), (11, 1)]);
        assert_eq!(next_pc(&dec, &src, &regs, 0x1000).unwrap(), 0x1004);
    }

    #[test]
    fn test_next_pc_unsigned_branch() {
        // bltu a0, a1, 8 (0x00b56463)
        let bytes = image(&[0x00b5_6463]);
        let src = ImageSource::new(0x1000, &bytes);
        let regs = regs_with(&[(10, 0xFFFF_FFFF), (11, 1)]);
        let next = next_pc(&Decoder::<Rv32>::standard(), &src, &regs, 0x1000).unwrap();
        assert_eq!(next, 0x1004);
    }

    #[test]
    fn test_next_pc_vendor_branches() {
        // bbs a0, 3, +8 then beqc a0, 8, +8
        let bbs = 0x4000_705b | (3 << 20) | (10 << 15) | (0b0100 << 8);
        let beqc = 0x505b | (8 << 20) | (10 << 15) | (0b0100 << 8);
        let bytes = image(&[bbs, beqc]);
        let src = ImageSource::new(0x1000, &bytes);
        let dec = Decoder::<Rv64>::standard();
        let regs = |r: u8| -> u64 { if r == 10 { 8 } else { 0 } };
        assert_eq!(next_pc(&dec, &src, &regs, 0x1000).unwrap(), 0x1008);
        assert_eq!(next_pc(&dec, &src, &regs, 0x1004).unwrap(), 0x100c);
        let regs = |_: u8| 0_u64;
        assert_eq!(next_pc(&dec, &src, &regs, 0x1000).unwrap(), 0x1004);
    }

    #[test]
    fn test_atomic_sequence() {
        // 0x1000: lr.w a0, (a1)
        // 0x1004: bne a0, a2, 12   -> 0x1010
        // 0x1008: sc.w a3, a4, (a1)
        // 0x100c: bne a3, zero, -12 -> 0x1000
        let bytes = image(&[0x1005_a52f, 0x00c5_1663, 0x18e5_a6af, 0xfe06_9ae3]);
        let src = ImageSource::new(0x1000, &bytes);
        let dec = Decoder::<Rv64>::standard();
        assert_eq!(atomic_sequence_end(&dec, &src, 0x1000).unwrap(), Some(0x1010));
        assert_eq!(atomic_sequence_end(&dec, &src, 0x1004).unwrap(), None);
        let regs = [0u64; 32];
        assert_eq!(software_single_step(&dec, &src, &regs, 0x1000).unwrap(), vec![0x1010]);
    }

    #[test]
    fn test_atomic_sequence_fault() {
        // lr.w a0, (a1) with nothing mapped after it
        let bytes = image(&[0x1005_a52f]);
        let src = ImageSource::new(0x1000, &bytes);
        assert!(atomic_sequence_end(&Decoder::<Rv64>::standard(), &src, 0x1000).is_err());
    }

    #[test]
    fn test_breakpoint_kind() {
        // c.addi sp, -32 then addi s0, sp, 32
        let bytes = [0x01, 0x11, 0x00, 0x00, 0x13, 0x04, 0x01, 0x02];
        let src = ImageSource::new(0x1000, &bytes);
        let auto = CompressedBreakpoints::Auto;
        assert_eq!(breakpoint_kind(&src, 0x1000, auto).unwrap(), 2);
        assert_eq!(breakpoint_kind(&src, 0x1002, auto).unwrap(), 2);
        assert_eq!(breakpoint_kind(&src, 0x1004, auto).unwrap(), 4);
        assert_eq!(breakpoint_kind(&src, 0x1004, CompressedBreakpoints::Always).unwrap(), 2);
        assert_eq!(breakpoint_kind(&src, 0x9000, CompressedBreakpoints::Never).unwrap(), 4);
        assert!(breakpoint_kind(&src, 0x9000, auto).is_err());
        assert_eq!(breakpoint_bytes(2), &[0x02, 0x90]);
        assert_eq!(breakpoint_bytes(4), &[0x73, 0x00, 0x10, 0x00]);
    }

    #[test]
    fn test_frame_align() {
        assert_eq!(frame_align(0x1007), 0x1000);
        assert_eq!(frame_align(0x1010), 0x1010);
    }
}

//! Main instruction decoder.

use std::marker::PhantomData;

use tracing::trace;

use crate::opcode::Opcode;
use crate::source::{InsnSource, MemoryError};
use crate::table::{ANDES, BASE, COMPRESSED, PatternSet};
use crate::types::Xlen;

/// Decoded instruction.
///
/// Which of `rd`, `rs1`, `rs2` and `imm` are meaningful depends on `opcode`;
/// unused fields are zero. [`Opcode::Other`] carries no operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedInsn {
    /// Instruction size in bytes (2 for compressed, 4 for normal).
    pub length: u8,
    pub opcode: Opcode,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub imm: i64,
    /// Raw instruction word, little-endian.
    pub raw: u64,
}

impl DecodedInsn {
    /// An unrecognized instruction of the given length.
    #[must_use]
    pub const fn other(raw: u64, length: u8) -> Self {
        Self {
            length,
            opcode: Opcode::Other,
            rd: 0,
            rs1: 0,
            rs2: 0,
            imm: 0,
            raw,
        }
    }

    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        self.length == 2
    }
}

/// Instruction length from the first 16-bit parcel.
///
/// Encodings longer than 8 bytes are not supported and report 2.
#[must_use]
pub const fn insn_length(first: u16) -> u8 {
    if first & 0x3 != 0x3 {
        2
    } else if first & 0x1f != 0x1f {
        4
    } else if first & 0x3f == 0x1f {
        6
    } else if first & 0x7f == 0x3f {
        8
    } else {
        2
    }
}

/// Decoder that tries pattern sets in registration order.
#[derive(Clone, Debug)]
pub struct Decoder<X: Xlen> {
    sets: Vec<PatternSet>,
    _xlen: PhantomData<X>,
}

impl<X: Xlen> Default for Decoder<X> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<X: Xlen> Decoder<X> {
    /// Decoder with no patterns; every word decodes to [`Opcode::Other`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sets: Vec::new(),
            _xlen: PhantomData,
        }
    }

    /// Compressed, base and Andes vendor encodings.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with_patterns(COMPRESSED)
            .with_patterns(BASE)
            .with_patterns(ANDES)
    }

    /// Append a pattern set. Earlier sets take priority.
    #[must_use]
    pub fn with_patterns(mut self, set: PatternSet) -> Self {
        self.sets.push(set);
        self
    }

    pub fn pattern_sets(&self) -> impl Iterator<Item = &PatternSet> {
        self.sets.iter()
    }

    /// Decode an already fetched instruction word of `length` bytes.
    #[must_use]
    pub fn decode_word(&self, raw: u64, length: u8) -> DecodedInsn {
        if length > 4 {
            return DecodedInsn::other(raw, length);
        }
        let word = raw as u32;
        let found = self
            .sets
            .iter()
            .filter(|set| set.length == length)
            .find_map(|set| set.find(word, X::VALUE));

        match found {
            Some(pattern) => {
                let ops = pattern.format.extract(word);
                DecodedInsn {
                    length,
                    opcode: pattern.opcode,
                    rd: ops.rd,
                    rs1: ops.rs1,
                    rs2: ops.rs2,
                    imm: ops.imm,
                    raw,
                }
            }
            None => DecodedInsn::other(raw, length),
        }
    }

    /// Length of the instruction at `addr`.
    ///
    /// # Errors
    ///
    /// Propagates a fault reading the first two bytes.
    pub fn length_at(&self, source: &impl InsnSource, addr: u64) -> Result<u8, MemoryError> {
        let mut first = [0u8; 2];
        source.read(addr, &mut first)?;
        Ok(insn_length(u16::from_le_bytes(first)))
    }

    /// Fetch and decode the instruction at `addr`.
    ///
    /// Reads two bytes first, then the rest once the length is known.
    ///
    /// # Errors
    ///
    /// Propagates a fault from either read; unknown encodings are not errors.
    pub fn decode_at(&self, source: &impl InsnSource, addr: u64) -> Result<DecodedInsn, MemoryError> {
        let mut buf = [0u8; 8];
        source.read(addr, &mut buf[..2])?;
        let length = insn_length(u16::from_le_bytes([buf[0], buf[1]]));
        let len = usize::from(length);
        if len > 2 {
            let rest = addr.checked_add(2).ok_or(MemoryError { addr, len })?;
            source.read(rest, &mut buf[2..len])?;
        }
        let insn = self.decode_word(u64::from_le_bytes(buf), length);
        trace!(addr, opcode = %insn.opcode, length, "decoded instruction");
        Ok(insn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ImageSource;
    use crate::types::{REG_A0, REG_FP, REG_RA, REG_SP, Rv32, Rv64};

    fn decode64(raw: u64, length: u8) -> DecodedInsn {
        Decoder::<Rv64>::standard().decode_word(raw, length)
    }

    #[test]
    fn test_insn_length() {
        assert_eq!(insn_length(0x0001), 2);
        assert_eq!(insn_length(0x0113), 4);
        assert_eq!(insn_length(0x001f), 6);
        assert_eq!(insn_length(0x003f), 8);
        assert_eq!(insn_length(0x007f), 2);
    }

    #[test]
    fn test_decode_addi_sp() {
        // addi sp, sp, -16 (0xff010113)
        let insn = decode64(0xff01_0113, 4);
        assert_eq!(insn.opcode, Opcode::Addi);
        assert_eq!(insn.rd, REG_SP);
        assert_eq!(insn.rs1, REG_SP);
        assert_eq!(insn.imm, -16);
        assert_eq!(insn.length, 4);
    }

    #[test]
    fn test_decode_cmv_as_add() {
        // c.mv s0, sp (0x840a)
        let insn = decode64(0x840a, 2);
        assert_eq!(insn.opcode, Opcode::Add);
        assert_eq!(insn.rd, REG_FP);
        assert_eq!(insn.rs1, REG_SP);
        assert_eq!(insn.rs2, 0);
        assert!(insn.is_compressed());
    }

    #[test]
    fn test_decode_cadd() {
        // c.add a0, ra (0x9506)
        let insn = decode64(0x9506, 2);
        assert_eq!(insn.opcode, Opcode::Add);
        assert_eq!((insn.rd, insn.rs1, insn.rs2), (REG_A0, REG_A0, REG_RA));
    }

    #[test]
    fn test_decode_unknown_is_other() {
        // ecall (0x00000073)
        let insn = decode64(0x73, 4);
        assert_eq!(insn, DecodedInsn::other(0x73, 4));
        // c.li a0, 0 (0x4501)
        let insn = decode64(0x4501, 2);
        assert_eq!(insn.opcode, Opcode::Other);
        assert_eq!(insn.length, 2);
    }

    #[test]
    fn test_decode_compressed_stores() {
        // c.sdsp ra, 24(sp) (0xec06)
        let insn = decode64(0xec06, 2);
        assert_eq!(insn.opcode, Opcode::Sd);
        assert_eq!((insn.rs1, insn.rs2, insn.imm), (REG_SP, REG_RA, 24));
        // c.swsp ra, 12(sp) (0xc606)
        let insn = Decoder::<Rv32>::standard().decode_word(0xc606, 2);
        assert_eq!(insn.opcode, Opcode::Sw);
        assert_eq!((insn.rs1, insn.rs2, insn.imm), (REG_SP, REG_RA, 12));
    }

    #[test]
    fn test_decode_jumps() {
        // jal ra, 16 (0x010000ef)
        let insn = decode64(0x0100_00ef, 4);
        assert_eq!((insn.opcode, insn.rd, insn.imm), (Opcode::Jal, REG_RA, 16));
        // c.jr ra (0x8082)
        let insn = decode64(0x8082, 2);
        assert_eq!((insn.opcode, insn.rd, insn.rs1), (Opcode::Jalr, 0, REG_RA));
        // c.j -2 (0xbffd)
        let insn = decode64(0xbffd, 2);
        assert_eq!((insn.opcode, insn.rd, insn.imm), (Opcode::Jal, 0, -2));
    }

    #[test]
    fn test_decode_vendor_branch() {
        // bbc a0, 3, +8
        let raw = 0x705b | (3 << 20) | (10 << 15) | (0b0100 << 8);
        let insn = decode64(raw, 4);
        assert_eq!(insn.opcode, Opcode::Bbc);
        assert_eq!((insn.rs1, insn.rs2, insn.imm), (REG_A0, 3, 8));

        let insn = Decoder::<Rv64>::new()
            .with_patterns(crate::table::BASE)
            .decode_word(raw, 4);
        assert_eq!(insn.opcode, Opcode::Other);
    }

    #[test]
    fn test_decode_long_encoding_is_other() {
        let insn = decode64(0x0000_0000_001f, 6);
        assert_eq!(insn.opcode, Opcode::Other);
        assert_eq!(insn.length, 6);
    }

    #[test]
    fn test_decode_at_fetches_by_length() {
        // c.addi sp, -32; addi s0, sp, 32
        let bytes = [0x01, 0x11, 0x13, 0x04, 0x01, 0x02];
        let image = ImageSource::new(0x100, &bytes);
        let decoder = Decoder::<Rv64>::standard();

        let first = decoder.decode_at(&image, 0x100).unwrap();
        assert_eq!((first.opcode, first.rd, first.imm), (Opcode::Addi, REG_SP, -32));
        assert_eq!(first.length, 2);

        let second = decoder.decode_at(&image, 0x102).unwrap();
        assert_eq!((second.opcode, second.rd, second.rs1, second.imm), (Opcode::Addi, REG_FP, REG_SP, 32));
        assert_eq!(decoder.length_at(&image, 0x102).unwrap(), 4);
    }

    #[test]
    fn test_decode_at_last_parcel_of_memory() {
        // Upper parcel of addi s0, sp, 32 would lie past the top of memory.
        let bytes = [0x13, 0x04];
        let image = ImageSource::new(u64::MAX - 1, &bytes);
        let err = Decoder::<Rv64>::standard().decode_at(&image, u64::MAX - 1).unwrap_err();
        assert_eq!(err, MemoryError { addr: u64::MAX - 1, len: 4 });
    }

    #[test]
    fn test_decode_at_propagates_fault() {
        // First parcel says 4 bytes but only 2 are mapped.
        let bytes = [0x13, 0x04];
        let image = ImageSource::new(0x100, &bytes);
        let err = Decoder::<Rv64>::standard().decode_at(&image, 0x100).unwrap_err();
        assert_eq!(err, MemoryError { addr: 0x102, len: 2 });
    }
}

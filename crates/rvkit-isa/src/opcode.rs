//! Opcode classes reported by the decoder.

use std::fmt;

/// Closed set of instruction classes the analyses switch on.
///
/// Compressed instructions map to their base equivalent (`c.addi` is
/// [`Opcode::Addi`]). Anything else is [`Opcode::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Addi,
    Addiw,
    Addw,
    Auipc,
    Lui,
    Sd,
    Sw,
    Jal,
    Jalr,
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    /// Branch if bit `rs2` of `rs1` is clear.
    Bbc,
    /// Branch if bit `rs2` of `rs1` is set.
    Bbs,
    /// Branch if `rs1` equals the constant in `rs2`.
    Beqc,
    /// Branch if `rs1` differs from the constant in `rs2`.
    Bnec,
    Lr,
    Sc,
    Other,
}

impl Opcode {
    /// Conditional branch with a pc-relative target.
    #[must_use]
    pub const fn is_branch(self) -> bool {
        matches!(
            self,
            Self::Beq
                | Self::Bne
                | Self::Blt
                | Self::Bge
                | Self::Bltu
                | Self::Bgeu
                | Self::Bbc
                | Self::Bbs
                | Self::Beqc
                | Self::Bnec
        )
    }

    #[must_use]
    pub const fn is_store(self) -> bool {
        matches!(self, Self::Sd | Self::Sw)
    }

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Addi => "addi",
            Self::Addiw => "addiw",
            Self::Addw => "addw",
            Self::Auipc => "auipc",
            Self::Lui => "lui",
            Self::Sd => "sd",
            Self::Sw => "sw",
            Self::Jal => "jal",
            Self::Jalr => "jalr",
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Blt => "blt",
            Self::Bge => "bge",
            Self::Bltu => "bltu",
            Self::Bgeu => "bgeu",
            Self::Bbc => "bbc",
            Self::Bbs => "bbs",
            Self::Beqc => "beqc",
            Self::Bnec => "bnec",
            Self::Lr => "lr",
            Self::Sc => "sc",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

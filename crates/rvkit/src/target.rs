//! A parsed ISA paired with its calling convention.

use tracing::debug;

use rvkit_abi::{AbiConfig, ArgType, CallClassifier, ReturnConvention, classify_return};
use rvkit_arch::{IsaParser, SubsetList, VersionTable};
use rvkit_frame::{PrologueScan, ScanLimits, scan_prologue, skip_prologue};
use rvkit_isa::{
    CompressedBreakpoints, DecodedInsn, Decoder, InsnSource, RegisterReader, Rv32, Rv64,
    breakpoint_bytes, breakpoint_kind, software_single_step,
};

use crate::error::{Error, Result};

/// Default extension versions of the 2.2 user-level ISA, plus the
/// ratified Z extensions the parser knows.
#[must_use]
pub fn default_versions() -> VersionTable {
    VersionTable::new()
        .with("e", 1, 9)
        .with("i", 2, 0)
        .with("m", 2, 0)
        .with("a", 2, 0)
        .with("f", 2, 0)
        .with("d", 2, 0)
        .with("q", 2, 0)
        .with("c", 2, 0)
        .with("zicsr", 2, 0)
        .with("zifencei", 2, 0)
        .with("zihintpause", 2, 0)
        .with("zba", 1, 0)
        .with("zbb", 1, 0)
        .with("zbc", 1, 0)
        .with("zbs", 1, 0)
        .with("zicond", 1, 0)
}

/// The ABI a toolchain picks for an ISA when none is given.
#[must_use]
pub fn default_abi(isa: &SubsetList) -> AbiConfig {
    let rv64 = isa.xlen() == 64;
    if isa.contains("e") {
        return AbiConfig::new(if rv64 { 8 } else { 4 }, 0, true);
    }
    match (rv64, isa.contains("q"), isa.contains("d"), isa.contains("f")) {
        (true, true, _, _) => AbiConfig::lp64q(),
        (true, _, true, _) => AbiConfig::lp64d(),
        (true, _, _, true) => AbiConfig::lp64f(),
        (true, ..) => AbiConfig::lp64(),
        (false, _, true, _) => AbiConfig::ilp32d(),
        (false, _, _, true) => AbiConfig::ilp32f(),
        (false, ..) => AbiConfig::ilp32(),
    }
}

/// Target description: ISA subsets and ABI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    isa: SubsetList,
    abi: AbiConfig,
}

impl Target {
    /// Target with the default ABI for `isa`.
    #[must_use]
    pub fn new(isa: SubsetList) -> Self {
        let abi = default_abi(&isa);
        Self { isa, abi }
    }

    /// Target with an explicit ABI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::XlenMismatch`] if the ABI register width differs
    /// from the ISA's.
    pub fn with_abi(isa: SubsetList, abi: AbiConfig) -> Result<Self> {
        if abi.xlen * 8 != isa.xlen() {
            return Err(Error::XlenMismatch {
                isa: isa.xlen(),
                abi: abi.name(),
                expected: abi.xlen * 8,
            });
        }
        Ok(Self { isa, abi })
    }

    /// Parse `arch` with the toolchain parser and [`default_versions`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the string is rejected.
    pub fn parse(arch: &str) -> Result<Self> {
        Self::parse_with(&toolchain_parser(), arch)
    }

    /// Parse `arch` with a caller-configured parser.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the string is rejected.
    pub fn parse_with(parser: &IsaParser, arch: &str) -> Result<Self> {
        let target = Self::new(parser.parse(arch)?);
        debug!(isa = %target.isa, abi = target.abi.name(), "target");
        Ok(target)
    }

    #[must_use]
    pub const fn isa(&self) -> &SubsetList {
        &self.isa
    }

    #[must_use]
    pub const fn abi(&self) -> AbiConfig {
        self.abi
    }

    /// Register width in bits.
    #[must_use]
    pub const fn xlen(&self) -> u32 {
        self.isa.xlen()
    }

    /// Compressed breakpoints are only usable with the C extension.
    #[must_use]
    pub fn breakpoint_policy(&self) -> CompressedBreakpoints {
        if self.isa.contains("c") {
            CompressedBreakpoints::Auto
        } else {
            CompressedBreakpoints::Never
        }
    }

    /// Breakpoint instruction to write at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Memory`] if the instruction at `addr` is unreadable.
    pub fn breakpoint(&self, source: &impl InsnSource, addr: u64) -> Result<&'static [u8]> {
        let kind = breakpoint_kind(source, addr, self.breakpoint_policy())?;
        Ok(breakpoint_bytes(kind))
    }

    /// Decode the instruction at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Memory`] if the instruction bytes are unreadable.
    pub fn decode(&self, source: &impl InsnSource, addr: u64) -> Result<DecodedInsn> {
        let insn = if self.is_rv64() {
            Decoder::<Rv64>::standard().decode_at(source, addr)?
        } else {
            Decoder::<Rv32>::standard().decode_at(source, addr)?
        };
        Ok(insn)
    }

    /// Addresses to stop at after executing the instruction at `pc`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Memory`] if an instruction is unreadable.
    pub fn single_step(
        &self,
        source: &impl InsnSource,
        regs: &impl RegisterReader,
        pc: u64,
    ) -> Result<Vec<u64>> {
        let targets = if self.is_rv64() {
            software_single_step(&Decoder::<Rv64>::standard(), source, regs, pc)?
        } else {
            software_single_step(&Decoder::<Rv32>::standard(), source, regs, pc)?
        };
        Ok(targets)
    }

    #[must_use]
    pub fn scan_prologue(
        &self,
        source: &impl InsnSource,
        start: u64,
        limits: ScanLimits,
    ) -> PrologueScan {
        if self.is_rv64() {
            scan_prologue(&Decoder::<Rv64>::standard(), source, start, limits)
        } else {
            scan_prologue(&Decoder::<Rv32>::standard(), source, start, limits)
        }
    }

    #[must_use]
    pub fn skip_prologue(
        &self,
        source: &impl InsnSource,
        pc: u64,
        post_prologue: Option<u64>,
    ) -> u64 {
        if self.is_rv64() {
            skip_prologue(&Decoder::<Rv64>::standard(), source, pc, post_prologue)
        } else {
            skip_prologue(&Decoder::<Rv32>::standard(), source, pc, post_prologue)
        }
    }

    /// Start laying out the arguments of a call.
    #[must_use]
    pub fn call(&self) -> CallClassifier {
        CallClassifier::new(self.abi)
    }

    #[must_use]
    pub fn classify_return(&self, ty: &ArgType) -> ReturnConvention {
        classify_return(self.abi, ty)
    }

    const fn is_rv64(&self) -> bool {
        self.isa.xlen() == 64
    }
}

/// Parser with the Andes compatibility hook and [`default_versions`].
#[must_use]
pub fn toolchain_parser() -> IsaParser {
    IsaParser::toolchain().with_default_versions(default_versions())
}

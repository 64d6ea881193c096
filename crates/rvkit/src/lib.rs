//! rvkit - RISC-V target description toolkit
//!
//! Parses ISA strings, decodes instructions, recovers frames from function
//! prologues and places call arguments per the RISC-V psABI.
//!
//! # Example
//!
//! ```ignore
//! use rvkit::{ArgKind, ArgType, Target};
//!
//! let target = Target::parse("rv64gc")?;
//! assert_eq!(target.abi().name(), "lp64d");
//!
//! let mut call = target.call();
//! call.push(&ArgType::float(8), ArgKind::Named);
//! let layout = call.finish();
//! ```

// Re-export from sub-crates
pub use rvkit_abi::{
    AbiConfig, AbiError, ArgInfo, ArgKind, ArgLocation, ArgType, CallClassifier, CallLayout,
    CallState, Field, Fragment, Location, ReturnConvention, StackPointers, TypeKind,
    classify_return,
};
pub use rvkit_arch::reloc::AddSubReloc;
pub use rvkit_arch::{
    AndesCompat, ArchError, DefaultVersions, Extension, IsaParser, ParseFailure,
    PrefixClass, SubsetList, VendorHook, Version, VersionQuery, VersionTable,
};
pub use rvkit_frame::{
    FrameCache, PrologueScan, RegisterState, ScanLimits, StackArea, StackSlot, SymbolicValue,
    scan_prologue, skip_prologue,
};
pub use rvkit_isa::{
    CompressedBreakpoints, DecodedInsn, Decoder, ImageSource, InsnSource, MemoryError, Opcode,
    RegisterReader, Rv32, Rv64, Xlen, breakpoint_bytes, breakpoint_kind, decode, next_pc,
    software_single_step,
};

mod error;
pub mod logging;
mod target;

pub use error::*;
pub use target::*;

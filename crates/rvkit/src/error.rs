use thiserror::Error;

use rvkit_abi::AbiError;
use rvkit_arch::ParseFailure;
use rvkit_isa::MemoryError;

/// Toolkit errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("ISA string error: {0}")]
    Parse(#[from] ParseFailure),
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),
    #[error("XLEN mismatch: ISA is rv{isa}, ABI {abi} needs rv{expected}")]
    XlenMismatch {
        isa: u32,
        abi: &'static str,
        expected: u32,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

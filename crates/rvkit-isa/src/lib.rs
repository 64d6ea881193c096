//! RISC-V instruction decoding for program analysis.
//!
//! The decoder turns 16- and 32-bit encodings into a small [`Opcode`]
//! classification with operands, which is all the prologue analyzer and
//! single-step logic need. Encodings are matched against priority-ordered
//! [`PatternSet`] tables; extra tables (vendor extensions) can be appended
//! with [`Decoder::with_patterns`].

mod decode;
pub mod fields;
mod opcode;
mod source;
mod step;
pub mod table;
mod types;

pub use decode::*;
pub use opcode::*;
pub use source::*;
pub use step::*;
pub use table::{InsnPattern, PatternSet};
pub use types::*;

/// Decode one instruction at `addr` with the standard tables.
///
/// Convenience wrapper around `Decoder::standard().decode_at()`.
///
/// # Errors
///
/// Propagates a fault fetching the instruction bytes.
pub fn decode<X: Xlen>(source: &impl InsnSource, addr: u64) -> Result<DecodedInsn, MemoryError> {
    Decoder::<X>::standard().decode_at(source, addr)
}

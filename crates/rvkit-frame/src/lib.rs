//! Function prologue analysis for RISC-V.
//!
//! [`scan_prologue`] decodes a function's entry code with a
//! [`rvkit_isa::Decoder`], tracks register values symbolically and reports
//! where the prologue ends. Its [`PrologueScan::frame_cache`] gives a frame
//! unwinder the frame base register and the stack slots of saved registers.

mod frame;
mod prologue;
mod stack;
mod value;

pub use frame::*;
pub use prologue::*;
pub use stack::*;
pub use value::*;

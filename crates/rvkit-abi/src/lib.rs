//! RISC-V calling convention.
//!
//! Given argument type descriptors, [`CallState::classify`] assigns each
//! argument to integer or float registers, stack slots, or by-reference
//! memory following the RISC-V psABI, including the struct flattening
//! rules for small structs of floats. [`CallClassifier`] lays out a whole
//! call and [`classify_return`] decides how a value is returned.

mod call;
mod classify;
mod config;
mod location;
mod types;

pub use call::*;
pub use classify::*;
pub use config::*;
pub use location::*;
pub use types::{ArgType, Field, TypeKind};

//! RISC-V ISA extension strings.
//!
//! This crate parses architecture strings such as `rv64imafdc_zicsr` into a
//! canonical, ordered, de-duplicated [`SubsetList`], renders them back, and
//! answers extension/version queries. Vendor-specific rewrites plug in
//! through [`VendorHook`].

mod error;
pub mod order;
mod parser;
pub mod reloc;
mod subset;
mod vendor;
mod version;

pub use error::*;
pub use order::{CANONICAL_ORDER, OrderTable, PrefixClass, compare};
pub use parser::*;
pub use subset::*;
pub use vendor::*;
pub use version::*;

//! Whole-call layout and return values.

use rvkit_isa::{REG_A0, xreg};
use tracing::debug;

use crate::classify::{ArgKind, CallState};
use crate::config::AbiConfig;
use crate::location::{ArgInfo, ArgLocation};
use crate::types::ArgType;

/// Stack pointer alignment at a call.
pub const SP_ALIGNMENT: u64 = 16;

/// How a value is returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnConvention {
    /// In one or two registers.
    Registers(ArgInfo),
    /// In caller-provided memory whose address is passed in `address_reg`.
    Memory { address_reg: u32 },
}

/// Return convention for a value of type `ty`.
///
/// Return values follow the argument rules for a first named argument;
/// anything that would be passed by reference is returned in memory.
#[must_use]
pub fn classify_return(config: AbiConfig, ty: &ArgType) -> ReturnConvention {
    let info = CallState::new(config).classify(ty, ArgKind::Named);
    match info.location {
        ArgLocation::ByReference { .. } => ReturnConvention::Memory {
            address_reg: xreg(REG_A0),
        },
        _ => ReturnConvention::Registers(info),
    }
}

/// Builds the argument layout of one call.
#[derive(Clone, Debug)]
pub struct CallClassifier {
    state: CallState,
    args: Vec<ArgInfo>,
    struct_return: bool,
}

impl CallClassifier {
    #[must_use]
    pub fn new(config: AbiConfig) -> Self {
        Self {
            state: CallState::new(config),
            args: Vec::new(),
            struct_return: false,
        }
    }

    /// The callee returns in memory: `a0` carries the return address and
    /// arguments start at `a1`. Must be called before any argument is pushed.
    #[must_use]
    pub fn returns_in_memory(mut self) -> Self {
        if !self.struct_return && self.args.is_empty() {
            self.state.reserve_int_register();
            self.struct_return = true;
        }
        self
    }

    /// Classify the next argument.
    pub fn push(&mut self, ty: &ArgType, kind: ArgKind) -> &ArgInfo {
        let info = self.state.classify(ty, kind);
        self.args.push(info);
        &self.args[self.args.len() - 1]
    }

    #[must_use]
    pub fn finish(self) -> CallLayout {
        let layout = CallLayout {
            args: self.args,
            stack_size: self.state.stack_size(),
            ref_size: self.state.ref_size(),
            struct_return: self.struct_return,
        };
        debug!(
            args = layout.args.len(),
            stack = layout.stack_size,
            refs = layout.ref_size,
            struct_return = layout.struct_return,
            "call layout"
        );
        layout
    }
}

/// Argument placement for a complete call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallLayout {
    pub args: Vec<ArgInfo>,
    /// Bytes of stack arguments.
    pub stack_size: u32,
    /// Bytes of by-reference copies.
    pub ref_size: u32,
    /// `a0` holds the address of the return value.
    pub struct_return: bool,
}

/// Base addresses of the in-memory argument areas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackPointers {
    /// Start of the by-reference copies.
    pub refs: u64,
    /// Start of the stack arguments; also the stack pointer at the call.
    pub args: u64,
}

const fn align_down(value: u64, align: u64) -> u64 {
    value & !(align - 1)
}

impl CallLayout {
    /// Carve the by-reference area and then the stack argument area out of
    /// the stack below `sp`.
    #[must_use]
    pub const fn stack_pointers(&self, sp: u64) -> StackPointers {
        let refs = align_down(sp.wrapping_sub(self.ref_size as u64), SP_ALIGNMENT);
        let args = align_down(refs.wrapping_sub(self.stack_size as u64), SP_ALIGNMENT);
        StackPointers { refs, args }
    }

    /// Address of stack offset `offset` in the argument area.
    #[must_use]
    pub const fn stack_address(pointers: StackPointers, offset: u32) -> u64 {
        pointers.args + offset as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{Fragment, Location};
    use rvkit_isa::FA0_REGNUM;

    #[test]
    fn test_return_scalar() {
        let ret = classify_return(AbiConfig::lp64d(), &ArgType::float(8));
        let ReturnConvention::Registers(info) = ret else {
            panic!("expected register return");
        };
        assert_eq!(info.location.first().location, Location::Register(FA0_REGNUM));
    }

    #[test]
    fn test_return_large_struct_in_memory() {
        let ty = ArgType::c_struct([ArgType::int(8), ArgType::int(8), ArgType::int(8)]);
        assert_eq!(
            classify_return(AbiConfig::lp64(), &ty),
            ReturnConvention::Memory { address_reg: 10 }
        );
    }

    #[test]
    fn test_struct_return_reserves_a0() {
        let mut call = CallClassifier::new(AbiConfig::lp64()).returns_in_memory();
        let first = *call.push(&ArgType::int(4), ArgKind::Named);
        assert_eq!(
            first.location,
            ArgLocation::Single(Fragment::new(Location::Register(11), 8, 0))
        );
        assert!(call.finish().struct_return);
    }

    #[test]
    fn test_stack_pointers() {
        let mut call = CallClassifier::new(AbiConfig::ilp32());
        for _ in 0..9 {
            call.push(&ArgType::int(4), ArgKind::Named);
        }
        call.push(&ArgType::int(24), ArgKind::Named);
        let layout = call.finish();
        assert_eq!(layout.stack_size, 8);
        assert_eq!(layout.ref_size, 24);

        let sp = layout.stack_pointers(0x1000);
        assert_eq!(sp.refs, 0xfe0);
        assert_eq!(sp.args, 0xfd0);
        assert_eq!(CallLayout::stack_address(sp, 4), 0xfd4);
    }
}

//! Argument classification rules.

use tracing::trace;

use crate::config::AbiConfig;
use crate::location::{ArgInfo, ArgLocation, Fragment, Location};
use crate::types::{ArgType, Flattened, TypeKind};

/// Whether an argument matches a declared parameter or is part of `...`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArgKind {
    #[default]
    Named,
    Variadic,
}

impl ArgKind {
    const fn is_variadic(self) -> bool {
        matches!(self, Self::Variadic)
    }
}

/// Consecutive argument registers still available.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArgRegs {
    next: u32,
    last: u32,
}

impl ArgRegs {
    #[must_use]
    pub const fn new(first: u32, last: u32) -> Self {
        Self { next: first, last }
    }

    /// An empty set.
    #[must_use]
    pub const fn none() -> Self {
        Self { next: 1, last: 0 }
    }

    #[must_use]
    pub const fn available(&self) -> u32 {
        if self.next > self.last {
            0
        } else {
            self.last - self.next + 1
        }
    }

    /// Next register number, if any.
    #[must_use]
    pub const fn peek(&self) -> Option<u32> {
        if self.next > self.last { None } else { Some(self.next) }
    }

    pub const fn take(&mut self) -> Option<u32> {
        let reg = self.peek();
        if reg.is_some() {
            self.next += 1;
        }
        reg
    }

    /// Two registers, or none if fewer than two remain.
    pub const fn take_two(&mut self) -> Option<(u32, u32)> {
        if self.available() < 2 {
            return None;
        }
        let first = self.next;
        self.next += 2;
        Some((first, first + 1))
    }

    pub const fn skip(&mut self) {
        self.next += 1;
    }
}

const fn align_up(value: u32, align: u32) -> u32 {
    if align <= 1 {
        value
    } else {
        value.div_ceil(align) * align
    }
}

/// Registers and memory consumed so far by one call's arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallState {
    config: AbiConfig,
    int_regs: ArgRegs,
    float_regs: ArgRegs,
    /// Bytes used in the outgoing stack argument area.
    arg_offset: u32,
    /// Bytes used in the by-reference copy area.
    ref_offset: u32,
}

impl CallState {
    #[must_use]
    pub const fn new(config: AbiConfig) -> Self {
        let float_regs = if config.has_fp_abi() {
            ArgRegs::new(config.first_float_arg, config.last_float_arg)
        } else {
            ArgRegs::none()
        };
        Self {
            config,
            int_regs: ArgRegs::new(config.first_int_arg, config.last_int_arg),
            float_regs,
            arg_offset: 0,
            ref_offset: 0,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AbiConfig {
        &self.config
    }

    #[must_use]
    pub const fn int_regs(&self) -> &ArgRegs {
        &self.int_regs
    }

    #[must_use]
    pub const fn float_regs(&self) -> &ArgRegs {
        &self.float_regs
    }

    /// Bytes of stack needed for arguments so far.
    #[must_use]
    pub const fn stack_size(&self) -> u32 {
        self.arg_offset
    }

    /// Bytes needed for by-reference copies so far.
    #[must_use]
    pub const fn ref_size(&self) -> u32 {
        self.ref_offset
    }

    /// Take the next integer register for a hidden argument (the struct
    /// return address).
    pub const fn reserve_int_register(&mut self) -> Option<u32> {
        self.int_regs.take()
    }

    /// Assign locations for the next argument.
    pub fn classify(&mut self, ty: &ArgType, kind: ArgKind) -> ArgInfo {
        let info = match &ty.kind {
            TypeKind::Integer => {
                let xlen = self.config.xlen;
                let length = if ty.size <= xlen {
                    xlen
                } else if ty.size <= 2 * xlen {
                    2 * xlen
                } else {
                    ty.size
                };
                let align = if length == ty.size { ty.align } else { length };
                self.scalar_int(length, align, kind)
            }
            TypeKind::Float => self.scalar_float(ty.size, ty.align, kind),
            TypeKind::Complex => self.complex_float(ty.size, ty.align, kind),
            TypeKind::Struct(fields) => self.structure(ty, &Flattened::of(fields), kind),
            TypeKind::Other => self.scalar_int(ty.size, ty.align, kind),
        };
        trace!(size = ty.size, length = info.length, location = %info.location, "classified argument");
        info
    }

    fn stack_slot(&mut self, len: u32, align: u32) -> Location {
        self.arg_offset = align_up(self.arg_offset, align);
        let offset = self.arg_offset;
        self.arg_offset += len;
        Location::Stack(offset)
    }

    /// Integer register if one is free, else a stack slot.
    fn int_or_stack(&mut self, len: u32, align: u32) -> Location {
        match self.int_regs.take() {
            Some(reg) => Location::Register(reg),
            None => self.stack_slot(len, align),
        }
    }

    fn scalar_int(&mut self, length: u32, align: u32, kind: ArgKind) -> ArgInfo {
        let xlen = self.config.xlen;
        if length > 2 * xlen {
            self.ref_offset = align_up(self.ref_offset, align);
            let offset = self.ref_offset;
            self.ref_offset += length;
            let address = Fragment::new(self.int_or_stack(xlen, xlen), xlen, 0);
            return ArgInfo {
                length,
                align,
                location: ArgLocation::ByReference {
                    offset,
                    len: length,
                    address,
                },
            };
        }

        let align = align.max(xlen);
        // Variadic 2*xlen-aligned values go in an even-odd register pair.
        if kind.is_variadic()
            && align == 2 * xlen
            && self
                .int_regs
                .peek()
                .is_some_and(|reg| (reg - self.config.first_int_arg) % 2 == 1)
        {
            self.int_regs.skip();
        }

        let first_len = length.min(xlen);
        let first = match self.int_regs.take() {
            Some(reg) => Location::Register(reg),
            None => self.stack_slot(first_len, align),
        };
        let location = if first_len < length {
            let second = self.int_or_stack(length - first_len, xlen);
            ArgLocation::Split(
                Fragment::new(first, first_len, 0),
                Fragment::new(second, length - first_len, first_len),
            )
        } else {
            ArgLocation::Single(Fragment::new(first, length, 0))
        };
        ArgInfo {
            length,
            align,
            location,
        }
    }

    fn scalar_float(&mut self, length: u32, align: u32, kind: ArgKind) -> ArgInfo {
        if length <= self.config.flen && !kind.is_variadic() {
            if let Some(reg) = self.float_regs.take() {
                return ArgInfo {
                    length,
                    align,
                    location: ArgLocation::Single(Fragment::new(Location::Register(reg), length, 0)),
                };
            }
        }
        self.scalar_int(length, align, kind)
    }

    fn complex_float(&mut self, length: u32, align: u32, kind: ArgKind) -> ArgInfo {
        if length <= 2 * self.config.flen && !kind.is_variadic() {
            if let Some((re, im)) = self.float_regs.take_two() {
                let half = length / 2;
                return ArgInfo {
                    length,
                    align,
                    location: ArgLocation::Split(
                        Fragment::new(Location::Register(re), half, 0),
                        Fragment::new(Location::Register(im), half, half),
                    ),
                };
            }
        }
        self.scalar_int(length, align, kind)
    }

    fn structure(&mut self, ty: &ArgType, flat: &Flattened<'_>, kind: ArgKind) -> ArgInfo {
        let (xlen, flen) = (self.config.xlen, self.config.flen);
        if self.float_regs.available() == 0 {
            return self.scalar_int(ty.size, ty.align, kind);
        }

        if let Some(leaf) = flat.single() {
            if leaf.ty.size == ty.size {
                match leaf.ty.kind {
                    TypeKind::Complex => return self.complex_float(ty.size, ty.align, kind),
                    TypeKind::Float => return self.scalar_float(ty.size, ty.align, kind),
                    _ => {}
                }
            }
        }

        if let Some((a, b)) = flat.pair() {
            let fits_float = |leaf: &ArgType| leaf.is_float() && leaf.size <= flen;
            let fits_int = |leaf: &ArgType| leaf.is_integral() && leaf.size <= xlen;

            // {float, float}
            if fits_float(a.ty) && fits_float(b.ty) {
                if let Some((r0, r1)) = self.float_regs.take_two() {
                    return register_pair(ty, (r0, a.ty.size, 0), (r1, b.ty.size, b.offset));
                }
            }

            // {float, int} and {int, float}
            if self.int_regs.available() >= 1 {
                if fits_float(a.ty) && fits_int(b.ty) {
                    if let (Some(f), Some(x)) = (self.float_regs.take(), self.int_regs.take()) {
                        return register_pair(ty, (f, a.ty.size, 0), (x, b.ty.size, b.offset));
                    }
                } else if fits_int(a.ty) && fits_float(b.ty) {
                    if let (Some(x), Some(f)) = (self.int_regs.take(), self.float_regs.take()) {
                        return register_pair(ty, (x, a.ty.size, 0), (f, b.ty.size, b.offset));
                    }
                }
            }
        }

        self.scalar_int(ty.size, ty.align, kind)
    }
}

/// Two-register placement of a flattened struct.
const fn register_pair(ty: &ArgType, a: (u32, u32, u32), b: (u32, u32, u32)) -> ArgInfo {
    ArgInfo {
        length: ty.size,
        align: ty.align,
        location: ArgLocation::Split(
            Fragment::new(Location::Register(a.0), a.1, a.2),
            Fragment::new(Location::Register(b.0), b.1, b.2),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvkit_isa::{FA0_REGNUM, REG_A0, xreg};

    const A0: u32 = xreg(REG_A0);
    const FA0: u32 = FA0_REGNUM;

    fn reg(r: u32, len: u32, offset: u32) -> Fragment {
        Fragment::new(Location::Register(r), len, offset)
    }

    fn stack(at: u32, len: u32, offset: u32) -> Fragment {
        Fragment::new(Location::Stack(at), len, offset)
    }

    #[test]
    fn test_arg_regs() {
        let mut regs = ArgRegs::new(10, 12);
        assert_eq!(regs.available(), 3);
        assert_eq!(regs.take(), Some(10));
        assert_eq!(regs.take_two(), Some((11, 12)));
        assert_eq!(regs.take(), None);
        assert_eq!(regs.take_two(), None);

        let mut regs = ArgRegs::new(10, 10);
        assert_eq!(regs.take_two(), None);
        assert_eq!(regs.take(), Some(10));
        assert_eq!(ArgRegs::none().available(), 0);
    }

    #[test]
    fn test_small_int_promoted() {
        let mut state = CallState::new(AbiConfig::lp64());
        let info = state.classify(&ArgType::int(1), ArgKind::Named);
        assert_eq!(info.length, 8);
        assert_eq!(info.location, ArgLocation::Single(reg(A0, 8, 0)));
    }

    #[test]
    fn test_double_word_int_split() {
        let mut state = CallState::new(AbiConfig::lp64());
        let info = state.classify(&ArgType::int(16), ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Split(reg(A0, 8, 0), reg(A0 + 1, 8, 8)));
    }

    #[test]
    fn test_split_across_last_register_and_stack() {
        let mut state = CallState::new(AbiConfig::lp64());
        for _ in 0..7 {
            state.classify(&ArgType::int(8), ArgKind::Named);
        }
        let info = state.classify(&ArgType::int(16), ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Split(reg(A0 + 7, 8, 0), stack(0, 8, 8)));
        assert_eq!(state.stack_size(), 8);
    }

    #[test]
    fn test_split_across_stack_slots_when_registers_exhausted() {
        let mut state = CallState::new(AbiConfig::lp64());
        for _ in 0..8 {
            state.classify(&ArgType::int(8), ArgKind::Named);
        }
        let info = state.classify(&ArgType::int(16), ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Split(stack(0, 8, 0), stack(8, 8, 8)));
        assert_eq!(state.stack_size(), 16);

        // A second one starts at the next 16-byte boundary.
        state.classify(&ArgType::int(4), ArgKind::Named);
        let info = state.classify(&ArgType::int(16), ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Split(stack(32, 8, 0), stack(40, 8, 8)));
    }

    #[test]
    fn test_large_int_by_reference() {
        let mut state = CallState::new(AbiConfig::ilp32());
        let info = state.classify(&ArgType::int(16), ArgKind::Named);
        assert_eq!(
            info.location,
            ArgLocation::ByReference {
                offset: 0,
                len: 16,
                address: reg(A0, 4, 0),
            }
        );
        assert_eq!(state.ref_size(), 16);
    }

    #[test]
    fn test_variadic_aligned_pair() {
        let mut state = CallState::new(AbiConfig::ilp32());
        state.classify(&ArgType::int(4), ArgKind::Named);
        let info = state.classify(&ArgType::int(8), ArgKind::Variadic);
        assert_eq!(info.location, ArgLocation::Split(reg(A0 + 2, 4, 0), reg(A0 + 3, 4, 4)));

        // Named arguments do not skip.
        let mut state = CallState::new(AbiConfig::ilp32());
        state.classify(&ArgType::int(4), ArgKind::Named);
        let info = state.classify(&ArgType::int(8), ArgKind::Named);
        assert_eq!(info.location.first(), reg(A0 + 1, 4, 0));
    }

    #[test]
    fn test_float_rules() {
        let mut state = CallState::new(AbiConfig::lp64d());
        let info = state.classify(&ArgType::float(8), ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Single(reg(FA0, 8, 0)));

        // Variadic floats use integer registers.
        let info = state.classify(&ArgType::float(8), ArgKind::Variadic);
        assert_eq!(info.location, ArgLocation::Single(reg(A0, 8, 0)));

        // Too wide for the float registers.
        let mut state = CallState::new(AbiConfig::lp64f());
        let info = state.classify(&ArgType::float(8), ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Single(reg(A0, 8, 0)));

        // Soft float.
        let mut state = CallState::new(AbiConfig::lp64());
        let info = state.classify(&ArgType::float(4), ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Single(reg(A0, 4, 0)));
    }

    #[test]
    fn test_float_falls_back_when_exhausted() {
        let mut state = CallState::new(AbiConfig::lp64d());
        for _ in 0..8 {
            state.classify(&ArgType::float(8), ArgKind::Named);
        }
        let info = state.classify(&ArgType::float(8), ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Single(reg(A0, 8, 0)));
    }

    #[test]
    fn test_complex() {
        let mut state = CallState::new(AbiConfig::lp64d());
        let info = state.classify(&ArgType::complex(16), ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Split(reg(FA0, 8, 0), reg(FA0 + 1, 8, 8)));

        let mut state = CallState::new(AbiConfig::lp64f());
        let info = state.classify(&ArgType::complex(16), ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Split(reg(A0, 8, 0), reg(A0 + 1, 8, 8)));
    }

    #[test]
    fn test_struct_float_int() {
        let mut state = CallState::new(AbiConfig::lp64d());
        let ty = ArgType::c_struct([ArgType::float(4), ArgType::int(4)]);
        let info = state.classify(&ty, ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Split(reg(FA0, 4, 0), reg(A0, 4, 4)));

        let ty = ArgType::c_struct([ArgType::int(1), ArgType::float(8)]);
        let info = state.classify(&ty, ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Split(reg(A0 + 1, 1, 0), reg(FA0 + 1, 8, 8)));
    }

    #[test]
    fn test_struct_single_float() {
        let mut state = CallState::new(AbiConfig::lp64d());
        let ty = ArgType::c_struct([ArgType::c_struct([ArgType::float(8)])]);
        let info = state.classify(&ty, ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Single(reg(FA0, 8, 0)));
    }

    #[test]
    fn test_struct_without_float_regs() {
        let mut state = CallState::new(AbiConfig::lp64d());
        for _ in 0..8 {
            state.classify(&ArgType::float(8), ArgKind::Named);
        }
        let ty = ArgType::c_struct([ArgType::float(8), ArgType::float(8)]);
        let info = state.classify(&ty, ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Split(reg(A0, 8, 0), reg(A0 + 1, 8, 8)));
    }

    #[test]
    fn test_struct_with_one_float_reg_left() {
        let mut state = CallState::new(AbiConfig::lp64d());
        for _ in 0..7 {
            state.classify(&ArgType::float(8), ArgKind::Named);
        }
        let ty = ArgType::c_struct([ArgType::float(8), ArgType::float(8)]);
        let info = state.classify(&ty, ArgKind::Named);
        assert_eq!(info.location, ArgLocation::Split(reg(A0, 8, 0), reg(A0 + 1, 8, 8)));
        assert_eq!(state.float_regs().available(), 1);
    }

    #[test]
    fn test_large_struct_by_reference() {
        let mut state = CallState::new(AbiConfig::lp64d());
        let ty = ArgType::c_struct([ArgType::float(8), ArgType::float(8), ArgType::float(8)]);
        let info = state.classify(&ty, ArgKind::Named);
        assert!(info.location.is_by_reference());
        assert_eq!(info.location.first(), reg(A0, 8, 0));
        assert_eq!(state.float_regs().available(), 8);
    }
}

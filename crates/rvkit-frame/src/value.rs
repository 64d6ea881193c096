//! Symbolic register values for prologue analysis.

use std::fmt;

use rvkit_isa::NUM_REGS_I;

/// Value of a register expressed relative to function entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SymbolicValue {
    /// Not representable (computed from two unrelated registers, etc).
    #[default]
    Unknown,
    /// A known constant.
    Constant(u64),
    /// The entry value of `reg` plus `offset`.
    Register { reg: u8, offset: i64 },
}

impl SymbolicValue {
    /// Entry value of `reg`.
    #[must_use]
    pub const fn register(reg: u8) -> Self {
        Self::Register { reg, offset: 0 }
    }

    #[must_use]
    pub const fn add_constant(self, k: i64) -> Self {
        match self {
            Self::Unknown => Self::Unknown,
            Self::Constant(c) => Self::Constant(c.wrapping_add_signed(k)),
            Self::Register { reg, offset } => Self::Register {
                reg,
                offset: offset.wrapping_add(k),
            },
        }
    }

    /// Sum of two values. Only register+constant and constant+constant are
    /// representable; anything else collapses to [`SymbolicValue::Unknown`].
    #[must_use]
    pub const fn add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Register { .. }, Self::Constant(c)) => self.add_constant(c as i64),
            (Self::Constant(c), Self::Register { .. }) => other.add_constant(c as i64),
            (Self::Constant(a), Self::Constant(b)) => Self::Constant(a.wrapping_add(b)),
            _ => Self::Unknown,
        }
    }

    /// Offset from the entry value of `reg`, if this value is one.
    #[must_use]
    pub const fn offset_from(self, reg: u8) -> Option<i64> {
        match self {
            Self::Register { reg: r, offset } if r == reg => Some(offset),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_register(self, reg: u8) -> bool {
        self.offset_from(reg).is_some()
    }
}

impl fmt::Display for SymbolicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Unknown => f.write_str("?"),
            Self::Constant(c) => write!(f, "{c:#x}"),
            Self::Register { reg, offset } => {
                write!(f, "{}{offset:+}", rvkit_isa::reg_name(reg))
            }
        }
    }
}

/// Symbolic state of the integer register file.
#[derive(Clone, Debug)]
pub struct RegisterState {
    regs: [SymbolicValue; NUM_REGS_I],
}

impl Default for RegisterState {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterState {
    /// Every register holds its entry value; x0 is the constant 0.
    #[must_use]
    pub fn new() -> Self {
        let mut regs = [SymbolicValue::Unknown; NUM_REGS_I];
        for (reg, slot) in (0u8..).zip(regs.iter_mut()) {
            *slot = SymbolicValue::register(reg);
        }
        regs[0] = SymbolicValue::Constant(0);
        Self { regs }
    }

    #[must_use]
    pub fn get(&self, reg: u8) -> SymbolicValue {
        self.regs
            .get(usize::from(reg))
            .copied()
            .unwrap_or(SymbolicValue::Unknown)
    }

    /// Set a register value. Writes to x0 are ignored.
    pub fn set(&mut self, reg: u8, value: SymbolicValue) {
        if reg == 0 {
            return;
        }
        if let Some(slot) = self.regs.get_mut(usize::from(reg)) {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvkit_isa::{REG_A0, REG_FP, REG_SP};

    #[test]
    fn test_add_constant() {
        let sp = SymbolicValue::register(REG_SP).add_constant(-32);
        assert_eq!(sp.offset_from(REG_SP), Some(-32));
        assert_eq!(sp.add_constant(32), SymbolicValue::register(REG_SP));
        assert_eq!(SymbolicValue::Unknown.add_constant(4), SymbolicValue::Unknown);
        assert_eq!(SymbolicValue::Constant(8).add_constant(-4), SymbolicValue::Constant(4));
    }

    #[test]
    fn test_add_collapses_to_unknown() {
        let a = SymbolicValue::register(REG_A0);
        let b = SymbolicValue::register(REG_SP);
        assert_eq!(a.add(b), SymbolicValue::Unknown);
        assert_eq!(a.add(SymbolicValue::Unknown), SymbolicValue::Unknown);
        assert_eq!(
            SymbolicValue::Constant(16).add(b),
            SymbolicValue::Register { reg: REG_SP, offset: 16 }
        );
        assert_eq!(
            SymbolicValue::Constant(1).add(SymbolicValue::Constant(2)),
            SymbolicValue::Constant(3)
        );
    }

    #[test]
    fn test_register_state() {
        let mut state = RegisterState::new();
        assert_eq!(state.get(0), SymbolicValue::Constant(0));
        assert!(state.get(REG_FP).is_register(REG_FP));

        state.set(0, SymbolicValue::Unknown);
        assert_eq!(state.get(0), SymbolicValue::Constant(0));

        state.set(REG_FP, SymbolicValue::register(REG_SP));
        assert!(state.get(REG_FP).is_register(REG_SP));
        assert_eq!(state.get(40), SymbolicValue::Unknown);
    }

    #[test]
    fn test_display() {
        let v = SymbolicValue::register(REG_SP).add_constant(-16);
        assert_eq!(v.to_string(), "sp-16");
        assert_eq!(SymbolicValue::Constant(0x10).to_string(), "0x10");
    }
}

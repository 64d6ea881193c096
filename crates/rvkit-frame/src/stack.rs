//! Stack slots written during a prologue.

use std::collections::BTreeMap;

use tracing::trace;

use crate::value::SymbolicValue;

/// One stored value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackSlot {
    pub size: u8,
    pub value: SymbolicValue,
}

/// Stores into memory addressed relative to one base register.
///
/// Slots are keyed by byte offset from the base register's entry value.
/// A store through any other address could alias anything, so it discards
/// every tracked slot.
#[derive(Clone, Debug)]
pub struct StackArea {
    base_reg: u8,
    slots: BTreeMap<i64, StackSlot>,
}

impl StackArea {
    #[must_use]
    pub const fn new(base_reg: u8) -> Self {
        Self {
            base_reg,
            slots: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn base_reg(&self) -> u8 {
        self.base_reg
    }

    /// Record a `size`-byte store of `value` at `addr`.
    pub fn store(&mut self, addr: SymbolicValue, size: u8, value: SymbolicValue) {
        let Some(offset) = addr.offset_from(self.base_reg) else {
            if !self.slots.is_empty() {
                trace!(%addr, "store through untracked address, dropping stack slots");
            }
            self.slots.clear();
            return;
        };
        let end = offset.saturating_add(i64::from(size));
        self.slots.retain(|&start, slot| {
            start.saturating_add(i64::from(slot.size)) <= offset || start >= end
        });
        self.slots.insert(offset, StackSlot { size, value });
    }

    /// Slot starting exactly at `offset`.
    #[must_use]
    pub fn get(&self, offset: i64) -> Option<&StackSlot> {
        self.slots.get(&offset)
    }

    /// Offset where the unmodified entry value of `reg` was stored with
    /// `size` bytes.
    #[must_use]
    pub fn find_reg(&self, reg: u8, size: u8) -> Option<i64> {
        self.slots
            .iter()
            .find(|(_, slot)| slot.size == size && slot.value.offset_from(reg) == Some(0))
            .map(|(&offset, _)| offset)
    }

    /// Slots in offset order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &StackSlot)> {
        self.slots.iter().map(|(&offset, slot)| (offset, slot))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

//! Where arguments end up.

use std::fmt;

use rvkit_isa::regnum_name;

/// A register or an argument stack slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// Register number (debugger numbering).
    Register(u32),
    /// Byte offset into the outgoing stack argument area.
    Stack(u32),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Register(regnum) => write!(f, "register {}", regnum_name(regnum)),
            Self::Stack(offset) => write!(f, "on stack at offset {offset:#x}"),
        }
    }
}

/// Part of a value placed at one location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub location: Location,
    /// Bytes of the value held here.
    pub len: u32,
    /// Offset of those bytes within the value.
    pub offset: u32,
}

impl Fragment {
    #[must_use]
    pub const fn new(location: Location, len: u32, offset: u32) -> Self {
        Self {
            location,
            len,
            offset,
        }
    }

    /// Byte range of the value covered by this fragment.
    #[must_use]
    pub const fn range(&self) -> std::ops::Range<u32> {
        self.offset..self.offset + self.len
    }
}

/// Placement of one argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgLocation {
    /// The whole value in one register or stack slot.
    Single(Fragment),
    /// The value split over two locations.
    Split(Fragment, Fragment),
    /// The value is copied to the by-reference area and its address is
    /// passed instead.
    ByReference {
        /// Offset into the by-reference area.
        offset: u32,
        len: u32,
        /// Where the address goes.
        address: Fragment,
    },
}

impl ArgLocation {
    /// Fragments of the value itself. Empty for by-reference arguments.
    #[must_use]
    pub fn fragments(&self) -> Vec<Fragment> {
        match *self {
            Self::Single(a) => vec![a],
            Self::Split(a, b) => vec![a, b],
            Self::ByReference { .. } => Vec::new(),
        }
    }

    /// First location used: the value's first fragment or the address.
    #[must_use]
    pub const fn first(&self) -> Fragment {
        match *self {
            Self::Single(a) | Self::Split(a, _) => a,
            Self::ByReference { address, .. } => address,
        }
    }

    /// Bytes of the value placed by this assignment.
    #[must_use]
    pub const fn len(&self) -> u32 {
        match *self {
            Self::Single(a) => a.len,
            Self::Split(a, b) => a.len + b.len,
            Self::ByReference { len, .. } => len,
        }
    }

    #[must_use]
    pub const fn is_by_reference(&self) -> bool {
        matches!(self, Self::ByReference { .. })
    }

    /// Whether any part of the argument (or its address) is on the stack.
    #[must_use]
    pub const fn uses_stack(&self) -> bool {
        match *self {
            Self::Single(a) => matches!(a.location, Location::Stack(_)),
            Self::Split(a, b) => {
                matches!(a.location, Location::Stack(_)) || matches!(b.location, Location::Stack(_))
            }
            Self::ByReference { address, .. } => matches!(address.location, Location::Stack(_)),
        }
    }
}

impl fmt::Display for ArgLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(a) => write!(f, "{}", a.location),
            Self::Split(a, b) => write!(
                f,
                "{} ({} bytes), {} ({} bytes at offset {})",
                a.location, a.len, b.location, b.len, b.offset
            ),
            Self::ByReference {
                offset, address, ..
            } => write!(
                f,
                "by reference at offset {offset:#x}, address {}",
                address.location
            ),
        }
    }
}

/// Classification of one argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArgInfo {
    /// Size after integer promotion.
    pub length: u32,
    pub align: u32,
    pub location: ArgLocation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let loc = ArgLocation::Split(
            Fragment::new(Location::Register(43), 4, 0),
            Fragment::new(Location::Register(10), 4, 4),
        );
        assert_eq!(loc.to_string(), "register fa0 (4 bytes), register a0 (4 bytes at offset 4)");
        assert_eq!(loc.len(), 8);

        let loc = ArgLocation::ByReference {
            offset: 0x10,
            len: 32,
            address: Fragment::new(Location::Stack(8), 8, 0),
        };
        assert_eq!(loc.to_string(), "by reference at offset 0x10, address on stack at offset 0x8");
        assert!(loc.uses_stack());
        assert!(loc.fragments().is_empty());
    }
}

//! Extension version numbers.

use std::fmt;

/// Version of an ISA extension.
///
/// Either component may be unknown. `None` orders below every known value,
/// so component-wise `max` never demotes a known version.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: Option<u32>,
    pub minor: Option<u32>,
}

impl Version {
    /// Version that could not be determined.
    pub const UNKNOWN: Self = Self {
        major: None,
        minor: None,
    };

    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major: Some(major),
            minor: Some(minor),
        }
    }

    /// Normalize a parsed `major.minor` pair; `0.0` means "not written".
    #[must_use]
    pub const fn from_parsed(major: u32, minor: u32) -> Self {
        if major == 0 && minor == 0 {
            Self::UNKNOWN
        } else {
            Self::new(major, minor)
        }
    }

    /// True when both components are known.
    #[must_use]
    pub const fn is_known(self) -> bool {
        self.major.is_some() && self.minor.is_some()
    }

    /// Component-wise maximum of two versions.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            major: self.major.max(other.major),
            minor: self.minor.max(other.minor),
        }
    }

    /// True if this version is strictly below `major.minor`.
    ///
    /// Unknown components count as lower than any known number.
    #[must_use]
    pub fn is_below(self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) < (Some(major), Some(minor))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.major, self.minor) {
            (Some(major), Some(minor)) => write!(f, "{major}p{minor}"),
            (Some(major), None) => write!(f, "{major}"),
            _ => Ok(()),
        }
    }
}

/// Version constraint used by [`SubsetList::lookup_version`](crate::SubsetList::lookup_version).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionQuery {
    /// Any version matches.
    Any,
    /// Exactly this number.
    Exact(u32),
}

impl VersionQuery {
    #[must_use]
    pub fn matches(self, component: Option<u32>) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(n) => component == Some(n),
        }
    }
}

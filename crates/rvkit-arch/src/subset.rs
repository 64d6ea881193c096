//! Ordered, de-duplicated list of ISA extensions.

use std::cmp::Ordering;
use std::fmt;

use tracing::trace;

use crate::order::compare;
use crate::version::{Version, VersionQuery};

/// A named ISA extension with its version.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Extension {
    /// Lowercase extension name (`m`, `zicsr`, `xandes`).
    pub name: String,
    pub version: Version,
}

impl Extension {
    #[must_use]
    pub fn new(name: &str, version: Version) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            version,
        }
    }
}

/// Result of searching a [`SubsetList`] for a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// The name is present at this index.
    Found(usize),
    /// Not present; a new entry belongs right after this index.
    After(usize),
    /// Not present; a new entry belongs at the head of the list.
    Head,
}

impl Lookup {
    /// Index where a missing entry would be inserted.
    #[must_use]
    pub const fn insert_index(self) -> usize {
        match self {
            Self::Found(i) => i,
            Self::After(i) => i + 1,
            Self::Head => 0,
        }
    }
}

/// One ISA description: extensions in canonical order plus the register width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubsetList {
    xlen: u32,
    entries: Vec<Extension>,
}

impl SubsetList {
    /// Create an empty list for the given register width in bits.
    #[must_use]
    pub const fn new(xlen: u32) -> Self {
        Self {
            xlen,
            entries: Vec::new(),
        }
    }

    /// Integer register width in bits (32 or 64).
    #[must_use]
    pub const fn xlen(&self) -> u32 {
        self.xlen
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.entries.iter()
    }

    /// Last entry in canonical order.
    #[must_use]
    pub fn last(&self) -> Option<&Extension> {
        self.entries.last()
    }

    /// Find `name`, or the position where it would be inserted.
    ///
    /// The walk stops at the first entry that sorts after `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Lookup {
        let mut pred = None;
        for (i, entry) in self.entries.iter().enumerate() {
            match compare(&entry.name, name) {
                Ordering::Equal => return Lookup::Found(i),
                Ordering::Greater => break,
                Ordering::Less => pred = Some(i),
            }
        }
        pred.map_or(Lookup::Head, Lookup::After)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Extension> {
        match self.lookup(name) {
            Lookup::Found(i) => self.entries.get(i),
            _ => None,
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        matches!(self.lookup(name), Lookup::Found(_))
    }

    /// Find `name` if its version matches both constraints.
    #[must_use]
    pub fn lookup_version(
        &self,
        name: &str,
        major: VersionQuery,
        minor: VersionQuery,
    ) -> Option<&Extension> {
        self.get(name)
            .filter(|ext| major.matches(ext.version.major) && minor.matches(ext.version.minor))
    }

    /// Add an extension, merging versions with an existing entry.
    ///
    /// A duplicate keeps the component-wise maximum version.
    pub fn add(&mut self, name: &str, version: Version) {
        match self.lookup(name) {
            Lookup::Found(i) => {
                let entry = &mut self.entries[i];
                entry.version = entry.version.merge(version);
                trace!(name, version = %entry.version, "merged extension");
            }
            pos => {
                trace!(name, %version, "added extension");
                self.entries
                    .insert(pos.insert_index(), Extension::new(name, version));
            }
        }
    }

    /// Add an extension only if it is not already present.
    pub fn add_implicit(&mut self, name: &str, version: Version) {
        let pos = self.lookup(name);
        if matches!(pos, Lookup::Found(_)) {
            return;
        }
        trace!(name, %version, "added implied extension");
        self.entries
            .insert(pos.insert_index(), Extension::new(name, version));
    }

    /// Remove an extension. Returns the removed entry, if any.
    pub fn remove(&mut self, name: &str) -> Option<Extension> {
        match self.lookup(name) {
            Lookup::Found(i) => Some(self.entries.remove(i)),
            _ => None,
        }
    }

    /// Render the canonical architecture string.
    ///
    /// Entries with an unknown version and the `g` pseudo-extension are
    /// omitted, as is the `i` that always accompanies `e`.
    #[must_use]
    pub fn arch_string(&self) -> String {
        let mut out = format!("rv{}", self.xlen);
        let mut prev: Option<&str> = None;
        for ext in &self.entries {
            let name = ext.name.as_str();
            let skip = !ext.version.is_known() || name == "g" || (name == "i" && prev == Some("e"));
            prev = Some(name);
            if skip {
                continue;
            }
            if name != "i" && name != "e" {
                out.push('_');
            }
            out.push_str(name);
            out.push_str(&ext.version.to_string());
        }
        out
    }
}

impl fmt::Display for SubsetList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.arch_string())
    }
}

impl<'a> IntoIterator for &'a SubsetList {
    type Item = &'a Extension;
    type IntoIter = std::slice::Iter<'a, Extension>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

//! Architecture string parser.
//!
//! Turns `rv64imafdc_zicsr` style strings into a [`SubsetList`]. Parsing
//! runs in fixed stages: vendor rewrites, format checks, the base letter,
//! standard letters in canonical order, prefixed classes S/H/Z/X, implied
//! extensions, then conflict checks. All errors found are collected; a parse
//! that produced any error returns [`ParseFailure`] and no list.

use std::borrow::Cow;
use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use tracing::{debug, trace_span};

use crate::error::{ArchError, ParseFailure, Result};
use crate::order::{PrefixClass, STANDARD_SEQUENCE, compare};
use crate::subset::SubsetList;
use crate::vendor::{AndesCompat, VendorHook};
use crate::version::Version;

/// Extensions that may stay without a version.
pub const DONT_CARE_VERSION: [&str; 3] = ["g", "zicsr", "zifencei"];

/// Known supervisor-level extension names.
pub const KNOWN_S_EXTENSIONS: &[&str] = &[];

/// Known hypervisor-level extension names.
pub const KNOWN_H_EXTENSIONS: &[&str] = &[];

/// Known standard multi-letter extension names.
pub const KNOWN_Z_EXTENSIONS: &[&str] = &[
    "zefhw",
    "zfh",
    "zvamo",
    "zvlsseg",
    "zicsr",
    "zifencei",
    "zihintpause",
    "zba",
    "zbb",
    "zbc",
    "zbs",
    "zicond",
];

#[must_use]
pub fn is_dont_care(name: &str) -> bool {
    DONT_CARE_VERSION.contains(&name)
}

/// Whether `name` is an accepted member of `class`.
#[must_use]
pub fn is_known_prefixed(class: PrefixClass, name: &str) -> bool {
    match class {
        PrefixClass::S => KNOWN_S_EXTENSIONS.contains(&name),
        PrefixClass::H => KNOWN_H_EXTENSIONS.contains(&name),
        PrefixClass::Z => KNOWN_Z_EXTENSIONS.contains(&name),
        PrefixClass::X => name != "x",
    }
}

/// Supplies versions for extensions written without one.
pub trait DefaultVersions {
    fn default_version(&self, name: &str) -> Option<Version>;
}

impl<F> DefaultVersions for F
where
    F: Fn(&str) -> Option<Version>,
{
    fn default_version(&self, name: &str) -> Option<Version> {
        self(name)
    }
}

/// Table-backed default versions.
#[derive(Clone, Debug, Default)]
pub struct VersionTable {
    versions: FxHashMap<String, Version>,
}

impl VersionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: &str, major: u32, minor: u32) -> Self {
        self.insert(name, Version::new(major, minor));
        self
    }

    pub fn insert(&mut self, name: &str, version: Version) {
        self.versions.insert(name.to_ascii_lowercase(), version);
    }
}

impl DefaultVersions for VersionTable {
    fn default_version(&self, name: &str) -> Option<Version> {
        self.versions.get(name).copied()
    }
}

/// Configured architecture string parser.
#[derive(Default)]
pub struct IsaParser {
    defaults: Option<Box<dyn DefaultVersions>>,
    hooks: Vec<Box<dyn VendorHook>>,
}

impl IsaParser {
    /// Parser with no default versions and no vendor hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser with the Andes compatibility hook installed.
    #[must_use]
    pub fn toolchain() -> Self {
        Self::new().with_vendor_hook(AndesCompat)
    }

    #[must_use]
    pub fn with_default_versions(mut self, defaults: impl DefaultVersions + 'static) -> Self {
        self.defaults = Some(Box::new(defaults));
        self
    }

    #[must_use]
    pub fn with_vendor_hook(mut self, hook: impl VendorHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Parse an architecture string.
    ///
    /// # Errors
    ///
    /// Returns every format, version and conflict error found.
    pub fn parse(&self, arch: &str) -> Result<SubsetList> {
        let _span = trace_span!("parse_arch", arch).entered();

        if arch.is_empty() {
            return Err(ParseFailure::new(vec![ArchError::Empty]));
        }

        let mut rewritten = Cow::Borrowed(arch);
        for hook in &self.hooks {
            if let Some(s) = hook.rewrite(&rewritten) {
                rewritten = Cow::Owned(s);
            }
        }
        let arch: &str = &rewritten;

        if arch.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(reject(ArchError::Uppercase { arch: arch.into() }));
        }

        let (xlen, rest) = if let Some(rest) = arch.strip_prefix("rv32") {
            (32, rest)
        } else if let Some(rest) = arch.strip_prefix("rv64") {
            (64, rest)
        } else {
            return Err(reject(ArchError::BadPrefix { arch: arch.into() }));
        };

        let mut ctx = ParseContext::new(arch, xlen, self.defaults.as_deref());
        match ctx.parse_extensions(rest) {
            Ok(()) => {
                ctx.add_implied();
                for hook in &self.hooks {
                    hook.add_implied(&mut ctx);
                }
                ctx.check_conflicts();
                for hook in &self.hooks {
                    hook.check_conflicts(&mut ctx);
                }
            }
            Err(err) => ctx.error(err),
        }
        ctx.finish()
    }

    /// Parse and route failures through an error sink.
    ///
    /// Returns `None` when the string was rejected.
    pub fn parse_reporting(
        &self,
        arch: &str,
        sink: &mut impl FnMut(&str),
    ) -> Option<SubsetList> {
        self.parse(arch)
            .map_err(|failure| failure.report(sink))
            .ok()
    }
}

fn reject(err: ArchError) -> ParseFailure {
    debug!(%err, "ISA string rejected");
    ParseFailure::new(vec![err])
}

/// In-progress parse state, also handed to vendor hooks.
pub struct ParseContext<'p> {
    arch: &'p str,
    list: SubsetList,
    defaults: Option<&'p dyn DefaultVersions>,
    errors: Vec<ArchError>,
}

impl<'p> ParseContext<'p> {
    fn new(arch: &'p str, xlen: u32, defaults: Option<&'p dyn DefaultVersions>) -> Self {
        Self {
            arch,
            list: SubsetList::new(xlen),
            defaults,
            errors: Vec::new(),
        }
    }

    /// Architecture string being parsed, after vendor rewrites.
    #[must_use]
    pub const fn arch(&self) -> &str {
        self.arch
    }

    #[must_use]
    pub const fn subsets(&self) -> &SubsetList {
        &self.list
    }

    pub fn remove(&mut self, name: &str) {
        self.list.remove(name);
    }

    /// Record an error; the parse will fail.
    pub fn error(&mut self, err: ArchError) {
        self.errors.push(err);
    }

    /// Add an extension written in the string (or required by one).
    ///
    /// An unknown version is resolved through the default provider; an
    /// unresolved version is an error unless the name is don't-care.
    pub fn add(&mut self, name: &str, version: Version) {
        self.add_subset(name, version, false);
    }

    /// Add an implied extension. Silently skipped when no version resolves.
    pub fn add_implicit(&mut self, name: &str, version: Version) {
        self.add_subset(name, version, true);
    }

    fn add_subset(&mut self, name: &str, version: Version, implicit: bool) {
        let mut version = version;
        if !version.is_known() {
            if let Some(v) = self.defaults.and_then(|d| d.default_version(name)) {
                version = v;
            }
        }

        if !version.is_known() && !is_dont_care(name) {
            if implicit {
                return;
            }
            let err = if name.starts_with('x') {
                ArchError::VendorVersionRequired { name: name.into() }
            } else {
                ArchError::NoDefaultVersion { name: name.into() }
            };
            self.error(err);
            return;
        }

        if implicit {
            self.list.add_implicit(name, version);
        } else {
            self.list.add(name, version);
        }
    }

    fn parse_extensions(&mut self, s: &str) -> std::result::Result<(), ArchError> {
        let mut rest = self.parse_standard(s)?;
        for class in PrefixClass::ALL {
            rest = self.parse_prefixed(rest, class)?;
        }
        if rest.is_empty() {
            Ok(())
        } else {
            Err(ArchError::UnexpectedTail {
                arch: self.arch.into(),
                rest: rest.into(),
            })
        }
    }

    /// Parse `<major>[p<minor>]`, returning the version and bytes consumed.
    ///
    /// After a standard letter, a `p` not followed by a digit is the P
    /// extension and ends the version.
    fn parse_version(&self, s: &str, standard: bool) -> std::result::Result<(Version, usize), ArchError> {
        let bytes = s.as_bytes();
        let mut major = None;
        let mut value: u32 = 0;
        let mut i = 0;

        while let Some(&c) = bytes.get(i) {
            if c == b'p' {
                let digit_follows = bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
                if !digit_follows {
                    if standard {
                        break;
                    }
                    return Err(ArchError::ExpectMinorVersion {
                        arch: self.arch.into(),
                        major: value,
                    });
                }
                if major.is_some() {
                    break;
                }
                major = Some(value);
                value = 0;
            } else if c.is_ascii_digit() {
                value = value.saturating_mul(10).saturating_add(u32::from(c - b'0'));
            } else {
                break;
            }
            i += 1;
        }

        let version = match major {
            Some(major) => Version::from_parsed(major, value),
            None => Version::from_parsed(value, 0),
        };
        Ok((version, i))
    }

    fn parse_standard<'s>(&mut self, s: &'s str) -> std::result::Result<&'s str, ArchError> {
        let bytes = s.as_bytes();
        let sequence = STANDARD_SEQUENCE.as_bytes();
        let mut cursor = 0;
        let mut pos = 1;

        match bytes.first() {
            Some(b'i') => {
                let (version, len) = self.parse_version(&s[pos..], true)?;
                pos += len;
                self.add("i", version);
            }
            Some(b'e') => {
                let (version, len) = self.parse_version(&s[pos..], true)?;
                pos += len;
                self.add("e", version);
                if self.defaults.is_some() {
                    self.add("i", Version::UNKNOWN);
                } else {
                    self.add_implicit("i", Version::new(2, 0));
                }
                if self.list.xlen() > 32 {
                    return Err(ArchError::ReducedBaseXlen {
                        arch: self.arch.into(),
                        xlen: self.list.xlen(),
                    });
                }
            }
            Some(b'g') => {
                let (version, len) = self.parse_version(&s[pos..], true)?;
                pos += len;
                self.add("i", Version::UNKNOWN);
                self.add("g", version);
                for &letter in sequence.iter().take_while(|&&c| c != b'q') {
                    self.add(char::from(letter).encode_utf8(&mut [0; 4]), Version::UNKNOWN);
                    cursor += 1;
                }
            }
            _ => {
                return Err(ArchError::BadFirstExtension {
                    arch: self.arch.into(),
                });
            }
        }

        while let Some(&c) = bytes.get(pos) {
            if matches!(c, b'x' | b's' | b'h' | b'z') {
                break;
            }
            if c == b'_' {
                pos += 1;
                continue;
            }

            match sequence[cursor..].iter().position(|&x| x == c) {
                Some(offset) => cursor += offset + 1,
                None if sequence.contains(&c) => {
                    return Err(ArchError::NotCanonicalOrder {
                        arch: self.arch.into(),
                        ext: char::from(c),
                    });
                }
                None => {
                    return Err(ArchError::UnknownStandard {
                        arch: self.arch.into(),
                        ext: char::from(c),
                    });
                }
            }

            pos += 1;
            let (version, len) = self.parse_version(&s[pos..], true)?;
            pos += len;
            self.add(char::from(c).encode_utf8(&mut [0; 4]), version);
        }

        Ok(&s[pos..])
    }

    fn parse_prefixed<'s>(
        &mut self,
        s: &'s str,
        class: PrefixClass,
    ) -> std::result::Result<&'s str, ArchError> {
        let mut rest = s;
        loop {
            rest = rest.trim_start_matches('_');
            if PrefixClass::of(rest) != Some(class) {
                return Ok(rest);
            }

            let name_len = rest
                .bytes()
                .skip(1)
                .position(|b| b == b'_' || b.is_ascii_digit())
                .map_or(rest.len(), |p| p + 1);
            let name = &rest[..name_len];
            let (version, version_len) = self.parse_version(&rest[name_len..], false)?;

            if !is_known_prefixed(class, name) {
                return Err(ArchError::UnknownPrefixed {
                    arch: self.arch.into(),
                    class,
                    name: name.into(),
                });
            }

            if let Some(last) = self.list.last() {
                if last.name.eq_ignore_ascii_case(name) {
                    return Err(ArchError::DuplicatePrefixed {
                        arch: self.arch.into(),
                        class,
                        name: name.into(),
                    });
                }
                if compare(&last.name, name) == Ordering::Greater {
                    return Err(ArchError::NotAlphabetical {
                        arch: self.arch.into(),
                        class,
                        name: name.into(),
                        before: last.name.clone(),
                    });
                }
            }

            self.add(name, version);
            rest = &rest[name_len + version_len..];

            if !rest.is_empty() && !rest.starts_with('_') {
                return Err(ArchError::MissingSeparator {
                    arch: self.arch.into(),
                    class,
                });
            }
        }
    }

    fn add_implied(&mut self) {
        let old_base = self
            .list
            .get("i")
            .is_some_and(|i| i.version.is_below(2, 1));
        if old_base {
            self.add_implicit("zicsr", Version::UNKNOWN);
            self.add_implicit("zifencei", Version::UNKNOWN);
        }

        if self.list.contains("q") {
            self.add_implicit("d", Version::UNKNOWN);
            self.add_implicit("f", Version::UNKNOWN);
            self.add_implicit("zicsr", Version::UNKNOWN);
        } else if self.list.contains("d") {
            self.add_implicit("f", Version::UNKNOWN);
            self.add_implicit("zicsr", Version::UNKNOWN);
        } else if self.list.contains("f") {
            self.add_implicit("zicsr", Version::UNKNOWN);
        }

        if self.list.contains("g") {
            self.add_implicit("zicsr", Version::UNKNOWN);
            self.add_implicit("zifencei", Version::UNKNOWN);
        }
    }

    fn check_conflicts(&mut self) {
        if self.list.contains("e") && self.list.contains("f") {
            self.error(ArchError::ReducedWithFloat {
                arch: self.arch.into(),
            });
        }
        if self.list.contains("q") && self.list.xlen() < 64 {
            self.error(ArchError::QuadOn32 {
                arch: self.arch.into(),
            });
        }
    }

    fn finish(self) -> Result<SubsetList> {
        if self.errors.is_empty() {
            debug!(
                xlen = self.list.xlen(),
                extensions = self.list.len(),
                canonical = %self.list,
                "parsed ISA string"
            );
            Ok(self.list)
        } else {
            debug!(errors = self.errors.len(), arch = self.arch, "ISA string rejected");
            Err(ParseFailure::new(self.errors))
        }
    }
}

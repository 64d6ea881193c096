//! ISA string errors.

use std::fmt;

use thiserror::Error;

use crate::order::PrefixClass;

/// A single problem found while parsing an architecture string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchError {
    #[error("empty ISA string")]
    Empty,
    #[error("-march={arch}: ISA string cannot contain uppercase letters")]
    Uppercase { arch: String },
    #[error("-march={arch}: ISA string must begin with rv32 or rv64")]
    BadPrefix { arch: String },
    #[error("-march={arch}: first ISA extension must be `e', `i' or `g'")]
    BadFirstExtension { arch: String },
    #[error("-march={arch}: rv{xlen}e is not a valid base ISA")]
    ReducedBaseXlen { arch: String, xlen: u32 },
    #[error("-march={arch}: unknown standard ISA extension `{ext}'")]
    UnknownStandard { arch: String, ext: char },
    #[error("-march={arch}: standard ISA extension `{ext}' is not in canonical order")]
    NotCanonicalOrder { arch: String, ext: char },
    #[error("-march={arch}: expect number after `{major}p'")]
    ExpectMinorVersion { arch: String, major: u32 },
    #[error("-march={arch}: unknown {class} ISA extension `{name}'")]
    UnknownPrefixed {
        arch: String,
        class: PrefixClass,
        name: String,
    },
    #[error("-march={arch}: duplicate {class} ISA extension `{name}'")]
    DuplicatePrefixed {
        arch: String,
        class: PrefixClass,
        name: String,
    },
    #[error(
        "-march={arch}: {class} ISA extension `{name}' is not in alphabetical order. It must come before `{before}'"
    )]
    NotAlphabetical {
        arch: String,
        class: PrefixClass,
        name: String,
        before: String,
    },
    #[error("-march={arch}: {class} ISA extension must separate with _")]
    MissingSeparator { arch: String, class: PrefixClass },
    #[error("-march={arch}: unexpected ISA string at end: {rest}")]
    UnexpectedTail { arch: String, rest: String },
    #[error("x ISA extension `{name}' must be set with the versions")]
    VendorVersionRequired { name: String },
    #[error("cannot find default versions of the ISA extension `{name}'")]
    NoDefaultVersion { name: String },
    #[error("-march={arch}: rv32e does not support the `f' extension")]
    ReducedWithFloat { arch: String },
    #[error("-march={arch}: rv32 does not support the `q' extension")]
    QuadOn32 { arch: String },
    #[error("-march={arch}: '{first}' and '{second}' are exclusive!")]
    Exclusive {
        arch: String,
        first: String,
        second: String,
    },
}

/// A rejected architecture string with every error found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    errors: Vec<ArchError>,
}

impl ParseFailure {
    pub(crate) const fn new(errors: Vec<ArchError>) -> Self {
        Self { errors }
    }

    #[must_use]
    pub fn errors(&self) -> &[ArchError] {
        &self.errors
    }

    /// Hand each formatted message to an error sink.
    pub fn report(&self, sink: &mut impl FnMut(&str)) {
        for err in &self.errors {
            sink(&err.to_string());
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, ParseFailure>;

//! Vendor-specific parse hooks.

use crate::error::ArchError;
use crate::parser::ParseContext;
use crate::version::Version;

/// Plug-in stages run around the standard parse.
///
/// `rewrite` runs before any validation, `add_implied` after the standard
/// implied extensions, and `check_conflicts` after the standard conflict
/// checks.
pub trait VendorHook {
    /// Rewrite deprecated spellings. `None` leaves the string unchanged.
    fn rewrite(&self, _arch: &str) -> Option<String> {
        None
    }

    fn add_implied(&self, _ctx: &mut ParseContext<'_>) {}

    fn check_conflicts(&self, _ctx: &mut ParseContext<'_>) {}
}

/// Compatibility with legacy Andes extension names.
#[derive(Clone, Copy, Debug, Default)]
pub struct AndesCompat;

impl AndesCompat {
    /// `xv5-` becomes `xv5`.
    fn rewrite_xv5(arch: &str) -> String {
        let mut out = String::with_capacity(arch.len());
        let mut rest = arch;
        while let Some(pos) = rest.find("xv5") {
            let end = pos + "xv5".len();
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            rest = rest.strip_prefix('-').unwrap_or(rest);
        }
        out.push_str(rest);
        out
    }

    /// `xdsp` becomes `xdsp5`, dropping a `-` right after it.
    fn rewrite_xdsp(arch: &str) -> String {
        let mut out = String::with_capacity(arch.len() + 1);
        let mut rest = arch;
        while let Some(pos) = rest.find("xdsp") {
            let end = pos + "xdsp".len();
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            rest = rest.strip_prefix('-').unwrap_or(rest);
            out.push('5');
        }
        out.push_str(rest);
        out
    }
}

impl VendorHook for AndesCompat {
    fn rewrite(&self, arch: &str) -> Option<String> {
        if !arch.contains("xv5") && !arch.contains("xdsp") {
            return None;
        }
        Some(Self::rewrite_xdsp(&Self::rewrite_xv5(arch)))
    }

    fn add_implied(&self, ctx: &mut ParseContext<'_>) {
        if let Some(xv) = ctx.subsets().get("xv").map(|e| e.version) {
            let major = xv.major.unwrap_or(0);
            if (major == 5 || major == 50) && xv.minor == Some(0) {
                ctx.add("xefhw", Version::UNKNOWN);
            }
            ctx.add("xandes", Version::UNKNOWN);
            ctx.remove("xv");
        }

        let dsp = ctx
            .subsets()
            .get("xdsp")
            .is_some_and(|e| e.version.major.is_some_and(|m| m >= 5));
        if dsp {
            ctx.remove("xdsp");
            ctx.add("p", Version::UNKNOWN);
        }

        if ctx.subsets().contains("v") && ctx.subsets().contains("f") {
            ctx.add_implicit("zfh", Version::UNKNOWN);
        }
    }

    fn check_conflicts(&self, ctx: &mut ParseContext<'_>) {
        if ctx.subsets().contains("v") && ctx.subsets().contains("xefhw") {
            let arch = ctx.arch().to_owned();
            ctx.error(ArchError::Exclusive {
                arch,
                first: "V".into(),
                second: "XEFHW".into(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{IsaParser, VersionTable};

    fn parser() -> IsaParser {
        IsaParser::toolchain().with_default_versions(
            VersionTable::new()
                .with("i", 2, 0)
                .with("f", 2, 0)
                .with("d", 2, 0)
                .with("p", 0, 2)
                .with("v", 1, 0)
                .with("zicsr", 2, 0)
                .with("zifencei", 2, 0)
                .with("zfh", 0, 1)
                .with("xandes", 5, 0)
                .with("xefhw", 1, 0),
        )
    }

    #[test]
    fn test_rewrite_xv5() {
        assert_eq!(AndesCompat::rewrite_xv5("rv32i_xv5-0p0"), "rv32i_xv50p0");
        assert_eq!(AndesCompat::rewrite_xv5("rv32i_xv5"), "rv32i_xv5");
    }

    #[test]
    fn test_rewrite_xdsp() {
        assert_eq!(AndesCompat::rewrite_xdsp("rv32i_xdsp"), "rv32i_xdsp5");
        assert_eq!(AndesCompat::rewrite_xdsp("rv32i_xdsp-"), "rv32i_xdsp5");
        assert_eq!(AndesCompat::rewrite(&AndesCompat, "rv32i"), None);
    }

    #[test]
    fn test_xv5_becomes_xandes_with_xefhw() {
        let list = parser().parse("rv32i_xv5-0p0").unwrap();
        assert!(list.contains("xandes"));
        assert!(list.contains("xefhw"));
        assert!(!list.contains("xv"));
    }

    #[test]
    fn test_xdsp_becomes_p() {
        let list = parser().parse("rv32i_xdsp").unwrap();
        assert!(list.contains("p"));
        assert!(!list.contains("xdsp"));
    }

    #[test]
    fn test_v_and_f_imply_zfh() {
        let list = parser().parse("rv64ifv").unwrap();
        assert!(list.contains("zfh"));
    }

    #[test]
    fn test_v_and_xefhw_exclusive() {
        let failure = parser().parse("rv32iv_xv5").unwrap_err();
        assert_eq!(
            failure.to_string(),
            "-march=rv32iv_xv5: 'V' and 'XEFHW' are exclusive!"
        );
    }
}

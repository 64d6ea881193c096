//! Canonical ordering of ISA extension names.
//!
//! Every extension name is ranked by its first letter through a 26-slot
//! table. Base letters (`e`, `i`, `g`) rank first, followed by the standard
//! single-letter sequence, then the prefixed classes S, H, Z, X. Letters
//! outside all of these rank 0 and compare equal to each other.

use std::cmp::Ordering;
use std::fmt;

/// Base ISA letters, in canonical order.
pub const BASE_LETTERS: &str = "eig";

/// Standard single-letter extensions, in canonical order.
pub const STANDARD_SEQUENCE: &str = "mafdqlcbjtpvn";

/// Class of a multi-letter extension name, selected by its first letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrefixClass {
    /// Supervisor-level extensions (`s...`).
    S,
    /// Hypervisor-level extensions (`h...`).
    H,
    /// Standard multi-letter extensions (`z...`).
    Z,
    /// Non-standard vendor extensions (`x...`).
    X,
}

impl PrefixClass {
    /// All classes in parse and canonical order.
    pub const ALL: [Self; 4] = [Self::S, Self::H, Self::Z, Self::X];

    #[must_use]
    pub const fn prefix(self) -> u8 {
        match self {
            Self::S => b's',
            Self::H => b'h',
            Self::Z => b'z',
            Self::X => b'x',
        }
    }

    /// Class of a name, or `None` for base and standard names.
    #[must_use]
    pub fn of(name: &str) -> Option<Self> {
        match name.as_bytes().first()?.to_ascii_lowercase() {
            b's' => Some(Self::S),
            b'h' => Some(Self::H),
            b'z' => Some(Self::Z),
            b'x' => Some(Self::X),
            _ => None,
        }
    }
}

impl fmt::Display for PrefixClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix() as char)
    }
}

/// Immutable first-letter rank table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderTable {
    rank: [i32; 26],
}

/// The canonical table, computed at compile time.
pub static CANONICAL_ORDER: OrderTable = OrderTable::build();

impl OrderTable {
    /// Build the table: positive ranks for base and standard letters,
    /// negative ranks for the prefix classes.
    #[must_use]
    pub const fn build() -> Self {
        let mut rank = [0i32; 26];
        let mut order = 1;

        let base = BASE_LETTERS.as_bytes();
        let mut i = 0;
        while i < base.len() {
            rank[(base[i] - b'a') as usize] = order;
            order += 1;
            i += 1;
        }

        let standard = STANDARD_SEQUENCE.as_bytes();
        let mut i = 0;
        while i < standard.len() {
            rank[(standard[i] - b'a') as usize] = order;
            order += 1;
            i += 1;
        }

        let mut i = 0;
        while i < PrefixClass::ALL.len() {
            let prefix = PrefixClass::ALL[i].prefix();
            rank[(prefix - b'a') as usize] = -(i as i32) - 1;
            i += 1;
        }

        Self { rank }
    }

    /// Rank of a single character. Non-letters rank 0.
    #[must_use]
    pub const fn rank(&self, c: u8) -> i32 {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() {
            self.rank[(c - b'a') as usize]
        } else {
            0
        }
    }

    /// Compare two extension names in canonical order, ignoring case.
    #[must_use]
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let a = a.as_bytes();
        let b = b.as_bytes();
        let first_a = a.first().copied().unwrap_or(0);
        let first_b = b.first().copied().unwrap_or(0);
        let rank_a = self.rank(first_a);
        let rank_b = self.rank(first_b);

        if rank_a > 0 && rank_b > 0 {
            return rank_a.cmp(&rank_b);
        }

        if rank_a == rank_b && rank_a < 0 {
            let rest_a = &a[1..];
            let rest_b = &b[1..];
            if first_a.eq_ignore_ascii_case(&b'z') {
                let second_a = self.rank(rest_a.first().copied().unwrap_or(0));
                let second_b = self.rank(rest_b.first().copied().unwrap_or(0));
                if second_a != second_b {
                    return second_a.cmp(&second_b);
                }
            }
            return rest_a
                .iter()
                .map(u8::to_ascii_lowercase)
                .cmp(rest_b.iter().map(u8::to_ascii_lowercase));
        }

        // Standard letters, then unranked letters, then S, H, Z, X.
        rank_b.cmp(&rank_a)
    }
}

/// Compare two extension names using [`CANONICAL_ORDER`].
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    CANONICAL_ORDER.compare(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ranks() {
        assert_eq!(CANONICAL_ORDER.rank(b'e'), 1);
        assert_eq!(CANONICAL_ORDER.rank(b'i'), 2);
        assert_eq!(CANONICAL_ORDER.rank(b'g'), 3);
        assert_eq!(CANONICAL_ORDER.rank(b'm'), 4);
        assert_eq!(CANONICAL_ORDER.rank(b'n'), 16);
        assert_eq!(CANONICAL_ORDER.rank(b's'), -1);
        assert_eq!(CANONICAL_ORDER.rank(b'h'), -2);
        assert_eq!(CANONICAL_ORDER.rank(b'z'), -3);
        assert_eq!(CANONICAL_ORDER.rank(b'x'), -4);
        assert_eq!(CANONICAL_ORDER.rank(b'k'), 0);
        assert_eq!(CANONICAL_ORDER.rank(b'2'), 0);
    }

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(OrderTable::build(), CANONICAL_ORDER);
    }

    #[test]
    fn test_standard_order() {
        assert_eq!(compare("i", "m"), Ordering::Less);
        assert_eq!(compare("m", "a"), Ordering::Less);
        assert_eq!(compare("d", "q"), Ordering::Less);
        assert_eq!(compare("c", "f"), Ordering::Greater);
        assert_eq!(compare("e", "i"), Ordering::Less);
        assert_eq!(compare("i", "g"), Ordering::Less);
    }

    #[test]
    fn test_class_order() {
        assert_eq!(compare("c", "sfoo"), Ordering::Less);
        assert_eq!(compare("sfoo", "hbar"), Ordering::Less);
        assert_eq!(compare("hbar", "zicsr"), Ordering::Less);
        assert_eq!(compare("zicsr", "xandes"), Ordering::Less);
        assert_eq!(compare("n", "xandes"), Ordering::Less);
    }

    #[test]
    fn test_same_class_alphabetical() {
        assert_eq!(compare("xalpha", "xbeta"), Ordering::Less);
        assert_eq!(compare("xbeta", "xalpha"), Ordering::Greater);
        assert_eq!(compare("xfoo", "xfoo"), Ordering::Equal);
    }

    #[test]
    fn test_z_class_second_letter() {
        // Second letter ranks first: i (2) before f (6) before b (11).
        assert_eq!(compare("zicsr", "zfh"), Ordering::Less);
        assert_eq!(compare("zfh", "zba"), Ordering::Less);
        assert_eq!(compare("zicsr", "zifencei"), Ordering::Less);
        assert_eq!(compare("zifencei", "zihintpause"), Ordering::Less);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(compare("ZICSR", "zicsr"), Ordering::Equal);
        assert_eq!(compare("M", "a"), Ordering::Less);
    }

    #[test]
    fn test_antisymmetric() {
        let names = [
            "e", "i", "g", "m", "a", "f", "d", "q", "c", "v", "p", "ssvnapot", "sscofpmf", "hfoo",
            "zicsr", "zifencei", "zfh", "zba", "zbb", "zvamo", "xandes", "xv5", "xfoo",
        ];
        for a in names {
            for b in names {
                assert_eq!(compare(a, b), compare(b, a).reverse(), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_sort_reproduces_canonical_sequence() {
        let mut names = vec![
            "xfoo", "zifencei", "c", "sfoo", "d", "zicsr", "a", "i", "zfh", "m", "f", "v",
        ];
        names.sort_by(|a, b| compare(a, b));
        assert_eq!(
            names,
            vec![
                "i", "m", "a", "f", "d", "c", "v", "sfoo", "zicsr", "zifencei", "zfh", "xfoo",
            ]
        );
    }

    #[test]
    fn test_prefix_class() {
        assert_eq!(PrefixClass::of("zicsr"), Some(PrefixClass::Z));
        assert_eq!(PrefixClass::of("xv5"), Some(PrefixClass::X));
        assert_eq!(PrefixClass::of("m"), None);
        assert_eq!(PrefixClass::of(""), None);
    }
}

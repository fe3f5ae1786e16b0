//! Version token parsing and ordering.
//!
//! Update sources declare their payload version as a short text token
//! (`"1.3"`, `"v1.7"`).  Tokens parse into a `(major, minor, patch)` triple
//! and comparison is total on that triple, so "is the candidate newer" is
//! always well-defined.  A token that fails to parse is never fatal to the
//! boot sequence — callers treat it as "not an update" and move on.

use core::fmt;
use core::str::FromStr;

use crate::error::ParseVersionError;

/// Parsed dotted-numeric version.
///
/// Ordering is lexicographic on `(major, minor, patch)`, so the field order
/// of the struct is load-bearing for the derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// "Nothing installed yet" — every real candidate compares greater.
    pub const ZERO: Self = Self {
        major: 0,
        minor: 0,
        patch: 0,
    };

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version token.
    ///
    /// Surrounding whitespace is trimmed and a single leading `v`/`V` is
    /// stripped.  Missing components default to 0 (`"1.7"` ⇒ 1.7.0) and
    /// components past the third are ignored (`"1.2.3.4"` ⇒ 1.2.3).
    pub fn parse(token: &str) -> Result<Self, ParseVersionError> {
        let token = token.trim();
        let token = token.strip_prefix(['v', 'V']).unwrap_or(token);
        if token.is_empty() {
            return Err(ParseVersionError::Empty);
        }

        let mut parts = [0u32; 3];
        for (slot, component) in parts.iter_mut().zip(token.split('.')) {
            *slot = component.parse().map_err(|_| ParseVersionError::Malformed)?;
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_major_minor() {
        assert_eq!(Version::parse("1.3"), Ok(Version::new(1, 3, 0)));
    }

    #[test]
    fn parses_prefixed_tokens() {
        assert_eq!(Version::parse("v1.7"), Ok(Version::new(1, 7, 0)));
        assert_eq!(Version::parse("V2.0.1"), Ok(Version::new(2, 0, 1)));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(Version::parse("  1.2.3\n"), Ok(Version::new(1, 2, 3)));
    }

    #[test]
    fn ignores_components_past_patch() {
        assert_eq!(Version::parse("1.2.3.4"), Ok(Version::new(1, 2, 3)));
    }

    #[test]
    fn empty_tokens_are_rejected() {
        assert_eq!(Version::parse(""), Err(ParseVersionError::Empty));
        assert_eq!(Version::parse("   "), Err(ParseVersionError::Empty));
        assert_eq!(Version::parse("v"), Err(ParseVersionError::Empty));
    }

    #[test]
    fn non_numeric_components_are_rejected() {
        assert_eq!(Version::parse("abc"), Err(ParseVersionError::Malformed));
        assert_eq!(Version::parse("1.x"), Err(ParseVersionError::Malformed));
        assert_eq!(Version::parse("1..2"), Err(ParseVersionError::Malformed));
    }

    #[test]
    fn ordering_is_numeric_not_lexical() {
        let a = Version::parse("1.10").unwrap();
        let b = Version::parse("1.9").unwrap();
        assert!(a > b);

        let c = Version::parse("2.0.0").unwrap();
        let d = Version::parse("1.99.99").unwrap();
        assert!(c > d);
    }

    #[test]
    fn equivalent_tokens_compare_equal() {
        assert_eq!(Version::parse("1.2"), Version::parse("v1.2.0"));
    }

    #[test]
    fn zero_is_older_than_everything() {
        assert!(Version::ZERO < Version::parse("0.0.1").unwrap());
    }

    #[test]
    fn display_is_the_normalized_triple() {
        assert_eq!(Version::new(1, 2, 3).to_string(), "1.2.3");
        assert_eq!(Version::parse("v1.7").unwrap().to_string(), "1.7.0");
    }
}

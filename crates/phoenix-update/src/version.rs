//! Version parsing and comparison
//!
//! Versions are `MAJOR.MINOR[.PATCH]` with an optional leading `v`. The
//! components are kept as digit strings: two numerals without leading zeros
//! compare numerically by comparing length first and then lexicographically,
//! which never overflows however long the component is.
//!
//! A missing patch component is kept absent rather than defaulted to zero.
//! Absent equals absent; absent against a present patch compares like an
//! empty digit string, so `1.2 < 1.2.0`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Invalid version text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid semantic version format: {text}")]
pub struct VersionError {
    /// The rejected input
    pub text: String,
}

/// A parsed release version
///
/// Identity ignores the original text: `v1.2.3` equals `1.2.3`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: String,
    minor: String,
    patch: Option<String>,
    text: String,
}

impl Version {
    /// `0.0.0`
    pub fn zero() -> Self {
        Self {
            major: "0".to_string(),
            minor: "0".to_string(),
            patch: Some("0".to_string()),
            text: "0.0.0".to_string(),
        }
    }

    /// Parse untrusted text, returning `None` when it is not a version
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.strip_prefix('v').unwrap_or(text);

        let (major, rest) = parse_component(rest)?;
        let rest = rest.strip_prefix('.')?;

        let (minor, rest) = parse_component(rest)?;
        if rest.is_empty() {
            return Some(Self {
                major: major.to_string(),
                minor: minor.to_string(),
                patch: None,
                text: text.to_string(),
            });
        }
        let rest = rest.strip_prefix('.')?;

        // Anything after the patch digits (pre-release or build suffix) is
        // kept in the display text only.
        let (patch, _) = parse_component(rest)?;

        Some(Self {
            major: major.to_string(),
            minor: minor.to_string(),
            patch: Some(patch.to_string()),
            text: text.to_string(),
        })
    }

    /// Parse untrusted text, reporting an invalid-version error
    pub fn should_parse(text: &str) -> Result<Self, VersionError> {
        Self::parse(text).ok_or_else(|| VersionError {
            text: text.to_string(),
        })
    }

    /// Parse a version known at build time.
    ///
    /// # Panics
    ///
    /// Panics if `text` is not a valid version. Never use this on data
    /// received from a registry.
    pub fn must_parse(text: &str) -> Self {
        match Self::should_parse(text) {
            Ok(version) => version,
            Err(err) => panic!("{}", err),
        }
    }

    /// Major component digits
    pub fn major(&self) -> &str {
        &self.major
    }

    /// Minor component digits
    pub fn minor(&self) -> &str {
        &self.minor
    }

    /// Patch component digits, absent for `MAJOR.MINOR` versions
    pub fn patch(&self) -> Option<&str> {
        self.patch.as_deref()
    }

    /// Original text, verbatim
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether `candidate` is newer than this version
    pub fn should_update(&self, candidate: &Version) -> bool {
        self.lower_than(candidate)
    }

    pub fn equals(&self, other: &Version) -> bool {
        self.compare(other) == Ordering::Equal
    }

    pub fn not_equals(&self, other: &Version) -> bool {
        self.compare(other) != Ordering::Equal
    }

    pub fn lower_than(&self, other: &Version) -> bool {
        self.compare(other) == Ordering::Less
    }

    pub fn lower_than_or_equals(&self, other: &Version) -> bool {
        self.compare(other) != Ordering::Greater
    }

    pub fn greater_than(&self, other: &Version) -> bool {
        self.compare(other) == Ordering::Greater
    }

    pub fn greater_than_or_equals(&self, other: &Version) -> bool {
        self.compare(other) != Ordering::Less
    }

    fn compare(&self, other: &Version) -> Ordering {
        compare_numeral(&self.major, &other.major)
            .then_with(|| compare_numeral(&self.minor, &other.minor))
            .then_with(|| {
                compare_numeral(
                    self.patch.as_deref().unwrap_or(""),
                    other.patch.as_deref().unwrap_or(""),
                )
            })
    }
}

/// Split a maximal run of ASCII digits off the front of `s`.
///
/// Multi-digit runs starting with `0` are rejected.
fn parse_component(s: &str) -> Option<(&str, &str)> {
    let end = s
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    if end > 1 && s.starts_with('0') {
        return None;
    }
    Some(s.split_at(end))
}

fn compare_numeral(x: &str, y: &str) -> Ordering {
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::should_parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::should_parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.text
    }
}

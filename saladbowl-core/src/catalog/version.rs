//! Loose semantic-version coercion and minimum-version gating
//!
//! Upstream release tags are rarely clean semver ("v6.3.0", "6.3",
//! "xmrig-5.9.0-gcc-win64"). Coercion extracts the first
//! `major[.minor[.patch]]` run and drops everything else, so pre-release
//! and build noise never affects ordering. Entries that cannot be coerced
//! are filtered out, never reported as errors.

use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;

use super::Download;

static COERCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]{1,16})(?:\.([0-9]{1,16}))?(?:\.([0-9]{1,16}))?(?:$|[^0-9])")
        .expect("coercion pattern is valid")
});

/// Coerce a loose version string to `major.minor.patch`
///
/// Only ASCII digits form version components; other Unicode digits are
/// treated as separators. Returns `None` when the string contains no usable
/// numeric run.
pub fn coerce(raw: &str) -> Option<Version> {
    let caps = COERCE_RE.captures(raw)?;
    let part = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    Some(Version::new(part(1)?, part(2)?, part(3)?))
}

/// Minimum-version threshold for a gated feature
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionGate {
    minimum: Option<Version>,
}

impl VersionGate {
    /// Gate admitting every coercible version
    pub fn open() -> Self {
        Self::default()
    }

    pub fn at_least(minimum: Version) -> Self {
        Self {
            minimum: Some(minimum),
        }
    }

    /// Parse an authored threshold strictly
    pub fn parse(minimum: &str) -> Result<Self, semver::Error> {
        Version::parse(minimum).map(Self::at_least)
    }

    pub fn minimum(&self) -> Option<&Version> {
        self.minimum.as_ref()
    }

    /// Check a coerced version against the threshold
    pub fn admits(&self, version: &Version) -> bool {
        self.minimum.as_ref().map_or(true, |min| version >= min)
    }

    /// Coerce and check a raw version string
    pub fn admits_raw(&self, raw: &str) -> bool {
        coerce(raw).is_some_and(|v| self.admits(&v))
    }

    /// Catalog entries passing the gate, in catalog order
    pub fn filter<'a>(&'a self, downloads: &'a [Download]) -> impl Iterator<Item = &'a Download> {
        downloads.iter().filter(move |d| self.admits_raw(&d.version))
    }
}

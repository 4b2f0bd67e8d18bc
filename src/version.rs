/// PHP target versions.
///
/// A thin wrapper around [`mago_php_version::PHPVersion`] that owns the
/// parsing rules for version strings coming from configuration and from
/// callers (`"8"`, `"8.0"`, `"8.0.3"`).  Ordering is the numeric ordering
/// of `(major, minor, patch)`.
use std::fmt;
use std::str::FromStr;

use mago_php_version::PHPVersion;

use crate::error::InvalidVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhpVersion(PHPVersion);

impl PhpVersion {
    /// Minor and patch components are packed into a byte each.
    const MAX_COMPONENT: u32 = 255;

    /// Build a version from its components.
    ///
    /// Components above 255 are clamped; use [`PhpVersion::parse`] when the
    /// input is untrusted.
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self(PHPVersion::new(
            major.min(Self::MAX_COMPONENT),
            minor.min(Self::MAX_COMPONENT),
            patch.min(Self::MAX_COMPONENT),
        ))
    }

    pub fn major(&self) -> u32 {
        self.0.major()
    }

    pub fn minor(&self) -> u32 {
        self.0.minor()
    }

    pub fn patch(&self) -> u32 {
        self.0.patch()
    }

    /// The underlying mago version, for callers that talk to the rest of
    /// the mago toolchain.
    pub fn as_mago(&self) -> PHPVersion {
        self.0
    }

    /// Parse `MAJOR`, `MAJOR.MINOR` or `MAJOR.MINOR.PATCH`.
    pub fn parse(input: &str) -> Result<Self, InvalidVersion> {
        let invalid = |reason| InvalidVersion {
            input: input.to_string(),
            reason,
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty version string"));
        }

        let mut components = [0u32; 3];
        let mut count = 0;
        for part in trimmed.split('.') {
            if count == components.len() {
                return Err(invalid("too many components"));
            }
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("components must be decimal numbers"));
            }
            let value: u32 = part
                .parse()
                .map_err(|_| invalid("component out of range"))?;
            if value > Self::MAX_COMPONENT {
                return Err(invalid("component out of range"));
            }
            components[count] = value;
            count += 1;
        }

        Ok(Self::new(components[0], components[1], components[2]))
    }
}

impl From<PHPVersion> for PhpVersion {
    fn from(version: PHPVersion) -> Self {
        Self(version)
    }
}

impl FromStr for PhpVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PhpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch() == 0 {
            write!(f, "{}.{}", self.major(), self.minor())
        } else {
            write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
        }
    }
}

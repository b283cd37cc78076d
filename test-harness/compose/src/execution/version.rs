use std::{fmt, sync::LazyLock};

use regex::Regex;

use crate::errors::ConfigurationError;

// First semver-shaped token; trailing pre-release text like `rc1` falls
// outside the match and is dropped for ordering purposes.
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("version pattern compiles"));

/// Compose release number, ordered by major.minor.patch. Equal versions
/// count as "at least".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ComposeVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl ComposeVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Extract the version from `-v` output of the form
    /// `docker-compose version 1.7.0rc1, build 1ad8866`. Output without a
    /// version-shaped token is a hard configuration failure.
    pub fn parse_from_version_output(output: &str) -> Result<Self, ConfigurationError> {
        let malformed = || ConfigurationError::MalformedVersion {
            output: output.to_owned(),
        };
        let captures = VERSION_PATTERN.captures(output).ok_or_else(malformed)?;
        let segment = |index: usize| captures[index].parse::<u32>().map_err(|_| malformed());

        Ok(Self::new(segment(1)?, segment(2)?, segment(3)?))
    }
}

impl fmt::Display for ComposeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

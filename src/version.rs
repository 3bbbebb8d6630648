use std::fmt;

use crate::Error;

/// The version of a WARC record.
///
/// Only the two published ISO 28500 revisions are supported; a version line
/// naming any other revision fails to parse with
/// [`UnsupportedVersion`](Error::UnsupportedVersion).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum Version {
    /// WARC 1.0, as specified by ISO 28500:2009.
    Warc1_0,
    /// WARC 1.1, as specified by ISO 28500:2017.
    Warc1_1,
}

impl Version {
    /// Parse a version line of the form `WARC/m.n` (line terminator already removed).
    ///
    /// ```
    /// # use warckit::{Version, Error};
    /// assert_eq!(Version::parse("WARC/1.0"), Ok(Version::Warc1_0));
    /// assert_eq!(
    ///     Version::parse("WARC/2.0"),
    ///     Err(Error::UnsupportedVersion("2.0".into()))
    /// );
    /// ```
    pub fn parse(line: &str) -> Result<Version, Error> {
        let number = match line.strip_prefix("WARC/") {
            Some(number) => number.trim(),
            None => return Err(Error::UnsupportedVersion(line.to_owned())),
        };
        match number {
            "1.0" => Ok(Version::Warc1_0),
            "1.1" => Ok(Version::Warc1_1),
            other => Err(Error::UnsupportedVersion(other.to_owned())),
        }
    }

    /// The version number as it appears after `WARC/` in the version line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Version::Warc1_0 => "1.0",
            Version::Warc1_1 => "1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

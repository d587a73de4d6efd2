//! Parcel version strings (`v1`, `v0.3.2`).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};
use smallvec::SmallVec;

/// A dotted version number written with a leading `v`.
///
/// Comparison pads the shorter version with zeros, so `v1` and `v1.0.0`
/// are equal.
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "String")]
pub struct Version {
    numbers: SmallVec<[u32; 4]>,
    vstring: String,
}

impl Version {
    /// Parse a version string.
    pub fn parse(vstring: &str) -> DiagResult<Self> {
        let bad = || {
            Diagnostic::error(ErrorCode::E1007)
                .with_message(format!("Bad version string: '{vstring}'"))
                .with_label(vstring, "expected `v` followed by dot-separated numbers")
        };

        let digits = vstring.strip_prefix('v').ok_or_else(bad)?;
        let mut numbers = SmallVec::new();
        for component in digits.split('.') {
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(bad());
            }
            let number = component.parse::<u32>().map_err(|_| bad())?;
            numbers.push(number);
        }

        Ok(Version {
            numbers,
            vstring: vstring.to_string(),
        })
    }

    /// The first component.
    pub fn major(&self) -> u32 {
        self.numbers.first().copied().unwrap_or(0)
    }

    /// All numeric components in order.
    pub fn numbers(&self) -> &[u32] {
        &self.numbers
    }

    /// The version exactly as written.
    pub fn as_str(&self) -> &str {
        &self.vstring
    }

    fn component(&self, i: usize) -> u32 {
        self.numbers.get(i).copied().unwrap_or(0)
    }
}

impl Default for Version {
    fn default() -> Self {
        Version {
            numbers: SmallVec::from_slice(&[0]),
            vstring: "v0".to_string(),
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.numbers.len().max(other.numbers.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.vstring)
    }
}

impl FromStr for Version {
    type Err = Diagnostic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = Diagnostic;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Version::parse(&value)
    }
}

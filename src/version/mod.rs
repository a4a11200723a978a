//! NuGet version tokens and version ranges.
//!
//! Versions follow the NuGet flavour of SemVer: one to four numeric parts,
//! an optional dot-separated prerelease label and optional build metadata.
//! Two versions are equal when their numeric parts and labels match; label
//! case and metadata are ignored.

mod range;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use anyhow::{Result, bail};

pub use range::VersionRange;

/// A parsed, comparable NuGet version.
#[derive(Debug, Clone)]
pub struct NuGetVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub revision: u64,
    release_labels: Vec<String>,
    metadata: Option<String>,
}

impl NuGetVersion {
    /// Parse a version string, returning `None` when it is not a valid version.
    pub fn try_parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    pub fn is_prerelease(&self) -> bool {
        !self.release_labels.is_empty()
    }

    /// Prerelease label (`beta.1` in `1.0.0-beta.1`), empty for stable versions.
    pub fn release(&self) -> String {
        self.release_labels.join(".")
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    /// Lowercased normalized form, as used in flat-container URLs and file names.
    pub fn to_lower_normalized(&self) -> String {
        self.to_string().to_lowercase()
    }

    fn numbers(&self) -> [u64; 4] {
        [self.major, self.minor, self.patch, self.revision]
    }
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

fn parse_labels(s: &str, what: &str) -> Result<Vec<String>> {
    let labels: Vec<String> = s.split('.').map(str::to_string).collect();
    for label in &labels {
        if label.is_empty() || !label.chars().all(is_label_char) {
            bail!("Invalid {} '{}'", what, s);
        }
    }
    Ok(labels)
}

impl FromStr for NuGetVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            bail!("Version string is empty");
        }

        let (rest, metadata) = match trimmed.split_once('+') {
            Some((rest, meta)) => {
                parse_labels(meta, "build metadata")?;
                (rest, Some(meta.to_string()))
            }
            None => (trimmed, None),
        };

        let (numeric, release_labels) = match rest.split_once('-') {
            Some((numeric, release)) => (numeric, parse_labels(release, "release label")?),
            None => (rest, Vec::new()),
        };

        let parts: Vec<&str> = numeric.split('.').collect();
        if parts.is_empty() || parts.len() > 4 {
            bail!("Invalid version '{}'", s);
        }

        let mut numbers = [0u64; 4];
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                bail!("Invalid version '{}'", s);
            }
            numbers[i] = part
                .parse()
                .map_err(|_| anyhow::anyhow!("Version component out of range in '{}'", s))?;
        }

        Ok(NuGetVersion {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            revision: numbers[3],
            release_labels,
            metadata,
        })
    }
}

impl fmt::Display for NuGetVersion {
    /// Normalized form: `major.minor.patch[.revision][-release]`, revision only when non-zero.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.revision > 0 {
            write!(f, ".{}", self.revision)?;
        }
        if self.is_prerelease() {
            write!(f, "-{}", self.release())?;
        }
        Ok(())
    }
}

impl PartialEq for NuGetVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NuGetVersion {}

impl Hash for NuGetVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.numbers().hash(state);
        for label in &self.release_labels {
            match label.parse::<u64>() {
                Ok(n) => n.hash(state),
                Err(_) => label.to_lowercase().hash(state),
            }
        }
    }
}

fn compare_labels(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        // numeric identifiers sort before alphanumeric ones
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

impl Ord for NuGetVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numbers()
            .cmp(&other.numbers())
            .then_with(|| match (self.is_prerelease(), other.is_prerelease()) {
                (false, false) => Ordering::Equal,
                (false, true) => Ordering::Greater,
                (true, false) => Ordering::Less,
                (true, true) => {
                    for (a, b) in self.release_labels.iter().zip(&other.release_labels) {
                        let ord = compare_labels(a, b);
                        if ord != Ordering::Equal {
                            return ord;
                        }
                    }
                    self.release_labels.len().cmp(&other.release_labels.len())
                }
            })
    }
}

impl PartialOrd for NuGetVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

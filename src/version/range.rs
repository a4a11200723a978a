//! Dependency version ranges in nuspec interval notation.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};

use super::NuGetVersion;

/// A version interval such as `[1.0.0, 2.0.0)`.
///
/// A bare version (`1.0`) means "this version or later".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub min: Option<NuGetVersion>,
    pub min_inclusive: bool,
    pub max: Option<NuGetVersion>,
    pub max_inclusive: bool,
}

impl VersionRange {
    /// Render a raw nuspec range in normalized form.
    ///
    /// Text that does not parse as a range (floating ranges, typos) is kept
    /// as written, trimmed. Blank input yields `None`.
    pub fn normalize(raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.parse::<VersionRange>() {
            Ok(range) => range.to_string(),
            Err(_) => trimmed.to_string(),
        })
    }

    fn is_exact(&self) -> bool {
        self.min_inclusive
            && self.max_inclusive
            && self.min.is_some()
            && self.min == self.max
    }
}

fn parse_bound(s: &str) -> Result<Option<NuGetVersion>> {
    let s = s.trim();
    if s.is_empty() {
        Ok(None)
    } else {
        Ok(Some(s.parse()?))
    }
}

impl FromStr for VersionRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            bail!("Version range is empty");
        }

        let first = s.chars().next().unwrap_or_default();
        let last = s.chars().last().unwrap_or_default();

        if first != '[' && first != '(' {
            let min: NuGetVersion = s.parse()?;
            return Ok(VersionRange {
                min: Some(min),
                min_inclusive: true,
                max: None,
                max_inclusive: false,
            });
        }

        if s.len() < 2 || (last != ']' && last != ')') {
            bail!("Invalid version range '{}'", s);
        }

        let min_inclusive = first == '[';
        let max_inclusive = last == ']';
        let inner = &s[1..s.len() - 1];

        match inner.split_once(',') {
            None => {
                // "[1.0]" pins a single version; "(1.0)" means nothing
                if !(min_inclusive && max_inclusive) {
                    bail!("Invalid version range '{}'", s);
                }
                let version: NuGetVersion = inner.trim().parse()?;
                Ok(VersionRange {
                    min: Some(version.clone()),
                    min_inclusive: true,
                    max: Some(version),
                    max_inclusive: true,
                })
            }
            Some((lower, upper)) => {
                if upper.contains(',') {
                    bail!("Invalid version range '{}'", s);
                }
                let min = parse_bound(lower)?;
                let max = parse_bound(upper)?;
                if let (Some(min), Some(max)) = (&min, &max)
                    && min > max
                {
                    bail!("Version range '{}' has a lower bound above its upper bound", s);
                }
                Ok(VersionRange {
                    min_inclusive: min_inclusive && min.is_some(),
                    max_inclusive: max_inclusive && max.is_some(),
                    min,
                    max,
                })
            }
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exact() {
            if let Some(min) = &self.min {
                return write!(f, "[{}]", min);
            }
        }

        let open = if self.min_inclusive { '[' } else { '(' };
        let close = if self.max_inclusive { ']' } else { ')' };
        let min = self.min.as_ref().map(ToString::to_string).unwrap_or_default();
        let max = self.max.as_ref().map(ToString::to_string).unwrap_or_default();
        write!(f, "{}{}, {}{}", open, min, max, close)
    }
}

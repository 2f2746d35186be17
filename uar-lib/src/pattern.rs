//! Member name filtering

use crate::{Error, Result};
use regex::Regex;

/// A compiled filter deciding which archive members qualify for extraction.
///
/// Matching is an unanchored, case-sensitive search over the full member
/// name as stored in the archive (forward-slash separators included).
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compile a textual pattern. Fails eagerly, not on first use.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    /// Test whether a member name contains a match anywhere.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// The source text of the pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Self { regex }
    }
}

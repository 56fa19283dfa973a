//! Dependency-tracking exclusion list

use serde::Serialize;

/// Entries this short are treated as typos rather than host names
const MIN_ENTRY_LEN: usize = 6;

/// Host names whose outgoing calls the SDK should not auto-track
///
/// Order of first appearance is kept and duplicates are not collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExclusionSet(Vec<String>);

impl ExclusionSet {
    /// Parse a newline-delimited host list
    ///
    /// Each line is trimmed; blank lines and lines of five characters or
    /// fewer are dropped. No case normalization.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
            return Self::default();
        };

        Self(
            raw.split('\n')
                .map(str::trim)
                .filter(|entry| entry.chars().count() >= MIN_ENTRY_LEN)
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

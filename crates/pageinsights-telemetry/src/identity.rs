//! Authenticated-user correlation token

use serde::Serialize;
use std::fmt;

/// Characters the SDK uses as separators in the authenticated-user context
const RESERVED: [char; 4] = ['|', ':', ';', '='];

/// Login name with the SDK's separator characters removed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the correlation token for a raw identity
///
/// Returns `None` when user tracking is off, without looking at the input,
/// and when no identity was supplied.
pub fn redact(raw_identity: Option<&str>, enabled: bool) -> Option<CorrelationToken> {
    if !enabled {
        return None;
    }

    raw_identity.map(|raw| CorrelationToken(raw.chars().filter(|c| !RESERVED.contains(c)).collect()))
}

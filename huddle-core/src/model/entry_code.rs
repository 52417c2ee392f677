use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, case-sensitive entry code. Compared by exact match only.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct EntryCode(String);

impl EntryCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryCode {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for EntryCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for EntryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

use crate::model::{EntryCode, Identity};
use serde::{Deserialize, Serialize};

/// A participant waiting at the door, stored under `pendingParticipant`.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct Participant {
    pub code: EntryCode,
    pub name: String,
}

impl Participant {
    pub fn new(code: EntryCode, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.name.clone())
    }
}

/// Stored under `approvedParticipantData` once the host lets someone in.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct ApprovedParticipant {
    pub name: String,
}

impl ApprovedParticipant {
    pub fn identity(&self) -> Identity {
        Identity::new(self.name.clone())
    }
}

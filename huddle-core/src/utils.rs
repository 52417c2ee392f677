use std::time::Duration;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

pub const DEFAULT_HOST_CODE: &str = "MARVINMASTER";
pub const DEFAULT_STUDENT_CODES: [&str; 3] = ["CODE123", "STU456", "STU789"];
pub const DEFAULT_HOST_IDENTITY: &str = "Marvin";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Admission record keys in the shared store.
pub const PENDING_PARTICIPANT_KEY: &str = "pendingParticipant";
pub const APPROVED_PARTICIPANT_CODE_KEY: &str = "approvedParticipantCode";
pub const APPROVED_PARTICIPANT_DATA_KEY: &str = "approvedParticipantData";

/// Prefix of the per-code record marking a student code as used. One key per
/// code, so two codes consumed at once never overwrite each other.
pub const CONSUMED_CODE_KEY_PREFIX: &str = "consumedCode-";

pub fn consumed_code_key(code: &str) -> String {
    format!("{CONSUMED_CODE_KEY_PREFIX}{code}")
}

//! Error taxonomy shared by the admission, media and negotiation layers.
//!
//! Admission and media errors are shown to the user with a way to retry.
//! Negotiation errors are logged by the polling loop and never stop it.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// Neither the host code nor an unconsumed student code.
    #[error("Invalid or used code. Please contact the host.")]
    InvalidCode,

    /// Name was empty after trimming.
    #[error("Please enter your name.")]
    EmptyName,

    /// The name belongs to the host's signaling keys.
    #[error("That name is reserved. Please choose another.")]
    ReservedName,

    /// Someone else is already waiting for approval.
    #[error("Another participant is already waiting. Please try again shortly.")]
    PendingOccupied,

    /// The gate was asked for a step its current state does not allow.
    #[error("This step is not available right now.")]
    WrongStep,

    #[error("Shared store unavailable: {0}")]
    Channel(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("Camera access denied. Please allow camera access and retry.")]
    PermissionDenied,

    #[error("No camera found. Please connect a camera and retry.")]
    DeviceNotFound,

    #[error("Media error: {0}. Retry to try again.")]
    Other(String),
}

impl MediaError {
    /// Whether the engine may fall back to video-only on its own.
    pub fn allows_fallback(&self) -> bool {
        !matches!(self, MediaError::PermissionDenied)
    }
}

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("Failed to create or publish offer: {0}")]
    OfferCreateFailed(String),

    #[error("Failed to apply remote offer: {0}")]
    OfferApplyFailed(String),

    #[error("Failed to apply remote answer: {0}")]
    AnswerApplyFailed(String),

    #[error("Failed to apply remote ICE candidate: {0}")]
    CandidateApplyFailed(String),

    #[error("Failed to attach local track: {0}")]
    TrackAttachFailed(String),

    #[error("Shared store error: {0}")]
    Channel(#[from] ChannelError),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl From<ChannelError> for AdmissionError {
    fn from(e: ChannelError) -> Self {
        AdmissionError::Channel(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to set up peer connection: {0}")]
    PeerSetup(String),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

mod entry_code;
mod identity;
mod media;
mod participant;
mod session;
mod signaling;

pub use entry_code::EntryCode;
pub use identity::{Identity, Role};
pub use media::{MediaConstraints, ShareState, TrackKind, TrackSource};
pub use participant::{ApprovedParticipant, Participant};
pub use session::SessionId;
pub use signaling::{
    IceCandidate, IceServerConfig, SdpType, SessionDescription, SignalKey, SignalKind,
    SignalMessage,
};

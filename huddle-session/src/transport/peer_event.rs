use crate::media::RemoteTrackInfo;
use huddle_core::IceCandidate;

/// Coarse peer-connection state, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Events a peer connection pushes to the negotiation engine that owns it.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// A local ICE candidate was gathered and should be published.
    CandidateGenerated(IceCandidate),

    /// The remote party started sending a track.
    RemoteTrack(RemoteTrackInfo),

    StateChanged(ConnectionState),
}

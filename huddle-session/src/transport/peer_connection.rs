use crate::media::LocalTrack;
use crate::transport::PeerEvent;
use anyhow::Result;
use async_trait::async_trait;
use huddle_core::{IceCandidate, Identity, SessionDescription, TrackKind};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The peer-connection primitive the negotiation engine drives.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    /// Whether a remote description (pending or current) has been applied.
    async fn has_remote_description(&self) -> bool;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Adds an outbound track of a kind not yet sent.
    async fn add_track(&self, track: &LocalTrack) -> Result<()>;

    /// Swaps the outbound track of `kind` without renegotiating.
    async fn replace_track(&self, kind: TrackKind, track: &LocalTrack) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Creates peer connections that report into `events`.
#[async_trait]
pub trait PeerFactory: Send + Sync {
    async fn create(
        &self,
        identity: &Identity,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Arc<dyn PeerConnection>>;
}

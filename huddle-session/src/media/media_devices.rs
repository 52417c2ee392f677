use crate::media::LocalStream;
use async_trait::async_trait;
use huddle_core::{MediaConstraints, MediaError};

/// Capture capability: camera/microphone and display capture.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn get_user_media(&self, constraints: MediaConstraints)
    -> Result<LocalStream, MediaError>;

    async fn get_display_media(&self) -> Result<LocalStream, MediaError>;
}

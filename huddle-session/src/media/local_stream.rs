use huddle_core::{TrackKind, TrackSource};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// One captured track. Clones share the same `ended` signal, so stopping
/// any clone ends them all.
#[derive(Debug, Clone)]
pub struct LocalTrack {
    pub id: String,
    pub stream_id: String,
    pub source: TrackSource,
    pub label: String,
    ended: CancellationToken,
}

impl LocalTrack {
    pub fn new(source: TrackSource, stream_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            stream_id: stream_id.into(),
            source,
            label: label.into(),
            ended: CancellationToken::new(),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.source.kind()
    }

    /// Stops capture. Also what the platform does when the user revokes a
    /// screen share.
    pub fn stop(&self) {
        self.ended.cancel();
    }

    pub fn is_ended(&self) -> bool {
        self.ended.is_cancelled()
    }

    pub async fn wait_ended(&self) {
        self.ended.cancelled().await;
    }
}

#[derive(Debug, Clone)]
pub struct LocalStream {
    pub id: String,
    tracks: Vec<LocalTrack>,
}

impl LocalStream {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tracks: Vec::new(),
        }
    }

    pub fn with_track(mut self, source: TrackSource, label: impl Into<String>) -> Self {
        let track = LocalTrack::new(source, self.id.clone(), label);
        self.tracks.push(track);
        self
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn track(&self, kind: TrackKind) -> Option<&LocalTrack> {
        self.tracks.iter().find(|t| t.kind() == kind)
    }

    pub fn video_track(&self) -> Option<&LocalTrack> {
        self.track(TrackKind::Video)
    }

    pub fn audio_track(&self) -> Option<&LocalTrack> {
        self.track(TrackKind::Audio)
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

impl Default for LocalStream {
    fn default() -> Self {
        Self::new()
    }
}

use huddle_core::TrackKind;
use tokio::sync::watch;
use uuid::Uuid;

/// A track the remote party is sending us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrackInfo {
    pub track_id: String,
    pub stream_id: String,
    pub kind: TrackKind,
}

/// What the remote-display sink is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteView {
    /// Stable for the lifetime of the sink; a new remote stream reuses it.
    pub view_id: Uuid,
    pub stream_id: String,
    pub tracks: Vec<RemoteTrackInfo>,
}

/// The single sink remote media is attached to. Created on the first remote
/// track and reused afterwards.
#[derive(Debug, Clone)]
pub struct RemoteDisplay {
    view: watch::Sender<Option<RemoteView>>,
}

impl Default for RemoteDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteDisplay {
    pub fn new() -> Self {
        let (view, _) = watch::channel(None);
        Self { view }
    }

    pub fn attach(&self, track: RemoteTrackInfo) {
        self.view.send_modify(|view| match view {
            None => {
                *view = Some(RemoteView {
                    view_id: Uuid::new_v4(),
                    stream_id: track.stream_id.clone(),
                    tracks: vec![track],
                });
            }
            Some(current) if current.stream_id == track.stream_id => {
                if !current.tracks.iter().any(|t| t.track_id == track.track_id) {
                    current.tracks.push(track);
                }
            }
            Some(current) => {
                current.stream_id = track.stream_id.clone();
                current.tracks = vec![track];
            }
        });
    }

    pub fn current(&self) -> Option<RemoteView> {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<RemoteView>> {
        self.view.subscribe()
    }
}

use crate::media::{LocalStream, LocalTrack, MediaDevices};
use async_trait::async_trait;
use huddle_core::{MediaConstraints, MediaError, TrackSource};
use std::sync::Mutex;
use tracing::debug;

/// Device-less capture. Produces labelled tracks and can pretend hardware
/// is missing or access is refused.
#[derive(Debug)]
pub struct SyntheticDevices {
    camera: bool,
    microphone: bool,
    display: bool,
    permission_denied: bool,
    requests: Mutex<Vec<MediaConstraints>>,
    screen_tracks: Mutex<Vec<LocalTrack>>,
}

impl Default for SyntheticDevices {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticDevices {
    pub fn new() -> Self {
        Self {
            camera: true,
            microphone: true,
            display: true,
            permission_denied: false,
            requests: Mutex::new(Vec::new()),
            screen_tracks: Mutex::new(Vec::new()),
        }
    }

    pub fn without_camera(mut self) -> Self {
        self.camera = false;
        self
    }

    pub fn without_microphone(mut self) -> Self {
        self.microphone = false;
        self
    }

    pub fn without_display(mut self) -> Self {
        self.display = false;
        self
    }

    pub fn deny_permission(mut self) -> Self {
        self.permission_denied = true;
        self
    }

    /// Every `get_user_media` request seen so far, in order.
    pub fn requests(&self) -> Vec<MediaConstraints> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Ends every display track handed out, as if sharing was stopped from
    /// the operating system.
    pub fn revoke_screen_share(&self) {
        if let Ok(tracks) = self.screen_tracks.lock() {
            for track in tracks.iter() {
                track.stop();
            }
        }
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<LocalStream, MediaError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(constraints);
        }

        if !constraints.audio && !constraints.video {
            return Err(MediaError::Other("TypeError: no media requested".into()));
        }
        if self.permission_denied {
            return Err(MediaError::PermissionDenied);
        }
        if (constraints.video && !self.camera) || (constraints.audio && !self.microphone) {
            return Err(MediaError::DeviceNotFound);
        }

        let mut stream = LocalStream::new();
        if constraints.audio {
            stream = stream.with_track(TrackSource::Microphone, "synthetic microphone");
        }
        if constraints.video {
            stream = stream.with_track(TrackSource::Camera, "synthetic camera");
        }
        debug!(stream = %stream.id, ?constraints, "Synthetic user media");
        Ok(stream)
    }

    async fn get_display_media(&self) -> Result<LocalStream, MediaError> {
        if !self.display || self.permission_denied {
            return Err(MediaError::PermissionDenied);
        }

        let stream = LocalStream::new().with_track(TrackSource::Screen, "synthetic screen");
        if let (Ok(mut issued), Some(track)) = (self.screen_tracks.lock(), stream.video_track()) {
            issued.push(track.clone());
        }
        Ok(stream)
    }
}

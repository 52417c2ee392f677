use crate::channel::{PollHandle, SharedChannel, SharedChannelExt, spawn_poll};
use crate::media::{LocalStream, LocalTrack, MediaDevices, RemoteDisplay, RemoteTrackInfo};
use crate::negotiation::TickReport;
use crate::transport::{ConnectionState, PeerConnection, PeerEvent};
use huddle_core::utils::{APPROVED_PARTICIPANT_DATA_KEY, PENDING_PARTICIPANT_KEY};
use huddle_core::{
    ApprovedParticipant, ChannelError, IceCandidate, Identity, MediaConstraints, MediaError,
    NegotiationError, Participant, Role, SessionId, ShareState, SignalKey, SignalKind, SignalMessage,
    TrackKind,
};
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Whose signaling keys the engine reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemotePeer {
    /// Known up front. The participant always talks to the host identity.
    Fixed(Identity),
    /// Whoever is admitted. Looked up in the store on every tick.
    Admitted,
}

pub struct EngineSetup {
    pub role: Role,
    pub identity: Identity,
    pub remote: RemotePeer,
    pub channel: Arc<dyn SharedChannel>,
    pub peer: Arc<dyn PeerConnection>,
    pub devices: Arc<dyn MediaDevices>,
    /// Session liveness. Every callback checks it on entry and after each
    /// suspension point.
    pub cancel: CancellationToken,
}

#[derive(Default)]
struct MediaState {
    camera: Option<LocalStream>,
    screen: Option<LocalStream>,
    /// Outbound track id per kind.
    attached: HashMap<TrackKind, String>,
    requested: Option<MediaConstraints>,
    last_error: Option<MediaError>,
}

/// Drives one peer connection to a connected media state using the shared
/// store as the only signaling transport.
pub struct NegotiationEngine {
    session_id: SessionId,
    role: Role,
    identity: Identity,
    remote: RemotePeer,
    channel: Arc<dyn SharedChannel>,
    peer: Arc<dyn PeerConnection>,
    devices: Arc<dyn MediaDevices>,
    cancel: CancellationToken,

    media: Mutex<MediaState>,
    share_state: watch::Sender<ShareState>,
    connection_state: watch::Sender<ConnectionState>,
    remote_display: RemoteDisplay,
    offer_published: AtomicBool,
    closed: AtomicBool,
}

impl NegotiationEngine {
    pub fn new(setup: EngineSetup) -> Arc<Self> {
        let (share_state, _) = watch::channel(ShareState::CameraSharing);
        let (connection_state, _) = watch::channel(ConnectionState::New);

        Arc::new(Self {
            session_id: SessionId::new(),
            role: setup.role,
            identity: setup.identity,
            remote: setup.remote,
            channel: setup.channel,
            peer: setup.peer,
            devices: setup.devices,
            cancel: setup.cancel,
            media: Mutex::new(MediaState::default()),
            share_state,
            connection_state,
            remote_display: RemoteDisplay::new(),
            offer_published: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        })
    }

    /// Fresh for every engine; a re-entered session gets a new one.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn share_state(&self) -> ShareState {
        *self.share_state.borrow()
    }

    pub fn subscribe_share_state(&self) -> watch::Receiver<ShareState> {
        self.share_state.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection_state.borrow()
    }

    pub fn subscribe_connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection_state.subscribe()
    }

    pub fn remote_display(&self) -> &RemoteDisplay {
        &self.remote_display
    }

    pub fn offer_published(&self) -> bool {
        self.offer_published.load(Ordering::SeqCst)
    }

    pub async fn has_remote_description(&self) -> bool {
        self.peer.has_remote_description().await
    }

    pub async fn camera_stream(&self) -> Option<LocalStream> {
        self.media.lock().await.camera.clone()
    }

    pub async fn attached_track(&self, kind: TrackKind) -> Option<String> {
        self.media.lock().await.attached.get(&kind).cloned()
    }

    /// The error from the last capture attempt, for the retry prompt.
    pub async fn last_media_error(&self) -> Option<MediaError> {
        self.media.lock().await.last_error.clone()
    }

    // ----- media -----

    /// Captures camera/microphone and attaches the tracks.
    ///
    /// A failure other than `PermissionDenied` on an audio+video request is
    /// retried once with video only.
    pub async fn acquire_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<LocalStream, MediaError> {
        self.media.lock().await.requested = Some(constraints);

        let stream = match self.devices.get_user_media(constraints).await {
            Ok(stream) => stream,
            Err(e) if e.allows_fallback() && constraints.audio && constraints.video => {
                warn!(identity = %self.identity, "Media capture failed ({}), retrying video only", e);
                match self.devices.get_user_media(MediaConstraints::VIDEO_ONLY).await {
                    Ok(stream) => stream,
                    Err(e) => return Err(self.media_failed(e).await),
                }
            }
            Err(e) => return Err(self.media_failed(e).await),
        };

        if self.cancel.is_cancelled() {
            stream.stop();
            return Err(session_closed());
        }

        let mut media = self.media.lock().await;
        if let Some(previous) = media.camera.replace(stream.clone()) {
            previous.stop();
        }
        media.last_error = None;

        // While a screen is shared, the camera video stays off the wire.
        let sharing_screen = media.screen.is_some();
        let tracks: Vec<LocalTrack> = stream
            .tracks()
            .iter()
            .filter(|t| !(sharing_screen && t.kind() == TrackKind::Video))
            .cloned()
            .collect();

        if let Err(e) = self.attach_tracks_locked(&mut media, &tracks).await {
            warn!(identity = %self.identity, "{}", e);
        }

        info!(
            identity = %self.identity,
            stream = %stream.id,
            tracks = stream.tracks().len(),
            "Local media acquired"
        );
        Ok(stream)
    }

    /// User-initiated retry with the constraints of the last request.
    pub async fn retry_media(&self) -> Result<LocalStream, MediaError> {
        let requested = {
            let mut media = self.media.lock().await;
            media.last_error = None;
            media.requested.unwrap_or_default()
        };
        self.acquire_media(requested).await
    }

    /// Adds or replaces outbound tracks. Tracks already outbound are skipped.
    pub async fn attach_local_tracks(&self, stream: &LocalStream) -> Result<(), NegotiationError> {
        let mut media = self.media.lock().await;
        self.attach_tracks_locked(&mut media, stream.tracks()).await
    }

    async fn attach_tracks_locked(
        &self,
        media: &mut MediaState,
        tracks: &[LocalTrack],
    ) -> Result<(), NegotiationError> {
        for track in tracks {
            let kind = track.kind();
            let result = match media.attached.get(&kind) {
                Some(id) if *id == track.id => continue,
                Some(_) => self.peer.replace_track(kind, track).await,
                None => self.peer.add_track(track).await,
            };
            result.map_err(|e| NegotiationError::TrackAttachFailed(e.to_string()))?;

            debug!(identity = %self.identity, track = %track.id, source = ?track.source, "Outbound track set");
            media.attached.insert(kind, track.id.clone());
        }
        Ok(())
    }

    async fn media_failed(&self, e: MediaError) -> MediaError {
        warn!(identity = %self.identity, "Media capture failed: {}", e);
        self.media.lock().await.last_error = Some(e.clone());
        e
    }

    /// Swaps outbound video between camera and screen.
    ///
    /// When the display stream ends on its own (the user stops sharing from
    /// the OS), the engine goes back to the camera.
    pub async fn toggle_screen_share(self: &Arc<Self>) -> Result<ShareState, MediaError> {
        if self.share_state() == ShareState::ScreenSharing {
            return Ok(self.revert_to_camera().await);
        }

        let screen = self.devices.get_display_media().await?;
        if self.cancel.is_cancelled() {
            screen.stop();
            return Err(session_closed());
        }
        let Some(video) = screen.video_track().cloned() else {
            screen.stop();
            return Err(MediaError::Other("display capture has no video".into()));
        };

        {
            let mut media = self.media.lock().await;
            if let Err(e) = self
                .attach_tracks_locked(&mut media, std::slice::from_ref(&video))
                .await
            {
                screen.stop();
                return Err(MediaError::Other(e.to_string()));
            }
            if let Some(previous) = media.screen.replace(screen.clone()) {
                previous.stop();
            }
        }

        self.share_state.send_replace(ShareState::ScreenSharing);
        self.watch_screen_end(screen.id.clone(), video);

        info!(identity = %self.identity, stream = %screen.id, "Screen sharing started");
        Ok(ShareState::ScreenSharing)
    }

    fn watch_screen_end(self: &Arc<Self>, stream_id: String, track: LocalTrack) {
        let engine = Arc::downgrade(self);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = track.wait_ended() => {}
            }

            let Some(engine) = engine.upgrade() else {
                return;
            };
            let current = engine.media.lock().await.screen.as_ref().map(|s| s.id.clone());
            if current.as_deref() != Some(stream_id.as_str()) {
                return;
            }

            info!(identity = %engine.identity, "Screen sharing ended externally");
            engine.revert_to_camera().await;
        });
    }

    async fn revert_to_camera(&self) -> ShareState {
        let camera_video = {
            let mut media = self.media.lock().await;
            if let Some(screen) = media.screen.take() {
                screen.stop();
            }
            media
                .camera
                .as_ref()
                .and_then(|s| s.video_track())
                .filter(|t| !t.is_ended())
                .cloned()
        };

        match camera_video {
            Some(track) => {
                let mut media = self.media.lock().await;
                if let Err(e) = self
                    .attach_tracks_locked(&mut media, std::slice::from_ref(&track))
                    .await
                {
                    warn!(identity = %self.identity, "{}", e);
                }
            }
            None => {
                let requested = self.media.lock().await.requested.unwrap_or_default();
                if let Err(e) = self.acquire_media(requested).await {
                    warn!(identity = %self.identity, "Camera unavailable after screen share: {}", e);
                }
            }
        }

        self.share_state.send_replace(ShareState::CameraSharing);
        info!(identity = %self.identity, "Back to camera");
        ShareState::CameraSharing
    }

    // ----- signaling -----

    /// Host only, once per session. Returns whether an offer was written.
    pub async fn create_offer_and_publish(&self) -> Result<bool, NegotiationError> {
        if self.role != Role::Host || self.offer_published.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }

        match self.publish_offer().await {
            Ok(()) => Ok(true),
            Err(e) => {
                self.offer_published.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    async fn publish_offer(&self) -> Result<(), NegotiationError> {
        let offer = self
            .peer
            .create_offer()
            .await
            .map_err(|e| NegotiationError::OfferCreateFailed(e.to_string()))?;
        self.peer
            .set_local_description(offer.clone())
            .await
            .map_err(|e| NegotiationError::OfferCreateFailed(e.to_string()))?;

        if self.cancel.is_cancelled() {
            return Ok(());
        }
        self.publish(SignalMessage::Offer(offer)).await?;
        info!(identity = %self.identity, "Offer published");
        Ok(())
    }

    async fn publish(&self, msg: SignalMessage) -> Result<(), ChannelError> {
        let key = msg.key_for(&self.identity);
        self.channel
            .write(&key.to_string(), msg.encode_payload()?)
            .await?;
        debug!(identity = %self.identity, key = %key, "Signal written");
        Ok(())
    }

    /// One pass over the remote party's keys: candidate, then offer, then
    /// answer. Failures are logged and collected; they never stop polling.
    pub async fn negotiation_tick(&self) -> TickReport {
        let mut report = TickReport::default();
        if self.cancel.is_cancelled() {
            return report;
        }

        let remote = match self.remote_identity().await {
            Ok(Some(remote)) => remote,
            Ok(None) => return report,
            Err(e) => {
                self.record(&mut report, e.into());
                return report;
            }
        };
        report.remote = Some(remote.clone());

        match self.take_candidate(&remote).await {
            Ok(applied) => report.candidate_applied = applied,
            Err(e) => self.record(&mut report, e),
        }
        if self.cancel.is_cancelled() {
            return report;
        }

        match self.answer_offer(&remote).await {
            Ok(answered) => report.offer_answered = answered,
            Err(e) => self.record(&mut report, e),
        }
        if self.cancel.is_cancelled() {
            return report;
        }

        match self.take_answer(&remote).await {
            Ok(applied) => report.answer_applied = applied,
            Err(e) => self.record(&mut report, e),
        }

        report
    }

    fn record(&self, report: &mut TickReport, e: NegotiationError) {
        warn!(identity = %self.identity, "Negotiation tick: {}", e);
        report.errors.push(e);
    }

    async fn remote_identity(&self) -> Result<Option<Identity>, ChannelError> {
        match &self.remote {
            RemotePeer::Fixed(identity) => Ok(Some(identity.clone())),
            RemotePeer::Admitted => {
                let approved: Option<ApprovedParticipant> =
                    self.channel.read_json(APPROVED_PARTICIPANT_DATA_KEY).await?;
                if let Some(approved) = approved {
                    return Ok(Some(approved.identity()));
                }
                let pending: Option<Participant> =
                    self.channel.read_json(PENDING_PARTICIPANT_KEY).await?;
                Ok(pending.map(|p| p.identity()))
            }
        }
    }

    /// Candidate keys are consumed whether or not the candidate applied.
    async fn take_candidate(&self, remote: &Identity) -> Result<bool, NegotiationError> {
        let key = SignalKey::new(remote.clone(), SignalKind::Candidate).to_string();
        let Some(raw) = self.channel.read(&key).await? else {
            return Ok(false);
        };

        let applied = self.apply_candidate(&raw).await;
        self.channel.delete(&key).await?;
        debug!(identity = %self.identity, key = %key, ok = applied.is_ok(), "Candidate consumed");
        applied.map(|()| true)
    }

    async fn apply_candidate(&self, raw: &str) -> Result<(), NegotiationError> {
        let Ok(SignalMessage::IceCandidate(candidate)) =
            SignalMessage::decode_payload(SignalKind::Candidate, raw)
        else {
            return Err(NegotiationError::CandidateApplyFailed(
                "malformed candidate payload".into(),
            ));
        };
        self.peer
            .add_ice_candidate(candidate)
            .await
            .map_err(|e| NegotiationError::CandidateApplyFailed(e.to_string()))
    }

    /// Offer keys stay in the store; the remote-description guard keeps a
    /// re-read offer from being applied twice.
    async fn answer_offer(&self, remote: &Identity) -> Result<bool, NegotiationError> {
        let key = SignalKey::new(remote.clone(), SignalKind::Offer).to_string();
        let Some(raw) = self.channel.read(&key).await? else {
            return Ok(false);
        };
        if self.peer.has_remote_description().await {
            return Ok(false);
        }

        let Ok(SignalMessage::Offer(offer)) = SignalMessage::decode_payload(SignalKind::Offer, &raw)
        else {
            return Err(NegotiationError::OfferApplyFailed(
                "malformed offer payload".into(),
            ));
        };

        let apply_failed = |e: anyhow::Error| NegotiationError::OfferApplyFailed(e.to_string());
        self.peer
            .set_remote_description(offer)
            .await
            .map_err(apply_failed)?;
        let answer = self.peer.create_answer().await.map_err(apply_failed)?;
        self.peer
            .set_local_description(answer.clone())
            .await
            .map_err(apply_failed)?;

        if self.cancel.is_cancelled() {
            return Ok(false);
        }
        self.publish(SignalMessage::Answer(answer)).await?;
        info!(identity = %self.identity, remote = %remote, "Offer answered");
        Ok(true)
    }

    async fn take_answer(&self, remote: &Identity) -> Result<bool, NegotiationError> {
        let key = SignalKey::new(remote.clone(), SignalKind::Answer).to_string();
        let Some(raw) = self.channel.read(&key).await? else {
            return Ok(false);
        };
        if self.peer.has_remote_description().await {
            return Ok(false);
        }

        let applied = match SignalMessage::decode_payload(SignalKind::Answer, &raw) {
            Ok(SignalMessage::Answer(answer)) => self
                .peer
                .set_remote_description(answer)
                .await
                .map_err(|e| NegotiationError::AnswerApplyFailed(e.to_string())),
            _ => Err(NegotiationError::AnswerApplyFailed(
                "malformed answer payload".into(),
            )),
        };
        self.channel.delete(&key).await?;

        if applied.is_ok() {
            info!(identity = %self.identity, remote = %remote, "Answer applied");
        }
        applied.map(|()| true)
    }

    /// Publishes a local candidate, replacing any unconsumed one.
    pub async fn on_local_ice_candidate(&self, candidate: IceCandidate) -> Result<(), ChannelError> {
        if self.cancel.is_cancelled() {
            return Ok(());
        }
        self.publish(SignalMessage::IceCandidate(candidate)).await
    }

    pub fn on_remote_track(&self, track: RemoteTrackInfo) {
        if self.cancel.is_cancelled() {
            return;
        }
        info!(identity = %self.identity, track = %track.track_id, kind = %track.kind, "Remote track attached");
        self.remote_display.attach(track);
    }

    pub async fn handle_peer_event(&self, event: PeerEvent) {
        if self.cancel.is_cancelled() {
            return;
        }

        match event {
            PeerEvent::CandidateGenerated(candidate) => {
                if let Err(e) = self.on_local_ice_candidate(candidate).await {
                    warn!(identity = %self.identity, "Failed to publish candidate: {}", e);
                }
            }
            PeerEvent::RemoteTrack(track) => self.on_remote_track(track),
            PeerEvent::StateChanged(state) => {
                info!(identity = %self.identity, "Connection state: {:?}", state);
                self.connection_state.send_replace(state);
            }
        }
    }

    /// Feeds peer callbacks into the engine until the session ends.
    pub fn spawn_event_pump(self: &Arc<Self>, mut events: mpsc::Receiver<PeerEvent>) -> JoinHandle<()> {
        let engine = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = engine.cancel.cancelled() => break,
                    event = events.recv() => {
                        let Some(event) = event else { break };
                        engine.handle_peer_event(event).await;
                    }
                }
            }
            debug!(identity = %engine.identity, "Peer event pump stopped");
        })
    }

    /// Runs `negotiation_tick` every `period` until the session is cancelled.
    pub fn spawn_negotiation_poll(self: &Arc<Self>, period: Duration) -> PollHandle {
        let engine = Arc::clone(self);

        spawn_poll("negotiation", period, self.cancel.child_token(), move || {
            let engine = engine.clone();
            async move {
                engine.negotiation_tick().await;
                ControlFlow::Continue(())
            }
        })
    }

    /// Cancels the session, stops local capture and closes the peer.
    pub async fn teardown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.cancel.cancel();

        {
            let mut media = self.media.lock().await;
            if let Some(screen) = media.screen.take() {
                screen.stop();
            }
            if let Some(camera) = media.camera.take() {
                camera.stop();
            }
            media.attached.clear();
        }

        if let Err(e) = self.peer.close().await {
            warn!(identity = %self.identity, "Failed to close peer connection: {}", e);
        }
        self.connection_state.send_replace(ConnectionState::Closed);
        info!(identity = %self.identity, session = %self.session_id, "Negotiation session closed");
    }

    /// Deletes every signaling key owned by `identity`.
    pub async fn clear_signaling_keys(
        channel: &dyn SharedChannel,
        identity: &Identity,
    ) -> Result<(), ChannelError> {
        for key in SignalKey::all_for(identity) {
            channel.delete(&key.to_string()).await?;
        }
        debug!(identity = %identity, "Signaling keys cleared");
        Ok(())
    }
}

fn session_closed() -> MediaError {
    MediaError::Other("session closed".into())
}

use crate::admission::{AdmissionController, Admitted, ParticipantGate};
use crate::channel::{PollHandle, SharedChannel};
use crate::media::MediaDevices;
use crate::negotiation::{EngineSetup, NegotiationEngine, RemotePeer};
use crate::transport::{PeerEvent, PeerFactory};
use futures::future::join_all;
use huddle_core::{
    AdmissionError, HuddleConfig, Identity, MediaConstraints, Participant, Role, SessionError,
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Everything one running session owns. Dropped as a unit on `leave`.
struct ActiveSession {
    engine: Arc<NegotiationEngine>,
    cancel: CancellationToken,
    negotiation: PollHandle,
    pending: Option<PollHandle>,
    pump: JoinHandle<()>,
}

/// Owns the per-role session lifecycle: at most one negotiation session and
/// its polling loops at a time.
pub struct SessionCoordinator {
    config: HuddleConfig,
    channel: Arc<dyn SharedChannel>,
    admission: Arc<AdmissionController>,
    devices: Arc<dyn MediaDevices>,
    peers: Arc<dyn PeerFactory>,
    active: Option<ActiveSession>,
    pending_tx: watch::Sender<Option<Participant>>,
}

impl SessionCoordinator {
    pub fn new(
        config: HuddleConfig,
        channel: Arc<dyn SharedChannel>,
        devices: Arc<dyn MediaDevices>,
        peers: Arc<dyn PeerFactory>,
    ) -> Self {
        let admission = Arc::new(AdmissionController::new(&config, channel.clone()));
        let (pending_tx, _) = watch::channel(None);

        Self {
            config,
            channel,
            admission,
            devices,
            peers,
            active: None,
            pending_tx,
        }
    }

    pub fn config(&self) -> &HuddleConfig {
        &self.config
    }

    pub fn admission(&self) -> &Arc<AdmissionController> {
        &self.admission
    }

    /// A fresh gate for one party walking through admission.
    pub fn gate(&self) -> ParticipantGate {
        ParticipantGate::new(self.admission.clone())
    }

    pub fn engine(&self) -> Option<&Arc<NegotiationEngine>> {
        self.active.as_ref().map(|s| &s.engine)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Host side: the participant currently waiting, if any.
    pub fn pending_notices(&self) -> watch::Receiver<Option<Participant>> {
        self.pending_tx.subscribe()
    }

    /// Starts the session matching what the gate admitted.
    pub async fn enter(&mut self, admitted: &Admitted) -> Result<Arc<NegotiationEngine>, SessionError> {
        match admitted.role {
            Role::Host => self.start_host().await,
            Role::Participant => self.start_participant(admitted.identity.clone()).await,
        }
    }

    pub async fn start_host(&mut self) -> Result<Arc<NegotiationEngine>, SessionError> {
        let identity = self.config.host_identity.clone();
        let engine = self.start(Role::Host, identity, RemotePeer::Admitted).await?;

        if let Err(e) = engine.create_offer_and_publish().await {
            self.leave().await;
            return Err(e.into());
        }

        let pending_tx = self.pending_tx.clone();
        let cancel = engine.cancel_token().child_token();
        let pending = self.admission.poll_for_pending(cancel, move |participant| {
            pending_tx.send_if_modified(|current| {
                if current.as_ref() == Some(&participant) {
                    return false;
                }
                info!(name = %participant.name, "Participant waiting for approval");
                *current = Some(participant);
                true
            });
        });

        if let Some(active) = self.active.as_mut() {
            active.pending = Some(pending);
        }
        Ok(engine)
    }

    pub async fn start_participant(
        &mut self,
        identity: Identity,
    ) -> Result<Arc<NegotiationEngine>, SessionError> {
        let host = RemotePeer::Fixed(self.config.host_identity.clone());
        self.start(Role::Participant, identity, host).await
    }

    async fn start(
        &mut self,
        role: Role,
        identity: Identity,
        remote: RemotePeer,
    ) -> Result<Arc<NegotiationEngine>, SessionError> {
        self.leave().await;

        // Stale keys from an earlier session would be read as fresh signals.
        NegotiationEngine::clear_signaling_keys(self.channel.as_ref(), &identity).await?;

        let (event_tx, event_rx) = mpsc::channel::<PeerEvent>(64);
        let peer = self
            .peers
            .create(&identity, event_tx)
            .await
            .map_err(|e| SessionError::PeerSetup(e.to_string()))?;

        let cancel = CancellationToken::new();
        let engine = NegotiationEngine::new(EngineSetup {
            role,
            identity: identity.clone(),
            remote,
            channel: self.channel.clone(),
            peer,
            devices: self.devices.clone(),
            cancel: cancel.clone(),
        });
        let pump = engine.spawn_event_pump(event_rx);

        // The session runs without local media; the user can retry later.
        if let Err(e) = engine.acquire_media(MediaConstraints::AUDIO_VIDEO).await {
            warn!(identity = %identity, "Starting without local media: {}", e);
        }

        let negotiation = engine.spawn_negotiation_poll(self.config.poll_interval());

        self.active = Some(ActiveSession {
            engine: engine.clone(),
            cancel,
            negotiation,
            pending: None,
            pump,
        });

        info!(identity = %identity, role = %role, session = %engine.session_id(), "Session started");
        Ok(engine)
    }

    /// Host only. Admits the waiting participant and clears the notice.
    pub async fn approve_pending(&self) -> Result<Option<Participant>, AdmissionError> {
        let approved = self.admission.approve_pending().await?;
        self.pending_tx.send_replace(None);
        Ok(approved)
    }

    pub async fn decline_pending(&self) -> Result<Option<Participant>, AdmissionError> {
        let declined = self.admission.decline_pending().await?;
        self.pending_tx.send_replace(None);
        Ok(declined)
    }

    /// Ends the running session: both poll loops, the event pump and the
    /// peer connection go together.
    pub async fn leave(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        active.cancel.cancel();
        let mut polls = vec![active.negotiation];
        polls.extend(active.pending);
        for poll in &polls {
            poll.cancel();
        }
        join_all(polls.into_iter().map(PollHandle::join)).await;
        let _ = active.pump.await;

        active.engine.teardown().await;
        self.pending_tx.send_replace(None);

        info!(identity = %active.engine.identity(), "Session left");
    }
}

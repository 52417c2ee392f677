use crate::admission::Waiting;
use crate::channel::{PollHandle, SharedChannel, SharedChannelExt, spawn_poll};
use huddle_core::utils::{
    APPROVED_PARTICIPANT_CODE_KEY, APPROVED_PARTICIPANT_DATA_KEY, PENDING_PARTICIPANT_KEY,
    consumed_code_key,
};
use huddle_core::{
    AdmissionError, ApprovedParticipant, EntryCode, HuddleConfig, Identity, Participant,
};
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Result of a code that was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Host code: straight into the session, no name step.
    Host,
    /// Unconsumed student code: ask for a display name next.
    NeedsName,
}

/// Gatekeeper for entry codes and the single pending-participant slot.
///
/// One instance serves both roles. Consumed codes, like the pending and
/// approved records, live in the shared store, so every controller on the
/// same store agrees on which codes are spent.
pub struct AdmissionController {
    channel: Arc<dyn SharedChannel>,
    host_code: EntryCode,
    host_identity: Identity,
    student_codes: HashSet<EntryCode>,
    poll_interval: Duration,
}

impl AdmissionController {
    pub fn new(config: &HuddleConfig, channel: Arc<dyn SharedChannel>) -> Self {
        Self {
            channel,
            host_code: config.host_code.clone(),
            host_identity: config.host_identity.clone(),
            student_codes: config.student_codes.iter().cloned().collect(),
            poll_interval: config.poll_interval(),
        }
    }

    pub fn host_identity(&self) -> &Identity {
        &self.host_identity
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// A configured student code nobody has used yet.
    pub async fn is_available(&self, code: &EntryCode) -> Result<bool, AdmissionError> {
        if !self.student_codes.contains(code) {
            return Ok(false);
        }
        let consumed = self.channel.read(&consumed_code_key(code.as_str())).await?;
        Ok(consumed.is_none())
    }

    /// Checks a typed code. Surrounding whitespace is ignored, the rest must
    /// match exactly.
    pub async fn submit_code(&self, code: &str) -> Result<Admission, AdmissionError> {
        let code = EntryCode::from(code.trim());

        if code == self.host_code {
            info!("Host code accepted");
            return Ok(Admission::Host);
        }

        if self.is_available(&code).await? {
            info!(code = %code, "Student code accepted, waiting for name");
            return Ok(Admission::NeedsName);
        }

        warn!(code = %code, "Rejected entry code");
        Err(AdmissionError::InvalidCode)
    }

    /// Consumes `code`, records the pending participant and hands back the
    /// approval watch for the caller.
    ///
    /// The store has no compare-and-set, so two parties racing on the same
    /// code within one round trip can both get through.
    pub async fn submit_name(
        &self,
        code: &EntryCode,
        name: &str,
    ) -> Result<Waiting, AdmissionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AdmissionError::EmptyName);
        }
        if name.eq_ignore_ascii_case(self.host_identity.as_str()) {
            warn!(name, "Refusing the host identity as a participant name");
            return Err(AdmissionError::ReservedName);
        }
        if !self.is_available(code).await? {
            return Err(AdmissionError::InvalidCode);
        }

        let pending: Option<Participant> = self.channel.read_json(PENDING_PARTICIPANT_KEY).await?;
        if let Some(other) = pending {
            warn!(waiting = %other.name, "Pending slot occupied, refusing {}", name);
            return Err(AdmissionError::PendingOccupied);
        }

        let consumed_key = consumed_code_key(code.as_str());
        self.channel.write(&consumed_key, name.to_owned()).await?;

        let participant = Participant::new(code.clone(), name);
        if let Err(e) = self
            .channel
            .write_json(PENDING_PARTICIPANT_KEY, &participant)
            .await
        {
            if let Err(restore) = self.channel.delete(&consumed_key).await {
                warn!(code = %code, "Failed to release code: {}", restore);
            }
            return Err(e.into());
        }

        info!(code = %code, name, "Participant waiting for approval");
        Ok(Waiting::new(
            self.channel.clone(),
            participant,
            self.poll_interval,
        ))
    }

    /// Host only. Lets the pending participant in.
    pub async fn approve_pending(&self) -> Result<Option<Participant>, AdmissionError> {
        let Some(pending) = self.pending().await? else {
            return Ok(None);
        };

        self.channel
            .write(APPROVED_PARTICIPANT_CODE_KEY, pending.code.to_string())
            .await?;
        self.channel
            .write_json(
                APPROVED_PARTICIPANT_DATA_KEY,
                &ApprovedParticipant {
                    name: pending.name.clone(),
                },
            )
            .await?;
        self.channel.delete(PENDING_PARTICIPANT_KEY).await?;

        info!(name = %pending.name, "Participant approved");
        Ok(Some(pending))
    }

    /// Host only. Clears the pending slot. The declined participant is not
    /// told and keeps waiting.
    pub async fn decline_pending(&self) -> Result<Option<Participant>, AdmissionError> {
        let pending = self.pending().await?;
        self.channel.delete(PENDING_PARTICIPANT_KEY).await?;
        if let Some(p) = &pending {
            info!(name = %p.name, "Participant declined");
        }
        Ok(pending)
    }

    pub async fn pending(&self) -> Result<Option<Participant>, AdmissionError> {
        Ok(self.channel.read_json(PENDING_PARTICIPANT_KEY).await?)
    }

    pub async fn approved(&self) -> Result<Option<ApprovedParticipant>, AdmissionError> {
        Ok(self.channel.read_json(APPROVED_PARTICIPANT_DATA_KEY).await?)
    }

    /// Host side: calls `on_pending` on every tick that finds someone waiting.
    pub fn poll_for_pending<F>(
        self: &Arc<Self>,
        cancel: CancellationToken,
        on_pending: F,
    ) -> PollHandle
    where
        F: Fn(Participant) + Send + Sync + 'static,
    {
        let controller = Arc::clone(self);
        let on_pending = Arc::new(on_pending);

        spawn_poll("pending-admission", self.poll_interval, cancel, move || {
            let controller = controller.clone();
            let on_pending = on_pending.clone();
            async move {
                match controller.pending().await {
                    Ok(Some(participant)) => on_pending(participant),
                    Ok(None) => {}
                    Err(e) => warn!("Pending admission check failed: {}", e),
                }
                ControlFlow::Continue(())
            }
        })
    }
}

use crate::channel::{SharedChannel, SharedChannelExt};
use huddle_core::utils::{APPROVED_PARTICIPANT_CODE_KEY, APPROVED_PARTICIPANT_DATA_KEY};
use huddle_core::{AdmissionError, ApprovedParticipant, Participant};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A participant parked in the waiting room, watching `approvedParticipantCode`
/// for their own code.
pub struct Waiting {
    channel: Arc<dyn SharedChannel>,
    participant: Participant,
    poll_interval: Duration,
}

impl Waiting {
    pub(crate) fn new(
        channel: Arc<dyn SharedChannel>,
        participant: Participant,
        poll_interval: Duration,
    ) -> Self {
        Self {
            channel,
            participant,
            poll_interval,
        }
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    /// One poll tick: `Some` once the host has approved this participant's code.
    pub async fn check(&self) -> Result<Option<ApprovedParticipant>, AdmissionError> {
        let approved_code = self.channel.read(APPROVED_PARTICIPANT_CODE_KEY).await?;
        if approved_code.as_deref() != Some(self.participant.code.as_str()) {
            return Ok(None);
        }

        let data: Option<ApprovedParticipant> =
            self.channel.read_json(APPROVED_PARTICIPANT_DATA_KEY).await?;
        Ok(Some(data.unwrap_or_else(|| ApprovedParticipant {
            name: self.participant.name.clone(),
        })))
    }

    /// Polls until approved. `None` if `cancel` fires first. There is no
    /// decline notification, so without cancellation this may wait forever.
    pub async fn admitted(&self, cancel: CancellationToken) -> Option<ApprovedParticipant> {
        let period = self.poll_interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(code = %self.participant.code, "Stopped waiting for approval");
                    return None;
                }
                _ = interval.tick() => match self.check().await {
                    Ok(Some(approved)) => {
                        info!(name = %approved.name, "Approval observed");
                        return Some(approved);
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Approval check failed: {}", e),
                },
            }
        }
    }
}

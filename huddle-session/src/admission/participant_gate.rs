use crate::admission::{Admission, AdmissionController, Waiting};
use huddle_core::{AdmissionError, EntryCode, Identity, Role};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Where a party stands at the door.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Unauthenticated,
    AwaitingName { code: EntryCode },
    Waiting { code: EntryCode, name: String },
    Admitted(Admitted),
    /// Dead end for this attempt; [`ParticipantGate::reset`] starts over.
    Rejected,
}

/// A party that made it through the door.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admitted {
    pub role: Role,
    pub identity: Identity,
}

/// Drives one party through
/// `Unauthenticated -> AwaitingName -> Waiting -> Admitted`.
pub struct ParticipantGate {
    controller: Arc<AdmissionController>,
    state: GateState,
    waiting: Option<Waiting>,
}

impl ParticipantGate {
    pub fn new(controller: Arc<AdmissionController>) -> Self {
        Self {
            controller,
            state: GateState::Unauthenticated,
            waiting: None,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn admitted(&self) -> Option<&Admitted> {
        match &self.state {
            GateState::Admitted(admitted) => Some(admitted),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.state = GateState::Unauthenticated;
        self.waiting = None;
    }

    pub async fn enter_code(&mut self, code: &str) -> Result<&GateState, AdmissionError> {
        if self.state != GateState::Unauthenticated {
            return Err(AdmissionError::WrongStep);
        }

        match self.controller.submit_code(code).await {
            Ok(Admission::Host) => {
                self.state = GateState::Admitted(Admitted {
                    role: Role::Host,
                    identity: self.controller.host_identity().clone(),
                });
            }
            Ok(Admission::NeedsName) => {
                self.state = GateState::AwaitingName {
                    code: EntryCode::from(code.trim()),
                };
            }
            Err(e) => {
                self.state = GateState::Rejected;
                return Err(e);
            }
        }
        Ok(&self.state)
    }

    /// An empty or reserved name, or an occupied pending slot, leave the
    /// gate at `AwaitingName` so the name can be re-entered.
    pub async fn enter_name(&mut self, name: &str) -> Result<&GateState, AdmissionError> {
        let GateState::AwaitingName { code } = &self.state else {
            return Err(AdmissionError::WrongStep);
        };
        let code = code.clone();

        match self.controller.submit_name(&code, name).await {
            Ok(waiting) => {
                self.state = GateState::Waiting {
                    code,
                    name: waiting.participant().name.clone(),
                };
                self.waiting = Some(waiting);
                Ok(&self.state)
            }
            Err(AdmissionError::InvalidCode) => {
                self.state = GateState::Rejected;
                Err(AdmissionError::InvalidCode)
            }
            Err(e) => Err(e),
        }
    }

    /// Single approval check, for callers that drive their own timer.
    pub async fn poll_once(&mut self) -> Result<&GateState, AdmissionError> {
        let Some(waiting) = &self.waiting else {
            return Err(AdmissionError::WrongStep);
        };
        let approved = waiting.check().await?;
        if let Some(approved) = approved {
            self.admit(approved.identity());
        }
        Ok(&self.state)
    }

    /// Waits at the cadence configured on the controller until approved or
    /// cancelled.
    pub async fn wait_for_admission(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<Option<Admitted>, AdmissionError> {
        let Some(waiting) = &self.waiting else {
            return Err(AdmissionError::WrongStep);
        };
        let Some(approved) = waiting.admitted(cancel).await else {
            return Ok(None);
        };
        self.admit(approved.identity());
        Ok(self.admitted().cloned())
    }

    fn admit(&mut self, identity: Identity) {
        info!(identity = %identity, "Participant admitted");
        self.state = GateState::Admitted(Admitted {
            role: Role::Participant,
            identity,
        });
        self.waiting = None;
    }
}

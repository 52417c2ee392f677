use huddle_core::{Identity, NegotiationError};

/// What one `negotiation_tick` did.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Whose keys were read. `None` when no remote party is known yet.
    pub remote: Option<Identity>,
    pub candidate_applied: bool,
    pub offer_answered: bool,
    pub answer_applied: bool,
    /// Failures of this tick. Already logged; the next tick retries against
    /// whatever is in the store then.
    pub errors: Vec<NegotiationError>,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        !self.candidate_applied && !self.offer_answered && !self.answer_applied
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

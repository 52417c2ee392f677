use huddle_core::utils::PENDING_PARTICIPANT_KEY;
use huddle_core::{AdmissionError, EntryCode};
use huddle_session::{GateState, ParticipantGate, SharedChannel};

use crate::integration::init_tracing;
use crate::utils::admission_fixture;

#[tokio::test]
async fn test_consumed_code_cannot_pass_again() {
    init_tracing();

    let (channel, controller) = admission_fixture();

    let mut first = ParticipantGate::new(controller.clone());
    first.enter_code("STU789").await.unwrap();
    first.enter_name("Kwame").await.unwrap();
    assert!(!controller.is_available(&EntryCode::from("STU789")).await.unwrap());

    // Even with the pending slot free again, the code stays spent
    channel.delete(PENDING_PARTICIPANT_KEY).await.unwrap();

    let mut second = ParticipantGate::new(controller.clone());
    assert_eq!(second.enter_code("STU789").await.err(), Some(AdmissionError::InvalidCode));
    assert_eq!(second.state(), &GateState::Rejected);

    // A gate that got past the code step before consumption is stopped at the name step
    let mut early = ParticipantGate::new(controller.clone());
    early.enter_code("CODE123").await.unwrap();
    let mut late = ParticipantGate::new(controller.clone());
    late.enter_code("CODE123").await.unwrap();

    early.enter_name("Efua").await.unwrap();
    channel.delete(PENDING_PARTICIPANT_KEY).await.unwrap();

    assert_eq!(late.enter_name("Yaw").await.err(), Some(AdmissionError::InvalidCode));
    assert_eq!(late.state(), &GateState::Rejected);
}

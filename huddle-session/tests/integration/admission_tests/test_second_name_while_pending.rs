use huddle_core::utils::PENDING_PARTICIPANT_KEY;
use huddle_core::{AdmissionError, EntryCode, Participant};
use huddle_session::{GateState, ParticipantGate, SharedChannelExt};

use crate::integration::init_tracing;
use crate::utils::admission_fixture;

#[tokio::test]
async fn test_second_name_while_pending() {
    init_tracing();

    let (channel, controller) = admission_fixture();

    let mut amara = ParticipantGate::new(controller.clone());
    amara.enter_code("STU456").await.unwrap();
    amara.enter_name("  Amara ").await.unwrap();

    let mut kofi = ParticipantGate::new(controller.clone());
    kofi.enter_code("CODE123").await.unwrap();
    assert_eq!(kofi.enter_name("Kofi").await.err(), Some(AdmissionError::PendingOccupied));

    // Kofi may try again later with the same, still unconsumed, code
    assert!(matches!(kofi.state(), GateState::AwaitingName { .. }));
    assert!(controller.is_available(&EntryCode::from("CODE123")).await.unwrap());

    let pending: Option<Participant> = channel.read_json(PENDING_PARTICIPANT_KEY).await.unwrap();
    assert_eq!(pending, Some(Participant::new(EntryCode::from("STU456"), "Amara")));

    controller.approve_pending().await.unwrap();
    assert!(matches!(
        kofi.enter_name("Kofi").await,
        Ok(GateState::Waiting { .. })
    ));
}

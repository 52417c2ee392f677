use huddle_core::utils::{
    APPROVED_PARTICIPANT_CODE_KEY, APPROVED_PARTICIPANT_DATA_KEY, PENDING_PARTICIPANT_KEY,
};
use huddle_core::{ApprovedParticipant, EntryCode, Participant, Role};
use huddle_session::{GateState, ParticipantGate, SharedChannel, SharedChannelExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::integration::init_tracing;
use crate::utils::admission_fixture;

#[tokio::test(start_paused = true)]
async fn test_approval_admits_within_one_interval() {
    init_tracing();

    let (channel, controller) = admission_fixture();

    let mut gate = ParticipantGate::new(controller.clone());
    gate.enter_code("STU456").await.unwrap();
    gate.enter_name("Amara").await.unwrap();

    let pending: Option<Participant> = channel.read_json(PENDING_PARTICIPANT_KEY).await.unwrap();
    assert_eq!(pending, Some(Participant::new(EntryCode::from("STU456"), "Amara")));
    assert!(!controller.is_available(&EntryCode::from("STU456")).await.unwrap());

    // Nothing approved yet: a single check leaves the gate waiting
    gate.poll_once().await.unwrap();
    assert!(matches!(gate.state(), GateState::Waiting { .. }));

    let started = Instant::now();
    let waiter = tokio::spawn(async move {
        let admitted = gate.wait_for_admission(CancellationToken::new()).await;
        (gate, admitted)
    });

    let approved = controller.approve_pending().await.unwrap();
    assert_eq!(approved.map(|p| p.name), Some("Amara".to_string()));

    assert_eq!(
        channel.read(APPROVED_PARTICIPANT_CODE_KEY).await.unwrap().as_deref(),
        Some("STU456")
    );
    let data: Option<ApprovedParticipant> =
        channel.read_json(APPROVED_PARTICIPANT_DATA_KEY).await.unwrap();
    assert_eq!(data.map(|d| d.name), Some("Amara".to_string()));
    assert!(!channel.contains(PENDING_PARTICIPANT_KEY));

    let (gate, admitted) = waiter.await.unwrap();
    assert!(started.elapsed() <= controller.poll_interval());

    let admitted = admitted.unwrap().expect("participant should be admitted");
    assert_eq!(admitted.role, Role::Participant);
    assert_eq!(admitted.identity.as_str(), "Amara");
    assert_eq!(gate.admitted(), Some(&admitted));
}

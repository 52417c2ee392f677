use huddle_core::utils::{APPROVED_PARTICIPANT_CODE_KEY, PENDING_PARTICIPANT_KEY};
use huddle_session::{GateState, ParticipantGate};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::integration::init_tracing;
use crate::utils::{POLL_MS, admission_fixture};

#[tokio::test(start_paused = true)]
async fn test_declined_participant_keeps_waiting() {
    init_tracing();

    let (channel, controller) = admission_fixture();

    let mut gate = ParticipantGate::new(controller.clone());
    gate.enter_code("CODE123").await.unwrap();
    gate.enter_name("Kofi").await.unwrap();

    let declined = controller.decline_pending().await.unwrap();
    assert_eq!(declined.map(|p| p.name), Some("Kofi".to_string()));
    assert!(!channel.contains(PENDING_PARTICIPANT_KEY));
    assert!(!channel.contains(APPROVED_PARTICIPANT_CODE_KEY));

    // No decline notice reaches the participant; only cancellation ends the wait
    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(POLL_MS * 5)).await;
        stop.cancel();
    });

    let admitted = gate.wait_for_admission(cancel).await.unwrap();
    assert!(admitted.is_none());
    assert!(matches!(gate.state(), GateState::Waiting { .. }));
}

use huddle_core::{IceCandidate, Role, SdpType};
use huddle_session::{GateState, MemoryChannel, PeerEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::integration::init_tracing;
use crate::utils::{MockPeerFactory, POLL_MS, coordinator};

#[tokio::test(start_paused = true)]
async fn test_host_and_participant_negotiate() {
    init_tracing();

    let channel = MemoryChannel::new();
    let factory = Arc::new(MockPeerFactory::new());
    let mut host = coordinator(&channel, factory.clone());
    let mut guest = coordinator(&channel, factory.clone());

    // Host code goes straight in
    let mut host_gate = host.gate();
    let admitted = match host_gate.enter_code("MARVINMASTER").await {
        Ok(GateState::Admitted(admitted)) => admitted.clone(),
        other => panic!("host should be admitted, got {other:?}"),
    };
    assert_eq!(admitted.role, Role::Host);
    host.enter(&admitted).await.unwrap();
    assert!(channel.contains("Marvin-offer"));

    let mut notices = host.pending_notices();

    let mut gate = guest.gate();
    gate.enter_code("STU456").await.unwrap();
    gate.enter_name("Amara").await.unwrap();

    tokio::time::timeout(
        Duration::from_millis(POLL_MS * 3),
        notices.wait_for(|p| p.is_some()),
    )
    .await
    .expect("host should see the waiting participant")
    .unwrap();

    let approved = host.approve_pending().await.unwrap();
    assert_eq!(approved.map(|p| p.name), Some("Amara".to_string()));
    assert!(host.pending_notices().borrow().is_none());

    let admitted = gate
        .wait_for_admission(CancellationToken::new())
        .await
        .unwrap()
        .unwrap();
    guest.enter(&admitted).await.unwrap();

    // Offer read, answered, answer applied: a couple of ticks per side
    tokio::time::sleep(Duration::from_millis(POLL_MS * 3)).await;

    let host_peer = factory.peer_for("Marvin").await.unwrap();
    let guest_peer = factory.peer_for("Amara").await.unwrap();

    assert_eq!(guest_peer.remote().await, host_peer.local().await);
    assert_eq!(host_peer.remote().await, guest_peer.local().await);
    assert_eq!(
        host_peer.remote().await.map(|d| d.sdp_type),
        Some(SdpType::Answer)
    );
    assert!(!channel.contains("Amara-answer"));
    assert!(channel.contains("Marvin-offer"));
    assert_eq!(host_peer.remote_sets().await, 1);
    assert_eq!(guest_peer.remote_sets().await, 1);

    // Trickled candidate crosses over on the next tick
    host_peer
        .emit(PeerEvent::CandidateGenerated(IceCandidate {
            candidate: "candidate:1 1 udp 2122260223 10.0.0.1 50000 typ host".into(),
            sdp_mid: Some("0".into()),
            sdp_m_line_index: Some(0),
            username_fragment: None,
        }))
        .await;
    tokio::time::sleep(Duration::from_millis(POLL_MS * 2)).await;
    assert_eq!(guest_peer.candidates().await.len(), 1);
    assert!(!channel.contains("Marvin-candidate"));

    host.leave().await;
    guest.leave().await;
    assert!(host_peer.is_closed().await);
    assert!(guest_peer.is_closed().await);
    assert!(!host.is_active());
}

use huddle_core::HuddleConfig;
use huddle_session::{MemoryChannel, RtcPeerFactory, TransportConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::integration::init_tracing;
use crate::utils::{coordinator_with, wait_until};

/// Timeout for both sides to hold a remote description (ms).
const NEGOTIATION_TIMEOUT_MS: u64 = 10000;

#[tokio::test]
async fn test_rtc_peers_negotiate_over_store() {
    init_tracing();

    let config = HuddleConfig {
        poll_interval_ms: 100,
        ..HuddleConfig::default()
    };
    let channel = MemoryChannel::new();
    let peers = Arc::new(RtcPeerFactory::new(TransportConfig::local_only()));

    let mut host = coordinator_with(config.clone(), &channel, peers.clone());
    let mut guest = coordinator_with(config, &channel, peers);

    let host_engine = host.start_host().await.expect("host session should start");
    assert!(host_engine.offer_published());

    let mut gate = guest.gate();
    gate.enter_code("STU789").await.unwrap();
    gate.enter_name("Amara").await.unwrap();
    host.approve_pending().await.unwrap();

    let admitted = gate
        .wait_for_admission(CancellationToken::new())
        .await
        .unwrap()
        .expect("approval should be observed");
    let guest_engine = guest.enter(&admitted).await.expect("guest session should start");

    let negotiated = wait_until(NEGOTIATION_TIMEOUT_MS, || async {
        host_engine.has_remote_description().await && guest_engine.has_remote_description().await
    })
    .await;
    assert!(negotiated, "offer/answer should cross the store");
    assert!(
        wait_until(1000, || async { !channel.contains("Amara-answer") }).await,
        "answer is consumed"
    );

    guest.leave().await;
    host.leave().await;
    assert!(host_engine.is_closed());
    assert!(guest_engine.is_closed());
}

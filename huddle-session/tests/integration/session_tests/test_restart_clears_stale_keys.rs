use huddle_core::{Identity, SessionDescription, SignalMessage};
use huddle_session::{MemoryChannel, SharedChannel};
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{MockPeerFactory, coordinator, put_signal};

#[tokio::test(start_paused = true)]
async fn test_restart_clears_stale_keys() {
    init_tracing();

    let channel = MemoryChannel::new();
    let factory = Arc::new(MockPeerFactory::new());
    let mut guest = coordinator(&channel, factory.clone());

    // Left behind by an earlier session of the same identity
    put_signal(
        &channel,
        "Amara",
        SignalMessage::Answer(SessionDescription::answer("v=0 old answer")),
    )
    .await;
    channel.write("Amara-candidate", "{}".into()).await.unwrap();
    channel.write("Amara-offer", "{}".into()).await.unwrap();
    // Someone else's keys are not ours to clear
    put_signal(
        &channel,
        "Marvin",
        SignalMessage::Offer(SessionDescription::offer("v=0 offer Marvin")),
    )
    .await;

    let first = guest
        .start_participant(Identity::from("Amara"))
        .await
        .unwrap();
    for key in ["Amara-offer", "Amara-answer", "Amara-candidate"] {
        assert!(!channel.contains(key), "{key} should be cleared");
    }
    assert!(channel.contains("Marvin-offer"));

    // Re-entering tears the old session down first
    let old_peer = factory.peer_for("Amara").await.unwrap();
    let second = guest
        .start_participant(Identity::from("Amara"))
        .await
        .unwrap();

    assert_eq!(factory.created().await, 2);
    assert!(first.is_closed());
    assert!(old_peer.is_closed().await);
    assert!(!second.is_closed());
    assert_ne!(first.session_id(), second.session_id());

    guest.leave().await;
}

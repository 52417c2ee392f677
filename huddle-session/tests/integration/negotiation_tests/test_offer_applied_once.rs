use huddle_core::{SessionDescription, SignalMessage};
use huddle_session::SyntheticDevices;

use crate::integration::init_tracing;
use crate::utils::{participant_fixture, put_signal};

#[tokio::test]
async fn test_offer_applied_once() {
    init_tracing();

    let fx = participant_fixture(SyntheticDevices::new());
    let offer = SessionDescription::offer("v=0 offer Marvin");
    put_signal(&fx.channel, "Marvin", SignalMessage::Offer(offer.clone())).await;

    let first = fx.engine.negotiation_tick().await;
    assert!(first.is_clean(), "{:?}", first.errors);
    assert!(first.offer_answered);
    assert_eq!(fx.peer.remote().await, Some(offer.clone()));
    assert!(fx.channel.contains("Amara-answer"));

    // The receiver leaves the offer in place
    assert!(fx.channel.contains("Marvin-offer"));

    let second = fx.engine.negotiation_tick().await;
    assert!(second.is_idle());
    assert_eq!(fx.peer.remote_sets().await, 1);
    assert_eq!(fx.peer.remote().await, Some(offer));
}

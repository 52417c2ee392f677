use huddle_core::utils::APPROVED_PARTICIPANT_DATA_KEY;
use huddle_core::{ApprovedParticipant, Role, SdpType, SessionDescription, SignalMessage};
use huddle_session::{RemotePeer, SharedChannel, SharedChannelExt, SyntheticDevices};

use crate::integration::init_tracing;
use crate::utils::{engine_fixture, put_signal};

#[tokio::test]
async fn test_answer_applied_once_and_consumed() {
    init_tracing();

    let fx = engine_fixture(Role::Host, "Marvin", RemotePeer::Admitted, SyntheticDevices::new());
    fx.channel
        .write_json(
            APPROVED_PARTICIPANT_DATA_KEY,
            &ApprovedParticipant {
                name: "Amara".into(),
            },
        )
        .await
        .unwrap();

    assert!(fx.engine.create_offer_and_publish().await.unwrap());
    assert!(!fx.engine.create_offer_and_publish().await.unwrap(), "once per session");
    assert!(fx.engine.offer_published());

    let raw = fx.channel.read("Marvin-offer").await.unwrap().unwrap();
    assert!(raw.contains(r#""type":"offer""#));
    assert_eq!(
        fx.peer.local().await.map(|d| d.sdp_type),
        Some(SdpType::Offer)
    );

    let answer = SessionDescription::answer("v=0 answer Amara");
    put_signal(&fx.channel, "Amara", SignalMessage::Answer(answer.clone())).await;

    let report = fx.engine.negotiation_tick().await;
    assert!(report.answer_applied);
    assert!(!fx.channel.contains("Amara-answer"));
    assert_eq!(fx.peer.remote().await, Some(answer));

    // A stale re-publish is not applied over the existing remote description
    put_signal(
        &fx.channel,
        "Amara",
        SignalMessage::Answer(SessionDescription::answer("v=0 stale")),
    )
    .await;
    let report = fx.engine.negotiation_tick().await;
    assert!(!report.answer_applied);
    assert_eq!(fx.peer.remote_sets().await, 1);
}

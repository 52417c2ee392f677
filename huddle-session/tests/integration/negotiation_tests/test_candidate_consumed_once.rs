use huddle_core::{IceCandidate, SessionDescription, SignalMessage};
use huddle_session::SyntheticDevices;

use crate::integration::init_tracing;
use crate::utils::{participant_fixture, put_signal};

fn candidate(port: u16) -> IceCandidate {
    IceCandidate {
        candidate: format!("candidate:1 1 udp 2122260223 10.0.0.2 {port} typ host"),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
        username_fragment: None,
    }
}

#[tokio::test]
async fn test_candidate_consumed_once() {
    init_tracing();

    let fx = participant_fixture(SyntheticDevices::new());
    put_signal(
        &fx.channel,
        "Marvin",
        SignalMessage::Offer(SessionDescription::offer("v=0 offer Marvin")),
    )
    .await;
    fx.engine.negotiation_tick().await;

    put_signal(&fx.channel, "Marvin", SignalMessage::IceCandidate(candidate(50000))).await;

    let report = fx.engine.negotiation_tick().await;
    assert!(report.candidate_applied);
    assert!(!fx.channel.contains("Marvin-candidate"));

    let report = fx.engine.negotiation_tick().await;
    assert!(!report.candidate_applied);
    assert_eq!(fx.peer.candidates().await, vec![candidate(50000)]);

    // One candidate in flight: a second write before the next tick replaces the first
    put_signal(&fx.channel, "Marvin", SignalMessage::IceCandidate(candidate(50001))).await;
    put_signal(&fx.channel, "Marvin", SignalMessage::IceCandidate(candidate(50002))).await;
    fx.engine.negotiation_tick().await;
    fx.engine.negotiation_tick().await;
    assert_eq!(
        fx.peer.candidates().await,
        vec![candidate(50000), candidate(50002)]
    );
}

use huddle_core::{MediaConstraints, ShareState, TrackKind};
use huddle_session::SyntheticDevices;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::participant_fixture;

#[tokio::test]
async fn test_screen_share_reverts_when_ended() {
    init_tracing();

    let fx = participant_fixture(SyntheticDevices::new());
    let camera = fx
        .engine
        .acquire_media(MediaConstraints::AUDIO_VIDEO)
        .await
        .unwrap();
    let camera_video = camera.video_track().unwrap().id.clone();

    let state = fx.engine.toggle_screen_share().await.unwrap();
    assert_eq!(state, ShareState::ScreenSharing);

    let screen_video = fx.peer.outbound(TrackKind::Video).await.unwrap();
    assert_ne!(screen_video, camera_video);
    assert_eq!(fx.engine.attached_track(TrackKind::Video).await, Some(screen_video));

    // The user stops sharing from the OS
    let mut share = fx.engine.subscribe_share_state();
    fx.devices.revoke_screen_share();

    tokio::time::timeout(
        Duration::from_secs(2),
        share.wait_for(|s| *s == ShareState::CameraSharing),
    )
    .await
    .expect("engine should revert to the camera")
    .unwrap();

    assert_eq!(fx.engine.share_state(), ShareState::CameraSharing);
    assert_eq!(fx.peer.outbound(TrackKind::Video).await, Some(camera_video.clone()));
    assert_eq!(fx.engine.attached_track(TrackKind::Video).await, Some(camera_video));

    // The camera stream was reused, not captured again
    assert_eq!(fx.devices.requests().len(), 1);

    // Manual toggle both ways
    assert_eq!(
        fx.engine.toggle_screen_share().await.unwrap(),
        ShareState::ScreenSharing
    );
    assert_eq!(
        fx.engine.toggle_screen_share().await.unwrap(),
        ShareState::CameraSharing
    );
    assert_eq!(fx.peer.replaced().await.len(), 4);
}

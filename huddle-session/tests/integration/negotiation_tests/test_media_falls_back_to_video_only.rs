use huddle_core::{MediaConstraints, MediaError, TrackKind};
use huddle_session::SyntheticDevices;

use crate::integration::init_tracing;
use crate::utils::participant_fixture;

#[tokio::test]
async fn test_media_falls_back_to_video_only() {
    init_tracing();

    let fx = participant_fixture(SyntheticDevices::new().without_microphone());

    let stream = fx
        .engine
        .acquire_media(MediaConstraints::AUDIO_VIDEO)
        .await
        .expect("video-only fallback should succeed");
    assert!(stream.audio_track().is_none());
    assert_eq!(
        fx.devices.requests(),
        vec![MediaConstraints::AUDIO_VIDEO, MediaConstraints::VIDEO_ONLY]
    );

    let added = fx.peer.added().await;
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].kind(), TrackKind::Video);
    assert!(fx.engine.last_media_error().await.is_none());

    // Attaching the same stream again changes nothing
    fx.engine.attach_local_tracks(&stream).await.unwrap();
    assert_eq!(fx.peer.added().await.len(), 1);
    assert!(fx.peer.replaced().await.is_empty());

    // No camera at all: the fallback fails too and the error surfaces
    let fx = participant_fixture(SyntheticDevices::new().without_camera());
    let err = fx
        .engine
        .acquire_media(MediaConstraints::AUDIO_VIDEO)
        .await
        .unwrap_err();
    assert_eq!(err, MediaError::DeviceNotFound);
    assert_eq!(fx.devices.requests().len(), 2);
    assert_eq!(fx.engine.last_media_error().await, Some(MediaError::DeviceNotFound));
}

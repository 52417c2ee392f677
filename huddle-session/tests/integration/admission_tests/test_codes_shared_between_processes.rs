use huddle_core::{AdmissionError, HuddleConfig};
use huddle_session::{AdmissionController, FileChannel, GateState, ParticipantGate};
use std::sync::Arc;

use crate::integration::init_tracing;

fn controller_on(dir: &std::path::Path) -> Arc<AdmissionController> {
    Arc::new(AdmissionController::new(
        &HuddleConfig::default(),
        Arc::new(FileChannel::new(dir)),
    ))
}

#[tokio::test]
async fn test_codes_shared_between_processes() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let host = controller_on(dir.path());
    let amara_side = controller_on(dir.path());
    let kofi_side = controller_on(dir.path());

    // The host identity cannot be taken as a display name
    let mut amara = ParticipantGate::new(amara_side.clone());
    amara.enter_code("STU456").await.unwrap();
    assert_eq!(amara.enter_name("Marvin").await.err(), Some(AdmissionError::ReservedName));
    assert!(matches!(amara.state(), GateState::AwaitingName { .. }));

    amara.enter_name("Amara").await.unwrap();
    assert_eq!(
        host.approve_pending().await.unwrap().map(|p| p.name),
        Some("Amara".to_string())
    );

    // A fresh controller on the same store sees the code as spent
    let mut kofi = ParticipantGate::new(kofi_side.clone());
    assert_eq!(kofi.enter_code("STU456").await.err(), Some(AdmissionError::InvalidCode));
    assert_eq!(kofi.state(), &GateState::Rejected);

    kofi.reset();
    kofi.enter_code(" STU789 ").await.unwrap();
    assert!(matches!(
        kofi.enter_name("Kofi").await,
        Ok(GateState::Waiting { .. })
    ));
}

use huddle_core::AdmissionError;
use huddle_session::{GateState, ParticipantGate};

use crate::integration::init_tracing;
use crate::utils::admission_fixture;

#[tokio::test]
async fn test_unknown_codes_rejected() {
    init_tracing();

    let (channel, controller) = admission_fixture();

    for code in ["", "nope", "marvinmaster", "STU4567", "CODE 123", "stu456"] {
        let mut gate = ParticipantGate::new(controller.clone());
        assert_eq!(gate.enter_code(code).await.err(), Some(AdmissionError::InvalidCode), "{code:?}");
        assert_eq!(gate.state(), &GateState::Rejected);

        // Rejected is a dead end until the gate is reset
        assert_eq!(gate.enter_code("STU456").await.err(), Some(AdmissionError::WrongStep));
        gate.reset();
        assert!(matches!(
            gate.enter_code("STU456").await,
            Ok(GateState::AwaitingName { .. })
        ));
    }

    assert!(channel.is_empty(), "rejections must not touch the store");
}

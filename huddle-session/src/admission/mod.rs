mod admission_controller;
mod participant_gate;
mod waiting;

pub use admission_controller::*;
pub use participant_gate::*;
pub use waiting::*;

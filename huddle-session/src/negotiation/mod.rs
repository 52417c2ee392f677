mod negotiation_engine;
mod tick_report;

pub use negotiation_engine::*;
pub use tick_report::*;

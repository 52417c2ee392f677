pub use huddle_core::{HuddleConfig, Identity, Role};

pub mod model {
    pub use huddle_core::model::*;
}

pub mod error {
    pub use huddle_core::error::*;
}

pub mod utils {
    pub use huddle_core::utils::*;
}

#[cfg(feature = "session")]
pub mod session {
    pub use huddle_session::*;
}

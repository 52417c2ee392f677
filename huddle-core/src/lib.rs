pub mod config;
pub mod error;
pub mod model;
pub mod utils;

pub use config::HuddleConfig;
pub use error::{
    AdmissionError, ChannelError, ConfigError, MediaError, NegotiationError, SessionError,
};
pub use model::*;

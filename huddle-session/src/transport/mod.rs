mod peer_connection;
mod peer_event;
mod rtc_peer;
mod transport_config;

pub use peer_connection::*;
pub use peer_event::*;
pub use rtc_peer::*;
pub use transport_config::*;

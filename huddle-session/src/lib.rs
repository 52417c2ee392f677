mod admission;
mod channel;
mod coordinator;
mod media;
mod negotiation;
mod transport;

pub use admission::*;
pub use channel::*;
pub use coordinator::*;
pub use media::*;
pub use negotiation::*;
pub use transport::*;

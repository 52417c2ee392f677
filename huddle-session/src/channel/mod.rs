mod file_channel;
mod memory_channel;
mod poller;
mod shared_channel;

pub use file_channel::*;
pub use memory_channel::*;
pub use poller::*;
pub use shared_channel::*;

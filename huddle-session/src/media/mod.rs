mod local_stream;
mod media_devices;
mod remote_display;
mod synthetic_devices;

pub use local_stream::*;
pub use media_devices::*;
pub use remote_display::*;
pub use synthetic_devices::*;

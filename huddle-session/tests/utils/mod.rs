
pub use fixtures::*;
pub use mock_peer::*;

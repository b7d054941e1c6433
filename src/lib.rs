pub mod core {
	pub mod input;
	pub mod protocol;
	pub mod renderer;
	pub mod session;
	pub mod terminal;
}

pub mod client {
	pub mod websocket_client;
}

pub mod cli;

// Re-export for convenience
pub use crate::client::websocket_client::SessionClient;
pub use crate::core::protocol::{Action, TableSnapshot};
pub use crate::core::session::{ConnectionState, Session, SessionError};

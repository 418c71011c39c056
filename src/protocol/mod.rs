//! Wire protocol for the remote backend adapter.
//!
//! JSON frames over WebSocket, tagged by `type`.

mod messages;

pub use messages::{ClientFrame, ServerFrame};

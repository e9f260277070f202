pub mod messages;
pub mod ws;

pub use messages::{ServerEvent, StreamConfig};
pub use ws::{TransportEvent, WsTransport};

//! Network layer - chat turns, proxy calls and file-preview fetches
//!
//! The Network actor receives commands from the App layer and sends back responses.

pub mod actor;
pub mod chat;
pub mod client;
pub mod preview;
pub mod proxy;

pub use actor::NetworkActor;
pub use chat::ChatOutcome;
pub use preview::FilePreview;
pub use proxy::{HttpProxy, Proxy, ProxyEnvelope, ProxyRequest};

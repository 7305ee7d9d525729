//! Network messages - communication between App and Network layers

use crate::cancel::CancelToken;
use crate::error::{ConsoleError, PreviewError};
use crate::network::chat::ChatOutcome;
use crate::network::preview::FilePreview;
use crate::network::proxy::{ProxyEnvelope, ProxyRequest};

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Ask the chat backend for an assistant reply
    Chat {
        id: u64,
        message: String,
        cancel: CancelToken,
    },
    /// Forward a console request through the proxy
    Proxy { id: u64, request: ProxyRequest },
    /// Load a linked document for preview
    FetchPreview { id: u64, url: String },
    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    Chat {
        id: u64,
        outcome: ChatOutcome,
    },
    ProxyReplied {
        id: u64,
        outcome: Result<ProxyEnvelope, ConsoleError>,
        elapsed_ms: u64,
    },
    PreviewLoaded {
        id: u64,
        preview: FilePreview,
    },
    PreviewFailed {
        id: u64,
        error: PreviewError,
    },
}

impl NetworkResponse {
    /// Get the request ID from the response
    pub fn id(&self) -> u64 {
        match self {
            NetworkResponse::Chat { id, .. } => *id,
            NetworkResponse::ProxyReplied { id, .. } => *id,
            NetworkResponse::PreviewLoaded { id, .. } => *id,
            NetworkResponse::PreviewFailed { id, .. } => *id,
        }
    }
}

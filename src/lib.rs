//! # apiscribe
//!
//! A terminal chat companion that turns AI-written API instructions into
//! runnable requests.
//!
//! ## Features
//! - Chat with an assistant backend, replies revealed token by token
//! - Heuristic extraction of method, URL, params, headers and body from Markdown
//! - Manual / Automatic disclosure for answers that describe a runnable call
//! - Execution console sending through a same-origin proxy
//! - GitHub file preview with per-section request synthesis
//! - cURL export, JSON syntax highlighting
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine)
//! - Network Layer (Tokio runtime)

pub mod app;
pub mod cancel;
pub mod config;
pub mod constants;
pub mod curl;
pub mod error;
pub mod extract;
pub mod json;
pub mod messages;
pub mod models;
pub mod network;
pub mod reveal;
pub mod storage;
pub mod ui;

// Re-export commonly used types
pub use app::{AppActor, AppState, Disclosure, ExecutionConsole};
pub use config::Config;
pub use curl::to_curl;
pub use error::{ConsoleError, PreviewError};
pub use extract::{is_executable, synthesize, synthesize_for_section, synthesize_scoped};
pub use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
pub use models::{ExecutionResult, HttpMethod, KeyValue, RequestDraft};
pub use network::NetworkActor;
pub use reveal::reveal;

//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Default backend serving the chat, proxy and file-preview endpoints
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Path of the chat endpoint (assistant text source)
pub const DEFAULT_CHAT_PATH: &str = "/api/chat/message";

/// Path of the same-origin proxy that performs outbound calls
pub const DEFAULT_PROXY_PATH: &str = "/api/proxy";

/// Path of the linked-document preview endpoint
pub const DEFAULT_FILE_PREVIEW_PATH: &str = "/api/github/file";

/// Default timeout for every outbound call
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the configured base URL
pub const BASE_URL_ENV: &str = "APISCRIBE_BASE_URL";

/// Directory (under the home directory) holding config, transcript and logs
pub const CONFIG_DIR_NAME: &str = ".apiscribe";

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "apiscribe.log";

/// Shown when the chat backend answers with a non-success status
pub const BACKEND_UNAVAILABLE_TEXT: &str = "Backend service unavailable. Please try again later.";

/// Shown (flagged as an error) when the chat backend cannot be reached at all
pub const BACKEND_UNREACHABLE_TEXT: &str =
    "Unable to connect to backend service. Please check your connection and try again.";

/// Used when a successful chat reply carries no text field
pub const EMPTY_REPLY_TEXT: &str = "No data available from backend.";

/// Canned reply for greetings, answered without a network round-trip
pub const GREETING_TEXT: &str = "# Hello\n\n---\n\nI'm here to help with any questions or topics you'd like to discuss. How can I assist you today?";

/// Application name
pub const APP_NAME: &str = "apiscribe";

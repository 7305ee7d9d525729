use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a chat message. Disclosure state and cached prerequisites are keyed by it.
pub type MessageId = Uuid;

/// HTTP Method enum
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
    HEAD,
    OPTIONS,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::GET,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::PATCH,
        HttpMethod::DELETE,
        HttpMethod::HEAD,
        HttpMethod::OPTIONS,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
        }
    }

    /// Case-insensitive lookup of one of the seven verbs
    pub fn parse(s: &str) -> Option<HttpMethod> {
        let upper = s.trim().to_ascii_uppercase();
        HttpMethod::ALL.into_iter().find(|m| m.as_str() == upper)
    }

    pub fn next(&self) -> HttpMethod {
        match self {
            HttpMethod::GET => HttpMethod::POST,
            HttpMethod::POST => HttpMethod::PUT,
            HttpMethod::PUT => HttpMethod::PATCH,
            HttpMethod::PATCH => HttpMethod::DELETE,
            HttpMethod::DELETE => HttpMethod::HEAD,
            HttpMethod::HEAD => HttpMethod::OPTIONS,
            HttpMethod::OPTIONS => HttpMethod::GET,
        }
    }

    /// Mutating verbs: the only ones that carry a request body
    pub fn has_body(&self) -> bool {
        matches!(
            self,
            HttpMethod::POST | HttpMethod::PUT | HttpMethod::PATCH | HttpMethod::DELETE
        )
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One editable key/value row (query parameter or header)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
    pub enabled: bool,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        KeyValue {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// The placeholder row editors always keep around
    pub fn empty() -> Self {
        KeyValue::new("", "")
    }

    /// Enabled and carrying a non-blank key
    pub fn is_active(&self) -> bool {
        self.enabled && !self.key.trim().is_empty()
    }
}

/// Structured request recovered from an assistant message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDraft {
    pub method: HttpMethod,
    pub url: String,
    /// Never empty: at least one (possibly blank) row
    pub headers: Vec<KeyValue>,
    /// Never empty: at least one (possibly blank) row
    pub query_params: Vec<KeyValue>,
    pub body: String,
    pub prerequisites: String,
}

impl Default for RequestDraft {
    fn default() -> Self {
        RequestDraft {
            method: HttpMethod::GET,
            url: String::new(),
            headers: vec![KeyValue::empty()],
            query_params: vec![KeyValue::empty()],
            body: String::new(),
            prerequisites: String::new(),
        }
    }
}

/// A response header as displayed by the console
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseHeader {
    pub key: String,
    pub value: String,
}

/// Outcome of one console send, replaced wholesale on the next one
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    pub status_line: String,
    pub elapsed_ms: u64,
    pub size_chars: usize,
    pub ok: bool,
    pub headers: Vec<ResponseHeader>,
    pub body: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the chat transcript
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_error: bool,
    /// Placeholder shown while the assistant reply is in flight
    #[serde(skip)]
    pub is_loading: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            is_error: false,
            is_loading: false,
        }
    }

    pub fn assistant_placeholder() -> Self {
        ChatMessage {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: String::new(),
            timestamp: Utc::now(),
            is_error: false,
            is_loading: true,
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!(HttpMethod::parse("post"), Some(HttpMethod::POST));
        assert_eq!(HttpMethod::parse(" Options "), Some(HttpMethod::OPTIONS));
        assert_eq!(HttpMethod::parse("TRACE"), None);
    }

    #[test]
    fn test_method_cycle_covers_all_verbs() {
        let mut m = HttpMethod::GET;
        for _ in 0..HttpMethod::ALL.len() {
            m = m.next();
        }
        assert_eq!(m, HttpMethod::GET);
    }

    #[test]
    fn test_draft_defaults_keep_one_row() {
        let draft = RequestDraft::default();
        assert_eq!(draft.method, HttpMethod::GET);
        assert_eq!(draft.headers.len(), 1);
        assert_eq!(draft.query_params.len(), 1);
        assert!(draft.body.is_empty());
    }
}

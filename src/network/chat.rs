//! Chat transport - the assistant text source

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::constants::EMPTY_REPLY_TEXT;
use crate::network::client::describe_error;

static GREETING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:hi|hello|hey|howdy|hi there|good (?:morning|afternoon|evening))\b")
        .expect("greeting regex")
});

/// How one chat turn ended on the network side
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Raw assistant text
    Reply(String),
    /// The backend answered with a non-success status
    Unavailable(u16),
    /// The backend could not be reached
    Unreachable(String),
    /// The user stopped the turn before an answer arrived
    Aborted,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatPayload<'a> {
    message: &'a str,
    session_id: &'a str,
    include_context: bool,
    fast_mode: bool,
    full_content: bool,
}

/// Greetings are answered locally without a round-trip
pub fn is_greeting(input: &str) -> bool {
    GREETING_RE.is_match(input.trim())
}

/// `tui-session-<unix millis>`
pub fn new_session_id() -> String {
    format!("tui-session-{}", chrono::Utc::now().timestamp_millis())
}

/// Pick the assistant text out of a chat response body
pub fn reply_text(body: &str) -> String {
    let Ok(data) = serde_json::from_str::<Value>(body) else {
        let raw = body.trim();
        return if raw.is_empty() {
            EMPTY_REPLY_TEXT.to_string()
        } else {
            raw.to_string()
        };
    };

    ["rawData", "response", "message"]
        .iter()
        .find_map(|key| data.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .unwrap_or(EMPTY_REPLY_TEXT)
        .to_string()
}

/// POST one user message to the chat endpoint
pub async fn send_chat(
    client: &reqwest::Client,
    endpoint: &str,
    message: &str,
    timeout: Duration,
) -> ChatOutcome {
    let session_id = new_session_id();
    let payload = ChatPayload {
        message,
        session_id: &session_id,
        include_context: true,
        fast_mode: true,
        full_content: true,
    };

    let resp = match client.post(endpoint).json(&payload).send().await {
        Ok(resp) => resp,
        Err(e) => return ChatOutcome::Unreachable(describe_error(&e, timeout)),
    };

    let status = resp.status();
    if !status.is_success() {
        return ChatOutcome::Unavailable(status.as_u16());
    }

    match resp.text().await {
        Ok(body) => ChatOutcome::Reply(reply_text(&body)),
        Err(e) => ChatOutcome::Unreachable(format!("Error reading body: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greetings() {
        assert!(is_greeting("hi"));
        assert!(is_greeting("  Good Morning team"));
        assert!(is_greeting("Hey, how do I create a widget?"));
        assert!(!is_greeting("history of the API"));
        assert!(!is_greeting("how do I say hi"));
    }

    #[test]
    fn test_reply_text_field_order() {
        assert_eq!(reply_text(r#"{"rawData":"raw","response":"resp"}"#), "raw");
        assert_eq!(reply_text(r#"{"rawData":"","response":"resp"}"#), "resp");
        assert_eq!(reply_text(r#"{"message":"msg"}"#), "msg");
        assert_eq!(reply_text(r#"{"sourceFiles":[]}"#), EMPTY_REPLY_TEXT);
    }

    #[test]
    fn test_reply_text_non_json() {
        assert_eq!(reply_text("plain answer\n"), "plain answer");
        assert_eq!(reply_text("  "), EMPTY_REPLY_TEXT);
    }

    #[test]
    fn test_session_id_prefix() {
        assert!(new_session_id().starts_with("tui-session-"));
    }

    #[test]
    fn test_payload_is_camel_case() {
        let payload = ChatPayload {
            message: "m",
            session_id: "s",
            include_context: true,
            fast_mode: true,
            full_content: true,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["sessionId"], "s");
        assert_eq!(json["includeContext"], true);
        assert_eq!(json["fullContent"], true);
    }
}

//! Execution console - an editable request seeded from a `RequestDraft`
//!
//! The console owns copies of every field, so edits never touch the message
//! the draft came from. Sends go through the proxy collaborator; a console has
//! at most one send outstanding.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::curl;
use crate::error::ConsoleError;
use crate::json::{compact_or_raw, pretty_or_raw, try_parse_json};
use crate::models::{ExecutionResult, HttpMethod, KeyValue, RequestDraft};
use crate::network::proxy::{interpret, Proxy, ProxyEnvelope, ProxyRequest};

const EMPTY_RESPONSE_TEXT: &str = "[empty response]";
const APIKEY_PLACEHOLDER: &str = "<your-apikey-value>";

pub const HOSTNAME_WARNING: &str = "Replace placeholder hostname";
pub const APIKEY_WARNING: &str = "Replace API key placeholder";

/// Which row list an edit applies to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
    Param,
    Header,
}

#[derive(Clone, Debug)]
pub struct ExecutionConsole {
    pub method: HttpMethod,
    pub url: String,
    pub params: Vec<KeyValue>,
    pub headers: Vec<KeyValue>,
    pub body: String,
    pub auto_format_json: bool,
    pub result: Option<ExecutionResult>,
    pub error: Option<String>,
    pub curl_export: Option<String>,
    pending: Option<u64>,
}

impl ExecutionConsole {
    pub fn from_draft(draft: &RequestDraft, auto_format_json: bool) -> Self {
        ExecutionConsole {
            method: draft.method,
            url: draft.url.clone(),
            params: non_empty_rows(&draft.query_params),
            headers: non_empty_rows(&draft.headers),
            body: draft.body.clone(),
            auto_format_json,
            result: None,
            error: None,
            curl_export: None,
            pending: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_id(&self) -> Option<u64> {
        self.pending
    }

    /// The URL with every enabled, non-blank query row appended
    pub fn build_final_url(&self) -> String {
        let active: Vec<&KeyValue> = self.params.iter().filter(|p| p.is_active()).collect();
        if active.is_empty() {
            return self.url.trim().to_string();
        }

        let mut query = url::form_urlencoded::Serializer::new(String::new());
        for param in active {
            query.append_pair(param.key.trim(), &param.value);
        }

        let trimmed = self.url.trim();
        let base = trimmed
            .strip_suffix(['?', '&'])
            .unwrap_or(trimmed);
        let joiner = if base.contains('?') { '&' } else { '?' };
        format!("{}{}{}", base, joiner, query.finish())
    }

    /// The request object this console would hand to the proxy right now
    pub fn outgoing(&self) -> ProxyRequest {
        let mut headers: BTreeMap<String, String> = self
            .headers
            .iter()
            .filter(|h| h.is_active())
            .map(|h| (h.key.trim().to_string(), h.value.clone()))
            .collect();

        let mut body = String::new();
        if self.method.has_body() && !self.body.is_empty() {
            body = match try_parse_json(&self.body) {
                Ok(_) => {
                    let has_content_type = headers
                        .keys()
                        .any(|k| k.eq_ignore_ascii_case("content-type"));
                    if !has_content_type {
                        headers.insert("Content-Type".to_string(), "application/json".to_string());
                    }
                    compact_or_raw(&self.body)
                }
                Err(raw) => raw.to_string(),
            };
        }

        ProxyRequest {
            method: self.method.as_str().to_string(),
            url: self.build_final_url(),
            headers,
            body,
        }
    }

    /// Validate and mark request `id` as outstanding.
    ///
    /// `Busy` leaves the console untouched; validation failures land in `error`.
    pub fn prepare(&mut self, id: u64) -> Result<ProxyRequest, ConsoleError> {
        if self.is_busy() {
            return Err(ConsoleError::Busy);
        }

        self.error = None;
        self.result = None;

        let request = self.outgoing();
        if request.url.is_empty() {
            return Err(self.fail(ConsoleError::UrlRequired));
        }
        if url::Url::parse(&request.url).is_err() {
            return Err(self.fail(ConsoleError::InvalidUrl(request.url)));
        }

        tracing::info!(id, method = %request.method, url = %request.url, "Console send");
        self.pending = Some(id);
        Ok(request)
    }

    fn fail(&mut self, error: ConsoleError) -> ConsoleError {
        tracing::warn!(%error, "Console send rejected");
        self.error = Some(error.to_string());
        error
    }

    /// Apply the proxy's answer for request `id`. Answers for other ids are ignored.
    pub fn complete(
        &mut self,
        id: u64,
        outcome: Result<ProxyEnvelope, ConsoleError>,
        elapsed_ms: u64,
    ) -> bool {
        if self.pending != Some(id) {
            tracing::debug!(id, pending = ?self.pending, "Ignoring stale proxy reply");
            return false;
        }
        self.pending = None;
        let _ = self.apply(outcome, elapsed_ms);
        true
    }

    fn apply(
        &mut self,
        outcome: Result<ProxyEnvelope, ConsoleError>,
        elapsed_ms: u64,
    ) -> Result<(), ConsoleError> {
        let reply = match outcome.and_then(|envelope| interpret(&envelope)) {
            Ok(reply) => reply,
            Err(error) => {
                tracing::warn!(%error, "Proxy-level failure");
                self.error = Some(error.to_string());
                return Err(error);
            }
        };

        let status = match reply.status {
            Some(status) => status.to_string(),
            None => "Unknown".to_string(),
        };
        let body = if reply.body.is_empty() {
            EMPTY_RESPONSE_TEXT.to_string()
        } else if self.auto_format_json {
            pretty_or_raw(&reply.body)
        } else {
            reply.body.clone()
        };

        self.result = Some(ExecutionResult {
            status_line: format!("{} {}", status, reply.status_text)
                .trim()
                .to_string(),
            elapsed_ms,
            size_chars: reply.body.chars().count(),
            ok: reply.status.is_some_and(|s| (200..300).contains(&s)),
            headers: reply.headers,
            body,
        });
        Ok(())
    }

    /// Prepare, forward and complete in one go
    pub async fn send<P: Proxy + ?Sized>(&mut self, id: u64, proxy: &P) -> Result<(), ConsoleError> {
        let request = self.prepare(id)?;
        let started = Instant::now();
        let outcome = proxy.forward(&request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.pending = None;
        self.apply(outcome, elapsed_ms)
    }

    /// Placeholder reminders shown above the editor
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.url.to_lowercase().contains("hostname") {
            warnings.push(HOSTNAME_WARNING);
        }

        let has_placeholder = |s: &str| s.to_lowercase().contains(APIKEY_PLACEHOLDER);
        let in_headers = self
            .headers
            .iter()
            .any(|h| h.enabled && (has_placeholder(&h.key) || has_placeholder(&h.value)));
        if has_placeholder(&self.url) || in_headers || has_placeholder(&self.body) {
            warnings.push(APIKEY_WARNING);
        }
        warnings
    }

    pub fn cycle_method(&mut self) {
        self.method = self.method.next();
    }

    pub fn toggle_auto_format(&mut self) {
        self.auto_format_json = !self.auto_format_json;
    }

    pub fn export_curl(&mut self) -> &str {
        self.curl_export.insert(curl::to_curl(&self.outgoing()))
    }

    // ========================
    // Rows
    // ========================

    pub fn rows(&self, kind: RowKind) -> &[KeyValue] {
        match kind {
            RowKind::Param => &self.params,
            RowKind::Header => &self.headers,
        }
    }

    fn rows_mut(&mut self, kind: RowKind) -> &mut Vec<KeyValue> {
        match kind {
            RowKind::Param => &mut self.params,
            RowKind::Header => &mut self.headers,
        }
    }

    pub fn row_mut(&mut self, kind: RowKind, index: usize) -> Option<&mut KeyValue> {
        self.rows_mut(kind).get_mut(index)
    }

    /// Append an empty, enabled row and return its index
    pub fn add_row(&mut self, kind: RowKind) -> usize {
        let rows = self.rows_mut(kind);
        rows.push(KeyValue::empty());
        rows.len() - 1
    }

    /// Remove a row; the last remaining row is reset instead. Returns the index to select.
    pub fn remove_row(&mut self, kind: RowKind, index: usize) -> usize {
        let rows = self.rows_mut(kind);
        if rows.len() <= 1 {
            *rows = vec![KeyValue::empty()];
            return 0;
        }
        if index < rows.len() {
            rows.remove(index);
        }
        index.min(rows.len() - 1)
    }

    pub fn toggle_row(&mut self, kind: RowKind, index: usize) {
        if let Some(row) = self.row_mut(kind, index) {
            row.enabled = !row.enabled;
        }
    }
}

fn non_empty_rows(rows: &[KeyValue]) -> Vec<KeyValue> {
    if rows.is_empty() {
        vec![KeyValue::empty()]
    } else {
        rows.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::synthesize;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every forwarded request and answers with a canned envelope
    struct RecordingProxy {
        calls: Mutex<Vec<ProxyRequest>>,
        reply: Result<ProxyEnvelope, ConsoleError>,
    }

    impl RecordingProxy {
        fn answering(transport_status: u16, payload: &str) -> Self {
            RecordingProxy {
                calls: Mutex::new(Vec::new()),
                reply: Ok(ProxyEnvelope {
                    transport_status,
                    payload: payload.to_string(),
                }),
            }
        }

        fn calls(&self) -> Vec<ProxyRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Proxy for RecordingProxy {
        async fn forward(&self, request: &ProxyRequest) -> Result<ProxyEnvelope, ConsoleError> {
            self.calls.lock().unwrap().push(request.clone());
            self.reply.clone()
        }
    }

    fn console(method: HttpMethod, url: &str) -> ExecutionConsole {
        let draft = RequestDraft {
            method,
            url: url.to_string(),
            ..RequestDraft::default()
        };
        ExecutionConsole::from_draft(&draft, true)
    }

    #[test]
    fn test_final_url_appends_to_existing_query() {
        let mut c = console(HttpMethod::GET, "https://a.com/x?foo=1");
        c.params = vec![KeyValue::new("bar", "2")];
        assert_eq!(c.build_final_url(), "https://a.com/x?foo=1&bar=2");
    }

    #[test]
    fn test_final_url_skips_inactive_rows_and_trims_trailing_separator() {
        let mut c = console(HttpMethod::GET, " https://a.com/x? ");
        let mut disabled = KeyValue::new("off", "1");
        disabled.enabled = false;
        c.params = vec![disabled, KeyValue::new("  ", "blank"), KeyValue::new("q", "a b")];
        assert_eq!(c.build_final_url(), "https://a.com/x?q=a+b");

        c.params = vec![KeyValue::empty()];
        assert_eq!(c.build_final_url(), "https://a.com/x?");
    }

    #[test]
    fn test_json_body_compacted_with_content_type() {
        let mut c = console(HttpMethod::POST, "https://a.com/items");
        c.body = "{ \"name\" : \"a\" }".into();
        let request = c.outgoing();
        assert_eq!(request.body, "{\"name\":\"a\"}");
        assert_eq!(request.headers.get("Content-Type").map(String::as_str), Some("application/json"));
    }

    #[test]
    fn test_existing_content_type_kept_and_raw_body_passed_through() {
        let mut c = console(HttpMethod::PUT, "https://a.com/items");
        c.headers = vec![KeyValue::new("content-type", "text/plain")];
        c.body = "name=a".into();
        let request = c.outgoing();
        assert_eq!(request.body, "name=a");
        assert_eq!(request.headers.len(), 1);

        c.body = "{}".into();
        assert_eq!(c.outgoing().headers.len(), 1);
    }

    #[test]
    fn test_body_dropped_for_get() {
        let mut c = console(HttpMethod::GET, "https://a.com/items");
        c.body = "{\"a\":1}".into();
        assert!(c.outgoing().body.is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let mut c = console(HttpMethod::GET, "   ");
        assert_eq!(c.prepare(1), Err(ConsoleError::UrlRequired));
        assert_eq!(c.error.as_deref(), Some("URL required"));
        assert!(!c.is_busy());

        c.url = "not a url".into();
        assert_eq!(c.prepare(2), Err(ConsoleError::InvalidUrl("not a url".into())));
        assert_eq!(c.error.as_deref(), Some("Invalid URL format: not a url"));
    }

    #[test]
    fn test_second_send_is_busy_and_stale_replies_ignored() {
        let mut c = console(HttpMethod::GET, "https://a.com");
        assert!(c.prepare(1).is_ok());
        assert_eq!(c.prepare(2), Err(ConsoleError::Busy));

        let reply = Ok(ProxyEnvelope {
            transport_status: 200,
            payload: r#"{"status":200,"body":""}"#.into(),
        });
        assert!(!c.complete(2, reply.clone(), 5));
        assert!(c.is_busy());
        assert!(c.complete(1, reply, 5));
        assert!(!c.is_busy());
        assert_eq!(c.result.as_ref().map(|r| r.body.as_str()), Some(EMPTY_RESPONSE_TEXT));
    }

    #[tokio::test]
    async fn test_round_trip_from_synthesized_draft() {
        let doc = "Method: POST\nURL: https://api.x.com/items?page=1\nHeaders:\nAuthorization: Bearer abc123\nX-Trace: on\nBody:\n```json\n{\"name\":\"a\"}\n```";
        let draft = synthesize(doc);
        let mut c = ExecutionConsole::from_draft(&draft, true);
        c.headers[1].enabled = false;
        let proxy = RecordingProxy::answering(200, r#"{"status":201,"statusText":"Created","headers":{"x-id":"9"},"body":"{\"id\":9}"}"#);

        c.send(1, &proxy).await.unwrap();

        let calls = proxy.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, c.build_final_url());
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].headers.get("Authorization").map(String::as_str), Some("Bearer abc123"));
        assert!(!calls[0].headers.contains_key("X-Trace"));

        let result = c.result.as_ref().unwrap();
        assert_eq!(result.status_line, "201 Created");
        assert!(result.ok);
        assert_eq!(result.size_chars, 8);
        assert_eq!(result.body, "{\n  \"id\": 9\n}");
    }

    #[tokio::test]
    async fn test_not_found_is_a_result_not_an_error() {
        let mut c = console(HttpMethod::GET, "https://a.com/missing");
        let proxy = RecordingProxy::answering(
            200,
            r#"{"status":404,"statusText":"Not Found","headers":{},"body":"{}"}"#,
        );

        assert!(c.send(1, &proxy).await.is_ok());
        assert!(c.error.is_none());
        let result = c.result.as_ref().unwrap();
        assert!(!result.ok);
        assert_eq!(result.status_line, "404 Not Found");
    }

    #[tokio::test]
    async fn test_proxy_failure_sets_error() {
        let mut c = console(HttpMethod::GET, "https://a.com");
        let proxy = RecordingProxy::answering(502, r#"{"error":"upstream unreachable"}"#);
        assert!(c.send(1, &proxy).await.is_err());
        assert_eq!(c.error.as_deref(), Some("upstream unreachable"));
        assert!(c.result.is_none());
    }

    #[test]
    fn test_raw_body_shown_when_auto_format_off() {
        let mut c = console(HttpMethod::GET, "https://a.com");
        c.auto_format_json = false;
        c.prepare(1).unwrap();
        c.complete(
            1,
            Ok(ProxyEnvelope {
                transport_status: 200,
                payload: r#"{"status":200,"body":"{\"a\":1}"}"#.into(),
            }),
            3,
        );
        assert_eq!(c.result.unwrap().body, "{\"a\":1}");
    }

    #[test]
    fn test_placeholder_warnings() {
        let mut c = console(HttpMethod::GET, "https://HOSTNAME:8443/api");
        assert_eq!(c.warnings(), vec![HOSTNAME_WARNING]);

        c.url = "https://api.x.com".into();
        c.headers = vec![KeyValue::new("apikey", "<YOUR-APIKEY-VALUE>")];
        assert_eq!(c.warnings(), vec![APIKEY_WARNING]);

        c.headers[0].enabled = false;
        assert!(c.warnings().is_empty());
    }

    #[test]
    fn test_row_editing() {
        let mut c = console(HttpMethod::GET, "https://a.com");
        assert_eq!(c.add_row(RowKind::Header), 1);
        c.row_mut(RowKind::Header, 1).unwrap().key = "Accept".into();
        c.toggle_row(RowKind::Header, 1);
        assert!(!c.headers[1].enabled);

        assert_eq!(c.remove_row(RowKind::Header, 1), 0);
        assert_eq!(c.headers.len(), 1);

        c.headers[0].key = "X".into();
        assert_eq!(c.remove_row(RowKind::Header, 0), 0);
        assert_eq!(c.headers, vec![KeyValue::empty()]);
    }

    #[test]
    fn test_curl_export_uses_outgoing_request() {
        let mut c = console(HttpMethod::DELETE, "https://a.com/items/1");
        let curl = c.export_curl().to_string();
        assert!(curl.contains("-X DELETE"));
        assert_eq!(c.curl_export.as_deref(), Some(curl.as_str()));
    }

    #[test]
    fn test_edits_do_not_touch_the_draft() {
        let draft = synthesize("POST https://api.x.com/items");
        let mut c = ExecutionConsole::from_draft(&draft, true);
        c.url.push_str("/more");
        c.cycle_method();
        assert_eq!(draft.url, "https://api.x.com/items");
        assert_eq!(draft.method, HttpMethod::POST);
    }
}

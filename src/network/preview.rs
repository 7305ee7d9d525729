//! Linked-document preview - fetches files referenced from assistant replies

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::PreviewError;
use crate::network::client::describe_error;

static FILE_HOST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://(?:github\.com|github\.ibm\.com)/").expect("file host regex")
});

static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]\((https?://[^)\s]+)\)").expect("markdown link regex"));

/// A fetched document
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilePreview {
    pub name: String,
    pub path: String,
    pub content: String,
    pub repository: String,
    pub branch: String,
}

impl FilePreview {
    pub fn title(&self) -> &str {
        [self.name.as_str(), self.path.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("GitHub File")
    }
}

/// Repository file URLs (blob or raw views) that the preview endpoint can serve
pub fn is_file_link(url: &str) -> bool {
    FILE_HOST_RE.is_match(url) && (url.contains("/blob/") || url.contains("/raw/"))
}

/// Previewable Markdown links in document order, without duplicates
pub fn file_links(text: &str) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for caps in MARKDOWN_LINK_RE.captures_iter(text) {
        let Some(url) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if is_file_link(url) && !links.iter().any(|l| l == url) {
            links.push(url.to_string());
        }
    }
    links
}

/// GET `<endpoint>?url=<file_url>`
pub async fn fetch_preview(
    client: &reqwest::Client,
    endpoint: &str,
    file_url: &str,
    timeout: Duration,
) -> Result<FilePreview, PreviewError> {
    let resp = client
        .get(endpoint)
        .query(&[("url", file_url)])
        .send()
        .await
        .map_err(|e| PreviewError::Transport(describe_error(&e, timeout)))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| PreviewError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(rejection(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| PreviewError::Transport(e.to_string()))
}

fn rejection(status: u16, body: &str) -> PreviewError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|data| {
            data.get("error")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Failed to load file (status {})", status));
    PreviewError::Rejected(message)
}

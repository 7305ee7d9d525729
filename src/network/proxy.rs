//! Same-origin proxy collaborator - performs the console's outbound calls
//!
//! The proxy answers either with the target server's response
//! (`{status, statusText, headers, body}`, any status) or, when it fails
//! itself, with `{error | details}` and a non-success transport status.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::ConsoleError;
use crate::json::value_to_text;
use crate::models::ResponseHeader;
use crate::network::client::describe_error;

/// The single request object handed to the proxy
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProxyRequest {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Raw proxy answer: its own HTTP status plus the unparsed payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyEnvelope {
    pub transport_status: u16,
    pub payload: String,
}

/// A target-server response relayed by the proxy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyReply {
    /// `None` when the proxy relayed no usable status
    pub status: Option<u16>,
    pub status_text: String,
    pub headers: Vec<ResponseHeader>,
    pub body: String,
}

#[async_trait]
pub trait Proxy: Send + Sync {
    async fn forward(&self, request: &ProxyRequest) -> Result<ProxyEnvelope, ConsoleError>;
}

/// Tell a proxy-level failure apart from a target-server response
pub fn interpret(envelope: &ProxyEnvelope) -> Result<ProxyReply, ConsoleError> {
    let data: Value = serde_json::from_str(&envelope.payload)
        .map_err(|e| ConsoleError::InvalidProxyReply(e.to_string()))?;

    let status = data
        .get("status")
        .and_then(Value::as_u64)
        .filter(|s| *s != 0)
        .and_then(|s| u16::try_from(s).ok());

    let transport_ok = (200..300).contains(&envelope.transport_status);
    if !transport_ok && status.is_none() {
        let message = non_empty_str(&data, "error")
            .or_else(|| non_empty_str(&data, "details"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Proxy error {}", envelope.transport_status));
        return Err(ConsoleError::Proxy(message));
    }

    let headers = data
        .get("headers")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(key, value)| ResponseHeader {
                    key: key.clone(),
                    value: value_to_text(value),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ProxyReply {
        status,
        status_text: non_empty_str(&data, "statusText").unwrap_or_default().to_string(),
        headers,
        body: data.get("body").map(value_to_text).unwrap_or_default(),
    })
}

fn non_empty_str<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// The proxy reached over HTTP
pub struct HttpProxy {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpProxy {
    pub fn new(client: reqwest::Client, endpoint: String, timeout: Duration) -> Self {
        HttpProxy {
            client,
            endpoint,
            timeout,
        }
    }
}

#[async_trait]
impl Proxy for HttpProxy {
    async fn forward(&self, request: &ProxyRequest) -> Result<ProxyEnvelope, ConsoleError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ConsoleError::Proxy(describe_error(&e, self.timeout)))?;

        let transport_status = resp.status().as_u16();
        let payload = resp
            .text()
            .await
            .map_err(|e| ConsoleError::Proxy(format!("Error reading body: {}", e)))?;

        Ok(ProxyEnvelope {
            transport_status,
            payload,
        })
    }
}

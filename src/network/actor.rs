//! Network actor - runs chat turns, proxy calls and preview fetches in the Tokio runtime

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::network::chat::{send_chat, ChatOutcome};
use crate::network::client::create_client;
use crate::network::preview::fetch_preview;
use crate::network::proxy::{HttpProxy, Proxy};

/// Network actor that processes chat, proxy and preview commands
pub struct NetworkActor {
    client: reqwest::Client,
    proxy: Arc<dyn Proxy>,
    chat_url: String,
    preview_url: String,
    timeout: Duration,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<()>,
}

impl NetworkActor {
    pub fn new(config: &Config, response_tx: mpsc::UnboundedSender<NetworkResponse>) -> Self {
        let client = create_client(config.timeout());
        let proxy = Arc::new(HttpProxy::new(
            client.clone(),
            config.proxy_url(),
            config.timeout(),
        ));
        Self::assemble(config, client, proxy, response_tx)
    }

    /// Build the actor around a custom proxy collaborator
    pub fn with_proxy(
        config: &Config,
        proxy: Arc<dyn Proxy>,
        response_tx: mpsc::UnboundedSender<NetworkResponse>,
    ) -> Self {
        Self::assemble(config, create_client(config.timeout()), proxy, response_tx)
    }

    fn assemble(
        config: &Config,
        client: reqwest::Client,
        proxy: Arc<dyn Proxy>,
        response_tx: mpsc::UnboundedSender<NetworkResponse>,
    ) -> Self {
        NetworkActor {
            client,
            proxy,
            chat_url: config.chat_url(),
            preview_url: config.file_preview_url(),
            timeout: config.timeout(),
            response_tx,
            active_requests: JoinSet::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::Chat { id, message, cancel }) => {
                            let response_tx = self.response_tx.clone();
                            let client = self.client.clone();
                            let url = self.chat_url.clone();
                            let timeout = self.timeout;

                            self.active_requests.spawn(async move {
                                tracing::info!(id, chars = message.chars().count(), "Sending chat turn");
                                let outcome = tokio::select! {
                                    biased;
                                    _ = cancel.cancelled() => ChatOutcome::Aborted,
                                    outcome = send_chat(&client, &url, &message, timeout) => outcome,
                                };
                                tracing::info!(id, ?outcome, "Chat turn finished");
                                let _ = response_tx.send(NetworkResponse::Chat { id, outcome });
                            });
                        }

                        Some(NetworkCommand::Proxy { id, request }) => {
                            let response_tx = self.response_tx.clone();
                            let proxy = Arc::clone(&self.proxy);

                            self.active_requests.spawn(async move {
                                tracing::info!(id, method = %request.method, url = %request.url, "Forwarding request to proxy");
                                let started = Instant::now();
                                let outcome = proxy.forward(&request).await;
                                let elapsed_ms = started.elapsed().as_millis() as u64;
                                let _ = response_tx.send(NetworkResponse::ProxyReplied {
                                    id,
                                    outcome,
                                    elapsed_ms,
                                });
                            });
                        }

                        Some(NetworkCommand::FetchPreview { id, url }) => {
                            let response_tx = self.response_tx.clone();
                            let client = self.client.clone();
                            let endpoint = self.preview_url.clone();
                            let timeout = self.timeout;

                            self.active_requests.spawn(async move {
                                tracing::info!(id, url = %url, "Fetching file preview");
                                let response = match fetch_preview(&client, &endpoint, &url, timeout).await {
                                    Ok(preview) => NetworkResponse::PreviewLoaded { id, preview },
                                    Err(error) => {
                                        tracing::warn!(id, %error, "File preview failed");
                                        NetworkResponse::PreviewFailed { id, error }
                                    }
                                };
                                let _ = response_tx.send(response);
                            });
                        }

                        Some(NetworkCommand::Shutdown) | None => {
                            self.active_requests.abort_all();
                            break;
                        }
                    }
                }

                Some(_result) = self.active_requests.join_next() => {
                    // Task completed - responses are sent by the tasks themselves
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::error::ConsoleError;
    use crate::network::proxy::{ProxyEnvelope, ProxyRequest};
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    struct EchoProxy;

    #[async_trait]
    impl Proxy for EchoProxy {
        async fn forward(&self, request: &ProxyRequest) -> Result<ProxyEnvelope, ConsoleError> {
            Ok(ProxyEnvelope {
                transport_status: 200,
                payload: format!(r#"{{"status":200,"statusText":"OK","body":"{}"}}"#, request.url),
            })
        }
    }

    fn spawn_actor() -> (
        mpsc::UnboundedSender<NetworkCommand>,
        mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = mpsc::unbounded_channel();
        let mut config = Config::default();
        // Nothing listens here, so a chat that is not cancelled would fail fast
        config.base_url = "http://127.0.0.1:9".into();
        let actor = NetworkActor::with_proxy(&config, Arc::new(EchoProxy), resp_tx);
        tokio::spawn(actor.run(cmd_rx));
        (cmd_tx, resp_rx)
    }

    #[tokio::test]
    async fn test_proxy_command_round_trip() {
        let (cmd_tx, mut resp_rx) = spawn_actor();
        let request = ProxyRequest {
            method: "GET".into(),
            url: "https://api.x.com/items".into(),
            headers: BTreeMap::new(),
            body: String::new(),
        };
        cmd_tx.send(NetworkCommand::Proxy { id: 7, request }).unwrap();

        match resp_rx.recv().await {
            Some(NetworkResponse::ProxyReplied { id, outcome, .. }) => {
                assert_eq!(id, 7);
                assert!(outcome.unwrap().payload.contains("api.x.com/items"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
        let _ = cmd_tx.send(NetworkCommand::Shutdown);
    }

    #[tokio::test]
    async fn test_cancelled_chat_reports_aborted() {
        let (cmd_tx, mut resp_rx) = spawn_actor();
        let cancel = CancelToken::new();
        cancel.cancel();
        cmd_tx
            .send(NetworkCommand::Chat {
                id: 3,
                message: "how do I create a widget?".into(),
                cancel,
            })
            .unwrap();

        match resp_rx.recv().await {
            Some(NetworkResponse::Chat { id, outcome }) => {
                assert_eq!(id, 3);
                assert_eq!(outcome, ChatOutcome::Aborted);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }
}

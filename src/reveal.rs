//! Streaming revealer - typewriter-style reveal of an assistant reply
//!
//! Text is split on single spaces and shown one token at a time, pausing
//! longer after punctuation, line breaks and code fences. Tokens are atomic:
//! a cancelled reveal never shows half a token.

use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cancel::CancelToken;
use crate::messages::RevealEvent;
use crate::models::MessageId;

/// Shortest pause between two tokens
const MIN_DELAY_MS: i64 = 5;
/// Maximum jitter applied either way
const JITTER_MS: i64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    Completed,
    Cancelled,
}

/// Pause after `token`, before jitter
pub fn base_delay_ms(token: &str) -> u64 {
    if token.ends_with(['.', '!', '?']) {
        100
    } else if token.ends_with([',', ':', ';']) {
        50
    } else if token.contains('\n') {
        80
    } else if token.contains("```") {
        120
    } else if token.contains("**") {
        30
    } else if token.chars().count() > 12 {
        25
    } else {
        15
    }
}

/// Pause after `token` with the given jitter, never below the floor
pub fn token_delay(token: &str, jitter_ms: i64) -> Duration {
    let ms = (base_delay_ms(token) as i64 + jitter_ms).max(MIN_DELAY_MS);
    Duration::from_millis(ms as u64)
}

fn random_jitter() -> i64 {
    rand::thread_rng().gen_range(-JITTER_MS..=JITTER_MS)
}

/// Reveal `text` token by token, calling `on_update` with everything shown so far.
///
/// The token is polled before each step and raced against every pause, so a
/// cancel takes effect before the next token is appended.
pub async fn reveal<F>(text: &str, cancel: &CancelToken, mut on_update: F) -> RevealOutcome
where
    F: FnMut(&str),
{
    let mut shown = String::with_capacity(text.len());

    for (i, token) in text.split(' ').enumerate() {
        if cancel.is_cancelled() {
            return RevealOutcome::Cancelled;
        }
        if i > 0 {
            shown.push(' ');
        }
        shown.push_str(token);
        on_update(&shown);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return RevealOutcome::Cancelled,
            _ = tokio::time::sleep(token_delay(token, random_jitter())) => {}
        }
    }

    RevealOutcome::Completed
}

/// A reveal running on its own task, reporting through `RevealEvent`s
pub struct RevealTask {
    pub message_id: MessageId,
    token: CancelToken,
    handle: JoinHandle<()>,
}

impl RevealTask {
    pub fn spawn(
        message_id: MessageId,
        text: String,
        token: CancelToken,
        events: mpsc::UnboundedSender<RevealEvent>,
    ) -> Self {
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            let outcome = reveal(&text, &task_token, |shown| {
                let _ = events.send(RevealEvent::Update {
                    id: message_id,
                    content: shown.to_string(),
                });
            })
            .await;
            tracing::debug!(%message_id, ?outcome, "reveal finished");
            let _ = events.send(RevealEvent::Finished {
                id: message_id,
                outcome,
            });
        });

        RevealTask {
            message_id,
            token,
            handle,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal cancellation and wait for the task to acknowledge by exiting
    pub async fn cancel_and_wait(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(message_id = %self.message_id, error = %e, "reveal task did not exit cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_base_delays() {
        assert_eq!(base_delay_ms("done."), 100);
        assert_eq!(base_delay_ms("wait,"), 50);
        assert_eq!(base_delay_ms("line\nbreak"), 80);
        assert_eq!(base_delay_ms("```json"), 120);
        assert_eq!(base_delay_ms("**bold**"), 30);
        assert_eq!(base_delay_ms("extraordinarily"), 25);
        assert_eq!(base_delay_ms("word"), 15);
    }

    #[test]
    fn test_delay_is_floored() {
        assert_eq!(token_delay("a", -5), Duration::from_millis(10));
        assert_eq!(token_delay("a.", 5), Duration::from_millis(105));
        assert_eq!(base_delay_ms(""), 15);
        assert!(token_delay("", -100) >= Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_emits_growing_snapshots() {
        let token = CancelToken::new();
        let mut updates = Vec::new();
        let outcome = reveal("Hello there world.", &token, |s| updates.push(s.to_string())).await;

        assert_eq!(outcome, RevealOutcome::Completed);
        assert_eq!(updates, vec!["Hello", "Hello there", "Hello there world."]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_sequence_stops_at_token_boundary() {
        let token = CancelToken::new();
        let canceller = token.clone();
        let mut updates = Vec::new();

        let outcome = reveal("one two three four five", &token, |s| {
            updates.push(s.to_string());
            if updates.len() == 3 {
                canceller.cancel();
            }
        })
        .await;

        assert_eq!(outcome, RevealOutcome::Cancelled);
        assert_eq!(updates.len(), 3);
        assert_eq!(updates.last().map(String::as_str), Some("one two three"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_task_reports_and_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let text = "a b c d e f g h".to_string();
        let task = RevealTask::spawn(id, text, CancelToken::new(), tx);

        match rx.recv().await {
            Some(RevealEvent::Update { id: got, content }) => {
                assert_eq!(got, id);
                assert_eq!(content, "a");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        task.cancel_and_wait().await;

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        assert!(matches!(
            last,
            Some(RevealEvent::Finished {
                outcome: RevealOutcome::Cancelled,
                ..
            })
        ));
    }
}

//! Command handlers - business logic for processing UI events and replies

use crate::app::console::ExecutionConsole;
use crate::app::state::{preview_headings, PreviewState, RevealJob, Turn, TurnPhase};
use crate::app::AppState;
use crate::cancel::CancelToken;
use crate::constants::{BACKEND_UNAVAILABLE_TEXT, BACKEND_UNREACHABLE_TEXT, GREETING_TEXT};
use crate::error::{ConsoleError, PreviewError};
use crate::extract::{normalize_reply, synthesize, synthesize_for_section};
use crate::messages::ui_events::{ConsoleField, Focus, InputMode, RowColumn};
use crate::messages::{NetworkCommand, RevealEvent};
use crate::models::{ChatMessage, MessageId, RequestDraft};
use crate::network::chat::{is_greeting, ChatOutcome};
use crate::network::preview::{file_links, FilePreview};
use crate::network::proxy::ProxyEnvelope;
use crate::reveal::RevealOutcome;

/// How a submitted message gets its reply
#[derive(Debug)]
pub enum TurnStart {
    /// Ask the chat backend
    Network(NetworkCommand),
    /// Answered locally, reveal right away
    Local(RevealJob),
}

impl AppState {
    // ========================
    // Input editing
    // ========================

    pub fn start_editing(&mut self) {
        if self.focus() == Focus::Console
            && matches!(self.console_field, ConsoleField::Method | ConsoleField::Response)
        {
            return;
        }
        self.input_mode = InputMode::Editing;
        self.cursor_position = self.current_input().len();
    }

    pub fn stop_editing(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn move_cursor_left(&mut self) {
        let input = self.current_input();
        if self.cursor_position > 0 {
            let new_pos = input[..self.cursor_position.min(input.len())]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.cursor_position = new_pos;
        }
    }

    pub fn move_cursor_right(&mut self) {
        let input = self.current_input();
        if self.cursor_position < input.len() {
            let new_pos = input[self.cursor_position..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_position + i)
                .unwrap_or(input.len());
            self.cursor_position = new_pos;
        }
    }

    pub fn enter_char(&mut self, c: char) {
        let cursor_pos = self.cursor_position;
        if let Some(input) = self.current_input_mut() {
            if cursor_pos <= input.len() && input.is_char_boundary(cursor_pos) {
                input.insert(cursor_pos, c);
                self.cursor_position = cursor_pos + c.len_utf8();
            }
        }
    }

    pub fn insert_newline(&mut self) {
        self.enter_char('\n');
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        let cursor_pos = self.cursor_position;
        if let Some(input) = self.current_input_mut() {
            let Some(prev_pos) = input
                .get(..cursor_pos)
                .and_then(|before| before.char_indices().last())
                .map(|(i, _)| i)
            else {
                return;
            };
            input.remove(prev_pos);
            self.cursor_position = prev_pos;
        }
    }

    // ========================
    // Chat turns
    // ========================

    /// Post the input line as a user message and start a turn for it
    pub fn submit_input(&mut self) -> Option<TurnStart> {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }
        if self.turn.is_some() {
            self.status = Some("A reply is still in progress (Ctrl+X to stop)".to_string());
            return None;
        }

        self.input.clear();
        self.cursor_position = 0;
        self.selected_message = None;
        self.status = None;

        let mut placeholder = ChatMessage::assistant_placeholder();
        let message_id = placeholder.id;
        let cancel = CancelToken::new();

        if is_greeting(&text) {
            placeholder.is_loading = false;
            self.messages.push(ChatMessage::user(text));
            self.messages.push(placeholder);
            self.disclosure.gate(message_id, false);
            self.prerequisites.insert(message_id, String::new());
            self.turn = Some(Turn {
                message_id,
                request_id: None,
                cancel: cancel.clone(),
                phase: TurnPhase::Revealing,
            });
            tracing::info!(%message_id, "Answering greeting locally");
            return Some(TurnStart::Local(RevealJob {
                message_id,
                text: GREETING_TEXT.to_string(),
                cancel,
            }));
        }

        let id = self.next_id();
        self.messages.push(ChatMessage::user(text.clone()));
        self.messages.push(placeholder);
        self.turn = Some(Turn {
            message_id,
            request_id: Some(id),
            cancel: cancel.clone(),
            phase: TurnPhase::Waiting,
        });

        Some(TurnStart::Network(NetworkCommand::Chat {
            id,
            message: text,
            cancel,
        }))
    }

    /// Turn the chat backend's answer into a reveal. Answers for stale turns are dropped.
    pub fn accept_chat(&mut self, id: u64, outcome: ChatOutcome) -> Option<RevealJob> {
        let (message_id, cancel) = match &self.turn {
            Some(turn) if turn.request_id == Some(id) && turn.phase == TurnPhase::Waiting => {
                (turn.message_id, turn.cancel.clone())
            }
            _ => {
                tracing::debug!(id, "Ignoring chat reply for a finished turn");
                return None;
            }
        };

        let (text, executable, is_error) = match outcome {
            ChatOutcome::Aborted => {
                self.turn = None;
                self.discard_message(message_id);
                return None;
            }
            ChatOutcome::Reply(raw) => {
                let text = normalize_reply(&raw);
                let executable = self.classify(message_id, &text);
                (text, executable, false)
            }
            ChatOutcome::Unavailable(status) => {
                tracing::warn!(status, "Chat backend answered with an error status");
                self.prerequisites.insert(message_id, String::new());
                (BACKEND_UNAVAILABLE_TEXT.to_string(), false, false)
            }
            ChatOutcome::Unreachable(error) => {
                tracing::warn!(%error, "Chat backend unreachable");
                self.prerequisites.insert(message_id, String::new());
                (BACKEND_UNREACHABLE_TEXT.to_string(), false, true)
            }
        };

        if let Some(turn) = &mut self.turn {
            turn.phase = TurnPhase::Revealing;
        }
        self.disclosure.gate(message_id, executable);
        if let Some(message) = self.message_mut(message_id) {
            message.is_loading = false;
            message.is_error = is_error;
            message.content.clear();
        }

        Some(RevealJob {
            message_id,
            text,
            cancel,
        })
    }

    pub fn apply_reveal(&mut self, event: RevealEvent) {
        match event {
            RevealEvent::Update { id, content } => {
                // A stopped or superseded reveal may still have updates queued
                if self.streaming_id() != Some(id) {
                    return;
                }
                if let Some(message) = self.message_mut(id) {
                    message.content = content;
                }
            }
            RevealEvent::Finished { id, outcome } => {
                if outcome == RevealOutcome::Cancelled {
                    tracing::debug!(%id, "Reveal cancelled");
                }
                if self.streaming_id() == Some(id) {
                    self.turn = None;
                }
                self.save_transcript();
            }
        }
    }

    /// Halt the current turn: the pending call is aborted and any placeholder removed
    pub fn stop_streaming(&mut self) {
        let Some(turn) = self.turn.take() else {
            return;
        };
        tracing::info!(message_id = %turn.message_id, phase = ?turn.phase, "Stopping turn");
        turn.cancel.cancel();

        let stuck: Vec<MessageId> = self
            .messages
            .iter()
            .filter(|m| m.is_loading)
            .map(|m| m.id)
            .collect();
        for id in stuck {
            self.discard_message(id);
        }
        self.save_transcript();
    }

    fn discard_message(&mut self, id: MessageId) {
        self.messages.retain(|m| m.id != id);
        self.disclosure.remove(id);
        self.prerequisites.remove(&id);
        self.executable.remove(&id);
        self.linked.remove(&id);
        if self
            .selected_message
            .is_some_and(|index| index >= self.messages.len())
        {
            self.selected_message = self.messages.len().checked_sub(1);
        }
    }

    fn save_transcript(&self) {
        if let Err(e) = self.storage.save_transcript(&self.messages) {
            tracing::warn!(error = %e, "Failed to save transcript");
        }
    }

    // ========================
    // Transcript navigation
    // ========================

    pub fn select_prev(&mut self) {
        if self.messages.is_empty() {
            return;
        }
        self.selected_message = Some(match self.selected_message {
            None => self.messages.len() - 1,
            Some(index) => index.saturating_sub(1),
        });
    }

    pub fn select_next(&mut self) {
        self.selected_message = match self.selected_message {
            Some(index) if index + 1 < self.messages.len() => Some(index + 1),
            // Past the last message: follow the conversation again
            _ => None,
        };
    }

    pub fn scroll_up(&mut self) {
        match self.focus() {
            Focus::Chat => self.chat_scroll = self.chat_scroll.saturating_add(3),
            Focus::Console => self.response_scroll = self.response_scroll.saturating_sub(1),
            Focus::Preview => {
                if let Some(preview) = &mut self.preview {
                    preview.scroll = preview.scroll.saturating_sub(3);
                }
            }
        }
    }

    pub fn scroll_down(&mut self) {
        match self.focus() {
            Focus::Chat => self.chat_scroll = self.chat_scroll.saturating_sub(3),
            Focus::Console => self.response_scroll = self.response_scroll.saturating_add(1),
            Focus::Preview => {
                if let Some(preview) = &mut self.preview {
                    preview.scroll = preview.scroll.saturating_add(3);
                }
            }
        }
    }

    // ========================
    // Disclosure
    // ========================

    fn target_id(&self) -> Option<MessageId> {
        self.target_message()
            .filter(|m| m.is_assistant())
            .map(|m| m.id)
    }

    pub fn choose_manual(&mut self) {
        if let Some(id) = self.target_id() {
            self.disclosure.choose_manual(id);
        }
    }

    pub fn choose_automatic(&mut self) {
        if let Some(id) = self.target_id() {
            if self.disclosure.choose_automatic(id) {
                self.open_console_for(id);
            }
        }
    }

    pub fn toggle_collapse(&mut self) {
        if let Some(id) = self.target_id() {
            self.disclosure.toggle_collapse(id);
        }
    }

    /// Open the console for the target message, if it describes a runnable call
    pub fn execute(&mut self) {
        let Some(id) = self.target_id() else {
            return;
        };
        if !self.executable.contains(&id) {
            self.status = Some("This message does not describe a runnable request".to_string());
            return;
        }
        self.open_console_for(id);
    }

    fn open_console_for(&mut self, id: MessageId) {
        let Some(content) = self.message(id).map(|m| m.content.clone()) else {
            return;
        };
        let draft = synthesize(&content);
        self.open_console(&draft);
    }

    pub fn open_console(&mut self, draft: &RequestDraft) {
        tracing::info!(method = %draft.method, url = %draft.url, "Opening execution console");
        self.console = Some(ExecutionConsole::from_draft(draft, self.config.auto_format_json));
        self.console_field = ConsoleField::Url;
        self.selected_row = 0;
        self.row_column = RowColumn::Key;
        self.response_scroll = 0;
        self.input_mode = InputMode::Normal;
    }

    // ========================
    // Execution console
    // ========================

    pub fn next_field(&mut self) {
        self.console_field = self.console_field.next();
        self.selected_row = 0;
        self.row_column = RowColumn::Key;
    }

    pub fn prev_field(&mut self) {
        self.console_field = self.console_field.prev();
        self.selected_row = 0;
        self.row_column = RowColumn::Key;
    }

    pub fn cycle_method(&mut self) {
        if let Some(console) = &mut self.console {
            console.cycle_method();
        }
    }

    pub fn next_row(&mut self) {
        let (Some(kind), Some(console)) = (self.row_kind(), &self.console) else {
            return;
        };
        let len = console.rows(kind).len();
        if len > 0 {
            self.selected_row = (self.selected_row + 1) % len;
        }
    }

    pub fn prev_row(&mut self) {
        let (Some(kind), Some(console)) = (self.row_kind(), &self.console) else {
            return;
        };
        let len = console.rows(kind).len();
        if len > 0 {
            self.selected_row = self.selected_row.checked_sub(1).unwrap_or(len - 1);
        }
    }

    pub fn add_row(&mut self) {
        let kind = self.row_kind();
        if let (Some(kind), Some(console)) = (kind, &mut self.console) {
            self.selected_row = console.add_row(kind);
            self.row_column = RowColumn::Key;
        }
    }

    pub fn remove_row(&mut self) {
        let kind = self.row_kind();
        if let (Some(kind), Some(console)) = (kind, &mut self.console) {
            self.selected_row = console.remove_row(kind, self.selected_row);
        }
    }

    pub fn toggle_row(&mut self) {
        let kind = self.row_kind();
        if let (Some(kind), Some(console)) = (kind, &mut self.console) {
            console.toggle_row(kind, self.selected_row);
        }
    }

    pub fn next_column(&mut self) {
        self.row_column = self.row_column.toggle();
        self.cursor_position = self.current_input().len();
    }

    pub fn toggle_auto_format(&mut self) {
        if let Some(console) = &mut self.console {
            console.toggle_auto_format();
        }
    }

    pub fn export_curl(&mut self) {
        if let Some(console) = &mut self.console {
            console.export_curl();
            self.response_scroll = 0;
        }
    }

    pub fn close_console(&mut self) {
        self.console = None;
        self.input_mode = InputMode::Editing;
        self.cursor_position = self.input.len();
    }

    /// Validate the console and hand its request to the proxy
    pub fn send_console(&mut self) -> Option<NetworkCommand> {
        let id = self.next_id();
        let console = self.console.as_mut()?;
        match console.prepare(id) {
            Ok(request) => {
                console.curl_export = None;
                self.response_scroll = 0;
                Some(NetworkCommand::Proxy { id, request })
            }
            Err(ConsoleError::Busy) => {
                self.status = Some(ConsoleError::Busy.to_string());
                None
            }
            Err(_) => None,
        }
    }

    pub fn accept_proxy(
        &mut self,
        id: u64,
        outcome: Result<ProxyEnvelope, ConsoleError>,
        elapsed_ms: u64,
    ) {
        match &mut self.console {
            Some(console) => {
                console.complete(id, outcome, elapsed_ms);
            }
            None => tracing::debug!(id, "Proxy reply arrived after the console closed"),
        }
    }

    // ========================
    // File preview
    // ========================

    /// Open the first linked file of the target message
    pub fn open_preview(&mut self) -> Option<NetworkCommand> {
        let url = self
            .target_message()
            .and_then(|m| file_links(&m.content).into_iter().next());
        let Some(url) = url else {
            self.status = Some("No linked file in this message".to_string());
            return None;
        };

        let id = self.next_id();
        self.preview = Some(PreviewState::loading(id, url.clone()));
        self.input_mode = InputMode::Normal;
        Some(NetworkCommand::FetchPreview { id, url })
    }

    pub fn accept_preview(&mut self, id: u64, outcome: Result<FilePreview, PreviewError>) {
        let Some(preview) = self.preview.as_mut().filter(|p| p.request_id == id) else {
            tracing::debug!(id, "Ignoring preview for a closed dialog");
            return;
        };
        match outcome {
            Ok(file) => {
                preview.headings = preview_headings(&file.content);
                preview.selected_heading = 0;
                preview.file = Some(file);
            }
            Err(error) => preview.error = Some(error.to_string()),
        }
    }

    pub fn prev_heading(&mut self) {
        if let Some(preview) = &mut self.preview {
            preview.selected_heading = preview.selected_heading.saturating_sub(1);
        }
    }

    pub fn next_heading(&mut self) {
        if let Some(preview) = &mut self.preview {
            if preview.selected_heading + 1 < preview.headings.len() {
                preview.selected_heading += 1;
            }
        }
    }

    /// Seed the console from the chosen section and close the preview
    pub fn select_heading(&mut self) {
        let Some(preview) = &self.preview else {
            return;
        };
        let Some(file) = &preview.file else {
            return;
        };
        let title = preview
            .headings
            .get(preview.selected_heading)
            .cloned()
            .unwrap_or_default();
        let draft = synthesize_for_section(&file.content, &title);
        self.preview = None;
        self.open_console(&draft);
    }

    pub fn close_preview(&mut self) {
        self.preview = None;
    }

    // ========================
    // Clear chat
    // ========================

    pub fn request_clear_chat(&mut self) {
        if self.prefs.skip_clear_confirm {
            self.clear_chat();
        } else {
            self.show_clear_confirm = true;
            self.clear_confirm_skip = false;
        }
    }

    pub fn toggle_skip_clear_confirm(&mut self) {
        self.clear_confirm_skip = !self.clear_confirm_skip;
    }

    pub fn confirm_clear(&mut self) {
        if self.clear_confirm_skip {
            self.prefs.skip_clear_confirm = true;
            if let Err(e) = self.storage.save_prefs(&self.prefs) {
                tracing::warn!(error = %e, "Failed to save preferences");
            }
        }
        self.show_clear_confirm = false;
        self.clear_chat();
    }

    pub fn cancel_clear(&mut self) {
        self.show_clear_confirm = false;
    }

    /// Empty the transcript and every per-message store
    pub fn clear_chat(&mut self) {
        self.stop_streaming();
        self.messages.clear();
        self.disclosure.clear();
        self.prerequisites.clear();
        self.executable.clear();
        self.linked.clear();
        self.selected_message = None;
        self.chat_scroll = 0;
        if let Err(e) = self.storage.clear_transcript() {
            tracing::warn!(error = %e, "Failed to delete transcript");
        }
        tracing::info!("Chat cleared");
    }

    // ========================
    // Help popup
    // ========================

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::disclosure::Disclosure;
    use crate::config::Config;
    use crate::constants::EMPTY_REPLY_TEXT;
    use crate::storage::Storage;
    use tempfile::TempDir;

    const RUNNABLE: &str = "## Prerequisites\nAn API key from https://example.com/keys\n\n## Create Item\nMethod: POST\nURL: https://api.x.com/items\nHeaders:\nAuthorization: Bearer abc123\nBody:\n```json\n{\"name\":\"a\"}\n```";

    fn state() -> (AppState, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        (AppState::new(Config::default(), storage), dir)
    }

    fn type_text(state: &mut AppState, text: &str) {
        for c in text.chars() {
            state.enter_char(c);
        }
    }

    /// Submit `question` and answer it with `outcome`, returning the reveal job
    fn turn(state: &mut AppState, question: &str, outcome: ChatOutcome) -> Option<RevealJob> {
        type_text(state, question);
        let Some(TurnStart::Network(NetworkCommand::Chat { id, .. })) = state.submit_input() else {
            panic!("expected a network turn");
        };
        state.accept_chat(id, outcome)
    }

    fn finish(state: &mut AppState, job: &RevealJob) {
        state.apply_reveal(RevealEvent::Update {
            id: job.message_id,
            content: job.text.clone(),
        });
        state.apply_reveal(RevealEvent::Finished {
            id: job.message_id,
            outcome: RevealOutcome::Completed,
        });
    }

    #[test]
    fn test_executable_reply_is_gated_with_prerequisites() {
        let (mut state, _dir) = state();
        let job = turn(&mut state, "how do I create an item?", ChatOutcome::Reply(RUNNABLE.into())).unwrap();

        assert_eq!(state.disclosure.state(job.message_id), Disclosure::Hidden);
        assert!(state.executable.contains(&job.message_id));
        assert!(state.prerequisites[&job.message_id].starts_with("Prerequisites"));
        assert!(state.streaming_id() == Some(job.message_id));

        finish(&mut state, &job);
        assert!(state.turn.is_none());

        state.choose_automatic();
        let console = state.console.as_ref().unwrap();
        assert_eq!(console.url, "https://api.x.com/items");
        assert_eq!(state.disclosure.state(job.message_id), Disclosure::Hidden);

        state.close_console();
        state.choose_manual();
        assert_eq!(state.disclosure.state(job.message_id), Disclosure::Expanded);
    }

    #[test]
    fn test_prose_reply_is_never_gated() {
        let (mut state, _dir) = state();
        let job = turn(&mut state, "what is caching?", ChatOutcome::Reply("Caching keeps data close.".into())).unwrap();
        assert_eq!(state.disclosure.state(job.message_id), Disclosure::Expanded);
        assert_eq!(state.prerequisites[&job.message_id], "");

        state.toggle_collapse();
        assert_eq!(state.disclosure.state(job.message_id), Disclosure::Collapsed);
    }

    #[test]
    fn test_failures_are_revealed_like_replies() {
        let (mut state, _dir) = state();
        let job = turn(&mut state, "list items", ChatOutcome::Unreachable("refused".into())).unwrap();
        assert_eq!(job.text, BACKEND_UNREACHABLE_TEXT);
        assert!(state.message(job.message_id).unwrap().is_error);

        finish(&mut state, &job);
        let job = turn(&mut state, "list items", ChatOutcome::Unavailable(503)).unwrap();
        assert_eq!(job.text, BACKEND_UNAVAILABLE_TEXT);
        assert!(!state.message(job.message_id).unwrap().is_error);
        assert_eq!(state.disclosure.state(job.message_id), Disclosure::Expanded);
    }

    #[test]
    fn test_empty_reply_text_flows_through() {
        let (mut state, _dir) = state();
        let job = turn(&mut state, "anything", ChatOutcome::Reply(EMPTY_REPLY_TEXT.into())).unwrap();
        assert_eq!(job.text, EMPTY_REPLY_TEXT);
    }

    #[test]
    fn test_aborted_turn_removes_placeholder() {
        let (mut state, _dir) = state();
        assert!(turn(&mut state, "slow question", ChatOutcome::Aborted).is_none());
        assert_eq!(state.messages.len(), 1);
        assert!(state.turn.is_none());
    }

    #[test]
    fn test_stop_while_waiting_cancels_and_drops_late_reply() {
        let (mut state, _dir) = state();
        type_text(&mut state, "slow question");
        let Some(TurnStart::Network(NetworkCommand::Chat { id, cancel, .. })) = state.submit_input() else {
            panic!("expected a network turn");
        };

        state.stop_streaming();
        assert!(cancel.is_cancelled());
        assert!(state.messages.iter().all(|m| !m.is_loading));
        assert!(state.accept_chat(id, ChatOutcome::Reply("late".into())).is_none());
    }

    #[test]
    fn test_stop_during_reveal_keeps_partial_and_drops_queued_updates() {
        let (mut state, _dir) = state();
        let job = turn(&mut state, "list?", ChatOutcome::Reply("one two three".into())).unwrap();
        state.apply_reveal(RevealEvent::Update {
            id: job.message_id,
            content: "one".into(),
        });

        state.stop_streaming();
        assert!(job.cancel.is_cancelled());
        state.apply_reveal(RevealEvent::Update {
            id: job.message_id,
            content: "one two".into(),
        });
        assert_eq!(state.message(job.message_id).unwrap().content, "one");
    }

    #[test]
    fn test_greeting_answered_locally() {
        let (mut state, _dir) = state();
        type_text(&mut state, "Hello there");
        match state.submit_input() {
            Some(TurnStart::Local(job)) => {
                assert_eq!(job.text, GREETING_TEXT);
                assert!(!state.message(job.message_id).unwrap().is_loading);
            }
            other => panic!("expected a local turn, got {other:?}"),
        }
    }

    #[test]
    fn test_second_submit_rejected_while_turn_active() {
        let (mut state, _dir) = state();
        type_text(&mut state, "first");
        assert!(state.submit_input().is_some());
        type_text(&mut state, "second");
        assert!(state.submit_input().is_none());
        assert_eq!(state.input, "second");
    }

    #[test]
    fn test_finished_turn_is_persisted_and_restored_expanded() {
        let (mut state, dir) = state();
        let job = turn(&mut state, "create?", ChatOutcome::Reply(RUNNABLE.into())).unwrap();
        finish(&mut state, &job);

        let restored = AppState::new(Config::default(), Storage::new(dir.path().to_path_buf()));
        assert_eq!(restored.messages.len(), 2);
        assert_eq!(restored.disclosure.state(job.message_id), Disclosure::Expanded);
        assert!(restored.executable.contains(&job.message_id));
    }

    #[test]
    fn test_clear_chat_with_confirmation_and_skip() {
        let (mut state, dir) = state();
        let job = turn(&mut state, "create?", ChatOutcome::Reply(RUNNABLE.into())).unwrap();
        finish(&mut state, &job);

        state.request_clear_chat();
        assert!(state.show_clear_confirm);
        state.toggle_skip_clear_confirm();
        state.confirm_clear();

        assert!(state.messages.is_empty());
        assert!(state.disclosure.is_empty());
        assert!(state.prerequisites.is_empty());
        assert!(state.prefs.skip_clear_confirm);
        assert!(Storage::new(dir.path().to_path_buf()).load_prefs().unwrap().skip_clear_confirm);

        type_text(&mut state, "again");
        state.submit_input();
        state.request_clear_chat();
        assert!(!state.show_clear_confirm);
        assert!(state.messages.is_empty());
    }

    #[test]
    fn test_console_send_and_reply() {
        let (mut state, _dir) = state();
        state.open_console(&synthesize("GET https://api.x.com/items"));
        let Some(NetworkCommand::Proxy { id, request }) = state.send_console() else {
            panic!("expected a proxy command");
        };
        assert_eq!(request.url, "https://api.x.com/items");
        assert!(state.send_console().is_none());

        state.accept_proxy(
            id,
            Ok(ProxyEnvelope {
                transport_status: 200,
                payload: r#"{"status":200,"statusText":"OK","body":"[]"}"#.into(),
            }),
            12,
        );
        let result = state.console.as_ref().and_then(|c| c.result.clone()).unwrap();
        assert_eq!(result.status_line, "200 OK");
        assert_eq!(result.elapsed_ms, 12);
    }

    #[test]
    fn test_console_row_editing_through_input() {
        let (mut state, _dir) = state();
        state.open_console(&RequestDraft::default());
        state.console_field = ConsoleField::Headers;
        state.start_editing();
        type_text(&mut state, "apikey");
        state.next_column();
        type_text(&mut state, "k1");
        state.stop_editing();

        let console = state.console.as_ref().unwrap();
        assert_eq!(console.headers[0].key, "apikey");
        assert_eq!(console.headers[0].value, "k1");
    }

    #[test]
    fn test_preview_section_opens_console() {
        let (mut state, _dir) = state();
        let reply = "See [guide](https://github.com/acme/api/blob/main/docs/items.md).";
        let job = turn(&mut state, "docs?", ChatOutcome::Reply(reply.into())).unwrap();
        finish(&mut state, &job);

        let Some(NetworkCommand::FetchPreview { id, url }) = state.open_preview() else {
            panic!("expected a preview fetch");
        };
        assert_eq!(url, "https://github.com/acme/api/blob/main/docs/items.md");

        let file = FilePreview {
            name: "items.md".into(),
            content: "# Items\n## List\nGET https://api.x.com/items\n## Delete\nDELETE https://api.x.com/items/1\n".into(),
            ..FilePreview::default()
        };
        state.accept_preview(id, Ok(file));
        assert_eq!(state.preview.as_ref().unwrap().headings, vec!["Items", "List", "Delete"]);

        state.next_heading();
        state.next_heading();
        state.select_heading();
        assert!(state.preview.is_none());
        assert_eq!(state.console.as_ref().unwrap().url, "https://api.x.com/items/1");
    }

    #[test]
    fn test_preview_error_is_shown() {
        let (mut state, _dir) = state();
        state.preview = Some(PreviewState::loading(5, "https://github.com/a/b/blob/main/x.md".into()));
        state.accept_preview(5, Err(PreviewError::Rejected("File not found".into())));
        assert_eq!(state.preview.as_ref().unwrap().error.as_deref(), Some("File not found"));
    }
}

//! App state - pure data structure with no I/O logic beyond `Storage`

use std::collections::{HashMap, HashSet};

use crate::app::console::{ExecutionConsole, RowKind};
use crate::app::disclosure::DisclosureStore;
use crate::cancel::CancelToken;
use crate::config::Config;
use crate::extract::{find_headings, is_executable, synthesize, unescape_angles};
use crate::messages::render::{ConsoleView, MessageView, PreviewView};
use crate::messages::ui_events::{ConsoleField, Focus, InputMode, RowColumn};
use crate::messages::RenderState;
use crate::models::{ChatMessage, MessageId};
use crate::network::preview::{file_links, FilePreview};
use crate::storage::{Prefs, Storage};

/// Where the current chat turn is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnPhase {
    /// Waiting on the chat backend
    Waiting,
    /// The reply is being revealed
    Revealing,
}

/// The one chat turn in progress. Its token halts the network call and the reveal alike.
#[derive(Clone, Debug)]
pub struct Turn {
    pub message_id: MessageId,
    pub request_id: Option<u64>,
    pub cancel: CancelToken,
    pub phase: TurnPhase,
}

/// A reply ready to be revealed into `message_id`
#[derive(Clone, Debug)]
pub struct RevealJob {
    pub message_id: MessageId,
    pub text: String,
    pub cancel: CancelToken,
}

/// A linked document being previewed
#[derive(Clone, Debug)]
pub struct PreviewState {
    pub request_id: u64,
    pub url: String,
    pub file: Option<FilePreview>,
    pub error: Option<String>,
    pub headings: Vec<String>,
    pub selected_heading: usize,
    pub scroll: u16,
}

impl PreviewState {
    pub fn loading(request_id: u64, url: String) -> Self {
        PreviewState {
            request_id,
            url,
            file: None,
            error: None,
            headings: Vec::new(),
            selected_heading: 0,
            scroll: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.file.is_none() && self.error.is_none()
    }
}

/// Main application state - pure data, no I/O
pub struct AppState {
    pub config: Config,
    pub storage: Storage,
    pub prefs: Prefs,

    // Transcript and per-message stores
    pub messages: Vec<ChatMessage>,
    pub disclosure: DisclosureStore,
    pub prerequisites: HashMap<MessageId, String>,
    pub executable: HashSet<MessageId>,
    pub linked: HashSet<MessageId>,

    // Chat input
    pub input: String,
    pub cursor_position: usize,
    pub input_mode: InputMode,
    pub selected_message: Option<usize>,
    pub chat_scroll: u16,

    // Turn in progress
    pub turn: Option<Turn>,
    pub next_request_id: u64,

    // Execution console
    pub console: Option<ExecutionConsole>,
    pub console_field: ConsoleField,
    pub selected_row: usize,
    pub row_column: RowColumn,
    pub response_scroll: u16,

    // File preview
    pub preview: Option<PreviewState>,

    // Popups
    pub show_help: bool,
    pub show_clear_confirm: bool,
    pub clear_confirm_skip: bool,

    pub status: Option<String>,
}

impl AppState {
    /// Build the state and restore the saved session. Load failures start a fresh one.
    pub fn new(config: Config, storage: Storage) -> Self {
        let prefs = storage.load_prefs().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load preferences");
            Prefs::default()
        });
        let messages = storage.load_transcript().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load transcript");
            Vec::new()
        });

        let mut state = AppState {
            config,
            storage,
            prefs,
            messages: Vec::new(),
            disclosure: DisclosureStore::new(),
            prerequisites: HashMap::new(),
            executable: HashSet::new(),
            linked: HashSet::new(),
            input: String::new(),
            cursor_position: 0,
            input_mode: InputMode::Editing,
            selected_message: None,
            chat_scroll: 0,
            turn: None,
            next_request_id: 1,
            console: None,
            console_field: ConsoleField::Url,
            selected_row: 0,
            row_column: RowColumn::Key,
            response_scroll: 0,
            preview: None,
            show_help: false,
            show_clear_confirm: false,
            clear_confirm_skip: false,
            status: None,
        };
        state.restore(messages);
        state
    }

    /// Restored messages are classified but never gated
    fn restore(&mut self, messages: Vec<ChatMessage>) {
        for message in &messages {
            if message.is_assistant() && !message.is_error {
                self.classify(message.id, &message.content);
            }
        }
        tracing::info!(count = messages.len(), "Restored transcript");
        self.messages = messages;
    }

    /// Cache executability, prerequisites and file links for a finished reply
    pub fn classify(&mut self, id: MessageId, text: &str) -> bool {
        let executable = is_executable(text);
        let prerequisites = if executable {
            synthesize(text).prerequisites
        } else {
            String::new()
        };
        tracing::debug!(%id, executable, has_prerequisites = !prerequisites.is_empty(), "Classified reply");

        if executable {
            self.executable.insert(id);
        }
        if !file_links(text).is_empty() {
            self.linked.insert(id);
        }
        self.prerequisites.insert(id, prerequisites);
        executable
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    pub fn focus(&self) -> Focus {
        if self.preview.is_some() {
            Focus::Preview
        } else if self.console.is_some() {
            Focus::Console
        } else {
            Focus::Chat
        }
    }

    pub fn message(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn message_mut(&mut self, id: MessageId) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// The selected message, or the latest assistant reply when nothing is selected
    pub fn target_message(&self) -> Option<&ChatMessage> {
        match self.selected_message {
            Some(index) => self.messages.get(index),
            None => self.messages.iter().rev().find(|m| m.is_assistant()),
        }
    }

    pub fn streaming_id(&self) -> Option<MessageId> {
        self.turn
            .as_ref()
            .filter(|turn| turn.phase == TurnPhase::Revealing)
            .map(|turn| turn.message_id)
    }

    /// The row list behind the focused console field
    pub fn row_kind(&self) -> Option<RowKind> {
        match self.console_field {
            ConsoleField::Params => Some(RowKind::Param),
            ConsoleField::Headers => Some(RowKind::Header),
            _ => None,
        }
    }

    /// Get the current input field content
    pub fn current_input(&self) -> &str {
        if self.focus() != Focus::Console {
            return &self.input;
        }
        let Some(console) = &self.console else {
            return &self.input;
        };
        match self.console_field {
            ConsoleField::Url => &console.url,
            ConsoleField::Body => &console.body,
            ConsoleField::Params | ConsoleField::Headers => {
                let rows = match self.console_field {
                    ConsoleField::Params => &console.params,
                    _ => &console.headers,
                };
                match (rows.get(self.selected_row), self.row_column) {
                    (Some(row), RowColumn::Key) => &row.key,
                    (Some(row), RowColumn::Value) => &row.value,
                    (None, _) => "",
                }
            }
            ConsoleField::Method | ConsoleField::Response => "",
        }
    }

    /// Get mutable reference to current input field
    pub fn current_input_mut(&mut self) -> Option<&mut String> {
        if self.focus() != Focus::Console {
            return Some(&mut self.input);
        }
        let field = self.console_field;
        let column = self.row_column;
        let index = self.selected_row;
        let kind = self.row_kind();
        let console = self.console.as_mut()?;
        match field {
            ConsoleField::Url => Some(&mut console.url),
            ConsoleField::Body => Some(&mut console.body),
            ConsoleField::Params | ConsoleField::Headers => {
                let row = console.row_mut(kind?, index)?;
                Some(match column {
                    RowColumn::Key => &mut row.key,
                    RowColumn::Value => &mut row.value,
                })
            }
            ConsoleField::Method | ConsoleField::Response => None,
        }
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        let streaming_id = self.streaming_id();
        let messages = self
            .messages
            .iter()
            .map(|m| MessageView {
                id: m.id,
                role: m.role,
                content: unescape_angles(&m.content),
                disclosure: self.disclosure.state(m.id),
                prerequisites: self.prerequisites.get(&m.id).cloned().unwrap_or_default(),
                executable: self.executable.contains(&m.id),
                has_file_link: self.linked.contains(&m.id),
                is_error: m.is_error,
                is_loading: m.is_loading,
                is_streaming: streaming_id == Some(m.id),
            })
            .collect();

        let console = self.console.as_ref().map(|c| ConsoleView {
            method: c.method,
            url: c.url.clone(),
            final_url: c.build_final_url(),
            params: c.params.clone(),
            headers: c.headers.clone(),
            body: c.body.clone(),
            auto_format_json: c.auto_format_json,
            busy: c.is_busy(),
            error: c.error.clone(),
            result: c.result.clone(),
            curl_export: c.curl_export.clone(),
            warnings: c.warnings(),
            field: self.console_field,
            selected_row: self.selected_row,
            column: self.row_column,
            response_scroll: self.response_scroll,
        });

        let preview = self.preview.as_ref().map(|p| PreviewView {
            title: p
                .file
                .as_ref()
                .map(|f| f.title().to_string())
                .unwrap_or_else(|| "Loading…".to_string()),
            location: p
                .file
                .as_ref()
                .filter(|f| !f.repository.is_empty())
                .map(|f| format!("{} @ {}", f.repository, f.branch))
                .unwrap_or_else(|| p.url.clone()),
            content: p.file.as_ref().map(|f| f.content.clone()).unwrap_or_default(),
            headings: p.headings.clone(),
            selected_heading: p.selected_heading,
            loading: p.is_loading(),
            error: p.error.clone(),
            scroll: p.scroll,
        });

        RenderState {
            messages,
            selected_message: self.selected_message,
            chat_scroll: self.chat_scroll,
            is_waiting: self
                .turn
                .as_ref()
                .is_some_and(|turn| turn.phase == TurnPhase::Waiting),
            is_streaming: streaming_id.is_some(),
            input: self.input.clone(),
            cursor_position: self.cursor_position,
            input_mode: self.input_mode,
            focus: self.focus(),
            console,
            preview,
            show_help: self.show_help,
            show_clear_confirm: self.show_clear_confirm,
            clear_confirm_skip: self.clear_confirm_skip,
            status: self.status.clone(),
        }
    }
}

/// Heading titles offered by the preview's section picker
pub fn preview_headings(content: &str) -> Vec<String> {
    find_headings(content)
        .into_iter()
        .map(|heading| heading.title)
        .collect()
}

//! Render state - data structure sent from App layer to UI for rendering

use crate::app::disclosure::Disclosure;
use crate::messages::ui_events::{ConsoleField, Focus, InputMode, RowColumn};
use crate::models::{ExecutionResult, HttpMethod, KeyValue, MessageId, Role};

/// One transcript entry as the UI should draw it
#[derive(Debug, Clone)]
pub struct MessageView {
    pub id: MessageId,
    pub role: Role,
    /// Display text with escaped angle brackets restored
    pub content: String,
    pub disclosure: Disclosure,
    /// Shown above the Manual / Automatic choice while hidden
    pub prerequisites: String,
    pub executable: bool,
    pub has_file_link: bool,
    pub is_error: bool,
    pub is_loading: bool,
    pub is_streaming: bool,
}

#[derive(Debug, Clone)]
pub struct ConsoleView {
    pub method: HttpMethod,
    pub url: String,
    pub final_url: String,
    pub params: Vec<KeyValue>,
    pub headers: Vec<KeyValue>,
    pub body: String,
    pub auto_format_json: bool,
    pub busy: bool,
    pub error: Option<String>,
    pub result: Option<ExecutionResult>,
    pub curl_export: Option<String>,
    pub warnings: Vec<&'static str>,
    pub field: ConsoleField,
    pub selected_row: usize,
    pub column: RowColumn,
    pub response_scroll: u16,
}

#[derive(Debug, Clone)]
pub struct PreviewView {
    pub title: String,
    pub location: String,
    pub content: String,
    pub headings: Vec<String>,
    pub selected_heading: usize,
    pub loading: bool,
    pub error: Option<String>,
    pub scroll: u16,
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    // Transcript
    pub messages: Vec<MessageView>,
    pub selected_message: Option<usize>,
    /// Lines scrolled up from the bottom of the transcript
    pub chat_scroll: u16,
    pub is_waiting: bool,
    pub is_streaming: bool,

    // Input line
    pub input: String,
    pub cursor_position: usize,
    pub input_mode: InputMode,
    pub focus: Focus,

    // Overlays
    pub console: Option<ConsoleView>,
    pub preview: Option<PreviewView>,

    // Popups
    pub show_help: bool,
    pub show_clear_confirm: bool,
    pub clear_confirm_skip: bool,

    /// One-line notice in the status bar
    pub status: Option<String>,
}

impl RenderState {
    pub fn console_field(&self) -> ConsoleField {
        self.console
            .as_ref()
            .map(|console| console.field)
            .unwrap_or_default()
    }
}

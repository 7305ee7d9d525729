//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    // Input editing (chat input or the focused console field)
    StartEditing,
    StopEditing,
    CharInput(char),
    InsertNewline,
    Backspace,
    CursorLeft,
    CursorRight,

    // Chat
    Submit,
    StopStreaming,
    SelectPrev,
    SelectNext,
    ScrollUp,
    ScrollDown,

    // Disclosure
    ChooseManual,
    ChooseAutomatic,
    ToggleCollapse,
    Execute,

    // Execution console
    NextField,
    PrevField,
    CycleMethod,
    NextRow,
    PrevRow,
    AddRow,
    RemoveRow,
    ToggleRow,
    NextColumn,
    SendRequest,
    ToggleAutoFormat,
    ExportCurl,
    CloseConsole,

    // File preview
    OpenPreview,
    PrevHeading,
    NextHeading,
    SelectHeading,
    ClosePreview,

    // Clear chat
    RequestClearChat,
    ConfirmClear,
    CancelClear,
    ToggleSkipClearConfirm,

    // Popups
    ToggleHelp,
    CloseHelp,

    // System
    Quit,
}

/// Which surface receives keys
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Focus {
    #[default]
    Chat,
    Console,
    Preview,
}

/// Focused field of the execution console
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ConsoleField {
    Method,
    #[default]
    Url,
    Params,
    Headers,
    Body,
    Response,
}

impl ConsoleField {
    pub fn next(&self) -> ConsoleField {
        match self {
            ConsoleField::Method => ConsoleField::Url,
            ConsoleField::Url => ConsoleField::Params,
            ConsoleField::Params => ConsoleField::Headers,
            ConsoleField::Headers => ConsoleField::Body,
            ConsoleField::Body => ConsoleField::Response,
            ConsoleField::Response => ConsoleField::Method,
        }
    }

    pub fn prev(&self) -> ConsoleField {
        match self {
            ConsoleField::Method => ConsoleField::Response,
            ConsoleField::Url => ConsoleField::Method,
            ConsoleField::Params => ConsoleField::Url,
            ConsoleField::Headers => ConsoleField::Params,
            ConsoleField::Body => ConsoleField::Headers,
            ConsoleField::Response => ConsoleField::Body,
        }
    }

    pub fn is_rows(&self) -> bool {
        matches!(self, ConsoleField::Params | ConsoleField::Headers)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ConsoleField::Url | ConsoleField::Body)
    }
}

/// Which half of a key/value row is being edited
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RowColumn {
    #[default]
    Key,
    Value,
}

impl RowColumn {
    pub fn toggle(&self) -> RowColumn {
        match self {
            RowColumn::Key => RowColumn::Value,
            RowColumn::Value => RowColumn::Key,
        }
    }
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(
    key: KeyEvent,
    focus: Focus,
    console_field: ConsoleField,
    input_mode: InputMode,
    show_help: bool,
    show_clear_confirm: bool,
) -> Option<UiEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    // Global Ctrl shortcuts
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return Some(UiEvent::Quit),
            KeyCode::Char('x') => return Some(UiEvent::StopStreaming),
            KeyCode::Char('l') if focus == Focus::Chat => return Some(UiEvent::RequestClearChat),
            _ => {}
        }
    }

    // Popups take every key first
    if show_help {
        return Some(UiEvent::CloseHelp);
    }

    if show_clear_confirm {
        return match key.code {
            KeyCode::Char('y') | KeyCode::Enter => Some(UiEvent::ConfirmClear),
            KeyCode::Char('n') | KeyCode::Esc => Some(UiEvent::CancelClear),
            KeyCode::Char('s') | KeyCode::Char(' ') => Some(UiEvent::ToggleSkipClearConfirm),
            _ => None,
        };
    }

    match focus {
        Focus::Chat => handle_chat_keys(key, input_mode),
        Focus::Console => handle_console_keys(key, console_field, input_mode),
        Focus::Preview => handle_preview_keys(key),
    }
}

/// Handle keys for the chat transcript and input line
fn handle_chat_keys(key: KeyEvent, input_mode: InputMode) -> Option<UiEvent> {
    match input_mode {
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => Some(UiEvent::Quit),
            KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
            KeyCode::Char('i') | KeyCode::Enter => Some(UiEvent::StartEditing),
            KeyCode::Up | KeyCode::Char('k') => Some(UiEvent::SelectPrev),
            KeyCode::Down | KeyCode::Char('j') => Some(UiEvent::SelectNext),
            KeyCode::PageUp => Some(UiEvent::ScrollUp),
            KeyCode::PageDown => Some(UiEvent::ScrollDown),
            KeyCode::Char('m') => Some(UiEvent::ChooseManual),
            KeyCode::Char('a') => Some(UiEvent::ChooseAutomatic),
            KeyCode::Char('c') => Some(UiEvent::ToggleCollapse),
            KeyCode::Char('x') => Some(UiEvent::Execute),
            KeyCode::Char('p') => Some(UiEvent::OpenPreview),
            KeyCode::Char('s') | KeyCode::Esc => Some(UiEvent::StopStreaming),
            _ => None,
        },
        InputMode::Editing => match key.code {
            KeyCode::Esc => Some(UiEvent::StopEditing),
            KeyCode::Enter => Some(UiEvent::Submit),
            KeyCode::Left => Some(UiEvent::CursorLeft),
            KeyCode::Right => Some(UiEvent::CursorRight),
            KeyCode::Backspace => Some(UiEvent::Backspace),
            KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
            _ => None,
        },
    }
}

/// Handle keys for the execution console
fn handle_console_keys(key: KeyEvent, field: ConsoleField, input_mode: InputMode) -> Option<UiEvent> {
    match input_mode {
        InputMode::Normal => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(UiEvent::CloseConsole),
            KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
            KeyCode::Tab => Some(UiEvent::NextField),
            KeyCode::BackTab => Some(UiEvent::PrevField),
            KeyCode::Char('m') => Some(UiEvent::CycleMethod),
            KeyCode::Char('s') => Some(UiEvent::SendRequest),
            KeyCode::Char('f') => Some(UiEvent::ToggleAutoFormat),
            KeyCode::Char('c') => Some(UiEvent::ExportCurl),
            KeyCode::Char('e') | KeyCode::Enter => match field {
                ConsoleField::Method => Some(UiEvent::CycleMethod),
                ConsoleField::Response => None,
                _ => Some(UiEvent::StartEditing),
            },
            KeyCode::Up => match field {
                ConsoleField::Params | ConsoleField::Headers => Some(UiEvent::PrevRow),
                ConsoleField::Response => Some(UiEvent::ScrollUp),
                _ => None,
            },
            KeyCode::Down => match field {
                ConsoleField::Params | ConsoleField::Headers => Some(UiEvent::NextRow),
                ConsoleField::Response => Some(UiEvent::ScrollDown),
                _ => None,
            },
            KeyCode::PageUp => Some(UiEvent::ScrollUp),
            KeyCode::PageDown => Some(UiEvent::ScrollDown),
            KeyCode::Char('a') if field.is_rows() => Some(UiEvent::AddRow),
            KeyCode::Char('d') if field.is_rows() => Some(UiEvent::RemoveRow),
            KeyCode::Char(' ') if field.is_rows() => Some(UiEvent::ToggleRow),
            _ => None,
        },
        InputMode::Editing => match key.code {
            KeyCode::Esc => Some(UiEvent::StopEditing),
            KeyCode::Left => Some(UiEvent::CursorLeft),
            KeyCode::Right => Some(UiEvent::CursorRight),
            KeyCode::Backspace => Some(UiEvent::Backspace),
            KeyCode::Tab if field.is_rows() => Some(UiEvent::NextColumn),
            KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
            KeyCode::Enter => match field {
                ConsoleField::Url => Some(UiEvent::SendRequest),
                ConsoleField::Body => Some(UiEvent::InsertNewline),
                _ => Some(UiEvent::StopEditing),
            },
            _ => None,
        },
    }
}

/// Handle keys for the file preview
fn handle_preview_keys(key: KeyEvent) -> Option<UiEvent> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(UiEvent::ClosePreview),
        KeyCode::Up | KeyCode::Char('k') => Some(UiEvent::PrevHeading),
        KeyCode::Down | KeyCode::Char('j') => Some(UiEvent::NextHeading),
        KeyCode::Enter => Some(UiEvent::SelectHeading),
        KeyCode::PageUp => Some(UiEvent::ScrollUp),
        KeyCode::PageDown => Some(UiEvent::ScrollDown),
        _ => None,
    }
}

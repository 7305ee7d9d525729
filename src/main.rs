//! apiscribe - terminal chat companion for AI-written API instructions
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - chat, proxy and file preview calls

use std::io;
use std::time::Duration;

use anyhow::Context;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use apiscribe::app::{AppActor, AppState, Disclosure};
use apiscribe::config::Config;
use apiscribe::constants::{APP_NAME, LOG_FILE_NAME};
use apiscribe::messages::render::{ConsoleView, MessageView, PreviewView};
use apiscribe::messages::ui_events::{key_to_ui_event, ConsoleField, Focus, InputMode};
use apiscribe::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
use apiscribe::models::Role;
use apiscribe::network::NetworkActor;
use apiscribe::storage::Storage;
use apiscribe::ui::{
    field_block, highlight_json, markdown_lines, method_color, render_rows, render_tabs,
    status_code, status_color,
};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging to file; the terminal belongs to the UI
    std::fs::create_dir_all(config.log_dir())
        .with_context(|| format!("Failed to create log directory {}", config.log_dir().display()))?;
    let file_appender = tracing_appender::rolling::never(config.log_dir(), LOG_FILE_NAME);
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    tracing::info!(chat_url = %config.chat_url(), proxy_url = %config.proxy_url(), "Starting {}", APP_NAME);

    let storage = Storage::new(Config::config_dir());
    let state = AppState::new(config.clone(), storage);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let network_actor = NetworkActor::new(&config, net_resp_tx);
    tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(state, net_cmd_tx, render_tx);
    let app_handle = tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    // Let the app actor stop the reveal and flush the transcript
    if tokio::time::timeout(Duration::from_secs(2), app_handle).await.is_err() {
        tracing::warn!("App actor did not shut down in time");
    }
    tracing::info!("Exiting");

    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        terminal.draw(|f| draw_ui(f, &current_state))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(
                    key,
                    current_state.focus,
                    current_state.console_field(),
                    current_state.input_mode,
                    current_state.show_help,
                    current_state.show_clear_confirm,
                ) {
                    let quit = matches!(event, UiEvent::Quit);
                    let _ = ui_tx.send(event);
                    if quit {
                        break;
                    }
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Transcript
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_transcript(f, state, chunks[0]);
    draw_input(f, state, chunks[1]);
    draw_status_bar(f, state, chunks[2]);

    if let Some(console) = &state.console {
        draw_console(f, state, console, centered_rect(92, 92, area));
    }
    if let Some(preview) = &state.preview {
        draw_preview(f, preview, centered_rect(85, 85, area));
    }

    // Popups
    if state.show_help {
        draw_help_popup(f, area);
    }
    if state.show_clear_confirm {
        draw_clear_confirm_popup(f, state, area);
    }
}

fn draw_transcript(f: &mut Frame, state: &RenderState, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    for (index, message) in state.messages.iter().enumerate() {
        let selected = state.selected_message == Some(index);
        lines.push(message_header(message, selected));
        lines.extend(message_body(message));
        lines.push(Line::raw(""));
    }

    if lines.is_empty() {
        lines.push(Line::styled(
            "Ask about an API. Executable answers can be run from the console.",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if state.focus == Focus::Chat && state.input_mode == InputMode::Normal {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        })
        .title(format!(" {} ", APP_NAME));

    // Anchored to the bottom; chat_scroll counts lines back up
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    let total = wrapped_height(&lines, inner_width);
    let offset = total
        .saturating_sub(inner_height)
        .saturating_sub(state.chat_scroll);

    let transcript = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    f.render_widget(transcript, area);
}

fn message_header(message: &MessageView, selected: bool) -> Line<'static> {
    let marker = if selected { "▶ " } else { "  " };
    let (name, color) = match message.role {
        Role::User => ("You", Color::Cyan),
        Role::Assistant if message.is_error => ("Assistant", Color::Red),
        Role::Assistant => ("Assistant", Color::Green),
    };

    let mut spans = vec![
        Span::styled(marker, Style::default().fg(Color::Yellow)),
        Span::styled(name, Style::default().fg(color).bold()),
    ];
    if message.is_streaming {
        spans.push(Span::styled(" ●", Style::default().fg(Color::Yellow)));
    }
    if message.disclosure == Disclosure::Collapsed {
        spans.push(Span::styled(" [collapsed]", Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}

fn message_body(message: &MessageView) -> Vec<Line<'static>> {
    if message.is_loading && message.content.is_empty() {
        return vec![Line::styled("  Thinking…", Style::default().fg(Color::DarkGray).italic())];
    }
    if message.role == Role::User {
        return message
            .content
            .lines()
            .map(|line| Line::raw(format!("  {}", line)))
            .collect();
    }

    match message.disclosure {
        Disclosure::Hidden => {
            let mut lines = Vec::new();
            if !message.prerequisites.trim().is_empty() {
                lines.extend(markdown_lines(&message.prerequisites));
                lines.push(Line::raw(""));
            }
            lines.push(Line::from(vec![
                Span::styled("  This answer describes a runnable request.  ", Style::default().fg(Color::Gray)),
                Span::styled("[m] Manual", Style::default().fg(Color::Cyan).bold()),
                Span::raw("  "),
                Span::styled("[a] Automatic", Style::default().fg(Color::Green).bold()),
            ]));
            lines
        }
        Disclosure::Collapsed => {
            let first = message
                .content
                .lines()
                .find(|line| !line.trim().is_empty())
                .unwrap_or_default()
                .trim_start_matches('#')
                .trim();
            vec![Line::styled(
                format!("  {} …", first),
                Style::default().fg(Color::DarkGray),
            )]
        }
        Disclosure::Expanded => {
            let mut lines = markdown_lines(&message.content);
            if message.is_error {
                for line in &mut lines {
                    line.style = Style::default().fg(Color::Red);
                }
            }
            if !message.is_streaming {
                let mut hints = Vec::new();
                if message.executable {
                    hints.push(Span::styled("[x] Execute  ", Style::default().fg(Color::Green)));
                }
                if message.has_file_link {
                    hints.push(Span::styled("[p] Preview file", Style::default().fg(Color::Blue)));
                }
                if !hints.is_empty() {
                    lines.push(Line::from(hints));
                }
            }
            lines
        }
    }
}

/// Rows a set of lines occupies once wrapped to `width`
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    let total: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(width as usize).max(1))
        .sum();
    u16::try_from(total).unwrap_or(u16::MAX)
}

fn draw_input(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.focus == Focus::Chat;
    let is_editing = is_focused && state.input_mode == InputMode::Editing;
    let title = if state.is_waiting {
        " Message (waiting for reply…) "
    } else if state.is_streaming {
        " Message (Ctrl+X to stop) "
    } else {
        " Message "
    };

    let input = Paragraph::new(state.input.as_str()).block(field_block(title, is_focused, is_editing));
    f.render_widget(input, area);

    if is_editing {
        set_cursor(f, area, state.cursor_position);
    }
}

fn set_cursor(f: &mut Frame, area: Rect, position: usize) {
    let max_x = area.x + area.width.saturating_sub(2);
    let cursor_x = (area.x + position as u16 + 1).min(max_x);
    f.set_cursor_position(Position::new(cursor_x, area.y + 1));
}

fn draw_console(f: &mut Frame, state: &RenderState, console: &ConsoleView, area: Rect) {
    f.render_widget(Clear, area);

    let title = if console.busy {
        " Execution Console [sending…] "
    } else {
        " Execution Console "
    };
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(title)
        .title_bottom(
            Line::from(" Tab:field  e:edit  m:method  s:send  f:format  c:curl  Esc:close ").right_aligned(),
        );
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let banner_height = (console.warnings.len() + usize::from(console.error.is_some())) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // Field tabs
            Constraint::Length(3),             // Method + URL
            Constraint::Length(1),             // Final URL
            Constraint::Length(banner_height), // Warnings / error
            Constraint::Length(6),             // Params + Headers
            Constraint::Length(6),             // Body
            Constraint::Min(5),                // Response
        ])
        .split(inner);

    let fields = ["Method", "URL", "Params", "Headers", "Body", "Response"];
    let selected = match console.field {
        ConsoleField::Method => 0,
        ConsoleField::Url => 1,
        ConsoleField::Params => 2,
        ConsoleField::Headers => 3,
        ConsoleField::Body => 4,
        ConsoleField::Response => 5,
    };
    f.render_widget(render_tabs(&fields, selected), chunks[0]);

    draw_url_bar(f, state, console, chunks[1]);

    let final_url = Line::from(vec![
        Span::styled(" → ", Style::default().fg(Color::DarkGray)),
        Span::styled(console.final_url.clone(), Style::default().fg(Color::Gray)),
    ]);
    f.render_widget(Paragraph::new(final_url), chunks[2]);

    let mut banner: Vec<Line> = console
        .warnings
        .iter()
        .map(|w| Line::styled(format!(" ⚠ {}", w), Style::default().fg(Color::Yellow)))
        .collect();
    if let Some(error) = &console.error {
        banner.push(Line::styled(format!(" ✗ {}", error), Style::default().fg(Color::Red).bold()));
    }
    f.render_widget(Paragraph::new(banner), chunks[3]);

    let rows = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[4]);
    let params_focused = console.field == ConsoleField::Params;
    let headers_focused = console.field == ConsoleField::Headers;
    f.render_widget(
        render_rows(
            &console.params,
            " Query Params (a:add d:del space:toggle) ",
            Some(console.selected_row),
            console.column,
            params_focused,
        ),
        rows[0],
    );
    f.render_widget(
        render_rows(
            &console.headers,
            " Headers (a:add d:del space:toggle) ",
            Some(console.selected_row),
            console.column,
            headers_focused,
        ),
        rows[1],
    );

    draw_body(f, state, console, chunks[5]);
    draw_response(f, console, chunks[6]);
}

fn draw_url_bar(f: &mut Frame, state: &RenderState, console: &ConsoleView, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(11), Constraint::Min(10)])
        .split(area);

    let method_focused = console.field == ConsoleField::Method;
    let method = Paragraph::new(Span::styled(
        console.method.as_str(),
        Style::default().fg(method_color(console.method)).bold(),
    ))
    .block(field_block(" Method ", method_focused, false));
    f.render_widget(method, chunks[0]);

    let url_focused = console.field == ConsoleField::Url;
    let editing = state.input_mode == InputMode::Editing;
    let url = Paragraph::new(console.url.as_str()).block(field_block(" URL ", url_focused, editing));
    f.render_widget(url, chunks[1]);

    if url_focused && editing {
        set_cursor(f, chunks[1], state.cursor_position);
    }
}

fn draw_body(f: &mut Frame, state: &RenderState, console: &ConsoleView, area: Rect) {
    let is_focused = console.field == ConsoleField::Body;
    let editing = is_focused && state.input_mode == InputMode::Editing;
    let title = if console.method.has_body() {
        " Body "
    } else {
        " Body (not sent for this method) "
    };

    let body = Paragraph::new(console.body.as_str())
        .block(field_block(title, is_focused, editing))
        .wrap(Wrap { trim: false });
    f.render_widget(body, area);
}

fn draw_response(f: &mut Frame, console: &ConsoleView, area: Rect) {
    let is_focused = console.field == ConsoleField::Response;

    if let Some(curl) = &console.curl_export {
        let block = field_block(" cURL ", is_focused, false);
        let text = Paragraph::new(curl.as_str())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((console.response_scroll, 0));
        f.render_widget(text, area);
        return;
    }

    let Some(result) = &console.result else {
        let hint = if console.busy { "Sending…" } else { "Press s to send the request" };
        let text = Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray)))
            .block(field_block(" Response ", is_focused, false));
        f.render_widget(text, area);
        return;
    };

    let color = status_code(&result.status_line)
        .map(status_color)
        .unwrap_or(Color::Yellow);
    let block = field_block(
        Line::from(Span::styled(format!(" {} ", result.status_line), Style::default().fg(color).bold())),
        is_focused,
        false,
    )
    .title_bottom(
        Line::from(format!(" {}ms · {} chars ", result.elapsed_ms, result.size_chars)).right_aligned(),
    );

    let mut lines: Vec<Line> = result
        .headers
        .iter()
        .map(|h| {
            Line::from(vec![
                Span::styled(format!("{}: ", h.key), Style::default().fg(Color::Cyan)),
                Span::styled(h.value.clone(), Style::default().fg(Color::Gray)),
            ])
        })
        .collect();
    if !lines.is_empty() {
        lines.push(Line::raw(""));
    }
    lines.extend(highlight_json(&result.body));

    let response = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((console.response_scroll, 0));
    f.render_widget(response, area);
}

fn draw_preview(f: &mut Frame, preview: &PreviewView, area: Rect) {
    f.render_widget(Clear, area);

    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(format!(" {} ", preview.title))
        .title_bottom(Line::from(" ↑/↓:heading  Enter:run section  PgUp/PgDn:scroll  Esc:close ").right_aligned());
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(inner);
    f.render_widget(
        Paragraph::new(Span::styled(preview.location.clone(), Style::default().fg(Color::DarkGray))),
        chunks[0],
    );

    if preview.loading {
        f.render_widget(Paragraph::new("Loading file…"), chunks[1]);
        return;
    }
    if let Some(error) = &preview.error {
        f.render_widget(
            Paragraph::new(Span::styled(error.clone(), Style::default().fg(Color::Red)))
                .wrap(Wrap { trim: false }),
            chunks[1],
        );
        return;
    }

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[1]);

    let items: Vec<ListItem> = preview
        .headings
        .iter()
        .map(|h| ListItem::new(h.as_str()))
        .collect();
    let headings = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Sections "))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .highlight_symbol("▶ ");
    let mut list_state = ListState::default();
    if !preview.headings.is_empty() {
        list_state.select(Some(preview.selected_heading));
    }
    f.render_stateful_widget(headings, panes[0], &mut list_state);

    let content = Paragraph::new(markdown_lines(&preview.content))
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((preview.scroll, 0));
    f.render_widget(content, panes[1]);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let status = if let Some(status) = &state.status {
        format!(" {} ", status)
    } else if state.is_waiting {
        " Waiting for the assistant… (Ctrl+X to cancel) ".to_string()
    } else if state.input_mode == InputMode::Editing {
        " Enter:send | Esc:stop editing | Ctrl+X:stop reply ".to_string()
    } else {
        match state.focus {
            Focus::Chat => " i:type | ↑/↓:select | m/a:manual/auto | x:execute | p:preview | c:collapse | Ctrl+L:clear | ?:help | q:quit ",
            Focus::Console => " Tab:field | e:edit | s:send | Esc:close ",
            Focus::Preview => " Enter:run section | Esc:close ",
        }
        .to_string()
    };

    let bar = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 75, area);

    let help_text = r#"
 APISCRIBE - Keyboard Shortcuts

 CHAT
   i / Enter          Start typing, Enter sends
   Esc                Stop typing
   ↑ / ↓              Select message (↓ past the end follows the chat)
   PgUp / PgDn        Scroll transcript
   Ctrl+X / s         Stop the reply in progress
   Ctrl+L             Clear chat

 RUNNABLE ANSWERS
   m                  Manual: show the full instructions
   a                  Automatic: open the execution console
   x                  Execute an expanded answer
   c                  Collapse / expand a message
   p                  Preview the linked file

 EXECUTION CONSOLE
   Tab / Shift+Tab    Switch field
   e / Enter          Edit field (cycles the method on Method)
   m                  Cycle HTTP method
   a / d / space      Add, delete, toggle a row
   Tab (editing row)  Switch key / value
   s                  Send through the proxy
   f                  Toggle JSON formatting
   c                  Export as cURL
   Esc / q            Close

 GENERAL
   ?                  Toggle this help
   q / Ctrl+C         Quit

 Press any key to close...
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn draw_clear_confirm_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(50, 25, area);

    let checkbox = if state.clear_confirm_skip { "[x]" } else { "[ ]" };
    let lines = vec![
        Line::raw(""),
        Line::raw(" Clear the whole conversation?"),
        Line::raw(""),
        Line::styled(
            format!(" {} Don't ask again (s)", checkbox),
            Style::default().fg(Color::Gray),
        ),
        Line::raw(""),
        Line::from(vec![
            Span::styled(" [y] Clear ", Style::default().fg(Color::Red).bold()),
            Span::raw("  "),
            Span::styled("[n] Cancel ", Style::default().fg(Color::Cyan)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Clear chat ")
        .style(Style::default().bg(Color::Black));

    f.render_widget(Clear, popup_area);
    f.render_widget(Paragraph::new(lines).block(block), popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

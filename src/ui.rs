//! Reusable widgets and text styling for the terminal UI

use ratatui::{prelude::*, widgets::*};

use crate::messages::ui_events::RowColumn;
use crate::models::{HttpMethod, KeyValue};

/// Bordered block for a text field; yellow while editing, cyan while focused
pub fn field_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, is_editing: bool) -> Block<'a> {
    let border_style = if is_focused && is_editing {
        Style::default().fg(Color::Yellow)
    } else if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
}

/// Renders an editable key/value list (query params or headers)
pub fn render_rows<'a>(
    rows: &'a [KeyValue],
    title: &'a str,
    selected: Option<usize>,
    column: RowColumn,
    is_focused: bool,
) -> List<'a> {
    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let is_selected = is_focused && Some(i) == selected;
            let base = if !row.enabled {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            let cell = |text: &'a str, col: RowColumn| {
                let shown = if text.is_empty() { "…" } else { text };
                if is_selected && col == column {
                    Span::styled(shown, base.fg(Color::Yellow).bold())
                } else {
                    Span::styled(shown, base)
                }
            };

            let prefix = if row.enabled { "[x] " } else { "[ ] " };
            ListItem::new(Line::from(vec![
                Span::styled(prefix, base),
                cell(&row.key, RowColumn::Key),
                Span::styled(": ", base),
                cell(&row.value, RowColumn::Value),
            ]))
        })
        .collect();

    List::new(items).block(field_block(title, is_focused, false))
}

/// Renders tabs
pub fn render_tabs<'a>(titles: &[&'a str], selected: usize) -> Tabs<'a> {
    let titles: Vec<Line> = titles.iter().map(|t| Line::from(*t)).collect();

    Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .divider("|")
}

/// Line-level Markdown styling for chat messages
///
/// Headings are bold cyan, fenced blocks green, list leaders yellow and
/// horizontal rules dimmed. Inline `code` spans are highlighted.
pub fn markdown_lines(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_fence = false;

    for raw in text.lines() {
        let trimmed = raw.trim_start();

        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            lines.push(Line::styled(
                raw.to_string(),
                Style::default().fg(Color::DarkGray),
            ));
            continue;
        }
        if in_fence {
            lines.push(Line::styled(
                raw.to_string(),
                Style::default().fg(Color::Green),
            ));
            continue;
        }

        let hashes = trimmed.chars().take_while(|c| *c == '#').count();
        if (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ') {
            lines.push(Line::styled(
                trimmed[hashes..].trim().to_string(),
                Style::default().fg(Color::Cyan).bold(),
            ));
            continue;
        }

        if matches!(trimmed, "---" | "***" | "___") {
            lines.push(Line::styled(
                "─".repeat(24),
                Style::default().fg(Color::DarkGray),
            ));
            continue;
        }

        let indent = &raw[..raw.len() - trimmed.len()];
        let mut spans = vec![Span::raw(indent.to_string())];
        let rest = match list_leader(trimmed) {
            Some(leader) => {
                spans.push(Span::styled(
                    leader.to_string(),
                    Style::default().fg(Color::Yellow),
                ));
                &trimmed[leader.len()..]
            }
            None => trimmed,
        };
        spans.extend(inline_spans(rest));
        lines.push(Line::from(spans));
    }

    lines
}

/// `- `, `* ` or `12. ` at the start of a line
fn list_leader(line: &str) -> Option<&str> {
    if line.starts_with("- ") || line.starts_with("* ") {
        return Some(&line[..2]);
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 && line[digits..].starts_with(". ") {
        return Some(&line[..digits + 2]);
    }
    None
}

fn inline_spans(text: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, part) in text.split('`').enumerate() {
        if part.is_empty() {
            continue;
        }
        if i % 2 == 1 {
            spans.push(Span::styled(
                part.to_string(),
                Style::default().fg(Color::Magenta),
            ));
        } else {
            spans.push(Span::raw(part.to_string()));
        }
    }
    spans
}

/// Simple JSON syntax highlighting
pub fn highlight_json(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for line in text.lines() {
        let mut spans = Vec::new();
        let mut current = String::new();
        let mut in_string = false;
        let mut is_key = false;
        let mut escaped = false;

        for (offset, c) in line.char_indices() {
            if in_string {
                current.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    let color = if is_key { Color::Cyan } else { Color::Green };
                    spans.push(Span::styled(
                        std::mem::take(&mut current),
                        Style::default().fg(color),
                    ));
                    in_string = false;
                }
                continue;
            }

            match c {
                '"' => {
                    flush(&mut spans, &mut current);
                    in_string = true;
                    current.push(c);
                    is_key = closes_as_key(&line[offset + 1..]);
                }
                ':' | ',' => {
                    flush(&mut spans, &mut current);
                    spans.push(Span::styled(c.to_string(), Style::default().fg(Color::White)));
                }
                '{' | '}' | '[' | ']' => {
                    flush(&mut spans, &mut current);
                    spans.push(Span::styled(
                        c.to_string(),
                        Style::default().fg(Color::Yellow),
                    ));
                }
                _ => current.push(c),
            }
        }

        flush(&mut spans, &mut current);
        lines.push(Line::from(spans));
    }

    lines
}

/// Whether the string starting here is an object key (its closing quote is followed by `:`)
fn closes_as_key(rest: &str) -> bool {
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return rest[i + 1..].trim_start().starts_with(':');
        }
    }
    false
}

/// Push a bare token, colouring literals
fn flush(spans: &mut Vec<Span<'static>>, current: &mut String) {
    if current.is_empty() {
        return;
    }
    let token = std::mem::take(current);
    let word = token.trim();
    let style = if matches!(word, "true" | "false" | "null") {
        Style::default().fg(Color::Magenta)
    } else if !word.is_empty() && word.parse::<f64>().is_ok() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    spans.push(Span::styled(token, style));
}

/// Leading status code of a status line such as `"404 Not Found"`
pub fn status_code(status_line: &str) -> Option<u16> {
    status_line.split_whitespace().next()?.parse().ok()
}

/// Status code color
pub fn status_color(code: u16) -> Color {
    match code {
        200..=299 => Color::Green,
        300..=399 => Color::Cyan,
        400..=499 => Color::Red,
        500..=599 => Color::Magenta,
        _ => Color::Yellow,
    }
}

/// Method color
pub fn method_color(method: HttpMethod) -> Color {
    match method {
        HttpMethod::GET => Color::Green,
        HttpMethod::POST => Color::Yellow,
        HttpMethod::PUT => Color::Blue,
        HttpMethod::PATCH => Color::Cyan,
        HttpMethod::DELETE => Color::Red,
        HttpMethod::HEAD => Color::LightMagenta,
        HttpMethod::OPTIONS => Color::Gray,
    }
}

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::core::app::App;
use crate::core::message::Role;
use crate::core::session::TurnState;
use crate::utils::scroll::ScrollCalculator;

fn push_message_lines(lines: &mut Vec<Line<'static>>, role: Role, content: &str) {
    match role {
        Role::User => {
            lines.push(Line::from(vec![
                Span::styled(
                    "user: ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(content.to_string(), Style::default().fg(Color::Cyan)),
            ]));
        }
        Role::System => {
            lines.push(Line::from(vec![
                Span::styled(
                    "system: ",
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(content.to_string(), Style::default().fg(Color::DarkGray)),
            ]));
        }
        Role::Assistant => {
            for content_line in content.lines() {
                lines.push(Line::from(Span::styled(
                    content_line.to_string(),
                    Style::default().fg(Color::White),
                )));
            }
        }
    }
    lines.push(Line::from(""));
}

/// Flatten the transcript into display lines: the purge notice if one is
/// set, every session message, and the in-flight assistant text while a
/// turn is streaming.
pub fn build_display_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if let Some(notice) = &app.notice {
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(""));
    }

    for msg in app.session.messages() {
        push_message_lines(&mut lines, msg.role, &msg.content);
    }

    if app.turn_state == TurnState::Submitting {
        if app.current_response.is_empty() {
            lines.push(Line::from(Span::styled(
                "…",
                Style::default().fg(Color::DarkGray),
            )));
        } else {
            for content_line in app.current_response.lines() {
                lines.push(Line::from(Span::styled(
                    content_line.to_string(),
                    Style::default().fg(Color::White),
                )));
            }
        }
    }

    lines
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

fn render_picker(f: &mut Frame, app: &App) {
    let Some(picker) = &app.picker else {
        return;
    };

    let longest = picker
        .items
        .iter()
        .map(|i| i.label.len() as u16)
        .max()
        .unwrap_or(0)
        .max(picker.title.len() as u16);
    let width = (longest + 6).min(f.area().width);
    let height = (picker.items.len() as u16 + 2).min(f.area().height);
    let area = centered_rect(width, height, f.area());

    let items: Vec<ListItem> = picker
        .items
        .iter()
        .map(|i| ListItem::new(i.label.clone()))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(picker.title.clone()),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");

    let mut state = ListState::default();
    state.select(Some(picker.selected));

    f.render_widget(Clear, area);
    f.render_stateful_widget(list, area, &mut state);
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    let lines = build_display_lines(app);

    // Clamp scrolling against the wrapped height, pinning to the bottom
    // while auto-scroll is active.
    let available_height = chunks[0].height.saturating_sub(1);
    let total_rows = ScrollCalculator::wrapped_line_count(&lines, chunks[0].width);
    let max_offset = ScrollCalculator::max_scroll_offset(total_rows, available_height);
    if app.auto_scroll {
        app.scroll_offset = max_offset;
    } else {
        app.scroll_offset = app.scroll_offset.min(max_offset);
        // Scrolling back down to the bottom re-engages auto-scroll.
        if app.scroll_offset >= max_offset {
            app.auto_scroll = true;
        }
    }

    let state_tag = match app.turn_state {
        TurnState::Idle => "",
        TurnState::Submitting => " • streaming",
    };
    let title = format!(
        "Ollaterm v{} - {} • role: {}{}",
        env!("CARGO_PKG_VERSION"),
        app.model,
        app.role.as_str(),
        state_tag
    );

    let transcript = Paragraph::new(lines)
        .block(Block::default().title(title))
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset, 0));
    f.render_widget(transcript, chunks[0]);

    let (input_style, input_title) = if app.turn_state.input_enabled() {
        (
            Style::default().fg(Color::Yellow),
            "Type your message (Enter to send, Ctrl+P model, Ctrl+R role, Ctrl+L purge, Ctrl+C quit)",
        )
    } else {
        (Style::default().fg(Color::DarkGray), "Waiting for reply…")
    };

    let input = Paragraph::new(app.input.text())
        .style(input_style)
        .block(Block::default().borders(Borders::ALL).title(input_title));
    f.render_widget(input, chunks[1]);

    if app.turn_state.input_enabled() && app.picker.is_none() {
        f.set_cursor_position((chunks[1].x + app.input.cursor_column() + 1, chunks[1].y + 1));
    }

    render_picker(f, app);
}

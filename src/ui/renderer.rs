use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::core::conversation::ChatController;
use crate::ui::chat_loop::UiState;
use crate::ui::layout::{session_date, LayoutEngine};
use crate::ui::theme::Theme;

const SIDEBAR_WIDTH: u16 = 30;
const GENERATING_MARKER: &str = "● ";
/// The input box grows with its content up to this many text rows.
const MAX_INPUT_ROWS: u16 = 5;

pub fn ui(f: &mut Frame, controller: &ChatController, state: &mut UiState, theme: &Theme) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(f.area());

    render_sidebar(f, columns[0], controller, theme);

    let input_rows = u16::try_from(state.line_count())
        .unwrap_or(MAX_INPUT_ROWS)
        .min(MAX_INPUT_ROWS);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(input_rows + 2),
            Constraint::Length(1),
        ])
        .split(columns[1]);

    render_transcript(f, rows[0], controller, state, theme);
    render_input(f, rows[1], controller, state, theme);
    render_status(f, rows[2], controller, theme);
}

fn render_sidebar(f: &mut Frame, area: Rect, controller: &ChatController, theme: &Theme) {
    let items: Vec<ListItem> = controller
        .sessions()
        .iter()
        .map(|session| {
            let marker = if controller.is_generating(&session.id) {
                GENERATING_MARKER
            } else {
                "  "
            };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(marker, theme.streaming_indicator_style),
                    Span::raw(session.title.clone()),
                ]),
                Line::from(Span::styled(
                    format!("  {} · {}", session_date(&session.updated_at), session.persona),
                    theme.status_style,
                )),
            ])
        })
        .collect();

    let mut list_state = ListState::default().with_selected(controller.store().active_index());
    let list = List::new(items)
        .style(theme.sidebar_style)
        .highlight_style(theme.sidebar_selected_style)
        .block(
            Block::default()
                .borders(Borders::RIGHT)
                .border_style(theme.border_style)
                .title(Span::styled("Nexus", theme.title_style)),
        );
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_transcript(
    f: &mut Frame,
    area: Rect,
    controller: &ChatController,
    state: &mut UiState,
    theme: &Theme,
) {
    let agent = controller.agent();
    let search = if agent.use_search { "search on" } else { "search off" };
    let (title, persona, lines) = match controller.active_session() {
        Some(session) => {
            let width = Some(usize::from(area.width.saturating_sub(1)).max(1));
            let lines = if session.messages.is_empty() {
                LayoutEngine::welcome_lines(theme, width)
            } else {
                state.layout_cache.layout(&session.messages, theme, width)
            };
            (session.title.clone(), session.persona, lines)
        }
        None => (String::new(), agent.persona, Vec::new()),
    };

    let mut header = vec![
        Span::styled(title, theme.title_style),
        Span::styled(
            format!(
                " • {persona} • {} ({search})",
                controller.policy().model_for(agent.use_search)
            ),
            theme.status_style,
        ),
    ];
    if controller.active_is_generating() {
        header.push(Span::styled(" • generating…", theme.streaming_indicator_style));
    }

    let viewport = area.height.saturating_sub(1);
    let offset = state.update_scroll(lines.len(), viewport);

    let paragraph = Paragraph::new(lines)
        .block(Block::default().title(Line::from(header)))
        .scroll((offset, 0));
    f.render_widget(paragraph, area);
}

fn render_input(
    f: &mut Frame,
    area: Rect,
    controller: &ChatController,
    state: &UiState,
    theme: &Theme,
) {
    let title = if controller.active_is_generating() {
        "Waiting for the reply… (Ctrl+N new chat, Ctrl+C quit)"
    } else if controller.pending_image().is_some() {
        "Image attached, Enter to send (Esc removes it)"
    } else {
        "Message (Enter send, Shift+Enter newline, /help commands)"
    };

    let inner_width = usize::from(area.width.saturating_sub(2)).max(1);
    let visible_rows = usize::from(area.height.saturating_sub(2)).max(1);
    let (row, col) = state.cursor();
    let current_line = state.input().split('\n').nth(row).unwrap_or("");
    let before_cursor: String = current_line.chars().take(col).collect();
    let cursor_col = UnicodeWidthStr::width(before_cursor.as_str());
    let horizontal_scroll = cursor_col.saturating_sub(inner_width.saturating_sub(1));
    let vertical_scroll = row.saturating_sub(visible_rows - 1);

    let lines: Vec<Line> = state.input().split('\n').map(Line::raw).collect();
    let input = Paragraph::new(lines)
        .style(theme.input_text_style)
        .scroll((
            u16::try_from(vertical_scroll).unwrap_or(u16::MAX),
            u16::try_from(horizontal_scroll).unwrap_or(u16::MAX),
        ))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style)
                .title(Span::styled(title, theme.title_style)),
        );
    f.render_widget(input, area);

    let cursor_x = area.x + 1 + u16::try_from(cursor_col - horizontal_scroll).unwrap_or(0);
    let cursor_y = area.y + 1 + u16::try_from(row - vertical_scroll).unwrap_or(0);
    f.set_cursor_position((
        cursor_x.min(area.right().saturating_sub(2)),
        cursor_y.min(area.bottom().saturating_sub(2)),
    ));
}

fn render_status(f: &mut Frame, area: Rect, controller: &ChatController, theme: &Theme) {
    let line = match controller.status() {
        Some(status) if status.starts_with("Generation failed") => {
            Line::from(Span::styled(status.to_string(), theme.error_style))
        }
        Some(status) => Line::from(Span::styled(status.to_string(), theme.status_style)),
        None => Line::from(Span::styled(
            "Ctrl+N new • Alt+↑/↓ switch • Ctrl+D delete • Ctrl+P persona • Ctrl+G search",
            theme.status_style,
        )),
    };
    f.render_widget(Paragraph::new(line), area);
}

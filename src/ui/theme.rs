use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    // Transcript
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_prefix_style: Style,
    pub assistant_text_style: Style,
    pub heading_style: Style,
    pub bold_style: Style,
    pub italic_style: Style,
    pub inline_code_style: Style,
    pub code_block_style: Style,
    pub code_label_style: Style,
    pub source_style: Style,
    pub attachment_style: Style,
    pub timestamp_style: Style,

    // Chrome
    pub title_style: Style,
    pub sidebar_style: Style,
    pub sidebar_selected_style: Style,
    pub streaming_indicator_style: Style,
    pub border_style: Style,
    pub status_style: Style,
    pub error_style: Style,
    pub input_text_style: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark_default()
    }
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_prefix_style: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(Color::Gray),
            heading_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            bold_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            italic_style: Style::default().add_modifier(Modifier::ITALIC),
            inline_code_style: Style::default().fg(Color::LightMagenta),
            code_block_style: Style::default().fg(Color::Gray).bg(Color::Black),
            code_label_style: Style::default().fg(Color::DarkGray),
            source_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            attachment_style: Style::default().fg(Color::Yellow),
            timestamp_style: Style::default().fg(Color::DarkGray),

            title_style: Style::default().fg(Color::Gray),
            sidebar_style: Style::default().fg(Color::Gray),
            sidebar_selected_style: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            streaming_indicator_style: Style::default().fg(Color::Green),
            border_style: Style::default().fg(Color::DarkGray),
            status_style: Style::default().fg(Color::DarkGray),
            error_style: Style::default().fg(Color::Red),
            input_text_style: Style::default().fg(Color::White),
        }
    }
}

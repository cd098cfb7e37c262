use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use super::parser::{Block, Inline};
use super::wrap::wrap_spans;
use crate::ui::theme::Theme;

const BULLET: &str = "• ";
const CODE_LABEL_FALLBACK: &str = "code";

fn inline_spans(inlines: &[Inline], base: Style, theme: &Theme) -> Vec<Span<'static>> {
    inlines
        .iter()
        .map(|inline| match inline {
            Inline::Text(text) => Span::styled(text.clone(), base),
            Inline::Bold(text) => Span::styled(text.clone(), base.patch(theme.bold_style)),
            Inline::Italic(text) => Span::styled(text.clone(), base.patch(theme.italic_style)),
            Inline::Code(text) => Span::styled(text.clone(), theme.inline_code_style),
        })
        .collect()
}

fn push_wrapped(
    lines: &mut Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    width: Option<usize>,
    indent: &str,
) {
    let indent_width = UnicodeWidthStr::width(indent);
    let wrapped = match width {
        Some(w) => wrap_spans(&spans, w.saturating_sub(indent_width).max(1)),
        None => vec![spans],
    };
    for (index, mut row) in wrapped.into_iter().enumerate() {
        if index > 0 && indent_width > 0 {
            row.insert(0, Span::raw(" ".repeat(indent_width)));
        }
        lines.push(Line::from(row));
    }
}

/// Render formatted blocks to terminal lines, wrapped to `width` columns
/// when one is given. `base` styles plain text.
pub fn render_blocks(
    blocks: &[Block],
    base: Style,
    theme: &Theme,
    width: Option<usize>,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for block in blocks {
        match block {
            Block::Paragraph(inlines) => {
                push_wrapped(&mut lines, inline_spans(inlines, base, theme), width, "");
            }
            Block::Heading(inlines) => {
                let style = base.patch(theme.heading_style);
                push_wrapped(&mut lines, inline_spans(inlines, style, theme), width, "");
            }
            Block::ListItem(inlines) => {
                let mut spans = vec![Span::styled(BULLET, base)];
                spans.extend(inline_spans(inlines, base, theme));
                push_wrapped(&mut lines, spans, width, BULLET);
            }
            Block::LineBreak => lines.push(Line::default()),
            Block::CodeBlock { language, code } => {
                let label = language.as_deref().unwrap_or(CODE_LABEL_FALLBACK);
                lines.push(Line::from(Span::styled(
                    format!("─ {label} ─"),
                    theme.code_label_style,
                )));
                for code_line in code.split('\n') {
                    let span = Span::styled(code_line.to_string(), theme.code_block_style);
                    push_wrapped(&mut lines, vec![span], width, "");
                }
            }
        }
    }

    lines
}

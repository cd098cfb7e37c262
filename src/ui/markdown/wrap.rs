use ratatui::{style::Style, text::Span};
use unicode_width::UnicodeWidthStr;

/// Words up to this width move to the next line whole; longer ones are split.
const MAX_UNBREAKABLE_WIDTH: usize = 30;

fn char_width(ch: char) -> usize {
    UnicodeWidthStr::width(ch.encode_utf8(&mut [0; 4]))
}

/// Wrap styled spans to `max_width` columns, breaking at whitespace where
/// possible and preserving each span's style.
pub(crate) fn wrap_spans(spans: &[Span<'static>], max_width: usize) -> Vec<Vec<Span<'static>>> {
    if spans.is_empty() || max_width == 0 {
        return vec![spans.to_vec()];
    }

    let mut wrapped: Vec<Vec<Span<'static>>> = Vec::new();
    let mut line: Vec<Span<'static>> = Vec::new();
    let mut line_width = 0usize;

    for span in spans {
        let style: Style = span.style;
        let mut text = span.content.to_string();

        while !text.is_empty() {
            let mut fit_bytes = 0usize;
            let mut fit_width = 0usize;
            let mut last_break: Option<usize> = None;
            for (pos, ch) in text.char_indices() {
                let cw = char_width(ch);
                if line_width + fit_width + cw > max_width {
                    if ch.is_whitespace() {
                        last_break = Some(pos);
                    }
                    break;
                }
                fit_width += cw;
                fit_bytes = pos + ch.len_utf8();
                if ch.is_whitespace() {
                    last_break = Some(fit_bytes);
                }
            }

            if fit_bytes >= text.len() {
                line.push(Span::styled(text, style));
                line_width += fit_width;
                break;
            }

            if fit_bytes == 0 {
                if !line.is_empty() {
                    wrapped.push(std::mem::take(&mut line));
                    line_width = 0;
                    continue;
                }
                // A single character wider than the line.
                let ch_len = text.chars().next().map(char::len_utf8).unwrap_or(1);
                line.push(Span::styled(text[..ch_len].to_string(), style));
                wrapped.push(std::mem::take(&mut line));
                text = text[ch_len..].to_string();
                continue;
            }

            let break_at = match last_break {
                Some(pos) => pos,
                None => {
                    let word_end = text.find(char::is_whitespace).unwrap_or(text.len());
                    let word_width = UnicodeWidthStr::width(&text[..word_end]);
                    if line_width > 0 && word_width <= MAX_UNBREAKABLE_WIDTH {
                        wrapped.push(std::mem::take(&mut line));
                        line_width = 0;
                        continue;
                    }
                    fit_bytes
                }
            };

            let left = text[..break_at].trim_end();
            if !left.is_empty() {
                line.push(Span::styled(left.to_string(), style));
            }
            wrapped.push(std::mem::take(&mut line));
            line_width = 0;
            text = text[break_at..].trim_start().to_string();
        }
    }

    if !line.is_empty() || wrapped.is_empty() {
        wrapped.push(line);
    }
    wrapped
}

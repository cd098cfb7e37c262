use ratatui::style::Style;
use tui_textarea::{CursorMove, TextArea};
use unicode_segmentation::UnicodeSegmentation;

use crate::ui::layout::{LayoutCache, WELCOME_SUGGESTIONS};

/// Terminal-side state that is not part of any conversation: the input
/// editor, the transcript scroll position and the layout cache.
#[derive(Debug, Clone)]
pub struct UiState {
    textarea: TextArea<'static>,
    /// Contents of `textarea`, lines joined with `\n`.
    input: String,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    /// Largest valid scroll offset from the last frame.
    pub max_scroll: u16,
    /// Transcript viewport height from the last frame.
    pub viewport_height: u16,
    pub layout_cache: LayoutCache,
    next_suggestion: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            textarea: new_textarea(Vec::new()),
            input: String::new(),
            scroll_offset: 0,
            auto_scroll: true,
            max_scroll: 0,
            viewport_height: 0,
            layout_cache: LayoutCache::default(),
            next_suggestion: 0,
        }
    }
}

fn new_textarea(lines: Vec<String>) -> TextArea<'static> {
    let mut textarea = TextArea::new(lines);
    textarea.set_cursor_line_style(Style::default());
    textarea
}

/// Tabs become spaces, carriage returns become newlines and other control
/// characters are dropped.
fn sanitize_pasted(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', "    ")
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Cursor as (row, column in chars).
    pub fn cursor(&self) -> (usize, usize) {
        self.textarea.cursor()
    }

    pub fn line_count(&self) -> usize {
        self.textarea.lines().len().max(1)
    }

    pub fn apply_textarea_edit<F>(&mut self, f: F)
    where
        F: FnOnce(&mut TextArea<'static>),
    {
        f(&mut self.textarea);
        self.input = self.textarea.lines().join("\n");
    }

    fn cursor_line(&self) -> (&str, usize) {
        let (row, col) = self.textarea.cursor();
        let line = self.textarea.lines().get(row).map(String::as_str).unwrap_or("");
        let byte = line
            .char_indices()
            .nth(col)
            .map(|(i, _)| i)
            .unwrap_or(line.len());
        (line, byte)
    }

    /// Chars in the grapheme left of the cursor; 1 at a line start so the
    /// edit crosses the line break.
    fn grapheme_before(&self) -> usize {
        let (line, byte) = self.cursor_line();
        line[..byte]
            .graphemes(true)
            .next_back()
            .map_or(1, |g| g.chars().count())
    }

    fn grapheme_after(&self) -> usize {
        let (line, byte) = self.cursor_line();
        line[byte..]
            .graphemes(true)
            .next()
            .map_or(1, |g| g.chars().count())
    }

    pub fn insert_char(&mut self, ch: char) {
        self.apply_textarea_edit(|ta| {
            ta.insert_char(ch);
        });
    }

    pub fn insert_str(&mut self, text: &str) {
        let text = sanitize_pasted(text);
        self.apply_textarea_edit(|ta| {
            ta.insert_str(&text);
        });
    }

    pub fn insert_newline(&mut self) {
        self.apply_textarea_edit(|ta| {
            ta.insert_newline();
        });
    }

    pub fn backspace(&mut self) {
        let count = self.grapheme_before();
        self.apply_textarea_edit(|ta| {
            for _ in 0..count {
                ta.delete_char();
            }
        });
    }

    pub fn delete(&mut self) {
        let count = self.grapheme_after();
        self.apply_textarea_edit(|ta| {
            for _ in 0..count {
                ta.delete_next_char();
            }
        });
    }

    pub fn move_left(&mut self) {
        let count = self.grapheme_before();
        for _ in 0..count {
            self.textarea.move_cursor(CursorMove::Back);
        }
    }

    pub fn move_right(&mut self) {
        let count = self.grapheme_after();
        for _ in 0..count {
            self.textarea.move_cursor(CursorMove::Forward);
        }
    }

    pub fn move_home(&mut self) {
        self.textarea.move_cursor(CursorMove::Head);
    }

    pub fn move_end(&mut self) {
        self.textarea.move_cursor(CursorMove::End);
    }

    /// Clear the editor and return what it held.
    pub fn take_input(&mut self) -> String {
        self.textarea = new_textarea(Vec::new());
        std::mem::take(&mut self.input)
    }

    /// Replace the editor contents, leaving the cursor at the end.
    pub fn set_input(&mut self, text: String) {
        self.textarea = new_textarea(text.split('\n').map(str::to_string).collect());
        self.textarea.move_cursor(CursorMove::Bottom);
        self.textarea.move_cursor(CursorMove::End);
        self.input = text;
    }

    /// Put the next welcome suggestion in the editor.
    pub fn cycle_suggestion(&mut self) {
        let suggestion = WELCOME_SUGGESTIONS[self.next_suggestion % WELCOME_SUGGESTIONS.len()];
        self.next_suggestion = (self.next_suggestion + 1) % WELCOME_SUGGESTIONS.len();
        self.set_input(suggestion.to_string());
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll_offset = self.scroll_offset.min(self.max_scroll).saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(self.max_scroll);
        if self.scroll_offset >= self.max_scroll {
            self.auto_scroll = true;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.auto_scroll = true;
        self.scroll_offset = self.max_scroll;
    }

    /// Record the transcript size of the frame being drawn and return the
    /// offset to draw it at.
    pub fn update_scroll(&mut self, total_lines: usize, viewport_height: u16) -> u16 {
        let total = u16::try_from(total_lines).unwrap_or(u16::MAX);
        self.viewport_height = viewport_height;
        self.max_scroll = total.saturating_sub(viewport_height);
        if self.auto_scroll {
            self.scroll_offset = self.max_scroll;
        }
        self.scroll_offset = self.scroll_offset.min(self.max_scroll);
        self.scroll_offset
    }
}

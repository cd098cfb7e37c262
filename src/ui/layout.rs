use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Local, Utc};
use ratatui::text::{Line, Span};

use super::markdown::{format_markdown, render_blocks, wrap_spans};
use super::theme::Theme;
use crate::core::message::{Message, Role};

/// Prompts offered on an empty conversation; Tab cycles them into the input.
pub const WELCOME_SUGGESTIONS: [&str; 4] = [
    "Architect a React dashboard",
    "Write a neo-noir short story",
    "Analyze current market trends",
    "Explain quantum entanglement",
];

const WELCOME_TITLE: &str = "Initialize Nexus Protocol";
const WELCOME_TEXT: &str =
    "Your multi-modal intelligence agent is ready. How can I assist your mission today?";

/// Local wall-clock time of a message, `HH:MM`.
pub fn message_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

/// Local date shown under a session in the sidebar.
pub fn session_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%b %d").to_string()
}

fn push_wrapped(lines: &mut Vec<Line<'static>>, spans: Vec<Span<'static>>, width: Option<usize>) {
    match width {
        Some(w) => lines.extend(wrap_spans(&spans, w).into_iter().map(Line::from)),
        None => lines.push(Line::from(spans)),
    }
}

pub struct LayoutEngine;

impl LayoutEngine {
    /// Lay out a transcript. Wrapping happens here so scroll math can count
    /// the returned lines directly.
    pub fn layout_messages(
        messages: &[Message],
        theme: &Theme,
        width: Option<usize>,
    ) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for message in messages {
            lines.extend(Self::message_lines(message, theme, width));
        }
        lines
    }

    /// Lines for one message, including the blank line that follows it.
    pub fn message_lines(
        message: &Message,
        theme: &Theme,
        width: Option<usize>,
    ) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let (prefix, prefix_style, text_style) = match message.role {
            Role::User => ("You", theme.user_prefix_style, theme.user_text_style),
            Role::Assistant => ("Nexus", theme.assistant_prefix_style, theme.assistant_text_style),
            Role::System => ("System", theme.status_style, theme.status_style),
        };
        lines.push(Line::from(vec![
            Span::styled(prefix, prefix_style),
            Span::styled(
                format!("  {}", message_time(&message.timestamp)),
                theme.timestamp_style,
            ),
        ]));

        if message.image.is_some() {
            lines.push(Line::from(Span::styled(
                "[image attached]",
                theme.attachment_style,
            )));
        }

        if !message.content.is_empty() {
            let blocks = format_markdown(&message.content);
            lines.extend(render_blocks(&blocks, text_style, theme, width));
        }

        if let Some(sources) = message.grounding_sources.as_ref().filter(|s| !s.is_empty()) {
            lines.push(Line::from(Span::styled("Sources:", theme.code_label_style)));
            for (index, source) in sources.iter().enumerate() {
                let spans = vec![
                    Span::styled(format!("[{}] ", index + 1), theme.code_label_style),
                    Span::styled(source.title.clone(), theme.source_style),
                    Span::styled(format!(" {}", source.uri), theme.status_style),
                ];
                push_wrapped(&mut lines, spans, width);
            }
        }

        lines.push(Line::default());
        lines
    }

    /// Panel shown in place of an empty transcript.
    pub fn welcome_lines(theme: &Theme, width: Option<usize>) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::default(),
            Line::from(Span::styled(WELCOME_TITLE, theme.heading_style)),
        ];
        push_wrapped(
            &mut lines,
            vec![Span::styled(WELCOME_TEXT, theme.status_style)],
            width,
        );
        lines.push(Line::default());
        for suggestion in WELCOME_SUGGESTIONS {
            push_wrapped(
                &mut lines,
                vec![
                    Span::styled("  → ", theme.streaming_indicator_style),
                    Span::styled(suggestion, theme.assistant_text_style),
                ],
                width,
            );
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Tab puts a suggestion in the input.",
            theme.status_style,
        )));
        lines
    }
}

/// What a cached layout was built from. Streaming only ever grows the
/// trailing message, so content length detects every change to it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LayoutKey {
    content_len: usize,
    source_count: usize,
    has_image: bool,
    width: Option<usize>,
}

impl LayoutKey {
    fn new(message: &Message, width: Option<usize>) -> Self {
        Self {
            content_len: message.content.len(),
            source_count: message.grounding_sources.as_ref().map_or(0, Vec::len),
            has_image: message.image.is_some(),
            width,
        }
    }
}

/// Per-message layout cache keyed by message id, so a redraw only lays out
/// messages that changed since the last frame.
#[derive(Debug, Clone, Default)]
pub struct LayoutCache {
    entries: HashMap<String, (LayoutKey, Vec<Line<'static>>)>,
    #[cfg(test)]
    rebuilds: usize,
}

impl LayoutCache {
    /// Same lines as [`LayoutEngine::layout_messages`]. Entries for messages
    /// not in `messages` are dropped.
    pub fn layout(
        &mut self,
        messages: &[Message],
        theme: &Theme,
        width: Option<usize>,
    ) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for message in messages {
            let key = LayoutKey::new(message, width);
            let fresh = self
                .entries
                .get(&message.id)
                .is_some_and(|(cached, _)| *cached == key);
            if !fresh {
                let built = LayoutEngine::message_lines(message, theme, width);
                self.entries.insert(message.id.clone(), (key, built));
                #[cfg(test)]
                {
                    self.rebuilds += 1;
                }
            }
            if let Some((_, cached)) = self.entries.get(&message.id) {
                lines.extend(cached.iter().cloned());
            }
        }

        let live: HashSet<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        self.entries.retain(|id, _| live.contains(id.as_str()));
        lines
    }
}

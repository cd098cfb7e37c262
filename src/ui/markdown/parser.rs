//! Lightweight markdown tokenizer.
//!
//! Content is split on code fences first; text outside fences is classified
//! line by line and then tokenized for inline emphasis. The output never
//! contains markup, only typed blocks and spans.

const FENCE: &str = "```";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(String),
    Italic(String),
    Code(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading(Vec<Inline>),
    ListItem(Vec<Inline>),
    /// A blank line.
    LineBreak,
    CodeBlock {
        language: Option<String>,
        code: String,
    },
}

/// Convert a message body into blocks.
pub fn format_markdown(content: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    // An odd number of fences leaves the trailing segment at an odd index,
    // so an unterminated fence reads as code to the end.
    for (index, segment) in content.split(FENCE).enumerate() {
        if index % 2 == 1 {
            blocks.push(code_block(segment));
        } else {
            blocks.extend(segment.split('\n').map(classify_line));
        }
    }
    blocks
}

fn code_block(segment: &str) -> Block {
    let (label, body) = segment.split_once('\n').unwrap_or((segment, ""));
    let label = label.trim();
    let code = body.strip_suffix('\n').unwrap_or(body);
    Block::CodeBlock {
        language: (!label.is_empty()).then(|| label.to_string()),
        code: code.to_string(),
    }
}

fn classify_line(line: &str) -> Block {
    let trimmed = line.trim();
    if let Some(item) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
    {
        Block::ListItem(parse_inline(item))
    } else if let Some(heading) = trimmed.strip_prefix("# ") {
        Block::Heading(parse_inline(heading))
    } else if trimmed.is_empty() {
        Block::LineBreak
    } else {
        Block::Paragraph(parse_inline(line.trim_end()))
    }
}

#[derive(Clone, Copy)]
enum Rule {
    Bold,
    Italic,
    Code,
}

impl Rule {
    /// Tried in this order at every position.
    const ORDER: [Rule; 3] = [Rule::Bold, Rule::Italic, Rule::Code];

    fn delimiter(self) -> &'static str {
        match self {
            Rule::Bold => "**",
            Rule::Italic => "*",
            Rule::Code => "`",
        }
    }

    fn wrap(self, content: &str) -> Inline {
        let content = content.to_string();
        match self {
            Rule::Bold => Inline::Bold(content),
            Rule::Italic => Inline::Italic(content),
            Rule::Code => Inline::Code(content),
        }
    }

    /// Match this rule at the start of `rest`, returning the span and the
    /// number of bytes consumed. The closing delimiter is the nearest one
    /// that leaves non-empty content. A single `*` never closes on the first
    /// half of a `**`, which belongs to bold.
    fn try_match(self, rest: &str) -> Option<(Inline, usize)> {
        let delimiter = self.delimiter();
        let after_open = rest.strip_prefix(delimiter)?;
        let first = after_open.chars().next()?;
        if matches!(self, Rule::Italic) && first == '*' {
            return None;
        }

        let search_from = first.len_utf8();
        let close = after_open[search_from..].find(delimiter)? + search_from;
        if matches!(self, Rule::Italic) && after_open[close + 1..].starts_with('*') {
            return None;
        }
        let content = &after_open[..close];
        Some((self.wrap(content), delimiter.len() * 2 + close))
    }
}

/// Tokenize one line of text into inline spans.
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let matched = Rule::ORDER.iter().find_map(|rule| rule.try_match(rest));
        match matched {
            Some((span, consumed)) => {
                if !plain.is_empty() {
                    spans.push(Inline::Text(std::mem::take(&mut plain)));
                }
                spans.push(span);
                pos += consumed;
            }
            None => {
                let ch = rest.chars().next().unwrap_or_default();
                plain.push(ch);
                pos += ch.len_utf8().max(1);
            }
        }
    }

    if !plain.is_empty() {
        spans.push(Inline::Text(plain));
    }
    spans
}

use super::*;
use crate::ui::theme::Theme;
use ratatui::style::{Modifier, Style};

fn text(s: &str) -> Inline {
    Inline::Text(s.to_string())
}

#[test]
fn inline_emphasis_and_code_in_order() {
    let spans = parse_inline("**bold** and *italic* and `code`");
    assert_eq!(
        spans,
        vec![
            Inline::Bold("bold".into()),
            text(" and "),
            Inline::Italic("italic".into()),
            text(" and "),
            Inline::Code("code".into()),
        ]
    );
}

#[test]
fn matching_is_lazy() {
    assert_eq!(
        parse_inline("*a* b *c*"),
        vec![
            Inline::Italic("a".into()),
            text(" b "),
            Inline::Italic("c".into()),
        ]
    );
    assert_eq!(
        parse_inline("`x` and `y`"),
        vec![Inline::Code("x".into()), text(" and "), Inline::Code("y".into())]
    );
}

#[test]
fn stray_markers_stay_literal() {
    assert_eq!(parse_inline("a ** b"), vec![text("a ** b")]);
    assert_eq!(parse_inline("2 * 3 = 6"), vec![text("2 * 3 = 6")]);
    assert_eq!(parse_inline("empty `` ticks"), vec![text("empty `` ticks")]);
}

#[test]
fn bold_is_not_split_by_an_earlier_single_star() {
    assert_eq!(
        parse_inline("2*3 and **bold**"),
        vec![text("2*3 and "), Inline::Bold("bold".into())]
    );
    assert_eq!(
        parse_inline("*see **this** now*"),
        vec![text("*see "), Inline::Bold("this".into()), text(" now*")]
    );
}

#[test]
fn code_spans_are_not_formatted_inside() {
    assert_eq!(
        parse_inline("`**not bold**`"),
        vec![Inline::Code("**not bold**".into())]
    );
}

#[test]
fn fenced_block_keeps_label_and_body() {
    let blocks = format_markdown("```js\nconsole.log(1)\n```");
    assert_eq!(
        blocks,
        vec![
            Block::LineBreak,
            Block::CodeBlock {
                language: Some("js".into()),
                code: "console.log(1)".into(),
            },
            Block::LineBreak,
        ]
    );
}

#[test]
fn fence_contents_are_not_tokenized() {
    let blocks = format_markdown("```\n**x** *y*\n- z\n```");
    assert!(blocks.contains(&Block::CodeBlock {
        language: None,
        code: "**x** *y*\n- z".into(),
    }));
}

#[test]
fn unterminated_fence_runs_to_the_end() {
    let blocks = format_markdown("Intro\n```rust\nfn main() {}");
    assert_eq!(
        blocks,
        vec![
            Block::Paragraph(vec![text("Intro")]),
            Block::LineBreak,
            Block::CodeBlock {
                language: Some("rust".into()),
                code: "fn main() {}".into(),
            },
        ]
    );
}

#[test]
fn lines_are_classified_on_trimmed_text() {
    let blocks = format_markdown("# Title\n  - first\n* second\n\nplain *em*");
    assert_eq!(
        blocks,
        vec![
            Block::Heading(vec![text("Title")]),
            Block::ListItem(vec![text("first")]),
            Block::ListItem(vec![text("second")]),
            Block::LineBreak,
            Block::Paragraph(vec![text("plain "), Inline::Italic("em".into())]),
        ]
    );
}

#[test]
fn list_items_keep_inline_formatting() {
    let blocks = format_markdown("- **key**: value");
    assert_eq!(
        blocks,
        vec![Block::ListItem(vec![
            Inline::Bold("key".into()),
            text(": value"),
        ])]
    );
}

#[test]
fn rendering_drops_markers_and_applies_styles() {
    let theme = Theme::default();
    let blocks = format_markdown("say **hi** to `you`");
    let lines = render_blocks(&blocks, Style::default(), &theme, None);

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].to_string(), "say hi to you");
    let bold = &lines[0].spans[1];
    assert_eq!(bold.content, "hi");
    assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    assert_eq!(lines[0].spans[3].style, theme.inline_code_style);
}

#[test]
fn rendering_labels_code_blocks_and_bullets() {
    let theme = Theme::default();
    let blocks = format_markdown("- item\n```\nlet x = 1;\n```");
    let lines: Vec<String> = render_blocks(&blocks, Style::default(), &theme, None)
        .iter()
        .map(|line| line.to_string())
        .collect();

    assert_eq!(lines[0], "• item");
    assert_eq!(lines[2], "─ code ─");
    assert_eq!(lines[3], "let x = 1;");
}

#[test]
fn wrapped_list_items_hang_under_the_bullet() {
    let theme = Theme::default();
    let blocks = format_markdown("- alpha beta gamma");
    let lines: Vec<String> = render_blocks(&blocks, Style::default(), &theme, Some(12))
        .iter()
        .map(|line| line.to_string())
        .collect();

    assert_eq!(lines, vec!["• alpha", "  beta gamma"]);
}

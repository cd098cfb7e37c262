use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nexus::core::message::{GroundingSource, Message, Role};
use nexus::ui::layout::{LayoutCache, LayoutEngine};
use nexus::ui::markdown::{format_markdown, render_blocks};
use nexus::ui::theme::Theme;
use ratatui::style::Style;

const REPLY: &str = "Here is **the plan** with some `inline code`:\n\
- first *step*\n\
- second step\n\n\
```rust\nfn main() {\n    println!(\"hello\");\n}\n```\n\
And a closing paragraph that is long enough to wrap at least once on a narrow terminal.";

fn make_messages(n_pairs: usize) -> Vec<Message> {
    let mut v = Vec::with_capacity(n_pairs * 2);
    for _ in 0..n_pairs {
        v.push(Message::user("lorem ipsum dolor sit amet consectetur", None));
        let mut reply = Message::new(Role::Assistant, REPLY);
        reply.grounding_sources = Some(vec![GroundingSource::new(
            "Example",
            "https://example.com/page",
        )]);
        v.push(reply);
    }
    v
}

fn bench_markdown(c: &mut Criterion) {
    let theme = Theme::dark_default();
    let mut group = c.benchmark_group("markdown");
    group.bench_function("format", |b| b.iter(|| format_markdown(REPLY)));
    let blocks = format_markdown(REPLY);
    for width in [40usize, 120] {
        group.bench_function(BenchmarkId::new("render", width), |b| {
            b.iter(|| render_blocks(&blocks, Style::default(), &theme, Some(width)))
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let theme = Theme::dark_default();

    for &pairs in &[100usize, 400usize] {
        let messages = make_messages(pairs);
        let line_count = LayoutEngine::layout_messages(&messages, &theme, Some(80)).len();

        let mut group = c.benchmark_group(format!("layout_pairs{pairs}"));
        group.throughput(Throughput::Elements(line_count as u64));
        for width in [80usize, 120] {
            group.bench_function(BenchmarkId::new("full", width), |b| {
                b.iter(|| LayoutEngine::layout_messages(&messages, &theme, Some(width)))
            });
        }

        // Streaming: the last reply grows on every frame.
        let mut streaming = messages.clone();
        group.bench_function(BenchmarkId::new("streaming", 80), |b| {
            b.iter(|| {
                if let Some(last) = streaming.last_mut() {
                    last.content.push_str(" more");
                }
                LayoutEngine::layout_messages(&streaming, &theme, Some(80))
            })
        });

        let mut cached = messages.clone();
        let mut cache = LayoutCache::default();
        group.bench_function(BenchmarkId::new("streaming_cached", 80), |b| {
            b.iter(|| {
                if let Some(last) = cached.last_mut() {
                    last.content.push_str(" more");
                }
                cache.layout(&cached, &theme, Some(80))
            })
        });
        group.finish();
    }
}

criterion_group!(benches, bench_markdown, bench_layout);
criterion_main!(benches);

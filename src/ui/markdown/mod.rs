mod parser;
mod render;
mod wrap;

#[cfg(test)]
mod tests;

pub use parser::{format_markdown, parse_inline, Block, Inline};
pub use render::render_blocks;
pub(crate) use wrap::wrap_spans;

//! Markdown normalisation and block mapping
//!
//! Summary text in survey documents is LLM-authored and regularly glues bold
//! spans to the following word (`**重要**内容`), which many renderers fail to
//! close. [`normalize_strong`] repairs that once per string; [`parse`] then
//! hands the text to pulldown-cmark and maps its event stream onto the small
//! set of presentation primitives the renderers understand.

pub mod html;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde::Serialize;

/// Insert a space after every `**…**` span that is immediately followed by a
/// non-whitespace character.
///
/// Spans are matched lazily and never cross a line break. When the nearest
/// closing `**` is followed by whitespace (or the end of the text), the span
/// extends to a later closing marker on the same line. Apply exactly once:
/// the rewrite is not idempotent for overlapping markers.
pub fn normalize_strong(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut copied = 0;
    let mut scan = 0;

    while let Some(offset) = text[scan..].find("**") {
        let start = scan + offset;
        match closing_marker(text, start) {
            Some(after) => {
                out.push_str(&text[copied..after]);
                out.push(' ');
                copied = after;
                scan = after;
            }
            None => scan = start + 1,
        }
    }

    out.push_str(&text[copied..]);
    out
}

/// End of the shortest `**…**` span opening at `start` that is followed by a
/// non-whitespace character on the same line
///
/// U+2028/U+2029 end a line and U+FEFF counts as whitespace.
fn closing_marker(text: &str, start: usize) -> Option<usize> {
    let body = start + 2;
    let line_end = text[body..]
        .find(['\n', '\r', '\u{2028}', '\u{2029}'])
        .map_or(text.len(), |i| body + i);

    let mut from = body;
    while let Some(offset) = text[from..line_end].find("**") {
        let close = from + offset;
        let after = close + 2;
        match text[after..].chars().next() {
            Some(c) if !is_space(c) => return Some(after),
            _ => from = close + 1,
        }
    }
    None
}

fn is_space(c: char) -> bool {
    c.is_whitespace() || c == '\u{FEFF}'
}

// =============================================================================
// Presentation primitives
// =============================================================================

/// Heading weight tiers; levels 3 through 6 share the lightest tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingTier {
    Primary,
    Secondary,
    Tertiary,
}

impl HeadingTier {
    fn from_level(level: HeadingLevel) -> Self {
        match level {
            HeadingLevel::H1 => HeadingTier::Primary,
            HeadingLevel::H2 => HeadingTier::Secondary,
            _ => HeadingTier::Tertiary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ListKind {
    Unordered,
    Ordered { start: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading {
        tier: HeadingTier,
        content: Vec<Inline>,
    },
    Paragraph {
        content: Vec<Inline>,
    },
    List {
        kind: ListKind,
        items: Vec<Vec<Block>>,
    },
    BlockQuote {
        blocks: Vec<Block>,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    Table {
        header: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    Rule,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text { text: String },
    Strong { content: Vec<Inline> },
    Emphasis { content: Vec<Inline> },
    Strikethrough { content: Vec<Inline> },
    Code { code: String },
    Link { href: String, content: Vec<Inline> },
    SoftBreak,
    HardBreak,
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text { text: text.into() }
    }
}

/// Concatenated plain text of a run of inlines
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text { text } => out.push_str(text),
            Inline::Code { code } => out.push_str(code),
            Inline::Strong { content }
            | Inline::Emphasis { content }
            | Inline::Strikethrough { content }
            | Inline::Link { content, .. } => out.push_str(&plain_text(content)),
            Inline::SoftBreak | Inline::HardBreak => out.push(' '),
        }
    }
    out
}

// =============================================================================
// Event stream -> block tree
// =============================================================================

/// Parse markdown into presentation blocks.
///
/// The text is passed through unchanged; callers normalise first.
pub fn parse(text: &str) -> Vec<Block> {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(text, options) {
        builder.event(event);
    }
    builder.finish()
}

/// Normalise and parse in one step
pub fn render_blocks(text: &str) -> Vec<Block> {
    parse(&normalize_strong(text))
}

#[derive(Debug, Clone, PartialEq)]
enum SpanKind {
    Paragraph { implicit: bool },
    Heading(HeadingTier),
    Strong,
    Emphasis,
    Strikethrough,
    Link(String),
    Cell,
}

#[derive(Debug)]
enum Frame {
    /// Root, block quote or list item
    Container { blocks: Vec<Block> },
    List {
        kind: ListKind,
        items: Vec<Vec<Block>>,
    },
    Span {
        kind: SpanKind,
        content: Vec<Inline>,
    },
    Code {
        language: Option<String>,
        code: String,
    },
    Table {
        header: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
        row: Vec<Vec<Inline>>,
    },
    Ignored,
}

struct TreeBuilder {
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame::Container { blocks: Vec::new() }],
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(Frame::Code { code, .. }) = self.stack.last_mut() {
                    code.push_str(&text);
                } else {
                    self.push_inline(Inline::text(text.to_string()));
                }
            }
            Event::Code(code) => self.push_inline(Inline::Code {
                code: code.to_string(),
            }),
            // Raw HTML is shown as text, never passed through
            Event::Html(html) | Event::InlineHtml(html) => {
                self.push_inline(Inline::text(html.to_string()))
            }
            Event::SoftBreak => self.push_inline(Inline::SoftBreak),
            Event::HardBreak => self.push_inline(Inline::HardBreak),
            Event::Rule => {
                self.close_implicit();
                self.attach(Block::Rule);
            }
            Event::TaskListMarker(checked) => {
                self.push_inline(Inline::text(if checked { "☑ " } else { "☐ " }))
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.close_implicit();
                self.push_span(SpanKind::Paragraph { implicit: false });
            }
            Tag::Heading { level, .. } => {
                self.close_implicit();
                self.push_span(SpanKind::Heading(HeadingTier::from_level(level)));
            }
            Tag::BlockQuote { .. } => {
                self.close_implicit();
                self.stack.push(Frame::Container { blocks: Vec::new() });
            }
            Tag::CodeBlock(kind) => {
                self.close_implicit();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .filter(|lang| !lang.is_empty())
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.stack.push(Frame::Code {
                    language,
                    code: String::new(),
                });
            }
            Tag::List(start) => {
                self.close_implicit();
                let kind = match start {
                    Some(start) => ListKind::Ordered { start },
                    None => ListKind::Unordered,
                };
                self.stack.push(Frame::List {
                    kind,
                    items: Vec::new(),
                });
            }
            Tag::Item => {
                self.close_implicit();
                self.stack.push(Frame::Container { blocks: Vec::new() });
            }
            Tag::Emphasis => self.open_inline(SpanKind::Emphasis),
            Tag::Strong => self.open_inline(SpanKind::Strong),
            Tag::Strikethrough => self.open_inline(SpanKind::Strikethrough),
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.open_inline(SpanKind::Link(dest_url.to_string()))
            }
            Tag::Table(_) => {
                self.close_implicit();
                self.stack.push(Frame::Table {
                    header: Vec::new(),
                    rows: Vec::new(),
                    row: Vec::new(),
                });
            }
            Tag::TableCell => self.push_span(SpanKind::Cell),
            Tag::HtmlBlock => {
                self.close_implicit();
                self.push_span(SpanKind::Paragraph { implicit: false });
            }
            Tag::TableHead | Tag::TableRow => {}
            _ => self.stack.push(Frame::Ignored),
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::HtmlBlock => {
                if let Some(block) = self.pop_span_block() {
                    self.attach(block);
                }
            }
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::Image => {
                if let Some(Frame::Span { kind, content }) = self.stack.pop() {
                    let inline = match kind {
                        SpanKind::Strong => Inline::Strong { content },
                        SpanKind::Emphasis => Inline::Emphasis { content },
                        SpanKind::Strikethrough => Inline::Strikethrough { content },
                        SpanKind::Link(href) => Inline::Link { href, content },
                        _ => return,
                    };
                    self.push_inline(inline);
                }
            }
            TagEnd::BlockQuote { .. } => {
                self.close_implicit();
                if let Some(Frame::Container { blocks, .. }) = self.stack.pop() {
                    self.attach(Block::BlockQuote { blocks });
                }
            }
            TagEnd::CodeBlock => {
                if let Some(Frame::Code { language, code }) = self.stack.pop() {
                    self.attach(Block::CodeBlock { language, code });
                }
            }
            TagEnd::Item => {
                self.close_implicit();
                if let Some(Frame::Container { blocks, .. }) = self.stack.pop() {
                    if let Some(Frame::List { items, .. }) = self.stack.last_mut() {
                        items.push(blocks);
                    }
                }
            }
            TagEnd::List(_) => {
                self.close_implicit();
                if let Some(Frame::List { kind, items }) = self.stack.pop() {
                    self.attach(Block::List { kind, items });
                }
            }
            TagEnd::TableCell => {
                if let Some(Frame::Span { content, .. }) = self.stack.pop() {
                    if let Some(Frame::Table { row, .. }) = self.stack.last_mut() {
                        row.push(content);
                    }
                }
            }
            TagEnd::TableHead => {
                if let Some(Frame::Table { header, row, .. }) = self.stack.last_mut() {
                    *header = std::mem::take(row);
                }
            }
            TagEnd::TableRow => {
                if let Some(Frame::Table { rows, row, .. }) = self.stack.last_mut() {
                    rows.push(std::mem::take(row));
                }
            }
            TagEnd::Table => {
                if let Some(Frame::Table { header, rows, .. }) = self.stack.pop() {
                    self.attach(Block::Table { header, rows });
                }
            }
            _ => {
                if matches!(self.stack.last(), Some(Frame::Ignored)) {
                    self.stack.pop();
                }
            }
        }
    }

    fn push_span(&mut self, kind: SpanKind) {
        self.stack.push(Frame::Span {
            kind,
            content: Vec::new(),
        });
    }

    /// Open an inline span, starting an implicit paragraph when the parent is
    /// a block container (tight list items carry bare text)
    fn open_inline(&mut self, kind: SpanKind) {
        self.ensure_inline_context();
        self.push_span(kind);
    }

    fn ensure_inline_context(&mut self) {
        if !matches!(self.stack.last(), Some(Frame::Span { .. })) {
            self.push_span(SpanKind::Paragraph { implicit: true });
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        if matches!(self.stack.last(), Some(Frame::Ignored)) {
            return;
        }
        self.ensure_inline_context();
        if let Some(Frame::Span { content, .. }) = self.stack.last_mut() {
            if let (Some(Inline::Text { text: prev }), Inline::Text { text }) =
                (content.last_mut(), &inline)
            {
                prev.push_str(text);
                return;
            }
            content.push(inline);
        }
    }

    fn close_implicit(&mut self) {
        if matches!(
            self.stack.last(),
            Some(Frame::Span {
                kind: SpanKind::Paragraph { implicit: true },
                ..
            })
        ) {
            if let Some(block) = self.pop_span_block() {
                self.attach(block);
            }
        }
    }

    fn pop_span_block(&mut self) -> Option<Block> {
        match self.stack.pop() {
            Some(Frame::Span {
                kind: SpanKind::Heading(tier),
                content,
            }) => Some(Block::Heading { tier, content }),
            Some(Frame::Span { content, .. }) => Some(Block::Paragraph { content }),
            Some(other) => {
                self.stack.push(other);
                None
            }
            None => None,
        }
    }

    fn attach(&mut self, block: Block) {
        if let Some(Frame::Container { blocks, .. }) = self.stack.last_mut() {
            blocks.push(block);
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.close_implicit();
        while self.stack.len() > 1 {
            match self.stack.pop() {
                Some(Frame::Span { content, .. }) => self.attach(Block::Paragraph { content }),
                Some(Frame::Code { language, code }) => {
                    self.attach(Block::CodeBlock { language, code })
                }
                _ => {}
            }
        }
        match self.stack.pop() {
            Some(Frame::Container { blocks, .. }) => blocks,
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_inserts_space() {
        assert_eq!(normalize_strong("**重要**内容"), "**重要** 内容");
    }

    #[test]
    fn test_normalize_leaves_spaced_text() {
        assert_eq!(normalize_strong("**重要** 内容"), "**重要** 内容");
        assert_eq!(normalize_strong("结尾**重要**"), "结尾**重要**");
        assert_eq!(normalize_strong("**重要**\n下一行"), "**重要**\n下一行");
    }

    #[test]
    fn test_normalize_sequential_spans() {
        assert_eq!(
            normalize_strong("**一**二**三**四"),
            "**一** 二**三** 四"
        );
        assert_eq!(normalize_strong("**a****b**"), "**a** **b**");
    }

    #[test]
    fn test_normalize_span_extends_past_spaced_close() {
        // The nearest close is followed by a space, so the lazy span grows to
        // the next closing marker on the line
        assert_eq!(normalize_strong("**a** b**c"), "**a** b** c");
    }

    #[test]
    fn test_normalize_does_not_cross_lines() {
        assert_eq!(normalize_strong("**a\nb**c"), "**a\nb**c");
    }

    #[test]
    fn test_normalize_unicode_separators() {
        assert_eq!(normalize_strong("**a**\u{FEFF}x"), "**a**\u{FEFF}x");
        assert_eq!(normalize_strong("**a\u{2028}b**c"), "**a\u{2028}b**c");
        assert_eq!(normalize_strong("**a\u{2029}b**c"), "**a\u{2029}b**c");
        assert_eq!(normalize_strong("**a**\u{2028}**b**c"), "**a**\u{2028}**b** c");
    }

    #[test]
    fn test_normalize_without_markers() {
        assert_eq!(normalize_strong("plain text"), "plain text");
        assert_eq!(normalize_strong(""), "");
        assert_eq!(normalize_strong("**"), "**");
    }

    #[test]
    fn test_parse_strong_after_normalize() {
        let blocks = render_blocks("**重要**内容");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                content: vec![
                    Inline::Strong {
                        content: vec![Inline::text("重要")]
                    },
                    Inline::text(" 内容"),
                ]
            }]
        );
    }

    #[test]
    fn test_parse_heading_tiers() {
        let blocks = parse("# A\n\n## B\n\n### C\n\n#### D");
        let tiers: Vec<HeadingTier> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading { tier, .. } => Some(*tier),
                _ => None,
            })
            .collect();
        assert_eq!(
            tiers,
            vec![
                HeadingTier::Primary,
                HeadingTier::Secondary,
                HeadingTier::Tertiary,
                HeadingTier::Tertiary
            ]
        );
    }

    #[test]
    fn test_parse_tight_list() {
        let blocks = parse("- one\n- **two**\n");
        let Block::List { kind, items } = &blocks[0] else {
            panic!("expected list, got {:?}", blocks);
        };
        assert_eq!(*kind, ListKind::Unordered);
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            vec![Block::Paragraph {
                content: vec![Inline::text("one")]
            }]
        );
        assert_eq!(
            items[1],
            vec![Block::Paragraph {
                content: vec![Inline::Strong {
                    content: vec![Inline::text("two")]
                }]
            }]
        );
    }

    #[test]
    fn test_parse_ordered_list_start() {
        let blocks = parse("3. c\n4. d\n");
        assert!(matches!(
            &blocks[0],
            Block::List {
                kind: ListKind::Ordered { start: 3 },
                ..
            }
        ));
    }

    #[test]
    fn test_parse_fenced_code_language() {
        let blocks = parse("```rust title\nfn main() {}\n```\n");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: Some("rust".to_string()),
                code: "fn main() {}\n".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_blockquote_and_link() {
        let blocks = parse("> see [docs](https://example.com)");
        let Block::BlockQuote { blocks: inner } = &blocks[0] else {
            panic!("expected quote, got {:?}", blocks);
        };
        let Block::Paragraph { content } = &inner[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            content[1],
            Inline::Link {
                href: "https://example.com".to_string(),
                content: vec![Inline::text("docs")]
            }
        );
    }

    #[test]
    fn test_parse_table() {
        let blocks = parse("| a | b |\n|---|---|\n| 1 | 2 |\n");
        let Block::Table { header, rows } = &blocks[0] else {
            panic!("expected table, got {:?}", blocks);
        };
        assert_eq!(header.len(), 2);
        assert_eq!(rows.len(), 1);
        assert_eq!(plain_text(&rows[0][1]), "2");
    }

    #[test]
    fn test_parse_raw_html_is_text() {
        let blocks = parse("hello <b>world</b>");
        let Block::Paragraph { content } = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(plain_text(content), "hello <b>world</b>");
    }

    #[test]
    fn test_plain_text() {
        let blocks = parse("*a* `b` [c](d)");
        let Block::Paragraph { content } = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(plain_text(content), "a b c");
    }
}

//! Markdown blocks as styled terminal lines

use ratatui::prelude::*;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style as SyntectStyle, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::markdown::{Block, HeadingTier, Inline, ListKind};

// Lazy static syntax highlighting resources
lazy_static::lazy_static! {
    static ref PS: SyntaxSet = SyntaxSet::load_defaults_newlines();
    static ref TS: ThemeSet = ThemeSet::load_defaults();
}

const CODE_THEME: &str = "base16-ocean.dark";

/// Render blocks to lines, one blank line between blocks
pub fn block_lines(blocks: &[Block]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.extend(render_block(block));
    }
    lines
}

fn render_block(block: &Block) -> Vec<Line<'static>> {
    match block {
        Block::Heading { tier, content } => {
            let style = match tier {
                HeadingTier::Primary => Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                HeadingTier::Secondary => Style::default().fg(Color::Green).bold(),
                HeadingTier::Tertiary => Style::default().bold(),
            };
            inline_lines(content, style)
        }
        Block::Paragraph { content } => inline_lines(content, Style::default()),
        Block::List { kind, items } => {
            let mut lines = Vec::new();
            for (i, item) in items.iter().enumerate() {
                let marker = match kind {
                    ListKind::Unordered => "• ".to_string(),
                    ListKind::Ordered { start } => format!("{}. ", start + i as u64),
                };
                let indent = " ".repeat(marker.chars().count());
                let body = compact_item(item);
                lines.extend(prefixed(
                    body,
                    Span::styled(marker, Style::default().fg(Color::Green)),
                    Span::raw(indent),
                ));
            }
            lines
        }
        Block::BlockQuote { blocks } => {
            let bar = || Span::styled("│ ", Style::default().fg(Color::Green));
            block_lines(blocks)
                .into_iter()
                .map(|line| {
                    let mut spans = vec![bar()];
                    spans.extend(
                        line.spans
                            .into_iter()
                            .map(|s| Span::styled(s.content, s.style.fg(Color::Gray))),
                    );
                    Line::from(spans)
                })
                .collect()
        }
        Block::CodeBlock { language, code } => code_lines(language.as_deref(), code),
        Block::Table { header, rows } => {
            let separator = || Span::styled(" │ ", Style::default().fg(Color::DarkGray));
            let row_line = |cells: &[Vec<Inline>], style: Style| {
                let mut spans = Vec::new();
                for (i, cell) in cells.iter().enumerate() {
                    if i > 0 {
                        spans.push(separator());
                    }
                    for line in inline_lines(cell, style) {
                        spans.extend(line.spans);
                    }
                }
                Line::from(spans)
            };
            let mut lines = vec![row_line(header, Style::default().bold())];
            lines.extend(rows.iter().map(|row| row_line(row, Style::default())));
            lines
        }
        Block::Rule => vec![Line::styled(
            "─".repeat(40),
            Style::default().fg(Color::DarkGray),
        )],
    }
}

/// Tight list items hold one paragraph; skip the blank separator lines
fn compact_item(item: &[Block]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for block in item {
        lines.extend(render_block(block));
    }
    lines
}

/// Prefix the first line with `first` and every following line with `rest`
fn prefixed(lines: Vec<Line<'static>>, first: Span<'static>, rest: Span<'static>) -> Vec<Line<'static>> {
    if lines.is_empty() {
        return vec![Line::from(first)];
    }
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let lead = if i == 0 { first.clone() } else { rest.clone() };
            let mut spans = vec![lead];
            spans.extend(line.spans);
            Line::from(spans)
        })
        .collect()
}

/// Render inline content, splitting on hard breaks
pub fn inline_lines(inlines: &[Inline], base: Style) -> Vec<Line<'static>> {
    let mut lines: Vec<Vec<Span<'static>>> = vec![Vec::new()];
    push_inlines(&mut lines, inlines, base);
    lines.into_iter().map(Line::from).collect()
}

fn push_span(lines: &mut Vec<Vec<Span<'static>>>, span: Span<'static>) {
    match lines.last_mut() {
        Some(line) => line.push(span),
        None => lines.push(vec![span]),
    }
}

fn push_inlines(lines: &mut Vec<Vec<Span<'static>>>, inlines: &[Inline], style: Style) {
    for inline in inlines {
        match inline {
            Inline::Text { text } => push_span(lines, Span::styled(text.clone(), style)),
            Inline::Strong { content } => push_inlines(lines, content, style.bold()),
            Inline::Emphasis { content } => push_inlines(lines, content, style.italic()),
            Inline::Strikethrough { content } => {
                push_inlines(lines, content, style.add_modifier(Modifier::CROSSED_OUT))
            }
            Inline::Code { code } => push_span(
                lines,
                Span::styled(code.clone(), style.fg(Color::Yellow).bg(Color::Black)),
            ),
            Inline::Link { href, content } => {
                push_inlines(lines, content, style.fg(Color::Blue).underlined());
                if crate::markdown::plain_text(content) != *href {
                    push_span(
                        lines,
                        Span::styled(format!(" <{}>", href), Style::default().fg(Color::DarkGray)),
                    );
                }
            }
            Inline::SoftBreak => push_span(lines, Span::styled(" ", style)),
            Inline::HardBreak => lines.push(Vec::new()),
        }
    }
}

/// Fenced code, highlighted when the language is known to syntect
fn code_lines(language: Option<&str>, code: &str) -> Vec<Line<'static>> {
    let gutter = || Span::styled("  ", Style::default());
    let plain = |code: &str| -> Vec<Line<'static>> {
        code.lines()
            .map(|l| {
                Line::from(vec![
                    gutter(),
                    Span::styled(l.to_string(), Style::default().fg(Color::Gray)),
                ])
            })
            .collect()
    };

    let syntax = language.and_then(|lang| PS.find_syntax_by_token(lang));
    let (Some(syntax), Some(theme)) = (syntax, TS.themes.get(CODE_THEME)) else {
        return plain(code);
    };

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut lines = Vec::new();
    for line in LinesWithEndings::from(code) {
        let mut spans = vec![gutter()];
        match highlighter.highlight_line(line, &PS) {
            Ok(ranges) => {
                for (style, text) in ranges {
                    let text = text.trim_end_matches(|c| c == '\n' || c == '\r');
                    if !text.is_empty() {
                        spans.push(Span::styled(text.to_string(), syntect_to_ratatui_style(style)));
                    }
                }
            }
            Err(_) => spans.push(Span::raw(line.trim_end().to_string())),
        }
        lines.push(Line::from(spans));
    }
    lines
}

/// Convert syntect Style to ratatui Style
fn syntect_to_ratatui_style(syntect_style: SyntectStyle) -> Style {
    let fg = syntect_style.foreground;
    Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::parse;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_paragraph_styles() {
        let lines = block_lines(&parse("a **b** *c*"));
        assert_eq!(lines.len(), 1);
        assert_eq!(text_of(&lines[0]), "a b c");
        assert!(lines[0].spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert!(lines[0].spans[3].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_lists_get_markers() {
        let lines = block_lines(&parse("- one\n- two\n\n3. three"));
        assert_eq!(text_of(&lines[0]), "• one");
        assert_eq!(text_of(&lines[1]), "• two");
        assert_eq!(text_of(&lines[2]), "");
        assert_eq!(text_of(&lines[3]), "3. three");
    }

    #[test]
    fn test_blockquote_bar() {
        let lines = block_lines(&parse("> quoted"));
        assert_eq!(text_of(&lines[0]), "│ quoted");
    }

    #[test]
    fn test_code_block_plain_and_highlighted() {
        let plain = block_lines(&parse("```\nx = 1\n```"));
        assert_eq!(text_of(&plain[0]), "  x = 1");

        let highlighted = block_lines(&parse("```rust\nlet x = 1;\n```"));
        assert_eq!(highlighted.len(), 1);
        assert_eq!(text_of(&highlighted[0]), "  let x = 1;");
        assert!(highlighted[0].spans.len() > 2);
    }

    #[test]
    fn test_link_shows_target() {
        let lines = block_lines(&parse("[docs](https://example.com)"));
        assert_eq!(text_of(&lines[0]), "docs <https://example.com>");
    }

    #[test]
    fn test_hard_break_splits_lines() {
        let lines = block_lines(&parse("a  \nb"));
        assert_eq!(lines.len(), 2);
    }
}

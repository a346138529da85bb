//! HTML mapping for markdown blocks
//!
//! Each block type maps to a fixed element and class so the report stylesheet
//! controls presentation. Fenced code with a recognised language tag is
//! highlighted with syntect; links always open in a new context.

use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use super::{Block, HeadingTier, Inline, ListKind};

lazy_static::lazy_static! {
    static ref SYNTAXES: SyntaxSet = SyntaxSet::load_defaults_newlines();
    static ref THEMES: ThemeSet = ThemeSet::load_defaults();
}

/// Render blocks to an HTML fragment using `code_theme` for fenced code
pub fn render(blocks: &[Block], code_theme: &str) -> String {
    let mut out = String::new();
    for block in blocks {
        render_block(&mut out, block, code_theme);
    }
    out
}

fn render_block(out: &mut String, block: &Block, code_theme: &str) {
    match block {
        Block::Heading { tier, content } => {
            let tag = match tier {
                HeadingTier::Primary => "h1",
                HeadingTier::Secondary => "h2",
                HeadingTier::Tertiary => "h3",
            };
            out.push_str(&format!("<{} class=\"md-heading\">", tag));
            render_inlines(out, content);
            out.push_str(&format!("</{}>\n", tag));
        }
        Block::Paragraph { content } => {
            out.push_str("<p>");
            render_inlines(out, content);
            out.push_str("</p>\n");
        }
        Block::List { kind, items } => {
            let (open, close) = match kind {
                ListKind::Unordered => ("<ul class=\"md-list\">".to_string(), "</ul>"),
                ListKind::Ordered { start: 1 } => ("<ol class=\"md-list\">".to_string(), "</ol>"),
                ListKind::Ordered { start } => {
                    (format!("<ol class=\"md-list\" start=\"{}\">", start), "</ol>")
                }
            };
            out.push_str(&open);
            out.push('\n');
            for item in items {
                out.push_str("<li>");
                render_item(out, item, code_theme);
                out.push_str("</li>\n");
            }
            out.push_str(close);
            out.push('\n');
        }
        Block::BlockQuote { blocks } => {
            out.push_str("<blockquote class=\"md-quote\">\n");
            for inner in blocks {
                render_block(out, inner, code_theme);
            }
            out.push_str("</blockquote>\n");
        }
        Block::CodeBlock { language, code } => {
            out.push_str(&render_code_block(language.as_deref(), code, code_theme));
        }
        Block::Table { header, rows } => {
            out.push_str("<table class=\"md-table\">\n<thead><tr>");
            for cell in header {
                out.push_str("<th>");
                render_inlines(out, cell);
                out.push_str("</th>");
            }
            out.push_str("</tr></thead>\n<tbody>\n");
            for row in rows {
                out.push_str("<tr>");
                for cell in row {
                    out.push_str("<td>");
                    render_inlines(out, cell);
                    out.push_str("</td>");
                }
                out.push_str("</tr>\n");
            }
            out.push_str("</tbody>\n</table>\n");
        }
        Block::Rule => out.push_str("<hr>\n"),
    }
}

/// Tight list items hold a single paragraph; render it without `<p>` so
/// spacing stays consistent with the list styling
fn render_item(out: &mut String, blocks: &[Block], code_theme: &str) {
    match blocks {
        [Block::Paragraph { content }] => render_inlines(out, content),
        _ => {
            for block in blocks {
                render_block(out, block, code_theme);
            }
        }
    }
}

fn render_inlines(out: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        match inline {
            Inline::Text { text } => out.push_str(&html_escape(text)),
            Inline::Strong { content } => wrap(out, "strong", content),
            Inline::Emphasis { content } => wrap(out, "em", content),
            Inline::Strikethrough { content } => wrap(out, "del", content),
            Inline::Code { code } => {
                out.push_str("<code class=\"md-code\">");
                out.push_str(&html_escape(code));
                out.push_str("</code>");
            }
            Inline::Link { href, content } if !is_safe_href(href) => {
                tracing::debug!("dropping link with unsafe scheme");
                render_inlines(out, content);
            }
            Inline::Link { href, content } => {
                out.push_str(&format!(
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">",
                    html_escape(href)
                ));
                render_inlines(out, content);
                out.push_str("</a>");
            }
            Inline::SoftBreak => out.push('\n'),
            Inline::HardBreak => out.push_str("<br>\n"),
        }
    }
}

/// Relative, fragment and http(s)/mailto targets only
///
/// A colon before the first `/`, `?` or `#` marks a scheme; anything other
/// than the allowed ones (compared case-insensitively) is rejected.
pub fn is_safe_href(href: &str) -> bool {
    const ALLOWED: [&str; 3] = ["http", "https", "mailto"];

    let Some(colon) = href.find(':') else {
        return true;
    };
    if href[..colon].contains(['/', '?', '#']) {
        return true;
    }
    let scheme = &href[..colon];
    ALLOWED.iter().any(|allowed| scheme.eq_ignore_ascii_case(allowed))
}

fn wrap(out: &mut String, tag: &str, content: &[Inline]) {
    out.push_str(&format!("<{}>", tag));
    render_inlines(out, content);
    out.push_str(&format!("</{}>", tag));
}

fn render_code_block(language: Option<&str>, code: &str, code_theme: &str) -> String {
    let code = code.strip_suffix('\n').unwrap_or(code);

    let highlighted = language
        .and_then(|lang| SYNTAXES.find_syntax_by_token(lang))
        .zip(THEMES.themes.get(code_theme))
        .and_then(|(syntax, theme)| {
            highlighted_html_for_string(code, &SYNTAXES, syntax, theme)
                .map_err(|e| tracing::debug!("highlighting failed: {}", e))
                .ok()
        });

    match highlighted {
        Some(html) => format!("<div class=\"md-codeblock\">{}</div>\n", html),
        None => format!(
            "<pre class=\"md-codeblock\"><code>{}</code></pre>\n",
            html_escape(code)
        ),
    }
}

/// Escape text for HTML element content and attribute values
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{parse, render_blocks};

    const THEME: &str = "InspiredGitHub";

    #[test]
    fn test_links_open_in_new_context() {
        let html = render(&parse("[site](https://example.com)"), THEME);
        assert!(html.contains(r#"href="https://example.com""#));
        assert!(html.contains(r#"target="_blank""#));
        assert!(html.contains(r#"rel="noopener noreferrer""#));
    }

    #[test]
    fn test_unsafe_link_schemes_render_as_text() {
        for md in [
            "[click](javascript:alert(document.cookie))",
            "[click](JavaScript:alert(1))",
            "[click](data:text/html;base64,PHNjcmlwdD4=)",
            "[click](vbscript:msgbox)",
        ] {
            let html = render(&parse(md), THEME);
            assert!(!html.contains("<a "), "{} kept a live link: {}", md, html);
            assert!(html.contains("click"));
        }
    }

    #[test]
    fn test_safe_hrefs() {
        assert!(is_safe_href("https://example.com/a:b"));
        assert!(is_safe_href("HTTP://example.com"));
        assert!(is_safe_href("mailto:someone@example.com"));
        assert!(is_safe_href("#interviews"));
        assert!(is_safe_href("docs/report.html"));
        assert!(is_safe_href("./a?x=1:2"));
        assert!(!is_safe_href("javascript:void(0)"));
        assert!(!is_safe_href(" javascript:void(0)"));
        assert!(!is_safe_href("data:text/html,hi"));

        let html = render(&parse("[mail](mailto:a@b.c) [top](#reportTitle)"), THEME);
        assert!(html.contains(r#"href="mailto:a@b.c""#));
        assert!(html.contains(r##"href="#reportTitle""##));
    }

    #[test]
    fn test_heading_tiers_capped_at_h3() {
        let html = render(&parse("# a\n\n##### e"), THEME);
        assert!(html.contains("<h1 class=\"md-heading\">a</h1>"));
        assert!(html.contains("<h3 class=\"md-heading\">e</h3>"));
        assert!(!html.contains("<h5"));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = render(&parse("a <script>alert(1)</script> & b"), THEME);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&amp; b"));
    }

    #[test]
    fn test_strong_after_normalize() {
        let html = render(&render_blocks("**重要**内容"), THEME);
        assert_eq!(html, "<p><strong>重要</strong> 内容</p>\n");
    }

    #[test]
    fn test_lists_and_quotes() {
        let html = render(&parse("- a\n- b\n\n> quoted"), THEME);
        assert!(html.contains("<ul class=\"md-list\">\n<li>a</li>\n<li>b</li>\n</ul>"));
        assert!(html.contains("<blockquote class=\"md-quote\">\n<p>quoted</p>\n</blockquote>"));
    }

    #[test]
    fn test_ordered_list_start_attribute() {
        let html = render(&parse("2. b\n3. c"), THEME);
        assert!(html.contains("<ol class=\"md-list\" start=\"2\">"));
    }

    #[test]
    fn test_fenced_code_highlighted_with_known_language() {
        let html = render(&parse("```rust\nfn main() {}\n```"), THEME);
        assert!(html.contains("<div class=\"md-codeblock\">"));
        assert!(html.contains("<pre style="));
    }

    #[test]
    fn test_fenced_code_plain_without_language() {
        let html = render(&parse("```\n<tag>\n```"), THEME);
        assert_eq!(
            html,
            "<pre class=\"md-codeblock\"><code>&lt;tag&gt;</code></pre>\n"
        );
    }

    #[test]
    fn test_unknown_theme_falls_back_to_plain() {
        let html = render(&parse("```rust\nlet x = 1;\n```"), "no-such-theme");
        assert!(html.starts_with("<pre class=\"md-codeblock\"><code>"));
    }

    #[test]
    fn test_inline_code() {
        let html = render(&parse("use `cargo`"), THEME);
        assert_eq!(html, "<p>use <code class=\"md-code\">cargo</code></p>\n");
    }
}

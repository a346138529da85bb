//! Self-contained HTML report with inline SVG charts and scroll-spy navigation

use std::io::{self, Write};

use chrono::{DateTime, Local};

use crate::chart::ChartType;
use crate::config::Config;
use crate::markdown::html::{html_escape, render as render_markdown};
use crate::markdown::Block;
use crate::report::{anchors, svg, InterviewBlock, Labels, QuestionBlock, Report};

#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// syntect theme for fenced code blocks
    pub code_theme: String,
    /// Scroll-spy look-ahead in pixels
    pub lookahead: usize,
    pub generated_at: DateTime<Local>,
}

impl HtmlOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            code_theme: config.report.code_theme.clone(),
            lookahead: config.navigation.lookahead,
            generated_at: Local::now(),
        }
    }
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Render `report` into a string
pub fn to_string(report: &Report, options: &HtmlOptions) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write(&mut buf, report, options);
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn write<W: Write>(writer: &mut W, report: &Report, options: &HtmlOptions) -> io::Result<()> {
    let labels = report.labels();
    let lang = match report.locale {
        crate::report::Locale::Zh => "zh-CN",
        crate::report::Locale::En => "en",
    };

    write!(
        writer,
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        :root {{
            --accent: #3a7e6d;
            --accent-dark: #2c5a4f;
            --accent-soft: rgba(58, 126, 109, 0.08);
            --text: #1f2937;
            --dim: #6b7280;
            --border: #e5e7eb;
            --card: #ffffff;
            --bg: #f7faf9;
        }}
        * {{ box-sizing: border-box; }}
        body {{
            margin: 0;
            font-family: -apple-system, BlinkMacSystemFont, 'PingFang SC', 'Microsoft YaHei', 'Helvetica Neue', Arial, sans-serif;
            background: var(--bg);
            color: var(--text);
            line-height: 1.7;
        }}

        /* Table of contents */
        .toc {{
            position: fixed;
            top: 1.5rem;
            left: 0;
            z-index: 50;
            transition: left 300ms;
        }}
        .toc.collapsed {{ left: -16rem; }}
        .toc-toggle {{
            position: absolute;
            right: -3rem;
            top: 0;
            background: var(--accent);
            color: #fff;
            border: none;
            border-radius: 9999px;
            padding: 0.5rem 0.75rem;
            cursor: pointer;
        }}
        .toc-toggle:hover {{ background: var(--accent-dark); }}
        .toc-panel {{
            width: 16rem;
            max-height: calc(100vh - 4rem);
            overflow-y: auto;
            padding: 1.5rem;
            background: rgba(255, 255, 255, 0.9);
            backdrop-filter: blur(10px);
            border-radius: 0 0.75rem 0.75rem 0;
            box-shadow: 0 10px 15px -3px rgba(0,0,0,0.1), 0 4px 6px -2px rgba(0,0,0,0.05);
            transition: opacity 300ms;
        }}
        .toc.collapsed .toc-panel {{ opacity: 0; }}
        .toc-panel h3 {{
            margin: 0 0 1.25rem;
            padding-bottom: 0.5rem;
            font-size: 1.125rem;
            border-bottom: 1px solid rgba(58, 126, 109, 0.2);
        }}
        .toc-panel a {{
            display: block;
            color: gray;
            text-decoration: none;
            transition: color 200ms;
        }}
        .toc-panel a:hover, .toc-panel a.active {{ color: var(--accent); }}
        .toc-depth-0 {{ font-size: 0.875rem; font-weight: 500; margin-top: 0.75rem; }}
        .toc-depth-1 {{ font-size: 0.75rem; margin: 0.4rem 0 0 1rem; }}

        /* Report */
        .report {{ max-width: 1100px; margin: 0 auto; padding: 3rem 2rem 2rem 2rem; }}
        .report-title {{ text-align: center; font-size: 2rem; color: var(--accent); margin: 0 0 2rem; }}
        .section-title {{
            color: var(--accent);
            font-size: 1.5rem;
            margin: 2.5rem 0 1rem;
            padding-bottom: 0.5rem;
            border-bottom: 1px solid var(--border);
        }}
        .summary-box, .question, .interview {{
            background: var(--card);
            border: 1px solid var(--border);
            border-radius: 0.75rem;
            padding: 1.5rem;
            margin-bottom: 1.5rem;
            box-shadow: 0 1px 3px rgba(0,0,0,0.06);
        }}
        .question-title {{ margin: 0 0 1rem; font-size: 1.15rem; }}
        .question-body {{ display: flex; gap: 1.5rem; align-items: flex-start; flex-wrap: wrap; }}
        .question-body.bar {{ flex-direction: column; }}
        .chart-area {{ display: flex; gap: 1rem; align-items: center; }}
        .question-body.bar .chart-area {{ width: 100%; }}
        .legend {{ list-style: none; margin: 0; padding: 0; font-size: 0.8rem; max-width: 16rem; }}
        .legend li {{ display: flex; align-items: center; gap: 0.4rem; margin: 0.2rem 0; overflow-wrap: anywhere; }}
        .swatch {{ flex: none; width: 0.75rem; height: 0.75rem; border-radius: 2px; }}
        .question-side {{ flex: 1; min-width: 16rem; }}
        .question-summary {{ background: var(--accent-soft); border-radius: 0.5rem; padding: 1rem; }}
        .question-summary h4 {{ margin: 0 0 0.5rem; color: var(--accent); }}
        .slice:hover, .bar:hover {{ opacity: 0.8; }}
        .toggle-btn {{
            display: block;
            margin: 0.75rem 0 0 auto;
            background: none;
            border: 1px solid var(--accent);
            color: var(--accent);
            border-radius: 9999px;
            padding: 0.25rem 0.9rem;
            cursor: pointer;
        }}
        .options {{ margin: 0.75rem 0 0; padding-left: 1.25rem; font-size: 0.9rem; }}
        .hidden {{ display: none; }}
        .placeholder {{ color: var(--dim); font-style: italic; }}

        /* Interviews */
        .interview-header {{ border-bottom: 1px solid var(--border); padding-bottom: 1rem; margin-bottom: 1rem; }}
        .interview-header h3 {{ margin: 0 0 0.25rem; }}
        .profile {{ color: var(--dim); font-size: 0.9rem; }}
        .profile.description {{ font-style: italic; }}
        .exchange {{ margin: 0.75rem 0; }}
        .exchange .q {{ font-weight: 600; color: var(--accent); }}
        .exchange .a {{ font-weight: 600; color: #b7791f; }}
        .interview-summary {{ margin-top: 1rem; background: var(--accent-soft); border-radius: 0.5rem; padding: 1rem; }}

        /* Markdown */
        .markdown-content h1.md-heading {{ font-size: 1.4rem; font-weight: 700; }}
        .markdown-content h2.md-heading {{ font-size: 1.2rem; font-weight: 600; }}
        .markdown-content h3.md-heading {{ font-size: 1.05rem; font-weight: 600; }}
        .md-list {{ padding-left: 1.5rem; margin: 0.5rem 0; }}
        .md-list li {{ margin: 0.25rem 0; }}
        .md-quote {{ border-left: 4px solid var(--accent); margin: 0.75rem 0; padding: 0.25rem 1rem; color: #4b5563; }}
        .md-code {{ background: #f3f4f6; border-radius: 4px; padding: 0.1rem 0.35rem; font-size: 0.9em; }}
        .md-codeblock {{ overflow-x: auto; border-radius: 0.5rem; }}
        pre.md-codeblock {{ background: #f3f4f6; padding: 0.75rem; }}
        .md-codeblock pre {{ padding: 0.75rem; margin: 0; }}
        .md-table {{ border-collapse: collapse; margin: 0.75rem 0; }}
        .md-table th, .md-table td {{ border: 1px solid var(--border); padding: 0.3rem 0.6rem; }}
        .markdown-content a {{ color: var(--accent); }}

        .footer {{ text-align: center; color: var(--dim); font-size: 0.8rem; padding: 2rem 0; }}

        @media print {{
            .toc, .toggle-btn {{ display: none; }}
            .hidden {{ display: block; }}
            .question, .interview {{ break-inside: avoid; box-shadow: none; }}
        }}
    </style>
</head>
<body>
"#,
        lang = lang,
        title = html_escape(&report.title),
    )?;

    write_toc(writer, report, labels)?;

    writeln!(writer, r#"<main class="report">"#)?;
    writeln!(
        writer,
        r#"<h1 class="report-title" id="{}">{}</h1>"#,
        anchors::REPORT_TITLE,
        html_escape(&report.title)
    )?;

    // Overview: the suggestion sits inside the overall-analysis section
    writeln!(writer, r#"<section id="{}">"#, anchors::TOTAL_ANALYSIS)?;
    writeln!(writer, r#"<h2 class="section-title">{}</h2>"#, labels.total_analysis)?;
    write_markdown_box(writer, "summary-box", &report.overview.summary, options)?;
    writeln!(writer, r#"<h2 class="section-title">{}</h2>"#, labels.suggestion)?;
    write_markdown_box(writer, "summary-box", &report.overview.suggestion, options)?;
    writeln!(writer, "</section>")?;

    writeln!(writer, r#"<section id="{}">"#, anchors::DETAILED_STATS)?;
    writeln!(writer, r#"<h2 class="section-title">{}</h2>"#, labels.detailed_stats)?;
    if report.questions.is_empty() {
        writeln!(writer, r#"<p class="placeholder">{}</p>"#, labels.no_stats)?;
    }
    for question in &report.questions {
        write_question(writer, question, labels, options)?;
    }
    writeln!(writer, "</section>")?;

    writeln!(writer, r#"<section id="{}">"#, anchors::INTERVIEWS)?;
    writeln!(writer, r#"<h2 class="section-title">{}</h2>"#, labels.interviews)?;
    if report.interviews.is_empty() {
        writeln!(writer, r#"<p class="placeholder">{}</p>"#, labels.no_interviews)?;
    }
    for interview in &report.interviews {
        write_interview(writer, interview, labels, options)?;
    }
    writeln!(writer, "</section>")?;

    writeln!(
        writer,
        r#"<footer class="footer">{}: {}</footer>"#,
        labels.generated_at,
        options.generated_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(writer, "</main>")?;

    write_script(writer, report, options)?;
    writeln!(writer, "</body>\n</html>")?;
    Ok(())
}

fn write_toc<W: Write>(writer: &mut W, report: &Report, labels: &Labels) -> io::Result<()> {
    writeln!(writer, r#"<aside class="toc" id="toc">"#)?;
    writeln!(
        writer,
        r#"<button class="toc-toggle" id="toc-toggle" type="button">&larr;</button>"#
    )?;
    writeln!(writer, r#"<div class="toc-panel"><h3>{}</h3><nav>"#, labels.toc_heading)?;
    for entry in &report.toc {
        writeln!(
            writer,
            r##"<a href="#{id}" class="toc-depth-{depth}" data-section="{id}">{label}</a>"##,
            id = entry.id,
            depth = entry.depth,
            label = html_escape(&entry.label)
        )?;
    }
    writeln!(writer, "</nav></div>\n</aside>")
}

fn write_markdown_box<W: Write>(
    writer: &mut W,
    class: &str,
    blocks: &[Block],
    options: &HtmlOptions,
) -> io::Result<()> {
    writeln!(
        writer,
        r#"<div class="{} markdown-content">{}</div>"#,
        class,
        render_markdown(blocks, &options.code_theme)
    )
}

fn write_question<W: Write>(
    writer: &mut W,
    question: &QuestionBlock,
    labels: &Labels,
    options: &HtmlOptions,
) -> io::Result<()> {
    let layout = question.chart.chart_type.as_str();
    writeln!(writer, r#"<div class="question" id="{}">"#, question.id)?;
    writeln!(
        writer,
        r#"<h3 class="question-title">{}</h3>"#,
        html_escape(&question.question)
    )?;
    writeln!(writer, r#"<div class="question-body {}">"#, layout)?;

    if !question.chart.is_empty() {
        let chart = match question.chart.chart_type {
            ChartType::Pie => svg::pie(&question.chart),
            ChartType::Bar => svg::bar(&question.chart),
        };
        writeln!(writer, r#"<div class="chart-area">{}"#, chart)?;
        if question.chart.chart_type == ChartType::Pie {
            writeln!(writer, r#"<ul class="legend">"#)?;
            for (i, record) in question.chart.records.iter().enumerate() {
                writeln!(
                    writer,
                    r#"<li><span class="swatch" style="background:{}"></span>{}</li>"#,
                    svg::color(i),
                    html_escape(&record.name)
                )?;
            }
            writeln!(writer, "</ul>")?;
        }
        writeln!(writer, "</div>")?;
    }

    writeln!(writer, r#"<div class="question-side">"#)?;
    writeln!(
        writer,
        r#"<div class="question-summary"><h4>{}</h4><div class="markdown-content">{}</div></div>"#,
        labels.result_summary,
        render_markdown(&question.summary, &options.code_theme)
    )?;

    if question.options.is_empty() {
        writeln!(writer, r#"<p class="placeholder">{}</p>"#, labels.no_options)?;
    } else {
        let show = labels.show_options(question.options.len());
        writeln!(
            writer,
            r#"<button class="toggle-btn" type="button" data-target="options-{id}" data-show="{show}" data-hide="{hide}">{show}</button>"#,
            id = question.id,
            show = html_escape(&show),
            hide = html_escape(labels.hide_options),
        )?;
        writeln!(
            writer,
            r#"<ol class="options hidden" id="options-{}">"#,
            question.id
        )?;
        for (i, answer) in question.options.iter().enumerate() {
            writeln!(writer, "<li>{}</li>", html_escape(&labels.option_line(i + 1, answer)))?;
        }
        writeln!(writer, "</ol>")?;
    }

    writeln!(writer, "</div>\n</div>\n</div>")
}

fn write_interview<W: Write>(
    writer: &mut W,
    interview: &InterviewBlock,
    labels: &Labels,
    options: &HtmlOptions,
) -> io::Result<()> {
    writeln!(writer, r#"<div class="interview" id="{}">"#, interview.id)?;
    writeln!(writer, r#"<div class="interview-header">"#)?;
    writeln!(writer, "<h3>{}</h3>", html_escape(&interview.heading))?;
    writeln!(writer, r#"<div class="profile">{}</div>"#, html_escape(&interview.profile))?;
    if let Some(description) = &interview.description {
        writeln!(
            writer,
            r#"<div class="profile description">{}</div>"#,
            html_escape(description)
        )?;
    }
    writeln!(writer, "</div>")?;

    writeln!(writer, "<h4>{}</h4>", labels.transcript)?;
    if interview.exchanges.is_empty() {
        writeln!(writer, r#"<p class="placeholder">{}</p>"#, labels.no_exchanges)?;
    }
    for exchange in &interview.exchanges {
        writeln!(
            writer,
            r#"<div class="exchange"><div><span class="q">{}</span> {}</div><div><span class="a">{}</span> {}</div></div>"#,
            labels.question_prefix,
            html_escape(&exchange.question),
            labels.answer_prefix,
            html_escape(&exchange.answer)
        )?;
    }

    if let Some(summary) = &interview.summary {
        writeln!(
            writer,
            r#"<div class="interview-summary"><h4>{}</h4><div class="markdown-content">{}</div></div>"#,
            labels.interview_summary,
            render_markdown(summary, &options.code_theme)
        )?;
    }

    writeln!(writer, "</div>")
}

/// Panel toggle, option toggles and the scroll-spy. The spy walks the
/// registered id list; the last section containing `scrollY + lookahead` wins
/// and the previous highlight stays when nothing matches.
fn write_script<W: Write>(writer: &mut W, report: &Report, options: &HtmlOptions) -> io::Result<()> {
    let ids = serde_json::to_string(&report.section_ids()).map_err(io::Error::other)?;
    write!(
        writer,
        r#"<script>
(function () {{
    const SECTION_IDS = {ids};
    const LOOKAHEAD = {lookahead};
    const toc = document.getElementById('toc');
    const toggle = document.getElementById('toc-toggle');
    toggle.addEventListener('click', function () {{
        const collapsed = toc.classList.toggle('collapsed');
        toggle.innerHTML = collapsed ? '&rarr;' : '&larr;';
    }});

    document.querySelectorAll('.toggle-btn').forEach(function (btn) {{
        btn.addEventListener('click', function () {{
            const list = document.getElementById(btn.dataset.target);
            const hidden = list.classList.toggle('hidden');
            btn.textContent = hidden ? btn.dataset.show : btn.dataset.hide;
        }});
    }});

    const links = {{}};
    document.querySelectorAll('.toc-panel a').forEach(function (a) {{
        links[a.dataset.section] = a;
    }});

    let active = '';
    function onScroll() {{
        const cursor = window.scrollY + LOOKAHEAD;
        let next = null;
        SECTION_IDS.forEach(function (id) {{
            const el = document.getElementById(id);
            if (!el) return;
            const top = el.getBoundingClientRect().top + window.scrollY;
            if (cursor >= top && cursor < top + el.offsetHeight) next = id;
        }});
        if (next === null || next === active) return;
        if (links[active]) links[active].classList.remove('active');
        active = next;
        if (links[active]) links[active].classList.add('active');
    }}
    window.addEventListener('scroll', onScroll, {{ passive: true }});
    onScroll();
}})();
</script>
"#,
        ids = ids,
        lookahead = options.lookahead,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Answer, QuestionStat, SurveyDocument};
    use crate::report::{Locale, ReportOptions};

    fn render(doc: &SurveyDocument) -> String {
        let report = Report::assemble(doc, &ReportOptions::default());
        to_string(&report, &HtmlOptions::default())
    }

    fn doc_with_stats(n: usize) -> SurveyDocument {
        SurveyDocument {
            topic: Some("测试".to_string()),
            stats: (0..n)
                .map(|i| QuestionStat {
                    question: format!("问题 {}", i),
                    summary: "**好**评".to_string(),
                    answers: vec![Answer::new("① 是", 3.0), Answer::new("② 否", 1.0)],
                })
                .collect(),
            ..SurveyDocument::default()
        }
    }

    #[test]
    fn test_empty_document_renders_placeholders() {
        let html = render(&SurveyDocument::default());
        assert!(html.contains("未提供有效的统计数据。"));
        assert!(html.contains("无详细访谈记录。"));
        assert!(html.contains("未提供总体总结。"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_section_anchors_present() {
        let html = render(&doc_with_stats(3));
        for id in [
            "reportTitle",
            "totalAnalysis",
            "detailedStats",
            "interviews",
            "question-0",
            "question-1",
            "question-2",
        ] {
            assert!(html.contains(&format!("id=\"{}\"", id)), "missing {}", id);
            assert!(html.contains(&format!("href=\"#{}\"", id)), "missing link {}", id);
        }
        assert!(!html.contains("id=\"question-3\""));
    }

    #[test]
    fn test_option_listing_collapsed_by_default() {
        let html = render(&doc_with_stats(1));
        assert!(html.contains(r#"<ol class="options hidden" id="options-question-0">"#));
        assert!(html.contains("查看所有选项 (2条)"));
        assert!(html.contains("<li>选项 1: ① 是 (3票)</li>"));
    }

    #[test]
    fn test_question_without_options_has_no_toggle() {
        let mut doc = doc_with_stats(1);
        doc.stats[0].answers.clear();
        let html = render(&doc);
        assert!(html.contains("无详细选项数据。"));
        assert!(!html.contains("toggle-btn\" type"));
    }

    #[test]
    fn test_scroll_spy_script_uses_registry() {
        let html = render(&doc_with_stats(2));
        assert!(html.contains(
            r#"const SECTION_IDS = ["reportTitle","totalAnalysis","detailedStats","question-0","question-1","interviews"];"#
        ));
        assert!(html.contains("const LOOKAHEAD = 100;"));
    }

    #[test]
    fn test_summary_markdown_normalised() {
        let html = render(&doc_with_stats(1));
        assert!(html.contains("<strong>好</strong> 评"));
    }

    #[test]
    fn test_title_is_escaped() {
        let doc = SurveyDocument {
            topic: Some("<b>x</b>".to_string()),
            ..SurveyDocument::default()
        };
        let html = render(&doc);
        assert!(html.contains("<title>&lt;b&gt;x&lt;/b&gt; - 调查结果报告</title>"));
    }

    #[test]
    fn test_english_locale() {
        let report = Report::assemble(
            &SurveyDocument::default(),
            &ReportOptions {
                locale: Locale::En,
                ..ReportOptions::default()
            },
        );
        let html = to_string(&report, &HtmlOptions::default());
        assert!(html.contains(r#"<html lang="en">"#));
        assert!(html.contains("No interview records."));
    }
}

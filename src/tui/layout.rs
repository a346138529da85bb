//! Report layout for the terminal
//!
//! Flattens a [`Report`] into styled lines and registers every section with
//! its wrapped top row and height, in document order, for the scroll-spy.

use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};

use crate::chart::{format_count, ChartData, ChartType};
use crate::navigator::SectionMetrics;
use crate::report::{anchors, svg, ExpansionState, InterviewBlock, Labels, QuestionBlock, Report};

use super::markdown::block_lines;

/// Widest chart bar in cells
const MAX_BAR: usize = 30;

#[derive(Debug, Clone, Default)]
pub struct ReportLayout {
    pub lines: Vec<Line<'static>>,
    /// Sections in document order; nested sections follow their parent
    pub sections: Vec<SectionMetrics>,
    /// Wrapped height of all lines
    pub rows: usize,
}

impl ReportLayout {
    pub fn section_tops(&self) -> Vec<usize> {
        let mut tops: Vec<usize> = self.sections.iter().map(|s| s.top).collect();
        tops.sort_unstable();
        tops.dedup();
        tops
    }
}

/// Rows `lines` occupy when wrapped to `width`
pub fn rendered_height(lines: &[Line<'static>], width: u16) -> usize {
    if lines.is_empty() {
        return 0;
    }
    Paragraph::new(lines.to_vec())
        .wrap(Wrap { trim: false })
        .line_count(width.max(1))
}

struct LayoutBuilder {
    width: u16,
    layout: ReportLayout,
}

impl LayoutBuilder {
    fn new(width: u16) -> Self {
        Self {
            width,
            layout: ReportLayout::default(),
        }
    }

    fn push(&mut self, lines: Vec<Line<'static>>) {
        self.layout.rows += rendered_height(&lines, self.width);
        self.layout.lines.extend(lines);
    }

    fn push_line(&mut self, line: Line<'static>) {
        self.push(vec![line]);
    }

    fn blank(&mut self) {
        self.push_line(Line::default());
    }

    /// Register a section starting at the current row
    fn open(&mut self, id: &str) -> usize {
        self.layout
            .sections
            .push(SectionMetrics::new(id, self.layout.rows, 0));
        self.layout.sections.len() - 1
    }

    fn close(&mut self, index: usize) {
        let rows = self.layout.rows;
        if let Some(section) = self.layout.sections.get_mut(index) {
            section.height = rows - section.top;
        }
    }

    fn finish(self) -> ReportLayout {
        self.layout
    }
}

/// Lay out the report for a content pane `width` cells wide
pub fn build(report: &Report, expansion: &ExpansionState, width: u16) -> ReportLayout {
    let labels = report.labels();
    let mut b = LayoutBuilder::new(width);

    let title = b.open(anchors::REPORT_TITLE);
    b.push_line(Line::styled(
        report.title.clone(),
        Style::default().fg(Color::Green).bold(),
    ));
    b.blank();
    b.close(title);

    let overview = b.open(anchors::TOTAL_ANALYSIS);
    b.push(section_heading(labels.total_analysis));
    b.push(block_lines(&report.overview.summary));
    b.blank();
    b.push(section_heading(labels.suggestion));
    b.push(block_lines(&report.overview.suggestion));
    b.blank();
    b.close(overview);

    let stats = b.open(anchors::DETAILED_STATS);
    b.push(section_heading(labels.detailed_stats));
    if report.questions.is_empty() {
        b.push_line(placeholder(labels.no_stats));
        b.blank();
    }
    for question in &report.questions {
        let index = b.open(&question.id);
        b.push(question_lines(question, expansion, labels));
        b.close(index);
    }
    b.close(stats);

    let interviews = b.open(anchors::INTERVIEWS);
    b.push(section_heading(labels.interviews));
    if report.interviews.is_empty() {
        b.push_line(placeholder(labels.no_interviews));
        b.blank();
    }
    for interview in &report.interviews {
        let index = b.open(&interview.id);
        b.push(interview_lines(interview, labels));
        b.close(index);
    }
    b.close(interviews);

    b.finish()
}

fn section_heading(text: &str) -> Vec<Line<'static>> {
    vec![
        Line::styled(
            format!("━━ {}", text),
            Style::default().fg(Color::Green).bold(),
        ),
        Line::default(),
    ]
}

fn sub_heading(text: &str) -> Line<'static> {
    Line::styled(text.to_string(), Style::default().fg(Color::Cyan).bold())
}

fn placeholder(text: &str) -> Line<'static> {
    Line::styled(
        text.trim_matches('*').to_string(),
        Style::default().fg(Color::DarkGray).italic(),
    )
}

fn question_lines(
    question: &QuestionBlock,
    expansion: &ExpansionState,
    labels: &Labels,
) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::styled(
            format!("■ {}", question.question),
            Style::default().bold(),
        ),
        Line::default(),
    ];

    lines.extend(chart_lines(&question.chart));
    if !question.chart.is_empty() {
        lines.push(Line::default());
    }

    lines.push(sub_heading(labels.result_summary));
    lines.extend(block_lines(&question.summary));
    lines.push(Line::default());

    if question.options.is_empty() {
        lines.push(placeholder(labels.no_options));
    } else if expansion.is_expanded(&question.id) {
        lines.push(Line::styled(
            format!("▾ {}", labels.hide_options),
            Style::default().fg(Color::Green),
        ));
        for (i, answer) in question.options.iter().enumerate() {
            lines.push(Line::raw(format!("   {}", labels.option_line(i + 1, answer))));
        }
    } else {
        lines.push(Line::styled(
            format!("▸ {}", labels.show_options(question.options.len())),
            Style::default().fg(Color::Green),
        ));
    }
    lines.push(Line::default());
    lines
}

/// Horizontal bars for both chart types; pie charts also show the share
pub fn chart_lines(chart: &ChartData) -> Vec<Line<'static>> {
    let max = chart
        .records
        .iter()
        .map(|r| r.value)
        .fold(0.0_f64, f64::max);

    chart
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let color = palette_color(i);
            let cells = if max > 0.0 {
                ((record.value / max) * MAX_BAR as f64).round() as usize
            } else {
                0
            };
            let detail = match chart.chart_type {
                ChartType::Pie => format!(
                    " {} ({})",
                    format_count(record.value),
                    chart.percentage_label(record.value)
                ),
                ChartType::Bar => format!(" {}", format_count(record.value)),
            };
            Line::from(vec![
                Span::styled("● ", Style::default().fg(color)),
                Span::raw(format!("{}  ", record.name)),
                Span::styled("█".repeat(cells), Style::default().fg(color)),
                Span::styled(detail, Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect()
}

/// Chart palette entry as a terminal colour
pub fn palette_color(index: usize) -> Color {
    let hex = svg::color(index).trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(0)
    };
    Color::Rgb(channel(0..2), channel(2..4), channel(4..6))
}

fn interview_lines(interview: &InterviewBlock, labels: &Labels) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::styled(
            format!("■ {}", interview.heading),
            Style::default().bold(),
        ),
        Line::styled(interview.profile.clone(), Style::default().fg(Color::Gray)),
    ];
    if let Some(description) = &interview.description {
        lines.push(Line::styled(
            description.clone(),
            Style::default().fg(Color::Gray).italic(),
        ));
    }
    lines.push(Line::default());

    lines.push(sub_heading(labels.transcript));
    if interview.exchanges.is_empty() {
        lines.push(placeholder(labels.no_exchanges));
    }
    for exchange in &interview.exchanges {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", labels.question_prefix),
                Style::default().fg(Color::Green).bold(),
            ),
            Span::raw(exchange.question.clone()),
        ]));
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", labels.answer_prefix),
                Style::default().fg(Color::Yellow).bold(),
            ),
            Span::raw(exchange.answer.clone()),
        ]));
    }

    if let Some(summary) = &interview.summary {
        lines.push(Line::default());
        lines.push(sub_heading(labels.interview_summary));
        lines.extend(block_lines(summary));
    }
    lines.push(Line::default());
    lines
}

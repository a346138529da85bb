//! Report assembly
//!
//! Combines a [`SurveyDocument`] with the chart shaper and the markdown
//! normaliser into an ordered section tree shared by every front end: the
//! HTML writer, the terminal viewer and the JSON API.

pub mod html;
pub mod svg;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chart::{self, ChartData, ChartOptions};
use crate::config::Config;
use crate::document::{Answer, Exchange, Gender, InterviewRecord, QuestionStat, SurveyDocument};
use crate::markdown::{self, Block};

/// Section identifiers. Table-of-contents links and the scroll-spy both
/// resolve against these strings, so they must not change.
pub mod anchors {
    pub const REPORT_TITLE: &str = "reportTitle";
    pub const TOTAL_ANALYSIS: &str = "totalAnalysis";
    pub const DETAILED_STATS: &str = "detailedStats";
    pub const INTERVIEWS: &str = "interviews";

    pub fn question_id(index: usize) -> String {
        format!("question-{}", index)
    }

    pub fn interview_id(index: usize) -> String {
        format!("interview-{}", index)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
}

/// Every user-visible string of a report
#[derive(Debug)]
pub struct Labels {
    locale: Locale,
    pub report_title: &'static str,
    pub toc_heading: &'static str,
    pub toc_title: &'static str,
    pub total_analysis: &'static str,
    pub suggestion: &'static str,
    pub detailed_stats: &'static str,
    pub interviews: &'static str,
    pub result_summary: &'static str,
    pub hide_options: &'static str,
    pub transcript: &'static str,
    pub interview_summary: &'static str,
    pub question_prefix: &'static str,
    pub answer_prefix: &'static str,
    pub anonymous: &'static str,
    pub generated_at: &'static str,
    pub no_summary: &'static str,
    pub no_stats: &'static str,
    pub no_interviews: &'static str,
    pub no_options: &'static str,
    pub no_exchanges: &'static str,
}

static ZH: Labels = Labels {
    locale: Locale::Zh,
    report_title: "调查结果报告",
    toc_heading: "目录",
    toc_title: "报告标题",
    total_analysis: "总体分析",
    suggestion: "决策建议",
    detailed_stats: "详细统计",
    interviews: "访谈记录",
    result_summary: "结果分析与总结",
    hide_options: "隐藏选项",
    transcript: "访谈内容 (中文)",
    interview_summary: "访谈总结",
    question_prefix: "问:",
    answer_prefix: "答:",
    anonymous: "匿名",
    generated_at: "生成时间",
    no_summary: "*未提供总体总结。*",
    no_stats: "未提供有效的统计数据。",
    no_interviews: "无详细访谈记录。",
    no_options: "无详细选项数据。",
    no_exchanges: "无中文访谈数据。",
};

static EN: Labels = Labels {
    locale: Locale::En,
    report_title: "Survey Results Report",
    toc_heading: "Contents",
    toc_title: "Report title",
    total_analysis: "Overall analysis",
    suggestion: "Recommendations",
    detailed_stats: "Detailed statistics",
    interviews: "Interviews",
    result_summary: "Analysis and summary",
    hide_options: "Hide options",
    transcript: "Transcript",
    interview_summary: "Interview summary",
    question_prefix: "Q:",
    answer_prefix: "A:",
    anonymous: "Anonymous",
    generated_at: "Generated",
    no_summary: "*No overall summary provided.*",
    no_stats: "No valid statistics provided.",
    no_interviews: "No interview records.",
    no_options: "No option details.",
    no_exchanges: "No interview transcript.",
};

impl Labels {
    pub fn for_locale(locale: Locale) -> &'static Labels {
        match locale {
            Locale::Zh => &ZH,
            Locale::En => &EN,
        }
    }

    pub fn title(&self, topic: Option<&str>) -> String {
        match topic.filter(|t| !t.trim().is_empty()) {
            Some(topic) => format!("{} - {}", topic, self.report_title),
            None => self.report_title.to_string(),
        }
    }

    pub fn show_options(&self, count: usize) -> String {
        match self.locale {
            Locale::Zh => format!("查看所有选项 ({}条)", count),
            Locale::En => format!("Show all options ({})", count),
        }
    }

    /// One line of the option listing; `position` is 1-based
    pub fn option_line(&self, position: usize, answer: &Answer) -> String {
        let votes = answer.count.map(|c| match self.locale {
            Locale::Zh => format!(" ({}票)", chart::format_count(c)),
            Locale::En => format!(" ({} votes)", chart::format_count(c)),
        });
        match self.locale {
            Locale::Zh => format!(
                "选项 {}: {}{}",
                position,
                answer.label,
                votes.unwrap_or_default()
            ),
            Locale::En => format!(
                "Option {}: {}{}",
                position,
                answer.label,
                votes.unwrap_or_default()
            ),
        }
    }

    pub fn interview_heading(&self, position: usize, name: Option<&str>) -> String {
        let name = self.display_name(name);
        match self.locale {
            Locale::Zh => format!("访谈记录 #{}: {}", position, name),
            Locale::En => format!("Interview #{}: {}", position, name),
        }
    }

    pub fn interview_toc(&self, position: usize, name: Option<&str>) -> String {
        let name = self.display_name(name);
        match self.locale {
            Locale::Zh => format!("访谈 #{}: {}", position, name),
            Locale::En => format!("Interview #{}: {}", position, name),
        }
    }

    pub fn gender(&self, gender: Gender) -> &'static str {
        match (self.locale, gender) {
            (Locale::Zh, Gender::Male) => "男",
            (Locale::Zh, Gender::Female) => "女",
            (Locale::Zh, Gender::Other) => "其他",
            (Locale::En, Gender::Male) => "male",
            (Locale::En, Gender::Female) => "female",
            (Locale::En, Gender::Other) => "other",
        }
    }

    /// `"<age>岁 <gender> <region>"`, skipping an unknown age
    pub fn profile(&self, age: Option<f64>, gender: Gender, region: &str) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(age) = age {
            parts.push(match self.locale {
                Locale::Zh => format!("{}岁", chart::format_count(age)),
                Locale::En => format!("{} years", chart::format_count(age)),
            });
        }
        parts.push(self.gender(gender).to_string());
        if !region.is_empty() {
            parts.push(region.to_string());
        }
        parts.join(" ")
    }

    fn display_name<'a>(&'a self, name: Option<&'a str>) -> &'a str {
        name.filter(|n| !n.trim().is_empty()).unwrap_or(self.anonymous)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReportOptions {
    pub chart: ChartOptions,
    pub locale: Locale,
}

impl ReportOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chart: config.chart_options(),
            locale: config.report.locale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TocEntry {
    pub id: String,
    pub label: String,
    /// 0 for top-level sections, 1 for questions and interviews
    pub depth: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub summary: Vec<Block>,
    pub suggestion: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionBlock {
    pub id: String,
    pub index: usize,
    pub question: String,
    pub chart: ChartData,
    pub summary: Vec<Block>,
    /// Answer options in authoring order, for the collapsible listing
    pub options: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewBlock {
    pub id: String,
    pub index: usize,
    pub heading: String,
    pub profile: String,
    pub description: Option<String>,
    pub exchanges: Vec<Exchange>,
    pub summary: Option<Vec<Block>>,
}

/// An assembled report, ready for any renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub locale: Locale,
    pub overview: Overview,
    pub questions: Vec<QuestionBlock>,
    pub interviews: Vec<InterviewBlock>,
    pub toc: Vec<TocEntry>,
}

impl Report {
    pub fn assemble(doc: &SurveyDocument, options: &ReportOptions) -> Self {
        let labels = Labels::for_locale(options.locale);

        let overview = Overview {
            summary: summary_or_placeholder(doc.total_summary.as_deref(), labels),
            suggestion: summary_or_placeholder(doc.suggestion.as_deref(), labels),
        };

        let questions: Vec<QuestionBlock> = doc
            .stats
            .iter()
            .enumerate()
            .map(|(index, stat)| question_block(index, stat, &options.chart))
            .collect();

        let interviews: Vec<InterviewBlock> = doc
            .interviews
            .iter()
            .enumerate()
            .map(|(index, record)| interview_block(index, record, labels))
            .collect();

        let toc = table_of_contents(&questions, &doc.interviews, labels);

        tracing::debug!(
            questions = questions.len(),
            interviews = interviews.len(),
            "assembled report"
        );

        Self {
            title: labels.title(doc.topic.as_deref()),
            locale: options.locale,
            overview,
            questions,
            interviews,
            toc,
        }
    }

    pub fn labels(&self) -> &'static Labels {
        Labels::for_locale(self.locale)
    }

    /// Section ids in document order
    pub fn section_ids(&self) -> Vec<&str> {
        self.toc.iter().map(|e| e.id.as_str()).collect()
    }

    /// Fresh, all-collapsed expansion state for this report's questions
    pub fn expansion_state(&self) -> ExpansionState {
        ExpansionState::for_questions(&self.questions)
    }

    pub fn question(&self, id: &str) -> Option<&QuestionBlock> {
        self.questions.iter().find(|q| q.id == id)
    }
}

/// Normalise and parse a summary, or parse the placeholder when it is absent
fn summary_or_placeholder(text: Option<&str>, labels: &Labels) -> Vec<Block> {
    match text.filter(|t| !t.trim().is_empty()) {
        Some(text) => markdown::render_blocks(text),
        None => markdown::parse(labels.no_summary),
    }
}

fn question_block(index: usize, stat: &QuestionStat, chart_options: &ChartOptions) -> QuestionBlock {
    QuestionBlock {
        id: anchors::question_id(index),
        index,
        question: stat.question.clone(),
        chart: chart::shape(&stat.answers, chart_options),
        summary: markdown::render_blocks(&stat.summary),
        options: stat.answers.clone(),
    }
}

fn interview_block(index: usize, record: &InterviewRecord, labels: &Labels) -> InterviewBlock {
    let consumer = &record.consumer;
    InterviewBlock {
        id: anchors::interview_id(index),
        index,
        heading: labels.interview_heading(index + 1, consumer.name.as_deref()),
        profile: labels.profile(consumer.age, consumer.gender, &consumer.region),
        description: consumer
            .description
            .clone()
            .filter(|d| !d.trim().is_empty()),
        exchanges: record.exchanges.clone(),
        summary: record
            .summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(markdown::render_blocks),
    }
}

fn table_of_contents(
    questions: &[QuestionBlock],
    interviews: &[InterviewRecord],
    labels: &Labels,
) -> Vec<TocEntry> {
    let top = |id: &str, label: &str| TocEntry {
        id: id.to_string(),
        label: label.to_string(),
        depth: 0,
    };

    let mut toc = vec![
        top(anchors::REPORT_TITLE, labels.toc_title),
        top(anchors::TOTAL_ANALYSIS, labels.total_analysis),
        top(anchors::DETAILED_STATS, labels.detailed_stats),
    ];
    toc.extend(questions.iter().map(|q| TocEntry {
        id: q.id.clone(),
        label: q.question.clone(),
        depth: 1,
    }));
    toc.push(top(anchors::INTERVIEWS, labels.interviews));
    toc.extend(interviews.iter().enumerate().map(|(index, record)| TocEntry {
        id: anchors::interview_id(index),
        label: labels.interview_toc(index + 1, record.consumer.name.as_deref()),
        depth: 1,
    }));
    toc
}

/// Per-question "show all options" flags, keyed by block id.
///
/// Only questions with at least one option are registered; every entry starts
/// collapsed and changes only through [`ExpansionState::toggle`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpansionState {
    expanded: BTreeMap<String, bool>,
}

impl ExpansionState {
    pub fn for_questions(questions: &[QuestionBlock]) -> Self {
        let expanded = questions
            .iter()
            .filter(|q| !q.options.is_empty())
            .map(|q| (q.id.clone(), false))
            .collect();
        Self { expanded }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.get(id).copied().unwrap_or(false)
    }

    pub fn is_toggleable(&self, id: &str) -> bool {
        self.expanded.contains_key(id)
    }

    /// Flip the entry for `id`. Returns false when `id` has no toggle.
    pub fn toggle(&mut self, id: &str) -> bool {
        match self.expanded.get_mut(id) {
            Some(flag) => {
                *flag = !*flag;
                true
            }
            None => false,
        }
    }

    /// Keep flags for ids that still exist after a reload
    pub fn carry_over(&self, next: &mut ExpansionState) {
        for (id, flag) in next.expanded.iter_mut() {
            if let Some(previous) = self.expanded.get(id) {
                *flag = *previous;
            }
        }
    }
}

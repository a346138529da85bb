//! survey-report - navigable reports for pre-computed survey analyses
//!
//! Turns a survey analysis document (overall summary, per-question answer
//! counts with summaries, interview transcripts) into a report with charts,
//! normalised Markdown and a contents panel that follows the reading position.
//!
//! # Pieces
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`chart`] | Shapes answer counts into pie/bar chart data |
//! | [`navigator`] | Scroll-spy: which section is under the reading cursor |
//! | [`markdown`] | Repairs emphasis markup and parses summaries |
//! | [`report`] | Assembles the report and renders it as HTML |
//! | [`tui`] | Terminal viewer |
//! | [`serve`] | Local HTTP server |
//!
//! # Quick Start
//!
//! ```no_run
//! use survey_report::{Report, ReportOptions, SurveyDocument};
//! use survey_report::report::html::{self, HtmlOptions};
//!
//! let doc = SurveyDocument::load(std::path::Path::new("survey.json")).unwrap();
//! let report = Report::assemble(&doc, &ReportOptions::default());
//! let page = html::to_string(&report, &HtmlOptions::default());
//! println!("{} sections, {} bytes", report.section_ids().len(), page.len());
//! ```

pub mod chart;
pub mod config;
pub mod document;
pub mod error;
pub mod markdown;
pub mod navigator;
pub mod report;
pub mod serve;
pub mod tui;

pub use chart::{shape, ChartData, ChartOptions, ChartRecord, ChartType, SortMode};
pub use config::Config;
pub use document::{Answer, InterviewRecord, QuestionStat, SurveyDocument};
pub use error::{ReportError, Result};
pub use markdown::normalize_strong;
pub use navigator::{resolve_active, NavigationState, ScrollSpy, SectionMetrics};
pub use report::{ExpansionState, Locale, Report, ReportOptions};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify core types are re-exported from crate root
        let report = Report::assemble(&SurveyDocument::default(), &ReportOptions::default());
        assert_eq!(report.section_ids().len(), 4);
        assert_eq!(ScrollSpy::default().state(), &NavigationState::default());
    }
}

//! Application state for the viewer (imperative shell)

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::event::{MouseEvent, MouseEventKind};

use crate::config::Config;
use crate::document::SurveyDocument;
use crate::error::Result;
use crate::navigator::ScrollSpy;
use crate::report::{ExpansionState, Report, ReportOptions};

use super::layout::{self, ReportLayout};
use super::msg::Msg;
use super::update::{update, Cmd, Model};

/// Width of the table-of-contents panel, borders included
pub const TOC_WIDTH: u16 = 34;
/// Header and footer rows
const CHROME_ROWS: u16 = 2;
const STATUS_TTL: Duration = Duration::from_secs(3);
const REFRESH_TTL: Duration = Duration::from_secs(2);

/// Main application state
pub struct App {
    input: PathBuf,
    config: Config,

    pub report: Report,
    pub expansion: ExpansionState,
    pub spy: ScrollSpy,
    pub model: Model,
    pub layout: ReportLayout,

    // Viewport
    pub viewport_width: u16,
    pub viewport_height: u16,

    pub status_message: Option<(String, Instant)>,
    pub refresh_shown_at: Option<Instant>,
}

impl App {
    pub fn new(input: PathBuf, config: Config, width: u16, height: u16) -> Result<Self> {
        let doc = SurveyDocument::load(&input)?;
        let report = Report::assemble(&doc, &ReportOptions::from_config(&config));
        let expansion = report.expansion_state();
        let spy = ScrollSpy::new(config.viewer.lookahead_lines);
        let model = Model {
            lookahead: config.viewer.lookahead_lines,
            ..Model::default()
        };

        let mut app = Self {
            input,
            config,
            report,
            expansion,
            spy,
            model,
            layout: ReportLayout::default(),
            viewport_width: width,
            viewport_height: height,
            status_message: None,
            refresh_shown_at: None,
        };
        app.relayout();
        Ok(app)
    }

    pub fn input_path(&self) -> &Path {
        &self.input
    }

    /// Width available for wrapped report text
    pub fn content_width(&self) -> u16 {
        let panel = if self.spy.state().is_panel_visible {
            TOC_WIDTH
        } else {
            0
        };
        self.viewport_width.saturating_sub(panel).saturating_sub(2).max(1)
    }

    /// Rows of report text visible at once
    pub fn visible_lines(&self) -> usize {
        usize::from(
            self.viewport_height
                .saturating_sub(CHROME_ROWS)
                .saturating_sub(2)
                .max(1),
        )
    }

    /// Process one message; returns true when the viewer should quit
    pub fn dispatch(&mut self, msg: Msg) -> bool {
        if let Msg::Resize(width, height) = msg {
            self.viewport_width = width;
            self.viewport_height = height;
        }

        let (model, cmd) = update(msg, self.model.clone());
        self.model = model;
        let quit = self.run_cmd(cmd);
        self.spy.on_scroll(self.model.scroll_offset);
        quit
    }

    fn run_cmd(&mut self, cmd: Cmd) -> bool {
        match cmd {
            Cmd::None => false,
            Cmd::Quit => true,
            Cmd::Batch(cmds) => {
                let mut quit = false;
                for cmd in cmds {
                    quit |= self.run_cmd(cmd);
                }
                quit
            }
            Cmd::Reload => {
                self.reload();
                false
            }
            Cmd::TogglePanel => {
                self.spy.toggle_panel();
                false
            }
            Cmd::ToggleOptions => {
                self.toggle_active_options();
                false
            }
            Cmd::Relayout => {
                self.relayout();
                false
            }
            Cmd::SetStatus(msg) => {
                self.set_status(msg);
                false
            }
        }
    }

    /// Rebuild wrapped lines and the section registry
    pub fn relayout(&mut self) {
        self.layout = layout::build(&self.report, &self.expansion, self.content_width());
        self.model.content_lines = self.layout.rows;
        self.model.visible_lines = self.visible_lines();
        self.model.section_tops = self.layout.section_tops();
        self.model.scroll_offset = super::state::clamp_scroll(
            self.model.scroll_offset,
            self.model.content_lines,
            self.model.visible_lines,
        );
        self.spy.set_sections(self.layout.sections.clone());
        self.spy.on_scroll(self.model.scroll_offset);
    }

    /// Re-read the input; keeps the current report when that fails
    pub fn reload(&mut self) {
        match SurveyDocument::load(&self.input) {
            Ok(doc) => {
                let report = Report::assemble(&doc, &ReportOptions::from_config(&self.config));
                let mut expansion = report.expansion_state();
                self.expansion.carry_over(&mut expansion);
                self.report = report;
                self.expansion = expansion;
                self.relayout();
                self.show_refresh_indicator();
            }
            Err(e) => {
                tracing::warn!("reload failed: {}", e);
                self.set_status(format!("Reload failed: {}", e));
            }
        }
    }

    fn toggle_active_options(&mut self) {
        let id = self.spy.active_section_id().to_string();
        if self.expansion.toggle(&id) {
            self.relayout();
        } else {
            self.set_status("No option listing here".to_string());
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        let msg = match mouse.kind {
            MouseEventKind::ScrollDown => Msg::ScrollDown,
            MouseEventKind::ScrollUp => Msg::ScrollUp,
            _ => return false,
        };
        let mut quit = false;
        for _ in 0..3 {
            quit |= self.dispatch(msg.clone());
        }
        quit
    }

    pub fn set_status(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
    }

    pub fn show_refresh_indicator(&mut self) {
        self.refresh_shown_at = Some(Instant::now());
    }

    /// Expire transient messages
    pub fn tick(&mut self) {
        if matches!(&self.status_message, Some((_, at)) if at.elapsed() >= STATUS_TTL) {
            self.status_message = None;
        }
        if matches!(self.refresh_shown_at, Some(at) if at.elapsed() >= REFRESH_TTL) {
            self.refresh_shown_at = None;
        }
    }

    /// Index of the highlighted table-of-contents entry
    pub fn active_toc_index(&self) -> Option<usize> {
        let active = self.spy.active_section_id();
        self.report.toc.iter().position(|e| e.id == active)
    }
}

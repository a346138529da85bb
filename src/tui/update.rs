//! TEA Update Function
//!
//! ```text
//! update : Msg -> Model -> (Model, Cmd)
//! ```
//!
//! The update function takes a message and the current model and returns the
//! new model plus a command for the runtime. It performs no I/O. Navigation
//! state (active section, panel visibility) belongs to the scroll-spy, so
//! messages touching it become commands executed by the shell.

use super::msg::Msg;
use super::state;

/// Commands that need to be executed by the runtime (imperative shell)
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// No command
    None,
    /// Multiple commands to execute
    Batch(Vec<Cmd>),
    /// Quit the application
    Quit,
    /// Re-read the input document
    Reload,
    /// Show or hide the table of contents
    TogglePanel,
    /// Flip the option listing of the active question
    ToggleOptions,
    /// Recompute wrapped layout for a new terminal size
    Relayout,
    /// Set status message
    SetStatus(String),
}

impl Cmd {
    /// Create a batch of commands
    pub fn batch(cmds: Vec<Cmd>) -> Cmd {
        let mut cmds: Vec<Cmd> = cmds
            .into_iter()
            .filter(|c| !matches!(c, Cmd::None))
            .collect();
        match cmds.len() {
            0 => Cmd::None,
            1 => cmds.pop().unwrap_or(Cmd::None),
            _ => Cmd::Batch(cmds),
        }
    }

    pub fn is_quit(&self) -> bool {
        matches!(self, Cmd::Quit)
    }
}

/// Scroll state of the content pane
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub scroll_offset: usize,
    /// Wrapped height of the whole report
    pub content_lines: usize,
    pub visible_lines: usize,
    /// Section tops in document order
    pub section_tops: Vec<usize>,
    pub lookahead: usize,
    pub help_open: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            scroll_offset: 0,
            content_lines: 0,
            visible_lines: 20,
            section_tops: Vec::new(),
            lookahead: 3,
            help_open: false,
        }
    }
}

impl Model {
    fn scrolled(self, offset: usize) -> Self {
        let offset = state::clamp_scroll(offset, self.content_lines, self.visible_lines);
        Model {
            scroll_offset: offset,
            ..self
        }
    }

    fn scrolled_by(self, delta: isize) -> Self {
        let offset = state::scroll_by(
            self.scroll_offset,
            delta,
            self.content_lines,
            self.visible_lines,
        );
        Model {
            scroll_offset: offset,
            ..self
        }
    }

    fn page(&self) -> isize {
        isize::try_from(state::page_size(self.visible_lines)).unwrap_or(isize::MAX)
    }
}

/// The core update function - processes a message and returns new state + commands
pub fn update(msg: Msg, model: Model) -> (Model, Cmd) {
    match msg {
        // === Lifecycle ===
        Msg::Quit => (model, Cmd::Quit),
        Msg::Tick | Msg::Noop => (model, Cmd::None),
        Msg::Resize(_, _) => (model, Cmd::Relayout),

        // === Scrolling ===
        Msg::ScrollDown => (model.scrolled_by(1), Cmd::None),
        Msg::ScrollUp => (model.scrolled_by(-1), Cmd::None),
        Msg::PageDown => {
            let page = model.page();
            (model.scrolled_by(page), Cmd::None)
        }
        Msg::PageUp => {
            let page = model.page();
            (model.scrolled_by(-page), Cmd::None)
        }
        Msg::JumpToTop => (model.scrolled(0), Cmd::None),
        Msg::JumpToBottom => {
            let bottom = state::max_scroll(model.content_lines, model.visible_lines);
            (model.scrolled(bottom), Cmd::None)
        }
        Msg::NextSection => {
            match state::next_section_offset(
                &model.section_tops,
                model.scroll_offset,
                model.lookahead,
            ) {
                Some(offset) => (model.scrolled(offset), Cmd::None),
                None => (model, Cmd::SetStatus("Last section".to_string())),
            }
        }
        Msg::PrevSection => {
            match state::prev_section_offset(
                &model.section_tops,
                model.scroll_offset,
                model.lookahead,
            ) {
                Some(offset) => (model.scrolled(offset), Cmd::None),
                None => (model, Cmd::SetStatus("First section".to_string())),
            }
        }

        // === Panel / blocks ===
        Msg::TogglePanel => (model, Cmd::batch(vec![Cmd::TogglePanel, Cmd::Relayout])),
        Msg::ToggleOptions => (model, Cmd::ToggleOptions),

        // === Modals ===
        Msg::ToggleHelp => (
            Model {
                help_open: !model.help_open,
                ..model
            },
            Cmd::None,
        ),
        Msg::CloseHelp => (
            Model {
                help_open: false,
                ..model
            },
            Cmd::None,
        ),

        // === Actions ===
        Msg::Reload => (model, Cmd::Reload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> Model {
        Model {
            content_lines: 100,
            visible_lines: 20,
            section_tops: vec![0, 10, 40, 70],
            lookahead: 3,
            ..Model::default()
        }
    }

    #[test]
    fn test_cmd_batch() {
        assert_eq!(Cmd::batch(vec![]), Cmd::None);
        assert_eq!(Cmd::batch(vec![Cmd::None, Cmd::Quit]), Cmd::Quit);
        assert_eq!(
            Cmd::batch(vec![Cmd::Reload, Cmd::Quit]),
            Cmd::Batch(vec![Cmd::Reload, Cmd::Quit])
        );
        assert!(Cmd::Quit.is_quit());
    }

    #[test]
    fn test_scroll_down_and_up() {
        let (m, cmd) = update(Msg::ScrollDown, model());
        assert_eq!(m.scroll_offset, 1);
        assert_eq!(cmd, Cmd::None);
        let (m, _) = update(Msg::ScrollUp, m);
        assert_eq!(m.scroll_offset, 0);
        let (m, _) = update(Msg::ScrollUp, m);
        assert_eq!(m.scroll_offset, 0);
    }

    #[test]
    fn test_paging_is_clamped() {
        let (m, _) = update(Msg::PageDown, model());
        assert_eq!(m.scroll_offset, 18);
        let (m, _) = update(Msg::JumpToBottom, m);
        assert_eq!(m.scroll_offset, 80);
        let (m, _) = update(Msg::PageDown, m);
        assert_eq!(m.scroll_offset, 80);
        let (m, _) = update(Msg::JumpToTop, m);
        assert_eq!(m.scroll_offset, 0);
    }

    #[test]
    fn test_section_jumps() {
        let (m, _) = update(Msg::NextSection, model());
        assert_eq!(m.scroll_offset, 7);
        let (m, _) = update(Msg::NextSection, m);
        assert_eq!(m.scroll_offset, 37);
        let (m, _) = update(Msg::PrevSection, m);
        assert_eq!(m.scroll_offset, 7);
    }

    #[test]
    fn test_next_section_clamped_at_bottom() {
        let start = Model {
            scroll_offset: 37,
            ..model()
        };
        let (m, _) = update(Msg::NextSection, start);
        // top 70 - lookahead 3 = 67, but max scroll is 80 so it is reachable
        assert_eq!(m.scroll_offset, 67);
        let (m, cmd) = update(Msg::NextSection, m);
        assert_eq!(m.scroll_offset, 67);
        assert_eq!(cmd, Cmd::SetStatus("Last section".to_string()));
    }

    #[test]
    fn test_panel_and_options_become_commands() {
        let (_, cmd) = update(Msg::TogglePanel, model());
        assert_eq!(cmd, Cmd::Batch(vec![Cmd::TogglePanel, Cmd::Relayout]));
        let (_, cmd) = update(Msg::ToggleOptions, model());
        assert_eq!(cmd, Cmd::ToggleOptions);
        let (_, cmd) = update(Msg::Reload, model());
        assert_eq!(cmd, Cmd::Reload);
    }

    #[test]
    fn test_help_toggle() {
        let (m, _) = update(Msg::ToggleHelp, model());
        assert!(m.help_open);
        let (m, _) = update(Msg::CloseHelp, m);
        assert!(!m.help_open);
    }

    #[test]
    fn test_quit() {
        let (_, cmd) = update(Msg::Quit, model());
        assert!(cmd.is_quit());
    }
}

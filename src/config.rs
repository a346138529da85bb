//! Configuration file support for survey-report
//!
//! Reads from .survey-report/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::chart::{ChartOptions, SortMode, DEFAULT_BAR_THRESHOLD};
use crate::error::{ReportError, Result};
use crate::navigator::DEFAULT_LOOKAHEAD;
use crate::report::Locale;

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Chart shaping settings
    #[serde(default)]
    pub chart: ChartConfig,

    /// Scroll-spy settings for the HTML report
    #[serde(default)]
    pub navigation: NavigationConfig,

    /// Terminal viewer settings
    #[serde(default)]
    pub viewer: ViewerConfig,

    /// Report text and presentation
    #[serde(default)]
    pub report: ReportConfig,
}

/// Chart-related configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChartConfig {
    /// Questions with more answer options than this render as bar charts
    /// Default: 10
    #[serde(default = "default_bar_threshold")]
    pub bar_threshold: usize,

    /// Record ordering: "value" (largest first) or "ordinal" (label rank)
    /// Default: "value"
    #[serde(default)]
    pub sort: SortMode,
}

/// Scroll-spy configuration for the HTML report
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NavigationConfig {
    /// Look-ahead in pixels added to the scroll offset
    /// Default: 100
    #[serde(default = "default_lookahead")]
    pub lookahead: usize,
}

/// Terminal viewer configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Look-ahead in lines added to the scroll offset
    /// Default: 3
    #[serde(default = "default_lookahead_lines")]
    pub lookahead_lines: usize,
}

/// Report text configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReportConfig {
    /// Language of headings and placeholders
    #[serde(default)]
    pub locale: Locale,

    /// syntect theme used for fenced code blocks in HTML output
    #[serde(default = "default_code_theme")]
    pub code_theme: String,
}

fn default_bar_threshold() -> usize {
    DEFAULT_BAR_THRESHOLD
}

fn default_lookahead() -> usize {
    DEFAULT_LOOKAHEAD
}

fn default_lookahead_lines() -> usize {
    3
}

fn default_code_theme() -> String {
    "InspiredGitHub".to_string()
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            bar_threshold: default_bar_threshold(),
            sort: SortMode::default(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            lookahead: default_lookahead(),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            lookahead_lines: default_lookahead_lines(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            code_theme: default_code_theme(),
        }
    }
}

impl Config {
    /// Load config from .survey-report/config.toml
    /// Returns default config if file doesn't exist or can't be parsed
    pub fn load() -> Self {
        if let Some(path) = Self::find_config_path() {
            match Self::load_from(&path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("ignoring config: {}", e),
            }
        }
        Self::default()
    }

    /// Load config from an explicit path, reporting read and parse errors
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ReportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&contents).map_err(|source| ReportError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".survey-report").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    /// Chart shaping options derived from the `[chart]` section
    pub fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            bar_threshold: self.chart.bar_threshold,
            sort: self.chart.sort,
        }
    }
}

//! Chart data shaping
//!
//! Turns a question's raw answer mapping into chart-ready records, picks a
//! pie or bar presentation, and computes the percentages used for labels and
//! tooltips.

use std::f64::consts::PI;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::Answer;

/// Questions with more options than this render as bar charts
pub const DEFAULT_BAR_THRESHOLD: usize = 10;

/// Rank given to labels without an ordinal marker
pub const UNRANKED: u32 = 999;

/// Minimum central angle (radians) for a pie slice to carry an inline label
pub const INLINE_LABEL_MIN_ANGLE: f64 = 0.52;

const CIRCLED_DIGITS: [(&str, u32); 10] = [
    ("①", 1),
    ("②", 2),
    ("③", 3),
    ("④", 4),
    ("⑤", 5),
    ("⑥", 6),
    ("⑦", 7),
    ("⑧", 8),
    ("⑨", 9),
    ("⑩", 10),
];

lazy_static::lazy_static! {
    static ref ORDINAL: Regex = Regex::new(r"^\s*(?:([①②③④⑤⑥⑦⑧⑨⑩])|(\d+)\s*)")
        .expect("ordinal pattern is valid");
}

/// One chart-ready record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRecord {
    /// Original answer label
    pub name: String,
    pub value: f64,
    /// Rank parsed from a leading ordinal marker, or [`UNRANKED`]
    pub order: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Pie,
    Bar,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Pie => "pie",
            ChartType::Bar => "bar",
        }
    }
}

/// Final ordering of chart records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Largest value first, ties in encounter order
    #[default]
    Value,
    /// Ascending ordinal rank, ties in encounter order
    Ordinal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub bar_threshold: usize,
    pub sort: SortMode,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            bar_threshold: DEFAULT_BAR_THRESHOLD,
            sort: SortMode::Value,
        }
    }
}

/// Shaped chart data for one question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub records: Vec<ChartRecord>,
    pub chart_type: ChartType,
    pub total: f64,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Share of the total held by `value`, 0.0 when the total is zero
    pub fn fraction(&self, value: f64) -> f64 {
        fraction(value, self.total)
    }

    /// Percentage label for `value`, e.g. `"37.5%"`
    pub fn percentage_label(&self, value: f64) -> String {
        percentage_label(value, self.total)
    }

    pub fn slices(&self) -> Vec<PieSlice> {
        pie_slices(self)
    }
}

/// Extract the display rank from a leading ordinal marker.
///
/// Circled digits ①..⑩ map to 1..10, a leading decimal number maps to itself,
/// anything else (including a rank of 0) yields [`UNRANKED`].
pub fn parse_ordinal(label: &str) -> u32 {
    let Some(caps) = ORDINAL.captures(label) else {
        return UNRANKED;
    };

    let rank = if let Some(glyph) = caps.get(1) {
        CIRCLED_DIGITS
            .iter()
            .find(|(g, _)| *g == glyph.as_str())
            .map(|(_, rank)| *rank)
    } else {
        caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok())
    };

    match rank {
        Some(0) | None => UNRANKED,
        Some(rank) => rank,
    }
}

/// Shape raw answers into ordered chart records
pub fn shape(answers: &[Answer], options: &ChartOptions) -> ChartData {
    let mut records: Vec<ChartRecord> = answers
        .iter()
        .map(|answer| ChartRecord {
            name: answer.label.clone(),
            value: answer.value(),
            order: parse_ordinal(&answer.label),
        })
        .collect();

    let chart_type = if records.len() > options.bar_threshold {
        ChartType::Bar
    } else {
        ChartType::Pie
    };

    // Vec::sort_by is stable, ties keep encounter order
    match options.sort {
        SortMode::Value => records.sort_by(|a, b| b.value.total_cmp(&a.value)),
        SortMode::Ordinal => records.sort_by_key(|r| r.order),
    }

    let total = records.iter().map(|r| r.value).sum();

    ChartData {
        records,
        chart_type,
        total,
    }
}

pub fn fraction(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total
    } else {
        0.0
    }
}

/// Percentage label with one decimal, or `"0%"` when the total is zero
pub fn percentage_label(value: f64, total: f64) -> String {
    if total > 0.0 {
        format!("{:.1}%", value / total * 100.0)
    } else {
        "0%".to_string()
    }
}

/// Whether a pie slice is wide enough to carry its percentage inside
pub fn shows_inline_label(fraction: f64) -> bool {
    2.0 * PI * fraction >= INLINE_LABEL_MIN_ANGLE
}

/// Format a count without a trailing `.0` for whole numbers
pub fn format_count(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Angular extent of one pie slice, measured clockwise from 12 o'clock
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub index: usize,
    pub start_angle: f64,
    pub end_angle: f64,
    pub fraction: f64,
}

impl PieSlice {
    pub fn mid_angle(&self) -> f64 {
        (self.start_angle + self.end_angle) / 2.0
    }

    pub fn has_inline_label(&self) -> bool {
        shows_inline_label(self.fraction)
    }
}

fn pie_slices(data: &ChartData) -> Vec<PieSlice> {
    let mut angle = 0.0;
    data.records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.value > 0.0)
        .map(|(index, r)| {
            let fraction = data.fraction(r.value);
            let start_angle = angle;
            angle += 2.0 * PI * fraction;
            PieSlice {
                index,
                start_angle,
                end_angle: angle,
                fraction,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn answers(pairs: &[(&str, f64)]) -> Vec<Answer> {
        pairs.iter().map(|(l, v)| Answer::new(*l, *v)).collect()
    }

    #[test]
    fn test_parse_ordinal_circled() {
        assert_eq!(parse_ordinal("① 20-25岁"), 1);
        assert_eq!(parse_ordinal("⑩ 其他"), 10);
    }

    #[test]
    fn test_parse_ordinal_numeric() {
        assert_eq!(parse_ordinal("5. 其他"), 5);
        assert_eq!(parse_ordinal("12 选项"), 12);
        assert_eq!(parse_ordinal("  3 leading space"), 3);
    }

    #[test]
    fn test_parse_ordinal_missing() {
        assert_eq!(parse_ordinal("其他"), UNRANKED);
        assert_eq!(parse_ordinal(""), UNRANKED);
        assert_eq!(parse_ordinal("0 zero is not a rank"), UNRANKED);
        assert_eq!(parse_ordinal("年龄 20岁"), UNRANKED);
    }

    #[test]
    fn test_shape_sorts_by_value_descending() {
        let data = shape(
            &answers(&[("① A", 3.0), ("② B", 10.0), ("③ C", 5.0)]),
            &ChartOptions::default(),
        );
        let names: Vec<&str> = data.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["② B", "③ C", "① A"]);
        assert_eq!(data.records[0].order, 2);
        assert_eq!(data.total, 18.0);
    }

    #[test]
    fn test_shape_ties_keep_encounter_order() {
        let data = shape(
            &answers(&[("x", 4.0), ("y", 4.0), ("z", 4.0)]),
            &ChartOptions::default(),
        );
        let names: Vec<&str> = data.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_shape_ordinal_sort() {
        let options = ChartOptions {
            sort: SortMode::Ordinal,
            ..ChartOptions::default()
        };
        let data = shape(
            &answers(&[("其他", 50.0), ("③ C", 1.0), ("① A", 2.0)]),
            &options,
        );
        let names: Vec<&str> = data.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["① A", "③ C", "其他"]);
    }

    #[test]
    fn test_empty_answers() {
        let data = shape(&[], &ChartOptions::default());
        assert!(data.is_empty());
        assert_eq!(data.chart_type, ChartType::Pie);
        assert_eq!(data.total, 0.0);
    }

    #[test]
    fn test_non_numeric_counts_coerce_to_zero() {
        let raw = vec![
            Answer {
                label: "bad".to_string(),
                count: None,
            },
            Answer::new("good", 2.0),
        ];
        let data = shape(&raw, &ChartOptions::default());
        assert_eq!(data.total, 2.0);
        assert_eq!(data.records[1].value, 0.0);
    }

    #[test]
    fn test_percentage_labels() {
        assert_eq!(percentage_label(1.0, 4.0), "25.0%");
        assert_eq!(percentage_label(1.0, 3.0), "33.3%");
        assert_eq!(percentage_label(5.0, 0.0), "0%");
        assert_eq!(percentage_label(0.0, 0.0), "0%");
    }

    #[test]
    fn test_inline_label_threshold() {
        // 2π · 0.0833 ≈ 0.5234 rad
        assert!(shows_inline_label(0.0833));
        assert!(shows_inline_label(0.5));
        assert!(!shows_inline_label(0.08));
        assert!(!shows_inline_label(0.0));
    }

    #[test]
    fn test_pie_slices_cover_circle() {
        let data = shape(
            &answers(&[("a", 1.0), ("b", 0.0), ("c", 3.0)]),
            &ChartOptions::default(),
        );
        let slices = data.slices();
        // Zero-valued records get no slice
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].start_angle, 0.0);
        assert!((slices[1].end_angle - 2.0 * PI).abs() < 1e-9);
        assert!((slices[0].fraction - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(12.0), "12");
        assert_eq!(format_count(2.5), "2.5");
        assert_eq!(format_count(0.0), "0");
    }

    proptest! {
        #[test]
        fn prop_chart_type_follows_option_count(counts in proptest::collection::vec(0u32..500, 0..25)) {
            let raw: Vec<Answer> = counts
                .iter()
                .enumerate()
                .map(|(i, c)| Answer::new(format!("option {}", i), *c as f64))
                .collect();
            let data = shape(&raw, &ChartOptions::default());
            let expected = if raw.len() > 10 { ChartType::Bar } else { ChartType::Pie };
            prop_assert_eq!(data.chart_type, expected);
        }

        #[test]
        fn prop_total_is_preserved(counts in proptest::collection::vec(0u32..10_000, 0..30)) {
            let raw: Vec<Answer> = counts
                .iter()
                .enumerate()
                .map(|(i, c)| Answer::new(format!("{} label", i + 1), *c as f64))
                .collect();
            let data = shape(&raw, &ChartOptions::default());
            let input_sum: f64 = counts.iter().map(|c| *c as f64).sum();
            let output_sum: f64 = data.records.iter().map(|r| r.value).sum();
            prop_assert_eq!(output_sum, input_sum);
            prop_assert_eq!(data.total, input_sum);
            prop_assert_eq!(data.records.len(), raw.len());
        }

        #[test]
        fn prop_records_sorted_descending(counts in proptest::collection::vec(0u32..100, 0..20)) {
            let raw: Vec<Answer> = counts
                .iter()
                .enumerate()
                .map(|(i, c)| Answer::new(format!("o{}", i), *c as f64))
                .collect();
            let data = shape(&raw, &ChartOptions::default());
            for pair in data.records.windows(2) {
                prop_assert!(pair[0].value >= pair[1].value);
            }
        }
    }
}

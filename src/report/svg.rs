//! Inline SVG charts
//!
//! Charts are plain SVG strings embedded in the HTML report; hovering a slice
//! or bar shows a native `<title>` tooltip with `name: value (pct)`.

use crate::chart::{format_count, ChartData, ChartRecord};
use crate::markdown::html::html_escape;

pub const PALETTE: [&str; 8] = [
    "#3a7e6d", "#f6bd60", "#7bc7b5", "#9fd6c8", "#c2e5dc", "#a8dadc", "#457b9d", "#1d3557",
];

const PIE_SIZE: f64 = 220.0;
const PIE_RADIUS: f64 = 95.0;
/// Inline labels sit at this fraction of the radius
const LABEL_RADIUS: f64 = 0.7;

const BAR_WIDTH: f64 = 760.0;
const BAR_HEIGHT: f64 = 420.0;
const BAR_MARGIN_TOP: f64 = 20.0;
const BAR_MARGIN_RIGHT: f64 = 30.0;
const BAR_MARGIN_LEFT: f64 = 50.0;
const BAR_MARGIN_BOTTOM: f64 = 120.0;
const GRID_LINES: usize = 5;

pub fn color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

fn tooltip(data: &ChartData, record: &ChartRecord) -> String {
    format!(
        "<title>{}: {} ({})</title>",
        html_escape(&record.name),
        format_count(record.value),
        data.percentage_label(record.value)
    )
}

/// Point on the circle at `angle` radians clockwise from 12 o'clock
fn polar(cx: f64, cy: f64, radius: f64, angle: f64) -> (f64, f64) {
    (cx + radius * angle.sin(), cy - radius * angle.cos())
}

/// Pie chart with inline percentage labels on wide slices
pub fn pie(data: &ChartData) -> String {
    let (cx, cy) = (PIE_SIZE / 2.0, PIE_SIZE / 2.0);
    let mut shapes = String::new();
    let mut labels = String::new();

    for slice in data.slices() {
        let record = &data.records[slice.index];
        let fill = color(slice.index);
        let title = tooltip(data, record);

        if slice.fraction >= 0.999_999 {
            shapes.push_str(&format!(
                r##"<circle class="slice" cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}">{}</circle>"##,
                cx, cy, PIE_RADIUS, fill, title
            ));
        } else {
            let (x0, y0) = polar(cx, cy, PIE_RADIUS, slice.start_angle);
            let (x1, y1) = polar(cx, cy, PIE_RADIUS, slice.end_angle);
            let large_arc = u8::from(slice.end_angle - slice.start_angle > std::f64::consts::PI);
            shapes.push_str(&format!(
                r##"<path class="slice" d="M{:.2},{:.2} L{:.2},{:.2} A{:.2},{:.2} 0 {} 1 {:.2},{:.2} Z" fill="{}" stroke="#fff" stroke-width="1">{}</path>"##,
                cx, cy, x0, y0, PIE_RADIUS, PIE_RADIUS, large_arc, x1, y1, fill, title
            ));
        }

        if slice.has_inline_label() {
            let (lx, ly) = polar(cx, cy, PIE_RADIUS * LABEL_RADIUS, slice.mid_angle());
            labels.push_str(&format!(
                r##"<text x="{:.2}" y="{:.2}" fill="#fff" text-anchor="middle" dominant-baseline="central" font-size="14" font-weight="bold">{}</text>"##,
                lx,
                ly,
                data.percentage_label(record.value)
            ));
        }
    }

    format!(
        r##"<svg class="chart pie" viewBox="0 0 {size} {size}" width="{size}" height="{size}" role="img">{}<g pointer-events="none">{}</g></svg>"##,
        shapes,
        labels,
        size = PIE_SIZE
    )
}

/// Vertical bar chart with rotated category labels
pub fn bar(data: &ChartData) -> String {
    let plot_width = BAR_WIDTH - BAR_MARGIN_LEFT - BAR_MARGIN_RIGHT;
    let plot_height = BAR_HEIGHT - BAR_MARGIN_TOP - BAR_MARGIN_BOTTOM;
    let baseline = BAR_MARGIN_TOP + plot_height;

    let max = data
        .records
        .iter()
        .map(|r| r.value)
        .fold(0.0_f64, f64::max);
    let scale_max = if max > 0.0 { max } else { 1.0 };

    let mut grid = String::new();
    for i in 0..=GRID_LINES {
        let value = scale_max * i as f64 / GRID_LINES as f64;
        let y = baseline - plot_height * i as f64 / GRID_LINES as f64;
        grid.push_str(&format!(
            r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#e5e7eb" stroke-dasharray="3 3"/><text x="{:.1}" y="{:.1}" text-anchor="end" dominant-baseline="central" font-size="11" fill="#6b7280">{}</text>"##,
            BAR_MARGIN_LEFT,
            y,
            BAR_MARGIN_LEFT + plot_width,
            y,
            BAR_MARGIN_LEFT - 6.0,
            y,
            format_axis(value)
        ));
    }

    let mut bars = String::new();
    let slot = if data.records.is_empty() {
        plot_width
    } else {
        plot_width / data.records.len() as f64
    };

    for (i, record) in data.records.iter().enumerate() {
        let height = plot_height * record.value / scale_max;
        let x = BAR_MARGIN_LEFT + slot * i as f64;
        let label_x = x + slot / 2.0;
        let label_y = baseline + 12.0;
        bars.push_str(&format!(
            r##"<rect class="bar" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}">{}</rect><text x="{:.1}" y="{:.1}" transform="rotate(-45 {:.1} {:.1})" text-anchor="end" font-size="11" fill="#374151">{}</text>"##,
            x + slot * 0.1,
            baseline - height,
            slot * 0.8,
            height,
            color(i),
            tooltip(data, record),
            label_x,
            label_y,
            label_x,
            label_y,
            html_escape(&record.name)
        ));
    }

    format!(
        r##"<svg class="chart bar" viewBox="0 0 {w} {h}" width="100%" role="img">{}<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#9ca3af"/>{}</svg>"##,
        grid,
        BAR_MARGIN_LEFT,
        baseline,
        BAR_MARGIN_LEFT + plot_width,
        baseline,
        bars,
        w = BAR_WIDTH,
        h = BAR_HEIGHT
    )
}

fn format_axis(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format_count(value.round())
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{shape, ChartOptions};
    use crate::document::Answer;

    fn data(pairs: &[(&str, f64)]) -> ChartData {
        let answers: Vec<Answer> = pairs.iter().map(|(l, v)| Answer::new(*l, *v)).collect();
        shape(&answers, &ChartOptions::default())
    }

    #[test]
    fn test_pie_labels_only_wide_slices() {
        // 95% and 5%: only the first slice gets an inline label
        let svg = pie(&data(&[("big", 95.0), ("small", 5.0)]));
        assert!(svg.contains(">95.0%</text>"));
        assert!(!svg.contains(">5.0%</text>"));
        assert_eq!(svg.matches("class=\"slice\"").count(), 2);
    }

    #[test]
    fn test_pie_tooltips() {
        let svg = pie(&data(&[("A & B", 3.0), ("C", 1.0)]));
        assert!(svg.contains("<title>A &amp; B: 3 (75.0%)</title>"));
        assert!(svg.contains("<title>C: 1 (25.0%)</title>"));
    }

    #[test]
    fn test_single_slice_is_full_circle() {
        let svg = pie(&data(&[("only", 7.0), ("none", 0.0)]));
        assert!(svg.contains("<circle class=\"slice\""));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_pie_all_zero_draws_nothing() {
        let svg = pie(&data(&[("a", 0.0), ("b", 0.0)]));
        assert!(!svg.contains("class=\"slice\""));
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(color(0), "#3a7e6d");
        assert_eq!(color(8), "#3a7e6d");
        assert_eq!(color(7), "#1d3557");
    }

    #[test]
    fn test_bar_chart_has_one_bar_per_record() {
        let pairs: Vec<(String, f64)> = (0..12).map(|i| (format!("opt {}", i), i as f64)).collect();
        let borrowed: Vec<(&str, f64)> = pairs.iter().map(|(l, v)| (l.as_str(), *v)).collect();
        let svg = bar(&data(&borrowed));
        assert_eq!(svg.matches("class=\"bar\"").count(), 12);
        assert!(svg.contains("rotate(-45"));
        assert!(svg.contains("<title>opt 11: 11 (16.7%)</title>"));
    }

    #[test]
    fn test_bar_chart_zero_total() {
        let svg = bar(&data(&[("a", 0.0)]));
        assert!(svg.contains("<title>a: 0 (0%)</title>"));
    }
}

//! Pure state transformations for the viewer (Functional Core)
//!
//! Only pure scroll arithmetic lives here. The imperative shell (app.rs,
//! events.rs) handles I/O and calls these functions.

// =============================================================================
// Scrolling - Pure offset calculations
// =============================================================================

/// Largest offset that still fills the viewport
pub fn max_scroll(total_lines: usize, visible: usize) -> usize {
    total_lines.saturating_sub(visible)
}

/// Scroll by `delta` lines, clamped to the content
pub fn scroll_by(current: usize, delta: isize, total_lines: usize, visible: usize) -> usize {
    let max_scroll = max_scroll(total_lines, visible);
    if delta >= 0 {
        (current + delta.unsigned_abs()).min(max_scroll)
    } else {
        current.saturating_sub(delta.unsigned_abs()).min(max_scroll)
    }
}

/// Lines moved by one page, keeping two lines of context
pub fn page_size(visible: usize) -> usize {
    visible.saturating_sub(2).max(1)
}

/// Offset that puts the first section starting below the cursor under it
pub fn next_section_offset(tops: &[usize], current: usize, lookahead: usize) -> Option<usize> {
    let cursor = current + lookahead;
    tops.iter()
        .copied()
        .filter(|&top| top > cursor)
        .min()
        .map(|top| top.saturating_sub(lookahead))
}

/// Offset that puts the last section starting above the cursor under it
pub fn prev_section_offset(tops: &[usize], current: usize, lookahead: usize) -> Option<usize> {
    let cursor = current + lookahead;
    tops.iter()
        .copied()
        .filter(|&top| top < cursor)
        .max()
        .map(|top| top.saturating_sub(lookahead))
}

/// Keep an offset valid after the content height changed
pub fn clamp_scroll(current: usize, total_lines: usize, visible: usize) -> usize {
    current.min(max_scroll(total_lines, visible))
}

// =============================================================================
// Tests
// =============================================================================

use std::fmt;
use std::sync::Arc;

type RowHeightFn = dyn Fn(usize, bool) -> f32 + Send + Sync;

/// Height of a flattened row in logical pixels.
#[derive(Clone)]
pub enum RowHeight {
    Fixed(f32),
    /// Computed from the row index and whether it is the suffix row.
    PerRow(Arc<RowHeightFn>),
}

impl RowHeight {
    /// Height computed per row from its index and suffix flag.
    pub fn per_row(
        height: impl Fn(usize, bool) -> f32 + Send + Sync + 'static,
    ) -> Self {
        Self::PerRow(Arc::new(height))
    }

    /// Height of row `index`. Negative, infinite and NaN heights collapse
    /// to zero.
    pub fn height(&self, index: usize, is_suffix: bool) -> f32 {
        let height = match self {
            RowHeight::Fixed(height) => *height,
            RowHeight::PerRow(height) => height(index, is_suffix),
        };
        if height.is_finite() { height.max(0.0) } else { 0.0 }
    }
}

impl fmt::Debug for RowHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowHeight::Fixed(height) => {
                f.debug_tuple("Fixed").field(height).finish()
            },
            RowHeight::PerRow(_) => f.write_str("PerRow(..)"),
        }
    }
}

/// Where a scroll target lands inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
    /// Scroll the minimum distance that brings the row fully into view.
    Nearest,
}

/// Contiguous slice of rows to materialize, plus the spacers around it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowRange {
    /// First materialized row.
    pub start: usize,
    /// One past the last materialized row.
    pub end: usize,
    /// Height of all rows before `start`.
    pub top_padding: f32,
    /// Height of all rows from `end` onwards.
    pub bottom_padding: f32,
    /// Height of the full virtual content.
    pub total_height: f32,
}

impl WindowRange {
    /// Number of materialized rows.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether no row is materialized.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether row `index` is materialized.
    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

/// Computes which rows of a flattened tree must be materialized.
///
/// Row tops are kept as a prefix sum so offset lookups are a binary search.
/// The scroll position is pulled from the host through [`set_scroll`]; the
/// window itself is derived on demand.
///
/// [`set_scroll`]: VirtualWindow::set_scroll
#[derive(Debug, Clone)]
pub struct VirtualWindow {
    enabled: bool,
    overscan: usize,
    /// `offsets[i]` is the top of row `i`; the last entry is the total height.
    offsets: Vec<f32>,
    scroll_offset: f32,
    viewport_height: f32,
}

impl VirtualWindow {
    /// Create an empty window over a viewport of `viewport_height`.
    pub fn new(enabled: bool, overscan: usize, viewport_height: f32) -> Self {
        Self {
            enabled,
            overscan,
            offsets: vec![0.0],
            scroll_offset: 0.0,
            viewport_height: viewport_height.max(0.0),
        }
    }

    // --- Read access ---

    /// Whether only the rows around the viewport are materialized.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Extra rows materialized on each side of the viewport.
    pub fn overscan(&self) -> usize {
        self.overscan
    }

    /// Number of measured rows.
    pub fn row_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Height of the full virtual content.
    pub fn total_height(&self) -> f32 {
        self.offsets[self.row_count()]
    }

    /// Current vertical scroll position.
    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    /// Height of the visible area.
    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    /// Largest scroll offset that still fills the viewport.
    pub fn max_scroll_offset(&self) -> f32 {
        (self.total_height() - self.viewport_height).max(0.0)
    }

    /// Top edge of row `index`.
    pub fn row_top(&self, index: usize) -> Option<f32> {
        (index < self.row_count()).then(|| self.offsets[index])
    }

    /// Measured height of row `index`.
    pub fn row_height(&self, index: usize) -> Option<f32> {
        (index < self.row_count())
            .then(|| self.offsets[index + 1] - self.offsets[index])
    }

    /// Rows to materialize for the current scroll position.
    ///
    /// Disabled virtualization materializes every row with no padding.
    pub fn window(&self) -> WindowRange {
        let count = self.row_count();
        let total_height = self.total_height();

        if !self.enabled || count == 0 {
            return WindowRange {
                start: 0,
                end: count,
                top_padding: 0.0,
                bottom_padding: 0.0,
                total_height,
            };
        }

        let top = self.scroll_offset;
        let bottom = top + self.viewport_height;

        // First row whose bottom edge is below the viewport top.
        let first = self.offsets[1..].partition_point(|&edge| edge <= top);
        // Rows whose top edge is above the viewport bottom.
        let last = self.offsets[..count].partition_point(|&edge| edge < bottom);

        let first = first.min(count - 1);
        let last = last.max(first + 1).min(count);

        let start = first.saturating_sub(self.overscan);
        let end = last.saturating_add(self.overscan).min(count);

        let range = WindowRange {
            start,
            end,
            top_padding: self.offsets[start],
            bottom_padding: total_height - self.offsets[end],
            total_height,
        };
        log::trace!("tree window {range:?}");
        range
    }

    /// Scroll offset that places row `index` according to `align`.
    pub fn offset_for_index(&self, index: usize, align: Align) -> Option<f32> {
        let top = self.row_top(index)?;
        let height = self.row_height(index)?;
        let viewport = self.viewport_height;

        let target = match align {
            Align::Start => top,
            Align::Center => top + height / 2.0 - viewport / 2.0,
            Align::End => top + height - viewport,
            Align::Nearest => {
                if top < self.scroll_offset {
                    top
                } else if top + height > self.scroll_offset + viewport {
                    top + height - viewport
                } else {
                    self.scroll_offset
                }
            },
        };

        Some(target.clamp(0.0, self.max_scroll_offset()))
    }

    // --- Write access ---

    /// Toggle windowed rendering.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Set the extra rows materialized on each side of the viewport.
    pub fn set_overscan(&mut self, overscan: usize) {
        self.overscan = overscan;
    }

    /// Rebuild row offsets for `row_count` rows.
    pub fn measure(
        &mut self,
        row_count: usize,
        heights: &RowHeight,
        suffix_index: Option<usize>,
    ) {
        self.offsets.clear();
        self.offsets.reserve(row_count + 1);

        let mut top = 0.0;
        self.offsets.push(top);
        for index in 0..row_count {
            top += heights.height(index, suffix_index == Some(index));
            self.offsets.push(top);
        }

        self.scroll_offset = self.scroll_offset.min(self.max_scroll_offset());
    }

    /// Record the scroll position and viewport size read from the host.
    pub fn set_scroll(&mut self, offset: f32, viewport_height: f32) {
        self.viewport_height = viewport_height.max(0.0);
        self.scroll_offset = if offset.is_nan() {
            0.0
        } else {
            offset.clamp(0.0, self.max_scroll_offset())
        };
    }

    /// Move the scroll position to row `index` and return the new offset.
    ///
    /// Returns `None` and leaves the position untouched for an out of range
    /// index.
    pub fn scroll_to_index(&mut self, index: usize, align: Align) -> Option<f32> {
        let offset = self.offset_for_index(index, align)?;
        self.scroll_offset = offset;
        Some(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(count: usize, height: f32, overscan: usize, viewport: f32) -> VirtualWindow {
        let mut window = VirtualWindow::new(true, overscan, viewport);
        window.measure(count, &RowHeight::Fixed(height), None);
        window
    }

    fn varied() -> RowHeight {
        RowHeight::per_row(|index, is_suffix| {
            if is_suffix {
                120.0
            } else {
                [10.0, 30.0, 20.0][index % 3]
            }
        })
    }

    fn materialized_height(window: &VirtualWindow, range: &WindowRange) -> f32 {
        (range.start..range.end)
            .filter_map(|index| window.row_height(index))
            .sum()
    }

    #[test]
    fn given_fixed_rows_at_top_when_windowed_then_viewport_plus_overscan() {
        let window = fixed(100, 20.0, 2, 100.0);
        let range = window.window();

        assert_eq!(range.start, 0);
        assert_eq!(range.end, 7);
        assert_eq!(range.top_padding, 0.0);
        assert_eq!(range.bottom_padding, 93.0 * 20.0);
        assert_eq!(range.total_height, 2000.0);
    }

    #[test]
    fn given_scrolled_offset_when_windowed_then_overscan_on_both_sides() {
        let mut window = fixed(100, 20.0, 2, 100.0);
        window.set_scroll(410.0, 100.0);
        let range = window.window();

        // Rows 20..=25 intersect [410, 510).
        assert_eq!(range.start, 18);
        assert_eq!(range.end, 28);
        assert_eq!(range.top_padding, 360.0);
    }

    #[test]
    fn given_any_offset_when_windowed_then_rows_cover_viewport() {
        let mut window = VirtualWindow::new(true, 1, 75.0);
        window.measure(200, &varied(), Some(50));

        let mut offset = 0.0;
        while offset <= window.max_scroll_offset() {
            window.set_scroll(offset, 75.0);
            let range = window.window();

            assert!(range.end <= window.row_count());
            assert!(range.start < range.end);
            let covered_top = window.row_top(range.start).unwrap_or(0.0);
            let covered_bottom = range.top_padding + materialized_height(&window, &range);
            assert!(covered_top <= window.scroll_offset(), "offset {offset}");
            assert!(
                covered_bottom >= window.scroll_offset() + 75.0,
                "offset {offset}"
            );
            offset += 7.0;
        }
    }

    #[test]
    fn given_any_offset_when_windowed_then_padding_is_conserved() {
        let mut window = VirtualWindow::new(true, 3, 90.0);
        window.measure(60, &varied(), Some(10));

        for offset in [0.0, 15.0, 333.0, 700.0, 10_000.0] {
            window.set_scroll(offset, 90.0);
            let range = window.window();
            let sum = range.top_padding
                + materialized_height(&window, &range)
                + range.bottom_padding;

            assert_eq!(sum, range.total_height, "offset {offset}");
        }
    }

    #[test]
    fn given_disabled_virtualization_when_windowed_then_all_rows() {
        let mut window = fixed(40, 20.0, 2, 100.0);
        window.set_enabled(false);
        window.set_scroll(300.0, 100.0);
        let range = window.window();

        assert_eq!((range.start, range.end), (0, 40));
        assert_eq!(range.top_padding, 0.0);
        assert_eq!(range.bottom_padding, 0.0);
        assert_eq!(materialized_height(&window, &range), range.total_height);
    }

    #[test]
    fn given_no_rows_when_windowed_then_range_is_empty() {
        let window = fixed(0, 20.0, 2, 100.0);
        let range = window.window();

        assert!(range.is_empty());
        assert_eq!(range.total_height, 0.0);
    }

    #[test]
    fn given_content_shorter_than_viewport_when_windowed_then_all_rows() {
        let window = fixed(3, 20.0, 0, 500.0);
        let range = window.window();

        assert_eq!((range.start, range.end), (0, 3));
        assert_eq!(window.max_scroll_offset(), 0.0);
    }

    #[test]
    fn given_out_of_bounds_scroll_when_set_then_offset_is_clamped() {
        let mut window = fixed(10, 20.0, 0, 100.0);

        window.set_scroll(-50.0, 100.0);
        assert_eq!(window.scroll_offset(), 0.0);

        window.set_scroll(5_000.0, 100.0);
        assert_eq!(window.scroll_offset(), 100.0);
    }

    #[test]
    fn given_shrinking_rows_when_measured_then_offset_is_clamped() {
        let mut window = fixed(100, 20.0, 0, 100.0);
        window.set_scroll(1_500.0, 100.0);

        window.measure(10, &RowHeight::Fixed(20.0), None);
        assert_eq!(window.scroll_offset(), 100.0);
    }

    #[test]
    fn given_alignments_when_scrolling_to_index_then_target_is_placed() {
        let mut window = fixed(100, 20.0, 0, 100.0);

        assert_eq!(window.scroll_to_index(50, Align::Start), Some(1_000.0));
        assert_eq!(window.scroll_to_index(50, Align::Center), Some(960.0));
        assert_eq!(window.scroll_to_index(50, Align::End), Some(920.0));
        assert_eq!(window.scroll_to_index(0, Align::Center), Some(0.0));
        assert_eq!(window.scroll_to_index(99, Align::Start), Some(1_900.0));
    }

    #[test]
    fn given_visible_row_when_nearest_then_offset_is_unchanged() {
        let mut window = fixed(100, 20.0, 0, 100.0);
        window.set_scroll(200.0, 100.0);

        assert_eq!(window.offset_for_index(12, Align::Nearest), Some(200.0));
        assert_eq!(window.offset_for_index(5, Align::Nearest), Some(100.0));
        assert_eq!(window.offset_for_index(20, Align::Nearest), Some(320.0));
    }

    #[test]
    fn given_out_of_range_index_when_scrolling_then_position_is_kept() {
        let mut window = fixed(10, 20.0, 0, 100.0);
        window.set_scroll(40.0, 100.0);

        assert_eq!(window.scroll_to_index(10, Align::Center), None);
        assert_eq!(window.scroll_offset(), 40.0);
    }

    #[test]
    fn given_suffix_index_when_measured_then_suffix_height_is_used() {
        let mut window = VirtualWindow::new(true, 0, 100.0);
        window.measure(4, &varied(), Some(2));

        assert_eq!(window.row_height(2), Some(120.0));
        assert_eq!(window.row_height(3), Some(10.0));
        assert_eq!(window.total_height(), 10.0 + 30.0 + 120.0 + 10.0);
    }

    #[test]
    fn given_invalid_heights_when_measured_then_they_collapse_to_zero() {
        let heights = RowHeight::per_row(|index, _| match index {
            0 => -5.0,
            1 => f32::NAN,
            2 => f32::INFINITY,
            3 => f32::NEG_INFINITY,
            _ => 10.0,
        });
        let mut window = VirtualWindow::new(true, 0, 15.0);
        window.measure(6, &heights, None);

        assert_eq!(window.total_height(), 20.0);
        assert_eq!(window.row_height(2), Some(0.0));

        for offset in [0.0, 5.0, 10.0] {
            window.set_scroll(offset, 15.0);
            let range = window.window();
            let materialized: f32 = (range.start..range.end)
                .filter_map(|index| window.row_height(index))
                .sum();
            assert!(range.bottom_padding.is_finite());
            assert_eq!(
                range.top_padding + materialized + range.bottom_padding,
                range.total_height
            );
        }
    }
}

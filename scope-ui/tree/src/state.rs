use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::coalesce::ScrollCoalescer;
use crate::event::{TreeEffect, TreeEvent};
use crate::expansion::ExpansionSet;
use crate::model::{
    FlattenedRow, ROOT_NODE_KEY, RowLayout, SUFFIX_NODE_KEY, TreeKey,
    TreeNode, find_node,
};
use crate::settings::TreeSettings;
use crate::window::{Align, RowHeight, VirtualWindow, WindowRange};

/// Viewport assumed until the scrollable reports its real size.
const FALLBACK_VIEWPORT_HEIGHT: f32 = 480.0;

type RootKeyFn = dyn Fn(&str) -> bool + Send + Sync;

/// Runtime state of one mounted tree.
///
/// Owns the data, the expansion set, the selection and the virtual window.
/// The row layout is rebuilt only when one of them changes; scrolling and
/// rendering read the cached layout. Everything is discarded with the
/// state; nothing is persisted.
pub struct TreeState {
    data: Vec<TreeNode>,
    layout: RowLayout,
    settings: TreeSettings,
    expansion: ExpansionSet,
    selected: Option<TreeKey>,
    hovered: Option<TreeKey>,
    has_suffix: bool,
    row_height: RowHeight,
    is_root_key: Arc<RootKeyFn>,
    window: VirtualWindow,
    follow: ScrollCoalescer<TreeKey>,
}

impl TreeState {
    /// Create an empty tree with `settings`.
    pub fn new(settings: TreeSettings) -> Self {
        let viewport = settings.height.unwrap_or(FALLBACK_VIEWPORT_HEIGHT);
        Self {
            data: Vec::new(),
            layout: RowLayout::default(),
            expansion: ExpansionSet::new(),
            selected: None,
            hovered: None,
            has_suffix: false,
            row_height: RowHeight::Fixed(settings.row_height),
            is_root_key: Arc::new(|key| key == ROOT_NODE_KEY),
            window: VirtualWindow::new(
                settings.virtualized,
                settings.overscan,
                viewport,
            ),
            follow: ScrollCoalescer::new(settings.scroll_follow_interval()),
            settings,
        }
    }

    /// Create a tree over `data`, seeding expansion from `settings`.
    pub fn with_data(data: Vec<TreeNode>, settings: TreeSettings) -> Self {
        let mut state = Self::new(settings);
        state.set_data(data);
        state
    }

    // --- Read access ---

    /// Root nodes of the current tree.
    pub fn data(&self) -> &[TreeNode] {
        &self.data
    }

    /// Current options, including changes made through the setters.
    pub fn settings(&self) -> &TreeSettings {
        &self.settings
    }

    /// Keys currently expanded.
    pub fn expansion(&self) -> &ExpansionSet {
        &self.expansion
    }

    /// Whether the node with `key` shows its children.
    pub fn is_expanded(&self, key: &str) -> bool {
        self.expansion.is_expanded(key)
    }

    /// Key of the selected row, if any.
    pub fn selected_key(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Key of the row under the pointer, if any.
    pub fn hovered_key(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Whether a suffix row follows the selected row.
    pub fn has_suffix(&self) -> bool {
        self.has_suffix
    }

    /// Height source used to measure rows.
    pub fn row_height(&self) -> &RowHeight {
        &self.row_height
    }

    /// Whether a scroll request is waiting for its coalescing window.
    pub fn has_pending_scroll(&self) -> bool {
        self.follow.is_pending()
    }

    /// Whether `key` may become the selected row.
    pub fn is_selectable(&self, key: &str) -> bool {
        key != SUFFIX_NODE_KEY && !(self.is_root_key)(key)
    }

    /// Cached layout of the visible rows.
    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    /// Visible row `index` with its title resolved.
    pub fn row(&self, index: usize) -> Option<FlattenedRow<'_>> {
        self.layout.row(&self.data, index)
    }

    /// Every visible row with titles resolved.
    ///
    /// Rendering should go through [`TreeState::materialized_rows`], which
    /// resolves only the rows of the current window.
    pub fn rows(&self) -> Vec<FlattenedRow<'_>> {
        (0..self.layout.len())
            .filter_map(|index| self.row(index))
            .collect()
    }

    /// Rows of the current window paired with their row index.
    pub fn materialized_rows(&self) -> Vec<(usize, FlattenedRow<'_>)> {
        let range = self.window.window();
        (range.start..range.end)
            .filter_map(|index| self.row(index).map(|row| (index, row)))
            .collect()
    }

    /// Rows to materialize for the current scroll position.
    pub fn window(&self) -> WindowRange {
        self.window.window()
    }

    /// Row offsets and scroll position.
    pub fn virtual_window(&self) -> &VirtualWindow {
        &self.window
    }

    // --- Write access ---

    /// Replace the tree. Expansion is reseeded from the current options and
    /// selection, hover and pending scroll requests are dropped.
    pub fn set_data(&mut self, data: Vec<TreeNode>) {
        self.data = data;
        self.selected = None;
        self.hovered = None;
        self.follow.cancel();
        self.expansion
            .apply_policy(&self.data, self.settings.expand_policy());
        self.relayout();
    }

    /// Change `default_expand_all`; expansion is reseeded only when the
    /// resulting policy changes.
    pub fn set_default_expand_all(&mut self, expand_all: bool) {
        if self.settings.default_expand_all == expand_all {
            return;
        }

        let previous = self.settings.expand_policy();
        self.settings.default_expand_all = expand_all;
        if self.settings.expand_policy() != previous {
            self.expansion
                .apply_policy(&self.data, self.settings.expand_policy());
            self.relayout();
        }
    }

    /// Change the depth limit. The selection is cleared since its row may
    /// no longer be visible.
    pub fn set_expand_depth(&mut self, depth: Option<usize>) {
        if self.settings.expand_depth == depth {
            return;
        }

        self.settings.expand_depth = depth;
        self.selected = None;
        self.expansion
            .apply_policy(&self.data, self.settings.expand_policy());
        self.relayout();
    }

    /// Switch between windowed and full rendering.
    pub fn set_virtualized(&mut self, virtualized: bool) {
        self.settings.virtualized = virtualized;
        self.window.set_enabled(virtualized);
    }

    /// Set the extra rows materialized on each side of the viewport.
    pub fn set_overscan(&mut self, overscan: usize) {
        self.settings.overscan = overscan;
        self.window.set_overscan(overscan);
    }

    /// Replace the row height source and remeasure.
    pub fn set_row_height(&mut self, row_height: RowHeight) {
        if let RowHeight::Fixed(height) = row_height {
            self.settings.row_height = height;
        }
        self.row_height = row_height;
        self.relayout();
    }

    /// Enable the auxiliary row rendered after the selected row.
    pub fn set_suffix(&mut self, has_suffix: bool) {
        if self.has_suffix == has_suffix {
            return;
        }

        self.has_suffix = has_suffix;
        self.relayout();
    }

    /// Replace the predicate marking keys that cannot be selected.
    pub fn set_root_key_predicate(
        &mut self,
        is_root_key: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) {
        self.is_root_key = Arc::new(is_root_key);
        if self.selected.as_deref().is_some_and(|key| !self.is_selectable(key))
        {
            self.selected = None;
            self.relayout();
        }
    }

    /// Change the coalescing window of scroll-to-key requests.
    pub fn set_scroll_follow_ms(&mut self, millis: u64) {
        self.settings.scroll_follow_ms = millis;
        self.follow
            .set_interval(self.settings.scroll_follow_interval());
    }

    /// Flip the expansion of `key` and return whether it is now expanded.
    pub fn toggle(&mut self, key: &str) -> bool {
        let expanded = self.expansion.toggle(key);
        self.relayout();
        expanded
    }

    /// Toggle selection of `key`.
    ///
    /// Returns the node to report to the click callback, or `None` when the
    /// key is not selectable or not part of the tree.
    pub fn select(&mut self, key: &str) -> Option<TreeNode> {
        if !self.is_selectable(key) {
            log::debug!("tree key {key:?} is not selectable");
            return None;
        }
        let node = find_node(&self.data, key)?.clone();

        if self.selected.as_deref() == Some(key) {
            self.selected = None;
        } else {
            self.selected = Some(key.to_owned());
        }
        self.relayout();

        Some(node)
    }

    /// Record the scroll position read from the scrollable.
    pub fn set_scroll(&mut self, offset: f32, viewport_height: f32) {
        self.window.set_scroll(offset, viewport_height);
    }

    /// Scroll the row with `key` into view right away.
    ///
    /// A key that is not among the visible rows leaves the position as is.
    pub fn scroll_to_key(&mut self, key: &str, align: Align) -> Option<f32> {
        let Some(index) = self.layout.index_of(key) else {
            log::debug!("tree scroll target {key:?} is not visible");
            return None;
        };

        self.window.scroll_to_index(index, align)
    }

    /// Queue a coalesced scroll-into-view request.
    ///
    /// Returns the new offset when the coalescing window is already closed,
    /// which is the case for a zero interval.
    pub fn request_scroll_to_key(
        &mut self,
        key: TreeKey,
        now: Instant,
    ) -> Option<f32> {
        self.follow.push(key, now);
        self.tick(now)
    }

    /// Release a coalesced scroll request whose window has closed.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        let key = self.follow.poll(now)?;
        self.scroll_to_key(&key, Align::Center)
    }

    /// Reduce a tree event into state updates and an optional effect.
    pub fn update(&mut self, event: TreeEvent) -> Option<TreeEffect> {
        match event {
            TreeEvent::RowPressed { key } => {
                self.select(&key).map(TreeEffect::Clicked)
            },
            TreeEvent::ToggleRequested { key } => {
                self.toggle(&key);
                None
            },
            TreeEvent::RowHovered { key } => {
                self.hovered = key;
                None
            },
            TreeEvent::Scrolled {
                offset,
                viewport_height,
            } => {
                self.set_scroll(offset, viewport_height);
                None
            },
            TreeEvent::ScrollToKey { key, now } => self
                .request_scroll_to_key(key, now)
                .map(|offset| TreeEffect::ScrollTo { offset }),
            TreeEvent::Tick { now } => self
                .tick(now)
                .map(|offset| TreeEffect::ScrollTo { offset }),
        }
    }

    fn relayout(&mut self) {
        self.layout = RowLayout::build(
            &self.data,
            &self.expansion,
            self.selected.as_deref(),
            self.has_suffix,
        );
        self.window.measure(
            self.layout.len(),
            &self.row_height,
            self.layout.suffix_index(),
        );
    }
}

impl Default for TreeState {
    fn default() -> Self {
        Self::new(TreeSettings::default())
    }
}

impl fmt::Debug for TreeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeState")
            .field("roots", &self.data.len())
            .field("rows", &self.layout.len())
            .field("settings", &self.settings)
            .field("expansion", &self.expansion)
            .field("selected", &self.selected)
            .field("hovered", &self.hovered)
            .field("has_suffix", &self.has_suffix)
            .field("row_height", &self.row_height)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

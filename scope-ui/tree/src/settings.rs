use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::expansion::ExpandPolicy;

const DEFAULT_ROW_HEIGHT: f32 = 24.0;
const DEFAULT_OVERSCAN: usize = 4;
const DEFAULT_SCROLL_FOLLOW_MS: u64 = 100;
const DEFAULT_INDENT_WIDTH: f32 = 14.0;
const DEFAULT_TOGGLE_WIDTH: f32 = 16.0;

/// Options of one tree instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeSettings {
    /// Materialize only the rows around the viewport.
    #[serde(alias = "virtual")]
    pub virtualized: bool,
    /// Fixed row height; per-row heights are set on the state directly.
    pub row_height: f32,
    /// Fixed viewport height, `None` fills the parent.
    pub height: Option<f32>,
    /// Extra rows materialized on each side of the viewport.
    pub overscan: usize,
    pub default_expand_all: bool,
    pub expand_depth: Option<usize>,
    /// Coalescing window for scroll-to-key requests, `0` disables it.
    pub scroll_follow_ms: u64,
    pub indent_width: f32,
    pub toggle_width: f32,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            virtualized: true,
            row_height: DEFAULT_ROW_HEIGHT,
            height: None,
            overscan: DEFAULT_OVERSCAN,
            default_expand_all: false,
            expand_depth: None,
            scroll_follow_ms: DEFAULT_SCROLL_FOLLOW_MS,
            indent_width: DEFAULT_INDENT_WIDTH,
            toggle_width: DEFAULT_TOGGLE_WIDTH,
        }
    }
}

impl TreeSettings {
    /// Materialize only the rows around the viewport.
    pub fn with_virtualized(mut self, virtualized: bool) -> Self {
        self.virtualized = virtualized;
        self
    }

    /// Set the fixed row height.
    pub fn with_row_height(mut self, row_height: f32) -> Self {
        self.row_height = row_height;
        self
    }

    /// Give the tree a fixed viewport height.
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    /// Set the extra rows materialized on each side of the viewport.
    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    /// Expand every parent when data is set.
    pub fn with_default_expand_all(mut self, expand_all: bool) -> Self {
        self.default_expand_all = expand_all;
        self
    }

    /// Expand parents above `depth` when data is set.
    pub fn with_expand_depth(mut self, depth: usize) -> Self {
        self.expand_depth = Some(depth);
        self
    }

    /// Set the scroll-to-key coalescing window in milliseconds.
    pub fn with_scroll_follow_ms(mut self, millis: u64) -> Self {
        self.scroll_follow_ms = millis;
        self
    }

    /// Set indentation width per tree depth level.
    pub fn with_indent_width(mut self, width: f32) -> Self {
        self.indent_width = width;
        self
    }

    /// Set the width reserved for the toggle area.
    pub fn with_toggle_width(mut self, width: f32) -> Self {
        self.toggle_width = width;
        self
    }

    /// Parse and validate settings from JSON. Missing fields use defaults.
    pub fn from_json(json: &str) -> Result<Self, TreeError> {
        let settings: TreeSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the layout cannot work with.
    pub fn validate(&self) -> Result<(), TreeError> {
        if !(self.row_height.is_finite() && self.row_height > 0.0) {
            return Err(TreeError::InvalidSettings {
                message: format!(
                    "row_height must be positive, got {}",
                    self.row_height
                ),
            });
        }

        if let Some(height) = self.height {
            if !(height.is_finite() && height > 0.0) {
                return Err(TreeError::InvalidSettings {
                    message: format!("height must be positive, got {height}"),
                });
            }
        }

        if self.indent_width < 0.0 || self.toggle_width < 0.0 {
            return Err(TreeError::InvalidSettings {
                message: String::from("indent and toggle widths must not be negative"),
            });
        }

        Ok(())
    }

    /// Expansion policy implied by `default_expand_all` and `expand_depth`.
    pub fn expand_policy(&self) -> ExpandPolicy {
        ExpandPolicy::from_options(self.default_expand_all, self.expand_depth)
    }

    /// Coalescing window as a `Duration`.
    pub fn scroll_follow_interval(&self) -> Duration {
        Duration::from_millis(self.scroll_follow_ms)
    }
}

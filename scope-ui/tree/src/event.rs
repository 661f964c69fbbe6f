use std::time::Instant;

use crate::model::{TreeKey, TreeNode};

/// Events reduced by [`TreeState::update`](crate::TreeState::update).
#[derive(Debug, Clone)]
pub enum TreeEvent {
    /// A row was clicked.
    RowPressed { key: TreeKey },
    /// The expand/collapse affordance of a row was clicked.
    ToggleRequested { key: TreeKey },
    /// The pointer entered a row, or left the tree.
    RowHovered { key: Option<TreeKey> },
    /// The scrollable reported its current viewport.
    Scrolled { offset: f32, viewport_height: f32 },
    /// Bring a row into view; coalesced with nearby requests.
    ScrollToKey { key: TreeKey, now: Instant },
    /// Host timer tick releasing coalesced scroll requests.
    Tick { now: Instant },
}

/// Effects produced by the tree for the host to route.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEffect {
    /// Selection toggled on this node.
    Clicked(TreeNode),
    /// Move the scrollable to this vertical offset.
    ScrollTo { offset: f32 },
}

//! Flattened, virtualized tree view for [`iced`].
//!
//! This crate is split into two layers:
//! - UI-agnostic state ([`TreeNode`], [`flatten_tree`], [`ExpansionSet`],
//!   [`VirtualWindow`], [`TreeState`]);
//! - the [`TreeView`] widget that renders the visible window of rows.
//!
//! The recommended flow:
//! 1. keep a [`TreeState`] in your app state;
//! 2. render it with [`TreeView`], mapping [`TreeEvent`]s into your message;
//! 3. feed those events back into [`TreeState::update`] and route the
//!    returned [`TreeEffect`] with [`effect_task`];
//! 4. while [`TreeState::has_pending_scroll`] holds, send
//!    [`TreeEvent::Tick`] from a timer subscription.
//!
//! See `examples/virtual_tree.rs` for a complete runnable example.
//!
//! # Quick Example
//!
//! ```no_run
//! use iced::widget::{container, text};
//! use iced::{Element, Length};
//! use scope_ui_tree::{TreeEvent, TreeNode, TreeSettings, TreeState, TreeView};
//!
//! #[derive(Debug, Clone)]
//! enum Message {
//!     Tree(TreeEvent),
//! }
//!
//! let state = TreeState::with_data(
//!     vec![TreeNode::new(
//!         "contracts",
//!         "contracts",
//!         vec![TreeNode::leaf("contracts/Vault.sol", "Vault.sol")],
//!     )],
//!     TreeSettings::default().with_default_expand_all(true),
//! );
//!
//! let _view: Element<'_, Message> =
//!     TreeView::new(&state, Message::Tree, |context| {
//!         container(text(context.row.title.clone()))
//!             .width(Length::Fill)
//!             .into()
//!     })
//!     .view();
//! ```

mod coalesce;
mod error;
mod event;
mod expansion;
mod model;
mod settings;
mod state;
mod view;
mod window;

pub use coalesce::ScrollCoalescer;
pub use error::TreeError;
pub use event::{TreeEffect, TreeEvent};
pub use expansion::{ExpandPolicy, ExpansionSet};
pub use model::{
    FlattenedRow, ROOT_NODE_KEY, RowKind, RowLayout, SUFFIX_NODE_KEY, Title,
    TreeKey, TreeNode, find_node, flatten_tree, nodes_or_empty, parse_nodes,
    row_index,
};
pub use settings::TreeSettings;
pub use state::TreeState;
pub use view::{
    TREE_SCROLL_ID, TreeRowContext, TreeView, effect_task, scroll_task,
};
pub use window::{Align, RowHeight, VirtualWindow, WindowRange};

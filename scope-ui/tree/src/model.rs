use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::error::TreeError;
use crate::expansion::ExpansionSet;

/// Opaque node identifier.
///
/// Keys double as expansion, selection and scroll-target identifiers, so
/// they must be unique across the whole tree. Duplicate keys are not
/// detected and lead to unspecified row matching.
pub type TreeKey = String;

/// Key reported by the synthetic row that follows the selected row.
pub const SUFFIX_NODE_KEY: &str = "__scope_tree_suffix__";

/// Default key excluded from selection.
pub const ROOT_NODE_KEY: &str = "__scope_tree_root__";

type TitleFn = dyn Fn(&TreeNode, usize) -> String + Send + Sync;

/// Row label, either fixed or computed from the node and its depth.
#[derive(Clone)]
pub enum Title {
    Static(String),
    Dynamic(Arc<TitleFn>),
}

impl Title {
    /// Build a title computed from the node and its depth.
    pub fn dynamic(
        title: impl Fn(&TreeNode, usize) -> String + Send + Sync + 'static,
    ) -> Self {
        Self::Dynamic(Arc::new(title))
    }

    /// Resolve the label for `node` rendered at `depth`.
    pub fn resolve(&self, node: &TreeNode, depth: usize) -> String {
        match self {
            Title::Static(title) => title.clone(),
            Title::Dynamic(title) => title(node, depth),
        }
    }

    fn describe(&self) -> &str {
        match self {
            Title::Static(title) => title,
            Title::Dynamic(_) => "<dynamic>",
        }
    }
}

impl Default for Title {
    fn default() -> Self {
        Self::Static(String::new())
    }
}

impl fmt::Debug for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Title::Static(title) => f.debug_tuple("Static").field(title).finish(),
            Title::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl PartialEq for Title {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Title::Static(left), Title::Static(right)) => left == right,
            (Title::Dynamic(left), Title::Dynamic(right)) => {
                Arc::ptr_eq(left, right)
            },
            _ => false,
        }
    }
}

impl From<&str> for Title {
    fn from(title: &str) -> Self {
        Self::Static(title.to_owned())
    }
}

impl From<String> for Title {
    fn from(title: String) -> Self {
        Self::Static(title)
    }
}

impl<'de> Deserialize<'de> for Title {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Title::Static)
    }
}

/// One node of the caller-supplied hierarchy.
///
/// Drop, clone and equality walk the subtree with an explicit stack, so a
/// node may be nested arbitrarily deep.
#[derive(Debug, Default, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    key: TreeKey,
    #[serde(default)]
    title: Title,
    #[serde(default)]
    children: Vec<TreeNode>,
}

impl TreeNode {
    /// Create a node with children.
    pub fn new(
        key: impl Into<TreeKey>,
        title: impl Into<Title>,
        children: Vec<TreeNode>,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            children,
        }
    }

    /// Create a node without children.
    pub fn leaf(key: impl Into<TreeKey>, title: impl Into<Title>) -> Self {
        Self::new(key, title, Vec::new())
    }

    /// Key identifying the node across expansion, selection and scrolling.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Unresolved row label.
    pub fn title(&self) -> &Title {
        &self.title
    }

    /// Ordered children; empty for a leaf.
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// Whether the node can be expanded. Empty children count as a leaf.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl Clone for TreeNode {
    fn clone(&self) -> Self {
        enum Step<'a> {
            Enter(&'a TreeNode),
            Build(&'a TreeNode),
        }

        // Children are finished before their parent, so each `Build` finds
        // its clones at the tail of `built`.
        let mut steps = vec![Step::Enter(self)];
        let mut built: Vec<TreeNode> = Vec::new();
        while let Some(step) = steps.pop() {
            match step {
                Step::Enter(node) => {
                    steps.push(Step::Build(node));
                    steps.extend(node.children.iter().rev().map(Step::Enter));
                },
                Step::Build(node) => {
                    let first_child =
                        built.len().saturating_sub(node.children.len());
                    let children = built.split_off(first_child);
                    built.push(TreeNode {
                        key: node.key.clone(),
                        title: node.title.clone(),
                        children,
                    });
                },
            }
        }

        built.pop().unwrap_or_default()
    }
}

impl PartialEq for TreeNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            if left.key != right.key
                || left.title != right.title
                || left.children.len() != right.children.len()
            {
                return false;
            }
            pending.extend(left.children.iter().zip(right.children.iter()));
        }
        true
    }
}

/// What a flattened row stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowKind<'a> {
    /// A node of the source tree.
    Node(&'a TreeNode),
    /// Synthetic row hosting auxiliary content after the selected row.
    Suffix,
}

/// Visible tree row produced by [`flatten_tree`].
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedRow<'a> {
    /// Zero-based tree depth (`0` for root-level rows and the suffix row).
    pub depth: usize,
    /// Title resolved for this depth.
    pub title: String,
    pub kind: RowKind<'a>,
}

impl<'a> FlattenedRow<'a> {
    fn node(node: &'a TreeNode, depth: usize) -> Self {
        Self {
            depth,
            title: node.title.resolve(node, depth),
            kind: RowKind::Node(node),
        }
    }

    fn suffix() -> Self {
        Self {
            depth: 0,
            title: String::new(),
            kind: RowKind::Suffix,
        }
    }

    /// Row key; the suffix row reports [`SUFFIX_NODE_KEY`].
    pub fn key(&self) -> &'a str {
        match self.kind {
            RowKind::Node(node) => node.key(),
            RowKind::Suffix => SUFFIX_NODE_KEY,
        }
    }

    /// Source node, `None` for the suffix row.
    pub fn source(&self) -> Option<&'a TreeNode> {
        match self.kind {
            RowKind::Node(node) => Some(node),
            RowKind::Suffix => None,
        }
    }

    /// Whether this is the synthetic row following the selected row.
    pub fn is_suffix(&self) -> bool {
        matches!(self.kind, RowKind::Suffix)
    }

    /// Whether the row shows an expand/collapse affordance.
    pub fn has_children(&self) -> bool {
        self.source().is_some_and(TreeNode::has_children)
    }
}

/// Flatten a tree into a pre-order list of visible rows.
///
/// A node's children are emitted only when the node has children and its key
/// is in `expanded`. When `with_suffix` is set and `selected` matches an
/// emitted row, one [`RowKind::Suffix`] row is inserted right after it.
///
/// Traversal uses an explicit stack, so arbitrarily deep trees are safe.
pub fn flatten_tree<'a>(
    roots: &'a [TreeNode],
    expanded: &ExpansionSet,
    selected: Option<&str>,
    with_suffix: bool,
) -> Vec<FlattenedRow<'a>> {
    let mut rows = Vec::new();
    let mut suffix_target = if with_suffix { selected } else { None };
    let mut stack: Vec<(&'a TreeNode, usize)> =
        roots.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        rows.push(FlattenedRow::node(node, depth));

        if suffix_target == Some(node.key()) {
            rows.push(FlattenedRow::suffix());
            suffix_target = None;
        }

        if node.has_children() && expanded.is_expanded(node.key()) {
            stack.extend(
                node.children.iter().rev().map(|child| (child, depth + 1)),
            );
        }
    }

    rows
}

/// Find a node anywhere in the tree, regardless of expansion.
pub fn find_node<'a>(roots: &'a [TreeNode], key: &str) -> Option<&'a TreeNode> {
    let mut stack: Vec<&'a TreeNode> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        if node.key() == key {
            return Some(node);
        }
        stack.extend(node.children.iter().rev());
    }
    None
}

/// Resolve a key into its index within `rows`. The suffix row never matches.
pub fn row_index(rows: &[FlattenedRow<'_>], key: &str) -> Option<usize> {
    rows.iter()
        .position(|row| !row.is_suffix() && row.key() == key)
}

/// One visible row recorded without borrowing the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowSlot {
    depth: usize,
    key: TreeKey,
    /// Row of the parent node; `None` for roots and the suffix row.
    parent: Option<usize>,
    /// Index among the parent's children, or among the roots.
    position: usize,
    has_children: bool,
}

/// Cached shape of the flattened sequence.
///
/// Built by the same traversal as [`flatten_tree`] but stores keys and
/// positions only. Titles are resolved per row through [`RowLayout::row`],
/// so rows outside the rendered window never call a [`Title::Dynamic`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowLayout {
    slots: Vec<RowSlot>,
    suffix_index: Option<usize>,
}

impl RowLayout {
    /// Lay out the visible rows of `roots`.
    pub fn build(
        roots: &[TreeNode],
        expanded: &ExpansionSet,
        selected: Option<&str>,
        with_suffix: bool,
    ) -> Self {
        let mut layout = Self::default();
        let mut suffix_target = if with_suffix { selected } else { None };
        let mut stack: Vec<(&TreeNode, usize, Option<usize>, usize)> = roots
            .iter()
            .enumerate()
            .rev()
            .map(|(position, node)| (node, 0, None, position))
            .collect();

        while let Some((node, depth, parent, position)) = stack.pop() {
            let row = layout.slots.len();
            layout.slots.push(RowSlot {
                depth,
                key: node.key.clone(),
                parent,
                position,
                has_children: node.has_children(),
            });

            if suffix_target == Some(node.key()) {
                layout.suffix_index = Some(layout.slots.len());
                layout.slots.push(RowSlot {
                    depth: 0,
                    key: TreeKey::from(SUFFIX_NODE_KEY),
                    parent: None,
                    position: 0,
                    has_children: false,
                });
                suffix_target = None;
            }

            if node.has_children() && expanded.is_expanded(node.key()) {
                stack.extend(node.children.iter().enumerate().rev().map(
                    |(position, child)| (child, depth + 1, Some(row), position),
                ));
            }
        }

        layout
    }

    /// Number of visible rows, suffix included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no row is visible.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Index of the suffix row, if one was inserted.
    pub fn suffix_index(&self) -> Option<usize> {
        self.suffix_index
    }

    /// Key of row `index`; the suffix row reports [`SUFFIX_NODE_KEY`].
    pub fn key(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(|slot| slot.key.as_str())
    }

    /// Depth of row `index`.
    pub fn depth(&self, index: usize) -> Option<usize> {
        self.slots.get(index).map(|slot| slot.depth)
    }

    /// Whether row `index` shows an expand/collapse affordance.
    pub fn has_children(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|slot| slot.has_children)
    }

    /// Resolve a key into its row index. The suffix row never matches.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.slots.iter().enumerate().position(|(index, slot)| {
            Some(index) != self.suffix_index && slot.key == key
        })
    }

    /// Source node of row `index` within `roots`, `None` for the suffix row.
    ///
    /// `roots` must be the tree the layout was built from.
    pub fn node<'a>(
        &self,
        roots: &'a [TreeNode],
        index: usize,
    ) -> Option<&'a TreeNode> {
        if Some(index) == self.suffix_index {
            return None;
        }

        let mut positions = Vec::new();
        let mut cursor = Some(index);
        while let Some(row) = cursor {
            let slot = self.slots.get(row)?;
            positions.push(slot.position);
            cursor = slot.parent;
        }

        let mut level = roots;
        let mut node = None;
        for &position in positions.iter().rev() {
            let current = level.get(position)?;
            level = &current.children;
            node = Some(current);
        }
        node
    }

    /// Materialize row `index`, resolving its title.
    pub fn row<'a>(
        &self,
        roots: &'a [TreeNode],
        index: usize,
    ) -> Option<FlattenedRow<'a>> {
        if Some(index) == self.suffix_index {
            return Some(FlattenedRow::suffix());
        }

        let depth = self.depth(index)?;
        self.node(roots, index)
            .map(|node| FlattenedRow::node(node, depth))
    }
}

/// Parse a JSON array of nodes, rejecting nodes without a key.
pub fn parse_nodes(json: &str) -> Result<Vec<TreeNode>, TreeError> {
    let nodes: Vec<TreeNode> = serde_json::from_str(json)?;

    let mut stack: Vec<&TreeNode> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        if node.key.is_empty() {
            return Err(TreeError::MissingKey {
                title: node.title.describe().to_owned(),
            });
        }
        stack.extend(node.children.iter());
    }

    Ok(nodes)
}

/// Parse nodes, degrading to an empty tree on malformed input.
pub fn nodes_or_empty(json: &str) -> Vec<TreeNode> {
    match parse_nodes(json) {
        Ok(nodes) => nodes,
        Err(err) => {
            log::warn!("tree data rejected, rendering nothing: {err}");
            Vec::new()
        },
    }
}

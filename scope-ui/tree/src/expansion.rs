use std::collections::HashSet;

use crate::model::{TreeKey, TreeNode};

/// How the expansion set is seeded when data or options change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpandPolicy {
    /// Start with every node collapsed.
    #[default]
    Collapsed,
    /// Expand every node that has children.
    All,
    /// Expand nodes with children whose depth is below the limit.
    Depth(usize),
}

impl ExpandPolicy {
    /// Resolve the policy from the two tree options.
    ///
    /// An explicit depth limit takes precedence over `default_expand_all`.
    pub fn from_options(
        default_expand_all: bool,
        expand_depth: Option<usize>,
    ) -> Self {
        match (expand_depth, default_expand_all) {
            (Some(depth), _) => Self::Depth(depth),
            (None, true) => Self::All,
            (None, false) => Self::Collapsed,
        }
    }
}

/// Set of currently expanded node keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionSet {
    keys: HashSet<TreeKey>,
}

impl ExpansionSet {
    /// Create a set with nothing expanded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is expanded.
    pub fn is_expanded(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Flip membership of `key` and return whether it is now expanded.
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.keys.remove(key) {
            return false;
        }

        self.keys.insert(key.to_owned());
        true
    }

    /// Collapse every node.
    pub fn reset_to_empty(&mut self) {
        self.keys.clear();
    }

    /// Expand every node that has at least one child.
    pub fn reset_to_all(&mut self, roots: &[TreeNode]) {
        self.keys = collect_parents(roots, None);
    }

    /// Expand nodes with children at depth strictly below `max_depth`.
    pub fn reset_to_depth(&mut self, roots: &[TreeNode], max_depth: usize) {
        self.keys = collect_parents(roots, Some(max_depth));
    }

    /// Reseed the set according to `policy`.
    pub fn apply_policy(&mut self, roots: &[TreeNode], policy: ExpandPolicy) {
        match policy {
            ExpandPolicy::Collapsed => self.reset_to_empty(),
            ExpandPolicy::All => self.reset_to_all(roots),
            ExpandPolicy::Depth(depth) => self.reset_to_depth(roots, depth),
        }
        log::debug!(
            "tree expansion reset with {policy:?}: {} expanded",
            self.keys.len()
        );
    }

    /// Number of expanded keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing is expanded.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Expanded keys in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Whether every key expanded here is also expanded in `other`.
    pub fn is_subset(&self, other: &ExpansionSet) -> bool {
        self.keys.is_subset(&other.keys)
    }
}

fn collect_parents(
    roots: &[TreeNode],
    max_depth: Option<usize>,
) -> HashSet<TreeKey> {
    let mut keys = HashSet::new();
    let mut stack: Vec<(&TreeNode, usize)> =
        roots.iter().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        if max_depth.is_some_and(|limit| depth >= limit) {
            continue;
        }
        if !node.has_children() {
            continue;
        }

        keys.insert(node.key().to_owned());
        stack.extend(node.children().iter().map(|child| (child, depth + 1)));
    }

    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TreeNode, flatten_tree};

    fn three_levels() -> Vec<TreeNode> {
        vec![
            TreeNode::new(
                "root",
                "Root",
                vec![
                    TreeNode::new(
                        "mid",
                        "Mid",
                        vec![TreeNode::new(
                            "deep",
                            "Deep",
                            vec![TreeNode::leaf("leaf", "Leaf")],
                        )],
                    ),
                    TreeNode::leaf("mid-leaf", "Mid leaf"),
                ],
            ),
            TreeNode::leaf("solo", "Solo"),
        ]
    }

    fn sorted(set: &ExpansionSet) -> Vec<&str> {
        let mut keys: Vec<&str> = set.iter().collect();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn given_key_when_toggled_twice_then_set_is_restored() {
        let mut set = ExpansionSet::new();
        set.toggle("x");
        let before = set.clone();

        assert!(set.toggle("y"));
        assert!(!set.toggle("y"));
        assert_eq!(set, before);

        assert!(!set.toggle("x"));
        assert!(set.toggle("x"));
        assert_eq!(set, before);
    }

    #[test]
    fn given_tree_when_reset_to_all_then_only_parents_are_expanded() {
        let mut set = ExpansionSet::new();
        set.reset_to_all(&three_levels());

        assert_eq!(sorted(&set), vec!["deep", "mid", "root"]);
    }

    #[test]
    fn given_depth_one_when_reset_then_grandchildren_stay_hidden() {
        let tree = three_levels();
        let mut set = ExpansionSet::new();
        set.reset_to_depth(&tree, 1);

        assert_eq!(sorted(&set), vec!["root"]);

        let rows = flatten_tree(&tree, &set, None, false);
        let keys: Vec<&str> = rows.iter().map(|row| row.key()).collect();
        assert_eq!(keys, vec!["root", "mid", "mid-leaf", "solo"]);
    }

    #[test]
    fn given_depth_zero_when_reset_then_nothing_is_expanded() {
        let mut set = ExpansionSet::new();
        set.reset_to_depth(&three_levels(), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn given_increasing_depths_when_reset_then_sets_grow_monotonically() {
        let tree = three_levels();
        let mut previous = ExpansionSet::new();
        previous.reset_to_depth(&tree, 0);

        for depth in 1..=3 {
            let mut next = ExpansionSet::new();
            next.reset_to_depth(&tree, depth);

            assert!(previous.is_subset(&next));
            assert!(next.len() > previous.len(), "depth {depth}");
            previous = next;
        }

        let mut beyond = ExpansionSet::new();
        beyond.reset_to_depth(&tree, 10);
        let mut all = ExpansionSet::new();
        all.reset_to_all(&tree);
        assert_eq!(beyond, all);
    }

    #[test]
    fn given_expanded_keys_when_reset_to_empty_then_set_is_cleared() {
        let mut set = ExpansionSet::new();
        set.reset_to_all(&three_levels());
        set.reset_to_empty();
        assert!(set.is_empty());
    }

    #[test]
    fn given_both_options_when_policy_resolved_then_depth_wins() {
        assert_eq!(
            ExpandPolicy::from_options(true, Some(2)),
            ExpandPolicy::Depth(2)
        );
        assert_eq!(ExpandPolicy::from_options(true, None), ExpandPolicy::All);
        assert_eq!(
            ExpandPolicy::from_options(false, None),
            ExpandPolicy::Collapsed
        );
    }

    #[test]
    fn given_policy_when_applied_then_matches_direct_reset() {
        let tree = three_levels();
        let mut via_policy = ExpansionSet::new();
        via_policy.apply_policy(&tree, ExpandPolicy::Depth(2));
        let mut direct = ExpansionSet::new();
        direct.reset_to_depth(&tree, 2);

        assert_eq!(via_policy, direct);
    }
}

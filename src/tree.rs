//! The hitting-set tree (C4, §3, §4.4).
//!
//! Nodes live in a [`slotmap::SlotMap`] arena and reference each other by
//! [`NodeKey`] rather than through `Rc<RefCell<_>>`, so the tree has a
//! single owner and no interior-mutability bookkeeping to get wrong.

use slotmap::{new_key_type, SlotMap};

use crate::dataset::Dataset;
use crate::formula::Formula;

new_key_type! {
    /// A stable reference to a node in a [`HsTree`]'s arena.
    pub struct NodeKey;
}

/// What a node currently knows about its kernel (§3 "kernel" node state).
#[derive(Debug, Clone)]
pub enum KernelState {
    /// Not yet computed.
    Unknown,
    /// A concrete kernel was found here.
    Kernel(Vec<Formula>),
    /// The kernel strategy returned ⊥ on this node's dataset: it's a leaf.
    Leaf,
    /// Pruned by branch-and-bound before its kernel was materialised (or
    /// after, if it was materialised right before the bound tightened).
    Pruned,
}

/// A single hitting-set tree node (§3).
pub struct Node {
    pub kernel: KernelState,
    pub edge: Option<Formula>,
    pub level: u32,
    pub dataset: Dataset,
    pub bbvalue: f64,
    pub parent: Option<NodeKey>,
    pub children: Vec<NodeKey>,
    pub pruned: bool,
}

/// The hitting-set tree (§3, §4.4).
pub struct HsTree {
    arena: SlotMap<NodeKey, Node>,
    root: NodeKey,
    /// Best leaf path-cost seen so far (the branch-and-bound incumbent).
    /// Monotone non-increasing (§8 invariant 5).
    pub boundary: f64,
    /// Insertion-ordered list of leaves encountered during the search.
    pub leaf_nodes: Vec<NodeKey>,
    /// The leaf that most recently *improved* the boundary, i.e. the one
    /// `optimal_hitting_set()` should report from — see §9/DESIGN.md for
    /// why this is tracked separately from `leaf_nodes.last()`.
    boundary_leaf: Option<NodeKey>,
}

impl HsTree {
    /// Creates a tree whose root carries `dataset` and an as-yet-unknown
    /// kernel.
    #[must_use]
    pub fn new(dataset: Dataset) -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node {
            kernel: KernelState::Unknown,
            edge: None,
            level: 0,
            dataset,
            bbvalue: 0.0,
            parent: None,
            children: Vec::new(),
            pruned: false,
        });
        HsTree {
            arena,
            root,
            boundary: f64::INFINITY,
            leaf_nodes: Vec::new(),
            boundary_leaf: None,
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn node(&self, key: NodeKey) -> &Node {
        &self.arena[key]
    }

    pub fn node_mut(&mut self, key: NodeKey) -> &mut Node {
        &mut self.arena[key]
    }

    /// Inserts a new node as a child of `parent`, setting `level` and
    /// appending it to `parent.children` (§4.4 `add_child`).
    pub fn add_child(
        &mut self,
        parent: NodeKey,
        dataset: Dataset,
        edge: Formula,
        bbvalue: f64,
    ) -> NodeKey {
        let level = self.arena[parent].level + 1;
        let child = self.arena.insert(Node {
            kernel: KernelState::Unknown,
            edge: Some(edge),
            level,
            dataset,
            bbvalue,
            parent: Some(parent),
            children: Vec::new(),
            pruned: false,
        });
        self.arena[parent].children.push(child);
        child
    }

    /// Records `n` in `leaf_nodes` (§4.4 `add_leaf_node`).
    pub fn add_leaf_node(&mut self, n: NodeKey) {
        self.leaf_nodes.push(n);
    }

    /// Walks from `n` to the root accumulating `1/cost(edge)` (treating
    /// `cost == 0` or absent as contributing 0), per §4.4 `path_cost`.
    #[must_use]
    pub fn path_cost(&self, n: NodeKey) -> f64 {
        let mut total = 0.0;
        let mut current = n;
        loop {
            let node = &self.arena[current];
            if let Some(edge) = &node.edge {
                let parent = node.parent.expect("a node with an edge has a parent");
                let cost = self.arena[parent].dataset.cost(edge).unwrap_or(0.0);
                if cost > 0.0 {
                    total += 1.0 / cost;
                }
                current = parent;
            } else {
                break;
            }
        }
        total
    }

    /// If `path_cost(leaf)` improves on `boundary`, lowers it and
    /// remembers `leaf` as the node that did so (§4.4 `update_boundary`,
    /// §9 for the leaf-binding fix).
    pub fn update_boundary(&mut self, leaf: NodeKey) {
        let measure = self.path_cost(leaf);
        if measure < self.boundary {
            self.boundary = measure;
            self.boundary_leaf = Some(leaf);
        }
    }

    /// The sequence of `edge`s from a leaf up to the root, in
    /// leaf-to-root order (§4.4 `optimal_hitting_set`).
    fn hitting_set_from_leaf(&self, leaf: NodeKey) -> Vec<Formula> {
        let mut out = Vec::new();
        let mut current = leaf;
        loop {
            let node = &self.arena[current];
            match (&node.edge, node.parent) {
                (Some(edge), Some(parent)) => {
                    out.push(edge.clone());
                    current = parent;
                }
                _ => break,
            }
        }
        out
    }

    /// The hitting set bound to the leaf that established the current
    /// `boundary` — the corrected reading of §4.4's `optimal_hitting_set`,
    /// per §9/DESIGN.md. Returns `None` if no leaf has been recorded yet.
    #[must_use]
    pub fn optimal_hitting_set(&self) -> Option<Vec<Formula>> {
        self.boundary_leaf.map(|leaf| self.hitting_set_from_leaf(leaf))
    }

    /// The literal reading of §4.4: the path through the most recently
    /// recorded leaf, which need not be the leaf that set the boundary.
    /// Kept only so callers that want the unfixed behaviour (or tests that
    /// assert the two coincide) can ask for it explicitly.
    #[must_use]
    pub fn last_leaf_hitting_set(&self) -> Option<Vec<Formula>> {
        self.leaf_nodes
            .last()
            .map(|&leaf| self.hitting_set_from_leaf(leaf))
    }

    /// Sums kernel-bearing nodes and branching factor over the
    /// non-pruned subtree rooted at `start` (root if `None`), §4.4
    /// `count_kernels_and_branches`.
    #[must_use]
    pub fn count_kernels_and_branches(&self, start: Option<NodeKey>) -> (u64, u64) {
        let root = start.unwrap_or(self.root);
        self.count_kernels_and_branches_from(root)
    }

    fn count_kernels_and_branches_from(&self, key: NodeKey) -> (u64, u64) {
        let node = &self.arena[key];
        if node.pruned {
            return (0, 0);
        }
        let mut kernels = match node.kernel {
            KernelState::Kernel(_) => 1,
            _ => 0,
        };
        let mut branches = node.children.len() as u64;
        for &child in &node.children {
            let (k, b) = self.count_kernels_and_branches_from(child);
            kernels += k;
            branches += b;
        }
        (kernels, branches)
    }

    /// Counts pruned nodes over the whole tree, §4.4 `count_pruned_nodes`.
    #[must_use]
    pub fn count_pruned_nodes(&self) -> u64 {
        self.count_pruned_nodes_from(self.root)
    }

    fn count_pruned_nodes_from(&self, key: NodeKey) -> u64 {
        let node = &self.arena[key];
        let mut count = u64::from(node.pruned);
        for &child in &node.children {
            count += self.count_pruned_nodes_from(child);
        }
        count
    }

    /// Maximum level over the materialised subtree, 0 for an isolated
    /// root, §4.4 `tree_depth`.
    #[must_use]
    pub fn tree_depth(&self) -> u32 {
        self.tree_depth_from(self.root)
    }

    fn tree_depth_from(&self, key: NodeKey) -> u32 {
        let node = &self.arena[key];
        node.children
            .iter()
            .map(|&c| self.tree_depth_from(c))
            .max()
            .map_or(0, |max_child_depth| max_child_depth + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Formula;

    fn f(s: &str) -> Formula {
        Formula::parse(s).unwrap()
    }

    #[test]
    fn root_has_level_zero_and_no_edge() {
        let tree = HsTree::new(Dataset::new());
        let root = tree.node(tree.root());
        assert_eq!(root.level, 0);
        assert!(root.edge.is_none());
        assert_eq!(tree.path_cost(tree.root()), 0.0);
    }

    #[test]
    fn child_level_is_parent_plus_one() {
        let mut tree = HsTree::new(Dataset::new());
        let root = tree.root();
        let child = tree.add_child(root, Dataset::new(), f("A"), 1.0);
        assert_eq!(tree.node(child).level, 1);
        assert_eq!(tree.node(root).children, vec![child]);
    }

    #[test]
    fn path_cost_treats_zero_cost_as_zero_contribution() {
        let mut root_ds = Dataset::new();
        root_ds.add(f("A"));
        root_ds.set_cost(f("A"), Some(0.0));
        let mut tree = HsTree::new(root_ds);
        let root = tree.root();
        let child = tree.add_child(root, Dataset::new(), f("A"), 0.0);
        assert_eq!(tree.path_cost(child), 0.0);
    }

    #[test]
    fn path_cost_accumulates_one_over_cost() {
        let mut root_ds = Dataset::new();
        root_ds.add(f("A"));
        root_ds.set_cost(f("A"), Some(2.0));
        let mut tree = HsTree::new(root_ds);
        let root = tree.root();
        let child = tree.add_child(root, Dataset::new(), f("A"), 0.5);
        assert_eq!(tree.path_cost(child), 0.5);
    }

    #[test]
    fn boundary_is_monotone_non_increasing() {
        let mut root_ds = Dataset::new();
        root_ds.add(f("A"));
        root_ds.add(f("B"));
        root_ds.set_cost(f("A"), Some(1.0));
        root_ds.set_cost(f("B"), Some(1.0));
        let mut tree = HsTree::new(root_ds);
        let root = tree.root();
        let leaf1 = tree.add_child(root, Dataset::new(), f("A"), 1.0);
        let leaf2 = tree.add_child(root, Dataset::new(), f("B"), 1.0);
        tree.update_boundary(leaf1);
        let after_first = tree.boundary;
        tree.update_boundary(leaf2);
        assert!(tree.boundary <= after_first);
    }

    #[test]
    fn optimal_hitting_set_binds_to_the_boundary_setting_leaf() {
        let mut root_ds = Dataset::new();
        root_ds.add(f("A"));
        root_ds.add(f("B"));
        root_ds.set_cost(f("A"), Some(1.0));
        root_ds.set_cost(f("B"), Some(2.0));
        let mut tree = HsTree::new(root_ds);
        let root = tree.root();
        // B has a lower path cost (1/2 < 1/1), so it should become and
        // remain the boundary-setting leaf even though it's added second.
        let leaf_a = tree.add_child(root, Dataset::new(), f("A"), 1.0);
        let leaf_b = tree.add_child(root, Dataset::new(), f("B"), 0.5);
        tree.update_boundary(leaf_a);
        tree.update_boundary(leaf_b);
        assert_eq!(tree.optimal_hitting_set(), Some(vec![f("B")]));
        assert_eq!(tree.last_leaf_hitting_set(), Some(vec![f("B")]));
    }

    #[test]
    fn tree_depth_of_isolated_root_is_zero() {
        let tree = HsTree::new(Dataset::new());
        assert_eq!(tree.tree_depth(), 0);
    }

    #[test]
    fn count_pruned_nodes_counts_only_flagged_nodes() {
        let mut tree = HsTree::new(Dataset::new());
        let root = tree.root();
        let child = tree.add_child(root, Dataset::new(), f("A"), 1.0);
        tree.node_mut(child).pruned = true;
        assert_eq!(tree.count_pruned_nodes(), 1);
    }
}

//! Plain enumeration search: no pruning, exhaustive recursion over kernel
//! elements (§4.5.1).

use std::time::Instant;

use crate::error::SearchError;
use crate::formula::Formula;
use crate::kernel::KernelStrategy;
use crate::oracle::EntailmentOracle;
use crate::tree::{HsTree, KernelState, NodeKey};

use super::{check_deadline, SearchStrategy};

/// Reference BFS/DFS enumeration: expands every kernel element as a child,
/// with no branch-and-bound pruning.
#[derive(Default)]
pub struct Enumeration;

impl SearchStrategy for Enumeration {
    fn run(
        &self,
        oracle: &dyn EntailmentOracle,
        kernel_strategy: &dyn KernelStrategy,
        tree: &mut HsTree,
        alpha: &Formula,
        deadline: Option<Instant>,
    ) -> Result<(), SearchError> {
        let root = tree.root();
        self.expand(oracle, kernel_strategy, tree, root, alpha, deadline)
    }
}

impl Enumeration {
    fn expand(
        &self,
        oracle: &dyn EntailmentOracle,
        kernel_strategy: &dyn KernelStrategy,
        tree: &mut HsTree,
        node: NodeKey,
        alpha: &Formula,
        deadline: Option<Instant>,
    ) -> Result<(), SearchError> {
        check_deadline(deadline)?;
        let dataset = tree.node(node).dataset.deep_clone();
        match kernel_strategy.find_kernel(oracle, &dataset, alpha)? {
            None => {
                tree.node_mut(node).kernel = KernelState::Leaf;
                tree.add_leaf_node(node);
                tree.update_boundary(node);
            }
            Some(kernel) if kernel.is_empty() => {
                // alpha is a tautology: the empty set is already a kernel.
                tree.node_mut(node).kernel = KernelState::Leaf;
                tree.add_leaf_node(node);
                tree.update_boundary(node);
            }
            Some(kernel) => {
                let elements = kernel.elements().to_vec();
                tree.node_mut(node).kernel = KernelState::Kernel(elements.clone());
                for e in elements {
                    let mut child_dataset = dataset.deep_clone();
                    child_dataset.remove(&e);
                    let child = tree.add_child(node, child_dataset, e, 0.0);
                    self.expand(oracle, kernel_strategy, tree, child, alpha, deadline)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::shared_test_support::dataset_of;
    use crate::testing::TruthTableOracle;

    fn f(s: &str) -> Formula {
        Formula::parse(s).unwrap()
    }

    #[test]
    fn tautology_query_is_a_single_leaf_root() {
        use crate::kernel::ExpandShrink;
        let oracle = TruthTableOracle;
        let kernel_strategy = ExpandShrink::new(1, false);
        let dataset = dataset_of(&["A"]);
        let mut tree = HsTree::new(dataset);
        Enumeration
            .run(&oracle, &kernel_strategy, &mut tree, &f("B || !B"), None)
            .unwrap();
        assert_eq!(tree.node(tree.root()).children.len(), 0);
        assert_eq!(tree.leaf_nodes.len(), 1);
    }

    #[test]
    fn branches_once_per_kernel_element() {
        use crate::kernel::ExpandShrink;
        let oracle = TruthTableOracle;
        let kernel_strategy = ExpandShrink::new(1, false);
        let dataset = dataset_of(&["A", "A => B"]);
        let mut tree = HsTree::new(dataset);
        Enumeration
            .run(&oracle, &kernel_strategy, &mut tree, &f("B"), None)
            .unwrap();
        assert_eq!(tree.node(tree.root()).children.len(), 2);
    }
}

//! Hybrid priority branch-and-bound search (§4.5.2).

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use crate::error::SearchError;
use crate::formula::Formula;
use crate::kernel::KernelStrategy;
use crate::oracle::EntailmentOracle;
use crate::tree::{HsTree, KernelState, NodeKey};

use super::{check_deadline, SearchStrategy};

/// A max-heap entry ordered by `cost(edge)` and then by insertion order
/// (earlier wins ties), realising the "negative priority" min-heap of
/// §4.5.2 the natural way in `std::collections::BinaryHeap` (§10.5).
struct QueueEntry {
    node: NodeKey,
    priority: f64,
    sequence: u64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}
impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Best-first branch-and-bound over the hitting-set tree.
#[derive(Default)]
pub struct Hybrid;

impl SearchStrategy for Hybrid {
    fn run(
        &self,
        oracle: &dyn EntailmentOracle,
        kernel_strategy: &dyn KernelStrategy,
        tree: &mut HsTree,
        alpha: &Formula,
        deadline: Option<Instant>,
    ) -> Result<(), SearchError> {
        let mut heap = BinaryHeap::new();
        let mut sequence = 0u64;
        heap.push(QueueEntry {
            node: tree.root(),
            priority: 0.0,
            sequence,
        });
        sequence += 1;

        while let Some(entry) = heap.pop() {
            check_deadline(deadline)?;
            let node = entry.node;

            let hsv = tree.path_cost(node);
            if hsv >= tree.boundary {
                tree.node_mut(node).pruned = true;
                tree.node_mut(node).kernel = KernelState::Pruned;
                continue;
            }

            if !matches!(tree.node(node).kernel, KernelState::Unknown) {
                continue;
            }

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

                    let mut with_cost: Vec<(Formula, f64)> = elements
                        .into_iter()
                        .map(|e| {
                            let cost = dataset.cost(&e).unwrap_or(0.0);
                            (e, cost)
                        })
                        .collect();
                    with_cost.sort_by(|a, b| b.1.total_cmp(&a.1));

                    let parent_bb = tree.node(node).bbvalue;
                    for (e, cost) in with_cost {
                        let mut child_dataset = dataset.deep_clone();
                        child_dataset.remove(&e);
                        let contribution = if cost > 0.0 { 1.0 / cost } else { 0.0 };
                        let bbvalue = parent_bb + contribution;
                        let child = tree.add_child(node, child_dataset, e, bbvalue);
                        heap.push(QueueEntry {
                            node: child,
                            priority: cost,
                            sequence,
                        });
                        sequence += 1;
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::ExpandShrink;
    use crate::search::shared_test_support::dataset_of;
    use crate::testing::TruthTableOracle;

    fn f(s: &str) -> Formula {
        Formula::parse(s).unwrap()
    }

    #[test]
    fn boundary_starts_infinite_and_ends_finite() {
        let oracle = TruthTableOracle;
        let kernel_strategy = ExpandShrink::new(1, false);
        let mut dataset = dataset_of(&["A", "B"]);
        dataset.set_cost(f("A"), Some(1.0));
        dataset.set_cost(f("B"), Some(2.0));
        let mut tree = HsTree::new(dataset);
        Hybrid
            .run(&oracle, &kernel_strategy, &mut tree, &f("A || B"), None)
            .unwrap();
        assert!(tree.boundary.is_finite());
    }

    #[test]
    fn pruning_keeps_the_cheapest_leaf_as_the_optimum() {
        let oracle = TruthTableOracle;
        let kernel_strategy = ExpandShrink::new(1, false);
        let mut dataset = dataset_of(&["A", "B"]);
        dataset.set_cost(f("A"), Some(1.0));
        dataset.set_cost(f("B"), Some(10.0));
        let mut tree = HsTree::new(dataset);
        // Both A and B are necessary for "A && B", so the root kernel
        // branches into two children. The high-cost B branch is expanded
        // first (§4.5.2 priority order), quickly becomes a leaf and sets
        // a tight boundary that prunes the low-cost A branch before it
        // can expand.
        Hybrid
            .run(&oracle, &kernel_strategy, &mut tree, &f("A && B"), None)
            .unwrap();
        assert_eq!(tree.optimal_hitting_set(), Some(vec![f("B")]));
        assert_eq!(tree.count_pruned_nodes(), 1);
    }

    #[test]
    fn queue_entry_orders_by_priority_then_earlier_sequence() {
        let a = QueueEntry {
            node: HsTree::new(dataset_of(&["A"])).root(),
            priority: 1.0,
            sequence: 5,
        };
        let b = QueueEntry {
            node: a.node,
            priority: 1.0,
            sequence: 2,
        };
        assert_eq!(a.cmp(&b), Ordering::Less);
    }
}

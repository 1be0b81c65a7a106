//! Shrink–expand kernel extraction (§4.3.2): a single linear deletion scan
//! over `B`, reporting the subset-minimal survivor as the kernel and its
//! complement as the dual remainder.

use crate::dataset::Dataset;
use crate::error::KernelError;
use crate::formula::Formula;
use crate::oracle::EntailmentOracle;

use super::{KernelStrategy, ITERATION_SLACK};

/// Has no `divide_and_conquer` variant (§4.3.2, §9: explicitly out of scope
/// for this strategy).
#[derive(Default)]
pub struct ShrinkExpand;

impl ShrinkExpand {
    /// Walks `b` left to right with an index pointer, tentatively removing
    /// the element under the pointer. If the rest still entails `alpha` the
    /// removal is committed and scanning resumes from the same position;
    /// otherwise the element is essential, the pointer advances, and the
    /// scan continues over every remaining position — it never stops at the
    /// first essential element, since doing so can strand an essential
    /// element that happens to sort first and hand back an unsound kernel.
    /// The survivor at the end is a subset-minimal kernel; its complement
    /// in `b` is the dual remainder.
    fn shrink(
        &self,
        oracle: &dyn EntailmentOracle,
        b: &Dataset,
        alpha: &Formula,
    ) -> Result<Dataset, KernelError> {
        let mut reduced = b.deep_clone();
        let bound = reduced.len() + ITERATION_SLACK;
        let initial_size = reduced.len();
        let mut i = 0usize;
        let mut iterations = 0usize;
        while i < reduced.len() {
            if iterations > bound {
                return Err(KernelError::IterationBoundExceeded {
                    bound,
                    size: initial_size,
                });
            }
            iterations += 1;
            let e = reduced.elements()[i].clone();
            let mut candidate = reduced.deep_clone();
            candidate.remove(&e);
            if oracle.entails(candidate.elements(), alpha)? {
                reduced = candidate;
            } else {
                i += 1;
            }
        }
        Ok(reduced)
    }
}

impl KernelStrategy for ShrinkExpand {
    fn find_kernel(
        &self,
        oracle: &dyn EntailmentOracle,
        b: &Dataset,
        alpha: &Formula,
    ) -> Result<Option<Dataset>, KernelError> {
        if !oracle.entails(b.elements(), alpha)? {
            return Ok(None);
        }
        Ok(Some(self.shrink(oracle, b, alpha)?))
    }
}

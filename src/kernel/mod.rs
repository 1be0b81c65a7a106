//! Kernel extraction (C3, §4.3): `find_kernel(B, α) → K | ⊥`.

mod expand_shrink;
mod shrink_expand;

pub use expand_shrink::ExpandShrink;
pub use shrink_expand::ShrinkExpand;

use crate::dataset::Dataset;
use crate::error::KernelError;
use crate::formula::Formula;
use crate::oracle::EntailmentOracle;

/// The per-call iteration bound is `|B| + ITERATION_SLACK`, guarding
/// against an unsound or unstable oracle looping forever (§4.3.1).
const ITERATION_SLACK: usize = 16;

/// A kernel-extraction strategy: given a dataset and a query, finds a
/// subset-minimal entailing subset, or reports that none exists.
pub trait KernelStrategy {
    /// Returns `Ok(Some(kernel))` with `kernel ⊆ b`, `kernel ⊨ alpha`, and
    /// `kernel` subset-minimal for that property; `Ok(None)` if
    /// `b ⊭ alpha`.
    fn find_kernel(
        &self,
        oracle: &dyn EntailmentOracle,
        b: &Dataset,
        alpha: &Formula,
    ) -> Result<Option<Dataset>, KernelError>;
}

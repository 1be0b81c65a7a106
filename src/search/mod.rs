//! Search strategies (C5, §4.5) that drive a [`HsTree`](crate::tree::HsTree)
//! to completion.

mod enumeration;
mod hybrid;

pub use enumeration::Enumeration;
pub use hybrid::Hybrid;

use std::time::Instant;

use crate::error::SearchError;
use crate::formula::Formula;
use crate::kernel::KernelStrategy;
use crate::oracle::EntailmentOracle;
use crate::tree::HsTree;

/// Drives an already-constructed, empty-but-for-its-root [`HsTree`] to
/// completion: materialises kernels, attaches children, and records
/// leaves/pruned nodes.
pub trait SearchStrategy {
    fn run(
        &self,
        oracle: &dyn EntailmentOracle,
        kernel_strategy: &dyn KernelStrategy,
        tree: &mut HsTree,
        alpha: &Formula,
        deadline: Option<Instant>,
    ) -> Result<(), SearchError>;
}

/// Checked at every oracle-call boundary (§4.5.2, §5): the only suspension
/// point, so this is the only place a deadline can realistically bite.
fn check_deadline(deadline: Option<Instant>) -> Result<(), SearchError> {
    match deadline {
        Some(d) if Instant::now() >= d => Err(SearchError::Timeout),
        _ => Ok(()),
    }
}

//! Expand–shrink kernel extraction (§4.3.1).

use crate::dataset::Dataset;
use crate::error::KernelError;
use crate::formula::Formula;
use crate::oracle::EntailmentOracle;

use super::{KernelStrategy, ITERATION_SLACK};

/// Expand in fixed-size windows until entailment first holds, then shrink
/// to a subset-minimal kernel.
pub struct ExpandShrink {
    pub window_size: usize,
    pub divide_and_conquer: bool,
}

impl ExpandShrink {
    #[must_use]
    pub fn new(window_size: usize, divide_and_conquer: bool) -> Self {
        ExpandShrink {
            window_size: window_size.max(1),
            divide_and_conquer,
        }
    }

    fn expand(
        &self,
        oracle: &dyn EntailmentOracle,
        b: &Dataset,
        alpha: &Formula,
    ) -> Result<Option<Dataset>, KernelError> {
        let elements = b.elements();
        let mut accumulated: Vec<Formula> = Vec::new();
        let mut i = 0usize;
        while i < elements.len() {
            let end = (i + self.window_size).min(elements.len());
            accumulated.extend_from_slice(&elements[i..end]);
            if oracle.entails(&accumulated, alpha)? {
                return Ok(Some(Dataset::from_elements(accumulated)));
            }
            i = end;
        }
        // No window ever entailed alpha: B itself does not entail it.
        Ok(None)
    }

    fn shrink_linear(
        &self,
        oracle: &dyn EntailmentOracle,
        mut b_prime: Dataset,
        alpha: &Formula,
    ) -> Result<Dataset, KernelError> {
        let bound = b_prime.len() + ITERATION_SLACK;
        let initial_size = b_prime.len();
        let mut i = 0usize;
        let mut iterations = 0usize;
        while i < b_prime.len() {
            if iterations > bound {
                return Err(KernelError::IterationBoundExceeded {
                    bound,
                    size: initial_size,
                });
            }
            iterations += 1;
            let e = b_prime.elements()[i].clone();
            let mut candidate = b_prime.deep_clone();
            candidate.remove(&e);
            if oracle.entails(candidate.elements(), alpha)? {
                b_prime = candidate;
            } else {
                i += 1;
            }
        }
        Ok(b_prime)
    }

    fn shrink_divide_and_conquer(
        &self,
        oracle: &dyn EntailmentOracle,
        b_prime: Dataset,
        alpha: &Formula,
    ) -> Result<Dataset, KernelError> {
        if b_prime.len() <= 1 {
            return if oracle.entails(b_prime.elements(), alpha)? {
                Ok(b_prime)
            } else {
                Ok(Dataset::new())
            };
        }
        let (h1, h2) = b_prime.split();
        if oracle.entails(h1.elements(), alpha)? {
            return self.shrink_divide_and_conquer(oracle, h1, alpha);
        }
        if oracle.entails(h2.elements(), alpha)? {
            return self.shrink_divide_and_conquer(oracle, h2, alpha);
        }
        self.shrink_linear(oracle, b_prime, alpha)
    }
}

impl KernelStrategy for ExpandShrink {
    fn find_kernel(
        &self,
        oracle: &dyn EntailmentOracle,
        b: &Dataset,
        alpha: &Formula,
    ) -> Result<Option<Dataset>, KernelError> {
        let Some(expanded) = self.expand(oracle, b, alpha)? else {
            return Ok(None);
        };
        let shrunk = if self.divide_and_conquer {
            self.shrink_divide_and_conquer(oracle, expanded, alpha)?
        } else {
            self.shrink_linear(oracle, expanded, alpha)?
        };
        Ok(Some(shrunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::shared_test_support::dataset_of;
    use crate::testing::TruthTableOracle;

    fn f(s: &str) -> Formula {
        Formula::parse(s).unwrap()
    }

    #[test]
    fn empty_dataset_never_entails() {
        let strategy = ExpandShrink::new(1, false);
        let oracle = TruthTableOracle;
        let b = Dataset::new();
        let result = strategy.find_kernel(&oracle, &b, &f("A")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn tautology_yields_empty_kernel() {
        let strategy = ExpandShrink::new(1, false);
        let oracle = TruthTableOracle;
        let b = dataset_of(&["A"]);
        let result = strategy
            .find_kernel(&oracle, &b, &f("B || !B"))
            .unwrap()
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn shrink_removes_superfluous_elements() {
        let strategy = ExpandShrink::new(1, false);
        let oracle = TruthTableOracle;
        let b = dataset_of(&["A", "A => B", "C"]);
        let kernel = strategy
            .find_kernel(&oracle, &b, &f("B"))
            .unwrap()
            .unwrap();
        assert_eq!(kernel.elements(), &[f("A"), f("A => B")]);
    }

    #[test]
    fn window_size_does_not_change_the_kernel() {
        let oracle = TruthTableOracle;
        let b = dataset_of(&["A", "A => B", "C", "D"]);
        let k1 = ExpandShrink::new(1, false)
            .find_kernel(&oracle, &b, &f("B"))
            .unwrap()
            .unwrap();
        let k4 = ExpandShrink::new(4, false)
            .find_kernel(&oracle, &b, &f("B"))
            .unwrap()
            .unwrap();
        let mut e1 = k1.elements().to_vec();
        let mut e4 = k4.elements().to_vec();
        e1.sort_by_key(|f| f.to_string());
        e4.sort_by_key(|f| f.to_string());
        assert_eq!(e1, e4);
    }

    #[test]
    fn divide_and_conquer_shrink_matches_linear_shrink() {
        let oracle = TruthTableOracle;
        let b = dataset_of(&["A", "A => B", "C", "D"]);
        let linear = ExpandShrink::new(4, false)
            .find_kernel(&oracle, &b, &f("B"))
            .unwrap()
            .unwrap();
        let dc = ExpandShrink::new(4, true)
            .find_kernel(&oracle, &b, &f("B"))
            .unwrap()
            .unwrap();
        let mut e1 = linear.elements().to_vec();
        let mut e2 = dc.elements().to_vec();
        e1.sort_by_key(|f| f.to_string());
        e2.sort_by_key(|f| f.to_string());
        assert_eq!(e1, e2);
    }
}

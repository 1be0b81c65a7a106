//! Cost assignment (C6, §4.6): attaches a nonnegative weight to every
//! element of a [`Dataset`].

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::Dataset;
use crate::error::CostError;
use crate::store::RecordStore;

/// The three cost-assignment strategies keyed by the CLI's
/// `strategy_param` (§4.6, §4.7): 1 = fixed, 2 = unique random,
/// 3 = inconsistency-derived. Strategy 0 (plain enumeration) assigns no
/// costs at all, since plain enumeration never consults them.
#[derive(Debug, Clone)]
pub enum CostStrategy {
    Fixed(f64),
    UniqueRandom { seed: u64 },
    Inconsistency,
}

/// Computes the inconsistency measure `I(B)` for a dataset, per the `im`
/// external tool contract of §6.
pub trait InconsistencyOracle {
    fn measure(&self, dataset: &Dataset, mode: &str) -> Result<u64, CostError>;
}

/// Shells out to `im <file> <mode>` and parses the `o <n>` output line,
/// per §6.
pub struct SubprocessInconsistencyOracle {
    im_path: PathBuf,
}

impl SubprocessInconsistencyOracle {
    #[must_use]
    pub fn new(im_path: impl Into<PathBuf>) -> Self {
        SubprocessInconsistencyOracle {
            im_path: im_path.into(),
        }
    }
}

impl InconsistencyOracle for SubprocessInconsistencyOracle {
    fn measure(&self, dataset: &Dataset, mode: &str) -> Result<u64, CostError> {
        let mut scratch = tempfile::Builder::new()
            .prefix("hskernel-im-")
            .suffix(".txt")
            .tempfile()
            .map_err(CostError::Inconsistency)?;
        for e in dataset.elements() {
            writeln!(scratch, "{e}").map_err(CostError::Inconsistency)?;
        }
        scratch.flush().map_err(CostError::Inconsistency)?;

        let output = Command::new(&self.im_path)
            .arg(scratch.path())
            .arg(mode)
            .output()
            .map_err(CostError::Inconsistency)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_measure_line(&stdout).ok_or(CostError::UnparseableMeasure)
    }
}

fn parse_measure_line(stdout: &str) -> Option<u64> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("o "))
        .and_then(|rest| rest.trim().parse().ok())
}

/// Assigns costs to every element of `dataset` in place, per `strategy`.
///
/// For [`CostStrategy::Inconsistency`], values are read lazily from
/// `store` rather than recomputed (§4.6); when `store` has no annotation
/// for an element and `fallback` is given, the fallback oracle computes
/// `I(B) - I(B \ {e})` directly, mirroring the reference protocol's own
/// computation path.
pub fn assign(
    dataset: &mut Dataset,
    strategy: &CostStrategy,
    store: Option<(&dyn RecordStore, &str)>,
    fallback: Option<&dyn InconsistencyOracle>,
) -> Result<(), CostError> {
    match strategy {
        CostStrategy::Fixed(value) => {
            let elements: Vec<_> = dataset.elements().to_vec();
            for e in elements {
                dataset.set_cost(e, Some(*value));
            }
        }
        CostStrategy::UniqueRandom { seed } => {
            let n = dataset.len();
            let mut permutation: Vec<f64> = (1..=n as u64).map(|v| v as f64).collect();
            let mut rng = rand::rngs::StdRng::seed_from_u64(*seed);
            permutation.shuffle(&mut rng);
            let elements: Vec<_> = dataset.elements().to_vec();
            for (e, cost) in elements.into_iter().zip(permutation) {
                dataset.set_cost(e, Some(cost));
            }
        }
        CostStrategy::Inconsistency => {
            assign_inconsistency(dataset, store, fallback)?;
        }
    }
    Ok(())
}

fn assign_inconsistency(
    dataset: &mut Dataset,
    store: Option<(&dyn RecordStore, &str)>,
    fallback: Option<&dyn InconsistencyOracle>,
) -> Result<(), CostError> {
    if let Some((store, filename)) = store {
        if let Ok(rows) = store.annotations_for(filename) {
            let by_line: std::collections::HashMap<&str, Option<f64>> = rows
                .iter()
                .map(|r| (r.line.as_str(), r.inconsistency_cost))
                .collect();
            let elements: Vec<_> = dataset.elements().to_vec();
            let mut all_found = true;
            for e in &elements {
                match by_line.get(e.as_str()) {
                    Some(cost) => dataset.set_cost(e.clone(), *cost),
                    None => all_found = false,
                }
            }
            if all_found {
                return Ok(());
            }
        }
    }

    let Some(oracle) = fallback else {
        return Err(CostError::NoInconsistencySource);
    };
    let baseline = oracle.measure(dataset, "h")?;
    let elements: Vec<_> = dataset.elements().to_vec();
    for e in &elements {
        let mut reduced = dataset.deep_clone();
        reduced.remove(e);
        let reduced_measure = oracle.measure(&reduced, "h")?;
        let diff = baseline as i64 - reduced_measure as i64;
        dataset.set_cost(e.clone(), Some(diff.max(0) as f64));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Formula;

    fn dataset_of(names: &[&str]) -> Dataset {
        let mut ds = Dataset::new();
        for n in names {
            ds.add(Formula::parse(*n).unwrap());
        }
        ds
    }

    #[test]
    fn fixed_strategy_assigns_the_same_value_everywhere() {
        let mut ds = dataset_of(&["A", "B", "C"]);
        assign(&mut ds, &CostStrategy::Fixed(1.0), None, None).unwrap();
        for e in ds.elements().to_vec() {
            assert_eq!(ds.cost(&e), Some(1.0));
        }
    }

    #[test]
    fn unique_random_is_a_permutation_of_one_to_n() {
        let mut ds = dataset_of(&["A", "B", "C", "D"]);
        assign(
            &mut ds,
            &CostStrategy::UniqueRandom { seed: 42 },
            None,
            None,
        )
        .unwrap();
        let mut costs: Vec<f64> = ds.elements().iter().map(|e| ds.cost(e).unwrap()).collect();
        costs.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(costs, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn unique_random_is_deterministic_given_a_seed() {
        let mut a = dataset_of(&["A", "B", "C", "D"]);
        let mut b = dataset_of(&["A", "B", "C", "D"]);
        assign(&mut a, &CostStrategy::UniqueRandom { seed: 7 }, None, None).unwrap();
        assign(&mut b, &CostStrategy::UniqueRandom { seed: 7 }, None, None).unwrap();
        let costs_a: Vec<_> = a.elements().iter().map(|e| a.cost(e)).collect();
        let costs_b: Vec<_> = b.elements().iter().map(|e| b.cost(e)).collect();
        assert_eq!(costs_a, costs_b);
    }

    #[test]
    fn inconsistency_without_store_or_fallback_is_an_error() {
        let mut ds = dataset_of(&["A"]);
        let result = assign(&mut ds, &CostStrategy::Inconsistency, None, None);
        assert!(matches!(result, Err(CostError::NoInconsistencySource)));
    }

    #[test]
    fn parse_measure_line_reads_the_o_prefixed_line() {
        let stdout = "c comment\no 5\n";
        assert_eq!(parse_measure_line(stdout), Some(5));
    }
}

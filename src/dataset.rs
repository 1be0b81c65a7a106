//! The dataset abstraction (C2, §4.2): an ordered, duplicate-free sequence
//! of formulas with a `formula -> cost` side table.

use std::io::{BufRead, Write};
use std::path::Path;

use fnv::{FnvHashMap, FnvHashSet};
use log::warn;

use crate::error::DatasetError;
use crate::formula::Formula;
use crate::store::{Annotation, RecordStore};

/// An ordered, duplicate-free collection of [`Formula`]s plus a
/// `formula -> cost` mapping (§3).
///
/// `cost = None` means "unassigned" (`⊥` in the spec); search code treats
/// a missing or zero cost as contributing 0 to path cost (§4.5).
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    elements: Vec<Formula>,
    present: FnvHashSet<Formula>,
    costs: FnvHashMap<Formula, Option<f64>>,
}

impl Dataset {
    #[must_use]
    pub fn new() -> Self {
        Dataset::default()
    }

    /// Builds a dataset from a list of elements, in order, dropping any
    /// later duplicates (the container "rejects inserts of existing
    /// elements", §3).
    #[must_use]
    pub fn from_elements(elements: Vec<Formula>) -> Self {
        let mut ds = Dataset::new();
        for e in elements {
            ds.add(e);
        }
        ds
    }

    /// Loads a dataset from a line-per-formula file, filtering blank lines
    /// and preserving insertion order (§4.2 `load`).
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DatasetError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                DatasetError::Io(e)
            }
        })?;
        let reader = std::io::BufReader::new(file);
        let mut ds = Dataset::new();
        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match Formula::parse(trimmed) {
                Ok(f) => ds.add(f),
                Err(e) => warn!("skipping unparseable line {trimmed:?}: {e}"),
            }
        }
        Ok(ds)
    }

    /// Loads a dataset from a [`RecordStore`]'s annotation rows for
    /// `filename`, seeding cost values from `random_cost`/
    /// `inconsistency_cost` per `strategy_param` (§4.2, §6).
    pub fn load_from_store(
        store: &dyn RecordStore,
        filename: &str,
        strategy_param: u8,
    ) -> Result<Self, DatasetError> {
        let rows = store.annotations_for(filename)?;
        let mut ds = Dataset::new();
        for row in rows {
            if row.line.trim().is_empty() {
                continue;
            }
            let Annotation {
                line,
                random_cost,
                inconsistency_cost,
                ..
            } = row;
            match Formula::parse(&line) {
                Ok(f) => {
                    let cost = match strategy_param {
                        2 => random_cost,
                        3 => inconsistency_cost,
                        _ => None,
                    };
                    ds.add(f.clone());
                    ds.costs.insert(f, cost);
                }
                Err(e) => warn!("skipping unparseable stored line {line:?}: {e}"),
            }
        }
        Ok(ds)
    }

    /// Appends `element` if absent; no-op if already present.
    pub fn add(&mut self, element: Formula) {
        if self.present.insert(element.clone()) {
            self.elements.push(element);
        }
    }

    /// Prepends `element` if absent; no-op if already present.
    pub fn add_at_start(&mut self, element: Formula) {
        if self.present.insert(element.clone()) {
            self.elements.insert(0, element);
        }
    }

    /// Removes `element` if present; logs a warning and no-ops if absent
    /// (§3, §7 "dataset inconsistency").
    pub fn remove(&mut self, element: &Formula) {
        if self.present.remove(element) {
            self.elements.retain(|e| e != element);
        } else {
            warn!("attempted to remove absent element {element}");
        }
    }

    #[must_use]
    pub fn contains(&self, element: &Formula) -> bool {
        self.present.contains(element)
    }

    #[must_use]
    pub fn elements(&self) -> &[Formula] {
        &self.elements
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// An independent deep copy sharing no aliasable state (§3, §4.2).
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        self.clone()
    }

    /// Splits into (prefix of `floor(n/2)`, suffix of the rest), §3.
    #[must_use]
    pub fn split(&self) -> (Dataset, Dataset) {
        let mid = self.elements.len() / 2;
        let first = Dataset::from_elements(self.elements[..mid].to_vec());
        let second = Dataset::from_elements(self.elements[mid..].to_vec());
        (first, second)
    }

    /// Returns a new dataset containing the set union of `self` and
    /// `other`. Insertion order is unspecified (§4.2): elements of `self`
    /// come first in their own order, followed by any elements unique to
    /// `other`, in `other`'s order. Consumers must not depend on this
    /// exact order, only on the resulting *set*.
    #[must_use]
    pub fn combine(&self, other: &Dataset) -> Dataset {
        let mut combined = self.clone();
        for e in &other.elements {
            combined.add(e.clone());
        }
        combined
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        for e in &self.elements {
            writeln!(file, "{e}")?;
        }
        Ok(())
    }

    /// The assigned cost for `element`, or `None` if unassigned.
    #[must_use]
    pub fn cost(&self, element: &Formula) -> Option<f64> {
        self.costs.get(element).copied().flatten()
    }

    pub fn set_cost(&mut self, element: Formula, cost: Option<f64>) {
        self.costs.insert(element, cost);
    }

    #[must_use]
    pub fn costs(&self) -> impl Iterator<Item = (&Formula, Option<f64>)> {
        self.elements
            .iter()
            .map(move |e| (e, self.costs.get(e).copied().flatten()))
    }
}

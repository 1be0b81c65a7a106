//! Error types, one `thiserror` enum per component, aggregated into
//! [`FacadeError`] at the boundary the CLI speaks to.

use std::path::PathBuf;

use thiserror::Error;

/// Failures from the entailment oracle (C1).
///
/// An indeterminate solver outcome is *not* represented here: callers are
/// expected to treat it as "not entailed" and log a warning (§7), so it
/// never becomes an `Err`. This enum only covers failures that prevent the
/// oracle from producing any verdict at all.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("failed to spawn solver at {path:?}: {source}")]
    SpawnFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write CNF scratch file: {0}")]
    ScratchFile(#[source] std::io::Error),
    #[error("formula could not be parsed: {0}")]
    Formula(#[from] crate::formula::FormulaError),
}

/// Failures from [`crate::dataset::Dataset`] operations that are fatal
/// rather than a warn-and-continue case.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset file {path:?} not found")]
    FileNotFound { path: PathBuf },
    #[error("I/O error reading/writing dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("record store error: {0}")]
    Store(#[from] StoreError),
}

/// Failures from kernel extraction (C3).
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("oracle call failed: {0}")]
    Oracle(#[from] OracleError),
    #[error("expand-shrink exceeded its iteration bound ({bound}) on a dataset of size {size}; the oracle is likely unsound or unstable")]
    IterationBoundExceeded { bound: usize, size: usize },
}

/// Failures from the search strategies (C5).
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("kernel extraction failed: {0}")]
    Kernel(#[from] KernelError),
    #[error("search exceeded its deadline")]
    Timeout,
}

/// Failures from the record store collaborator (C9).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error accessing record store at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("record store at {path:?} is not valid JSON: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no dataset file named {0:?} in the record store")]
    UnknownDataset(String),
}

/// Failures from cost assignment (C6).
#[derive(Debug, Error)]
pub enum CostError {
    #[error("inconsistency oracle failed: {0}")]
    Inconsistency(#[source] std::io::Error),
    #[error("inconsistency oracle produced no parseable 'o <n>' line")]
    UnparseableMeasure,
    #[error("record store error: {0}")]
    Store(#[from] StoreError),
    #[error("strategy 3 (inconsistency) requires either a record store or a computed fallback, and neither was configured")]
    NoInconsistencySource,
}

/// Configuration validation failures (§7, "fatal at startup, exit 1").
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("window size must be in [1, {max}], got {got}")]
    WindowSizeOutOfRange { got: usize, max: usize },
    #[error("strategy parameter must be one of 0, 1, 2, 3, got {0}")]
    InvalidStrategyParam(u8),
    #[error("exactly one of --kernel/--remainder must be selected")]
    MethodNotSelected,
    #[error("dataset {0:?} could not be loaded: {1}")]
    DatasetLoad(String, #[source] DatasetError),
}

/// Top-level error the façade (C7) and CLI (C10) speak in.
#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),
    #[error("cost assignment error: {0}")]
    Cost(#[from] CostError),
    #[error("search error: {0}")]
    Search(#[from] SearchError),
    #[error("record store error: {0}")]
    Store(#[from] StoreError),
    #[error("search exceeded its deadline of {0:?}")]
    Timeout(std::time::Duration),
}

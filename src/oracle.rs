//! The entailment oracle (C1, §4.1): `entails(B, alpha) -> bool`.
//!
//! The production implementation shells out to an external CNF solver per
//! the reference protocol; see [`crate::testing::TruthTableOracle`] for the
//! in-process test double used everywhere else in this crate's own test
//! suite.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::warn;

use crate::error::OracleError;
use crate::formula::Formula;
use crate::tseitin::encode_conjunction;

/// Decides classical entailment `B |= alpha` for a propositional knowledge
/// base `B` and query `alpha`.
///
/// Implementations must be sound: when they return `Ok(true)`, `B` really
/// does entail `alpha`. They are permitted to under-approximate (return
/// `Ok(false)` for an indeterminate outcome) per §7's conservative failure
/// policy, but must never over-approximate.
pub trait EntailmentOracle {
    fn entails(&self, b: &[Formula], alpha: &Formula) -> Result<bool, OracleError>;
}

/// The reference oracle: spawns an external SAT solver binary per call.
///
/// Protocol (§4.1): form `B' = B ++ [!(alpha)]`, Tseitin-encode `B'` to a
/// scoped temporary DIMACS file, invoke `solver <path>`, and read the final
/// line of stdout. `UNSAT` means `B |= alpha`; `SAT` means it does not; any
/// other outcome is indeterminate and is logged and treated as `false`
/// (§7).
pub struct SubprocessOracle {
    solver_path: PathBuf,
}

impl SubprocessOracle {
    #[must_use]
    pub fn new(solver_path: impl Into<PathBuf>) -> Self {
        SubprocessOracle {
            solver_path: solver_path.into(),
        }
    }
}

impl EntailmentOracle for SubprocessOracle {
    fn entails(&self, b: &[Formula], alpha: &Formula) -> Result<bool, OracleError> {
        let mut b_prime: Vec<Formula> = Vec::with_capacity(b.len() + 1);
        b_prime.extend_from_slice(b);
        b_prime.push(alpha.negate());

        let cnf = encode_conjunction(&b_prime)?;

        let mut scratch = tempfile::Builder::new()
            .prefix("hskernel-")
            .suffix(".cnf")
            .tempfile()
            .map_err(OracleError::ScratchFile)?;
        scratch
            .write_all(cnf.to_dimacs().as_bytes())
            .map_err(OracleError::ScratchFile)?;
        scratch.flush().map_err(OracleError::ScratchFile)?;

        Ok(run_solver(&self.solver_path, scratch.path())?)
    }
}

fn run_solver(solver_path: &Path, cnf_path: &Path) -> Result<bool, OracleError> {
    let output = Command::new(solver_path)
        .arg(cnf_path)
        .output()
        .map_err(|source| OracleError::SpawnFailed {
            path: solver_path.to_path_buf(),
            source,
        })?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let last_line = stdout.lines().rev().find(|l| !l.trim().is_empty());
    match last_line {
        Some(line) if line.contains("UNSAT") => Ok(true),
        Some(line) if line.contains("SAT") => Ok(false),
        Some(line) => {
            warn!("solver produced an indeterminate result line {line:?}; treating as not entailed");
            Ok(false)
        }
        None => {
            warn!("solver produced no output; treating as not entailed");
            Ok(false)
        }
    }
}

//! Test doubles shared across this crate's own test suite (§4.1
//! `[SUPPLEMENT]`, §10.6).

use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::OracleError;
use crate::formula::{Expr, Formula};
use crate::oracle::EntailmentOracle;

/// Decides entailment by brute-force truth-table enumeration over the
/// atoms appearing in `B ∪ {α}`.
///
/// Exists purely to exercise the kernel/search/tree logic deterministically
/// without a solver binary on `PATH`. Never reached from the façade's
/// default wiring.
#[derive(Default)]
pub struct TruthTableOracle;

impl EntailmentOracle for TruthTableOracle {
    fn entails(&self, b: &[Formula], alpha: &Formula) -> Result<bool, OracleError> {
        let mut asts = Vec::with_capacity(b.len() + 1);
        for f in b {
            asts.push(f.ast()?);
        }
        let alpha_ast = alpha.ast()?;

        let mut atoms = BTreeSet::new();
        for a in &asts {
            collect_atoms(a, &mut atoms);
        }
        collect_atoms(&alpha_ast, &mut atoms);
        let atoms: Vec<String> = atoms.into_iter().collect();

        // Vacuous B: entailment holds iff alpha is a tautology.
        let n = atoms.len();
        for mask in 0..(1u64 << n) {
            let assignment: std::collections::HashMap<&str, bool> = atoms
                .iter()
                .enumerate()
                .map(|(i, name)| (name.as_str(), mask & (1 << i) != 0))
                .collect();
            let b_holds = asts.iter().all(|a| eval(a, &assignment));
            if b_holds && !eval(&alpha_ast, &assignment) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// A [`TruthTableOracle`] that sleeps before deciding, so tests can exercise
/// a deadline expiring mid-search without depending on a real external
/// solver being slow (§10.6, S6).
pub struct SlowOracle {
    delay: Duration,
    inner: TruthTableOracle,
}

impl SlowOracle {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        SlowOracle {
            delay,
            inner: TruthTableOracle,
        }
    }
}

impl EntailmentOracle for SlowOracle {
    fn entails(&self, b: &[Formula], alpha: &Formula) -> Result<bool, OracleError> {
        std::thread::sleep(self.delay);
        self.inner.entails(b, alpha)
    }
}

fn collect_atoms(expr: &Expr, out: &mut BTreeSet<String>) {
    match expr {
        Expr::True | Expr::False => {}
        Expr::Var(name) => {
            out.insert(name.clone());
        }
        Expr::Not(a) => collect_atoms(a, out),
        Expr::And(a, b) | Expr::Or(a, b) | Expr::Implies(a, b) | Expr::Iff(a, b) | Expr::Xor(a, b) => {
            collect_atoms(a, out);
            collect_atoms(b, out);
        }
    }
}

fn eval(expr: &Expr, assignment: &std::collections::HashMap<&str, bool>) -> bool {
    match expr {
        Expr::True => true,
        Expr::False => false,
        Expr::Var(name) => *assignment.get(name.as_str()).unwrap_or(&false),
        Expr::Not(a) => !eval(a, assignment),
        Expr::And(a, b) => eval(a, assignment) && eval(b, assignment),
        Expr::Or(a, b) => eval(a, assignment) || eval(b, assignment),
        Expr::Implies(a, b) => !eval(a, assignment) || eval(b, assignment),
        Expr::Iff(a, b) => eval(a, assignment) == eval(b, assignment),
        Expr::Xor(a, b) => eval(a, assignment) != eval(b, assignment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(s: &str) -> Formula {
        Formula::parse(s).unwrap()
    }

    #[test]
    fn empty_dataset_entails_only_tautologies() {
        let oracle = TruthTableOracle;
        assert!(oracle.entails(&[], &f("A || !A")).unwrap());
        assert!(!oracle.entails(&[], &f("A")).unwrap());
    }

    #[test]
    fn modus_ponens_entails() {
        let oracle = TruthTableOracle;
        let b = vec![f("A"), f("A => B")];
        assert!(oracle.entails(&b, &f("B")).unwrap());
    }

    #[test]
    fn unrelated_premises_do_not_entail() {
        let oracle = TruthTableOracle;
        let b = vec![f("A")];
        assert!(!oracle.entails(&b, &f("B")).unwrap());
    }

    #[test]
    fn contradictory_premises_entail_anything() {
        let oracle = TruthTableOracle;
        let b = vec![f("A"), f("!A")];
        assert!(oracle.entails(&b, &f("B")).unwrap());
    }
}

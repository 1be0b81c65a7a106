//! Tseitin transformation of a [`formula::Expr`] tree into DIMACS CNF
//! (§4.8, §6).
//!
//! One fresh variable is introduced per AST node; the standard
//! equivalence clauses are emitted for each operator, and the root
//! variable is asserted true with a unit clause.

use std::collections::HashMap;

use crate::formula::{Expr, Formula, FormulaError};

/// A CNF instance in the DIMACS sense: a variable count and a list of
/// clauses, each clause a list of non-zero signed literals.
#[derive(Debug, Clone, Default)]
pub struct Cnf {
    pub num_vars: u32,
    pub clauses: Vec<Vec<i64>>,
}

impl Cnf {
    pub fn to_dimacs(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("p cnf {} {}\n", self.num_vars, self.clauses.len()));
        for clause in &self.clauses {
            for lit in clause {
                out.push_str(&lit.to_string());
                out.push(' ');
            }
            out.push_str("0\n");
        }
        out
    }
}

struct Encoder {
    next_var: u32,
    clauses: Vec<Vec<i64>>,
}

impl Encoder {
    fn new() -> Self {
        Encoder {
            next_var: 1,
            clauses: Vec::new(),
        }
    }

    fn fresh(&mut self) -> u32 {
        let v = self.next_var;
        self.next_var += 1;
        v
    }

    /// Encodes `expr`, returning the literal (variable, possibly negated)
    /// that is true iff `expr` is true. Constants are folded directly into
    /// `+var`/`-var` against a single always-true helper variable so that
    /// the returned value is always a plain variable id with an implicit
    /// positive polarity at the call site; callers apply polarity when they
    /// need the negation.
    fn encode(&mut self, expr: &Expr, vars: &mut HashMap<String, u32>) -> i64 {
        match expr {
            Expr::True => {
                let v = self.fresh() as i64;
                self.clauses.push(vec![v]);
                v
            }
            Expr::False => {
                let v = self.fresh() as i64;
                self.clauses.push(vec![-v]);
                v
            }
            Expr::Var(name) => {
                let v = *vars.entry(name.clone()).or_insert_with(|| self.fresh());
                v as i64
            }
            Expr::Not(inner) => {
                let a = self.encode(inner, vars);
                let v = self.fresh() as i64;
                // v <=> !a
                self.clauses.push(vec![-v, -a]);
                self.clauses.push(vec![v, a]);
                v
            }
            Expr::And(l, r) => {
                let a = self.encode(l, vars);
                let b = self.encode(r, vars);
                let v = self.fresh() as i64;
                // v <=> (a && b)
                self.clauses.push(vec![-v, a]);
                self.clauses.push(vec![-v, b]);
                self.clauses.push(vec![v, -a, -b]);
                v
            }
            Expr::Or(l, r) => {
                let a = self.encode(l, vars);
                let b = self.encode(r, vars);
                let v = self.fresh() as i64;
                // v <=> (a || b)
                self.clauses.push(vec![v, -a]);
                self.clauses.push(vec![v, -b]);
                self.clauses.push(vec![-v, a, b]);
                v
            }
            Expr::Implies(l, r) => {
                let a = self.encode(l, vars);
                let b = self.encode(r, vars);
                let v = self.fresh() as i64;
                // v <=> (!a || b)
                self.clauses.push(vec![v, a]);
                self.clauses.push(vec![v, -b]);
                self.clauses.push(vec![-v, -a, b]);
                v
            }
            Expr::Iff(l, r) => {
                let a = self.encode(l, vars);
                let b = self.encode(r, vars);
                let v = self.fresh() as i64;
                // v <=> (a <=> b)
                self.clauses.push(vec![-v, -a, b]);
                self.clauses.push(vec![-v, a, -b]);
                self.clauses.push(vec![v, a, b]);
                self.clauses.push(vec![v, -a, -b]);
                v
            }
            Expr::Xor(l, r) => {
                let a = self.encode(l, vars);
                let b = self.encode(r, vars);
                let v = self.fresh() as i64;
                // v <=> (a xor b)
                self.clauses.push(vec![-v, a, b]);
                self.clauses.push(vec![-v, -a, -b]);
                self.clauses.push(vec![v, -a, b]);
                self.clauses.push(vec![v, a, -b]);
                v
            }
        }
    }
}

/// Encodes the conjunction of `formulas` into a single satisfiability
/// instance: each formula's root literal is asserted true via a unit
/// clause, and the whole conjunction is satisfiable iff the formula set is
/// jointly satisfiable.
pub fn encode_conjunction(formulas: &[Formula]) -> Result<Cnf, FormulaError> {
    let mut encoder = Encoder::new();
    let mut vars = HashMap::new();
    for f in formulas {
        let root = encoder.encode(&f.ast()?, &mut vars);
        encoder.clauses.push(vec![root]);
    }
    Ok(Cnf {
        num_vars: encoder.next_var.saturating_sub(1),
        clauses: encoder.clauses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_contradiction_to_unsatisfiable_clauses() {
        let a = Formula::parse("A0").unwrap();
        let not_a = Formula::parse("!A0").unwrap();
        let cnf = encode_conjunction(&[a, not_a]).unwrap();
        assert!(cnf.num_vars >= 2);
        assert!(!cnf.clauses.is_empty());
        let dimacs = cnf.to_dimacs();
        assert!(dimacs.starts_with("p cnf"));
    }

    #[test]
    fn single_var_formula_has_one_unit_clause_tail() {
        let f = Formula::parse("A0").unwrap();
        let cnf = encode_conjunction(std::slice::from_ref(&f)).unwrap();
        assert_eq!(cnf.clauses.last(), Some(&vec![1]));
    }
}

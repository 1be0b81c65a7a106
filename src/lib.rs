//! Kernel extraction and branch-and-bound hitting-set tree search over a
//! propositional knowledge base.
//!
//! See `SPEC_FULL.md` for the full component breakdown; in short, [`facade`]
//! binds a [`dataset::Dataset`] and a query [`formula::Formula`] to a
//! [`kernel`] strategy and a [`search`] strategy and drives a
//! [`tree::HsTree`] to completion.

pub mod cost;
pub mod dataset;
pub mod error;
pub mod facade;
pub mod formula;
pub mod kernel;
pub mod oracle;
pub mod search;
pub mod store;
pub mod testing;
pub mod tree;
pub mod tseitin;

//! `symbolic-verify-core` — the symbolic verification engine of a
//! NuSMV-style model checker: reachability, fairness, and predicate
//! extraction over a BDD-backed finite state machine, plus the incremental
//! SAT-solving façade bounded-model-checking drivers sit on top of.
//!
//! This crate is the *core* only (see `DESIGN.md`): parsing, flattening,
//! the command shell, configuration, and concrete SAT back-ends are external
//! collaborators. What's here takes an already-encoded model — init states,
//! invariants, a transition relation, fairness constraints, all as
//! [`biodivine_lib_bdd::Bdd`]s over a declared symbol table — and answers
//! reachability, CTL/LTL-flavoured fairness, and predicate-extraction
//! questions about it.
//!
//! Module map, leaves first (mirrors §2's component table):
//! - [`expr`], [`containers`] — the interned expression DAG and the
//!   `Set`/`NodeList` containers built on top of it.
//! - [`symbol_table`], [`base_enc`], [`bool_enc`] — name resolution, layer
//!   lifecycle, and the scalar/word-to-boolean encoding.
//! - [`predicates`] — the predicate extractor and its variable clusters.
//! - [`bdd_handle`], [`fairness`] — refcounted BDD handles and the
//!   justice/compassion fairness lists.
//! - [`fsm`] — `BddFsm`, the hub: image operators, reachability, deadlock,
//!   fair states, synchronous product.
//! - [`sat`] — the SAT solver trait family and the in-crate reference
//!   back-end.
//! - [`simulator`] — the interactive step-by-step simulator core.
//! - [`diagnostics`], [`error`] — the ambient logging and error-taxonomy
//!   modules every other module reports through.

pub mod base_enc;
pub mod bdd_handle;
pub mod bool_enc;
pub mod containers;
pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod fairness;
pub mod fsm;
pub mod predicates;
pub mod sat;
pub mod simulator;
pub mod symbol_table;

pub use bdd_handle::{BddHandle, BddManager, States, StateInputs, StateInputsNext};
pub use diagnostics::Diagnostics;
pub use error::CoreError;
pub use fairness::{CompassionList, JusticeList};
pub use fsm::{BddFsm, BddTrans};
pub use predicates::{PredicateExtractor, Preds};
pub use sat::{NaiveSatSolver, SatOutcome, SatSolver, SupportsConflicts, SupportsInterpolation};
pub use simulator::{NextStateChoice, PickMode, Simulator};

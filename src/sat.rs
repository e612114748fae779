//! §4.H — the incremental SAT solver abstraction used by bounded-model-checking
//! drivers.
//!
//! This module specifies the *contract* a SAT back-end must satisfy (group
//! management, assumption-based solving, model/conflict extraction,
//! interpolation) as the [`SatSolver`] trait plus two optional extension
//! traits, matching the design notes' "virtual dispatch for SAT back-ends ...
//! rewrite as a trait/interface with concrete implementations per backend;
//! incremental-solver capability is an optional extension trait." Concrete
//! production back-ends (ZChaff, MiniSat) are out of scope (§1); the crate
//! ships one reference/testing implementation, [`NaiveSatSolver`], a small
//! DPLL-style backtracking solver, so the façade's unit tests have something
//! to drive without an external oracle.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// A signed DIMACS-style literal. Positive `v` means the variable is
/// asserted true; negative `-v` means asserted false. Used both for
/// "external" (caller-facing CNF) ids and, numerically identically, for the
/// solver's internal ids — the two are distinct namespaces kept apart by the
/// [`SatSolver::cnf2internal`]/[`SatSolver::internal2cnf`] mapping, not by
/// representation.
pub type Lit = i64;

pub type GroupId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatOutcome {
    Sat,
    Unsat,
    InternalError,
}

/// §4.H's abstract contract. A solver owns its own groups, variable mapping,
/// and last-result state; every method either mutates that state or reads
/// off the last solve's result.
pub trait SatSolver {
    /// The always-present group that cannot be destroyed (§3: "one
    /// distinguished permanent group cannot be destroyed").
    fn permanent_group(&self) -> GroupId;

    /// Allocate a fresh non-permanent group with its own switch variable.
    fn create_group(&mut self) -> GroupId;

    /// Destroy a non-permanent group: its switch is asserted as a unit
    /// clause so every clause carrying it becomes vacuously satisfied.
    /// Fatal (panics) on the permanent group (§3 invariant: "one
    /// distinguished permanent group cannot be destroyed").
    fn destroy_group(&mut self, group: GroupId);

    /// Move `group`'s clauses into the permanent group by asserting the
    /// negated switch as a unit clause, permanently disabling the
    /// switch-literal escape hatch in its member clauses.
    fn make_permanent(&mut self, group: GroupId);

    /// First reference to external CNF variable `v` (by absolute value)
    /// creates its internal variable; subsequent references return the same
    /// one.
    fn cnf2internal(&mut self, v: Lit) -> Lit;

    /// May return `None` for switch-variable ids — "callers treat a missing
    /// mapping as belongs to group machinery" (§4.H).
    fn internal2cnf(&self, v: Lit) -> Option<Lit>;

    /// Assert `clause` into `group`. Non-permanent clauses are extended with
    /// the group's switch literal at assert time.
    fn add(&mut self, clause: &[Lit], group: GroupId);

    /// Assert a unit clause `pol ? lit : -lit`, augmented with `group`'s
    /// switch when non-permanent.
    fn set_polarity(&mut self, lit: Lit, polarity: bool, group: GroupId);

    fn solve_all_groups(&mut self) -> SatOutcome;
    fn solve_groups(&mut self, enabled: &[GroupId]) -> SatOutcome;
    fn solve_without_groups(&mut self, disabled: &[GroupId]) -> SatOutcome;
    /// Solve the permanent group only, under the given external-literal
    /// assumptions.
    fn solve_all_groups_assume(&mut self, assumptions: &[Lit]) -> SatOutcome;

    /// Materialise the last solve's satisfying assignment as external CNF
    /// literals. `None` if the last outcome was not `Sat`.
    fn get_model(&self) -> Option<Vec<Lit>>;

    /// Wall-clock time spent in the most recent solve call (§5: "each call
    /// records CPU-time deltas so upper layers can budget work").
    fn last_call_time(&self) -> Duration;
}

/// Optional capability: extracting an UNSAT core from the last
/// `solve_all_groups_assume` call. Per §9 Open Question 2, this is not part
/// of the base contract — the legacy ZChaff-style back-end the source
/// describes simply aborts when asked, so a back-end that cannot support it
/// just doesn't implement this trait rather than panicking at the call site.
pub trait SupportsConflicts: SatSolver {
    /// The subset of the last `solve_all_groups_assume` assumptions that
    /// form an UNSAT core. Fatal (panics) if called without a prior UNSAT
    /// `solve_all_groups_assume` — "UNSAT query in a solve_assume
    /// conflict-extraction without prior solve" is a contract violation
    /// (§7).
    fn get_conflicts(&self) -> Vec<Lit>;
}

/// A theory-term tree returned by an interpolation callback. Opaque to the
/// rest of the core — rendering/consuming it is an external concern (§1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpolantTerm {
    True,
    False,
    Var(Lit),
    Not(Box<InterpolantTerm>),
    And(Box<InterpolantTerm>, Box<InterpolantTerm>),
    Or(Box<InterpolantTerm>, Box<InterpolantTerm>),
}

/// Optional capability: Craig interpolation between ordered interpolation
/// groups, gated behind proof logging (§4.H).
pub trait SupportsInterpolation: SatSolver {
    /// Open (and return the tag for) a fresh interpolation group.
    fn open_interpolation_group(&mut self) -> GroupId;

    /// Interpolant for the partition `(A, B)` of the last UNSAT proof, where
    /// `a_groups` names the groups on the `A` side. Fatal if proof logging
    /// was not enabled at construction (§4.H: "if not supported, the
    /// corresponding methods are fatal").
    fn interpolant(&self, a_groups: &[GroupId]) -> InterpolantTerm;
}

#[derive(Debug, Clone)]
struct Group {
    id: GroupId,
    /// `None` for the permanent group; `Some(switch)` otherwise, where
    /// `switch` is the internal variable introduced for this group.
    switch: Option<Lit>,
    destroyed: bool,
}

/// Reference/testing SAT back-end: plain DPLL with unit propagation, no
/// clause learning. Not a production solver — exists so this crate's façade
/// has a concrete implementation to test against, the same way the teacher
/// crate ships small in-crate reference encodings (`UnaryIntegerDomain`) to
/// exercise a trait contract without an external oracle.
pub struct NaiveSatSolver {
    proof_logging: bool,
    cnf_to_internal: HashMap<Lit, Lit>,
    internal_to_cnf: HashMap<Lit, Lit>,
    next_internal_var: Lit,
    groups: Vec<Group>,
    next_group_id: GroupId,
    /// Every asserted clause, as internal literals, tagged with the group
    /// it was asserted into (for bookkeeping/printing only — the switch
    /// literal already bakes group membership into the clause itself).
    clauses: Vec<(GroupId, Vec<Lit>)>,
    unsat_groups: HashSet<GroupId>,
    last_model: Option<HashMap<Lit, bool>>,
    last_sat: Option<bool>,
    last_assumption_conflict: Option<Vec<Lit>>,
    last_call_time: Duration,
}

impl NaiveSatSolver {
    pub fn new() -> Self {
        Self::with_proof_logging(false)
    }

    pub fn with_proof_logging(proof_logging: bool) -> Self {
        let permanent = Group {
            id: 0,
            switch: None,
            destroyed: false,
        };
        NaiveSatSolver {
            proof_logging,
            cnf_to_internal: HashMap::new(),
            internal_to_cnf: HashMap::new(),
            next_internal_var: 1,
            groups: vec![permanent],
            next_group_id: 1,
            clauses: Vec::new(),
            unsat_groups: HashSet::new(),
            last_model: None,
            last_sat: None,
            last_assumption_conflict: None,
            last_call_time: Duration::ZERO,
        }
    }

    fn fresh_internal_var(&mut self) -> Lit {
        let v = self.next_internal_var;
        self.next_internal_var += 1;
        v
    }

    fn group_mut(&mut self, id: GroupId) -> &mut Group {
        self.groups
            .iter_mut()
            .find(|g| g.id == id)
            .unwrap_or_else(|| panic!("unknown SAT group {id}"))
    }

    fn group(&self, id: GroupId) -> &Group {
        self.groups
            .iter()
            .find(|g| g.id == id)
            .unwrap_or_else(|| panic!("unknown SAT group {id}"))
    }

    fn to_internal_lit(&mut self, lit: Lit) -> Lit {
        let internal_var = self.cnf2internal(lit.abs());
        if lit < 0 {
            -internal_var
        } else {
            internal_var
        }
    }

    /// Collect the (already-internal) clause set active under the given
    /// group-enable assumptions, restricted to `groups_filter` when given
    /// (used by `solve_all_groups_assume`, which only considers the
    /// permanent group).
    fn active_clauses(&self, groups_filter: Option<&[GroupId]>) -> Vec<Vec<Lit>> {
        self.clauses
            .iter()
            .filter(|(gid, _)| match groups_filter {
                Some(allowed) => allowed.contains(gid),
                None => true,
            })
            .map(|(_, clause)| clause.clone())
            .collect()
    }

    fn record_time(&mut self, start: Instant) {
        self.last_call_time = start.elapsed();
    }

    fn run(&mut self, clauses: Vec<Vec<Lit>>, assumptions: &[Lit]) -> SatOutcome {
        let mut assignment: HashMap<Lit, bool> = HashMap::new();
        for &a in assumptions {
            assignment.insert(a.abs(), a > 0);
        }
        let mut all_clauses = clauses;
        for &a in assumptions {
            all_clauses.push(vec![a]);
        }
        match dpll(&all_clauses, assignment) {
            Some(model) => {
                self.last_model = Some(model);
                self.last_sat = Some(true);
                SatOutcome::Sat
            }
            None => {
                self.last_model = None;
                self.last_sat = Some(false);
                SatOutcome::Unsat
            }
        }
    }
}

impl Default for NaiveSatSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SatSolver for NaiveSatSolver {
    fn permanent_group(&self) -> GroupId {
        0
    }

    fn create_group(&mut self) -> GroupId {
        let id = self.next_group_id;
        self.next_group_id += 1;
        let switch = self.fresh_internal_var();
        self.groups.push(Group {
            id,
            switch: Some(switch),
            destroyed: false,
        });
        id
    }

    fn destroy_group(&mut self, group: GroupId) {
        assert!(group != self.permanent_group(), "cannot destroy the permanent group");
        let switch = self.group(group).switch.expect("non-permanent group must have a switch");
        // Forcing the switch true makes every clause carrying it vacuously
        // satisfied: "clauses bearing that switch become vacuously
        // satisfied."
        self.clauses.push((group, vec![switch]));
        self.group_mut(group).destroyed = true;
    }

    fn make_permanent(&mut self, group: GroupId) {
        let switch = self.group(group).switch.expect("non-permanent group must have a switch");
        // Negated switch unit clause: the switch is pinned to 0 forever, so
        // the escape-hatch literal in its member clauses never fires again.
        self.clauses.push((group, vec![-switch]));
        self.group_mut(group).switch = None;
    }

    fn cnf2internal(&mut self, v: Lit) -> Lit {
        let key = v.abs();
        if let Some(&existing) = self.cnf_to_internal.get(&key) {
            return existing;
        }
        let internal = self.fresh_internal_var();
        self.cnf_to_internal.insert(key, internal);
        self.internal_to_cnf.insert(internal, key);
        internal
    }

    fn internal2cnf(&self, v: Lit) -> Option<Lit> {
        self.internal_to_cnf.get(&v.abs()).copied()
    }

    fn add(&mut self, clause: &[Lit], group: GroupId) {
        assert!(!self.group(group).destroyed, "group {group} was destroyed");
        let mut internal: Vec<Lit> = clause.iter().map(|&l| self.to_internal_lit(l)).collect();
        if let Some(switch) = self.group(group).switch {
            internal.push(switch);
        }
        self.clauses.push((group, internal));
    }

    fn set_polarity(&mut self, lit: Lit, polarity: bool, group: GroupId) {
        let signed = if polarity { lit } else { -lit };
        self.add(&[signed], group);
    }

    fn solve_all_groups(&mut self) -> SatOutcome {
        let start = Instant::now();
        let clauses = self.active_clauses(None);
        let disable: Vec<Lit> = self
            .groups
            .iter()
            .filter_map(|g| g.switch)
            .map(|s| -s)
            .collect();
        let outcome = self.run(clauses, &disable);
        self.record_time(start);
        outcome
    }

    fn solve_groups(&mut self, enabled: &[GroupId]) -> SatOutcome {
        let start = Instant::now();
        let clauses = self.active_clauses(None);
        let assumptions: Vec<Lit> = self
            .groups
            .iter()
            .filter_map(|g| g.switch.map(|s| (g.id, s)))
            .map(|(id, s)| if enabled.contains(&id) { -s } else { s })
            .collect();
        let outcome = self.run(clauses, &assumptions);
        self.record_time(start);
        outcome
    }

    fn solve_without_groups(&mut self, disabled: &[GroupId]) -> SatOutcome {
        let enabled: Vec<GroupId> = self
            .groups
            .iter()
            .filter_map(|g| g.switch.map(|_| g.id))
            .filter(|id| !disabled.contains(id))
            .collect();
        self.solve_groups(&enabled)
    }

    fn solve_all_groups_assume(&mut self, assumptions: &[Lit]) -> SatOutcome {
        let start = Instant::now();
        let permanent = self.permanent_group();
        let clauses = self.active_clauses(Some(&[permanent]));
        let internal_assumptions: Vec<Lit> = assumptions.iter().map(|&l| self.to_internal_lit(l)).collect();
        let outcome = self.run(clauses.clone(), &internal_assumptions);

        if outcome == SatOutcome::Unsat {
            // Naive core shrinking: drop each assumption in turn and keep it
            // only if the remainder is no longer UNSAT without it. O(n)
            // extra solves, fine for a reference/testing backend.
            let mut core: Vec<Lit> = assumptions.to_vec();
            let mut i = 0;
            while i < core.len() {
                let mut candidate = core.clone();
                candidate.remove(i);
                let candidate_internal: Vec<Lit> =
                    candidate.iter().map(|&l| self.to_internal_lit(l)).collect();
                let still_unsat = dpll(
                    &{
                        let mut cs = clauses.clone();
                        for &a in &candidate_internal {
                            cs.push(vec![a]);
                        }
                        cs
                    },
                    HashMap::new(),
                )
                .is_none();
                if still_unsat {
                    core = candidate;
                } else {
                    i += 1;
                }
            }
            self.last_assumption_conflict = Some(core);
        } else {
            self.last_assumption_conflict = None;
        }
        self.record_time(start);
        outcome
    }

    fn get_model(&self) -> Option<Vec<Lit>> {
        let model = self.last_model.as_ref()?;
        let mut out: Vec<Lit> = model
            .iter()
            .filter_map(|(&var, &value)| {
                self.internal2cnf(var).map(|cnf| if value { cnf } else { -cnf })
            })
            .collect();
        out.sort_by_key(|l| l.abs());
        Some(out)
    }

    fn last_call_time(&self) -> Duration {
        self.last_call_time
    }
}

impl SupportsConflicts for NaiveSatSolver {
    fn get_conflicts(&self) -> Vec<Lit> {
        match (&self.last_sat, &self.last_assumption_conflict) {
            (Some(false), Some(core)) => core.clone(),
            _ => panic!(
                "get_conflicts called without a preceding UNSAT solve_all_groups_assume"
            ),
        }
    }
}

impl SupportsInterpolation for NaiveSatSolver {
    fn open_interpolation_group(&mut self) -> GroupId {
        assert!(self.proof_logging, "interpolation requires proof logging to be enabled");
        self.create_group()
    }

    fn interpolant(&self, _a_groups: &[GroupId]) -> InterpolantTerm {
        assert!(self.proof_logging, "interpolation requires proof logging to be enabled");
        // A real back-end would walk its resolution proof; this reference
        // solver has none, so it returns the weakest sound interpolant.
        InterpolantTerm::True
    }
}

/// Plain recursive DPLL: unit propagation to a fixpoint, then branch on the
/// first unassigned variable appearing in any remaining clause.
fn dpll(clauses: &[Vec<Lit>], mut assignment: HashMap<Lit, bool>) -> Option<HashMap<Lit, bool>> {
    loop {
        let mut progressed = false;
        for clause in clauses {
            let mut unassigned: Option<Lit> = None;
            let mut satisfied = false;
            let mut unassigned_count = 0;
            for &lit in clause {
                match assignment.get(&lit.abs()) {
                    Some(&value) if value == (lit > 0) => {
                        satisfied = true;
                        break;
                    }
                    Some(_) => {}
                    None => {
                        unassigned_count += 1;
                        unassigned = Some(lit);
                    }
                }
            }
            if satisfied {
                continue;
            }
            if unassigned_count == 0 {
                return None; // empty clause under this assignment: conflict
            }
            if unassigned_count == 1 {
                let lit = unassigned.unwrap();
                assignment.insert(lit.abs(), lit > 0);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    let unresolved = clauses.iter().find(|clause| {
        !clause.iter().any(|&lit| assignment.get(&lit.abs()) == Some(&(lit > 0)))
    });

    let Some(clause) = unresolved else {
        return Some(assignment);
    };

    let branch_var = clause
        .iter()
        .map(|l| l.abs())
        .find(|v| !assignment.contains_key(v));

    let Some(var) = branch_var else {
        // Every literal in `clause` is assigned false: conflict.
        return None;
    };

    for &value in &[true, false] {
        let mut next = assignment.clone();
        next.insert(var, value);
        if let Some(model) = dpll(clauses, next) {
            return Some(model);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    /// §8 scenario S6: permanent `(a v b)`, group G1 `(!a)`, group G2 `(!b)`.
    #[test]
    fn group_scenario_matches_scenario_s6() {
        let mut solver = NaiveSatSolver::new();
        let permanent = solver.permanent_group();
        solver.add(&[1, 2], permanent); // a v b
        let g1 = solver.create_group();
        solver.add(&[-1], g1); // !a
        let g2 = solver.create_group();
        solver.add(&[-2], g2); // !b

        assert_eq!(solver.solve_all_groups(), SatOutcome::Unsat);

        assert_eq!(solver.solve_groups(&[g1]), SatOutcome::Sat);
        let model = solver.get_model().unwrap();
        assert!(model.contains(&2), "b must be true when only !a is enabled: {model:?}");

        assert_eq!(solver.solve_without_groups(&[g1, g2]), SatOutcome::Sat);
    }

    #[test]
    fn destroyed_group_clauses_become_vacuous() {
        let mut solver = NaiveSatSolver::new();
        let permanent = solver.permanent_group();
        solver.add(&[1], permanent);
        let g = solver.create_group();
        solver.add(&[-1], g);
        assert_eq!(solver.solve_all_groups(), SatOutcome::Unsat);
        solver.destroy_group(g);
        assert_eq!(solver.solve_all_groups(), SatOutcome::Sat);
    }

    #[test]
    fn assume_conflict_is_subset_of_assumptions() {
        let mut solver = NaiveSatSolver::new();
        let permanent = solver.permanent_group();
        solver.add(&[1, 2], permanent);
        solver.add(&[-1, 2], permanent);
        solver.add(&[1, -2], permanent);

        // Assuming both !1 and !2 makes (1 v 2) unsatisfiable; the third
        // clause is irrelevant to the conflict.
        let outcome = solver.solve_all_groups_assume(&[-1, -2, 3]);
        assert_eq!(outcome, SatOutcome::Unsat);
        let conflict = solver.get_conflicts();
        assert!(conflict.contains(&-1));
        assert!(conflict.contains(&-2));
        assert!(!conflict.contains(&3), "irrelevant assumption should drop out of the core");
    }

    #[test]
    fn group_equivalence_with_permanent_holds() {
        let mut solver = NaiveSatSolver::new();
        let permanent = solver.permanent_group();
        solver.add(&[1], permanent);
        let g = solver.create_group();
        solver.add(&[-1, 2], g);
        let a = solver.solve_groups(&[g]);
        let b = solver.solve_groups(&[g, permanent]);
        assert_eq!(a, b);
    }

    #[test]
    fn make_permanent_disables_switch_forever() {
        let mut solver = NaiveSatSolver::new();
        let g = solver.create_group();
        solver.add(&[1, 2], g);
        solver.make_permanent(g);
        // Even "enabling" g now is a no-op since its switch is pinned.
        assert_eq!(solver.solve_groups(&[]), SatOutcome::Sat);
        let model = solver.get_model().unwrap();
        assert!(model.iter().any(|&l| l == 1 || l == 2));
    }
}

//! §4.I — the interactive simulator core.
//!
//! Given a current state (or no state at all, for an initial-state query),
//! a pre-picked target set of next states, and a bound on how many to
//! enumerate, produces the concrete next states and, per next state, the
//! concrete inputs labelling a transition into it. This is the symbolic-to-
//! concrete boundary an interactive step-by-step UI sits on top of; picking
//! one of the enumerated choices (by index, at random, or deterministically)
//! is this module's other half.

use crate::bdd_handle::{BddHandle, BddManager, States, StateInputs};
use crate::fsm::BddFsm;
use biodivine_lib_bdd::BddVariable;
use rand::Rng;

/// A concrete assignment to a cube of BDD variables — "a minterm", in the
/// spec's words.
pub type Valuation = Vec<(BddVariable, bool)>;

/// One concrete next state together with every concrete input that labels a
/// transition from the queried current state into it.
#[derive(Debug, Clone)]
pub struct NextStateChoice {
    /// Assignment over the state (and frozen) variable cube.
    pub state: Valuation,
    /// One entry per distinct labelling input; `[[]]` (a single empty
    /// valuation) when the FSM has no input variables at all, or when this
    /// is an initial-state query (no transition, hence no input, involved).
    pub inputs: Vec<Valuation>,
}

#[derive(Debug, Clone, Copy)]
pub enum PickMode {
    Index(usize),
    Random,
    First,
}

fn fixed_formula(manager: &BddManager, assignment: &[(BddVariable, bool)]) -> BddHandle {
    assignment
        .iter()
        .fold(manager.mk_true(), |acc, &(var, value)| acc.and(&manager.mk_literal(var, value)))
}

pub struct Simulator<'a> {
    fsm: &'a BddFsm,
}

impl<'a> Simulator<'a> {
    pub fn new(fsm: &'a BddFsm) -> Self {
        Simulator { fsm }
    }

    /// Enumerate up to `limit` next states reachable from `current` (pass
    /// `None` to query initial states instead) that lie within `target`,
    /// each paired with every concrete input labelling a transition into it.
    pub fn enumerate_successors(&self, current: Option<&States>, target: &States, limit: usize) -> Vec<NextStateChoice> {
        let fsm = self.fsm;
        let manager = fsm.manager();
        let state_frozen_cube: Vec<BddVariable> =
            fsm.state_vars().iter().chain(fsm.frozen_vars()).cloned().collect();

        if state_frozen_cube.is_empty() {
            // "[the array of next concrete states is] [top] if no
            // state/frozen variables exist."
            return vec![NextStateChoice { state: vec![], inputs: vec![vec![]] }];
        }

        let (result_formula, input_cube): (BddHandle, Vec<BddVariable>) = match current {
            Some(s) => {
                let si = StateInputs(fsm.legal_state_input().and(s));
                let next = fsm.fwd_image_state_inputs(&si);
                let restated = fsm.rename_next_to_state(&next);
                (restated.and(target), fsm.input_vars().to_vec())
            }
            None => (fsm.init().and(fsm.state_invar()).and(target), Vec::new()),
        };

        let mut remaining = result_formula;
        let mut out = Vec::new();
        while out.len() < limit {
            let states_only = if input_cube.is_empty() {
                remaining.clone()
            } else {
                remaining.exists(&input_cube)
            };
            let Some(state_assignment) = manager.pick_one_minterm(&states_only, &state_frozen_cube) else {
                break;
            };
            let state_formula = fixed_formula(manager, &state_assignment);
            let at_state = remaining.and(&state_formula);

            let inputs_for_state = if input_cube.is_empty() {
                vec![Vec::new()]
            } else {
                let mut inputs = Vec::new();
                let mut remaining_inputs = at_state;
                while let Some(input_assignment) = manager.pick_one_minterm(&remaining_inputs, &input_cube) {
                    let input_formula = fixed_formula(manager, &input_assignment);
                    remaining_inputs = remaining_inputs.and_not(&input_formula);
                    inputs.push(input_assignment);
                }
                inputs
            };

            remaining = remaining.and_not(&state_formula);
            out.push(NextStateChoice { state: state_assignment, inputs: inputs_for_state });
        }
        out
    }

    /// Pick one of `choices` by index (rejecting out-of-range), uniformly at
    /// random over state-input pairs, or deterministically (the first).
    pub fn pick<'c>(&self, choices: &'c [NextStateChoice], mode: PickMode) -> Option<(usize, &'c NextStateChoice)> {
        match mode {
            PickMode::Index(i) => {
                if i >= choices.len() {
                    panic!("pick: index {i} out of range (only {} choices)", choices.len());
                }
                Some((i, &choices[i]))
            }
            PickMode::First => choices.first().map(|c| (0, c)),
            PickMode::Random => {
                if choices.is_empty() {
                    return None;
                }
                let total: usize = choices.iter().map(|c| c.inputs.len().max(1)).sum();
                let mut pick = rand::thread_rng().gen_range(0..total);
                for (i, c) in choices.iter().enumerate() {
                    let weight = c.inputs.len().max(1);
                    if pick < weight {
                        return Some((i, c));
                    }
                    pick -= weight;
                }
                unreachable!("weighted pick must land inside the total range")
            }
        }
    }

    /// "Printing must enumerate states with indices so the UI can refer to
    /// them by number."
    pub fn format_choices(&self, choices: &[NextStateChoice]) -> Vec<String> {
        choices
            .iter()
            .enumerate()
            .map(|(i, c)| {
                format!(
                    "[{i}] state={{{}}} ({} labelling input{})",
                    format_valuation(&c.state),
                    c.inputs.len(),
                    if c.inputs.len() == 1 { "" } else { "s" }
                )
            })
            .collect()
    }
}

fn format_valuation(v: &[(BddVariable, bool)]) -> String {
    v.iter()
        .map(|(var, value)| format!("{var:?}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdd_handle::BddManager;
    use crate::diagnostics::Diagnostics;
    use crate::fairness::{CompassionList, JusticeList};
    use crate::fsm::BddTrans;
    use biodivine_lib_bdd::BddVariableSetBuilder;
    use std::rc::Rc;

    fn two_state_fsm() -> BddFsm {
        let mut builder = BddVariableSetBuilder::new();
        let s = builder.make_variable("s");
        let s_next = builder.make_variable("s'");
        let variables = builder.build();
        let manager = Rc::new(BddManager::new(variables));

        let init = manager.mk_true();
        let trans = manager.mk_true(); // every state reaches every state
        BddFsm::new(
            manager.clone(),
            vec![s],
            vec![s_next],
            vec![],
            vec![],
            States(init),
            States(manager.mk_true()),
            manager.mk_true(),
            BddTrans::new(vec![manager.mk_true()]),
            JusticeList::new(),
            CompassionList::new(),
            Diagnostics::new(),
        )
    }

    #[test]
    fn enumerates_both_successor_states_from_a_fixed_state() {
        let fsm = two_state_fsm();
        let s = fsm.state_vars()[0];
        let current = States(fsm.manager().mk_var(s));
        let target = States(fsm.manager().mk_true());
        let sim = Simulator::new(&fsm);
        let choices = sim.enumerate_successors(Some(&current), &target, 10);
        assert_eq!(choices.len(), 2, "both s=false and s=true should be reachable successors");
        for choice in &choices {
            assert_eq!(choice.inputs, vec![Vec::new()], "no input vars means one empty labelling input");
        }
    }

    #[test]
    fn initial_state_query_ignores_transitions() {
        let fsm = two_state_fsm();
        let target = States(fsm.manager().mk_true());
        let sim = Simulator::new(&fsm);
        let choices = sim.enumerate_successors(None, &target, 10);
        assert_eq!(choices.len(), 2);
    }

    #[test]
    fn pick_by_index_out_of_range_panics() {
        let fsm = two_state_fsm();
        let target = States(fsm.manager().mk_true());
        let sim = Simulator::new(&fsm);
        let choices = sim.enumerate_successors(None, &target, 10);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sim.pick(&choices, PickMode::Index(99))));
        assert!(result.is_err());
    }

    #[test]
    fn pick_first_is_deterministic() {
        let fsm = two_state_fsm();
        let target = States(fsm.manager().mk_true());
        let sim = Simulator::new(&fsm);
        let choices = sim.enumerate_successors(None, &target, 10);
        let (idx, _) = sim.pick(&choices, PickMode::First).unwrap();
        assert_eq!(idx, 0);
    }
}

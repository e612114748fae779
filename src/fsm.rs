//! §4.G — the BDD-based finite state machine: the hub of the core. Image
//! operators (4.G.1), reachability (4.G.2), deadlock/totality (4.G.3), fair
//! states (4.G.4), synchronous product (4.G.5).
//!
//! `BddTrans` (§3's "opaque collaborator") is given a concrete, minimal
//! body here — a partitioned conjunction of transition-relation BDDs backed
//! by `biodivine-lib-bdd` — since the crate must compile and be testable
//! even though its *partitioning strategy* is not mandated by the spec
//! (§4.F).

use crate::bdd_handle::{BddManager, States, StateInputs, StateInputsNext};
use crate::diagnostics::Diagnostics;
use crate::fairness::{CompassionList, JusticeList};
use biodivine_lib_bdd::BddVariable;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// §4.F: the partitioned transition relation. Each partition constrains a
/// disjoint slice of the next-state variables (a common NuSMV-style
/// partitioning by assigned variable); `monolithic()` conjoins them on
/// demand for operators that need the whole relation at once.
pub struct BddTrans {
    partitions: Vec<crate::bdd_handle::BddHandle>,
}

impl BddTrans {
    pub fn new(partitions: Vec<crate::bdd_handle::BddHandle>) -> Self {
        BddTrans { partitions }
    }

    pub fn monolithic(&self, manager: &BddManager) -> crate::bdd_handle::BddHandle {
        self.partitions
            .iter()
            .fold(manager.mk_true(), |acc, p| acc.and(p))
    }

    pub fn partitions(&self) -> &[crate::bdd_handle::BddHandle] {
        &self.partitions
    }
}

/// §3 "Fsm cache" — refcounted across `BddFsm` copies ("a hard copy detaches
/// a family; a soft copy joins one").
#[derive(Default)]
pub struct FsmCache {
    fair_state_inputs: Option<StateInputs>,
    reverse_fair_state_inputs: Option<StateInputs>,
    no_successor_states: Option<States>,
    deadlock_states: Option<States>,
    legal_state_input: Option<StateInputs>,
    monolithic_trans: Option<crate::bdd_handle::BddHandle>,
    reachable: ReachableCache,
}

/// The "onion rings": `layers[i]` is the set of states reached in at most
/// `i` steps; `computed` is set once the forward-image fixpoint has been
/// hit. `steps` counts every forward-image computation performed, including
/// the final confirming step that finds no new states — it is one more than
/// `layers.len() - 1` whenever that confirming step didn't also grow a ring,
/// which is why the diameter and the distance of the full reachable set
/// (`layers.len() - 1`) can differ.
#[derive(Default)]
pub struct ReachableCache {
    layers: Vec<States>,
    computed: bool,
    steps: usize,
}

impl ReachableCache {
    pub fn diameter(&self) -> usize {
        self.steps
    }
    pub fn is_computed(&self) -> bool {
        self.computed
    }
    pub fn layer(&self, i: usize) -> Option<&States> {
        self.layers.get(i)
    }
}

/// §3/4.G: the symbolic FSM. Takes ownership of `trans`/`justice`/
/// `compassion`; duplicates (ref-bumps) `init`/invariants on construction,
/// matching "duplicates (ref-increments) the BDDs for init and invariants."
pub struct BddFsm {
    manager: Rc<BddManager>,
    state_vars: Vec<BddVariable>,
    next_vars: Vec<BddVariable>,
    input_vars: Vec<BddVariable>,
    /// Frozen variables: part of every state but never appear in a
    /// quantification list (§3: "frozen vars are never quantified away").
    frozen_vars: Vec<BddVariable>,
    /// Extra copies of `next_vars`, pre-allocated in the manager's variable
    /// set, consumed by `k_bwd_image` for `k >= 2` (§4.G.1's "combinatorial
    /// expansion over the next-state cube").
    next_copies: Vec<Vec<BddVariable>>,
    init: States,
    state_invar: States,
    input_invar: crate::bdd_handle::BddHandle,
    trans: BddTrans,
    justice: JusticeList,
    compassion: CompassionList,
    cache: Rc<RefCell<FsmCache>>,
    diagnostics: Diagnostics,
}

impl BddFsm {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        manager: Rc<BddManager>,
        state_vars: Vec<BddVariable>,
        next_vars: Vec<BddVariable>,
        input_vars: Vec<BddVariable>,
        frozen_vars: Vec<BddVariable>,
        init: States,
        state_invar: States,
        input_invar: crate::bdd_handle::BddHandle,
        trans: BddTrans,
        justice: JusticeList,
        compassion: CompassionList,
        diagnostics: Diagnostics,
    ) -> Self {
        assert_eq!(state_vars.len(), next_vars.len(), "state/next variable sets must be aligned");
        let fsm = BddFsm {
            manager,
            state_vars,
            next_vars,
            input_vars,
            frozen_vars,
            next_copies: Vec::new(),
            init,
            state_invar,
            input_invar,
            trans,
            justice,
            compassion,
            cache: Rc::new(RefCell::new(FsmCache::default())),
            diagnostics,
        };
        fsm.warn_if_empty_on_construction();
        fsm
    }

    pub fn with_next_copies(mut self, copies: Vec<Vec<BddVariable>>) -> Self {
        for copy in &copies {
            assert_eq!(copy.len(), self.state_vars.len(), "k-backward copy must match state width");
        }
        self.next_copies = copies;
        self
    }

    fn warn_if_empty_on_construction(&self) {
        let reachable_root = self.init.and(&self.state_invar);
        if reachable_root.is_false() {
            self.diagnostics.warn("init ∧ invar is empty: no state satisfies both");
        }
        if self.state_invar.is_false() {
            self.diagnostics.warn("state invariant is empty");
        }
        if self.input_invar.is_false() {
            self.diagnostics.warn("input invariant is empty");
        }
        if !self.justice.is_empty() || !self.compassion.is_empty() {
            let fair = self.fair_states();
            if fair.is_false() {
                self.diagnostics.warn("no fair state exists under the given justice/compassion constraints");
            } else if self.init.and(&self.state_invar).and(&fair).is_false() {
                self.diagnostics.warn("init ∩ fair = ∅: no initial state is fair");
            }
        }
        if !self.is_total() {
            self.diagnostics.warn("FSM is not total: some reachable state has no legal successor");
        }
    }

    pub fn manager(&self) -> &Rc<BddManager> {
        &self.manager
    }
    pub fn init(&self) -> &States {
        &self.init
    }
    pub fn state_invar(&self) -> &States {
        &self.state_invar
    }
    pub fn input_invar(&self) -> &crate::bdd_handle::BddHandle {
        &self.input_invar
    }
    pub fn justice(&self) -> &JusticeList {
        &self.justice
    }
    pub fn compassion(&self) -> &CompassionList {
        &self.compassion
    }
    pub fn state_vars(&self) -> &[BddVariable] {
        &self.state_vars
    }
    pub fn input_vars(&self) -> &[BddVariable] {
        &self.input_vars
    }
    pub fn frozen_vars(&self) -> &[BddVariable] {
        &self.frozen_vars
    }

    fn state_to_next_mapping(&self) -> Vec<(BddVariable, BddVariable)> {
        self.state_vars.iter().cloned().zip(self.next_vars.iter().cloned()).collect()
    }
    fn next_to_state_mapping(&self) -> Vec<(BddVariable, BddVariable)> {
        self.next_vars.iter().cloned().zip(self.state_vars.iter().cloned()).collect()
    }

    fn rename_state_to_next(&self, s: &States) -> crate::bdd_handle::BddHandle {
        self.manager.rename(s, &self.state_to_next_mapping())
    }

    /// Rename a formula over next-state variables back to state variables.
    /// Exposed beyond this module for [`crate::simulator`], which needs to
    /// project `fwd_image_state_inputs` results back onto the "current
    /// state" variable space before enumerating minterms.
    pub fn rename_next_to_state(&self, bdd: &crate::bdd_handle::BddHandle) -> crate::bdd_handle::BddHandle {
        self.manager.rename(bdd, &self.next_to_state_mapping())
    }

    fn monolithic_trans(&self) -> crate::bdd_handle::BddHandle {
        if let Some(cached) = self.cache.borrow().monolithic_trans.clone() {
            return cached;
        }
        let m = self.trans.monolithic(&self.manager);
        self.cache.borrow_mut().monolithic_trans = Some(m.clone());
        m
    }

    // ---------------------------------------------------------------
    // §4.G.1 Image operators
    // ---------------------------------------------------------------

    /// `FwdImg(S)(x') = (∃x,i. S(x) ∧ I(x) ∧ J(i) ∧ T(x,i,x'))[x/x'] ∧ I(x)`.
    pub fn fwd_image(&self, s: &States) -> States {
        self.fwd_image_constrained(s, None)
    }

    /// `FwdImgC(S, C)`: adds `∧ C(x,i[,x'])` before quantification.
    pub fn fwd_image_constrained(&self, s: &States, constraint: Option<&crate::bdd_handle::BddHandle>) -> States {
        let mut f = s.and(&self.state_invar).and(&self.input_invar);
        if let Some(c) = constraint {
            f = f.and(c);
        }
        let t = self.monolithic_trans();
        let mut quantify = self.state_vars.clone();
        quantify.extend(self.input_vars.iter().cloned());
        let over_next = self.manager.and_abstract(&f, &t, &quantify);
        let renamed = self.rename_next_to_state(&over_next);
        States(renamed.and(&self.state_invar))
    }

    /// State–input forward image: state–input pairs reachable in one step
    /// from `s`, "rebuilt to states-inputs by retaining the transition
    /// input" — the result lives over `(next_vars, input_vars)`, masked by
    /// `I(x') ∧ J(i')`.
    pub fn fwd_image_state_inputs(&self, s: &StateInputs) -> StateInputsNext {
        let f = s.and(&self.state_invar).and(&self.input_invar);
        let quantify = self.state_vars.clone();
        let t = self.monolithic_trans();
        let over_next = self.manager.and_abstract(&f, &t, &quantify);
        let next_invar = self.rename_state_to_next(&self.state_invar);
        StateInputsNext(over_next.and(&next_invar).and(&self.input_invar))
    }

    /// `WbwdImg(S)(x,i) = ∃x'. T ∧ S[x'/x] ∧ I(x) ∧ J(i)`.
    pub fn weak_bwd_image(&self, s: &States) -> StateInputs {
        let s_next = self.rename_state_to_next(s);
        let t = self.monolithic_trans();
        let f = t.and(&s_next);
        let result = f.exists(&self.next_vars);
        StateInputs(result.and(&self.state_invar).and(&self.input_invar))
    }

    /// `legal_state_input = WbwdImg(⊤)`: state-input pairs admitting at
    /// least one legal successor.
    pub fn legal_state_input(&self) -> StateInputs {
        if let Some(cached) = self.cache.borrow().legal_state_input.clone() {
            return cached;
        }
        let result = self.weak_bwd_image(&States(self.manager.mk_true()));
        self.cache.borrow_mut().legal_state_input = Some(result.clone());
        result
    }

    /// `SbwdImg(S) = legal_state_input ∧ ¬WbwdImg(¬S)`.
    pub fn strong_bwd_image(&self, s: &States) -> StateInputs {
        let not_s = States(s.not());
        let w = self.weak_bwd_image(&not_s);
        let legal = self.legal_state_input();
        StateInputs(legal.and(&w.not()))
    }

    /// k-backward image: state-inputs with `>= k` distinct successor states
    /// in `S`, computed by the "combinatorial expansion over the next-state
    /// cube" the spec describes: `k` disjoint fresh copies of the
    /// next-state variables, each constrained by `T ∧ S`, pairwise forced
    /// distinct, existentially quantified away. `k == 1` degenerates to
    /// [`BddFsm::weak_bwd_image`]; `k >= 2` needs `k - 1` pre-allocated
    /// variable copies (see [`BddFsm::with_next_copies`]).
    pub fn k_bwd_image(&self, s: &States, k: usize) -> StateInputs {
        assert!(k >= 1, "k-backward image is only defined for k >= 1");
        if k == 1 {
            return self.weak_bwd_image(s);
        }
        let copies_needed = k - 1;
        assert!(
            self.next_copies.len() >= copies_needed,
            "k_bwd_image({k}) needs {copies_needed} extra next-state variable copies; only {} were supplied",
            self.next_copies.len()
        );

        let mut copy_var_sets: Vec<&[BddVariable]> = vec![&self.next_vars];
        for copy in self.next_copies.iter().take(copies_needed) {
            copy_var_sets.push(copy);
        }

        let t = self.monolithic_trans();
        let mut conj = self.manager.mk_true();
        let mut quantify: Vec<BddVariable> = Vec::new();
        for copy in &copy_var_sets {
            let t_copy = self.manager.rename(&t, &zip_mapping(&self.next_vars, copy));
            let s_copy = self.manager.rename(s, &zip_mapping(&self.state_vars, copy));
            conj = conj.and(&t_copy).and(&s_copy);
            quantify.extend_from_slice(copy);
        }
        for a in 0..copy_var_sets.len() {
            for b in (a + 1)..copy_var_sets.len() {
                conj = conj.and(&pairwise_distinct(&self.manager, copy_var_sets[a], copy_var_sets[b]));
            }
        }
        let result = conj.exists(&quantify);
        StateInputs(result.and(&self.state_invar).and(&self.input_invar))
    }

    // ---------------------------------------------------------------
    // §4.G.2 Reachability
    // ---------------------------------------------------------------

    /// Run (or resume) forward-image reachability. `max_steps < 0` and
    /// `max_seconds < 0` both mean "run to fixpoint"; otherwise the
    /// expansion stops as soon as either bound is reached, leaving the
    /// cache consistent for a later resume (§5's only cancellable
    /// operation).
    pub fn expand_cached_reachable_states(&self, max_steps: i64, max_seconds: i64) {
        let start = Instant::now();
        loop {
            let already_computed = self.cache.borrow().reachable.computed;
            if already_computed {
                return;
            }
            let i = self.cache.borrow().reachable.layers.len();
            if i == 0 {
                let r0 = States(self.init.and(&self.state_invar));
                self.cache.borrow_mut().reachable.layers.push(r0);
                self.diagnostics.progress(format!("reachability: layer 0 seeded"));
                if max_steps == 0 {
                    return;
                }
                continue;
            }
            if max_steps >= 0 && (i as i64) > max_steps {
                return;
            }
            if max_seconds >= 0 && start.elapsed().as_secs() as i64 >= max_seconds {
                return;
            }

            let frontier = self.cache.borrow().reachable.layers[i - 1].clone();
            let img = self.fwd_image(&frontier);
            let union_so_far = States(self.cache.borrow().reachable.layers[i - 1].or(&img));
            let new_frontier = States(union_so_far.and_not(&self.cache.borrow().reachable.layers[i - 1]));

            self.diagnostics
                .progress(format!("reachability: layer {i}, bdd size {}", union_so_far.size()));

            {
                let mut cache = self.cache.borrow_mut();
                cache.reachable.steps += 1;
                if new_frontier.is_false() {
                    // Fixpoint: `union_so_far` is identical to `layers[i - 1]`,
                    // so no new ring is pushed, only the step count advances.
                    cache.reachable.computed = true;
                } else {
                    cache.reachable.layers.push(union_so_far);
                }
            }
        }
    }

    pub fn reachable_states(&self) -> States {
        self.expand_cached_reachable_states(-1, -1);
        let cache = self.cache.borrow();
        cache
            .reachable
            .layers
            .last()
            .cloned()
            .unwrap_or_else(|| States(self.manager.mk_false()))
    }

    pub fn reachable_diameter(&self) -> Option<usize> {
        self.expand_cached_reachable_states(-1, -1);
        let cache = self.cache.borrow();
        cache.reachable.computed.then(|| cache.reachable.diameter())
    }

    /// Largest `i` with `S ⊆ R_i`.
    pub fn distance_of_states(&self, s: &States) -> Option<usize> {
        self.expand_cached_reachable_states(-1, -1);
        let cache = self.cache.borrow();
        if !s.entails(&cache.reachable.layers.last()?) {
            return None;
        }
        (0..cache.reachable.layers.len())
            .rev()
            .find(|&i| s.entails(&cache.reachable.layers[i]))
    }

    /// Smallest `i` with `S ∩ R_i ≠ ⊥`.
    pub fn minimum_distance_of_states(&self, s: &States) -> Option<usize> {
        self.expand_cached_reachable_states(-1, -1);
        let cache = self.cache.borrow();
        (0..cache.reachable.layers.len()).find(|&i| !s.and(&cache.reachable.layers[i]).is_false())
    }

    /// `R_d \ R_{d-1}`: states first seen exactly at distance `d`.
    pub fn reachable_states_at_distance(&self, d: usize) -> States {
        self.expand_cached_reachable_states(-1, -1);
        let cache = self.cache.borrow();
        let Some(layer_d) = cache.reachable.layers.get(d) else {
            return States(self.manager.mk_false());
        };
        match d {
            0 => layer_d.clone(),
            _ => States(layer_d.and_not(&cache.reachable.layers[d - 1])),
        }
    }

    // ---------------------------------------------------------------
    // §4.G.3 Deadlock / totality
    // ---------------------------------------------------------------

    pub fn not_successor_states(&self) -> States {
        if let Some(cached) = self.cache.borrow().no_successor_states.clone() {
            return cached;
        }
        let has_successor = self.strong_bwd_image_complement();
        self.cache.borrow_mut().no_successor_states = Some(has_successor.clone());
        has_successor
    }

    /// `I ∧ ¬∃i. legal_state_input(x,i)`.
    fn strong_bwd_image_complement(&self) -> States {
        let legal = self.legal_state_input();
        let has_successor = legal.exists(&self.input_vars);
        States(self.state_invar.and(&has_successor.not()))
    }

    pub fn is_total(&self) -> bool {
        self.not_successor_states().is_false()
    }

    pub fn deadlock_states(&self) -> States {
        if let Some(cached) = self.cache.borrow().deadlock_states.clone() {
            return cached;
        }
        let reachable = self.reachable_states();
        let deadlocks = States(reachable.and(&self.not_successor_states()));
        self.cache.borrow_mut().deadlock_states = Some(deadlocks.clone());
        deadlocks
    }

    pub fn is_deadlock_free(&self) -> bool {
        self.deadlock_states().is_false()
    }

    // ---------------------------------------------------------------
    // §4.G.4 Fair states — Emerson-Lei fixpoint
    // ---------------------------------------------------------------

    /// Fair state-input pairs (the outer GFP's final value), restricted to
    /// reachable, legal state-inputs.
    pub fn fair_state_inputs(&self) -> StateInputs {
        if let Some(cached) = self.cache.borrow().fair_state_inputs.clone() {
            return cached;
        }
        let result = self.emerson_lei(Direction::Bwd);
        self.cache.borrow_mut().fair_state_inputs = Some(result.clone());
        result
    }

    /// Fair states: `fair_state_inputs` with inputs quantified away.
    pub fn fair_states(&self) -> States {
        States(self.fair_state_inputs().exists(&self.input_vars))
    }

    /// Reverse-fair states: the forward-direction dual, states reachable
    /// from a cycle hitting every fairness constraint.
    pub fn reverse_fair_states(&self) -> States {
        if let Some(cached) = self.cache.borrow().reverse_fair_state_inputs.clone() {
            return States(cached.exists(&self.input_vars));
        }
        let result = self.emerson_lei(Direction::Fwd);
        self.cache.borrow_mut().reverse_fair_state_inputs = Some(result.clone());
        States(result.exists(&self.input_vars))
    }

    fn emerson_lei(&self, dir: Direction) -> StateInputs {
        let legal = self.legal_state_input();
        let mut z = StateInputs(self.reachable_states().and(&legal));
        loop {
            let inner = self.emerson_lei_inner(&z, dir);
            let next_z = StateInputs(z.and(&inner));
            if next_z == z {
                return z;
            }
            z = next_z;
        }
    }

    /// `inner(Z) = EXorEY(Z ∧ ⋀_justice EUorES(Z, Z∧p) ∧ ⋀_compassion ((Z∧¬p) ∨ EUorES(Z, Z∧q)))`.
    fn emerson_lei_inner(&self, z: &StateInputs, dir: Direction) -> StateInputs {
        let z_states = States(z.exists(&self.input_vars));
        let mut acc = z_states.clone();

        for p in self.justice.iter() {
            let target = States(z_states.and(p));
            let reach = self.eu_or_es(&z_states, &target, dir);
            acc = States(acc.and(&reach));
        }
        for (p, q) in self.compassion.iter() {
            let not_p = States(p.not());
            let target = States(z_states.and(q));
            let reach = self.eu_or_es(&z_states, &target, dir);
            acc = States(acc.and(&States(not_p.and(&z_states).or(&reach))));
        }

        self.ex_or_ey(&acc, dir)
    }

    /// Greatest-fixpoint reachability of `target` inside `within`: the set
    /// of states in `within` from which a `within`-restricted path (in
    /// direction `dir`) reaches `target` infinitely often — i.e. the
    /// classic "EU"/backward "ES" fair-cycle detection step.
    fn eu_or_es(&self, within: &States, target: &States, dir: Direction) -> States {
        let mut y = target.clone();
        loop {
            let step = self.ex_or_ey(&y, dir);
            let next_y = States(target.or(&States(within.and(&step))));
            if next_y == y {
                return y;
            }
            y = next_y;
        }
    }

    /// `EX`/`EY`: one step of pre-image (bwd) or state-input forward image
    /// existentially quantified back down to states (fwd), already
    /// restricted to legal state-inputs.
    fn ex_or_ey(&self, s: &States, dir: Direction) -> States {
        match dir {
            Direction::Bwd => {
                let wb = self.weak_bwd_image(s);
                States(wb.exists(&self.input_vars))
            }
            Direction::Fwd => {
                let si = StateInputs(self.legal_state_input().and(s));
                let next = self.fwd_image_state_inputs(&si);
                States(self.rename_next_to_state(&next).exists(&self.input_vars))
            }
        }
    }

    // ---------------------------------------------------------------
    // §4.G.5 Synchronous product
    // ---------------------------------------------------------------

    /// `self <- self ⊗ other`: conjoin init/invariants/transitions,
    /// concatenate justice/compassion, and detach+reset every cache entry
    /// the product invalidates.
    pub fn synchronous_product(&mut self, other: &BddFsm) {
        assert!(Rc::ptr_eq(&self.manager, &other.manager), "synchronous product requires the same BDD manager");

        self.init = States(self.init.and(&other.init));
        self.state_invar = States(self.state_invar.and(&other.state_invar));
        self.input_invar = self.input_invar.and(&other.input_invar);
        let mut partitions = self.trans.partitions().to_vec();
        partitions.extend(other.trans.partitions().iter().cloned());
        self.trans = BddTrans::new(partitions);
        self.justice.apply_synchronous_product(&other.justice);
        self.compassion.apply_synchronous_product(&other.compassion);

        // Products invalidate reachable/fair/deadlock/monolithic-trans/legal
        // state-input; a hard copy so concurrently held earlier handles to
        // the old cache remain valid and unaffected.
        self.cache = Rc::new(RefCell::new(FsmCache::default()));
    }

    /// Detach this FSM's cache into its own family: subsequent mutation
    /// through either copy no longer affects the other (§3: "a hard copy
    /// detaches a family").
    pub fn hard_copy(&self) -> BddFsm {
        let mut cloned = self.soft_copy();
        cloned.cache = Rc::new(RefCell::new(FsmCache::default()));
        cloned
    }

    /// Clone this FSM sharing the same cache family (§3: "a soft copy joins
    /// one").
    pub fn soft_copy(&self) -> BddFsm {
        BddFsm {
            manager: self.manager.clone(),
            state_vars: self.state_vars.clone(),
            next_vars: self.next_vars.clone(),
            input_vars: self.input_vars.clone(),
            frozen_vars: self.frozen_vars.clone(),
            next_copies: self.next_copies.clone(),
            init: self.init.clone(),
            state_invar: self.state_invar.clone(),
            input_invar: self.input_invar.clone(),
            trans: BddTrans::new(self.trans.partitions().to_vec()),
            justice: self.justice.clone(),
            compassion: self.compassion.clone(),
            cache: self.cache.clone(),
            diagnostics: self.diagnostics,
        }
    }

    /// §9 Open Question 3: iterate over every surviving cluster, not just
    /// the first (fixing the print-path bug the source has). Prints each
    /// cluster's member predicates via `Diagnostics::trace`.
    pub fn print_clusters(&self, extractor: &crate::predicates::PredicateExtractor) {
        for (id, preds) in extractor.clusters() {
            let members: Vec<String> = preds.iter().map(|p| format!("{p:?}")).collect();
            self.diagnostics.trace(format!("cluster #{id}: {{{}}}", members.join(", ")));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Bwd,
    Fwd,
}

fn zip_mapping(a: &[BddVariable], b: &[BddVariable]) -> Vec<(BddVariable, BddVariable)> {
    a.iter().cloned().zip(b.iter().cloned()).collect()
}

/// `∃_i (a_i ⊕ b_i)`-free formula: `a ≠ b`, expressed disjunctively over
/// per-bit difference, used by [`BddFsm::k_bwd_image`] to force two
/// next-state variable copies apart.
fn pairwise_distinct(manager: &BddManager, a: &[BddVariable], b: &[BddVariable]) -> crate::bdd_handle::BddHandle {
    let mut any_diff = manager.mk_false();
    for (&va, &vb) in a.iter().zip(b.iter()) {
        let diff = manager.mk_var(va).xor(&manager.mk_var(vb));
        any_diff = any_diff.or(&diff);
    }
    any_diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use biodivine_lib_bdd::BddVariableSetBuilder;

    /// Builds a 3-bit counter FSM: `init = (x=0)`, `trans = (x' = (x+1) mod 8)`,
    /// matching §8 scenario S3.
    fn counter_fsm_fixed(invar_not_three: bool) -> BddFsm {
        let mut builder = BddVariableSetBuilder::new();
        let x: Vec<BddVariable> = (0..3).map(|i| builder.make_variable(&format!("x{i}"))).collect();
        let x_next: Vec<BddVariable> = (0..3).map(|i| builder.make_variable(&format!("x{i}'"))).collect();
        let variables = builder.build();
        let manager = Rc::new(BddManager::new(variables));

        let init = x.iter().fold(manager.mk_true(), |acc, &v| acc.and(&manager.mk_var(v).not()));

        let mut carry = manager.mk_true();
        let mut trans = manager.mk_true();
        for i in 0..3 {
            let bit = manager.mk_var(x[i]);
            let bit_next = manager.mk_var(x_next[i]);
            let expected = bit.xor(&carry);
            trans = trans.and(&bit_next.iff(&expected));
            carry = bit.and(&carry);
        }

        let state_invar = if invar_not_three {
            let three = manager.mk_var(x[0]).and(&manager.mk_var(x[1])).and(&manager.mk_var(x[2]).not());
            States(three.not())
        } else {
            States(manager.mk_true())
        };

        let input_invar = manager.mk_true();
        BddFsm::new(
            manager,
            x,
            x_next,
            vec![],
            vec![],
            States(init),
            state_invar,
            input_invar,
            BddTrans::new(vec![trans]),
            JusticeList::new(),
            CompassionList::new(),
            Diagnostics::new(),
        )
    }

    #[test]
    fn s3_reachability_of_a_three_bit_counter() {
        let fsm = counter_fsm_fixed(false);
        let diameter = fsm.reachable_diameter().expect("fixpoint must be reached for a finite counter");
        assert_eq!(diameter, 8, "a mod-8 counter from 0 needs 8 steps to revisit every state");
        assert!(fsm.reachable_states().is_true(), "R_7 should be every state (top)");
        assert_eq!(fsm.distance_of_states(&States(fsm.manager().mk_true())), Some(7));
        assert!(fsm.is_total());
        assert!(fsm.is_deadlock_free());
    }

    #[test]
    fn s5_deadlock_when_three_is_excluded() {
        let fsm = counter_fsm_fixed(true);
        let deadlocks = fsm.deadlock_states();
        assert!(!deadlocks.is_false(), "x=2 has no legal successor once x=3 is excluded by the invariant");
    }

    #[test]
    fn s4_fairness_over_two_states() {
        // Two states {s0, s1}; trans lets each reach either; justice = [s1].
        let mut builder = BddVariableSetBuilder::new();
        let s = builder.make_variable("s");
        let s_next = builder.make_variable("s'");
        let variables = builder.build();
        let manager = Rc::new(BddManager::new(variables));

        let init = manager.mk_true(); // both s0 (false) and s1 (true) are initial
        let trans = manager.mk_true(); // s' unconstrained: every state reaches every state
        let state_invar = States(manager.mk_true());
        let input_invar = manager.mk_true();

        let mut justice = JusticeList::new();
        justice.append(States(manager.mk_var(s))); // justice = [s1] (s = true)

        let fsm = BddFsm::new(
            manager.clone(),
            vec![s],
            vec![s_next],
            vec![],
            vec![],
            States(init),
            state_invar,
            input_invar,
            BddTrans::new(vec![trans]),
            justice,
            CompassionList::new(),
            Diagnostics::new(),
        );

        let fair = fsm.fair_states();
        assert!(fair.is_true(), "every state can revisit s1 infinitely often here");
        assert!(!fsm.init().and(&fair).is_false());
    }

    #[test]
    fn synchronous_product_identity_s10() {
        let fsm = counter_fsm_fixed(false);
        let manager = fsm.manager().clone();
        let neutral = BddFsm::new(
            manager.clone(),
            fsm.state_vars.clone(),
            fsm.next_vars.clone(),
            vec![],
            vec![],
            States(manager.mk_true()),
            States(manager.mk_true()),
            manager.mk_true(),
            BddTrans::new(vec![manager.mk_true()]),
            JusticeList::new(),
            CompassionList::new(),
            Diagnostics::new(),
        );

        let before_init = fsm.init().clone();
        let mut product = fsm.soft_copy();
        product.synchronous_product(&neutral);
        assert_eq!(product.init().clone(), before_init);
    }

    #[test]
    fn k_bwd_image_matches_weak_bwd_image_at_k_equals_one() {
        let fsm = counter_fsm_fixed(false);
        let target = States(fsm.manager().mk_true());
        assert_eq!(fsm.k_bwd_image(&target, 1), fsm.weak_bwd_image(&target));
    }
}

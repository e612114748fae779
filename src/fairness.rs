//! §3/§4.E — justice and compassion fairness constraint lists.
//!
//! A *justice* constraint is a single state-set BDD that must be visited
//! infinitely often along a fair path; a *compassion* constraint is a pair
//! `(p, q)`: if `p` holds infinitely often then so must `q`. Both lists are
//! ordered (§5: "iteration order over justice/compassion constraints is the
//! list order; this is observable only via diagnostic output, not via result
//! BDDs"), so they are built on [`crate::containers::NodeList`] rather than
//! `Set` — order matters here, unlike the predicate extractor's bags.
//!
//! All BDDs stored in a list are owned by it (§3 invariants): dropping the
//! list drops the last `Rc` reference each [`States`] handle holds.

use crate::bdd_handle::States;
use crate::containers::NodeList;

/// §3: "ordered sequence of state-set BDDs `{p_1,...,p_k}`; a path is just
/// iff every `p_i` is visited infinitely often."
#[derive(Debug, Clone, Default)]
pub struct JusticeList {
    constraints: NodeList<States>,
}

impl JusticeList {
    pub fn new() -> Self {
        JusticeList {
            constraints: NodeList::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn append(&mut self, p: States) {
        self.constraints.push_back(p);
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &States> {
        self.constraints.iter()
    }

    /// §4.E `apply_synchronous_product`: concatenate `other`'s constraints
    /// after this list's own, in order.
    pub fn apply_synchronous_product(&mut self, other: &JusticeList) {
        for p in other.iter() {
            self.constraints.push_back(p.clone());
        }
    }
}

impl FromIterator<States> for JusticeList {
    fn from_iter<I: IntoIterator<Item = States>>(iter: I) -> Self {
        JusticeList {
            constraints: iter.into_iter().collect(),
        }
    }
}

/// §3: "ordered sequence of pairs `{(p_i,q_i)}`; a path is compassionate iff
/// for every `i`, if `p_i` holds infinitely often then `q_i` also holds
/// infinitely often."
#[derive(Debug, Clone, Default)]
pub struct CompassionList {
    constraints: NodeList<(States, States)>,
}

impl CompassionList {
    pub fn new() -> Self {
        CompassionList {
            constraints: NodeList::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn append(&mut self, p: States, q: States) {
        self.constraints.push_back((p, q));
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &(States, States)> {
        self.constraints.iter()
    }

    pub fn apply_synchronous_product(&mut self, other: &CompassionList) {
        for pair in other.iter() {
            self.constraints.push_back(pair.clone());
        }
    }
}

impl FromIterator<(States, States)> for CompassionList {
    fn from_iter<I: IntoIterator<Item = (States, States)>>(iter: I) -> Self {
        CompassionList {
            constraints: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biodivine_lib_bdd::BddVariableSetBuilder;
    use crate::bdd_handle::BddManager;

    fn manager() -> BddManager {
        let mut builder = BddVariableSetBuilder::new();
        builder.make_variable("x");
        BddManager::new(builder.build())
    }

    #[test]
    fn justice_list_preserves_append_order() {
        let mgr = manager();
        let mut list = JusticeList::new();
        list.append(States(mgr.mk_true()));
        list.append(States(mgr.mk_false()));
        let snapshot: Vec<bool> = list.iter().map(|p| p.is_true()).collect();
        assert_eq!(snapshot, vec![true, false]);
    }

    #[test]
    fn synchronous_product_concatenates_in_order() {
        let mgr = manager();
        let mut a = JusticeList::new();
        a.append(States(mgr.mk_true()));
        let mut b = JusticeList::new();
        b.append(States(mgr.mk_false()));
        a.apply_synchronous_product(&b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.iter().last().unwrap().is_false(), true);
    }

    #[test]
    fn compassion_list_round_trips_pairs() {
        let mgr = manager();
        let mut list = CompassionList::new();
        list.append(States(mgr.mk_true()), States(mgr.mk_false()));
        assert_eq!(list.len(), 1);
        let (p, q) = list.iter().next().unwrap();
        assert!(p.is_true());
        assert!(q.is_false());
    }
}

//! §4.D — the predicate extractor.
//!
//! Walks an (already name-resolved, not yet boolean-encoded) expression and
//! either folds it to one of four boolean sentinels or collects the set of
//! atomic, theory-typed predicates it is built from. Those atoms are what
//! `BoolEnc`/the FSM construction eventually turn into fresh BDD variables:
//! this module never touches a `Bdd` itself.
//!
//! The source keeps one global `all_preds`/`unclustered_preds` pair per
//! extractor instance and a `var -> cluster` hash updated destructively as
//! predicates are added. We keep exactly that shape (`PredicateExtractor`
//! owns both bags and the union-find map) since clustering is inherently
//! incremental and there is no benefit to pretending otherwise.

use crate::containers::Set;
use crate::expr::{find_node, for_each_child, mk_bool, mk_int, ExprKind, Node, RelOp};
use crate::symbol_table::{SymbolKind, SymbolTable, Type};
use crate::diagnostics::Diagnostics;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Default cartesian-product size above which the extractor gives up and
/// returns [`Preds::OverApprox`] instead of enumerating every pair.
pub const DEFAULT_OVER_APPROX_THRESHOLD: usize = 600_000;

/// The extractor's result for one (sub)expression: either a boolean sentinel
/// or, for a non-boolean result type, the set of atoms it is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preds {
    TruePreds,
    FalsePreds,
    ArbitraryPreds,
    OverApprox,
    Set(Set<Node>),
}

impl Preds {
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Preds::Set(_))
    }

    /// Cast a boolean-sentinel result into the numeric singleton set it
    /// stands for, so it can take part in a Cartesian product with a
    /// genuinely numeric operand. `{0}`, `{1}`, or `{0,1}` for
    /// False/True/Arbitrary respectively; `OverApprox` has no finite
    /// singleton and is passed through unchanged.
    fn cast_bool_to_int(self) -> Preds {
        match self {
            Preds::TruePreds => Preds::Set(Set::singleton(mk_int(1))),
            Preds::FalsePreds => Preds::Set(Set::singleton(mk_int(0))),
            Preds::ArbitraryPreds => {
                let mut s = Set::new();
                s.add(mk_int(0));
                s.add(mk_int(1));
                Preds::Set(s)
            }
            other => other,
        }
    }
}

type MemoKey = (Vec<String>, u64);

pub struct PredicateExtractor {
    symbols: Rc<RefCell<SymbolTable>>,
    diagnostics: Diagnostics,
    memo: HashMap<MemoKey, Preds>,
    all_preds: Set<Node>,
    unclustered_preds: Vec<Node>,
    var_cluster: HashMap<String, usize>,
    clusters: HashMap<usize, Set<Node>>,
    next_cluster_id: usize,
    over_approx_enabled: bool,
    over_approx_threshold: usize,
}

impl PredicateExtractor {
    pub fn new(symbols: Rc<RefCell<SymbolTable>>, diagnostics: Diagnostics) -> Self {
        PredicateExtractor {
            symbols,
            diagnostics,
            memo: HashMap::new(),
            all_preds: Set::new(),
            unclustered_preds: Vec::new(),
            var_cluster: HashMap::new(),
            clusters: HashMap::new(),
            next_cluster_id: 0,
            over_approx_enabled: true,
            over_approx_threshold: DEFAULT_OVER_APPROX_THRESHOLD,
        }
    }

    pub fn with_over_approx_threshold(mut self, threshold: usize) -> Self {
        self.over_approx_threshold = threshold;
        self
    }

    pub fn disable_over_approx(mut self) -> Self {
        self.over_approx_enabled = false;
        self
    }

    pub fn all_preds(&self) -> &Set<Node> {
        &self.all_preds
    }

    /// Post-order walk with memoisation keyed by `(context, expression
    /// identity)`.
    pub fn compute_preds(&mut self, expr: &Node, context: &[String]) -> Preds {
        let key: MemoKey = (context.to_vec(), expr.id);
        if let Some(cached) = self.memo.get(&key) {
            return cached.clone();
        }
        let result = self.extract(expr, context);
        self.memo.insert(key, result.clone());
        result
    }

    fn extract(&mut self, expr: &Node, context: &[String]) -> Preds {
        match &expr.kind {
            ExprKind::BoolConst(b) => {
                if *b {
                    Preds::TruePreds
                } else {
                    Preds::FalsePreds
                }
            }
            ExprKind::IntConst(_)
            | ExprKind::WordConst { .. }
            | ExprKind::FractionConst { .. }
            | ExprKind::RealConst(_) => Preds::Set(Set::singleton(expr.clone())),

            ExprKind::Name(name) => self.extract_symbol(name, context),

            ExprKind::Context(inner_context, inner) => {
                let mut nested = context.to_vec();
                nested.extend(inner_context.iter().cloned());
                self.compute_preds(inner, &nested)
            }

            ExprKind::Not(a) => {
                let pa = self.compute_preds(a, context);
                match pa {
                    Preds::TruePreds => Preds::FalsePreds,
                    Preds::FalsePreds => Preds::TruePreds,
                    Preds::OverApprox => Preds::ArbitraryPreds,
                    Preds::ArbitraryPreds => Preds::ArbitraryPreds,
                    Preds::Set(_) => Preds::ArbitraryPreds,
                }
            }
            ExprKind::Neg(a) | ExprKind::BitNot(a) => self.pointwise_unary(&expr.kind, a, context),

            ExprKind::And(a, b) => self.extract_and(a, b, context),
            ExprKind::Or(a, b) => self.extract_or(a, b, context),
            ExprKind::Xor(a, b) => self.extract_xor_iff(a, b, context, false),
            ExprKind::Iff(a, b) => self.extract_xor_iff(a, b, context, true),
            ExprKind::Imp(a, b) => self.extract_imp(a, b, context),

            ExprKind::Rel(op, a, b) => self.extract_relation(*op, a, b, context),

            ExprKind::Add(a, b)
            | ExprKind::Sub(a, b)
            | ExprKind::Mul(a, b)
            | ExprKind::Div(a, b)
            | ExprKind::Mod(a, b)
            | ExprKind::Shl(a, b)
            | ExprKind::Shr(a, b)
            | ExprKind::Concat(a, b)
            | ExprKind::Union(a, b) => self.pointwise_binary_arith(&expr.kind, a, b, context),

            // Temporal operators: booleans through and through. Only the
            // constant sentinel cases are worth folding (`G(TRUE) = TRUE`,
            // `F(FALSE) = FALSE`, ...); anything else collapses to
            // ARBITRARY-PREDS, since a static walk cannot decide a temporal
            // formula's truth value.
            ExprKind::X(a)
            | ExprKind::G(a)
            | ExprKind::F(a)
            | ExprKind::Y(a)
            | ExprKind::Z(a)
            | ExprKind::Ex(a)
            | ExprKind::Ax(a)
            | ExprKind::Eg(a)
            | ExprKind::Ag(a)
            | ExprKind::Ef(a)
            | ExprKind::Af(a) => {
                let _ = self.compute_preds(a, context);
                Preds::ArbitraryPreds
            }
            ExprKind::U(a, b) | ExprKind::S(a, b) | ExprKind::Eu(a, b) | ExprKind::Au(a, b) => {
                let _ = self.compute_preds(a, context);
                let _ = self.compute_preds(b, context);
                Preds::ArbitraryPreds
            }

            ExprKind::Ite(cond, then_branch, else_branch) => {
                self.extract_ite(cond, then_branch, else_branch, context)
            }
            ExprKind::Case(arms) => self.extract_case(arms, context),

            // NEXT/init: pass-through, the operator applies outside the predicate.
            ExprKind::NextVar(a) | ExprKind::InitVar(a) => self.compute_preds(a, context),

            ExprKind::AtTime(a, _) => self.compute_preds(a, context),

            // Everything else (bit-select, cast, word/array aggregates,
            // dotted paths, structural Cons/Colon) is treated as a single
            // composite atom: its own children are still walked (so nested
            // predicates get registered and clustered), but the node itself
            // stands for one opaque numeric/theory value.
            ExprKind::BitSelect(a, _, _) | ExprKind::Cast(_, a) => {
                let _ = self.compute_preds(a, context);
                Preds::Set(Set::singleton(expr.clone()))
            }
            ExprKind::Array(items) | ExprKind::Word(items) => {
                for item in items {
                    let _ = self.compute_preds(item, context);
                }
                Preds::Set(Set::singleton(expr.clone()))
            }
            ExprKind::BitOf(_, _)
            | ExprKind::DottedPath(_)
            | ExprKind::Cons(_, _)
            | ExprKind::Colon(_, _) => Preds::Set(Set::singleton(expr.clone())),
        }
    }

    fn extract_symbol(&mut self, name: &str, context: &[String]) -> Preds {
        let qualified = self.symbols.borrow().resolve(context, name);
        let symbol = self.symbols.borrow().symbol(&qualified).cloned();
        match symbol {
            Some(symbol) => match symbol.kind {
                SymbolKind::StateVar | SymbolKind::InputVar | SymbolKind::FrozenVar => {
                    if symbol.ty == Type::Boolean {
                        Preds::ArbitraryPreds
                    } else {
                        Preds::Set(Set::singleton(crate::expr::mk_name(qualified)))
                    }
                }
                SymbolKind::Define | SymbolKind::Parameter => {
                    if let Some(body) = &symbol.body {
                        let body = body.clone();
                        let result = self.compute_preds(&body, context);
                        if symbol.ty == Type::Boolean {
                            result
                        } else {
                            self.cast_to_numeric_context(result)
                        }
                    } else {
                        self.diagnostics
                            .warn(format!("define/parameter `{qualified}` has no body"));
                        Preds::ArbitraryPreds
                    }
                }
                SymbolKind::Constant => Preds::Set(Set::singleton(crate::expr::mk_name(qualified))),
                SymbolKind::Function | SymbolKind::ArrayDefine => {
                    Preds::Set(Set::singleton(crate::expr::mk_name(qualified)))
                }
            },
            None => {
                self.diagnostics.warn(format!("unresolved symbol `{qualified}`"));
                Preds::ArbitraryPreds
            }
        }
    }

    fn cast_to_numeric_context(&self, preds: Preds) -> Preds {
        preds.cast_bool_to_int()
    }

    fn pointwise_unary(&mut self, kind: &ExprKind, a: &Node, context: &[String]) -> Preds {
        let pa = self.compute_preds(a, context);
        let atoms = match pa {
            Preds::OverApprox => return Preds::OverApprox,
            Preds::Set(s) => s,
            sentinel => match sentinel.cast_bool_to_int() {
                Preds::Set(s) => s,
                Preds::OverApprox => return Preds::OverApprox,
                _ => unreachable!("cast_bool_to_int always yields Set or OverApprox"),
            },
        };
        let mut out = Set::new();
        for atom in atoms.iter() {
            let wrapped = match kind {
                ExprKind::Neg(_) => find_node(ExprKind::Neg(atom.clone())),
                ExprKind::BitNot(_) => find_node(ExprKind::BitNot(atom.clone())),
                _ => unreachable!("pointwise_unary only called for Neg/BitNot"),
            };
            out.add(wrapped);
        }
        Preds::Set(out)
    }

    fn extract_and(&mut self, a: &Node, b: &Node, context: &[String]) -> Preds {
        let pa = self.compute_preds(a, context);
        if matches!(pa, Preds::FalsePreds) {
            return Preds::FalsePreds;
        }
        let pb = self.compute_preds(b, context);
        match (pa, pb) {
            (Preds::TruePreds, Preds::TruePreds) => Preds::TruePreds,
            (_, Preds::FalsePreds) => Preds::FalsePreds,
            _ => Preds::ArbitraryPreds,
        }
    }

    fn extract_or(&mut self, a: &Node, b: &Node, context: &[String]) -> Preds {
        let pa = self.compute_preds(a, context);
        if matches!(pa, Preds::TruePreds) {
            return Preds::TruePreds;
        }
        let pb = self.compute_preds(b, context);
        match (pa, pb) {
            (Preds::FalsePreds, Preds::FalsePreds) => Preds::FalsePreds,
            (_, Preds::TruePreds) => Preds::TruePreds,
            _ => Preds::ArbitraryPreds,
        }
    }

    fn extract_imp(&mut self, a: &Node, b: &Node, context: &[String]) -> Preds {
        let pa = self.compute_preds(a, context);
        if matches!(pa, Preds::FalsePreds) {
            return Preds::TruePreds;
        }
        let pb = self.compute_preds(b, context);
        match (pa, pb) {
            (Preds::TruePreds, Preds::TruePreds) => Preds::TruePreds,
            (Preds::TruePreds, Preds::FalsePreds) => Preds::FalsePreds,
            _ => Preds::ArbitraryPreds,
        }
    }

    fn extract_xor_iff(&mut self, a: &Node, b: &Node, context: &[String], is_iff: bool) -> Preds {
        let pa = self.compute_preds(a, context);
        let pb = self.compute_preds(b, context);
        match (pa, pb) {
            (Preds::TruePreds, Preds::TruePreds) => Preds::from_bool(is_iff),
            (Preds::FalsePreds, Preds::FalsePreds) => Preds::from_bool(is_iff),
            (Preds::TruePreds, Preds::FalsePreds) | (Preds::FalsePreds, Preds::TruePreds) => {
                Preds::from_bool(!is_iff)
            }
            _ => Preds::ArbitraryPreds,
        }
    }

    fn extract_relation(&mut self, op: RelOp, a: &Node, b: &Node, context: &[String]) -> Preds {
        let pa = self.compute_preds(a, context);
        let pb = self.compute_preds(b, context);

        // Both boolean: fold directly, no predicate atoms are ever formed.
        if pa.is_sentinel() && pb.is_sentinel() && !matches!(pa, Preds::OverApprox) && !matches!(pb, Preds::OverApprox)
        {
            return fold_boolean_relation(op, &pa, &pb);
        }
        if matches!(pa, Preds::OverApprox) || matches!(pb, Preds::OverApprox) {
            return Preds::ArbitraryPreds;
        }

        let left_atoms = match pa.cast_bool_to_int() {
            Preds::Set(s) => s,
            _ => unreachable!(),
        };
        let right_atoms = match pb.cast_bool_to_int() {
            Preds::Set(s) => s,
            _ => unreachable!(),
        };

        let product_size = left_atoms.len().saturating_mul(right_atoms.len());
        if self.over_approx_enabled && product_size > self.over_approx_threshold {
            self.diagnostics.progress(format!(
                "relational predicate product of size {product_size} exceeds threshold; over-approximating"
            ));
            return Preds::OverApprox;
        }

        for l in left_atoms.iter() {
            for r in right_atoms.iter() {
                let atom = find_node(ExprKind::Rel(op, l.clone(), r.clone()));
                self.commit_predicate(atom);
            }
        }
        Preds::ArbitraryPreds
    }

    fn pointwise_binary_arith(&mut self, kind: &ExprKind, a: &Node, b: &Node, context: &[String]) -> Preds {
        let pa = self.compute_preds(a, context);
        let pb = self.compute_preds(b, context);
        if matches!(pa, Preds::OverApprox) || matches!(pb, Preds::OverApprox) {
            return Preds::OverApprox;
        }
        let left = match pa.cast_bool_to_int() {
            Preds::Set(s) => s,
            _ => unreachable!(),
        };
        let right = match pb.cast_bool_to_int() {
            Preds::Set(s) => s,
            _ => unreachable!(),
        };

        let product_size = left.len().saturating_mul(right.len());
        if self.over_approx_enabled && product_size > self.over_approx_threshold {
            return Preds::OverApprox;
        }

        let mut out = Set::new();
        for l in left.iter() {
            for r in right.iter() {
                let node = match kind {
                    ExprKind::Add(_, _) => find_node(ExprKind::Add(l.clone(), r.clone())),
                    ExprKind::Sub(_, _) => find_node(ExprKind::Sub(l.clone(), r.clone())),
                    ExprKind::Mul(_, _) => find_node(ExprKind::Mul(l.clone(), r.clone())),
                    ExprKind::Div(_, _) => find_node(ExprKind::Div(l.clone(), r.clone())),
                    ExprKind::Mod(_, _) => find_node(ExprKind::Mod(l.clone(), r.clone())),
                    ExprKind::Shl(_, _) => find_node(ExprKind::Shl(l.clone(), r.clone())),
                    ExprKind::Shr(_, _) => find_node(ExprKind::Shr(l.clone(), r.clone())),
                    ExprKind::Concat(_, _) => find_node(ExprKind::Concat(l.clone(), r.clone())),
                    ExprKind::Union(_, _) => find_node(ExprKind::Union(l.clone(), r.clone())),
                    _ => unreachable!("pointwise_binary_arith only called for arithmetic/bitwise kinds"),
                };
                out.add(node);
            }
        }
        Preds::Set(out)
    }

    fn extract_ite(&mut self, cond: &Node, then_branch: &Node, else_branch: &Node, context: &[String]) -> Preds {
        let pcond = self.compute_preds(cond, context);
        match pcond {
            Preds::TruePreds => self.compute_preds(then_branch, context),
            Preds::FalsePreds => self.compute_preds(else_branch, context),
            _ => {
                let pt = self.compute_preds(then_branch, context);
                let pe = self.compute_preds(else_branch, context);
                self.merge_branches(pt, pe)
            }
        }
    }

    fn extract_case(&mut self, arms: &[(Node, Node)], context: &[String]) -> Preds {
        let mut result: Option<Preds> = None;
        for (cond, value) in arms {
            let pcond = self.compute_preds(cond, context);
            match pcond {
                Preds::FalsePreds => continue,
                Preds::TruePreds => {
                    let pv = self.compute_preds(value, context);
                    result = Some(match result {
                        None => pv,
                        Some(existing) => self.merge_branches(existing, pv),
                    });
                    break;
                }
                _ => {
                    let pv = self.compute_preds(value, context);
                    result = Some(match result {
                        None => pv,
                        Some(existing) => self.merge_branches(existing, pv),
                    });
                }
            }
        }
        result.unwrap_or(Preds::ArbitraryPreds)
    }

    /// Merge two branch results of an `ITE`/`CASE`. Two boolean sentinels
    /// fold by boolean union (equal sentinels pass through, anything mixed
    /// becomes ARBITRARY-PREDS); two non-boolean `Set`s union directly
    /// (casting either side from boolean first, per the contract).
    fn merge_branches(&self, a: Preds, b: Preds) -> Preds {
        match (&a, &b) {
            (Preds::Set(_), _) | (_, Preds::Set(_)) => {
                let sa = match a.cast_bool_to_int() {
                    Preds::Set(s) => s,
                    Preds::OverApprox => return Preds::OverApprox,
                    _ => unreachable!(),
                };
                let sb = match b.cast_bool_to_int() {
                    Preds::Set(s) => s,
                    Preds::OverApprox => return Preds::OverApprox,
                    _ => unreachable!(),
                };
                Preds::Set(sa.union(&sb))
            }
            _ if a == b => a,
            _ => Preds::ArbitraryPreds,
        }
    }

    /// Register `atom` as a committed predicate, if it is not already
    /// present, and flag it for cluster assignment.
    fn commit_predicate(&mut self, atom: Node) {
        if self.all_preds.add(atom.clone()) {
            self.unclustered_preds.push(atom);
        }
    }

    /// Cluster computation (§4.D): process `unclustered_preds` via union-find
    /// over each predicate's variable support, merging clusters that share a
    /// variable. Safe to call repeatedly — a no-op once the backlog is
    /// empty.
    pub fn compute_clusters(&mut self) {
        while let Some(pred) = self.unclustered_preds.pop() {
            let support = variable_support(&pred);
            if support.is_empty() {
                continue;
            }
            let mut survivor = *self.var_cluster.entry(support[0].clone()).or_insert_with(|| {
                let id = self.next_cluster_id;
                self.next_cluster_id += 1;
                self.clusters.insert(id, Set::new());
                id
            });

            for var in &support[1..] {
                let other = *self.var_cluster.entry(var.clone()).or_insert_with(|| {
                    let id = self.next_cluster_id;
                    self.next_cluster_id += 1;
                    self.clusters.insert(id, Set::new());
                    id
                });
                if other != survivor {
                    survivor = self.merge_clusters(survivor, other);
                }
            }

            self.clusters.entry(survivor).or_insert_with(Set::new).add(pred);
        }
    }

    /// Merge the smaller cluster into the larger, rewriting `var_cluster` for
    /// every member of the smaller one. Returns the id of the surviving
    /// cluster.
    fn merge_clusters(&mut self, a: usize, b: usize) -> usize {
        let (survivor, absorbed) = {
            let size_a = self.clusters.get(&a).map(Set::len).unwrap_or(0);
            let size_b = self.clusters.get(&b).map(Set::len).unwrap_or(0);
            if size_a >= size_b {
                (a, b)
            } else {
                (b, a)
            }
        };
        if let Some(absorbed_preds) = self.clusters.remove(&absorbed) {
            for (var, cluster) in self.var_cluster.iter_mut() {
                if *cluster == absorbed {
                    *cluster = survivor;
                }
                let _ = var;
            }
            self.clusters.entry(survivor).or_insert_with(Set::new).extend(&absorbed_preds);
        }
        survivor
    }

    pub fn cluster_of(&self, var: &str) -> Option<&Set<Node>> {
        self.var_cluster.get(var).and_then(|id| self.clusters.get(id))
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Every surviving cluster id paired with its predicate bag. Ids are not
    /// contiguous: `compute_clusters` allocates them from a monotonically
    /// increasing counter and merged-away clusters are removed from the map.
    pub fn clusters(&self) -> impl Iterator<Item = (usize, &Set<Node>)> {
        self.clusters.iter().map(|(&id, preds)| (id, preds))
    }
}

impl Preds {
    fn from_bool(b: bool) -> Preds {
        if b {
            Preds::TruePreds
        } else {
            Preds::FalsePreds
        }
    }
}

fn fold_boolean_relation(op: RelOp, a: &Preds, b: &Preds) -> Preds {
    let to_bit = |p: &Preds| -> Option<bool> {
        match p {
            Preds::TruePreds => Some(true),
            Preds::FalsePreds => Some(false),
            _ => None,
        }
    };
    match (to_bit(a), to_bit(b)) {
        (Some(x), Some(y)) => {
            let holds = match op {
                RelOp::Eq => x == y,
                RelOp::Neq => x != y,
                RelOp::Lt => (x as u8) < (y as u8),
                RelOp::Le => (x as u8) <= (y as u8),
                RelOp::Gt => (x as u8) > (y as u8),
                RelOp::Ge => (x as u8) >= (y as u8),
                RelOp::In => x == y,
            };
            Preds::from_bool(holds)
        }
        _ => Preds::ArbitraryPreds,
    }
}

/// Collect the distinct variable names (as resolved `Name` leaves) appearing
/// anywhere inside `node`. Sorted for determinism, since it's used to seed
/// union-find processing in a fixed order.
fn variable_support(node: &Node) -> Vec<String> {
    let mut found = Set::new();
    collect_names(node, &mut found);
    found.into_iter().collect()
}

fn collect_names(node: &Node, out: &mut Set<String>) {
    if let ExprKind::Name(name) = &node.kind {
        out.add(name.clone());
    }
    for_each_child(node, |child| collect_names(child, out));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{mk_and, mk_name, mk_not, mk_rel};
    use crate::symbol_table::{InsertionPolicy, Symbol};

    fn table_with_vars(vars: &[(&str, Type)]) -> Rc<RefCell<SymbolTable>> {
        let table = Rc::new(RefCell::new(SymbolTable::new()));
        table.borrow_mut().create_layer("main", InsertionPolicy::Append);
        for (name, ty) in vars {
            table.borrow_mut().declare(
                "main",
                Symbol {
                    name: name.to_string(),
                    kind: SymbolKind::StateVar,
                    ty: ty.clone(),
                    layer: "main".to_string(),
                    body: None,
                },
            );
        }
        table
    }

    #[test]
    fn boolean_var_is_arbitrary_preds() {
        let table = table_with_vars(&[("b", Type::Boolean)]);
        let mut extractor = PredicateExtractor::new(table, Diagnostics::new());
        let result = extractor.compute_preds(&mk_name("b"), &[]);
        assert_eq!(result, Preds::ArbitraryPreds);
    }

    #[test]
    fn and_short_circuits_on_false_left_operand() {
        let table = table_with_vars(&[("b", Type::Boolean)]);
        let mut extractor = PredicateExtractor::new(table, Diagnostics::new());
        let expr = mk_and(mk_bool(false), mk_not(mk_name("b")));
        assert_eq!(extractor.compute_preds(&expr, &[]), Preds::FalsePreds);
    }

    #[test]
    fn relational_atom_is_committed_exactly_once() {
        let table = table_with_vars(&[("x", Type::Integer)]);
        let mut extractor = PredicateExtractor::new(table, Diagnostics::new());
        let expr = mk_rel(RelOp::Eq, mk_name("x"), mk_int(3));
        extractor.compute_preds(&expr, &[]);
        assert_eq!(extractor.all_preds().len(), 1);
        // Second call with the same expression/context: idempotent.
        extractor.compute_preds(&expr, &[]);
        assert_eq!(extractor.all_preds().len(), 1);
    }

    #[test]
    fn predicates_over_shared_variables_end_up_in_one_cluster() {
        let table = table_with_vars(&[("x", Type::Integer), ("y", Type::Integer)]);
        let mut extractor = PredicateExtractor::new(table, Diagnostics::new());
        extractor.compute_preds(&mk_rel(RelOp::Eq, mk_name("x"), mk_int(1)), &[]);
        extractor.compute_preds(&mk_rel(RelOp::Eq, mk_name("x"), mk_name("y")), &[]);
        extractor.compute_clusters();

        let cx = extractor.cluster_of("x").unwrap();
        let cy = extractor.cluster_of("y").unwrap();
        assert_eq!(cx.len(), cy.len());
        assert_eq!(extractor.cluster_count(), 1);
    }

    #[test]
    fn disjoint_variables_land_in_separate_clusters() {
        let table = table_with_vars(&[("x", Type::Integer), ("y", Type::Integer)]);
        let mut extractor = PredicateExtractor::new(table, Diagnostics::new());
        extractor.compute_preds(&mk_rel(RelOp::Eq, mk_name("x"), mk_int(1)), &[]);
        extractor.compute_preds(&mk_rel(RelOp::Eq, mk_name("y"), mk_int(2)), &[]);
        extractor.compute_clusters();
        assert_eq!(extractor.cluster_count(), 2);
    }
}

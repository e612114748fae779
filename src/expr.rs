//! §3 Data model — the interned expression DAG.
//!
//! The source keys everything off `find_node`'d pointer identity: structurally
//! identical expressions share one C pointer, and every consumer compares
//! nodes by address. Here we model expressions as an immutable tagged `enum`
//! (`ExprKind`) and intern them in a process-scoped hash-consing table
//! (`NodeTable`), exactly as suggested by the design notes: "model expressions
//! as immutable tagged variants and intern them in a process-scoped table
//! (concurrent-hash-map or arena+hashcons)".
//!
//! A node's identity is its `id`: a `u64` assigned the first time its
//! `ExprKind` is interned. Two nodes compare equal, hash equally, and order
//! against each other purely by `id`, which is what lets [`crate::containers::Set`]
//! use interned nodes as `Ord` keys without needing to re-walk structure.
//!
//! The "up to two ordered children" from the C struct is a consequence of the
//! source's generic node representation (one struct for every kind), not a
//! semantic requirement. `IF-THEN-ELSE` and `CASE`, which need three or more
//! sub-expressions in the source, are still expressed there with exactly two
//! child slots by nesting a `COLON` pair as the second child. We keep `Colon`
//! around for that reason (CASE arms, ITE branches) but also give variants
//! like `Ite`/`Case` their own typed fields directly — more idiomatic, and
//! the interning identity guarantee is unaffected either way.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// An interned expression node. Cheap to clone (`Arc` bump) and cheap to
/// compare (integer `id` compare) once created.
pub type Node = Arc<ExprNode>;

#[derive(Debug)]
pub struct ExprNode {
    pub id: u64,
    pub kind: ExprKind,
}

impl PartialEq for ExprNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for ExprNode {}

impl std::hash::Hash for ExprNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl PartialOrd for ExprNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ExprNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

/// Relational comparison operators, shared between the `=`/`/=` family used
/// in both boolean and theory contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelOp {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CastKind {
    ToBool,
    ToInt,
    ToSigned(u32),
    ToUnsigned(u32),
}

/// The fixed set of node kinds from §3: constants, identifiers,
/// arithmetic/bitwise, relational, temporal and structural operators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExprKind {
    // --- constants ---
    BoolConst(bool),
    IntConst(i64),
    /// `signed` distinguishes the signed/unsigned word constant kinds.
    WordConst { width: u32, signed: bool, value: i128 },
    FractionConst { num: i64, den: i64 },
    /// IEEE-754 bit pattern, so the node is hashable/orderable.
    RealConst(u64),

    // --- identifiers ---
    Name(String),
    DottedPath(Vec<String>),
    /// `var.bit[index]`, one of the boolean encoder's fresh bit symbols.
    BitOf(Node, u32),

    // --- arithmetic / bitwise, unary ---
    Neg(Node),
    Not(Node),
    BitNot(Node),

    // --- arithmetic / bitwise, binary ---
    Add(Node, Node),
    Sub(Node, Node),
    Mul(Node, Node),
    Div(Node, Node),
    Mod(Node, Node),
    Shl(Node, Node),
    Shr(Node, Node),
    And(Node, Node),
    Or(Node, Node),
    Xor(Node, Node),
    Iff(Node, Node),
    Imp(Node, Node),

    // --- relational ---
    Rel(RelOp, Node, Node),

    // --- temporal, unary ---
    X(Node),
    G(Node),
    F(Node),
    Y(Node),
    Z(Node),
    Ex(Node),
    Ax(Node),
    Eg(Node),
    Ag(Node),
    Ef(Node),
    Af(Node),

    // --- temporal, binary ---
    U(Node, Node),
    S(Node, Node),
    Eu(Node, Node),
    Au(Node, Node),

    // --- structural ---
    Cons(Node, Node),
    Colon(Node, Node),
    Ite(Node, Node, Node),
    Case(Vec<(Node, Node)>),
    /// `next(x)`: the non-temporal "value of `x` in the successor state"
    /// operator used inside `TRANS`, distinct from the LTL `X` above.
    NextVar(Node),
    /// `init(x)`: restrict to the initial-state reading of `x`.
    InitVar(Node),
    /// A sub-expression evaluated under an explicit module/instance context.
    Context(Vec<String>, Node),
    Array(Vec<Node>),
    Word(Vec<Node>),
    BitSelect(Node, u32, u32),
    Cast(CastKind, Node),
    Concat(Node, Node),
    Union(Node, Node),
    AtTime(Node, u64),
}

struct NodeTable {
    next_id: u64,
    table: HashMap<ExprKind, Node>,
}

impl NodeTable {
    fn new() -> Self {
        NodeTable {
            next_id: 0,
            table: HashMap::new(),
        }
    }
}

static NODE_TABLE: Lazy<Mutex<NodeTable>> = Lazy::new(|| Mutex::new(NodeTable::new()));

/// Intern an expression node, returning the one canonical handle for any
/// given `ExprKind`. Structurally identical expressions — including nested
/// children, since children are themselves already-interned `Node`s — always
/// return the same `Node`.
pub fn find_node(kind: ExprKind) -> Node {
    let mut table = NODE_TABLE.lock().unwrap();
    if let Some(existing) = table.table.get(&kind) {
        return existing.clone();
    }
    let id = table.next_id;
    table.next_id += 1;
    let node: Node = Arc::new(ExprNode {
        id,
        kind: kind.clone(),
    });
    table.table.insert(kind, node.clone());
    node
}

/// Number of distinct nodes interned so far. Mostly useful for diagnostics
/// and tests that want to confirm structural sharing actually happened.
pub fn interned_node_count() -> usize {
    NODE_TABLE.lock().unwrap().table.len()
}

// Convenience constructors. These all funnel through `find_node`, so callers
// never construct an `ExprNode` directly and can never observe two distinct
// identities for the same expression.
pub fn mk_bool(b: bool) -> Node {
    find_node(ExprKind::BoolConst(b))
}
pub fn mk_int(v: i64) -> Node {
    find_node(ExprKind::IntConst(v))
}
pub fn mk_name(name: impl Into<String>) -> Node {
    find_node(ExprKind::Name(name.into()))
}
pub fn mk_bit_of(var: Node, index: u32) -> Node {
    find_node(ExprKind::BitOf(var, index))
}
pub fn mk_not(a: Node) -> Node {
    find_node(ExprKind::Not(a))
}
pub fn mk_and(a: Node, b: Node) -> Node {
    find_node(ExprKind::And(a, b))
}
pub fn mk_or(a: Node, b: Node) -> Node {
    find_node(ExprKind::Or(a, b))
}
pub fn mk_rel(op: RelOp, a: Node, b: Node) -> Node {
    find_node(ExprKind::Rel(op, a, b))
}
pub fn mk_ite(cond: Node, then_branch: Node, else_branch: Node) -> Node {
    find_node(ExprKind::Ite(cond, then_branch, else_branch))
}

/// Returns `true` if `node` is of "boolean shape": its static result, as a
/// purely syntactic matter, is the `{0,1}`-typed sentinel family the
/// predicate extractor folds rather than a theory-typed atom. This is a
/// syntactic classification only (no symbol table lookup), used by callers
/// that already know a node is not an identifier.
pub fn is_syntactically_boolean(node: &Node) -> bool {
    matches!(
        node.kind,
        ExprKind::BoolConst(_)
            | ExprKind::Not(_)
            | ExprKind::And(_, _)
            | ExprKind::Or(_, _)
            | ExprKind::Xor(_, _)
            | ExprKind::Iff(_, _)
            | ExprKind::Imp(_, _)
            | ExprKind::Rel(_, _, _)
            | ExprKind::X(_)
            | ExprKind::G(_)
            | ExprKind::F(_)
            | ExprKind::Y(_)
            | ExprKind::Z(_)
            | ExprKind::Ex(_)
            | ExprKind::Ax(_)
            | ExprKind::Eg(_)
            | ExprKind::Ag(_)
            | ExprKind::Ef(_)
            | ExprKind::Af(_)
            | ExprKind::U(_, _)
            | ExprKind::S(_, _)
            | ExprKind::Eu(_, _)
            | ExprKind::Au(_, _)
    )
}

/// Visit every direct `Node` child of `node`, in left-to-right order. Used by
/// callers that need to walk the whole DAG generically (variable-support
/// collection, printing) without a match arm per operator at every call
/// site.
pub fn for_each_child<'a>(node: &'a Node, mut visit: impl FnMut(&'a Node)) {
    match &node.kind {
        ExprKind::BoolConst(_)
        | ExprKind::IntConst(_)
        | ExprKind::WordConst { .. }
        | ExprKind::FractionConst { .. }
        | ExprKind::RealConst(_)
        | ExprKind::Name(_)
        | ExprKind::DottedPath(_) => {}

        ExprKind::BitOf(a, _)
        | ExprKind::Neg(a)
        | ExprKind::Not(a)
        | ExprKind::BitNot(a)
        | ExprKind::X(a)
        | ExprKind::G(a)
        | ExprKind::F(a)
        | ExprKind::Y(a)
        | ExprKind::Z(a)
        | ExprKind::Ex(a)
        | ExprKind::Ax(a)
        | ExprKind::Eg(a)
        | ExprKind::Ag(a)
        | ExprKind::Ef(a)
        | ExprKind::Af(a)
        | ExprKind::NextVar(a)
        | ExprKind::InitVar(a)
        | ExprKind::Context(_, a)
        | ExprKind::BitSelect(a, _, _)
        | ExprKind::Cast(_, a)
        | ExprKind::AtTime(a, _) => visit(a),

        ExprKind::Add(a, b)
        | ExprKind::Sub(a, b)
        | ExprKind::Mul(a, b)
        | ExprKind::Div(a, b)
        | ExprKind::Mod(a, b)
        | ExprKind::Shl(a, b)
        | ExprKind::Shr(a, b)
        | ExprKind::And(a, b)
        | ExprKind::Or(a, b)
        | ExprKind::Xor(a, b)
        | ExprKind::Iff(a, b)
        | ExprKind::Imp(a, b)
        | ExprKind::U(a, b)
        | ExprKind::S(a, b)
        | ExprKind::Eu(a, b)
        | ExprKind::Au(a, b)
        | ExprKind::Cons(a, b)
        | ExprKind::Colon(a, b)
        | ExprKind::Concat(a, b)
        | ExprKind::Union(a, b) => {
            visit(a);
            visit(b);
        }

        ExprKind::Rel(_, a, b) => {
            visit(a);
            visit(b);
        }

        ExprKind::Ite(cond, then_branch, else_branch) => {
            visit(cond);
            visit(then_branch);
            visit(else_branch);
        }
        ExprKind::Case(arms) => {
            for (cond, result) in arms {
                visit(cond);
                visit(result);
            }
        }
        ExprKind::Array(items) | ExprKind::Word(items) => {
            for item in items {
                visit(item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structurally_identical_nodes_share_identity() {
        let a1 = mk_and(mk_name("x"), mk_name("y"));
        let a2 = mk_and(mk_name("x"), mk_name("y"));
        assert!(Arc::ptr_eq(&a1, &a2));
        assert_eq!(a1.id, a2.id);
    }

    #[test]
    fn distinct_expressions_get_distinct_identity() {
        let a = mk_and(mk_name("x"), mk_name("y"));
        let b = mk_and(mk_name("y"), mk_name("x"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn for_each_child_visits_both_operands_in_order() {
        let node = mk_and(mk_name("x"), mk_name("y"));
        let mut seen = Vec::new();
        for_each_child(&node, |child| seen.push(child.clone()));
        assert_eq!(seen, vec![mk_name("x"), mk_name("y")]);
    }
}

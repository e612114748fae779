//! §4.B — the boolean encoder: turns every scalar/word-shaped variable into a
//! fixed bit vector and a reversible node-level encoding.
//!
//! Bit symbols are modelled as `ExprKind::BitOf(var, index)` nodes (see
//! `crate::expr`) rather than synthesised names: the var they belong to and
//! their index are then recoverable by pattern-matching the node itself,
//! which is exactly what `scalar_of_bit`/`index_of_bit` need and avoids any
//! string-parsing round trip.
//!
//! The encoding tree and its mask are built in one joint recursion
//! (`encode_and_mask`) instead of two separate passes that are expected to
//! stay in lockstep: the source computes a value-tree and a mask-tree with
//! two separate traversals that happen to visit the same shape, which is an
//! easy place for the two to drift. Building both at once makes that
//! impossible by construction, while still implementing the documented
//! algorithm ("traverse the encoding in parallel with the bit cube").

use crate::base_enc::BaseEnc;
use crate::diagnostics::Diagnostics;
use crate::expr::{find_node, mk_bool, ExprKind, Node};
use crate::symbol_table::{Symbol, SymbolKind, Type};
use std::collections::HashMap;

/// Suffix appended to a source layer's name to derive its sibling boolean
/// layer, where fresh bit symbols live.
pub const BOOL_LAYER_SUFFIX: &str = "$bool";

pub fn bool_layer_name(source_layer: &str) -> String {
    format!("{source_layer}{BOOL_LAYER_SUFFIX}")
}

/// `make_bit`: construct (and intern) the bit symbol `var`'s `index`-th bit.
pub fn make_bit(var: Node, index: u32) -> Node {
    find_node(ExprKind::BitOf(var, index))
}

/// `is_var_bit`: is `node` one of the boolean encoder's fresh bit symbols?
pub fn is_var_bit(node: &Node) -> bool {
    matches!(node.kind, ExprKind::BitOf(_, _))
}

/// `scalar_of_bit`: the variable node a bit symbol was minted for.
pub fn scalar_of_bit(bit: &Node) -> Option<Node> {
    match &bit.kind {
        ExprKind::BitOf(var, _) => Some(var.clone()),
        _ => None,
    }
}

/// `index_of_bit`.
pub fn index_of_bit(bit: &Node) -> Option<u32> {
    match &bit.kind {
        ExprKind::BitOf(_, index) => Some(*index),
        _ => None,
    }
}

fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        return 0;
    }
    (usize::BITS - (n - 1).leading_zeros()) as u32
}

/// Build the balanced, higher-bits-high ITE encoding tree and its mask in one
/// joint recursion. `bits` must be ordered ascending by index (`bits[0]` is
/// the lowest bit); the recursion consumes from the high end first, which is
/// what makes higher-index bits sit higher in the resulting tree.
fn encode_and_mask(values: &[Node], bits: &[Node]) -> (Node, Node) {
    if values.len() <= 1 {
        let value = values.first().cloned().unwrap_or_else(|| mk_bool(false));
        return (value, forced_false_chain(bits));
    }
    let split = values.len() - values.len() / 2;
    let (lo_vals, hi_vals) = values.split_at(split);
    let current_bit = bits[bits.len() - 1].clone();
    let rest_bits = &bits[..bits.len() - 1];
    let (hi_tree, hi_mask) = encode_and_mask(hi_vals, rest_bits);
    let (lo_tree, lo_mask) = encode_and_mask(lo_vals, rest_bits);
    let value = find_node(ExprKind::Ite(current_bit.clone(), hi_tree, lo_tree));
    let mask = find_node(ExprKind::Ite(current_bit, hi_mask, lo_mask));
    (value, mask)
}

/// A chain of `if bit then false else ...` forcing every bit in `bits` false,
/// nested so the highest-index bit (the last element) ends up outermost —
/// i.e. tested first, matching the encoding tree's own bit order.
fn forced_false_chain(bits: &[Node]) -> Node {
    let mut acc = mk_bool(true);
    for bit in bits {
        acc = find_node(ExprKind::Ite(bit.clone(), mk_bool(false), acc));
    }
    acc
}

#[derive(Debug, Clone)]
struct VarEncoding {
    bits: Vec<Node>,
    encoding: Node,
    mask: Node,
}

/// §4.B's boolean encoder. Holds its own per-variable caches (`var_bits`,
/// `var_encoding`, `var_mask` are all memoised, as the contract requires) and
/// composes a [`BaseEnc`] for the committed-layer bookkeeping.
pub struct BoolEnc {
    base: BaseEnc,
    diagnostics: Diagnostics,
    cache: HashMap<String, VarEncoding>,
}

impl BoolEnc {
    pub fn new(base: BaseEnc, diagnostics: Diagnostics) -> Self {
        BoolEnc {
            base,
            diagnostics,
            cache: HashMap::new(),
        }
    }

    pub fn base(&self) -> &BaseEnc {
        &self.base
    }

    /// Commit every boolean-encodable variable in `source_layer` into its
    /// sibling boolean layer, emitting bit symbols as we go. Non-encodable
    /// symbol types are skipped with a diagnostic warning, matching the
    /// "unsupported symbol type" semantic-warning case.
    pub fn commit_layer(&mut self, source_layer: &str) {
        self.base.commit_layer(source_layer);
        let bool_layer = bool_layer_name(source_layer);
        self.base.commit_layer(&bool_layer);

        let symbols = self.base.symbols().clone();
        let vars: Vec<Symbol> = {
            let table = symbols.borrow();
            table
                .iter_layer_kind(source_layer, SymbolKind::StateVar)
                .chain(table.iter_layer_kind(source_layer, SymbolKind::InputVar))
                .chain(table.iter_layer_kind(source_layer, SymbolKind::FrozenVar))
                .cloned()
                .collect()
        };

        for symbol in vars {
            if !symbol.ty.is_boolean_encodable() {
                self.diagnostics.warn(format!(
                    "variable `{}` has a type the boolean encoder does not support; skipped",
                    symbol.name
                ));
                continue;
            }
            self.encode_var(&symbol, &bool_layer);
        }
    }

    pub fn remove_layer(&mut self, source_layer: &str) {
        let bool_layer = bool_layer_name(source_layer);
        self.base.remove_layer(&bool_layer);
        self.base.remove_layer(source_layer);
        self.cache.retain(|name, _| {
            let table = self.base.symbols().borrow();
            table.symbol(name).map(|s| s.layer != source_layer).unwrap_or(true)
        });
    }

    fn encode_var(&mut self, symbol: &Symbol, bool_layer: &str) {
        if self.cache.contains_key(&symbol.name) {
            return;
        }
        let var_node = crate::expr::mk_name(symbol.name.clone());

        if let Type::Boolean = symbol.ty {
            // Tie-break: the boolean domain reuses the variable itself as its
            // own bit symbol, no fresh bit is emitted.
            self.cache.insert(
                symbol.name.clone(),
                VarEncoding {
                    bits: vec![var_node.clone()],
                    encoding: var_node,
                    mask: mk_bool(true),
                },
            );
            return;
        }

        // Words carry their own bit width directly; every other encodable
        // type (currently just enums) derives its bit count from the size of
        // its value domain.
        let (bits, encoding, mask) = if let Type::Word { width, .. } = &symbol.ty {
            let bits: Vec<Node> = (0..*width).map(|i| make_bit(var_node.clone(), i)).collect();
            // Words are represented directly as a `WORD[w]` value node rather
            // than an explicit ITE tree: the bit cube already is the word's
            // own bit pattern, so no case-split is needed and the mask is
            // trivially true.
            let word_node = find_node(ExprKind::Word(bits.clone()));
            (bits, word_node, mk_bool(true))
        } else {
            let domain = self.domain_values(symbol);
            let width = ceil_log2(domain.len());
            let bits: Vec<Node> = (0..width).map(|i| make_bit(var_node.clone(), i)).collect();
            let (encoding, mask) = encode_and_mask(&domain, &bits);
            (bits, encoding, mask)
        };

        {
            let mut table = self.base.symbols().borrow_mut();
            for bit in &bits {
                table.declare(
                    bool_layer,
                    Symbol {
                        name: bit_debug_name(bit),
                        kind: SymbolKind::StateVar,
                        ty: Type::Boolean,
                        layer: bool_layer.to_string(),
                        body: None,
                    },
                );
            }
        }

        self.cache.insert(
            symbol.name.clone(),
            VarEncoding { bits, encoding, mask },
        );
    }

    fn domain_values(&self, symbol: &Symbol) -> Vec<Node> {
        match &symbol.ty {
            Type::Enum(values) => values
                .iter()
                .map(|v| crate::expr::mk_name(v.clone()))
                .collect(),
            Type::Boolean => vec![mk_bool(false), mk_bool(true)],
            other => {
                self.diagnostics.warn(format!(
                    "variable `{}` has no enumerable domain ({other:?}); treated as width-1",
                    symbol.name
                ));
                vec![crate::expr::mk_int(0)]
            }
        }
    }

    pub fn var_bits(&self, var_name: &str) -> Option<&[Node]> {
        self.cache.get(var_name).map(|e| e.bits.as_slice())
    }

    pub fn var_encoding(&self, var_name: &str) -> Option<Node> {
        self.cache.get(var_name).map(|e| e.encoding.clone())
    }

    pub fn var_mask(&self, var_name: &str) -> Option<Node> {
        self.cache.get(var_name).map(|e| e.mask.clone())
    }

    /// Fresh encoding of an ad-hoc value set, not tied to any declared
    /// variable. New bits are returned via `bits_out` but never declared in
    /// the symbol table — the caller owns their lifetime.
    pub fn values_encoding(&self, values: &[Node], bit_owner: Node, bits_out: &mut Vec<Node>) -> Node {
        let width = ceil_log2(values.len());
        let bits: Vec<Node> = (0..width).map(|i| make_bit(bit_owner.clone(), i)).collect();
        bits_out.extend(bits.iter().cloned());
        let (encoding, _mask) = encode_and_mask(values, &bits);
        encoding
    }

    /// Recover the domain value selected by a concrete bit assignment, by
    /// walking the encoding tree the same way the BDD package would walk a
    /// `Bdd`'s internal nodes: follow `Ite` branches according to the
    /// assigned bit, stop at a non-`Ite` leaf.
    pub fn value_from_bits(&self, var_name: &str, bit_values: &[(Node, bool)]) -> Option<Node> {
        let encoding = self.var_encoding(var_name)?;
        Some(resolve_leaf(&encoding, bit_values))
    }
}

fn bit_debug_name(bit: &Node) -> String {
    match (&bit.kind, scalar_of_bit(bit), index_of_bit(bit)) {
        (ExprKind::BitOf(_, _), Some(var), Some(index)) => match &var.kind {
            ExprKind::Name(name) => format!("{name}#{index}"),
            _ => format!("bit#{}#{}", var.id, index),
        },
        _ => format!("bit#{}", bit.id),
    }
}

fn resolve_leaf(node: &Node, bit_values: &[(Node, bool)]) -> Node {
    match &node.kind {
        ExprKind::Ite(cond, then_branch, else_branch) => {
            let value = bit_values
                .iter()
                .find(|(bit, _)| bit.id == cond.id)
                .map(|(_, v)| *v)
                .unwrap_or(false);
            if value {
                resolve_leaf(then_branch, bit_values)
            } else {
                resolve_leaf(else_branch, bit_values)
            }
        }
        _ => node.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol_table::{InsertionPolicy, SymbolTable};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn enum_symbol(name: &str, layer: &str, domain: &[&str]) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::StateVar,
            ty: Type::Enum(domain.iter().map(|s| s.to_string()).collect()),
            layer: layer.to_string(),
            body: None,
        }
    }

    #[test]
    fn five_value_enum_gets_three_fresh_bits_and_nontrivial_mask() {
        let symbols = Rc::new(RefCell::new(SymbolTable::new()));
        symbols
            .borrow_mut()
            .create_layer("main", InsertionPolicy::Append);
        symbols
            .borrow_mut()
            .declare("main", enum_symbol("x", "main", &["s0", "s1", "s2", "s3", "s4"]));

        let mut enc = BoolEnc::new(BaseEnc::new(symbols), Diagnostics::new());
        enc.commit_layer("main");

        let bits = enc.var_bits("x").expect("x should be encoded");
        assert_eq!(bits.len(), 3, "ceil(log2(5)) == 3");

        let mask = enc.var_mask("x").unwrap();
        assert_ne!(mask, mk_bool(true), "5 doesn't evenly fill 2^3, mask must be nontrivial");
    }

    #[test]
    fn boolean_variable_reuses_itself_as_its_own_bit() {
        let symbols = Rc::new(RefCell::new(SymbolTable::new()));
        symbols
            .borrow_mut()
            .create_layer("main", InsertionPolicy::Append);
        symbols.borrow_mut().declare(
            "main",
            Symbol {
                name: "flag".to_string(),
                kind: SymbolKind::StateVar,
                ty: Type::Boolean,
                layer: "main".to_string(),
                body: None,
            },
        );

        let mut enc = BoolEnc::new(BaseEnc::new(symbols), Diagnostics::new());
        enc.commit_layer("main");

        let bits = enc.var_bits("flag").unwrap();
        assert_eq!(bits.len(), 1);
        assert_eq!(enc.var_mask("flag").unwrap(), mk_bool(true));
    }

    #[test]
    fn value_from_bits_always_resolves_to_a_declared_domain_value() {
        let symbols = Rc::new(RefCell::new(SymbolTable::new()));
        symbols
            .borrow_mut()
            .create_layer("main", InsertionPolicy::Append);
        let domain = ["s0", "s1", "s2"];
        symbols
            .borrow_mut()
            .declare("main", enum_symbol("x", "main", &domain));

        let mut enc = BoolEnc::new(BaseEnc::new(symbols), Diagnostics::new());
        enc.commit_layer("main");

        let domain_nodes: std::collections::HashSet<Node> =
            domain.iter().map(|v| crate::expr::mk_name(*v)).collect();

        let bits = enc.var_bits("x").unwrap().to_vec();
        for combo in 0..(1u32 << bits.len()) {
            let assignment: Vec<(Node, bool)> = bits
                .iter()
                .enumerate()
                .map(|(i, b)| (b.clone(), (combo >> i) & 1 == 1))
                .collect();
            let value = enc.value_from_bits("x", &assignment).unwrap();
            assert!(
                domain_nodes.contains(&value),
                "bit combo {combo} resolved outside the declared domain"
            );
        }
    }

    #[test]
    fn word_variable_gets_exactly_its_declared_width_in_bits() {
        let symbols = Rc::new(RefCell::new(SymbolTable::new()));
        symbols
            .borrow_mut()
            .create_layer("main", InsertionPolicy::Append);
        symbols.borrow_mut().declare(
            "main",
            Symbol {
                name: "w".to_string(),
                kind: SymbolKind::StateVar,
                ty: Type::Word { width: 8, signed: false },
                layer: "main".to_string(),
                body: None,
            },
        );

        let mut enc = BoolEnc::new(BaseEnc::new(symbols), Diagnostics::new());
        enc.commit_layer("main");

        assert_eq!(enc.var_bits("w").unwrap().len(), 8);
        assert_eq!(enc.var_mask("w").unwrap(), mk_bool(true));
    }
}

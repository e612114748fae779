//! §6 External interfaces — symbol-table collaborator.
//!
//! Parsing source text into symbols is out of scope for this core (§1): the
//! frontend that built a real model is expected to populate a symbol table
//! and hand it to `BoolEnc`/`PredicateExtractor`. This module gives a minimal,
//! concrete implementation of that contract — "name resolution with
//! contexts; type query per symbol; per-layer iteration filtered by symbol
//! kind; declaration predicates; a type checker that never re-enters the
//! predicate extractor" — so the rest of the core is independently testable
//! without a parser.
//!
//! Layer sharing is refcounted, as the design notes prescribe: "replace
//! [the source's] global static hash `layer -> count` with a first-class
//! registry owned by the symbol table." Unlike the source, there is no
//! process-wide `static`: one `SymbolTable` instance is the registry, shared
//! by `Rc` among the encoders that commit layers from it.

use crate::expr::Node;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    StateVar,
    InputVar,
    FrozenVar,
    Define,
    ArrayDefine,
    Parameter,
    Constant,
    Function,
}

/// Static types recognised by the core (§6). The boolean encoder silently
/// ignores (with a warning) any symbol whose type isn't one it knows how to
/// emit bits for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Boolean,
    /// Finite, explicitly enumerated value set (scalar enum domain).
    Enum(Vec<String>),
    Word { width: u32, signed: bool },
    Integer,
    Real,
    Array(Box<Type>, usize),
    WordArray { index_width: u32, element: Box<Type> },
    Str,
}

impl Type {
    /// Types the boolean encoder supports directly; everything else is
    /// reported via `Diagnostics::warn` and produces no bits (§6).
    pub fn is_boolean_encodable(&self) -> bool {
        matches!(self, Type::Boolean | Type::Enum(_) | Type::Word { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    pub layer: String,
    /// For `Define`/`Parameter` symbols, the body/actual expression.
    pub body: Option<Node>,
}

/// Where a newly committed layer lands relative to already-committed ones.
/// The source's "insertion policy" is really just "append unless told
/// otherwise"; we keep the two cases that matter in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPolicy {
    Append,
    Prepend,
}

#[derive(Debug, Clone)]
struct Layer {
    symbols: HashMap<String, Symbol>,
    order: Vec<String>,
    refcount: u32,
    insertion_policy: InsertionPolicy,
}

impl Layer {
    fn new(insertion_policy: InsertionPolicy) -> Self {
        Layer {
            symbols: HashMap::new(),
            order: Vec::new(),
            refcount: 0,
            insertion_policy,
        }
    }
}

/// Process-wide (in practice: one per verification run, shared by `Rc`)
/// registry of declared symbols, grouped into named layers.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    layers: HashMap<String, Layer>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            layers: HashMap::new(),
        }
    }

    /// Declare `symbol` in `layer_name`, creating the layer (uncommitted,
    /// refcount 0) if it does not exist yet.
    pub fn declare(&mut self, layer_name: &str, symbol: Symbol) {
        let layer = self
            .layers
            .entry(layer_name.to_string())
            .or_insert_with(|| Layer::new(InsertionPolicy::Append));
        if !layer.symbols.contains_key(&symbol.name) {
            match layer.insertion_policy {
                InsertionPolicy::Append => layer.order.push(symbol.name.clone()),
                InsertionPolicy::Prepend => layer.order.insert(0, symbol.name.clone()),
            }
        }
        layer.symbols.insert(symbol.name.clone(), symbol);
    }

    pub fn create_layer(&mut self, layer_name: &str, insertion_policy: InsertionPolicy) {
        self.layers
            .entry(layer_name.to_string())
            .or_insert_with(|| Layer::new(insertion_policy));
    }

    /// Name resolution: `context ⊕ local-name -> fully qualified name`.
    pub fn resolve(&self, context: &[String], local_name: &str) -> String {
        if context.is_empty() {
            local_name.to_string()
        } else {
            format!("{}.{}", context.join("."), local_name)
        }
    }

    pub fn symbol(&self, qualified_name: &str) -> Option<&Symbol> {
        self.layers
            .values()
            .find_map(|layer| layer.symbols.get(qualified_name))
    }

    pub fn is_var(&self, name: &str) -> bool {
        matches!(
            self.symbol(name).map(|s| s.kind),
            Some(SymbolKind::StateVar) | Some(SymbolKind::InputVar) | Some(SymbolKind::FrozenVar)
        )
    }
    pub fn is_define(&self, name: &str) -> bool {
        matches!(self.symbol(name).map(|s| s.kind), Some(SymbolKind::Define))
    }
    pub fn is_constant(&self, name: &str) -> bool {
        matches!(self.symbol(name).map(|s| s.kind), Some(SymbolKind::Constant))
    }
    pub fn is_parameter(&self, name: &str) -> bool {
        matches!(self.symbol(name).map(|s| s.kind), Some(SymbolKind::Parameter))
    }
    pub fn is_function(&self, name: &str) -> bool {
        matches!(self.symbol(name).map(|s| s.kind), Some(SymbolKind::Function))
    }

    pub fn type_of_symbol(&self, name: &str) -> Option<&Type> {
        self.symbol(name).map(|s| &s.ty)
    }

    /// Iterate the symbols of `kind` within `layer_name`, in declaration
    /// order.
    pub fn iter_layer_kind<'a>(
        &'a self,
        layer_name: &str,
        kind: SymbolKind,
    ) -> impl Iterator<Item = &'a Symbol> + 'a {
        self.layers
            .get(layer_name)
            .into_iter()
            .flat_map(move |layer| {
                layer
                    .order
                    .iter()
                    .filter_map(move |name| layer.symbols.get(name))
                    .filter(move |s| s.kind == kind)
            })
    }

    pub fn layer_order(&self, layer_name: &str) -> Vec<String> {
        self.layers
            .get(layer_name)
            .map(|l| l.order.clone())
            .unwrap_or_default()
    }

    // --- layer lifecycle: refcounted commit/remove, §4.C ---

    pub fn layer_occurs(&self, layer_name: &str) -> bool {
        self.layers.contains_key(layer_name)
    }

    /// Lock the layer (refcount += 1). Creates the layer if it is the first
    /// reference (mirrors `commit_layer` being able to commit a layer that
    /// was only ever declared into, never explicitly created).
    pub fn commit_layer(&mut self, layer_name: &str) {
        let layer = self
            .layers
            .entry(layer_name.to_string())
            .or_insert_with(|| Layer::new(InsertionPolicy::Append));
        layer.refcount += 1;
    }

    /// Unlock the layer (refcount -= 1). When the refcount reaches zero the
    /// layer, and every symbol in it, is dropped from the table — "the last
    /// encoder releasing a layer returns it to the table" read as "removes
    /// it from the table" once nobody holds it.
    ///
    /// Panics (contract violation) if the layer was not committed.
    pub fn remove_layer(&mut self, layer_name: &str) {
        let refcount = {
            let layer = self
                .layers
                .get_mut(layer_name)
                .unwrap_or_else(|| panic!("remove_layer: unknown layer `{layer_name}`"));
            assert!(
                layer.refcount > 0,
                "double-remove of layer `{layer_name}`"
            );
            layer.refcount -= 1;
            layer.refcount
        };
        if refcount == 0 {
            self.layers.remove(layer_name);
        }
    }

    pub fn layer_refcount(&self, layer_name: &str) -> u32 {
        self.layers.get(layer_name).map(|l| l.refcount).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bool_symbol(name: &str, layer: &str) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::StateVar,
            ty: Type::Boolean,
            layer: layer.to_string(),
            body: None,
        }
    }

    #[test]
    fn resolve_qualifies_with_context() {
        let table = SymbolTable::new();
        assert_eq!(table.resolve(&[], "x"), "x");
        assert_eq!(
            table.resolve(&["main".to_string(), "sub".to_string()], "x"),
            "main.sub.x"
        );
    }

    #[test]
    fn layer_refcount_removes_on_last_release() {
        let mut table = SymbolTable::new();
        table.declare("main", bool_symbol("x", "main"));
        table.commit_layer("main");
        table.commit_layer("main");
        assert!(table.layer_occurs("main"));
        table.remove_layer("main");
        assert!(table.layer_occurs("main"));
        table.remove_layer("main");
        assert!(!table.layer_occurs("main"));
    }

    #[test]
    #[should_panic(expected = "double-remove")]
    fn double_remove_panics() {
        let mut table = SymbolTable::new();
        table.create_layer("main", InsertionPolicy::Append);
        table.commit_layer("main");
        table.remove_layer("main");
        table.remove_layer("main");
    }

    #[test]
    fn iterate_layer_by_kind_in_declaration_order() {
        let mut table = SymbolTable::new();
        table.declare("main", bool_symbol("a", "main"));
        table.declare("main", bool_symbol("b", "main"));
        table.declare(
            "main",
            Symbol {
                name: "DEF".to_string(),
                kind: SymbolKind::Define,
                ty: Type::Boolean,
                layer: "main".to_string(),
                body: None,
            },
        );
        let vars: Vec<&str> = table
            .iter_layer_kind("main", SymbolKind::StateVar)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(vars, vec!["a", "b"]);
    }
}

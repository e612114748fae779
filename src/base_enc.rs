//! §4.C — base encoder: the shared "committed layers" registry that every
//! specialised encoder (`BoolEnc` today, a future numeric encoder tomorrow)
//! builds on.
//!
//! The base encoder never writes a symbol into a layer itself — only
//! `commit_layer`/`remove_layer` it, locking/unlocking the refcount that
//! [`crate::symbol_table::SymbolTable`] already tracks per layer. Concrete
//! encoders (`BoolEnc`) are the ones that actually populate a layer's
//! contents.

use crate::symbol_table::SymbolTable;
use std::cell::RefCell;
use std::rc::Rc;

/// Tracks which layers of a shared [`SymbolTable`] this encoder currently has
/// committed, in commit order, with a cached name snapshot invalidated on
/// every commit/remove.
pub struct BaseEnc {
    symbols: Rc<RefCell<SymbolTable>>,
    committed: Vec<String>,
    names_cache: RefCell<Option<Rc<[String]>>>,
}

impl BaseEnc {
    pub fn new(symbols: Rc<RefCell<SymbolTable>>) -> Self {
        BaseEnc {
            symbols,
            committed: Vec::new(),
            names_cache: RefCell::new(None),
        }
    }

    pub fn symbols(&self) -> &Rc<RefCell<SymbolTable>> {
        &self.symbols
    }

    /// Lock `layer_name` (refcount += 1 on the shared table). Idempotent with
    /// respect to this encoder's own committed-layer list: committing the
    /// same layer twice through the same `BaseEnc` still only locks the
    /// underlying table twice (matching the table's own refcount semantics),
    /// but only appears once in `committed_layers()`.
    pub fn commit_layer(&mut self, layer_name: &str) {
        self.symbols.borrow_mut().commit_layer(layer_name);
        if !self.committed.iter().any(|n| n == layer_name) {
            self.committed.push(layer_name.to_string());
        }
        self.invalidate_cache();
    }

    /// Unlock `layer_name`. Panics (via the underlying table) on
    /// double-remove, consistent with the table's own contract.
    pub fn remove_layer(&mut self, layer_name: &str) {
        self.symbols.borrow_mut().remove_layer(layer_name);
        if self.symbols.borrow().layer_refcount(layer_name) == 0 {
            self.committed.retain(|n| n != layer_name);
        }
        self.invalidate_cache();
    }

    pub fn layer_occurs(&self, layer_name: &str) -> bool {
        self.symbols.borrow().layer_occurs(layer_name)
    }

    /// Committed layers, in commit order (insertion-policy order).
    pub fn committed_layers(&self) -> &[String] {
        &self.committed
    }

    /// Cached snapshot of `committed_layers()`, recomputed lazily and
    /// invalidated by every `commit_layer`/`remove_layer` call.
    pub fn committed_layer_names(&self) -> Rc<[String]> {
        if let Some(cached) = self.names_cache.borrow().as_ref() {
            return cached.clone();
        }
        let names: Rc<[String]> = self.committed.clone().into();
        *self.names_cache.borrow_mut() = Some(names.clone());
        names
    }

    fn invalidate_cache(&self) {
        *self.names_cache.borrow_mut() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_then_remove_round_trips_membership() {
        let symbols = Rc::new(RefCell::new(SymbolTable::new()));
        let mut base = BaseEnc::new(symbols.clone());
        base.commit_layer("main");
        assert!(base.layer_occurs("main"));
        assert_eq!(base.committed_layers(), &["main".to_string()]);

        base.remove_layer("main");
        assert!(!base.layer_occurs("main"));
        assert!(base.committed_layers().is_empty());
    }

    #[test]
    fn committed_layer_names_reflects_latest_state_after_mutation() {
        let symbols = Rc::new(RefCell::new(SymbolTable::new()));
        let mut base = BaseEnc::new(symbols);
        base.commit_layer("a");
        let first = base.committed_layer_names();
        assert_eq!(&*first, &["a".to_string()]);

        base.commit_layer("b");
        let second = base.committed_layer_names();
        assert_eq!(&*second, &["a".to_string(), "b".to_string()]);
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Numeric slot assigned to a name at compile time.
///
/// Slot 0 is reserved for the self reference of the template, so allocation
/// starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub u32);

impl Symbol {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

/// Name resolution consumed by the syntax compilers.
///
/// Locals are block parameters bound by an enclosing block, named symbols are
/// component arguments bound on the current invocation, and block symbols are
/// the named blocks a caller may supply.
pub trait SymbolLookup {
    fn has_local_symbol(&self, name: &str) -> bool;
    fn get_local_symbol(&self, name: &str) -> Option<Symbol>;
    fn has_named_symbol(&self, name: &str) -> bool;
    fn get_named_symbol(&self, name: &str) -> Option<Symbol>;
    /// `None` means the block is never yielded to from this template.
    fn get_block_symbol(&self, label: &str) -> Option<Symbol>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYMBOL TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Nested scope of symbols for one template or block.
///
/// All tables under the same root draw slots from one counter, so a symbol is
/// unique across the whole template. Locals resolve through the parent chain;
/// named and yield symbols are declared on the root (layout) table but are
/// still searched through the chain.
#[derive(Debug)]
pub struct SymbolTable {
    parent: Option<Arc<SymbolTable>>,
    next_symbol: Arc<AtomicU32>,
    locals: HashMap<String, Symbol>,
    named: HashMap<String, Symbol>,
    yields: HashMap<String, Symbol>,
}

impl SymbolTable {
    fn root() -> Self {
        Self {
            parent: None,
            next_symbol: Arc::new(AtomicU32::new(1)),
            locals: HashMap::new(),
            named: HashMap::new(),
            yields: HashMap::new(),
        }
    }

    /// Table for a top-level template that declares no arguments or blocks.
    pub fn for_entry_point() -> Arc<Self> {
        Arc::new(Self::root())
    }

    /// Table for a component layout: `named` are its `@arguments`, `yields`
    /// the block labels it yields to.
    pub fn for_layout(named: &[String], yields: &[String]) -> Arc<Self> {
        let mut table = Self::root();
        for name in named {
            let symbol = table.allocate();
            table.named.entry(name.clone()).or_insert(symbol);
        }
        for label in yields {
            let symbol = table.allocate();
            table.yields.entry(label.clone()).or_insert(symbol);
        }
        Arc::new(table)
    }

    /// Child table binding `locals` as block parameters.
    pub fn for_block(parent: &Arc<SymbolTable>, locals: &[String]) -> Arc<Self> {
        let mut table = Self {
            parent: Some(Arc::clone(parent)),
            next_symbol: Arc::clone(&parent.next_symbol),
            locals: HashMap::new(),
            named: HashMap::new(),
            yields: HashMap::new(),
        };
        for local in locals {
            let symbol = table.allocate();
            table.locals.insert(local.clone(), symbol);
        }
        Arc::new(table)
    }

    fn allocate(&self) -> Symbol {
        Symbol(self.next_symbol.fetch_add(1, Ordering::Relaxed))
    }

    pub fn parent(&self) -> Option<&Arc<SymbolTable>> {
        self.parent.as_ref()
    }

    pub fn is_top(&self) -> bool {
        self.parent.is_none()
    }

    /// Number of slots allocated so far across the whole table tree,
    /// including the self slot.
    pub fn size(&self) -> u32 {
        self.next_symbol.load(Ordering::Relaxed)
    }

    pub fn get_local(&self, name: &str) -> Option<Symbol> {
        match self.locals.get(name) {
            Some(symbol) => Some(*symbol),
            None => self.parent.as_ref().and_then(|p| p.get_local(name)),
        }
    }

    pub fn get_named(&self, name: &str) -> Option<Symbol> {
        match self.named.get(name) {
            Some(symbol) => Some(*symbol),
            None => self.parent.as_ref().and_then(|p| p.get_named(name)),
        }
    }

    pub fn get_yield(&self, label: &str) -> Option<Symbol> {
        match self.yields.get(label) {
            Some(symbol) => Some(*symbol),
            None => self.parent.as_ref().and_then(|p| p.get_yield(label)),
        }
    }
}

impl SymbolLookup for SymbolTable {
    fn has_local_symbol(&self, name: &str) -> bool {
        self.get_local(name).is_some()
    }

    fn get_local_symbol(&self, name: &str) -> Option<Symbol> {
        self.get_local(name)
    }

    fn has_named_symbol(&self, name: &str) -> bool {
        self.get_named(name).is_some()
    }

    fn get_named_symbol(&self, name: &str) -> Option<Symbol> {
        self.get_named(name)
    }

    fn get_block_symbol(&self, label: &str) -> Option<Symbol> {
        self.get_yield(label)
    }
}

impl<T: SymbolLookup + ?Sized> SymbolLookup for Arc<T> {
    fn has_local_symbol(&self, name: &str) -> bool {
        (**self).has_local_symbol(name)
    }

    fn get_local_symbol(&self, name: &str) -> Option<Symbol> {
        (**self).get_local_symbol(name)
    }

    fn has_named_symbol(&self, name: &str) -> bool {
        (**self).has_named_symbol(name)
    }

    fn get_named_symbol(&self, name: &str) -> Option<Symbol> {
        (**self).get_named_symbol(name)
    }

    fn get_block_symbol(&self, label: &str) -> Option<Symbol> {
        (**self).get_block_symbol(label)
    }
}

//! Argument and template containers shared by helpers, modifiers, components
//! and yields.
//!
//! The containers are immutable handles over shared storage. Each has one
//! canonical empty instance; constructors hand that instance back whenever the
//! input is empty so that the no-argument case compiles to the shared
//! [`CompiledArgs::empty`] without allocating.

use lazy_static::lazy_static;
use std::sync::Arc;

use crate::compiled::{CompiledArgs, CompiledNamedArgs, CompiledPositionalArgs};
use crate::environment::Environment;
use crate::error::Result;
use crate::expression::Expression;
use crate::scanner::InlineBlock;
use crate::scope::{SymbolLookup, SymbolTable};

lazy_static! {
    static ref EMPTY_POSITIONAL_ARGS: PositionalArgs = PositionalArgs {
        values: Arc::from(Vec::new()),
    };
    static ref EMPTY_NAMED_ARGS: NamedArgs = NamedArgs {
        inner: Arc::new(NamedInner {
            keys: Vec::new(),
            values: Vec::new(),
        }),
    };
    static ref EMPTY_ARGS: Args = Args {
        inner: Arc::new(ArgsInner {
            positional: EMPTY_POSITIONAL_ARGS.clone(),
            named: EMPTY_NAMED_ARGS.clone(),
        }),
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// POSITIONAL
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct PositionalArgs {
    values: Arc<[Expression]>,
}

impl PositionalArgs {
    pub fn empty() -> Self {
        EMPTY_POSITIONAL_ARGS.clone()
    }

    pub fn build(values: Vec<Expression>) -> Self {
        if values.is_empty() {
            Self::empty()
        } else {
            Self {
                values: Arc::from(values),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Expression] {
        &self.values
    }

    /// Out-of-range indexes are absent, not an error.
    pub fn at(&self, index: usize) -> Option<&Expression> {
        self.values.get(index)
    }

    /// Copies `start..end` into a new value. Bounds are clamped to the length.
    pub fn slice(&self, start: usize, end: Option<usize>) -> Self {
        let len = self.values.len();
        let end = end.unwrap_or(len).min(len);
        let start = start.min(end);
        Self::build(self.values[start..end].to_vec())
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }

    pub fn is_empty_singleton(&self) -> bool {
        self.ptr_eq(&EMPTY_POSITIONAL_ARGS)
    }

    pub fn compile<L: SymbolLookup + ?Sized>(
        &self,
        lookup: &L,
        env: &dyn Environment,
        symbol_table: &Arc<SymbolTable>,
    ) -> Result<CompiledPositionalArgs> {
        if self.is_empty_singleton() {
            return Ok(CompiledPositionalArgs::empty());
        }
        let values = self
            .values
            .iter()
            .map(|value| value.compile(lookup, env, symbol_table))
            .collect::<Result<Vec<_>>>()?;
        Ok(CompiledPositionalArgs::create(values))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAMED
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, PartialEq)]
struct NamedInner {
    keys: Vec<String>,
    values: Vec<Expression>,
}

/// `(name, expression)` pairs in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArgs {
    inner: Arc<NamedInner>,
}

impl NamedArgs {
    pub fn empty() -> Self {
        EMPTY_NAMED_ARGS.clone()
    }

    /// `keys` and `values` pair up by index. The first occurrence of a
    /// repeated key wins on lookup.
    pub fn build(keys: Vec<String>, values: Vec<Expression>) -> Self {
        debug_assert_eq!(keys.len(), values.len());
        if keys.is_empty() {
            Self::empty()
        } else {
            Self {
                inner: Arc::new(NamedInner { keys, values }),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.inner.keys
    }

    pub fn values(&self) -> &[Expression] {
        &self.inner.values
    }

    pub fn at(&self, key: &str) -> Option<&Expression> {
        let index = self.inner.keys.iter().position(|k| k == key)?;
        self.inner.values.get(index)
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.keys.iter().any(|k| k == key)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_empty_singleton(&self) -> bool {
        self.ptr_eq(&EMPTY_NAMED_ARGS)
    }

    pub fn compile<L: SymbolLookup + ?Sized>(
        &self,
        lookup: &L,
        env: &dyn Environment,
        symbol_table: &Arc<SymbolTable>,
    ) -> Result<CompiledNamedArgs> {
        if self.is_empty_singleton() {
            return Ok(CompiledNamedArgs::empty());
        }
        let values = self
            .inner
            .values
            .iter()
            .map(|value| value.compile(lookup, env, symbol_table))
            .collect::<Result<Vec<_>>>()?;
        Ok(CompiledNamedArgs::create(self.inner.keys.clone(), values))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ARGS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, PartialEq)]
struct ArgsInner {
    positional: PositionalArgs,
    named: NamedArgs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    inner: Arc<ArgsInner>,
}

impl Args {
    pub fn empty() -> Self {
        EMPTY_ARGS.clone()
    }

    /// Returns the canonical empty `Args` when both halves are the canonical
    /// empties.
    pub fn build(positional: PositionalArgs, named: NamedArgs) -> Self {
        if positional.is_empty_singleton() && named.is_empty_singleton() {
            Self::empty()
        } else {
            Self {
                inner: Arc::new(ArgsInner { positional, named }),
            }
        }
    }

    pub fn from_positional_args(positional: PositionalArgs) -> Self {
        Self::build(positional, NamedArgs::empty())
    }

    pub fn from_named_args(named: NamedArgs) -> Self {
        Self::build(PositionalArgs::empty(), named)
    }

    pub fn positional(&self) -> &PositionalArgs {
        &self.inner.positional
    }

    pub fn named(&self) -> &NamedArgs {
        &self.inner.named
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_empty_singleton(&self) -> bool {
        self.ptr_eq(&EMPTY_ARGS)
    }

    pub fn compile<L: SymbolLookup + ?Sized>(
        &self,
        lookup: &L,
        env: &dyn Environment,
        symbol_table: &Arc<SymbolTable>,
    ) -> Result<CompiledArgs> {
        if self.is_empty_singleton() {
            return Ok(CompiledArgs::empty());
        }
        let positional = self.inner.positional.compile(lookup, env, symbol_table)?;
        let named = self.inner.named.compile(lookup, env, symbol_table)?;
        Ok(CompiledArgs::create(positional, named))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATES
// ═══════════════════════════════════════════════════════════════════════════════

/// The default and inverse bodies of a block construct.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Templates {
    pub default: Option<Arc<InlineBlock>>,
    pub inverse: Option<Arc<InlineBlock>>,
}

impl Templates {
    pub fn new(default: Option<Arc<InlineBlock>>, inverse: Option<Arc<InlineBlock>>) -> Self {
        Self { default, inverse }
    }

    pub fn from_spec(default: Arc<InlineBlock>, inverse: Option<Arc<InlineBlock>>) -> Self {
        Self::new(Some(default), inverse)
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

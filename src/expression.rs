//! Expression syntax.
//!
//! Each node compiles to exactly one [`CompiledExpression`]. Compilation is a
//! pure function of the node and the lookup, environment and symbol table it
//! is handed; the only failure it can produce is a compile error.

use serde_json::Value as Json;
use std::sync::Arc;

use crate::args::{Args, NamedArgs, PositionalArgs};
use crate::compiled::{CompiledArgs, CompiledExpression};
use crate::environment::Environment;
use crate::error::{display_path, CompileError, Result};
use crate::scope::{SymbolLookup, SymbolTable};

/// Keyword that refers to the template's own context.
pub const SELF_KEYWORD: &str = "this";

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Value(Value),
    Ref(Ref),
    Get(Get),
    Unknown(Unknown),
    GetArgument(GetArgument),
    Helper(Helper),
    HasBlock(HasBlock),
    HasBlockParams(HasBlockParams),
    /// Only produced in value position for attributes and arguments.
    Concat(Concat),
}

impl Expression {
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Value(_) => "value",
            Expression::Ref(_) => "ref",
            Expression::Get(_) => "get",
            Expression::Unknown(_) => "unknown",
            Expression::GetArgument(_) => "get-argument",
            Expression::Helper(_) => "helper",
            Expression::HasBlock(_) => "has-block",
            Expression::HasBlockParams(_) => "has-block-params",
            Expression::Concat(_) => "concat",
        }
    }

    pub fn compile<L: SymbolLookup + ?Sized>(
        &self,
        lookup: &L,
        env: &dyn Environment,
        symbol_table: &Arc<SymbolTable>,
    ) -> Result<CompiledExpression> {
        match self {
            Expression::Value(value) => Ok(value.compile()),
            Expression::Ref(reference) => Ok(reference.compile(lookup)),
            Expression::Get(get) => Ok(get.compile(lookup)),
            Expression::Unknown(unknown) => unknown.compile(lookup, env, symbol_table),
            Expression::GetArgument(argument) => Ok(argument.compile(lookup)),
            Expression::Helper(helper) => helper.compile(lookup, env, symbol_table),
            Expression::HasBlock(has_block) => Ok(has_block.compile(lookup)),
            Expression::HasBlockParams(has_block_params) => Ok(has_block_params.compile(lookup)),
            Expression::Concat(concat) => concat.compile(lookup, env, symbol_table),
        }
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// LITERALS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub value: Json,
}

impl Value {
    pub fn build(value: impl Into<Json>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn inner(&self) -> &Json {
        &self.value
    }

    pub fn compile(&self) -> CompiledExpression {
        CompiledExpression::Value(self.value.clone())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REFERENCES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefHead {
    /// `this.` prefix, always a self lookup.
    This,
    Name(String),
}

/// A dotted path `a.b.c`, split into its head and the remaining segments.
///
/// Shared by `Get`, `Unknown` and `Helper`, which differ only in whether the
/// path may name a helper.
#[derive(Debug, Clone, PartialEq)]
pub struct Ref {
    pub head: RefHead,
    pub tail: Vec<String>,
}

impl Ref {
    pub fn build(path: &str) -> Self {
        Self::new(split_path(path))
    }

    pub fn new(mut parts: Vec<String>) -> Self {
        if parts.is_empty() {
            return Self {
                head: RefHead::This,
                tail: Vec::new(),
            };
        }
        let head = parts.remove(0);
        let head = if head == SELF_KEYWORD {
            RefHead::This
        } else {
            RefHead::Name(head)
        };
        Self { head, tail: parts }
    }

    /// The path as written, without an explicit `this` head. This is what
    /// registries are queried with.
    pub fn parts(&self) -> Vec<String> {
        match &self.head {
            RefHead::This => self.tail.clone(),
            RefHead::Name(head) => {
                let mut parts = Vec::with_capacity(self.tail.len() + 1);
                parts.push(head.clone());
                parts.extend(self.tail.iter().cloned());
                parts
            }
        }
    }

    pub fn display(&self) -> String {
        match &self.head {
            RefHead::This => {
                let mut parts = vec![SELF_KEYWORD.to_string()];
                parts.extend(self.tail.iter().cloned());
                display_path(&parts)
            }
            RefHead::Name(_) => display_path(&self.parts()),
        }
    }

    /// Block parameters shadow self properties of the same name.
    pub fn compile<L: SymbolLookup + ?Sized>(&self, lookup: &L) -> CompiledExpression {
        match &self.head {
            RefHead::This => CompiledExpression::SelfLookup {
                path: self.tail.clone(),
            },
            RefHead::Name(head) if lookup.has_local_symbol(head) => {
                CompiledExpression::LocalLookup {
                    symbol: lookup.get_local_symbol(head),
                    path: self.tail.clone(),
                    debug: head.clone(),
                }
            }
            RefHead::Name(_) => CompiledExpression::SelfLookup { path: self.parts() },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Get {
    pub reference: Ref,
}

impl Get {
    pub fn new(reference: Ref) -> Self {
        Self { reference }
    }

    pub fn build(path: &str) -> Self {
        Self::new(Ref::build(path))
    }

    pub fn compile<L: SymbolLookup + ?Sized>(&self, lookup: &L) -> CompiledExpression {
        self.reference.compile(lookup)
    }
}

/// A bare name that is either a helper call or a property read. The helper
/// registry decides, and a helper wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Unknown {
    pub reference: Ref,
}

impl Unknown {
    pub fn new(reference: Ref) -> Self {
        Self { reference }
    }

    pub fn build(path: &str) -> Self {
        Self::new(Ref::build(path))
    }

    pub fn compile<L: SymbolLookup + ?Sized>(
        &self,
        lookup: &L,
        env: &dyn Environment,
        symbol_table: &Arc<SymbolTable>,
    ) -> Result<CompiledExpression> {
        if let RefHead::Name(_) = self.reference.head {
            let parts = self.reference.parts();
            if env.has_helper(&parts, symbol_table) {
                let helper = env
                    .lookup_helper(&parts, symbol_table)
                    .ok_or_else(|| CompileError::UnknownHelper {
                        path: display_path(&parts),
                    })?;
                return Ok(CompiledExpression::Helper {
                    name: parts,
                    helper,
                    args: CompiledArgs::empty(),
                    symbol_table: Arc::clone(symbol_table),
                });
            }
        }
        Ok(self.reference.compile(lookup))
    }
}

/// `@name.path`, resolved against the named symbols of the invocation only.
#[derive(Debug, Clone, PartialEq)]
pub struct GetArgument {
    pub parts: Vec<String>,
}

impl GetArgument {
    pub fn new(parts: Vec<String>) -> Self {
        Self { parts }
    }

    pub fn build(path: &str) -> Self {
        Self::new(split_path(path))
    }

    pub fn compile<L: SymbolLookup + ?Sized>(&self, lookup: &L) -> CompiledExpression {
        let (head, path) = match self.parts.split_first() {
            Some((head, path)) => (head.clone(), path.to_vec()),
            None => (String::new(), Vec::new()),
        };
        CompiledExpression::LocalLookup {
            symbol: lookup.get_named_symbol(&head),
            path,
            debug: head,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALLS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Helper {
    pub reference: Ref,
    pub args: Args,
}

impl Helper {
    pub fn new(reference: Ref, args: Args) -> Self {
        Self { reference, args }
    }

    pub fn build(path: &str, positional: PositionalArgs, named: NamedArgs) -> Self {
        Self::new(Ref::build(path), Args::build(positional, named))
    }

    pub fn compile<L: SymbolLookup + ?Sized>(
        &self,
        lookup: &L,
        env: &dyn Environment,
        symbol_table: &Arc<SymbolTable>,
    ) -> Result<CompiledExpression> {
        let not_a_helper = || CompileError::UnknownHelper {
            path: self.reference.display(),
        };
        if self.reference.head == RefHead::This {
            return Err(not_a_helper());
        }

        let parts = self.reference.parts();
        if !env.has_helper(&parts, symbol_table) {
            return Err(not_a_helper());
        }
        let helper = env
            .lookup_helper(&parts, symbol_table)
            .ok_or_else(not_a_helper)?;
        let args = self.args.compile(lookup, env, symbol_table)?;

        Ok(CompiledExpression::Helper {
            name: parts,
            helper,
            args,
            symbol_table: Arc::clone(symbol_table),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HasBlock {
    pub block_name: String,
}

impl HasBlock {
    pub fn build(block_name: &str) -> Self {
        Self {
            block_name: block_name.to_string(),
        }
    }

    pub fn compile<L: SymbolLookup + ?Sized>(&self, lookup: &L) -> CompiledExpression {
        CompiledExpression::HasBlock {
            block_name: self.block_name.clone(),
            block_symbol: lookup.get_block_symbol(&self.block_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HasBlockParams {
    pub block_name: String,
}

impl HasBlockParams {
    pub fn build(block_name: &str) -> Self {
        Self {
            block_name: block_name.to_string(),
        }
    }

    pub fn compile<L: SymbolLookup + ?Sized>(&self, lookup: &L) -> CompiledExpression {
        CompiledExpression::HasBlockParams {
            block_name: self.block_name.clone(),
            block_symbol: lookup.get_block_symbol(&self.block_name),
        }
    }
}

/// String concatenation of its parts' runtime values, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Concat {
    pub parts: Vec<Expression>,
}

impl Concat {
    pub fn build(parts: Vec<Expression>) -> Self {
        Self { parts }
    }

    pub fn compile<L: SymbolLookup + ?Sized>(
        &self,
        lookup: &L,
        env: &dyn Environment,
        symbol_table: &Arc<SymbolTable>,
    ) -> Result<CompiledExpression> {
        let parts = self
            .parts
            .iter()
            .map(|part| part.compile(lookup, env, symbol_table))
            .collect::<Result<Vec<_>>>()?;
        Ok(CompiledExpression::Concat { parts })
    }
}

impl From<Value> for Expression {
    fn from(node: Value) -> Self {
        Expression::Value(node)
    }
}

impl From<Ref> for Expression {
    fn from(node: Ref) -> Self {
        Expression::Ref(node)
    }
}

impl From<Get> for Expression {
    fn from(node: Get) -> Self {
        Expression::Get(node)
    }
}

impl From<Unknown> for Expression {
    fn from(node: Unknown) -> Self {
        Expression::Unknown(node)
    }
}

impl From<GetArgument> for Expression {
    fn from(node: GetArgument) -> Self {
        Expression::GetArgument(node)
    }
}

impl From<Helper> for Expression {
    fn from(node: Helper) -> Self {
        Expression::Helper(node)
    }
}

impl From<HasBlock> for Expression {
    fn from(node: HasBlock) -> Self {
        Expression::HasBlock(node)
    }
}

impl From<HasBlockParams> for Expression {
    fn from(node: HasBlockParams) -> Self {
        Expression::HasBlockParams(node)
    }
}

impl From<Concat> for Expression {
    fn from(node: Concat) -> Self {
        Expression::Concat(node)
    }
}

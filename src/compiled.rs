//! Runtime-evaluable forms produced by expression and argument compilation.
//!
//! Nothing here does name lookup any more: every reference is either a slot
//! ([`Symbol`]), a self path, or a registry handle.

use lazy_static::lazy_static;
use serde_json::{json, Value as Json};
use std::fmt;
use std::sync::Arc;

use crate::environment::HelperId;
use crate::scope::{Symbol, SymbolTable};

#[derive(Debug, Clone)]
pub enum CompiledExpression {
    Value(Json),
    /// Read `path` off the value bound in slot `symbol`. `debug` is the source
    /// name of the head, kept for diagnostics. A missing symbol reads as
    /// undefined at runtime.
    LocalLookup {
        symbol: Option<Symbol>,
        path: Vec<String>,
        debug: String,
    },
    SelfLookup {
        path: Vec<String>,
    },
    Helper {
        name: Vec<String>,
        helper: HelperId,
        args: CompiledArgs,
        symbol_table: Arc<SymbolTable>,
    },
    HasBlock {
        block_name: String,
        block_symbol: Option<Symbol>,
    },
    HasBlockParams {
        block_name: String,
        block_symbol: Option<Symbol>,
    },
    Concat {
        parts: Vec<CompiledExpression>,
    },
}

impl CompiledExpression {
    pub fn kind(&self) -> &'static str {
        match self {
            CompiledExpression::Value(_) => "value",
            CompiledExpression::LocalLookup { .. } => "local-lookup",
            CompiledExpression::SelfLookup { .. } => "self-lookup",
            CompiledExpression::Helper { .. } => "helper",
            CompiledExpression::HasBlock { .. } => "has-block",
            CompiledExpression::HasBlockParams { .. } => "has-block-params",
            CompiledExpression::Concat { .. } => "concat",
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            CompiledExpression::Value(value) => json!({ "type": "value", "value": value }),
            CompiledExpression::LocalLookup {
                symbol,
                path,
                debug,
            } => json!({
                "type": "local-lookup",
                "symbol": symbol.map(Symbol::id),
                "path": path,
                "debug": debug,
            }),
            CompiledExpression::SelfLookup { path } => {
                json!({ "type": "self-lookup", "path": path })
            }
            CompiledExpression::Helper {
                name, helper, args, ..
            } => json!({
                "type": "helper",
                "name": name.join("."),
                "helper": helper.0,
                "args": args.to_json(),
            }),
            CompiledExpression::HasBlock {
                block_name,
                block_symbol,
            } => json!({
                "type": "has-block",
                "blockName": block_name,
                "blockSymbol": block_symbol.map(Symbol::id),
            }),
            CompiledExpression::HasBlockParams {
                block_name,
                block_symbol,
            } => json!({
                "type": "has-block-params",
                "blockName": block_name,
                "blockSymbol": block_symbol.map(Symbol::id),
            }),
            CompiledExpression::Concat { parts } => json!({
                "type": "concat",
                "parts": parts.iter().map(CompiledExpression::to_json).collect::<Vec<_>>(),
            }),
        }
    }
}

fn write_path(f: &mut fmt::Formatter<'_>, path: &[String]) -> fmt::Result {
    for part in path {
        write!(f, ".{}", part)?;
    }
    Ok(())
}

fn write_symbol(f: &mut fmt::Formatter<'_>, symbol: Option<Symbol>) -> fmt::Result {
    match symbol {
        Some(s) => write!(f, "${}", s.id()),
        None => write!(f, "$?"),
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompiledExpression::Value(value) => write!(f, "{}", value),
            CompiledExpression::LocalLookup { symbol, path, .. } => {
                write_symbol(f, *symbol)?;
                write_path(f, path)
            }
            CompiledExpression::SelfLookup { path } => {
                write!(f, "self")?;
                write_path(f, path)
            }
            CompiledExpression::Helper { name, args, .. } => {
                write!(f, "({}", name.join("."))?;
                if !args.is_empty() {
                    write!(f, " {}", args)?;
                }
                write!(f, ")")
            }
            CompiledExpression::HasBlock {
                block_name,
                block_symbol,
            } => {
                write!(f, "has-block({} ", block_name)?;
                write_symbol(f, *block_symbol)?;
                write!(f, ")")
            }
            CompiledExpression::HasBlockParams {
                block_name,
                block_symbol,
            } => {
                write!(f, "has-block-params({} ", block_name)?;
                write_symbol(f, *block_symbol)?;
                write!(f, ")")
            }
            CompiledExpression::Concat { parts } => {
                write!(f, "(concat")?;
                for part in parts {
                    write!(f, " {}", part)?;
                }
                write!(f, ")")
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILED ARGUMENTS
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    static ref EMPTY_COMPILED_POSITIONAL: CompiledPositionalArgs = CompiledPositionalArgs {
        values: Arc::from(Vec::new()),
    };
    static ref EMPTY_COMPILED_NAMED: CompiledNamedArgs = CompiledNamedArgs {
        inner: Arc::new(CompiledNamedInner {
            keys: Vec::new(),
            values: Vec::new(),
        }),
    };
    static ref EMPTY_COMPILED_ARGS: CompiledArgs = CompiledArgs {
        inner: Arc::new(CompiledArgsInner {
            positional: EMPTY_COMPILED_POSITIONAL.clone(),
            named: EMPTY_COMPILED_NAMED.clone(),
        }),
    };
}

#[derive(Debug, Clone)]
pub struct CompiledPositionalArgs {
    values: Arc<[CompiledExpression]>,
}

impl CompiledPositionalArgs {
    pub fn empty() -> Self {
        EMPTY_COMPILED_POSITIONAL.clone()
    }

    pub fn create(values: Vec<CompiledExpression>) -> Self {
        if values.is_empty() {
            Self::empty()
        } else {
            Self {
                values: Arc::from(values),
            }
        }
    }

    pub fn values(&self) -> &[CompiledExpression] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_empty_singleton(&self) -> bool {
        Arc::ptr_eq(&self.values, &EMPTY_COMPILED_POSITIONAL.values)
    }
}

#[derive(Debug)]
struct CompiledNamedInner {
    keys: Vec<String>,
    values: Vec<CompiledExpression>,
}

#[derive(Debug, Clone)]
pub struct CompiledNamedArgs {
    inner: Arc<CompiledNamedInner>,
}

impl CompiledNamedArgs {
    pub fn empty() -> Self {
        EMPTY_COMPILED_NAMED.clone()
    }

    pub fn create(keys: Vec<String>, values: Vec<CompiledExpression>) -> Self {
        if keys.is_empty() {
            Self::empty()
        } else {
            Self {
                inner: Arc::new(CompiledNamedInner { keys, values }),
            }
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.inner.keys
    }

    pub fn values(&self) -> &[CompiledExpression] {
        &self.inner.values
    }

    pub fn get(&self, key: &str) -> Option<&CompiledExpression> {
        let index = self.inner.keys.iter().position(|k| k == key)?;
        self.inner.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.inner.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.keys.is_empty()
    }

    pub fn is_empty_singleton(&self) -> bool {
        Arc::ptr_eq(&self.inner, &EMPTY_COMPILED_NAMED.inner)
    }
}

#[derive(Debug)]
struct CompiledArgsInner {
    positional: CompiledPositionalArgs,
    named: CompiledNamedArgs,
}

#[derive(Debug, Clone)]
pub struct CompiledArgs {
    inner: Arc<CompiledArgsInner>,
}

impl CompiledArgs {
    pub fn empty() -> Self {
        EMPTY_COMPILED_ARGS.clone()
    }

    /// Collapses to the shared empty value when both halves are the shared
    /// empties.
    pub fn create(positional: CompiledPositionalArgs, named: CompiledNamedArgs) -> Self {
        if positional.is_empty_singleton() && named.is_empty_singleton() {
            Self::empty()
        } else {
            Self {
                inner: Arc::new(CompiledArgsInner { positional, named }),
            }
        }
    }

    pub fn positional(&self) -> &CompiledPositionalArgs {
        &self.inner.positional
    }

    pub fn named(&self) -> &CompiledNamedArgs {
        &self.inner.named
    }

    pub fn is_empty(&self) -> bool {
        self.inner.positional.is_empty() && self.inner.named.is_empty()
    }

    pub fn is_empty_singleton(&self) -> bool {
        Arc::ptr_eq(&self.inner, &EMPTY_COMPILED_ARGS.inner)
    }

    pub fn to_json(&self) -> Json {
        let positional: Vec<Json> = self
            .positional()
            .values()
            .iter()
            .map(CompiledExpression::to_json)
            .collect();
        let mut named = serde_json::Map::new();
        for (key, value) in self.named().keys().iter().zip(self.named().values()) {
            named.entry(key.as_str()).or_insert_with(|| value.to_json());
        }
        json!({ "positional": positional, "named": named })
    }
}

impl fmt::Display for CompiledArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for value in self.positional().values() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}", value)?;
            first = false;
        }
        for (key, value) in self.named().keys().iter().zip(self.named().values()) {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}={}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

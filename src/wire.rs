//! Decoding of the serialized tree produced by the upstream parser.
//!
//! Every node is a JSON array whose first element names its kind, e.g.
//! `["static-attr", "class", "x", null]`. Literal expressions are bare JSON
//! scalars.

use serde_json::Value as Json;
use std::collections::HashSet;
use std::sync::Arc;

use crate::args::{Args, NamedArgs, PositionalArgs, Templates};
use crate::element::OpenElement;
use crate::error::{CompileError, Result};
use crate::expression::{
    Concat, Expression, Get, GetArgument, HasBlock, HasBlockParams, Helper, Ref, Unknown, Value,
    SELF_KEYWORD,
};
use crate::options::CompileOptions;
use crate::scanner::BlockScanner;
use crate::scope::SymbolTable;
use crate::statement::{
    Block, CloseElement, Comment, DynamicArg, DynamicAttr, FlushElement, Modifier,
    OptimizedAppend, StaticArg, StaticAttr, Statement, Text, TrustingAttr, Yield,
};

// ═══════════════════════════════════════════════════════════════════════════════
// FIELD ACCESS
// ═══════════════════════════════════════════════════════════════════════════════

fn split_sexp<'j>(sexp: &'j Json, what: &str) -> Result<(&'j str, &'j [Json])> {
    let items = sexp
        .as_array()
        .ok_or_else(|| CompileError::malformed(what, format!("expected an array, got {}", sexp)))?;
    let (tag, rest) = items
        .split_first()
        .ok_or_else(|| CompileError::malformed(what, "empty array"))?;
    let tag = tag
        .as_str()
        .ok_or_else(|| CompileError::malformed(what, format!("non-string kind {}", tag)))?;
    Ok((tag, rest))
}

/// Missing trailing fields read as `null`.
fn field(items: &[Json], index: usize) -> &Json {
    items.get(index).unwrap_or(&Json::Null)
}

fn string_field(items: &[Json], index: usize, kind: &str) -> Result<String> {
    match field(items, index) {
        Json::String(s) => Ok(s.clone()),
        other => Err(CompileError::malformed(
            kind,
            format!("field {} must be a string, got {}", index, other),
        )),
    }
}

fn optional_string_field(items: &[Json], index: usize, kind: &str) -> Result<Option<String>> {
    match field(items, index) {
        Json::Null => Ok(None),
        Json::String(s) => Ok(Some(s.clone())),
        other => Err(CompileError::malformed(
            kind,
            format!("field {} must be a string or null, got {}", index, other),
        )),
    }
}

/// Attribute values are strings on the wire; other scalars are stringified.
fn literal_string_field(items: &[Json], index: usize, kind: &str) -> Result<String> {
    match field(items, index) {
        Json::String(s) => Ok(s.clone()),
        Json::Number(n) => Ok(n.to_string()),
        Json::Bool(b) => Ok(b.to_string()),
        other => Err(CompileError::malformed(
            kind,
            format!("field {} must be a literal, got {}", index, other),
        )),
    }
}

fn string_list(value: &Json, kind: &str) -> Result<Vec<String>> {
    match value {
        Json::Null => Ok(Vec::new()),
        Json::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    CompileError::malformed(kind, format!("expected a string, got {}", item))
                })
            })
            .collect(),
        other => Err(CompileError::malformed(
            kind,
            format!("expected a list of strings, got {}", other),
        )),
    }
}

/// Paths are arrays of segments; a `null` segment stands for `this`. A plain
/// dotted string is accepted as well.
fn path(value: &Json, kind: &str) -> Result<Vec<String>> {
    match value {
        Json::String(s) => Ok(s.split('.').map(str::to_string).collect()),
        Json::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| match item {
                Json::String(s) => Ok(s.clone()),
                Json::Null => Ok(SELF_KEYWORD.to_string()),
                other => Err(CompileError::malformed(
                    kind,
                    format!("invalid path segment {}", other),
                )),
            })
            .collect(),
        other => Err(CompileError::malformed(
            kind,
            format!("expected a path, got {}", other),
        )),
    }
}

fn block_id(value: &Json, kind: &str) -> Result<usize> {
    value
        .as_u64()
        .map(|id| id as usize)
        .ok_or_else(|| CompileError::malformed(kind, format!("invalid block id {}", value)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSIONS
// ═══════════════════════════════════════════════════════════════════════════════

impl Expression {
    pub fn from_spec(sexp: &Json) -> Result<Expression> {
        match sexp {
            Json::Null | Json::Bool(_) | Json::Number(_) | Json::String(_) => {
                Ok(Expression::Value(Value::from_spec(sexp)))
            }
            Json::Array(_) => {
                let (kind, items) = split_sexp(sexp, "expression")?;
                match kind {
                    "get" => Ok(Get::from_spec(items)?.into()),
                    "unknown" => Ok(Unknown::from_spec(items)?.into()),
                    "arg" => Ok(GetArgument::from_spec(items)?.into()),
                    "helper" => Ok(Helper::from_spec(items)?.into()),
                    "has-block" => Ok(HasBlock::from_spec(items)?.into()),
                    "has-block-params" => Ok(HasBlockParams::from_spec(items)?.into()),
                    "concat" => Ok(Concat::from_spec(items)?.into()),
                    other => Err(CompileError::malformed(
                        "expression",
                        format!("unknown expression kind {:?}", other),
                    )),
                }
            }
            Json::Object(_) => Err(CompileError::malformed(
                "expression",
                format!("objects are not expressions: {}", sexp),
            )),
        }
    }
}

impl Value {
    pub fn from_spec(value: &Json) -> Self {
        Self::build(value.clone())
    }
}

impl Get {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        Ok(Self::new(Ref::new(path(field(items, 0), "get")?)))
    }
}

impl Unknown {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        Ok(Self::new(Ref::new(path(field(items, 0), "unknown")?)))
    }
}

impl GetArgument {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        Ok(Self::new(path(field(items, 0), "arg")?))
    }
}

impl Helper {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        let reference = Ref::new(path(field(items, 0), "helper")?);
        let args = Args::from_spec(field(items, 1), field(items, 2))?;
        Ok(Self::new(reference, args))
    }
}

impl HasBlock {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        Ok(Self::build(&string_field(items, 0, "has-block")?))
    }
}

impl HasBlockParams {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        Ok(Self::build(&string_field(items, 0, "has-block-params")?))
    }
}

impl Concat {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        let parts = match field(items, 0) {
            Json::Array(parts) => parts
                .iter()
                .map(Expression::from_spec)
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(CompileError::malformed(
                    "concat",
                    format!("expected a list of parts, got {}", other),
                ))
            }
        };
        Ok(Self::build(parts))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ARGUMENTS
// ═══════════════════════════════════════════════════════════════════════════════

impl PositionalArgs {
    pub fn from_spec(params: &Json) -> Result<Self> {
        match params {
            Json::Null => Ok(Self::empty()),
            Json::Array(values) => Ok(Self::build(
                values
                    .iter()
                    .map(Expression::from_spec)
                    .collect::<Result<Vec<_>>>()?,
            )),
            other => Err(CompileError::malformed(
                "params",
                format!("expected an array or null, got {}", other),
            )),
        }
    }
}

impl NamedArgs {
    /// `[keys, values]` or `null`.
    pub fn from_spec(hash: &Json) -> Result<Self> {
        let pair = match hash {
            Json::Null => return Ok(Self::empty()),
            Json::Array(pair) if pair.len() == 2 => pair,
            other => {
                return Err(CompileError::malformed(
                    "hash",
                    format!("expected [keys, values] or null, got {}", other),
                ))
            }
        };

        let keys = string_list(&pair[0], "hash")?;
        let values = match &pair[1] {
            Json::Array(values) => values
                .iter()
                .map(Expression::from_spec)
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(CompileError::malformed(
                    "hash",
                    format!("expected a list of values, got {}", other),
                ))
            }
        };
        if keys.len() != values.len() {
            return Err(CompileError::malformed(
                "hash",
                format!("{} keys but {} values", keys.len(), values.len()),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = keys.iter().find(|key| !seen.insert(key.as_str())) {
            return Err(CompileError::malformed(
                "hash",
                format!("duplicate key {:?}", duplicate),
            ));
        }

        Ok(Self::build(keys, values))
    }
}

impl Args {
    pub fn from_spec(params: &Json, hash: &Json) -> Result<Self> {
        Ok(Self::build(
            PositionalArgs::from_spec(params)?,
            NamedArgs::from_spec(hash)?,
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

impl Statement {
    /// Decodes one statement. `symbol_table` is the table of the block being
    /// scanned; block statements decode their bodies through `scanner`.
    pub fn from_spec<S: BlockScanner + ?Sized>(
        sexp: &Json,
        symbol_table: &Arc<SymbolTable>,
        scanner: &mut S,
        options: &CompileOptions,
    ) -> Result<Statement> {
        let (kind, items) = split_sexp(sexp, "statement")?;
        let statement: Statement = match kind {
            "text" => Text::from_spec(items)?.into(),
            "comment" => Comment::from_spec(items)?.into(),
            "open-element" => OpenElement::from_spec(items, symbol_table)?.into(),
            "flush-element" => FlushElement::build().into(),
            "close-element" => CloseElement::build().into(),
            "static-attr" => StaticAttr::from_spec(items)?.into(),
            "dynamic-attr" => DynamicAttr::from_spec(items)?.into(),
            "trusting-attr" => TrustingAttr::from_spec(items)?.into(),
            "static-arg" => StaticArg::from_spec(items)?.into(),
            "dynamic-arg" => DynamicArg::from_spec(items)?.into(),
            "append" => {
                let append = OptimizedAppend::from_spec(items)?;
                if options.deopt_appends {
                    append.deopt().into()
                } else {
                    append.into()
                }
            }
            "modifier" => Modifier::from_spec(items)?.into(),
            "block" => Block::from_spec(items, symbol_table, scanner)?.into(),
            "yield" => Yield::from_spec(items)?.into(),
            other => {
                return Err(CompileError::malformed(
                    "statement",
                    format!("unknown statement kind {:?}", other),
                ))
            }
        };
        Ok(statement)
    }
}

impl Text {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        Ok(Self::build(&string_field(items, 0, "text")?))
    }
}

impl Comment {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        Ok(Self::build(&string_field(items, 0, "comment")?))
    }
}

impl OpenElement {
    pub fn from_spec(items: &[Json], symbol_table: &Arc<SymbolTable>) -> Result<Self> {
        let tag = string_field(items, 0, "open-element")?;
        let block_params = string_list(field(items, 1), "open-element")?;
        Ok(Self::build(&tag, block_params, Arc::clone(symbol_table)))
    }
}

impl StaticAttr {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        let name = string_field(items, 0, "static-attr")?;
        let value = literal_string_field(items, 1, "static-attr")?;
        let namespace = optional_string_field(items, 2, "static-attr")?;
        Ok(Self::build(&name, &value, namespace.as_deref()))
    }
}

impl DynamicAttr {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        let name = string_field(items, 0, "dynamic-attr")?;
        let value = Expression::from_spec(field(items, 1))?;
        let namespace = optional_string_field(items, 2, "dynamic-attr")?;
        Ok(Self::build(&name, value, false, namespace.as_deref()))
    }
}

impl TrustingAttr {
    pub fn from_spec(items: &[Json]) -> Result<DynamicAttr> {
        let name = string_field(items, 0, "trusting-attr")?;
        let value = Expression::from_spec(field(items, 1))?;
        let namespace = optional_string_field(items, 2, "trusting-attr")?;
        Ok(Self::build(&name, value, namespace.as_deref()))
    }
}

impl StaticArg {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        let name = string_field(items, 0, "static-arg")?;
        let value = literal_string_field(items, 1, "static-arg")?;
        Ok(Self::build(&name, &value))
    }
}

impl DynamicArg {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        let name = string_field(items, 0, "dynamic-arg")?;
        let value = Expression::from_spec(field(items, 1))?;
        Ok(Self::build(&name, value))
    }
}

impl OptimizedAppend {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        let value = Expression::from_spec(field(items, 0))?;
        let trusting_morph = match field(items, 1) {
            Json::Null => false,
            Json::Bool(b) => *b,
            other => {
                return Err(CompileError::malformed(
                    "append",
                    format!("trusting flag must be a boolean, got {}", other),
                ))
            }
        };
        Ok(Self {
            value,
            trusting_morph,
        })
    }
}

impl Modifier {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        Ok(Self {
            path: path(field(items, 0), "modifier")?,
            args: Args::from_spec(field(items, 1), field(items, 2))?,
        })
    }
}

impl Block {
    /// `["block", path, params, hash, templateId, inverseId | null]`.
    pub fn from_spec<S: BlockScanner + ?Sized>(
        items: &[Json],
        symbol_table: &Arc<SymbolTable>,
        scanner: &mut S,
    ) -> Result<Self> {
        let block_path = path(field(items, 0), "block")?;
        let args = Args::from_spec(field(items, 1), field(items, 2))?;

        let template_id = block_id(field(items, 3), "block")?;
        let template = scanner.block_for(symbol_table, template_id)?;
        let inverse = match field(items, 4) {
            Json::Null => None,
            id => Some(scanner.block_for(symbol_table, block_id(id, "block")?)?),
        };

        Ok(Self::build(block_path, args, Templates::from_spec(template, inverse)))
    }
}

impl Yield {
    pub fn from_spec(items: &[Json]) -> Result<Self> {
        let to = string_field(items, 0, "yield")?;
        let args = Args::from_spec(field(items, 1), &Json::Null)?;
        Ok(Self::new(&to, args))
    }
}

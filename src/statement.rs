//! Statement syntax.
//!
//! A statement appends zero or more opcodes when compiled. Statements are
//! visited once by the scan pass, which may rewrite them (see
//! [`OpenElement::scan`]), and once by the compile pass, in document order.

use std::sync::Arc;

use crate::args::{Args, PositionalArgs, Templates};
use crate::builder::CompileInto;
use crate::element::{Component, OpenElement, OpenPrimitiveElement};
use crate::environment::Environment;
use crate::error::{display_path, CompileError, InternalError, Result};
use crate::expression::{Expression, Value};
use crate::opcode::{CloseBlockOpcode, Opcode, OpenBlockOpcode};
use crate::scanner::BlockScanner;
use crate::scope::SymbolTable;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Text(Text),
    Comment(Comment),
    OpenElement(OpenElement),
    OpenPrimitiveElement(OpenPrimitiveElement),
    FlushElement(FlushElement),
    CloseElement(CloseElement),
    StaticAttr(StaticAttr),
    DynamicAttr(DynamicAttr),
    StaticArg(StaticArg),
    DynamicArg(DynamicArg),
    OptimizedAppend(OptimizedAppend),
    UnoptimizedAppend(UnoptimizedAppend),
    Modifier(Modifier),
    Block(Block),
    Component(Component),
    Yield(Yield),
}

/// What a statement can contribute to a component invocation.
#[derive(Clone, Copy)]
pub enum SyntaxRole<'a> {
    Attribute(&'a dyn ParameterSyntax),
    Argument(&'a dyn ParameterSyntax),
    Modifier,
    Other,
}

/// A statement that carries a name and an equivalent value expression.
pub trait ParameterSyntax {
    fn name(&self) -> &str;
    fn value_syntax(&self) -> Expression;
}

impl Statement {
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Text(_) => "text",
            Statement::Comment(_) => "comment",
            Statement::OpenElement(_) => "open-element",
            Statement::OpenPrimitiveElement(_) => "open-primitive-element",
            Statement::FlushElement(_) => "flush-element",
            Statement::CloseElement(_) => "close-element",
            Statement::StaticAttr(_) => "static-attr",
            Statement::DynamicAttr(_) => "dynamic-attr",
            Statement::StaticArg(_) => "static-arg",
            Statement::DynamicArg(_) => "dynamic-arg",
            Statement::OptimizedAppend(_) => "optimized-append",
            Statement::UnoptimizedAppend(_) => "unoptimized-append",
            Statement::Modifier(_) => "modifier",
            Statement::Block(_) => "block",
            Statement::Component(_) => "component",
            Statement::Yield(_) => "yield",
        }
    }

    pub fn role(&self) -> SyntaxRole<'_> {
        match self {
            Statement::StaticAttr(attr) => SyntaxRole::Attribute(attr),
            Statement::DynamicAttr(attr) => SyntaxRole::Attribute(attr),
            Statement::StaticArg(arg) => SyntaxRole::Argument(arg),
            Statement::DynamicArg(arg) => SyntaxRole::Argument(arg),
            Statement::Modifier(_) => SyntaxRole::Modifier,
            _ => SyntaxRole::Other,
        }
    }

    /// Scan-time rewrite. Identity for everything except open-element, which
    /// becomes a component or a primitive element, and block, which registers
    /// its templates as children of the current block.
    pub fn scan<S: BlockScanner + ?Sized>(self, scanner: &mut S) -> Result<Statement> {
        match self {
            Statement::OpenElement(open) => open.scan(scanner),
            Statement::Block(block) => {
                block.scan(scanner);
                Ok(Statement::Block(block))
            }
            other => Ok(other),
        }
    }

    pub fn compile<C: CompileInto + ?Sized>(
        &self,
        compiler: &mut C,
        env: &dyn Environment,
        symbol_table: &Arc<SymbolTable>,
    ) -> Result<()> {
        match self {
            Statement::Text(text) => text.compile(compiler),
            Statement::Comment(comment) => comment.compile(compiler),
            Statement::OpenElement(open) => open.compile(compiler),
            Statement::OpenPrimitiveElement(open) => open.compile(compiler),
            Statement::FlushElement(flush) => flush.compile(compiler),
            Statement::CloseElement(close) => close.compile(compiler),
            Statement::StaticAttr(attr) => attr.compile(compiler),
            Statement::DynamicAttr(attr) => attr.compile(compiler, env, symbol_table)?,
            Statement::StaticArg(arg) => arg.compile()?,
            Statement::DynamicArg(arg) => arg.compile()?,
            Statement::OptimizedAppend(append) => append.compile(compiler, env, symbol_table)?,
            Statement::UnoptimizedAppend(append) => append.compile(compiler, env, symbol_table)?,
            Statement::Modifier(modifier) => modifier.compile(compiler, env, symbol_table)?,
            Statement::Block(block) => block.compile()?,
            Statement::Component(component) => component.compile(compiler, env, symbol_table)?,
            Statement::Yield(yield_) => yield_.compile(compiler, env, symbol_table)?,
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTENT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub content: String,
}

impl Text {
    pub fn build(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    pub fn compile<C: CompileInto + ?Sized>(&self, compiler: &mut C) {
        compiler.text(&self.content);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub comment: String,
}

impl Comment {
    pub fn build(comment: &str) -> Self {
        Self {
            comment: comment.to_string(),
        }
    }

    pub fn compile<C: CompileInto + ?Sized>(&self, compiler: &mut C) {
        compiler.comment(&self.comment);
    }
}

/// Entry point for append statements. Serialized appends always start out
/// optimized; see [`OptimizedAppend::deopt`].
pub struct Append;

impl Append {
    pub fn build(value: Expression, trusting_morph: bool) -> OptimizedAppend {
        OptimizedAppend {
            value,
            trusting_morph,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedAppend {
    pub value: Expression,
    /// Insert as markup rather than escaped text.
    pub trusting_morph: bool,
}

impl OptimizedAppend {
    pub fn deopt(&self) -> UnoptimizedAppend {
        UnoptimizedAppend {
            value: self.value.clone(),
            trusting_morph: self.trusting_morph,
        }
    }

    pub fn compile<C: CompileInto + ?Sized>(
        &self,
        compiler: &mut C,
        env: &dyn Environment,
        symbol_table: &Arc<SymbolTable>,
    ) -> Result<()> {
        let expression = self.value.compile(&*compiler, env, symbol_table)?;
        compiler.append(Opcode::PutValue { expression });

        if self.trusting_morph {
            compiler.append(Opcode::OptimizedTrustingAppend);
        } else {
            compiler.append(Opcode::OptimizedCautiousAppend);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnoptimizedAppend {
    pub value: Expression,
    pub trusting_morph: bool,
}

impl UnoptimizedAppend {
    pub fn compile<C: CompileInto + ?Sized>(
        &self,
        compiler: &mut C,
        env: &dyn Environment,
        symbol_table: &Arc<SymbolTable>,
    ) -> Result<()> {
        let expression = self.value.compile(&*compiler, env, symbol_table)?;
        let symbol_table = Arc::clone(symbol_table);

        if self.trusting_morph {
            compiler.append(Opcode::GuardedTrustingAppend {
                expression,
                symbol_table,
            });
        } else {
            compiler.append(Opcode::GuardedCautiousAppend {
                expression,
                symbol_table,
            });
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ELEMENT STRUCTURE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlushElement;

impl FlushElement {
    pub fn build() -> Self {
        Self
    }

    pub fn compile<C: CompileInto + ?Sized>(&self, compiler: &mut C) {
        compiler.append(Opcode::FlushElement);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CloseElement;

impl CloseElement {
    pub fn build() -> Self {
        Self
    }

    pub fn compile<C: CompileInto + ?Sized>(&self, compiler: &mut C) {
        compiler.append(Opcode::CloseElement);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ATTRIBUTES & ARGUMENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct StaticAttr {
    pub name: String,
    pub value: String,
    pub namespace: Option<String>,
}

impl StaticAttr {
    pub fn build(name: &str, value: &str, namespace: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            namespace: namespace.map(str::to_string),
        }
    }

    pub fn compile<C: CompileInto + ?Sized>(&self, compiler: &mut C) {
        compiler.append(Opcode::StaticAttr {
            name: self.name.clone(),
            value: self.value.clone(),
            namespace: self.namespace.clone(),
        });
    }
}

impl ParameterSyntax for StaticAttr {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_syntax(&self) -> Expression {
        Expression::Value(Value::build(self.value.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicAttr {
    pub name: String,
    pub value: Expression,
    pub namespace: Option<String>,
    pub is_trusting: bool,
}

impl DynamicAttr {
    pub fn build(
        name: &str,
        value: Expression,
        is_trusting: bool,
        namespace: Option<&str>,
    ) -> Self {
        Self {
            name: name.to_string(),
            value,
            namespace: namespace.map(str::to_string),
            is_trusting,
        }
    }

    pub fn compile<C: CompileInto + ?Sized>(
        &self,
        compiler: &mut C,
        env: &dyn Environment,
        symbol_table: &Arc<SymbolTable>,
    ) -> Result<()> {
        let expression = self.value.compile(&*compiler, env, symbol_table)?;
        compiler.append(Opcode::PutValue { expression });

        match &self.namespace {
            Some(namespace) => compiler.append(Opcode::DynamicAttrNS {
                name: self.name.clone(),
                namespace: namespace.clone(),
                is_trusting: self.is_trusting,
            }),
            None => compiler.append(Opcode::DynamicAttr {
                name: self.name.clone(),
                is_trusting: self.is_trusting,
            }),
        }
        Ok(())
    }
}

impl ParameterSyntax for DynamicAttr {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_syntax(&self) -> Expression {
        self.value.clone()
    }
}

/// Shorthand that materializes as a trusting [`DynamicAttr`]. It never
/// reaches the compile pass on its own.
pub struct TrustingAttr;

impl TrustingAttr {
    pub fn build(name: &str, value: Expression, namespace: Option<&str>) -> DynamicAttr {
        DynamicAttr::build(name, value, true, namespace)
    }

    pub fn compile(&self) -> Result<()> {
        Err(InternalError::DelegateCompiled {
            kind: "TrustingAttr",
            name: String::new(),
        }
        .into())
    }
}

/// `@name="literal"` on a component invocation. Only read while gathering
/// component arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticArg {
    pub name: String,
    pub value: String,
}

impl StaticArg {
    pub fn build(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn compile(&self) -> Result<()> {
        Err(InternalError::DelegateCompiled {
            kind: "StaticArg",
            name: self.name.clone(),
        }
        .into())
    }
}

impl ParameterSyntax for StaticArg {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_syntax(&self) -> Expression {
        Expression::Value(Value::build(self.value.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicArg {
    pub name: String,
    pub value: Expression,
    pub namespace: Option<String>,
}

impl DynamicArg {
    pub fn build(name: &str, value: Expression) -> Self {
        Self {
            name: name.to_string(),
            value,
            namespace: None,
        }
    }

    pub fn compile(&self) -> Result<()> {
        Err(InternalError::DelegateCompiled {
            kind: "DynamicArg",
            name: self.name.clone(),
        }
        .into())
    }
}

impl ParameterSyntax for DynamicArg {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_syntax(&self) -> Expression {
        self.value.clone()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MODIFIERS, BLOCKS, YIELD
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    pub path: Vec<String>,
    pub args: Args,
}

impl Modifier {
    pub fn build(path: &str, args: Args) -> Self {
        Self {
            path: path.split('.').map(str::to_string).collect(),
            args,
        }
    }

    pub fn compile<C: CompileInto + ?Sized>(
        &self,
        compiler: &mut C,
        env: &dyn Environment,
        symbol_table: &Arc<SymbolTable>,
    ) -> Result<()> {
        let args = self.args.compile(&*compiler, env, symbol_table)?;

        let not_a_modifier = || CompileError::UnknownModifier {
            path: display_path(&self.path),
        };
        if !env.has_modifier(&self.path, symbol_table) {
            return Err(not_a_modifier());
        }
        let modifier = env
            .lookup_modifier(&self.path, symbol_table)
            .ok_or_else(not_a_modifier)?;

        compiler.append(Opcode::Modifier {
            name: self.path.first().cloned().unwrap_or_default(),
            modifier,
            args,
        });
        Ok(())
    }
}

/// `{{#path args}}...{{else}}...{{/path}}` with its bodies already resolved
/// to blocks. Only the scan step is meaningful; the surrounding pipeline
/// lowers it before compile.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub path: Vec<String>,
    pub args: Args,
    pub templates: Templates,
}

impl Block {
    pub fn build(path: Vec<String>, args: Args, templates: Templates) -> Self {
        Self {
            path,
            args,
            templates,
        }
    }

    pub fn scan<S: BlockScanner + ?Sized>(&self, scanner: &mut S) {
        if let Some(default) = &self.templates.default {
            scanner.add_child(default);
        }
        if let Some(inverse) = &self.templates.inverse {
            scanner.add_child(inverse);
        }
    }

    pub fn compile(&self) -> Result<()> {
        Err(InternalError::UnscannedBlock {
            path: display_path(&self.path),
        }
        .into())
    }
}

/// `{{yield args to="label"}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Yield {
    pub to: String,
    pub args: Args,
}

impl Yield {
    pub fn new(to: &str, args: Args) -> Self {
        Self {
            to: to.to_string(),
            args,
        }
    }

    pub fn build(params: Vec<Expression>, to: &str) -> Self {
        Self::new(
            to,
            Args::from_positional_args(PositionalArgs::build(params)),
        )
    }

    /// An unresolved label is not an error: yielding to a block the caller
    /// did not supply is a runtime no-op.
    pub fn compile<C: CompileInto + ?Sized>(
        &self,
        compiler: &mut C,
        env: &dyn Environment,
        symbol_table: &Arc<SymbolTable>,
    ) -> Result<()> {
        let to = compiler.get_block_symbol(&self.to);
        let args = self.args.compile(&*compiler, env, symbol_table)?;

        compiler.append(Opcode::OpenBlock(OpenBlockOpcode {
            to,
            label: self.to.clone(),
            args,
        }));
        compiler.append(Opcode::CloseBlock(CloseBlockOpcode));
        Ok(())
    }
}

macro_rules! impl_from_statement {
    ($($node:ident),* $(,)?) => {
        $(
            impl From<$node> for Statement {
                fn from(node: $node) -> Self {
                    Statement::$node(node)
                }
            }
        )*
    };
}

impl_from_statement!(
    Text,
    Comment,
    OpenElement,
    OpenPrimitiveElement,
    FlushElement,
    CloseElement,
    StaticAttr,
    DynamicAttr,
    StaticArg,
    DynamicArg,
    OptimizedAppend,
    UnoptimizedAppend,
    Modifier,
    Block,
    Component,
    Yield,
);

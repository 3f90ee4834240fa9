//! Opcode definitions and the program they are appended to.
//!
//! Opcodes are data. The execution engine owns their evaluation, with the
//! exception of the named-block pair ([`OpenBlockOpcode`] and
//! [`CloseBlockOpcode`]), whose runtime contract is defined here against the
//! [`VirtualMachine`] seam.

use serde_json::{json, Value as Json};
use std::fmt;
use std::sync::Arc;

use crate::args::Templates;
use crate::compiled::{CompiledArgs, CompiledExpression};
use crate::environment::{ComponentDefinitionId, ModifierId};
use crate::scope::{Symbol, SymbolTable};

#[derive(Debug, Clone)]
pub enum Opcode {
    // === Content ===
    Text {
        text: String,
    },
    Comment {
        comment: String,
    },
    /// Insert the value on the evaluation slot, escaped, without a guard.
    OptimizedCautiousAppend,
    /// Insert the value on the evaluation slot as markup, without a guard.
    OptimizedTrustingAppend,
    GuardedCautiousAppend {
        expression: CompiledExpression,
        symbol_table: Arc<SymbolTable>,
    },
    GuardedTrustingAppend {
        expression: CompiledExpression,
        symbol_table: Arc<SymbolTable>,
    },

    // === Elements ===
    OpenPrimitiveElement {
        tag: String,
    },
    FlushElement,
    CloseElement,
    StaticAttr {
        name: String,
        value: String,
        namespace: Option<String>,
    },
    /// Set the attribute from the value on the evaluation slot.
    DynamicAttr {
        name: String,
        is_trusting: bool,
    },
    DynamicAttrNS {
        name: String,
        namespace: String,
        is_trusting: bool,
    },
    Modifier {
        name: String,
        modifier: ModifierId,
        args: CompiledArgs,
    },

    // === Evaluation ===
    PutValue {
        expression: CompiledExpression,
    },

    // === Components ===
    PutComponentDefinition {
        definition: ComponentDefinitionId,
    },
    OpenComponent {
        args: CompiledArgs,
        shadow: Vec<String>,
        templates: Templates,
    },
    CloseComponent,

    // === Blocks ===
    OpenBlock(OpenBlockOpcode),
    CloseBlock(CloseBlockOpcode),
}

impl Opcode {
    pub fn kind(&self) -> &'static str {
        match self {
            Opcode::Text { .. } => "text",
            Opcode::Comment { .. } => "comment",
            Opcode::OptimizedCautiousAppend => "optimized-cautious-append",
            Opcode::OptimizedTrustingAppend => "optimized-trusting-append",
            Opcode::GuardedCautiousAppend { .. } => "guarded-cautious-append",
            Opcode::GuardedTrustingAppend { .. } => "guarded-trusting-append",
            Opcode::OpenPrimitiveElement { .. } => "open-primitive-element",
            Opcode::FlushElement => "flush-element",
            Opcode::CloseElement => "close-element",
            Opcode::StaticAttr { .. } => "static-attr",
            Opcode::DynamicAttr { .. } => "dynamic-attr",
            Opcode::DynamicAttrNS { .. } => "dynamic-attr-ns",
            Opcode::Modifier { .. } => "modifier",
            Opcode::PutValue { .. } => "put-value",
            Opcode::PutComponentDefinition { .. } => "put-component-definition",
            Opcode::OpenComponent { .. } => "open-component",
            Opcode::CloseComponent => "close-component",
            Opcode::OpenBlock(_) => "open-block",
            Opcode::CloseBlock(_) => "close-block",
        }
    }

    /// Debug record of the opcode: `{ "type": kind, ...fields }`.
    pub fn to_json(&self) -> Json {
        let kind = self.kind();
        match self {
            Opcode::Text { text } => json!({ "type": kind, "text": text }),
            Opcode::Comment { comment } => json!({ "type": kind, "comment": comment }),
            Opcode::OptimizedCautiousAppend
            | Opcode::OptimizedTrustingAppend
            | Opcode::FlushElement
            | Opcode::CloseElement
            | Opcode::CloseComponent
            | Opcode::CloseBlock(_) => json!({ "type": kind }),
            Opcode::GuardedCautiousAppend { expression, .. }
            | Opcode::GuardedTrustingAppend { expression, .. }
            | Opcode::PutValue { expression } => {
                json!({ "type": kind, "expression": expression.to_json() })
            }
            Opcode::OpenPrimitiveElement { tag } => json!({ "type": kind, "tag": tag }),
            Opcode::StaticAttr {
                name,
                value,
                namespace,
            } => json!({ "type": kind, "name": name, "value": value, "namespace": namespace }),
            Opcode::DynamicAttr { name, is_trusting } => {
                json!({ "type": kind, "name": name, "isTrusting": is_trusting })
            }
            Opcode::DynamicAttrNS {
                name,
                namespace,
                is_trusting,
            } => json!({
                "type": kind,
                "name": name,
                "namespace": namespace,
                "isTrusting": is_trusting,
            }),
            Opcode::Modifier {
                name,
                modifier,
                args,
            } => json!({
                "type": kind,
                "name": name,
                "modifier": modifier.0,
                "args": args.to_json(),
            }),
            Opcode::PutComponentDefinition { definition } => {
                json!({ "type": kind, "definition": definition.0 })
            }
            Opcode::OpenComponent {
                args,
                shadow,
                templates,
            } => json!({
                "type": kind,
                "args": args.to_json(),
                "shadow": shadow,
                "hasDefault": templates.default.is_some(),
                "hasInverse": templates.inverse.is_some(),
            }),
            Opcode::OpenBlock(open) => json!({
                "type": kind,
                "to": open.to.map(Symbol::id),
                "label": open.label,
                "args": open.args.to_json(),
            }),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind();
        match self {
            Opcode::Text { text } => write!(f, "{} {:?}", kind, text),
            Opcode::Comment { comment } => write!(f, "{} {:?}", kind, comment),
            Opcode::GuardedCautiousAppend { expression, .. }
            | Opcode::GuardedTrustingAppend { expression, .. }
            | Opcode::PutValue { expression } => write!(f, "{} {}", kind, expression),
            Opcode::OpenPrimitiveElement { tag } => write!(f, "{} <{}>", kind, tag),
            Opcode::StaticAttr {
                name,
                value,
                namespace: Some(ns),
            } => write!(f, "{} {}:{}={:?}", kind, ns, name, value),
            Opcode::StaticAttr { name, value, .. } => write!(f, "{} {}={:?}", kind, name, value),
            Opcode::DynamicAttr { name, .. } => write!(f, "{} {}", kind, name),
            Opcode::DynamicAttrNS {
                name, namespace, ..
            } => write!(f, "{} {}:{}", kind, namespace, name),
            Opcode::Modifier { name, args, .. } => write!(f, "{} {} {}", kind, name, args),
            Opcode::PutComponentDefinition { definition } => {
                write!(f, "{} #{}", kind, definition.0)
            }
            Opcode::OpenComponent { args, shadow, .. } => {
                write!(f, "{} [{}] {}", kind, shadow.join(", "), args)
            }
            Opcode::OpenBlock(open) => write!(f, "{} {} {}", kind, open.label, open.args),
            _ => write!(f, "{}", kind),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAMED BLOCK INVOCATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Runtime operations the named-block opcodes need from the execution engine.
pub trait VirtualMachine {
    type Block;
    type Args;

    /// Block bound to `symbol` in the current scope, if the caller supplied one.
    fn get_block(&self, symbol: Symbol) -> Option<Self::Block>;
    fn evaluate_args(&mut self, args: &CompiledArgs) -> Self::Args;
    fn push_caller_scope(&mut self);
    fn invoke_block(&mut self, block: Self::Block, args: Self::Args);
    fn pop_scope(&mut self);
}

#[derive(Debug, Clone)]
pub struct OpenBlockOpcode {
    /// `None` when the label was never assigned a slot; evaluates as if the
    /// block is absent.
    pub to: Option<Symbol>,
    pub label: String,
    pub args: CompiledArgs,
}

impl OpenBlockOpcode {
    /// Arguments are only evaluated when there is a block to receive them.
    /// The caller scope is pushed either way so [`CloseBlockOpcode`] can pop
    /// unconditionally.
    pub fn evaluate<V: VirtualMachine + ?Sized>(&self, vm: &mut V) {
        let block = self.to.and_then(|symbol| vm.get_block(symbol));
        let args = block.as_ref().map(|_| vm.evaluate_args(&self.args));

        vm.push_caller_scope();

        if let (Some(block), Some(args)) = (block, args) {
            vm.invoke_block(block, args);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CloseBlockOpcode;

impl CloseBlockOpcode {
    pub fn evaluate<V: VirtualMachine + ?Sized>(&self, vm: &mut V) {
        vm.pop_scope();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROGRAM
// ═══════════════════════════════════════════════════════════════════════════════

/// Append-only opcode sequence. Order is the only addressing scheme.
#[derive(Debug, Clone, Default)]
pub struct Program {
    opcodes: Vec<Opcode>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, opcode: Opcode) {
        self.opcodes.push(opcode);
    }

    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Opcode> {
        self.opcodes.iter()
    }

    pub fn opcodes(&self) -> &[Opcode] {
        &self.opcodes
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.opcodes.iter().map(Opcode::kind).collect()
    }

    pub fn disassemble(&self) -> Vec<String> {
        self.opcodes
            .iter()
            .enumerate()
            .map(|(position, opcode)| format!("{:04} {}", position, opcode))
            .collect()
    }

    pub fn to_debug_json(&self) -> Json {
        Json::Array(self.opcodes.iter().map(Opcode::to_json).collect())
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Opcode;
    type IntoIter = std::slice::Iter<'a, Opcode>;

    fn into_iter(self) -> Self::IntoIter {
        self.opcodes.iter()
    }
}

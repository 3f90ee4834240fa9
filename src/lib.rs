//! # Opcode Compiler
//!
//! Lowers a parsed template tree into a linear opcode program for a
//! template virtual machine.
//!
//! ## Pipeline
//!
//! 1. **Decode**: serialized statements (JSON arrays tagged by kind) become
//!    [`Statement`] and [`Expression`] nodes (`wire`).
//! 2. **Scan**: each statement is visited once by a [`BlockScanner`]. An open
//!    tag naming a registered component is rewritten into a [`Component`]
//!    that owns its parameters and body; everything else passes through.
//! 3. **Compile**: statements append opcodes to an [`OpcodeBuilder`] in
//!    document order. Names resolve in a fixed order: `this` paths are self
//!    lookups, block parameters shadow self properties, and a bare name that
//!    the environment knows as a helper becomes a helper call.
//!
//! ## Error Contract
//!
//! Every [`CompileError`] is fatal for the template. Unknown helpers,
//! modifiers and components are template errors. [`InternalError`] marks a
//! pipeline bug, such as compiling a delegate node directly.

pub mod args;
pub mod builder;
pub mod compiled;
pub mod compiler;
pub mod element;
pub mod environment;
pub mod error;
pub mod expression;
pub mod opcode;
pub mod options;
pub mod scanner;
pub mod scope;
pub mod statement;
mod wire;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod expression_tests;
#[cfg(test)]
mod wire_tests;

pub use args::{Args, NamedArgs, PositionalArgs, Templates};
pub use builder::{CompileInto, OpcodeBuilder};
pub use compiled::{CompiledArgs, CompiledExpression, CompiledNamedArgs, CompiledPositionalArgs};
pub use compiler::{
    compile_block, compile_statements, compile_template, compile_template_json, error_record,
    CompiledTemplate,
};
pub use element::{Component, OpenElement, OpenPrimitiveElement};
pub use environment::{
    ComponentDefinitionId, Environment, EnvironmentConfig, HelperId, ModifierId,
    StaticEnvironment,
};
pub use error::{CompileError, InternalError, Result};
pub use expression::Expression;
pub use opcode::{CloseBlockOpcode, Opcode, OpenBlockOpcode, Program, VirtualMachine};
pub use options::CompileOptions;
pub use scanner::{
    BlockScanner, InlineBlock, SerializedBlock, SerializedTemplate, StatementScanner,
};
pub use scope::{Symbol, SymbolLookup, SymbolTable};
pub use statement::{ParameterSyntax, Statement, SyntaxRole};

#[cfg(feature = "napi")]
pub use compiler::compile_template_native;

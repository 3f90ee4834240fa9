//! Compile driver.
//!
//! Lowers scanned statements into a [`Program`], one builder per block, in
//! document order. The first error aborts the whole compile.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde_json::{json, Value as Json};
use std::sync::Arc;

use crate::builder::OpcodeBuilder;
use crate::environment::{Environment, EnvironmentConfig, StaticEnvironment};
use crate::error::{CompileError, Result};
use crate::opcode::Program;
use crate::options::CompileOptions;
use crate::scanner::{InlineBlock, SerializedTemplate, StatementScanner};
use crate::scope::SymbolTable;
use crate::statement::Statement;

pub fn compile_statements(
    statements: &[Statement],
    env: &dyn Environment,
    symbol_table: &Arc<SymbolTable>,
    options: &CompileOptions,
) -> Result<Program> {
    tracing::debug!(statements = statements.len(), "compiling statements");

    let mut builder =
        OpcodeBuilder::new(Arc::clone(symbol_table)).with_tracing(options.trace_opcodes);
    for statement in statements {
        if let Err(err) = statement.compile(&mut builder, env, symbol_table) {
            tracing::warn!(
                code = err.code(),
                kind = statement.kind(),
                error = %err,
                "compile failed"
            );
            return Err(err);
        }
    }

    let program = builder.into_program();
    tracing::debug!(opcodes = program.len(), "compiled statements");
    Ok(program)
}

/// Compiles a block's own statements against the block's symbol table.
/// Nested blocks are left alone.
pub fn compile_block(
    block: &InlineBlock,
    env: &dyn Environment,
    options: &CompileOptions,
) -> Result<Program> {
    compile_statements(&block.statements, env, &block.symbol_table, options)
}

// ═══════════════════════════════════════════════════════════════════════════════
// WHOLE TEMPLATES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    pub program: Program,
    /// Programs of every nested block, depth-first in the order the scan pass
    /// registered them.
    pub blocks: Vec<Program>,
}

impl CompiledTemplate {
    pub fn to_debug_json(&self) -> Json {
        json!({
            "program": self.program.to_debug_json(),
            "blocks": self.blocks.iter().map(Program::to_debug_json).collect::<Vec<_>>(),
        })
    }
}

/// Scans then compiles a serialized template.
pub fn compile_template(
    template: &SerializedTemplate,
    env: &dyn Environment,
    options: &CompileOptions,
) -> Result<CompiledTemplate> {
    let entry = StatementScanner::scan_template(env, template, *options)?;
    let program = compile_block(&entry, env, options)?;

    let mut blocks = Vec::new();
    collect_blocks(&entry, env, options, &mut blocks)?;

    tracing::debug!(
        opcodes = program.len(),
        blocks = blocks.len(),
        "compiled template"
    );
    Ok(CompiledTemplate { program, blocks })
}

fn collect_blocks(
    block: &Arc<InlineBlock>,
    env: &dyn Environment,
    options: &CompileOptions,
    out: &mut Vec<Program>,
) -> Result<()> {
    for child in &block.children {
        out.push(compile_block(child, env, options)?);
        collect_blocks(child, env, options, out)?;
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON ENTRY POINT
// ═══════════════════════════════════════════════════════════════════════════════

/// Compiles a template given as JSON against a registry given as JSON and
/// returns the debug form of the result. An empty `options_json` means the
/// defaults.
pub fn compile_template_json(
    template_json: &str,
    environment_json: &str,
    options_json: &str,
) -> Result<Json> {
    let template: SerializedTemplate = serde_json::from_str(template_json)
        .map_err(|e| CompileError::malformed("template", e.to_string()))?;
    let config: EnvironmentConfig = serde_json::from_str(environment_json)
        .map_err(|e| CompileError::malformed("environment", e.to_string()))?;
    let options = if options_json.trim().is_empty() {
        CompileOptions::default()
    } else {
        CompileOptions::from_json(options_json)?
    };

    let env = StaticEnvironment::from_config(&config);
    compile_template(&template, &env, &options).map(|compiled| compiled.to_debug_json())
}

/// `{ "code", "message", "internal" }` record for a failed compile.
pub fn error_record(err: &CompileError) -> Json {
    json!({
        "code": err.code(),
        "message": err.to_string(),
        "internal": err.is_internal(),
    })
}

#[cfg(feature = "napi")]
#[napi]
pub fn compile_template_native(
    template_json: String,
    environment_json: String,
    options_json: String,
) -> String {
    let result = match compile_template_json(&template_json, &environment_json, &options_json) {
        Ok(program) => json!({ "ok": true, "result": program }),
        Err(err) => json!({ "ok": false, "error": error_record(&err) }),
    };
    result.to_string()
}

//! Fakes shared by the test modules.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::compiled::CompiledArgs;
use crate::environment::{Environment, StaticEnvironment};
use crate::error::{InternalError, Result};
use crate::opcode::VirtualMachine;
use crate::scanner::{BlockScanner, InlineBlock};
use crate::scope::{Symbol, SymbolLookup, SymbolTable};
use crate::statement::Statement;

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOOKUP
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct MockLookup {
    locals: HashMap<String, Symbol>,
    named: HashMap<String, Symbol>,
    blocks: HashMap<String, Symbol>,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local(mut self, name: &str, symbol: u32) -> Self {
        self.locals.insert(name.to_string(), Symbol(symbol));
        self
    }

    pub fn with_named(mut self, name: &str, symbol: u32) -> Self {
        self.named.insert(name.to_string(), Symbol(symbol));
        self
    }

    pub fn with_block(mut self, label: &str, symbol: u32) -> Self {
        self.blocks.insert(label.to_string(), Symbol(symbol));
        self
    }
}

impl SymbolLookup for MockLookup {
    fn has_local_symbol(&self, name: &str) -> bool {
        self.locals.contains_key(name)
    }

    fn get_local_symbol(&self, name: &str) -> Option<Symbol> {
        self.locals.get(name).copied()
    }

    fn has_named_symbol(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    fn get_named_symbol(&self, name: &str) -> Option<Symbol> {
        self.named.get(name).copied()
    }

    fn get_block_symbol(&self, label: &str) -> Option<Symbol> {
        self.blocks.get(label).copied()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIRTUAL MACHINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Records every call made by block opcodes. Blocks are identified by name;
/// evaluated args are reduced to their positional count.
#[derive(Debug, Default)]
pub struct RecordingVm {
    pub blocks: HashMap<Symbol, String>,
    pub events: Vec<String>,
    pub depth: i32,
}

impl RecordingVm {
    pub fn with_block(mut self, symbol: u32, name: &str) -> Self {
        self.blocks.insert(Symbol(symbol), name.to_string());
        self
    }
}

impl VirtualMachine for RecordingVm {
    type Block = String;
    type Args = usize;

    fn get_block(&self, symbol: Symbol) -> Option<String> {
        self.blocks.get(&symbol).cloned()
    }

    fn evaluate_args(&mut self, args: &CompiledArgs) -> usize {
        self.events.push("evaluate-args".to_string());
        args.positional().len()
    }

    fn push_caller_scope(&mut self) {
        self.depth += 1;
        self.events.push("push-caller-scope".to_string());
    }

    fn invoke_block(&mut self, block: String, args: usize) {
        self.events.push(format!("invoke {} {}", block, args));
    }

    fn pop_scope(&mut self) {
        self.depth -= 1;
        self.events.push("pop-scope".to_string());
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCANNER
// ═══════════════════════════════════════════════════════════════════════════════

/// Feeds pre-built statements and records what it is asked to do.
pub struct VecScanner {
    pub env: StaticEnvironment,
    pub symbol_table: Arc<SymbolTable>,
    input: VecDeque<Statement>,
    pub statements: Vec<Statement>,
    pub children: Vec<Arc<InlineBlock>>,
    stack: Vec<(Vec<Statement>, Vec<Arc<InlineBlock>>, Arc<SymbolTable>)>,
    pub events: Vec<String>,
}

impl VecScanner {
    pub fn new(env: StaticEnvironment, input: Vec<Statement>) -> Self {
        Self {
            env,
            symbol_table: SymbolTable::for_entry_point(),
            input: input.into(),
            statements: Vec::new(),
            children: Vec::new(),
            stack: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.input.len()
    }
}

impl BlockScanner for VecScanner {
    fn env(&self) -> &dyn Environment {
        &self.env
    }

    fn next(&mut self) -> Result<Option<Statement>> {
        Ok(self.input.pop_front())
    }

    fn add_statement(&mut self, statement: Statement) {
        self.events.push(format!("add {}", statement.kind()));
        self.statements.push(statement);
    }

    fn add_child(&mut self, block: &Arc<InlineBlock>) {
        self.events.push("add-child".to_string());
        self.children.push(Arc::clone(block));
    }

    fn start_block(&mut self, block_params: &[String]) {
        let event = format!("start-block [{}]", block_params.join(","));
        self.events.push(event);
        let table = SymbolTable::for_block(&self.symbol_table, block_params);
        let outer_table = std::mem::replace(&mut self.symbol_table, table);
        let statements = std::mem::take(&mut self.statements);
        let children = std::mem::take(&mut self.children);
        self.stack.push((statements, children, outer_table));
    }

    fn end_block(&mut self, block_params: &[String]) -> Result<Arc<InlineBlock>> {
        self.events.push("end-block".to_string());
        let (statements, children, table) =
            self.stack.pop().ok_or(InternalError::UnbalancedBlock)?;
        let inner_table = std::mem::replace(&mut self.symbol_table, table);
        let block = Arc::new(InlineBlock::new(
            block_params.to_vec(),
            std::mem::replace(&mut self.statements, statements),
            inner_table,
            std::mem::replace(&mut self.children, children),
        ));
        self.add_child(&block);
        Ok(block)
    }

    fn block_for(
        &mut self,
        _symbol_table: &Arc<SymbolTable>,
        block_id: usize,
    ) -> Result<Arc<InlineBlock>> {
        Err(InternalError::MissingBlock { id: block_id }.into())
    }
}

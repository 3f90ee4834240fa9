//! Scan pass: decodes serialized statements, applies the scan-time rewrites
//! and gathers the results into [`InlineBlock`]s.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;

use crate::environment::Environment;
use crate::error::{InternalError, Result};
use crate::options::CompileOptions;
use crate::scope::SymbolTable;
use crate::statement::Statement;

/// A scanned block: its statements, the table they resolve names against,
/// and the blocks nested inside it.
#[derive(Debug, Clone)]
pub struct InlineBlock {
    pub locals: Vec<String>,
    pub statements: Vec<Statement>,
    pub symbol_table: Arc<SymbolTable>,
    pub children: Vec<Arc<InlineBlock>>,
}

impl InlineBlock {
    pub fn new(
        locals: Vec<String>,
        statements: Vec<Statement>,
        symbol_table: Arc<SymbolTable>,
        children: Vec<Arc<InlineBlock>>,
    ) -> Self {
        Self {
            locals,
            statements,
            symbol_table,
            children,
        }
    }

    pub fn has_positional_params(&self) -> bool {
        !self.locals.is_empty()
    }
}

impl PartialEq for InlineBlock {
    fn eq(&self, other: &Self) -> bool {
        self.locals == other.locals
            && self.statements == other.statements
            && Arc::ptr_eq(&self.symbol_table, &other.symbol_table)
            && self.children == other.children
    }
}

/// The scanner seam syntax nodes use during the scan pass.
///
/// `add_statement` takes statements that have already been scanned.
pub trait BlockScanner {
    fn env(&self) -> &dyn Environment;
    /// Next raw statement of the current input, or `None` when it is
    /// exhausted.
    fn next(&mut self) -> Result<Option<Statement>>;
    fn add_statement(&mut self, statement: Statement);
    fn add_child(&mut self, block: &Arc<InlineBlock>);
    fn start_block(&mut self, block_params: &[String]);
    /// Fails when there is no open block to close.
    fn end_block(&mut self, block_params: &[String]) -> Result<Arc<InlineBlock>>;
    fn block_for(
        &mut self,
        symbol_table: &Arc<SymbolTable>,
        block_id: usize,
    ) -> Result<Arc<InlineBlock>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERIALIZED INPUT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedBlock {
    pub statements: Vec<Json>,
    #[serde(default)]
    pub locals: Vec<String>,
}

/// A template as produced by the upstream parser. `blocks` holds the nested
/// block bodies referenced by id from block statements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedTemplate {
    pub statements: Vec<Json>,
    #[serde(default)]
    pub locals: Vec<String>,
    #[serde(default)]
    pub named: Vec<String>,
    #[serde(default)]
    pub yields: Vec<String>,
    #[serde(default)]
    pub blocks: Vec<SerializedBlock>,
}

impl SerializedTemplate {
    pub fn symbol_table(&self) -> Arc<SymbolTable> {
        let root = SymbolTable::for_layout(&self.named, &self.yields);
        if self.locals.is_empty() {
            root
        } else {
            SymbolTable::for_block(&root, &self.locals)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATEMENT SCANNER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
struct Frame {
    locals: Vec<String>,
    symbol_table: Arc<SymbolTable>,
    statements: Vec<Statement>,
    children: Vec<Arc<InlineBlock>>,
}

impl Frame {
    fn new(locals: Vec<String>, symbol_table: Arc<SymbolTable>) -> Self {
        Self {
            locals,
            symbol_table,
            statements: Vec::new(),
            children: Vec::new(),
        }
    }

    fn into_block(self) -> InlineBlock {
        InlineBlock::new(
            self.locals,
            self.statements,
            self.symbol_table,
            self.children,
        )
    }
}

pub struct StatementScanner<'a> {
    env: &'a dyn Environment,
    blocks: &'a [SerializedBlock],
    options: CompileOptions,
    input: VecDeque<Json>,
    current: Frame,
    stack: Vec<Frame>,
}

impl<'a> StatementScanner<'a> {
    pub fn new(
        env: &'a dyn Environment,
        blocks: &'a [SerializedBlock],
        symbol_table: Arc<SymbolTable>,
        options: CompileOptions,
    ) -> Self {
        Self {
            env,
            blocks,
            options,
            input: VecDeque::new(),
            current: Frame::new(Vec::new(), symbol_table),
            stack: Vec::new(),
        }
    }

    /// Scans a whole template into its entry-point block.
    pub fn scan_template(
        env: &'a dyn Environment,
        template: &'a SerializedTemplate,
        options: CompileOptions,
    ) -> Result<Arc<InlineBlock>> {
        let symbol_table = template.symbol_table();
        tracing::debug!(
            statements = template.statements.len(),
            blocks = template.blocks.len(),
            "scanning template"
        );
        let mut scanner = Self::new(env, &template.blocks, Arc::clone(&symbol_table), options);
        let block = scanner.scan_block(
            &template.statements,
            symbol_table,
            template.locals.clone(),
        )?;
        Ok(Arc::new(block))
    }

    fn scan_block(
        &mut self,
        statements: &[Json],
        symbol_table: Arc<SymbolTable>,
        locals: Vec<String>,
    ) -> Result<InlineBlock> {
        let outer_input = mem::replace(&mut self.input, statements.iter().cloned().collect());
        let outer_frame = mem::replace(&mut self.current, Frame::new(locals, symbol_table));

        let result = self.drain();

        self.input = outer_input;
        let frame = mem::replace(&mut self.current, outer_frame);
        result.map(|_| frame.into_block())
    }

    fn drain(&mut self) -> Result<()> {
        while let Some(statement) = self.next()? {
            let scanned = statement.scan(self)?;
            self.add_statement(scanned);
        }
        Ok(())
    }
}

impl<'a> BlockScanner for StatementScanner<'a> {
    fn env(&self) -> &dyn Environment {
        self.env
    }

    fn next(&mut self) -> Result<Option<Statement>> {
        let raw = match self.input.pop_front() {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let symbol_table = Arc::clone(&self.current.symbol_table);
        let options = self.options;
        Statement::from_spec(&raw, &symbol_table, self, &options).map(Some)
    }

    fn add_statement(&mut self, statement: Statement) {
        self.current.statements.push(statement);
    }

    fn add_child(&mut self, block: &Arc<InlineBlock>) {
        self.current.children.push(Arc::clone(block));
    }

    fn start_block(&mut self, block_params: &[String]) {
        let symbol_table = SymbolTable::for_block(&self.current.symbol_table, block_params);
        let child = Frame::new(block_params.to_vec(), symbol_table);
        let parent = mem::replace(&mut self.current, child);
        self.stack.push(parent);
    }

    fn end_block(&mut self, _block_params: &[String]) -> Result<Arc<InlineBlock>> {
        let parent = self.stack.pop().ok_or(InternalError::UnbalancedBlock)?;
        let finished = mem::replace(&mut self.current, parent);
        let block = Arc::new(finished.into_block());
        self.add_child(&block);
        Ok(block)
    }

    fn block_for(
        &mut self,
        symbol_table: &Arc<SymbolTable>,
        block_id: usize,
    ) -> Result<Arc<InlineBlock>> {
        let blocks = self.blocks;
        let serialized = blocks
            .get(block_id)
            .ok_or(InternalError::MissingBlock { id: block_id })?;
        let child_table = SymbolTable::for_block(symbol_table, &serialized.locals);
        let block = self.scan_block(
            &serialized.statements,
            child_table,
            serialized.locals.clone(),
        )?;
        Ok(Arc::new(block))
    }
}

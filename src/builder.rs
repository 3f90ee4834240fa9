use std::sync::Arc;

use crate::opcode::{Opcode, Program};
use crate::scope::{Symbol, SymbolLookup, SymbolTable};

/// Compile target for statements: name lookup plus an append-only program.
pub trait CompileInto: SymbolLookup {
    fn append(&mut self, opcode: Opcode);

    fn text(&mut self, text: &str) {
        self.append(Opcode::Text {
            text: text.to_string(),
        });
    }

    fn comment(&mut self, comment: &str) {
        self.append(Opcode::Comment {
            comment: comment.to_string(),
        });
    }
}

/// Builds the program for one block, resolving names through that block's
/// symbol table.
#[derive(Debug)]
pub struct OpcodeBuilder {
    program: Program,
    symbol_table: Arc<SymbolTable>,
    trace_opcodes: bool,
}

impl OpcodeBuilder {
    pub fn new(symbol_table: Arc<SymbolTable>) -> Self {
        Self {
            program: Program::new(),
            symbol_table,
            trace_opcodes: false,
        }
    }

    pub fn with_tracing(mut self, trace_opcodes: bool) -> Self {
        self.trace_opcodes = trace_opcodes;
        self
    }

    pub fn symbol_table(&self) -> &Arc<SymbolTable> {
        &self.symbol_table
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn into_program(self) -> Program {
        self.program
    }
}

impl CompileInto for OpcodeBuilder {
    fn append(&mut self, opcode: Opcode) {
        if self.trace_opcodes {
            tracing::trace!(position = self.program.len(), opcode = %opcode, "opcode appended");
        }
        self.program.push(opcode);
    }
}

impl SymbolLookup for OpcodeBuilder {
    fn has_local_symbol(&self, name: &str) -> bool {
        self.symbol_table.has_local_symbol(name)
    }

    fn get_local_symbol(&self, name: &str) -> Option<Symbol> {
        self.symbol_table.get_local_symbol(name)
    }

    fn has_named_symbol(&self, name: &str) -> bool {
        self.symbol_table.has_named_symbol(name)
    }

    fn get_named_symbol(&self, name: &str) -> Option<Symbol> {
        self.symbol_table.get_named_symbol(name)
    }

    fn get_block_symbol(&self, label: &str) -> Option<Symbol> {
        self.symbol_table.get_block_symbol(label)
    }
}

//! Open-tag handling: the scan-time choice between a primitive element and a
//! component invocation.

use std::sync::Arc;

use crate::args::{Args, NamedArgs, Templates};
use crate::builder::CompileInto;
use crate::environment::Environment;
use crate::error::{CompileError, Result};
use crate::opcode::Opcode;
use crate::scanner::{BlockScanner, InlineBlock};
use crate::scope::SymbolTable;
use crate::statement::{Statement, SyntaxRole};

/// An open tag as serialized, before the scan pass knows whether `tag` is a
/// component.
#[derive(Debug, Clone)]
pub struct OpenElement {
    pub tag: String,
    pub block_params: Vec<String>,
    pub symbol_table: Arc<SymbolTable>,
}

impl PartialEq for OpenElement {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.block_params == other.block_params
            && Arc::ptr_eq(&self.symbol_table, &other.symbol_table)
    }
}

impl OpenElement {
    pub fn build(tag: &str, block_params: Vec<String>, symbol_table: Arc<SymbolTable>) -> Self {
        Self {
            tag: tag.to_string(),
            block_params,
            symbol_table,
        }
    }

    /// Rewrites the tag into a [`Component`] when the environment has a
    /// definition for it, consuming its parameters and body from the scanner
    /// up to the matching close tag. Otherwise the tag stays a primitive
    /// element and what follows is left for the caller to scan.
    pub fn scan<S: BlockScanner + ?Sized>(self, scanner: &mut S) -> Result<Statement> {
        let tag_path = [self.tag.clone()];
        if !scanner
            .env()
            .has_component_definition(&tag_path, &self.symbol_table)
        {
            tracing::trace!(tag = %self.tag, "open-element scanned as primitive element");
            return Ok(Statement::OpenPrimitiveElement(self.to_identity()));
        }

        let (args, attrs) = self.parameters(scanner)?;
        scanner.start_block(&self.block_params);
        self.tag_contents(scanner)?;
        let template = scanner.end_block(&self.block_params)?;

        tracing::trace!(tag = %self.tag, shadow = attrs.len(), "open-element scanned as component");
        Ok(Statement::Component(Component::new(&self.tag, attrs, args, template)))
    }

    /// Used when the scan pass is skipped.
    pub fn compile<C: CompileInto + ?Sized>(&self, compiler: &mut C) {
        compiler.append(Opcode::OpenPrimitiveElement {
            tag: self.tag.clone(),
        });
    }

    pub fn to_identity(&self) -> OpenPrimitiveElement {
        OpenPrimitiveElement::build(&self.tag)
    }

    fn pull<S: BlockScanner + ?Sized>(&self, scanner: &mut S) -> Result<Statement> {
        scanner
            .next()?
            .ok_or_else(|| CompileError::UnterminatedElement {
                tag: self.tag.clone(),
            })
    }

    /// Everything up to the flush marker becomes component arguments;
    /// attributes additionally land in the shadow list.
    fn parameters<S: BlockScanner + ?Sized>(
        &self,
        scanner: &mut S,
    ) -> Result<(Args, Vec<String>)> {
        let mut attrs = Vec::new();
        let mut keys = Vec::new();
        let mut values = Vec::new();

        loop {
            let current = self.pull(scanner)?;
            if let Statement::FlushElement(_) = current {
                break;
            }

            let param = match current.role() {
                SyntaxRole::Modifier => {
                    return Err(CompileError::ModifierInComponent {
                        tag: self.tag.clone(),
                    });
                }
                SyntaxRole::Attribute(param) => {
                    attrs.push(param.name().to_string());
                    param
                }
                SyntaxRole::Argument(param) => param,
                SyntaxRole::Other => {
                    return Err(CompileError::UnexpectedComponentParameter {
                        tag: self.tag.clone(),
                        found: current.kind(),
                    });
                }
            };

            // Attributes are also exposed as arguments for now, so an
            // attribute and an argument share one namespace.
            let name = param.name();
            if keys.iter().any(|key| key == name) {
                return Err(CompileError::malformed(
                    "component",
                    format!("duplicate parameter {:?} on <{}>", name, self.tag),
                ));
            }
            keys.push(name.to_string());
            values.push(param.value_syntax());
        }

        let args = Args::from_named_args(NamedArgs::build(keys, values));
        Ok((args, attrs))
    }

    /// Scans the body into the current block until the close tag that
    /// matches this open tag. The matching close is consumed and dropped.
    fn tag_contents<S: BlockScanner + ?Sized>(&self, scanner: &mut S) -> Result<()> {
        let mut nesting = 1usize;

        loop {
            let current = self.pull(scanner)?;
            if let Statement::CloseElement(_) = current {
                nesting -= 1;
                if nesting == 0 {
                    return Ok(());
                }
            }

            // A nested component consumes its own close tag during scan, so
            // only primitive elements leave a close pending.
            let scanned = current.scan(scanner)?;
            if let Statement::OpenPrimitiveElement(_) = scanned {
                nesting += 1;
            }
            scanner.add_statement(scanned);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPrimitiveElement {
    pub tag: String,
}

impl OpenPrimitiveElement {
    pub fn build(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
        }
    }

    pub fn compile<C: CompileInto + ?Sized>(&self, compiler: &mut C) {
        compiler.append(Opcode::OpenPrimitiveElement {
            tag: self.tag.clone(),
        });
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT INVOCATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub tag: String,
    /// Attribute names forwarded to the component's root element.
    pub attrs: Vec<String>,
    pub args: Args,
    pub template: Arc<InlineBlock>,
}

impl Component {
    pub fn new(tag: &str, attrs: Vec<String>, args: Args, template: Arc<InlineBlock>) -> Self {
        Self {
            tag: tag.to_string(),
            attrs,
            args,
            template,
        }
    }

    /// Emits put-definition, open-component and close-component, in that
    /// order and with nothing in between.
    pub fn compile<C: CompileInto + ?Sized>(
        &self,
        compiler: &mut C,
        env: &dyn Environment,
        symbol_table: &Arc<SymbolTable>,
    ) -> Result<()> {
        let tag_path = [self.tag.clone()];
        let definition = env
            .get_component_definition(&tag_path, symbol_table)
            .ok_or_else(|| CompileError::UnknownComponent {
                tag: self.tag.clone(),
            })?;
        let args = self.args.compile(&*compiler, env, symbol_table)?;
        let templates = Templates::new(Some(Arc::clone(&self.template)), None);

        compiler.append(Opcode::PutComponentDefinition { definition });
        compiler.append(Opcode::OpenComponent {
            args,
            shadow: self.attrs.clone(),
            templates,
        });
        compiler.append(Opcode::CloseComponent);
        Ok(())
    }
}

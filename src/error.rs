use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_UNKNOWN_HELPER: &str = "OC-ERR-HELPER";
pub const ERR_UNKNOWN_MODIFIER: &str = "OC-ERR-MODIFIER";
pub const ERR_UNKNOWN_COMPONENT: &str = "OC-ERR-COMPONENT";
pub const ERR_MODIFIER_IN_COMPONENT: &str = "OC-ERR-COMPONENT-MODIFIER";
pub const ERR_COMPONENT_PARAMETER: &str = "OC-ERR-COMPONENT-PARAM";
pub const ERR_UNTERMINATED_ELEMENT: &str = "OC-ERR-UNTERMINATED";
pub const ERR_MALFORMED_SYNTAX: &str = "OC-ERR-SYNTAX";
pub const ERR_INTERNAL: &str = "OC-ERR-INTERNAL";

pub type Result<T> = std::result::Result<T, CompileError>;

/// Failures raised while lowering syntax into opcodes.
///
/// Every failure is fatal for the template being compiled. Variants other than
/// [`CompileError::Internal`] describe problems in the template itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("Compile Error: {path} is not a helper")]
    UnknownHelper { path: String },

    #[error("Compile Error: {path} is not a modifier")]
    UnknownModifier { path: String },

    #[error("Compile Error: {tag} is not a component")]
    UnknownComponent { tag: String },

    #[error("Compile Error: Element modifiers are not allowed in components (found on <{tag}>)")]
    ModifierInComponent { tag: String },

    #[error("Compile Error: expected flush-element while gathering <{tag}> parameters, but got {found}")]
    UnexpectedComponentParameter { tag: String, found: &'static str },

    #[error("Compile Error: <{tag}> is never closed")]
    UnterminatedElement { tag: String },

    #[error("Syntax Error: malformed {kind}: {message}")]
    MalformedSyntax { kind: String, message: String },

    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Contract violations inside the compile pipeline. These point at a bug in
/// the caller, never at the template author.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InternalError {
    #[error("Cannot compile {kind} \"{name}\" as it is a delegate")]
    DelegateCompiled { kind: &'static str, name: String },

    #[error("block {path} reached compile without being scanned")]
    UnscannedBlock { path: String },

    #[error("no serialized block with id {id}")]
    MissingBlock { id: usize },

    #[error("end_block without a matching start_block")]
    UnbalancedBlock,
}

impl CompileError {
    pub fn malformed(kind: impl Into<String>, message: impl Into<String>) -> Self {
        CompileError::MalformedSyntax {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// True when the error signals a pipeline bug rather than a template error.
    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Internal(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            CompileError::UnknownHelper { .. } => ERR_UNKNOWN_HELPER,
            CompileError::UnknownModifier { .. } => ERR_UNKNOWN_MODIFIER,
            CompileError::UnknownComponent { .. } => ERR_UNKNOWN_COMPONENT,
            CompileError::ModifierInComponent { .. } => ERR_MODIFIER_IN_COMPONENT,
            CompileError::UnexpectedComponentParameter { .. } => ERR_COMPONENT_PARAMETER,
            CompileError::UnterminatedElement { .. } => ERR_UNTERMINATED_ELEMENT,
            CompileError::MalformedSyntax { .. } => ERR_MALFORMED_SYNTAX,
            CompileError::Internal(_) => ERR_INTERNAL,
        }
    }
}

/// Joins a dotted path back together for diagnostics.
pub(crate) fn display_path(parts: &[String]) -> String {
    parts.join(".")
}

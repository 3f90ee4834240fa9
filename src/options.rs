use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Decode every append as its guarded form.
    pub deopt_appends: bool,
    /// Emit a trace event for every appended opcode.
    pub trace_opcodes: bool,
}

impl CompileOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CompileError::malformed("options", e.to_string()))
    }
}

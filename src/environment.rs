use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::scope::SymbolTable;

/// Handle to a registered helper, as issued by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HelperId(pub u32);

/// Handle to a registered element modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierId(pub u32);

/// Handle to a registered component definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentDefinitionId(pub u32);

/// Registry queries the compiler makes against the host.
///
/// Paths are dotted names already split into segments. A `has_*` answer of
/// `true` must be followed by a lookup that returns `Some`.
pub trait Environment {
    fn has_helper(&self, path: &[String], symbol_table: &SymbolTable) -> bool;
    fn lookup_helper(&self, path: &[String], symbol_table: &SymbolTable) -> Option<HelperId>;

    fn has_modifier(&self, path: &[String], symbol_table: &SymbolTable) -> bool;
    fn lookup_modifier(&self, path: &[String], symbol_table: &SymbolTable) -> Option<ModifierId>;

    fn has_component_definition(&self, tag: &[String], symbol_table: &SymbolTable) -> bool;
    fn get_component_definition(
        &self,
        tag: &[String],
        symbol_table: &SymbolTable,
    ) -> Option<ComponentDefinitionId>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATIC ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Registry contents as supplied by a host, e.g. over the native bridge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub helpers: Vec<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub components: Vec<String>,
}

/// Name-keyed registry that hands out ids in registration order.
///
/// Lookups ignore the symbol table; every name is global.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    helpers: HashMap<String, HelperId>,
    modifiers: HashMap<String, ModifierId>,
    components: HashMap<String, ComponentDefinitionId>,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EnvironmentConfig) -> Self {
        let mut env = Self::new();
        for name in &config.helpers {
            env.register_helper(name);
        }
        for name in &config.modifiers {
            env.register_modifier(name);
        }
        for name in &config.components {
            env.register_component(name);
        }
        env
    }

    pub fn register_helper(&mut self, name: &str) -> HelperId {
        let next = HelperId(self.helpers.len() as u32);
        *self.helpers.entry(name.to_string()).or_insert(next)
    }

    pub fn register_modifier(&mut self, name: &str) -> ModifierId {
        let next = ModifierId(self.modifiers.len() as u32);
        *self.modifiers.entry(name.to_string()).or_insert(next)
    }

    pub fn register_component(&mut self, tag: &str) -> ComponentDefinitionId {
        let next = ComponentDefinitionId(self.components.len() as u32);
        *self.components.entry(tag.to_string()).or_insert(next)
    }

    pub fn with_helper(mut self, name: &str) -> Self {
        self.register_helper(name);
        self
    }

    pub fn with_modifier(mut self, name: &str) -> Self {
        self.register_modifier(name);
        self
    }

    pub fn with_component(mut self, tag: &str) -> Self {
        self.register_component(tag);
        self
    }
}

fn key(path: &[String]) -> String {
    path.join(".")
}

impl Environment for StaticEnvironment {
    fn has_helper(&self, path: &[String], _symbol_table: &SymbolTable) -> bool {
        self.helpers.contains_key(&key(path))
    }

    fn lookup_helper(&self, path: &[String], _symbol_table: &SymbolTable) -> Option<HelperId> {
        self.helpers.get(&key(path)).copied()
    }

    fn has_modifier(&self, path: &[String], _symbol_table: &SymbolTable) -> bool {
        self.modifiers.contains_key(&key(path))
    }

    fn lookup_modifier(&self, path: &[String], _symbol_table: &SymbolTable) -> Option<ModifierId> {
        self.modifiers.get(&key(path)).copied()
    }

    fn has_component_definition(&self, tag: &[String], _symbol_table: &SymbolTable) -> bool {
        self.components.contains_key(&key(tag))
    }

    fn get_component_definition(
        &self,
        tag: &[String],
        _symbol_table: &SymbolTable,
    ) -> Option<ComponentDefinitionId> {
        self.components.get(&key(tag)).copied()
    }
}

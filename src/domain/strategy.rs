//! Named strategy definitions loaded from configuration.

use crate::domain::compiler::{self, CompiledStrategy};
use crate::domain::config_validation::validate_strategy_config;
use crate::domain::error::{CompileError, TradesigError};
use crate::domain::indicator::IndicatorRegistry;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyDefinition {
    pub name: String,
    pub description: String,
    /// Complete DSL text with `ENTRY:` / `EXIT:` headers.
    pub source: String,
}

impl StrategyDefinition {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            source: source.into(),
        }
    }

    /// Read `[strategy]`: either `rules` holding the full text, or separate
    /// `entry` / `exit` conditions assembled into one document.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradesigError> {
        validate_strategy_config(config)?;

        let name = non_empty(config.get_string("strategy", "name"))
            .unwrap_or_else(|| "Unnamed".to_string());
        let description = non_empty(config.get_string("strategy", "description")).unwrap_or_default();

        let source = match non_empty(config.get_string("strategy", "rules")) {
            Some(rules) => rules,
            None => {
                let mut clauses = Vec::new();
                if let Some(entry) = non_empty(config.get_string("strategy", "entry")) {
                    clauses.push(format!("ENTRY: {}", entry));
                }
                if let Some(exit) = non_empty(config.get_string("strategy", "exit")) {
                    clauses.push(format!("EXIT: {}", exit));
                }
                clauses.join("\n")
            }
        };

        Ok(Self {
            name,
            description,
            source,
        })
    }

    pub fn compile(&self, registry: &IndicatorRegistry) -> Result<CompiledStrategy, CompileError> {
        compiler::compile(&self.source, registry)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

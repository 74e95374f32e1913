//! Configuration validation.
//!
//! Validates config fields before any compilation or file access.

use crate::domain::error::TradesigError;
use crate::domain::lexer;
use crate::domain::token::{Keyword, TokenKind};
use crate::ports::config_port::ConfigPort;

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TradesigError> {
    validate_rule_keys(config)?;
    validate_clause_body(config, "entry")?;
    validate_clause_body(config, "exit")?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TradesigError> {
    validate_csv_path(config)?;
    validate_date_column(config)?;
    Ok(())
}

pub fn validate_report_config(config: &dyn ConfigPort) -> Result<(), TradesigError> {
    if let Some(value) = config.get_string("report", "output") {
        if value.trim().is_empty() {
            return Err(TradesigError::ConfigInvalid {
                section: "report".to_string(),
                key: "output".to_string(),
                reason: "output must not be empty".to_string(),
            });
        }
    }
    if let Some(value) = config.get_string("report", "include_indicators") {
        if parse_bool(&value).is_none() {
            return Err(TradesigError::ConfigInvalid {
                section: "report".to_string(),
                key: "include_indicators".to_string(),
                reason: format!("expected true/false, found '{}'", value),
            });
        }
    }
    Ok(())
}

fn present(config: &dyn ConfigPort, section: &str, key: &str) -> bool {
    matches!(config.get_string(section, key), Some(s) if !s.trim().is_empty())
}

fn validate_rule_keys(config: &dyn ConfigPort) -> Result<(), TradesigError> {
    let rules = present(config, "strategy", "rules");
    let entry = present(config, "strategy", "entry");
    let exit = present(config, "strategy", "exit");

    if rules && (entry || exit) {
        return Err(TradesigError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "rules".to_string(),
            reason: "rules cannot be combined with entry/exit".to_string(),
        });
    }
    if !rules && !entry && !exit {
        return Err(TradesigError::ConfigMissing {
            section: "strategy".to_string(),
            key: "entry".to_string(),
        });
    }
    Ok(())
}

/// `entry` / `exit` hold one condition each; a clause header inside the value
/// would silently add or replace a clause once the document is assembled.
/// Lex errors are left for compilation, which reports them with a caret.
fn validate_clause_body(config: &dyn ConfigPort, key: &str) -> Result<(), TradesigError> {
    let Some(value) = config.get_string("strategy", key) else {
        return Ok(());
    };
    let Ok(tokens) = lexer::tokenize(&value) else {
        return Ok(());
    };
    let header = tokens.iter().find(|t| {
        matches!(
            t.kind,
            TokenKind::Keyword(Keyword::Entry) | TokenKind::Keyword(Keyword::Exit)
        )
    });
    match header {
        Some(token) => Err(TradesigError::ConfigInvalid {
            section: "strategy".to_string(),
            key: key.to_string(),
            reason: format!(
                "expected a single condition, found {} at position {}",
                token.describe(),
                token.position
            ),
        }),
        None => Ok(()),
    }
}

fn validate_csv_path(config: &dyn ConfigPort) -> Result<(), TradesigError> {
    if present(config, "data", "csv_path") {
        Ok(())
    } else {
        Err(TradesigError::ConfigMissing {
            section: "data".to_string(),
            key: "csv_path".to_string(),
        })
    }
}

fn validate_date_column(config: &dyn ConfigPort) -> Result<(), TradesigError> {
    match config.get_string("data", "date_column") {
        Some(s) if s.trim().is_empty() => Err(TradesigError::ConfigInvalid {
            section: "data".to_string(),
            key: "date_column".to_string(),
            reason: "date_column must not be empty".to_string(),
        }),
        _ => Ok(()),
    }
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

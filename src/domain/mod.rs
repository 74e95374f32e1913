//! Core domain types and logic.

pub mod compiler;
pub mod config_validation;
pub mod error;
pub mod frame;
pub mod indicator;
pub mod lexer;
pub mod planner;
pub mod rule;
pub mod rule_eval;
pub mod rule_parser;
pub mod series;
pub mod strategy;
pub mod token;

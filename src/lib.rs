//! tradesig: compiles ENTRY/EXIT trading-condition rules into per-bar signals.
//!
//! Hexagonal architecture: the rule compiler and evaluator live in [`domain`],
//! port traits in [`ports`], file-backed implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;

pub use domain::compiler::{CompiledStrategy, Signals, compile, run};
pub use domain::error::{CompileError, TradesigError};
pub use domain::frame::PriceFrame;
pub use domain::indicator::IndicatorRegistry;

//! Compile and evaluate strategy text.
//!
//! `compile` runs tokenize, parse and plan, so every lexical, grammatical,
//! unknown-indicator and arity error surfaces before a dataset is involved.
//! `CompiledStrategy::evaluate` then checks the frame's columns, computes
//! the planned indicators once, and evaluates each clause.

use crate::domain::error::CompileError;
use crate::domain::frame::PriceFrame;
use crate::domain::indicator::IndicatorRegistry;
use crate::domain::planner::{self, Plan};
use crate::domain::rule::Strategy;
use crate::domain::rule_eval::{self, EvalContext};
use crate::domain::rule_parser;
use crate::domain::series::{NumericSeries, Truth, TruthSeries};

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStrategy {
    pub strategy: Strategy,
    pub plan: Plan,
}

/// A computed indicator column.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub name: String,
    pub label: String,
    pub series: NumericSeries,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signals {
    pub entry_signal: Vec<bool>,
    pub exit_signal: Vec<bool>,
    pub entry_truth: TruthSeries,
    pub exit_truth: TruthSeries,
    /// Planned indicators in schedule order.
    pub indicators: Vec<NamedSeries>,
}

impl Signals {
    pub fn len(&self) -> usize {
        self.entry_signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_signal.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.entry_signal.iter().filter(|s| **s).count()
    }

    pub fn exit_count(&self) -> usize {
        self.exit_signal.iter().filter(|s| **s).count()
    }

    pub fn indicator(&self, name: &str) -> Option<&NumericSeries> {
        self.indicators
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.series)
    }
}

pub fn compile(text: &str, registry: &IndicatorRegistry) -> Result<CompiledStrategy, CompileError> {
    let strategy = rule_parser::parse(text)?;
    CompiledStrategy::from_strategy(strategy, registry)
}

/// Compile and evaluate in one call.
pub fn run(
    text: &str,
    registry: &IndicatorRegistry,
    frame: &PriceFrame,
) -> Result<Signals, CompileError> {
    compile(text, registry)?.evaluate(frame, registry)
}

impl CompiledStrategy {
    pub fn from_strategy(
        strategy: Strategy,
        registry: &IndicatorRegistry,
    ) -> Result<Self, CompileError> {
        let plan = planner::plan(&strategy, registry)?;
        log::debug!(
            "compiled strategy: {} indicator step(s), {} field(s)",
            plan.len(),
            plan.fields().len()
        );
        Ok(Self { strategy, plan })
    }

    pub fn evaluate(
        &self,
        frame: &PriceFrame,
        registry: &IndicatorRegistry,
    ) -> Result<Signals, CompileError> {
        for field in self.plan.fields() {
            if !frame.has_column(&field.name) {
                return Err(CompileError::UnknownField {
                    name: field.name.clone(),
                    position: field.position,
                });
            }
        }
        if frame.is_empty() {
            log::warn!("evaluating strategy over an empty frame");
        }

        let slots = rule_eval::compute_indicators(&self.plan, frame, registry)?;
        let ctx = EvalContext::new(frame, &self.plan, &slots);

        let entry_truth = match &self.strategy.entry {
            Some(condition) => rule_eval::evaluate(condition, &ctx)?,
            None => TruthSeries::constant(Truth::False, frame.len()),
        };
        let exit_truth = match &self.strategy.exit {
            Some(condition) => rule_eval::evaluate(condition, &ctx)?,
            None => TruthSeries::constant(Truth::False, frame.len()),
        };

        let indicators = self
            .plan
            .steps()
            .iter()
            .zip(slots)
            .map(|(step, series)| NamedSeries {
                name: step.series_name.clone(),
                label: step.label.clone(),
                series,
            })
            .collect();

        let signals = Signals {
            entry_signal: entry_truth.to_signal(),
            exit_signal: exit_truth.to_signal(),
            entry_truth,
            exit_truth,
            indicators,
        };
        log::info!(
            "evaluated {} bars: {} entry, {} exit signal(s)",
            signals.len(),
            signals.entry_count(),
            signals.exit_count()
        );
        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn registry() -> IndicatorRegistry {
        IndicatorRegistry::builtin()
    }

    #[test]
    fn end_to_end_sma_two() {
        let frame = PriceFrame::from_closes(&[10.0, 12.0, 11.0, 15.0, 14.0]);
        let signals = run(
            "ENTRY: close > SMA(close, 2) \n EXIT: close < SMA(close, 2)",
            &registry(),
            &frame,
        )
        .unwrap();

        assert_eq!(signals.indicators.len(), 1);
        let sma = signals.indicator("sma_close_2").unwrap();
        assert_eq!(sma.get(0), None);
        assert_relative_eq!(sma.get(1).unwrap(), 11.0);
        assert_relative_eq!(sma.get(2).unwrap(), 11.5);
        assert_relative_eq!(sma.get(3).unwrap(), 13.0);
        assert_relative_eq!(sma.get(4).unwrap(), 14.5);

        assert_eq!(signals.entry_signal, vec![false, true, false, true, false]);
        assert_eq!(signals.exit_signal, vec![false, false, true, false, true]);
        assert_eq!(signals.entry_truth.0[0], Truth::Unknown);
    }

    #[test]
    fn missing_clause_is_all_false() {
        let frame = PriceFrame::from_closes(&[1.0, 2.0, 3.0]);
        let signals = run("EXIT: close > 0", &registry(), &frame).unwrap();
        assert_eq!(signals.entry_signal, vec![false; 3]);
        assert_eq!(signals.exit_signal, vec![true; 3]);
        assert_eq!(signals.entry_count(), 0);
        assert_eq!(signals.exit_count(), 3);
    }

    #[test]
    fn unknown_field_found_before_computation() {
        let frame = PriceFrame::from_closes(&[1.0, 2.0]);
        let compiled = compile("ENTRY: SMA(close, 2) > 1 AND vwap > 3", &registry()).unwrap();
        let err = compiled.evaluate(&frame, &registry()).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownField {
                name: "vwap".into(),
                position: 29,
            }
        );
    }

    #[test]
    fn field_names_are_case_sensitive() {
        let frame = PriceFrame::from_closes(&[1.0]);
        let err = run("ENTRY: Close > 0", &registry(), &frame).unwrap_err();
        assert!(matches!(err, CompileError::UnknownField { ref name, .. } if name == "Close"));
    }

    #[test]
    fn unknown_indicator_fails_at_compile() {
        let err = compile("ENTRY: close > FOO(close, 5)", &registry()).unwrap_err();
        assert!(matches!(err, CompileError::UnknownIndicator { ref name, .. } if name == "FOO"));
    }

    #[test]
    fn shared_indicator_computed_once() {
        let compiled = compile(
            "ENTRY: close > SMA(close, 20)\nEXIT: close < SMA(close, 20)",
            &registry(),
        )
        .unwrap();
        assert_eq!(compiled.plan.len(), 1);
    }

    #[test]
    fn custom_indicator_participates() {
        let mut registry = registry();
        registry.register("LAG", 1, "value n bars ago", |s, p| {
            let n = p.first().copied().unwrap_or(1);
            (0..s.len())
                .map(|i| i.checked_sub(n).and_then(|j| s.get(j)))
                .collect()
        });
        let frame = PriceFrame::from_closes(&[1.0, 3.0, 2.0, 5.0]);
        let signals = run("ENTRY: close > LAG(close, 1)", &registry, &frame).unwrap();
        assert_eq!(signals.entry_signal, vec![false, true, false, true]);
        assert_eq!(signals.indicators[0].name, "lag_close_1");
    }

    #[test]
    fn evaluation_is_deterministic() {
        let frame = PriceFrame::from_closes(&[5.0, 4.0, 6.0, 7.0, 3.0, 8.0, 9.0, 2.0]);
        let compiled = compile(
            "ENTRY: CROSSOVER(EMA(close, 2), SMA(close, 3)) OR RSI(close, 3) < 30\nEXIT: ROC(close, 1) < 0",
            &registry(),
        )
        .unwrap();
        let first = compiled.evaluate(&frame, &registry()).unwrap();
        let second = compiled.evaluate(&frame, &registry()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_frame_yields_empty_signals() {
        let frame = PriceFrame::from_closes(&[]);
        let signals = run("ENTRY: close > SMA(close, 2)", &registry(), &frame).unwrap();
        assert!(signals.is_empty());
        assert!(signals.exit_signal.is_empty());
    }
}

//! Indicator registry and builtin indicator implementations.
//!
//! An indicator is a named pure function of one source series and a fixed
//! number of positive integer parameters, returning a series of the same
//! length. The registry maps uppercase names to those functions so the
//! planner can validate calls and the evaluator can invoke them by name.
//!
//! Every builtin propagates undefined input: a window that touches an
//! undefined value produces an undefined output, and recursive smoothers
//! (EMA, RSI) restart their warm-up after a gap.

pub mod ema;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod wma;

use crate::domain::series::NumericSeries;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub type IndicatorFn = Arc<dyn Fn(&NumericSeries, &[usize]) -> NumericSeries + Send + Sync>;

#[derive(Clone)]
pub struct IndicatorDef {
    pub name: String,
    /// Number of integer parameters after the source series.
    pub params: usize,
    pub description: String,
    pub func: IndicatorFn,
}

impl IndicatorDef {
    /// Total argument count expected in a call, source series included.
    pub fn arity(&self) -> usize {
        1 + self.params
    }

    /// Run the indicator. Output is forced to the source length; a custom
    /// function returning a different length is padded with undefined values
    /// or truncated.
    pub fn compute(&self, source: &NumericSeries, params: &[usize]) -> NumericSeries {
        let out = (self.func)(source, params);
        if out.len() == source.len() {
            return out;
        }
        log::warn!(
            "indicator {} returned {} values for a {}-row source; resizing",
            self.name,
            out.len(),
            source.len()
        );
        (0..source.len()).map(|i| out.get(i)).collect()
    }
}

impl fmt::Debug for IndicatorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorRegistry {
    defs: BTreeMap<String, IndicatorDef>,
}

impl IndicatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            defs: BTreeMap::new(),
        }
    }

    /// Registry holding SMA, EMA, WMA, RSI, ROC and STDDEV, each taking one period.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("SMA", 1, "simple moving average", |s, p| {
            sma::calculate_sma(s, period(p))
        });
        registry.register("EMA", 1, "exponential moving average seeded with SMA", |s, p| {
            ema::calculate_ema(s, period(p))
        });
        registry.register("WMA", 1, "linearly weighted moving average", |s, p| {
            wma::calculate_wma(s, period(p))
        });
        registry.register("RSI", 1, "relative strength index (Wilder smoothing)", |s, p| {
            rsi::calculate_rsi(s, period(p))
        });
        registry.register("ROC", 1, "rate of change in percent", |s, p| {
            roc::calculate_roc(s, period(p))
        });
        registry.register("STDDEV", 1, "population standard deviation", |s, p| {
            stddev::calculate_stddev(s, period(p))
        });
        registry
    }

    /// Add or replace an indicator. The name is stored uppercase.
    pub fn register<F>(&mut self, name: &str, params: usize, description: &str, func: F)
    where
        F: Fn(&NumericSeries, &[usize]) -> NumericSeries + Send + Sync + 'static,
    {
        let name = name.to_ascii_uppercase();
        self.defs.insert(
            name.clone(),
            IndicatorDef {
                name,
                params,
                description: description.to_string(),
                func: Arc::new(func),
            },
        );
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&IndicatorDef> {
        self.defs.get(&name.to_ascii_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Definitions in name order.
    pub fn iter(&self) -> impl Iterator<Item = &IndicatorDef> {
        self.defs.values()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl Default for IndicatorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn period(params: &[usize]) -> usize {
    params.first().copied().unwrap_or(0)
}

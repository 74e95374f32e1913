//! Indicator planning.
//!
//! Walks a parsed `Strategy` once (ENTRY before EXIT, operands left to
//! right, nested calls before the call that consumes them) and produces:
//! - an ordered schedule of distinct indicator computations, each in its
//!   own slot, where a step only depends on fields or earlier slots
//! - the ordered set of data fields the strategy reads
//!
//! Calls are deduplicated by `IndicatorKey`: two calls with the same
//! indicator name, integer parameters and resolved source share one slot,
//! and the first occurrence decides the slot and series name.
//!
//! Planning is also where calls are validated against the registry, so an
//! unknown name or a wrong argument count is reported before any data is read.

use crate::domain::error::CompileError;
use crate::domain::indicator::IndicatorRegistry;
use crate::domain::rule::{IndicatorCall, Operand, Strategy};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Where an indicator reads its input from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesId {
    Field(String),
    /// Output of an earlier plan step.
    Indicator(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndicatorKey {
    /// Uppercase registry name.
    pub name: String,
    pub params: Vec<usize>,
    pub source: SeriesId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    pub slot: usize,
    pub key: IndicatorKey,
    /// Stable output column name, e.g. `sma_close_20`.
    pub series_name: String,
    /// Canonical call text of the first occurrence, e.g. `SMA(close, 20)`.
    pub label: String,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldUse {
    pub name: String,
    /// Offset of the first reference in the source text.
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    steps: Vec<PlanStep>,
    slots: HashMap<IndicatorKey, usize>,
    fields: Vec<FieldUse>,
}

impl Plan {
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn step(&self, slot: usize) -> Option<&PlanStep> {
        self.steps.get(slot)
    }

    pub fn fields(&self) -> &[FieldUse] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Slot assigned to `call`, if the call was planned.
    pub fn slot_of(&self, call: &IndicatorCall) -> Option<usize> {
        let source = match call.args.first()? {
            Operand::Field { name, .. } => SeriesId::Field(name.clone()),
            Operand::Indicator(inner) => SeriesId::Indicator(self.slot_of(inner)?),
            Operand::Literal(_) => return None,
        };
        let params = call.args[1..]
            .iter()
            .map(|arg| match arg {
                Operand::Literal(v) => as_period(*v),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        let key = IndicatorKey {
            name: call.name.to_ascii_uppercase(),
            params,
            source,
        };
        self.slots.get(&key).copied()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "[{}] {} = {}", step.slot, step.series_name, step.label)?;
        }
        Ok(())
    }
}

struct Planner<'r> {
    registry: &'r IndicatorRegistry,
    plan: Plan,
    names: HashSet<String>,
}

impl<'r> Planner<'r> {
    fn note_field(&mut self, name: &str, position: usize) {
        if !self.plan.fields.iter().any(|f| f.name == name) {
            self.plan.fields.push(FieldUse {
                name: name.to_string(),
                position,
            });
        }
    }

    fn visit_operand(&mut self, operand: &Operand) -> Result<(), CompileError> {
        match operand {
            Operand::Literal(_) => {}
            Operand::Field { name, position } => self.note_field(name, *position),
            Operand::Indicator(call) => {
                self.visit_call(call)?;
            }
        }
        Ok(())
    }

    fn visit_call(&mut self, call: &IndicatorCall) -> Result<usize, CompileError> {
        let def = self
            .registry
            .get(&call.name)
            .ok_or_else(|| CompileError::UnknownIndicator {
                name: call.name.clone(),
                position: call.position,
            })?;
        let expected = def.arity();
        if call.args.len() != expected {
            return Err(CompileError::Arity {
                name: call.name.clone(),
                expected,
                found: call.args.len(),
                position: call.position,
            });
        }

        let (source, source_name) = match &call.args[0] {
            Operand::Field { name, position } => {
                self.note_field(name, *position);
                (SeriesId::Field(name.clone()), name.clone())
            }
            Operand::Indicator(inner) => {
                let slot = self.visit_call(inner)?;
                (
                    SeriesId::Indicator(slot),
                    self.plan.steps[slot].series_name.clone(),
                )
            }
            Operand::Literal(v) => {
                return Err(CompileError::InvalidArgument {
                    name: call.name.clone(),
                    position: call.position,
                    reason: format!(
                        "source must be a field or indicator, found number {}",
                        v
                    ),
                });
            }
        };

        let mut params = Vec::with_capacity(call.args.len() - 1);
        for (i, arg) in call.args[1..].iter().enumerate() {
            let period = match arg {
                Operand::Literal(v) => as_period(*v).ok_or_else(|| format!(
                    "parameter {} must be a positive integer, found {}",
                    i + 1,
                    v
                )),
                other => Err(format!(
                    "parameter {} must be a number, found '{}'",
                    i + 1,
                    other
                )),
            };
            match period {
                Ok(p) => params.push(p),
                Err(reason) => {
                    return Err(CompileError::InvalidArgument {
                        name: call.name.clone(),
                        position: call.position,
                        reason,
                    });
                }
            }
        }

        let key = IndicatorKey {
            name: def.name.clone(),
            params,
            source,
        };
        if let Some(&slot) = self.plan.slots.get(&key) {
            log::debug!("reusing slot {} for {}", slot, call);
            return Ok(slot);
        }

        let slot = self.plan.steps.len();
        let series_name = self.unique_name(series_name(&key, &source_name));
        log::debug!("planned {} as slot {} ({})", call, slot, series_name);
        self.plan.slots.insert(key.clone(), slot);
        self.plan.steps.push(PlanStep {
            slot,
            key,
            series_name,
            label: call.to_string(),
            position: call.position,
        });
        Ok(slot)
    }

    fn unique_name(&mut self, base: String) -> String {
        let mut name = base.clone();
        let mut n = 2;
        while self.names.contains(&name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        self.names.insert(name.clone());
        name
    }
}

/// Build the indicator schedule for `strategy`, validating every call.
pub fn plan(strategy: &Strategy, registry: &IndicatorRegistry) -> Result<Plan, CompileError> {
    let mut planner = Planner {
        registry,
        plan: Plan::default(),
        names: HashSet::new(),
    };

    for (clause, condition) in strategy.clauses() {
        let mut operands = Vec::new();
        condition.for_each_operand(&mut |op| operands.push(op));
        for operand in operands {
            planner.visit_operand(operand)?;
        }
        log::debug!(
            "{} clause planned; {} step(s) so far",
            clause,
            planner.plan.steps.len()
        );
    }

    Ok(planner.plan)
}

/// Lowercase indicator name followed by its source and parameters, joined by `_`.
fn series_name(key: &IndicatorKey, source_name: &str) -> String {
    let mut name = key.name.to_ascii_lowercase();
    name.push('_');
    name.push_str(source_name);
    for p in &key.params {
        name.push('_');
        name.push_str(&p.to_string());
    }
    name
}

fn as_period(value: f64) -> Option<usize> {
    if value.is_finite() && value >= 1.0 && value.fract() == 0.0 && value <= usize::MAX as f64 {
        Some(value as usize)
    } else {
        None
    }
}

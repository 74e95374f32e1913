//! Vectorized condition evaluation.
//!
//! Executes a `Plan` into an immutable vector of indicator series (one per
//! slot) and evaluates conditions over whole series at once.
//!
//! # Evaluation Semantics
//!
//! - Operands: a field resolves to its frame column, an indicator call to
//!   its planned slot, and a literal broadcasts to every index
//! - Comparisons: `Unknown` wherever either side is undefined
//! - `AND` / `OR`: Kleene three-valued logic, elementwise
//! - `CROSSOVER` / `CROSSUNDER`: one-step look-back over the materialized
//!   operands; `False` at index 0, `Unknown` if any of the four values is
//!   undefined

use crate::domain::error::CompileError;
use crate::domain::frame::PriceFrame;
use crate::domain::indicator::IndicatorRegistry;
use crate::domain::planner::{Plan, SeriesId};
use crate::domain::rule::{Condition, CrossDirection, IndicatorCall, LogicalOp, Operand};
use crate::domain::series::{NumericSeries, Truth, TruthSeries};

/// Run every plan step in order. Slot `i` of the result holds step `i`'s output.
pub fn compute_indicators(
    plan: &Plan,
    frame: &PriceFrame,
    registry: &IndicatorRegistry,
) -> Result<Vec<NumericSeries>, CompileError> {
    let mut slots: Vec<NumericSeries> = Vec::with_capacity(plan.len());

    for step in plan.steps() {
        let def = registry
            .get(&step.key.name)
            .ok_or_else(|| CompileError::UnknownIndicator {
                name: step.key.name.clone(),
                position: step.position,
            })?;
        let source = match &step.key.source {
            SeriesId::Field(name) => {
                frame
                    .column(name)
                    .ok_or_else(|| CompileError::UnknownField {
                        name: name.clone(),
                        position: step.position,
                    })?
            }
            SeriesId::Indicator(slot) => {
                slots
                    .get(*slot)
                    .ok_or_else(|| CompileError::UnknownIndicator {
                        name: step.key.name.clone(),
                        position: step.position,
                    })?
            }
        };
        let output = def.compute(source, &step.key.params);
        log::debug!(
            "computed {} ({} of {} values defined)",
            step.series_name,
            output.valid_count(),
            output.len()
        );
        slots.push(output);
    }

    Ok(slots)
}

/// Read-only view over the data and computed indicator slots.
pub struct EvalContext<'a> {
    frame: &'a PriceFrame,
    plan: &'a Plan,
    slots: &'a [NumericSeries],
}

enum Value<'a> {
    Scalar(f64),
    Series(&'a NumericSeries),
}

impl Value<'_> {
    fn at(&self, index: usize) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Series(s) => s.get(index),
        }
    }
}

impl<'a> EvalContext<'a> {
    pub fn new(frame: &'a PriceFrame, plan: &'a Plan, slots: &'a [NumericSeries]) -> Self {
        Self { frame, plan, slots }
    }

    pub fn len(&self) -> usize {
        self.frame.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    fn resolve(&self, operand: &Operand) -> Result<Value<'a>, CompileError> {
        match operand {
            Operand::Literal(v) => Ok(Value::Scalar(*v)),
            Operand::Field { name, position } => self
                .frame
                .column(name)
                .map(Value::Series)
                .ok_or_else(|| CompileError::UnknownField {
                    name: name.clone(),
                    position: *position,
                }),
            Operand::Indicator(call) => self.resolve_call(call).map(Value::Series),
        }
    }

    fn resolve_call(&self, call: &IndicatorCall) -> Result<&'a NumericSeries, CompileError> {
        self.plan
            .slot_of(call)
            .and_then(|slot| self.slots.get(slot))
            .ok_or_else(|| CompileError::UnknownIndicator {
                name: call.name.clone(),
                position: call.position,
            })
    }
}

/// Evaluate `condition` at every index of the frame.
pub fn evaluate(condition: &Condition, ctx: &EvalContext<'_>) -> Result<TruthSeries, CompileError> {
    let n = ctx.len();
    match condition {
        Condition::Comparison { op, left, right } => {
            let left = ctx.resolve(left)?;
            let right = ctx.resolve(right)?;
            Ok(TruthSeries(
                (0..n)
                    .map(|i| match (left.at(i), right.at(i)) {
                        (Some(l), Some(r)) => Truth::from(op.apply(l, r)),
                        _ => Truth::Unknown,
                    })
                    .collect(),
            ))
        }
        Condition::Logical { op, operands } => {
            let identity = match op {
                LogicalOp::And => Truth::True,
                LogicalOp::Or => Truth::False,
            };
            operands
                .iter()
                .try_fold(TruthSeries::constant(identity, n), |acc, operand| {
                    let next = evaluate(operand, ctx)?;
                    Ok(match op {
                        LogicalOp::And => acc.and(&next),
                        LogicalOp::Or => acc.or(&next),
                    })
                })
        }
        Condition::Cross {
            direction,
            left,
            right,
        } => {
            let left = ctx.resolve(left)?;
            let right = ctx.resolve(right)?;
            Ok(TruthSeries(
                (0..n)
                    .map(|i| cross_at(*direction, &left, &right, i))
                    .collect(),
            ))
        }
    }
}

fn cross_at(direction: CrossDirection, left: &Value<'_>, right: &Value<'_>, index: usize) -> Truth {
    if index == 0 {
        return Truth::False;
    }
    let values = (
        left.at(index),
        right.at(index),
        left.at(index - 1),
        right.at(index - 1),
    );
    let (Some(l_curr), Some(r_curr), Some(l_prev), Some(r_prev)) = values else {
        return Truth::Unknown;
    };
    let crossed = match direction {
        CrossDirection::Over => l_curr > r_curr && l_prev <= r_prev,
        CrossDirection::Under => l_curr < r_curr && l_prev >= r_prev,
    };
    Truth::from(crossed)
}

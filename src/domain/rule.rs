//! Condition AST data structures.
//!
//! This module defines the abstract syntax tree for strategies:
//! - `Operand`: numeric-valued leaves (literals, data fields, indicator calls)
//! - `IndicatorCall`: a named indicator applied to operand arguments
//! - `Condition`: boolean expressions (comparison, AND/OR, cross events)
//! - `Strategy`: the root holding the optional ENTRY and EXIT clauses
//!
//! Numeric and boolean expressions are separate types, so a cross or a
//! comparison can never be built over a boolean sub-expression.
//!
//! `Display` renders canonical DSL text that parses back into the same tree,
//! apart from source positions.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossDirection {
    /// First series moves from at-or-below to strictly above the second.
    Over,
    /// First series moves from at-or-above to strictly below the second.
    Under,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(f64),
    Field { name: String, position: usize },
    Indicator(IndicatorCall),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorCall {
    /// Uppercase indicator name.
    pub name: String,
    pub args: Vec<Operand>,
    /// Byte offset of the indicator name in the source text.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Comparison {
        op: CompareOp,
        left: Operand,
        right: Operand,
    },
    /// A flat run of operands joined by one operator, e.g. `a AND b AND c`.
    Logical {
        op: LogicalOp,
        operands: Vec<Condition>,
    },
    Cross {
        direction: CrossDirection,
        left: Operand,
        right: Operand,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clause {
    Entry,
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub entry: Option<Condition>,
    pub exit: Option<Condition>,
}

impl Strategy {
    /// Present clauses in fixed ENTRY-then-EXIT order.
    pub fn clauses(&self) -> impl Iterator<Item = (Clause, &Condition)> {
        self.entry
            .iter()
            .map(|c| (Clause::Entry, c))
            .chain(self.exit.iter().map(|c| (Clause::Exit, c)))
    }
}

impl Condition {
    pub fn and(left: Condition, right: Condition) -> Self {
        Condition::join(LogicalOp::And, left, right)
    }

    pub fn or(left: Condition, right: Condition) -> Self {
        Condition::join(LogicalOp::Or, left, right)
    }

    /// Append `right` to `left` when `left` is already a run of `op`,
    /// otherwise start a new two-operand run.
    pub fn join(op: LogicalOp, left: Condition, right: Condition) -> Self {
        match left {
            Condition::Logical {
                op: left_op,
                mut operands,
            } if left_op == op => {
                operands.push(right);
                Condition::Logical { op, operands }
            }
            left => Condition::Logical {
                op,
                operands: vec![left, right],
            },
        }
    }

    /// Visit every top-level operand of this condition, left to right.
    pub fn for_each_operand<'a>(&'a self, f: &mut impl FnMut(&'a Operand)) {
        match self {
            Condition::Comparison { left, right, .. } | Condition::Cross { left, right, .. } => {
                f(left);
                f(right);
            }
            Condition::Logical { operands, .. } => {
                for operand in operands {
                    operand.for_each_operand(f);
                }
            }
        }
    }
}

impl CompareOp {
    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::Gt => left > right,
            CompareOp::Lt => left < right,
            CompareOp::Ge => left >= right,
            CompareOp::Le => left <= right,
            CompareOp::Eq => left == right,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
        };
        f.write_str(s)
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => f.write_str("AND"),
            LogicalOp::Or => f.write_str("OR"),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Entry => f.write_str("ENTRY"),
            Clause::Exit => f.write_str("EXIT"),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(v) => write!(f, "{}", v),
            Operand::Field { name, .. } => f.write_str(name),
            Operand::Indicator(call) => write!(f, "{}", call),
        }
    }
}

impl fmt::Display for IndicatorCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Comparison { op, left, right } => write!(f, "{} {} {}", left, op, right),
            Condition::Logical { op, operands } => {
                f.write_str("(")?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op)?;
                    }
                    write!(f, "{}", operand)?;
                }
                f.write_str(")")
            }
            Condition::Cross {
                direction: CrossDirection::Over,
                left,
                right,
            } => write!(f, "CROSSOVER({}, {})", left, right),
            Condition::Cross {
                direction: CrossDirection::Under,
                left,
                right,
            } => write!(f, "CROSSUNDER({}, {})", left, right),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (clause, condition) in self.clauses() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "{}: {}", clause, condition)?;
        }
        Ok(())
    }
}

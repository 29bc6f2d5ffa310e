use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::debug;
use thiserror::Error;

use crate::context::{Context, ContextValue};
use crate::eval::ops::{self, CheckOp};
use crate::model::config::{Check, Condition, Flag, ValueDefinition};
use crate::model::enums::Operator;
use crate::value::Value;

/// A compilation failure of a single check. Always recovered locally: the
/// check compiles to always-false instead.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("invalid comparison value for {0}: {1}")]
    BadValue(Operator, serde_json::Value),
    #[error("invalid pattern for {0}: {1}")]
    BadPattern(Operator, regex::Error),
}

/// A check compiled against one context variable.
#[derive(Debug)]
pub struct CompiledCheck {
    variable: String,
    op: CheckOp,
}

impl CompiledCheck {
    fn always_false() -> Self {
        Self {
            variable: String::default(),
            op: CheckOp::AlwaysFalse,
        }
    }

    pub fn matches(&self, ctx: &Context) -> bool {
        self.op.matches(ctx.get(&self.variable))
    }
}

/// An AND-combination of compiled checks. Empty conditions never match.
#[derive(Debug)]
pub struct CompiledCondition {
    checks: Vec<CompiledCheck>,
}

impl CompiledCondition {
    pub fn matches(&self, ctx: &Context) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|check| check.matches(ctx))
    }
}

#[derive(Debug)]
pub struct FlagEval {
    enabled: bool,
    conditions: Vec<CompiledCondition>,
}

#[derive(Debug)]
pub struct ValueEval {
    enabled: bool,
    conditions: Vec<CompiledCondition>,
    default: Value,
    override_value: Value,
}

/// A compiled flag or value definition. Immutable once built; discarded
/// wholesale when a newer state version arrives.
#[derive(Debug)]
pub enum Evaluator {
    Flag(FlagEval),
    Value(ValueEval),
}

impl Evaluator {
    fn matched(&self, ctx: &Context) -> bool {
        let (enabled, conditions) = match self {
            Evaluator::Flag(flag) => (flag.enabled, &flag.conditions),
            Evaluator::Value(value) => (value.enabled, &value.conditions),
        };
        enabled && (conditions.is_empty() || conditions.iter().any(|cond| cond.matches(ctx)))
    }

    /// Evaluates against the given context. Returns the served value and
    /// whether the positive (override) outcome was taken.
    pub fn eval(&self, ctx: &Context) -> (Value, bool) {
        let positive = self.matched(ctx);
        let value = match self {
            Evaluator::Flag(_) => Value::Bool(positive),
            Evaluator::Value(value) => {
                if positive {
                    value.override_value.clone()
                } else {
                    value.default.clone()
                }
            }
        };
        (value, positive)
    }
}

/// Compiles one check. A check with an absent variable, operator or value
/// compiles to always-false, as does one with a malformed comparison value.
pub fn compile_check(check: &Check) -> CompiledCheck {
    let (variable, operator, value) = match (&check.variable, check.operator, &check.value) {
        (Some(variable), Some(operator), Some(value)) => (variable, operator, value),
        _ => return CompiledCheck::always_false(),
    };
    match build_op(operator, value) {
        Ok(op) => CompiledCheck {
            variable: variable.name.clone(),
            op,
        },
        Err(err) => {
            debug!("Check on '{}' compiled to always-false. {err}", variable.name);
            CompiledCheck::always_false()
        }
    }
}

fn build_op(operator: Operator, value: &serde_json::Value) -> Result<CheckOp, CompileError> {
    let op = match operator {
        Operator::Equal => CheckOp::Equal(comparand(operator, value)?),
        Operator::LessThan => CheckOp::LessThan(comparand(operator, value)?),
        Operator::LessOrEqual => CheckOp::LessOrEqual(comparand(operator, value)?),
        Operator::GreaterThan => CheckOp::GreaterThan(comparand(operator, value)?),
        Operator::GreaterOrEqual => CheckOp::GreaterOrEqual(comparand(operator, value)?),
        Operator::Contains => CheckOp::Contains(comparand(operator, value)?),
        Operator::Percent => {
            let threshold = value
                .as_f64()
                .ok_or_else(|| CompileError::BadValue(operator, value.clone()))?;
            CheckOp::Percent(threshold.clamp(0.0, 100.0))
        }
        Operator::Regexp => {
            let pattern = pattern_str(operator, value)?;
            CheckOp::Regexp(
                ops::regexp(pattern).map_err(|err| CompileError::BadPattern(operator, err))?,
            )
        }
        Operator::Wildcard => {
            let glob = pattern_str(operator, value)?;
            CheckOp::Wildcard(
                ops::wildcard(glob).map_err(|err| CompileError::BadPattern(operator, err))?,
            )
        }
        Operator::Subset => match comparison_set(operator, value)? {
            set if set.is_empty() => CheckOp::AlwaysFalse,
            set => CheckOp::Subset(set),
        },
        Operator::Superset => match comparison_set(operator, value)? {
            set if set.is_empty() => CheckOp::AlwaysFalse,
            set => CheckOp::Superset(set),
        },
    };
    Ok(op)
}

fn comparand(operator: Operator, value: &serde_json::Value) -> Result<ContextValue, CompileError> {
    let comparand = match value {
        serde_json::Value::String(val) => ContextValue::String(val.clone()),
        serde_json::Value::Bool(val) => ContextValue::Bool(*val),
        serde_json::Value::Number(val) => {
            if let Some(int_val) = val.as_i64() {
                ContextValue::Int(int_val)
            } else if let Some(float_val) = val.as_f64() {
                ContextValue::Float(float_val)
            } else {
                return Err(CompileError::BadValue(operator, value.clone()));
            }
        }
        serde_json::Value::Array(items) => {
            let mut strings = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str() {
                    Some(str_val) => strings.push(str_val.to_owned()),
                    None => return Err(CompileError::BadValue(operator, value.clone())),
                }
            }
            ContextValue::StringVec(strings)
        }
        _ => return Err(CompileError::BadValue(operator, value.clone())),
    };
    Ok(comparand)
}

fn pattern_str(operator: Operator, value: &serde_json::Value) -> Result<&str, CompileError> {
    value
        .as_str()
        .ok_or_else(|| CompileError::BadValue(operator, value.clone()))
}

fn comparison_set(
    operator: Operator,
    value: &serde_json::Value,
) -> Result<HashSet<String>, CompileError> {
    let items = value
        .as_array()
        .ok_or_else(|| CompileError::BadValue(operator, value.clone()))?;
    let mut set = HashSet::with_capacity(items.len());
    for item in items {
        match item.as_str() {
            Some(str_val) => {
                set.insert(str_val.to_owned());
            }
            None => return Err(CompileError::BadValue(operator, value.clone())),
        }
    }
    Ok(set)
}

fn compile_conditions(conditions: &[Condition]) -> Vec<CompiledCondition> {
    conditions
        .iter()
        .map(|cond| CompiledCondition {
            checks: cond.checks.iter().map(compile_check).collect(),
        })
        .collect()
}

/// Compiles a flag definition. Returns [`None`] when the flag is not
/// overridden on the server, signaling the caller to use the build-time
/// default.
pub fn compile_flag(flag: &Flag) -> Option<Evaluator> {
    if !flag.overridden {
        return None;
    }
    Some(Evaluator::Flag(FlagEval {
        enabled: flag.enabled,
        conditions: compile_conditions(&flag.conditions),
    }))
}

/// Compiles a value definition, with the same structure as [`compile_flag`]
/// but serving `value_override`/`value_default` instead of booleans.
pub fn compile_value(value: &ValueDefinition) -> Option<Evaluator> {
    if !value.overridden {
        return None;
    }
    Some(Evaluator::Value(ValueEval {
        enabled: value.enabled,
        conditions: compile_conditions(&value.conditions),
        default: value.value_default.clone(),
        override_value: value.value_override.clone(),
    }))
}

/// Builds the evaluator table of a state update. Names without a compiled
/// evaluator are omitted; the facade falls back to the static default.
pub fn compile_table(
    flags: &[Flag],
    values: &[ValueDefinition],
) -> HashMap<String, Arc<Evaluator>> {
    let mut table = HashMap::with_capacity(flags.len() + values.len());
    for flag in flags {
        if let Some(evaluator) = compile_flag(flag) {
            table.insert(flag.name.clone(), Arc::new(evaluator));
        }
    }
    for value in values {
        if let Some(evaluator) = compile_value(value) {
            table.insert(value.name.clone(), Arc::new(evaluator));
        }
    }
    table
}

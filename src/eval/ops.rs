use std::cmp::Ordering;
use std::collections::HashSet;

use regex::Regex;

use crate::context::ContextValue;
use crate::utils::percent_bucket;

/// A compiled condition check operator, holding its pre-parsed parameters.
///
/// Evaluation never fails: a type mismatch between the context value and the
/// comparison parameter is indistinguishable from "condition not met".
#[derive(Debug)]
pub enum CheckOp {
    /// Produced for malformed or incomplete checks. Fail-safe.
    AlwaysFalse,
    Equal(ContextValue),
    LessThan(ContextValue),
    LessOrEqual(ContextValue),
    GreaterThan(ContextValue),
    GreaterOrEqual(ContextValue),
    Contains(ContextValue),
    /// Threshold in [0, 100]; the context value's stable hash bucket must be below it.
    Percent(f64),
    Regexp(Regex),
    Wildcard(Regex),
    Subset(HashSet<String>),
    Superset(HashSet<String>),
}

impl CheckOp {
    pub fn matches(&self, ctx_val: Option<&ContextValue>) -> bool {
        match self {
            CheckOp::AlwaysFalse => false,
            CheckOp::Equal(param) => ctx_val.is_some_and(|val| loose_eq(val, param)),
            CheckOp::LessThan(param) => {
                matches_ord(ctx_val, param, |ord| ord == Ordering::Less)
            }
            CheckOp::LessOrEqual(param) => {
                matches_ord(ctx_val, param, |ord| ord != Ordering::Greater)
            }
            CheckOp::GreaterThan(param) => {
                matches_ord(ctx_val, param, |ord| ord == Ordering::Greater)
            }
            CheckOp::GreaterOrEqual(param) => {
                matches_ord(ctx_val, param, |ord| ord != Ordering::Less)
            }
            CheckOp::Contains(param) => contains(ctx_val, param),
            CheckOp::Percent(threshold) => ctx_val
                .and_then(ContextValue::bucketing_key)
                .is_some_and(|key| f64::from(percent_bucket(&key)) < *threshold),
            CheckOp::Regexp(regex) | CheckOp::Wildcard(regex) => ctx_val
                .and_then(ContextValue::as_str)
                .is_some_and(|val| regex.is_match(val)),
            CheckOp::Subset(param) => ctx_val
                .and_then(ContextValue::as_str_vec)
                .is_some_and(|val| {
                    !param.is_empty()
                        && !val.is_empty()
                        && val.iter().all(|item| param.contains(item))
                }),
            CheckOp::Superset(param) => ctx_val
                .and_then(ContextValue::as_str_vec)
                .is_some_and(|val| {
                    !param.is_empty()
                        && !val.is_empty()
                        && param.iter().all(|item| val.contains(item))
                }),
        }
    }
}

/// Loose equality: ints and floats compare numerically with each other.
/// Strings never equal numbers, sets compare as sets.
fn loose_eq(val: &ContextValue, param: &ContextValue) -> bool {
    match (val, param) {
        (ContextValue::String(a), ContextValue::String(b)) => a == b,
        (ContextValue::Bool(a), ContextValue::Bool(b)) => a == b,
        (ContextValue::StringVec(a), ContextValue::StringVec(b)) => {
            let a: HashSet<&String> = a.iter().collect();
            let b: HashSet<&String> = b.iter().collect();
            a == b
        }
        _ => match (val.as_float(), param.as_float()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

/// Ordered comparison: numbers order with numbers, strings lexicographically
/// with strings. Everything else is incomparable and fails the check.
fn ord_cmp(val: &ContextValue, param: &ContextValue) -> Option<Ordering> {
    match (val, param) {
        (ContextValue::String(a), ContextValue::String(b)) => Some(a.cmp(b)),
        _ => match (val.as_float(), param.as_float()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    }
}

fn matches_ord(
    ctx_val: Option<&ContextValue>,
    param: &ContextValue,
    accept: impl Fn(Ordering) -> bool,
) -> bool {
    ctx_val
        .and_then(|val| ord_cmp(val, param))
        .is_some_and(accept)
}

/// Membership check. A missing context value behaves as an empty string, so
/// an empty comparison value matches it.
fn contains(ctx_val: Option<&ContextValue>, param: &ContextValue) -> bool {
    let needle = match param {
        ContextValue::String(needle) => needle,
        _ => return false,
    };
    match ctx_val {
        None => needle.is_empty(),
        Some(ContextValue::String(haystack)) => haystack.contains(needle.as_str()),
        Some(ContextValue::StringVec(items)) => items.contains(needle),
        Some(_) => false,
    }
}

/// Compiles a regexp comparison value. Matching is anchored at the start
/// only; a prefix match is enough.
pub fn regexp(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})"))
}

/// Compiles a wildcard glob into a fully anchored regex, with `*` matching
/// any substring.
pub fn wildcard(glob: &str) -> Result<Regex, regex::Error> {
    let fragments: Vec<String> = glob.split('*').map(|f| regex::escape(f)).collect();
    Regex::new(&format!("^{}$", fragments.join("(?:.*)")))
}

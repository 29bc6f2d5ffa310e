use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt::{Display, Formatter};

/// The type of a declared context variable.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize_repr, Serialize_repr)]
#[repr(u8)]
pub enum VariableType {
    /// A text variable.
    String = 1,
    /// A whole number variable.
    Int = 2,
    /// A decimal number variable.
    Float = 3,
    /// An on/off variable.
    Bool = 4,
    /// A string set variable.
    Set = 5,
}

/// Comparison operator of a condition check.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize_repr, Serialize_repr)]
#[repr(u8)]
pub enum Operator {
    /// Checks whether the context value is equal to the comparison value.
    Equal = 1,
    /// Checks whether the context value is less than the comparison value.
    LessThan = 2,
    /// Checks whether the context value is less than or equal to the comparison value.
    LessOrEqual = 3,
    /// Checks whether the context value is greater than the comparison value.
    GreaterThan = 4,
    /// Checks whether the context value is greater than or equal to the comparison value.
    GreaterOrEqual = 5,
    /// Checks whether the context value contains the comparison value as a substring or member.
    Contains = 6,
    /// Checks whether the context value's stable hash bucket is below the comparison value.
    Percent = 7,
    /// Checks whether the context value matches the comparison pattern (anchored at start).
    Regexp = 8,
    /// Checks whether the context value matches the comparison glob (`*` matches any substring).
    Wildcard = 9,
    /// Checks whether the context value set is fully contained within the comparison set.
    Subset = 10,
    /// Checks whether the comparison set is fully contained within the context value set.
    Superset = 11,
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Equal => f.write_str("EQUAL"),
            Operator::LessThan => f.write_str("LESS THAN"),
            Operator::LessOrEqual => f.write_str("LESS OR EQUAL"),
            Operator::GreaterThan => f.write_str("GREATER THAN"),
            Operator::GreaterOrEqual => f.write_str("GREATER OR EQUAL"),
            Operator::Contains => f.write_str("CONTAINS"),
            Operator::Percent => f.write_str("PERCENT"),
            Operator::Regexp => f.write_str("REGEXP"),
            Operator::Wildcard => f.write_str("WILDCARD"),
            Operator::Subset => f.write_str("SUBSET"),
            Operator::Superset => f.write_str("SUPERSET"),
        }
    }
}

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Supported context attribute value types.
///
/// These correspond to the variable types that can be declared for a project:
/// `string`, `int`, `float`, `bool` and `set` (a set of strings).
#[derive(Debug)]
pub enum ContextValue {
    /// String context attribute value.
    String(String),
    /// Signed integer context attribute value.
    Int(i64),
    /// Float context attribute value.
    Float(f64),
    /// Bool context attribute value.
    Bool(bool),
    /// String set context attribute value.
    StringVec(Vec<String>),
}

impl Display for ContextValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextValue::String(val) => f.write_str(val),
            ContextValue::Int(val) => write!(f, "{val}"),
            ContextValue::Float(val) => write!(f, "{val}"),
            ContextValue::Bool(val) => write!(f, "{val}"),
            ContextValue::StringVec(_) => f.write_str("<vec of strings>"),
        }
    }
}

impl Serialize for ContextValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ContextValue::String(val) => serializer.serialize_str(val),
            ContextValue::Int(val) => serializer.serialize_i64(*val),
            ContextValue::Float(val) => serializer.serialize_f64(*val),
            ContextValue::Bool(val) => serializer.serialize_bool(*val),
            ContextValue::StringVec(val) => {
                let mut seq = serializer.serialize_seq(Some(val.len()))?;
                for element in val {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
        }
    }
}

impl ContextValue {
    /// The string form used for `percent` bucketing. Must stay stable across
    /// releases, otherwise users change buckets on upgrade.
    pub(crate) fn bucketing_key(&self) -> Option<String> {
        match self {
            ContextValue::String(val) => Some(val.clone()),
            ContextValue::Int(val) => Some(val.to_string()),
            ContextValue::Float(val) => Some(val.to_string()),
            ContextValue::Bool(val) => Some(val.to_string()),
            // Sets are not hashable.
            ContextValue::StringVec(_) => None,
        }
    }

    pub(crate) fn as_str(&self) -> Option<&str> {
        match self {
            ContextValue::String(val) => Some(val.as_str()),
            _ => None,
        }
    }

    pub(crate) fn as_float(&self) -> Option<f64> {
        match self {
            ContextValue::Int(val) => Some(*val as f64),
            ContextValue::Float(val) => Some(*val),
            _ => None,
        }
    }

    pub(crate) fn as_str_vec(&self) -> Option<&[String]> {
        match self {
            ContextValue::StringVec(val) => Some(val.as_slice()),
            _ => None,
        }
    }
}

/// Describes a request-scoped context. Contains the attributes that condition
/// checks are evaluated against.
///
/// # Examples:
///
/// ```rust
/// use featureflags::Context;
///
/// let ctx = Context::new()
///     .set("plan", "pro")
///     .set("team_size", 42)
///     .set("roles", vec!["admin", "billing"]);
/// ```
#[derive(Serialize, Default)]
pub struct Context {
    attributes: HashMap<String, ContextValue>,
}

impl Context {
    /// Initializes a new empty [`Context`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a context attribute used in condition checks (e.g. user id, plan,
    /// subscription type, etc.)
    ///
    /// # Examples:
    ///
    /// ```rust
    /// use featureflags::Context;
    ///
    /// let ctx = Context::new()
    ///     .set("plan", "pro")
    ///     .set("rating", 4.5);
    /// ```
    pub fn set<T: Into<ContextValue>>(mut self, key: &str, value: T) -> Self {
        self.attributes.insert(key.to_owned(), value.into());
        self
    }

    pub(crate) fn get(&self, key: &str) -> Option<&ContextValue> {
        self.attributes.get(key)
    }
}

impl Display for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(str) => write!(f, "{str}"),
            Err(_) => f.write_str("<invalid context>"),
        }
    }
}

impl From<Vec<&str>> for ContextValue {
    fn from(value: Vec<&str>) -> Self {
        let str_vec = value.iter().map(|x| x.to_string()).collect();
        Self::StringVec(str_vec)
    }
}

from_val_to_enum!(ContextValue String String);
from_val_to_enum!(ContextValue StringVec Vec<String>);
from_val_to_enum!(ContextValue Bool bool);
from_val_to_enum_into!(ContextValue Float f64 f32);
from_val_to_enum_into!(ContextValue Int i8 i16 i32 i64 u8 u16 u32);
from_val_to_enum_into!(ContextValue String &str);

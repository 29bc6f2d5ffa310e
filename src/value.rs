use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// Represents the value of a feature flag or feature value.
///
/// # Examples
///
/// ```rust
/// use featureflags::Value;
///
/// let bool_val = Value::Bool(true);
/// let int_val = Value::Int(42);
/// ```
#[derive(PartialEq, Debug, Clone)]
pub enum Value {
    /// A bool feature flag's value.
    Bool(bool),
    /// A whole number feature value.
    Int(i64),
    /// A decimal number feature value.
    Float(f64),
    /// A text feature value.
    String(String),
}

impl Value {
    /// Reads the value as `bool`. Returns [`None`] if it's not a [`Value::Bool`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use featureflags::Value;
    ///
    /// let value = Value::Bool(true);
    /// assert!(value.as_bool().unwrap());
    /// ```
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(val) = self {
            return Some(*val);
        }
        None
    }

    /// Reads the value as `i64`. Returns [`None`] if it's not a [`Value::Int`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use featureflags::Value;
    ///
    /// let value = Value::Int(42);
    /// assert_eq!(value.as_int().unwrap(), 42);
    /// ```
    pub fn as_int(&self) -> Option<i64> {
        if let Value::Int(val) = self {
            return Some(*val);
        }
        None
    }

    /// Reads the value as `f64`. Returns [`None`] if it's not a [`Value::Float`].
    pub fn as_float(&self) -> Option<f64> {
        if let Value::Float(val) = self {
            return Some(*val);
        }
        None
    }

    /// Reads the value as [`String`]. Returns [`None`] if it's not a [`Value::String`].
    pub fn as_str(&self) -> Option<String> {
        if let Value::String(val) = self {
            return Some(val.clone());
        }
        None
    }

    /// Creates a [`Value`] from a [`serde_json::Value`]. Returns [`None`] if the conversion is not possible.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use featureflags::Value;
    ///
    /// let json_str = serde_json::Value::String("foo".to_owned());
    /// assert_eq!(Value::String("foo".to_owned()), Value::from_json_val(&json_str).unwrap())
    /// ```
    pub fn from_json_val(json_val: &serde_json::Value) -> Option<Value> {
        match json_val {
            serde_json::Value::Bool(val) => Some(Value::Bool(*val)),
            serde_json::Value::String(val) => Some(Value::String(val.clone())),
            serde_json::Value::Number(val) => {
                if let Some(int_val) = val.as_i64() {
                    return Some(Value::Int(int_val));
                }
                if let Some(float_val) = val.as_f64() {
                    return Some(Value::Float(float_val));
                }
                None
            }
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(val) => write!(f, "{val}"),
            Value::Int(val) => write!(f, "{val}"),
            Value::Float(val) => write!(f, "{val}"),
            Value::String(val) => f.write_str(val),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Bool(val) => serializer.serialize_bool(*val),
            Value::Int(val) => serializer.serialize_i64(*val),
            Value::Float(val) => serializer.serialize_f64(*val),
            Value::String(val) => serializer.serialize_str(val),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json_val = serde_json::Value::deserialize(deserializer)?;
        Value::from_json_val(&json_val)
            .ok_or_else(|| DeError::custom(format!("invalid feature value: {json_val}")))
    }
}

/// Represents a primitive type that can describe the value of a feature flag or feature value.
pub trait ValuePrimitive: Into<Value> {
    /// Reads the primitive value from a [`Value`].
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! primitive_impl {
    ($ob:ident $to:ident $as_m:ident $t:ty) => (
        from_val_to_enum!($ob $to $t);

        impl ValuePrimitive for $t {
            fn from_value(value: &Value) -> Option<Self> {
                value.$as_m()
            }
        }
    )
}

primitive_impl!(Value String as_str String);
primitive_impl!(Value Float as_float f64);
primitive_impl!(Value Int as_int i64);
primitive_impl!(Value Bool as_bool bool);
from_val_to_enum_into!(Value String &str);

#[cfg(test)]
mod value_tests {
    use crate::Value;

    #[test]
    fn json_roundtrip() {
        let parsed = serde_json::from_str::<Value>("100").unwrap();
        assert_eq!(parsed, Value::Int(100));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "100");

        let parsed = serde_json::from_str::<Value>(r#""pro""#).unwrap();
        assert_eq!(parsed, Value::String("pro".to_owned()));

        let parsed = serde_json::from_str::<Value>("true").unwrap();
        assert_eq!(parsed, Value::Bool(true));

        assert!(serde_json::from_str::<Value>("[1, 2]").is_err());
    }
}

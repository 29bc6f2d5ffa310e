use crate::model::enums::{Operator, VariableType};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Describes a context variable declared by the application.
///
/// Declared variables are reported to the server on preload so conditions can
/// be defined against them on the management side.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Variable {
    /// The name of the variable, used as the context key in checks.
    pub name: String,
    /// The type of the variable.
    #[serde(rename = "type")]
    pub variable_type: VariableType,
}

impl Variable {
    /// Creates a new [`Variable`] declaration.
    pub fn new(name: &str, variable_type: VariableType) -> Self {
        Self {
            name: name.to_owned(),
            variable_type,
        }
    }
}

/// One atomic comparison of a condition.
///
/// Any of the parts may be absent in a server reply; such a check always
/// evaluates to false.
#[derive(Deserialize, Debug, Clone)]
pub struct Check {
    /// The variable whose context value is compared.
    pub variable: Option<Variable>,
    /// The comparison operator.
    pub operator: Option<Operator>,
    /// The value the context value is compared to.
    pub value: Option<serde_json::Value>,
}

/// An AND-combination of checks. An empty check list evaluates to false.
#[derive(Deserialize, Debug, Clone)]
pub struct Condition {
    /// The checks of the condition, all of which must match.
    #[serde(default)]
    pub checks: Vec<Check>,
}

/// Describes a boolean feature flag.
#[derive(Deserialize, Debug, Clone)]
pub struct Flag {
    /// The unique name of the flag.
    pub name: String,
    /// The state the flag serves when it is overridden and a condition matches
    /// (or it has no conditions).
    pub enabled: bool,
    /// Whether the flag was overridden on the server. Non-overridden flags
    /// fall back to the build-time default.
    pub overridden: bool,
    /// The conditions of the flag, in a logical OR relation.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Describes a typed feature value.
#[derive(Deserialize, Debug, Clone)]
pub struct ValueDefinition {
    /// The unique name of the value.
    pub name: String,
    /// Whether the override value is being served.
    pub enabled: bool,
    /// Whether the value was overridden on the server.
    pub overridden: bool,
    /// The value served when the value is disabled or no condition matches.
    pub value_default: Value,
    /// The value served when the value is enabled and a condition matches.
    pub value_override: Value,
    /// The conditions of the value, in a logical OR relation.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Usage statistics of one flag or value, collected between sync exchanges.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FlagUsage {
    /// The name of the flag or value.
    pub name: String,
    /// How many times the positive outcome was served.
    pub positive_count: u64,
    /// How many times the negative (default) outcome was served.
    pub negative_count: u64,
    /// Unix timestamp of the start of the collection interval.
    pub interval: i64,
}

/// The request payload of the preload exchange.
#[derive(Serialize, Debug)]
pub struct PreloadFlagsRequest {
    /// The project the flags belong to.
    pub project: String,
    /// The declared context variables.
    pub variables: Vec<Variable>,
    /// The tracked flag names.
    pub flags: Vec<String>,
    /// The tracked value names.
    pub values: Vec<String>,
    /// The currently held state version.
    pub version: i64,
}

/// The request payload of the sync exchange.
#[derive(Serialize, Debug)]
pub struct SyncFlagsRequest {
    /// The project the flags belong to.
    pub project: String,
    /// The tracked flag names.
    pub flags: Vec<String>,
    /// The tracked value names.
    pub values: Vec<String>,
    /// The currently held state version.
    pub version: i64,
    /// Usage statistics collected since the previous exchange.
    pub flags_usage: Vec<FlagUsage>,
}

/// The reply payload shared by the preload and sync exchanges.
#[derive(Deserialize, Debug, Default)]
pub struct ExchangeReply {
    /// The server-assigned version of the returned definitions.
    pub version: i64,
    /// The current flag definitions.
    #[serde(default)]
    pub flags: Vec<Flag>,
    /// The current value definitions.
    #[serde(default)]
    pub values: Vec<ValueDefinition>,
}

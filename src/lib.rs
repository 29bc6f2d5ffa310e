//! FeatureFlags client SDK for Rust.

#![warn(missing_docs)]

#[macro_use]
mod macros;
mod client;
mod constants;
mod context;
mod errors;
mod eval;
mod fetch;
mod model;
mod options;
mod snapshot;
mod state;
mod stats;
mod utils;
mod value;

pub use client::Client;
pub use constants::PKG_VERSION;
pub use context::{Context, ContextValue};
pub use errors::{ClientError, ErrorKind};

pub use model::config::{
    Check, Condition, ExchangeReply, Flag, FlagUsage, PreloadFlagsRequest, SyncFlagsRequest,
    ValueDefinition, Variable,
};

pub use model::enums::{Operator, VariableType};

pub use options::{ClientBuilder, Options};
pub use snapshot::Snapshot;
pub use value::{Value, ValuePrimitive};

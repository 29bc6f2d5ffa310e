use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::error;

use crate::context::Context;
use crate::errors::{ClientError, ErrorKind};
use crate::options::Options;
use crate::state::VersionedTable;
use crate::stats::StatsCollector;
use crate::value::{Value, ValuePrimitive};

/// A per-request view of the flag and value state.
///
/// A snapshot is pinned to the state version current at its creation, so
/// every access during one request sees the same configuration even while
/// the background sync keeps updating the client. Each accessed name is
/// evaluated once and memoized; its usage is reported with the next sync
/// exchange.
///
/// # Examples
///
/// ```no_run
/// # async fn readme(client: featureflags::Client) {
/// use featureflags::Context;
///
/// let ctx = Context::new().set("user.login", "alice");
/// let snapshot = client.snapshot(ctx);
/// if snapshot.is_enabled("NEW_CHECKOUT").unwrap() {
///     // ...
/// }
/// # }
/// ```
pub struct Snapshot {
    table: Arc<VersionedTable>,
    options: Arc<Options>,
    stats: Arc<StatsCollector>,
    ctx: Context,
    overrides: HashMap<String, Value>,
    memo: Mutex<HashMap<String, Value>>,
}

impl Snapshot {
    pub(crate) fn new(
        table: Arc<VersionedTable>,
        options: Arc<Options>,
        stats: Arc<StatsCollector>,
        ctx: Context,
        overrides: HashMap<String, Value>,
    ) -> Self {
        Self {
            table,
            options,
            stats,
            ctx,
            overrides,
            memo: Mutex::default(),
        }
    }

    /// The state version this snapshot is pinned to. `0` until the first
    /// successful exchange with the server.
    pub fn version(&self) -> i64 {
        self.table.version
    }

    /// Evaluates the feature flag identified by the given `name` against
    /// this snapshot's context.
    ///
    /// # Errors
    ///
    /// This method fails if the flag was not declared on the [`crate::Client`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn readme(client: featureflags::Client) {
    /// use featureflags::Context;
    ///
    /// let snapshot = client.snapshot(Context::new().set("plan", "pro"));
    /// let enabled = snapshot.is_enabled("NEW_CHECKOUT").unwrap();
    /// # }
    /// ```
    pub fn is_enabled(&self, name: &str) -> Result<bool, ClientError> {
        let default = *self
            .options
            .defaults()
            .get(name)
            .ok_or_else(|| self.not_declared(name, "flag"))?;
        if let Some(memoized) = self.memoized(name) {
            return Ok(memoized.as_bool().unwrap_or(default));
        }

        let enabled = match self.overrides.get(name).and_then(Value::as_bool) {
            Some(forced) => forced,
            None => match self.table.get(name) {
                Some(evaluator) => evaluator.eval(&self.ctx).1,
                None => default,
            },
        };
        self.stats.track(name, enabled);
        self.memoize(name, Value::Bool(enabled));
        Ok(enabled)
    }

    /// Evaluates the feature value identified by the given `name` against
    /// this snapshot's context.
    ///
    /// # Errors
    ///
    /// This method fails if the value was not declared on the [`crate::Client`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn readme(client: featureflags::Client) {
    /// use featureflags::Context;
    ///
    /// let snapshot = client.snapshot(Context::new().set("plan", "pro"));
    /// let limit = snapshot.value("UPLOAD_LIMIT").unwrap();
    /// # }
    /// ```
    pub fn value(&self, name: &str) -> Result<Value, ClientError> {
        let default = self
            .options
            .values_defaults()
            .get(name)
            .ok_or_else(|| self.not_declared(name, "value"))?;
        if let Some(memoized) = self.memoized(name) {
            return Ok(memoized);
        }

        let (value, positive) = match self.overrides.get(name) {
            Some(forced) => (forced.clone(), true),
            None => match self.table.get(name) {
                Some(evaluator) => evaluator.eval(&self.ctx),
                None => (default.clone(), false),
            },
        };
        self.stats.track(name, positive);
        self.memoize(name, value.clone());
        Ok(value)
    }

    /// The same as [`Snapshot::value`] but reads the result as the requested
    /// primitive type. Returns `Ok(None)` when the served value has a
    /// different type.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn readme(client: featureflags::Client) {
    /// use featureflags::Context;
    ///
    /// let snapshot = client.snapshot(Context::new());
    /// let limit: Option<i64> = snapshot.value_as("UPLOAD_LIMIT").unwrap();
    /// # }
    /// ```
    pub fn value_as<T: ValuePrimitive>(&self, name: &str) -> Result<Option<T>, ClientError> {
        Ok(T::from_value(&self.value(name)?))
    }

    fn memoized(&self, name: &str) -> Option<Value> {
        self.memo
            .lock()
            .map(|memo| memo.get(name).cloned())
            .unwrap_or_default()
    }

    fn memoize(&self, name: &str, value: Value) {
        if let Ok(mut memo) = self.memo.lock() {
            memo.insert(name.to_owned(), value);
        }
    }

    fn not_declared(&self, name: &str, kind: &str) -> ClientError {
        let err = ClientError::new(
            ErrorKind::FlagNotDeclared,
            format!("The {kind} '{name}' was not declared on the client"),
        );
        error!(event_id = err.kind.as_u8(); "{}", err);
        err
    }
}

#[cfg(test)]
mod snapshot_tests {
    use super::*;
    use crate::model::config::{Check, Condition, Flag, ValueDefinition, Variable};
    use crate::model::enums::{Operator, VariableType};
    use crate::options::ClientBuilder;
    use crate::state::State;

    fn pro_conditions() -> Vec<Condition> {
        vec![Condition {
            checks: vec![Check {
                variable: Some(Variable::new("plan", VariableType::String)),
                operator: Some(Operator::Equal),
                value: Some("pro".into()),
            }],
        }]
    }

    fn test_snapshot(ctx: Context, overrides: HashMap<String, Value>) -> Snapshot {
        let options = Arc::new(
            ClientBuilder::new("http://localhost", "test-project")
                .flag_default("TEST", false)
                .value_default("LIMIT", Value::Int(10))
                .build_options(),
        );
        let state = State::new(
            options.project().to_owned(),
            vec![],
            vec!["TEST".to_owned()],
            vec!["LIMIT".to_owned()],
        );
        state.update(
            &[Flag {
                name: "TEST".to_owned(),
                enabled: true,
                overridden: true,
                conditions: pro_conditions(),
            }],
            &[ValueDefinition {
                name: "LIMIT".to_owned(),
                enabled: true,
                overridden: true,
                value_default: Value::Int(10),
                value_override: Value::Int(100),
                conditions: pro_conditions(),
            }],
            1,
        );
        let stats = Arc::new(StatsCollector::from_defaults(
            options
                .defaults()
                .keys()
                .chain(options.values_defaults().keys()),
        ));
        Snapshot::new(state.snapshot(), options, stats, ctx, overrides)
    }

    #[test]
    fn flag_follows_conditions() {
        let snapshot = test_snapshot(Context::new().set("plan", "pro"), HashMap::default());
        assert!(snapshot.is_enabled("TEST").unwrap());

        let snapshot = test_snapshot(Context::new().set("plan", "free"), HashMap::default());
        assert!(!snapshot.is_enabled("TEST").unwrap());
    }

    #[test]
    fn value_follows_conditions() {
        let snapshot = test_snapshot(Context::new().set("plan", "pro"), HashMap::default());
        assert_eq!(snapshot.value("LIMIT").unwrap(), Value::Int(100));
        assert_eq!(snapshot.value_as::<i64>("LIMIT").unwrap(), Some(100));
        assert_eq!(snapshot.value_as::<String>("LIMIT").unwrap(), None);

        let snapshot = test_snapshot(Context::new(), HashMap::default());
        assert_eq!(snapshot.value("LIMIT").unwrap(), Value::Int(10));
    }

    #[test]
    fn undeclared_name_is_an_error() {
        let snapshot = test_snapshot(Context::new(), HashMap::default());
        let err = snapshot.is_enabled("MISSING").unwrap_err();
        assert_eq!(err.kind, ErrorKind::FlagNotDeclared);
        let err = snapshot.value("MISSING").unwrap_err();
        assert_eq!(err.kind, ErrorKind::FlagNotDeclared);
    }

    #[test]
    fn overrides_win_over_evaluation() {
        let overrides = HashMap::from([
            ("TEST".to_owned(), Value::Bool(false)),
            ("LIMIT".to_owned(), Value::Int(1000)),
        ]);
        let snapshot = test_snapshot(Context::new().set("plan", "pro"), overrides);
        assert!(!snapshot.is_enabled("TEST").unwrap());
        assert_eq!(snapshot.value("LIMIT").unwrap(), Value::Int(1000));
    }

    #[test]
    fn mistyped_flag_override_is_ignored() {
        let overrides = HashMap::from([("TEST".to_owned(), Value::String("yes".to_owned()))]);
        let snapshot = test_snapshot(Context::new().set("plan", "pro"), overrides);
        assert!(snapshot.is_enabled("TEST").unwrap());
    }

    #[test]
    fn evaluation_is_memoized_and_tracked_once() {
        let snapshot = test_snapshot(Context::new().set("plan", "pro"), HashMap::default());
        assert!(snapshot.is_enabled("TEST").unwrap());
        assert!(snapshot.is_enabled("TEST").unwrap());
        assert_eq!(snapshot.value("LIMIT").unwrap(), Value::Int(100));

        let usage = snapshot.stats.flush();
        let test = usage.iter().find(|u| u.name == "TEST").unwrap();
        assert_eq!((test.positive_count, test.negative_count), (1, 0));
        let limit = usage.iter().find(|u| u.name == "LIMIT").unwrap();
        assert_eq!((limit.positive_count, limit.negative_count), (1, 0));
    }
}

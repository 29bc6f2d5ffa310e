use std::collections::HashMap;
use std::sync::Arc;

use crate::context::Context;
use crate::errors::ClientError;
use crate::fetch::service::SyncService;
use crate::options::{ClientBuilder, Options};
use crate::snapshot::Snapshot;
use crate::state::State;
use crate::stats::StatsCollector;
use crate::value::Value;

/// The main component that keeps the flag and value state in sync with the
/// flags server and hands out per-request [`Snapshot`]s for evaluation.
///
/// # Examples
///
/// ```no_run
/// use featureflags::{Client, Context};
///
/// #[tokio::main]
/// async fn main() {
///     let client = Client::builder("https://flags.example.com", "my-project")
///         .flag_default("NEW_CHECKOUT", false)
///         .build()
///         .unwrap();
///
///     client.preload().await.unwrap();
///     client.start().unwrap();
///
///     let snapshot = client.snapshot(Context::new().set("user.login", "alice"));
///     let enabled = snapshot.is_enabled("NEW_CHECKOUT").unwrap();
///
///     client.shutdown().await;
/// }
/// ```
pub struct Client {
    options: Arc<Options>,
    state: Arc<State>,
    stats: Arc<StatsCollector>,
    service: SyncService,
}

impl Client {
    pub(crate) fn with_options(options: Options) -> Result<Self, ClientError> {
        let opts = Arc::new(options);
        let state = Arc::new(State::new(
            opts.project().to_owned(),
            opts.variables().to_vec(),
            opts.defaults().keys().cloned().collect(),
            opts.values_defaults().keys().cloned().collect(),
        ));
        let stats = Arc::new(StatsCollector::from_defaults(
            opts.defaults().keys().chain(opts.values_defaults().keys()),
        ));
        let service = SyncService::new(&opts, &state, &stats)?;
        Ok(Self {
            options: opts,
            state,
            stats,
            service,
        })
    }

    /// Creates a new [`ClientBuilder`] used to build a [`Client`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use featureflags::Client;
    ///
    /// let client = Client::builder("https://flags.example.com", "my-project")
    ///     .flag_default("NEW_CHECKOUT", false)
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn builder(url: &str, project: &str) -> ClientBuilder {
        ClientBuilder::new(url, project)
    }

    /// Performs the initial exchange with the flags server: declares the
    /// project's variables, flags and values, and applies the returned state.
    ///
    /// # Errors
    ///
    /// This method fails if the HTTP request fails or returns an invalid
    /// response. The client stays usable on its build-time defaults.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn readme(client: featureflags::Client) {
    /// client.preload().await.unwrap();
    /// # }
    /// ```
    pub async fn preload(&self) -> Result<(), ClientError> {
        self.service.preload().await
    }

    /// Starts the background task that periodically syncs the state with the
    /// flags server and reports the collected usage statistics.
    ///
    /// # Errors
    ///
    /// This method fails if the background task is already running.
    pub fn start(&self) -> Result<(), ClientError> {
        self.service.start()
    }

    /// Stops the background sync task and waits for its termination.
    pub async fn shutdown(&self) {
        self.service.stop().await;
    }

    /// Creates a [`Snapshot`] of the current state, evaluated against the
    /// given [`Context`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn readme(client: featureflags::Client) {
    /// use featureflags::Context;
    ///
    /// let snapshot = client.snapshot(Context::new().set("user.login", "alice"));
    /// # }
    /// ```
    pub fn snapshot(&self, ctx: Context) -> Snapshot {
        self.snapshot_with_overrides(ctx, HashMap::default())
    }

    /// The same as [`Client::snapshot`] but with per-request overrides that
    /// take precedence over the server-side state.
    ///
    /// A flag override only applies when it is a [`Value::Bool`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn readme(client: featureflags::Client) {
    /// use std::collections::HashMap;
    /// use featureflags::{Context, Value};
    ///
    /// let overrides = HashMap::from([("NEW_CHECKOUT".to_owned(), Value::Bool(true))]);
    /// let snapshot = client.snapshot_with_overrides(Context::new(), overrides);
    /// # }
    /// ```
    pub fn snapshot_with_overrides(
        &self,
        ctx: Context,
        overrides: HashMap<String, Value>,
    ) -> Snapshot {
        Snapshot::new(
            self.state.snapshot(),
            Arc::clone(&self.options),
            Arc::clone(&self.stats),
            ctx,
            overrides,
        )
    }
}

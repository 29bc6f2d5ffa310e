use std::collections::HashMap;
use std::time::Duration;

use crate::errors::{ClientError, ErrorKind};
use crate::model::config::Variable;
use crate::value::Value;
use crate::Client;

/// Configuration options of the [`Client`].
pub struct Options {
    url: String,
    project: String,
    variables: Vec<Variable>,
    defaults: HashMap<String, bool>,
    values_defaults: HashMap<String, Value>,
    request_timeout: Duration,
    refresh_interval: Duration,
}

impl Options {
    /// Get the flags server base URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the project name.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Get the declared context variables.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Get the declared flags with their build-time defaults.
    pub fn defaults(&self) -> &HashMap<String, bool> {
        &self.defaults
    }

    /// Get the declared feature values with their build-time defaults.
    pub fn values_defaults(&self) -> &HashMap<String, Value> {
        &self.values_defaults
    }

    /// Get the configured HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Get the configured refresh interval of the sync loop.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }
}

/// Builder to create the [`Client`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use featureflags::{Client, Value, Variable, VariableType};
///
/// let client = Client::builder("https://flags.example.com", "my-project")
///     .variable(Variable::new("plan", VariableType::String))
///     .flag_default("NEW_CHECKOUT", false)
///     .value_default("UPLOAD_LIMIT", Value::Int(10))
///     .refresh_interval(Duration::from_secs(10))
///     .build()
///     .unwrap();
/// ```
pub struct ClientBuilder {
    url: String,
    project: String,
    variables: Vec<Variable>,
    defaults: HashMap<String, bool>,
    values_defaults: HashMap<String, Value>,
    request_timeout: Option<Duration>,
    refresh_interval: Option<Duration>,
}

impl ClientBuilder {
    pub(crate) fn new(url: &str, project: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_owned(),
            project: project.to_owned(),
            variables: Vec::default(),
            defaults: HashMap::default(),
            values_defaults: HashMap::default(),
            request_timeout: None,
            refresh_interval: None,
        }
    }

    /// Declare a context variable usable in server-side conditions.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use featureflags::{Client, Variable, VariableType};
    ///
    /// let builder = Client::builder("https://flags.example.com", "my-project")
    ///     .variable(Variable::new("plan", VariableType::String));
    /// ```
    pub fn variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Declare a feature flag with its build-time default state.
    ///
    /// Only declared flags can be accessed on a [`crate::Snapshot`].
    pub fn flag_default(mut self, name: &str, enabled: bool) -> Self {
        self.defaults.insert(name.to_owned(), enabled);
        self
    }

    /// Declare a feature value with its build-time default.
    ///
    /// Only declared values can be accessed on a [`crate::Snapshot`].
    pub fn value_default(mut self, name: &str, value: Value) -> Self {
        self.values_defaults.insert(name.to_owned(), value);
        self
    }

    /// Set the HTTP request timeout.
    /// Default value is `5` seconds.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the interval between two successful sync exchanges.
    /// Default value is `10` seconds.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    /// Create the [`Client`] from the configuration made on the builder.
    ///
    /// # Errors
    ///
    /// This method fails if the URL or the project name is empty, or if the
    /// HTTP client cannot be initialized.
    pub fn build(self) -> Result<Client, ClientError> {
        if self.url.is_empty() {
            return Err(ClientError::new(
                ErrorKind::InvalidConfig,
                "The flags server URL cannot be empty".to_owned(),
            ));
        }
        if self.project.is_empty() {
            return Err(ClientError::new(
                ErrorKind::InvalidConfig,
                "The project name cannot be empty".to_owned(),
            ));
        }
        Client::with_options(self.build_options())
    }

    pub(crate) fn build_options(self) -> Options {
        Options {
            url: self.url,
            project: self.project,
            variables: self.variables,
            defaults: self.defaults,
            values_defaults: self.values_defaults,
            request_timeout: self.request_timeout.unwrap_or(Duration::from_secs(5)),
            refresh_interval: self.refresh_interval.unwrap_or(Duration::from_secs(10)),
        }
    }
}

#[cfg(test)]
mod options_tests {
    use super::*;

    #[test]
    fn defaults_applied() {
        let options = ClientBuilder::new("http://localhost/", "test-project").build_options();
        assert_eq!(options.url(), "http://localhost");
        assert_eq!(options.project(), "test-project");
        assert_eq!(options.request_timeout(), Duration::from_secs(5));
        assert_eq!(options.refresh_interval(), Duration::from_secs(10));
        assert!(options.defaults().is_empty());
    }

    #[test]
    fn empty_url_rejected() {
        let err = ClientBuilder::new("", "test-project").build().err().unwrap();
        assert_eq!(err.kind, ErrorKind::InvalidConfig);
    }

    #[test]
    fn empty_project_rejected() {
        let err = ClientBuilder::new("http://localhost", "").build().err().unwrap();
        assert_eq!(err.kind, ErrorKind::InvalidConfig);
    }
}

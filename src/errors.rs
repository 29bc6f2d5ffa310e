use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error kind that represents failures reported by the [`crate::Client`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ErrorKind {
    /// No error occurred.
    NoError,
    /// Initialization of the internal [`reqwest::Client`] failed.
    HttpClientInitFailure,
    /// The accessed flag or value name was not declared at client construction.
    FlagNotDeclared = 1001,
    /// The client was constructed with invalid options.
    InvalidConfig = 1002,
    /// Invalid HTTP response was received (unexpected HTTP status code).
    UnexpectedHttpResponse = 1101,
    /// The HTTP request timed out.
    HttpRequestTimeout = 1102,
    /// The HTTP request failed (most likely, due to a local network issue).
    HttpRequestFailure = 1103,
    /// An invalid HTTP response was received (200 OK with an invalid content).
    InvalidHttpResponseContent = 1105,
    /// The refresh loop was started while it was already running.
    AlreadyStarted = 3200,
}

impl ErrorKind {
    pub(crate) fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/// Error struct that holds the [`ErrorKind`] and message of the reported failure.
#[derive(Debug, PartialEq)]
pub struct ClientError {
    /// Error kind that represents failures reported by the [`crate::Client`].
    pub kind: ErrorKind,
    /// The text representation of the failure.
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: ErrorKind, message: String) -> Self {
        Self { message, kind }
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message.as_str())
    }
}

impl Error for ClientError {}

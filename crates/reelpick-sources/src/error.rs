use std::fmt;
use thiserror::Error;

/// Non-success HTTP response from a source server
#[derive(Debug, Error)]
#[error("{what} failed with status {status}: {body}")]
pub struct HttpStatusError {
    pub what: String,
    pub status: reqwest::StatusCode,
    pub body: String,
}

/// What went wrong, as far as callers need to branch on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// The server answered with this non-success status code
    Status(u16),
    Timeout,
    Other,
}

impl SourceErrorKind {
    fn from_cause(cause: &(dyn std::error::Error + 'static)) -> Option<Self> {
        if let Some(err) = cause.downcast_ref::<HttpStatusError>() {
            return Some(Self::Status(err.status.as_u16()));
        }
        let err = cause.downcast_ref::<reqwest::Error>()?;
        if err.is_timeout() {
            Some(Self::Timeout)
        } else {
            err.status().map(|status| Self::Status(status.as_u16()))
        }
    }
}

/// Failure reported by a catalog or watchlist source.
///
/// Adapters work with `anyhow` internally and collapse the whole context chain
/// into `message` at the port boundary. The `kind` is read off the chain
/// before it is flattened.
#[derive(Debug)]
pub struct SourceError {
    source_name: String,
    message: String,
    kind: SourceErrorKind,
}

impl SourceError {
    pub fn new(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            message: message.into(),
            kind: SourceErrorKind::Other,
        }
    }

    pub fn with_kind(mut self, kind: SourceErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn from_anyhow(source_name: impl Into<String>, err: anyhow::Error) -> Self {
        let kind = err
            .chain()
            .find_map(SourceErrorKind::from_cause)
            .unwrap_or(SourceErrorKind::Other);
        Self::new(source_name, format!("{:#}", err)).with_kind(kind)
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> SourceErrorKind {
        self.kind
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source_name, self.message)
    }
}

impl std::error::Error for SourceError {}

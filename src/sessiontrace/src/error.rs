use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;

/// Failures on the aggregator side of a correlation request.
///
/// Only `SourceFetch`, `Cancelled` and `DeadlineExceeded` ever reach the
/// caller. `Resolution` and `Attempt` are absorbed per record.
#[derive(Debug)]
pub enum CorrelationError {
    /// A hostname could not be turned into an IP
    Resolution {
        host: String,
        source: Option<std::io::Error>,
    },

    /// One of the two snapshot sources failed
    SourceFetch {
        source_name: &'static str,
        error: anyhow::Error,
    },

    /// One agent lookup failed or timed out
    Attempt { agent: String, error: anyhow::Error },

    Cancelled,

    DeadlineExceeded,
}

impl CorrelationError {
    pub fn resolution(host: &str, source: Option<std::io::Error>) -> Self {
        CorrelationError::Resolution {
            host: host.to_string(),
            source,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CorrelationError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for CorrelationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationError::Resolution {
                host,
                source: Some(e),
            } => write!(f, "could not resolve {}: {}", host, e),
            CorrelationError::Resolution { host, source: None } => {
                write!(f, "could not resolve {}: no addresses returned", host)
            }
            CorrelationError::SourceFetch { source_name, error } => {
                write!(f, "failed to fetch from {}: {:#}", source_name, error)
            }
            CorrelationError::Attempt { agent, error } => {
                write!(f, "agent {} lookup failed: {:#}", agent, error)
            }
            CorrelationError::Cancelled => write!(f, "request cancelled"),
            CorrelationError::DeadlineExceeded => write!(f, "request deadline exceeded"),
        }
    }
}

impl std::error::Error for CorrelationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CorrelationError::Resolution { source, .. } => source
                .as_ref()
                .map(|e| e as &(dyn std::error::Error + 'static)),
            CorrelationError::SourceFetch { error, .. } => Some(error.as_ref()),
            CorrelationError::Attempt { error, .. } => Some(error.as_ref()),
            CorrelationError::Cancelled | CorrelationError::DeadlineExceeded => None,
        }
    }
}

impl IntoResponse for CorrelationError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Failures of the agent's `/conns` endpoint.
#[derive(Debug)]
pub enum ConnsError {
    /// The `port` query parameter was not given
    MissingPort,

    /// The `port` query parameter is not an unsigned 32-bit integer
    InvalidPort(String),

    /// Reading the host tables failed
    Lookup(anyhow::Error),
}

impl fmt::Display for ConnsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnsError::MissingPort => write!(f, "port param is required"),
            ConnsError::InvalidPort(value) => write!(f, "invalid port param: {:?}", value),
            ConnsError::Lookup(e) => write!(f, "{:#}", e),
        }
    }
}

impl std::error::Error for ConnsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnsError::Lookup(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for ConnsError {
    fn from(err: anyhow::Error) -> Self {
        ConnsError::Lookup(err)
    }
}

impl IntoResponse for ConnsError {
    fn into_response(self) -> Response {
        let status = match self {
            ConnsError::MissingPort | ConnsError::InvalidPort(_) => StatusCode::BAD_REQUEST,
            ConnsError::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

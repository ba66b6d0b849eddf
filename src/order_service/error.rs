//! Order service error types

use thiserror::Error;

/// Order service error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Timeout, message)
    }

    pub fn status(code: u16, body: &str) -> Self {
        Self::new(
            ServiceErrorKind::Status(code),
            format!("Order service returned {code}: {body}"),
        )
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Decode, message)
    }

    #[allow(dead_code)] // Constructor for API completeness
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Unknown, message)
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("Order service timed out: {err}"))
        } else if err.is_decode() {
            Self::decode(format!("Unreadable order service response: {err}"))
        } else if let Some(status) = err.status() {
            Self::status(status.as_u16(), &err.to_string())
        } else {
            Self::network(format!("Order service unreachable: {err}"))
        }
    }
}

/// Error classification, used for logging only: every kind is recoverable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Connection refused, DNS, reset
    Network,
    /// Transport timeout elapsed
    Timeout,
    /// Non-2xx response
    Status(u16),
    /// Body was not the JSON we expected
    Decode,
    Unknown,
}

impl ServiceErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Status(_) => "status",
            Self::Decode => "decode",
            Self::Unknown => "unknown",
        }
    }
}

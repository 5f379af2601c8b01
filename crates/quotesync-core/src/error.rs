use thiserror::Error;

use crate::http_client::HttpError;

/// Validation errors raised while constructing domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter or '^': '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
}

/// Failures of the ingestion pipeline.
///
/// Only [`IngestError::Negotiation`] at the start of a run aborts the run;
/// every other variant is isolated to the instrument that produced it.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("session negotiation failed: {0}")]
    Negotiation(String),

    #[error("provider returned status {status}")]
    Provider { status: u16 },

    #[error("provider has no quote for '{ticker}'")]
    NotFound { ticker: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("transport error: {0}")]
    Transport(#[from] HttpError),
}

impl IngestError {
    pub fn negotiation(message: impl Into<String>) -> Self {
        Self::Negotiation(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// True for 401/403 responses, which mean the cookie/crumb pair was rejected.
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Provider { status: 401 | 403 })
    }

    pub const fn is_negotiation(&self) -> bool {
        matches!(self, Self::Negotiation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_401_and_403_are_auth_failures() {
        assert!(IngestError::Provider { status: 401 }.is_auth_failure());
        assert!(IngestError::Provider { status: 403 }.is_auth_failure());
        assert!(!IngestError::Provider { status: 429 }.is_auth_failure());
        assert!(!IngestError::Provider { status: 500 }.is_auth_failure());
        assert!(!IngestError::NotFound {
            ticker: String::from("NOPE")
        }
        .is_auth_failure());
    }
}

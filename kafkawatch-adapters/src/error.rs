//! Error types for adapters.

use kafkawatch_sync::FetchError;
use thiserror::Error;

/// Why a metrics query produced no snapshot.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The configured API base path is not an absolute URL.
    #[error("invalid metrics API base path '{0}'")]
    InvalidBasePath(String),

    /// The token was missing, expired, or lacks access to the instance.
    #[error("metrics API rejected the token ({status})")]
    Unauthorized { status: u16 },

    /// No such Kafka instance.
    #[error("Kafka instance '{0}' not found")]
    InstanceNotFound(String),

    /// Any other non-success status.
    #[error("metrics API returned status {status}")]
    Status { status: u16 },

    /// The API could not be reached.
    #[error("could not reach metrics API: {0}")]
    Unreachable(String),

    /// No response within the client timeout.
    #[error("metrics API timed out")]
    Timeout,

    /// The body was not a `query_range` response.
    #[error("malformed query_range response: {0}")]
    Decode(String),

    /// Any other transport failure.
    #[error("metrics request failed: {0}")]
    Transport(String),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Unreachable(err.to_string())
        } else if err.is_decode() {
            AdapterError::Decode(err.to_string())
        } else {
            AdapterError::Transport(err.to_string())
        }
    }
}

impl From<AdapterError> for FetchError {
    fn from(err: AdapterError) -> Self {
        FetchError::new(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_fetch_error() {
        let err: FetchError = AdapterError::Unauthorized { status: 401 }.into();
        assert_eq!(
            err.to_string(),
            "metrics fetch failed: metrics API rejected the token (401)"
        );
    }

    #[test]
    fn instance_not_found_names_the_instance() {
        let err = AdapterError::InstanceNotFound("kafka-9".into());
        assert_eq!(err.to_string(), "Kafka instance 'kafka-9' not found");
    }
}

//! The seam between the core and whatever performs the remote query.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use kafkawatch_types::TimeDuration;
use thiserror::Error;

use crate::kind::MetricsKind;

/// Opaque bearer token handed to the fetch port.
///
/// The token never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(Arc<str>);

impl Credentials {
    /// Wrap a bearer token.
    pub fn bearer(token: impl AsRef<str>) -> Self {
        Self(Arc::from(token.as_ref()))
    }

    /// The raw token, for the transport to attach.
    pub fn token(&self) -> &str {
        &self.0
    }

    /// True when no token is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self(Arc::from(""))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(<redacted>)")
    }
}

/// Which instance to query and how to reach the metrics API.
///
/// Fixed for the lifetime of a service; the selection varies per fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    /// Kafka instance identifier.
    pub instance_id: String,
    /// Base path of the metrics API, e.g. `https://api.example.com`.
    pub api_base_path: String,
    /// Token sent with every request.
    pub credentials: Credentials,
}

impl FetchTarget {
    /// Create a target for the given instance.
    pub fn new(
        instance_id: impl Into<String>,
        api_base_path: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            api_base_path: api_base_path.into(),
            credentials,
        }
    }
}

/// Parameters of one remote metrics query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub instance_id: String,
    pub time_duration: TimeDuration,
    /// Sampling step in minutes.
    pub time_interval: u32,
    pub selected_topic: Option<String>,
    pub credentials: Credentials,
    pub api_base_path: String,
}

impl FetchRequest {
    /// Build a request for `target` over `time_duration`.
    pub fn new(
        target: &FetchTarget,
        time_duration: TimeDuration,
        selected_topic: Option<String>,
    ) -> Self {
        Self {
            instance_id: target.instance_id.clone(),
            time_duration,
            time_interval: time_duration.interval_minutes(),
            selected_topic,
            credentials: target.credentials.clone(),
            api_base_path: target.api_base_path.clone(),
        }
    }
}

/// A failed fetch.
///
/// The core never inspects the cause; any error is a `fetchFail`.
#[derive(Debug, Error)]
#[error("metrics fetch failed: {source}")]
pub struct FetchError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl FetchError {
    /// Wrap any error (or message) as a fetch failure.
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// Performs one remote query for a metric kind.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use kafkawatch_sync::{DiskSpace, FetchError, FetchRequest, MetricsFetchPort};
/// use kafkawatch_types::DiskSpaceSnapshot;
///
/// #[derive(Debug)]
/// struct Fixed;
///
/// #[async_trait]
/// impl MetricsFetchPort<DiskSpace> for Fixed {
///     async fn fetch(&self, _request: FetchRequest) -> Result<DiskSpaceSnapshot, FetchError> {
///         Ok(DiskSpaceSnapshot::from_samples([(1_000, 500.0)]))
///     }
/// }
/// ```
#[async_trait]
pub trait MetricsFetchPort<K: MetricsKind>: Send + Sync + fmt::Debug {
    /// Run the query and return the kind's snapshot.
    async fn fetch(&self, request: FetchRequest) -> Result<K::Snapshot, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_redacted_in_debug() {
        let target = FetchTarget::new("abc", "https://api.test", Credentials::bearer("s3cret"));
        let debug = format!("{:?}", target);
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("redacted"));
        assert_eq!(target.credentials.token(), "s3cret");
    }

    #[test]
    fn request_derives_interval_from_duration() {
        let target = FetchTarget::new("abc", "https://api.test", Credentials::default());
        let request = FetchRequest::new(&target, TimeDuration::OneDay, Some("orders".into()));
        assert_eq!(request.instance_id, "abc");
        assert_eq!(request.time_interval, 240);
        assert_eq!(request.selected_topic.as_deref(), Some("orders"));
        assert!(request.credentials.is_empty());
    }

    #[test]
    fn fetch_error_keeps_the_cause() {
        let err = FetchError::new("connection reset");
        assert_eq!(err.to_string(), "metrics fetch failed: connection reset");
        assert!(std::error::Error::source(&err).is_some());
    }
}

//! Adapters backed by the Kafka management REST API.
//!
//! Both adapters issue a single `GET .../metrics/query_range` per fetch,
//! authenticated with the bearer token carried by the [`FetchRequest`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use kafkawatch_adapters::{MetricsApiClient, TopicMetricsAdapter};
//! use kafkawatch_sync::{Credentials, FetchTarget, TopicService};
//! use kafkawatch_types::{TimeDuration, TopicSelection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MetricsApiClient::builder()
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let target = FetchTarget::new("kafka-1", "https://api.example.com", Credentials::bearer("t"));
//!     let service = TopicService::spawn(
//!         Arc::new(TopicMetricsAdapter::new(client)),
//!         target,
//!         TopicSelection::new(TimeDuration::OneHour),
//!     );
//!
//!     println!("{:?}", service.read().state);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use kafkawatch_sync::{DiskSpace, FetchError, FetchRequest, MetricsFetchPort, Topics};
use kafkawatch_types::{DiskSpaceSnapshot, TopicSnapshot};

use crate::range_query::{self, RangeQueryList, DISK_SPACE_FILTERS, TOPIC_FILTERS};
use crate::AdapterError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin client for the `query_range` endpoint.
#[derive(Debug, Clone)]
pub struct MetricsApiClient {
    client: Client,
    timeout: Duration,
}

impl MetricsApiClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> MetricsApiClientBuilder {
        MetricsApiClientBuilder::default()
    }

    /// Query a range of samples for the given metric names.
    pub async fn query_range(
        &self,
        request: &FetchRequest,
        filters: &[&str],
    ) -> Result<RangeQueryList, AdapterError> {
        let url = query_range_url(&request.api_base_path, &request.instance_id)?;

        let mut params: Vec<(&str, String)> = vec![
            ("duration", request.time_duration.minutes().to_string()),
            ("interval", (request.time_interval * 60).to_string()),
        ];
        params.extend(filters.iter().map(|f| ("filters", f.to_string())));

        debug!(
            instance = %request.instance_id,
            duration = %request.time_duration,
            "Querying metrics range"
        );

        let response = self
            .client
            .get(url)
            .bearer_auth(request.credentials.token())
            .query(&params)
            .send()
            .await?;

        check_status(response.status(), &request.instance_id)?;

        let body = response.bytes().await?;
        range_query::parse(&body)
    }

    /// The configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Builder for MetricsApiClient.
#[derive(Debug, Default)]
pub struct MetricsApiClientBuilder {
    timeout: Option<Duration>,
}

impl MetricsApiClientBuilder {
    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<MetricsApiClient, AdapterError> {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Transport(e.to_string()))?;

        Ok(MetricsApiClient { client, timeout })
    }
}

/// Fetches aggregated disk usage.
#[derive(Debug, Clone)]
pub struct DiskSpaceAdapter {
    client: MetricsApiClient,
}

impl DiskSpaceAdapter {
    pub fn new(client: MetricsApiClient) -> Self {
        Self { client }
    }

    /// Collect used bytes over the requested window.
    pub async fn collect(&self, request: &FetchRequest) -> Result<DiskSpaceSnapshot, AdapterError> {
        let list = self.client.query_range(request, DISK_SPACE_FILTERS).await?;
        Ok(range_query::disk_space(&list))
    }
}

#[async_trait]
impl MetricsFetchPort<DiskSpace> for DiskSpaceAdapter {
    async fn fetch(&self, request: FetchRequest) -> Result<DiskSpaceSnapshot, FetchError> {
        Ok(self.collect(&request).await?)
    }
}

/// Fetches topic traffic and log sizes.
#[derive(Debug, Clone)]
pub struct TopicMetricsAdapter {
    client: MetricsApiClient,
}

impl TopicMetricsAdapter {
    pub fn new(client: MetricsApiClient) -> Self {
        Self { client }
    }

    /// Collect topic metrics, narrowed to the selected topic if any.
    pub async fn collect(&self, request: &FetchRequest) -> Result<TopicSnapshot, AdapterError> {
        let list = self.client.query_range(request, TOPIC_FILTERS).await?;
        Ok(range_query::topics(&list, request.selected_topic.as_deref()))
    }
}

#[async_trait]
impl MetricsFetchPort<Topics> for TopicMetricsAdapter {
    async fn fetch(&self, request: FetchRequest) -> Result<TopicSnapshot, FetchError> {
        Ok(self.collect(&request).await?)
    }
}

/// `{base}/api/kafkas_mgmt/v1/kafkas/{id}/metrics/query_range`, with the
/// instance id percent-encoded as a single path segment.
fn query_range_url(base: &str, instance_id: &str) -> Result<Url, AdapterError> {
    let invalid = || AdapterError::InvalidBasePath(base.to_string());

    let mut url = Url::parse(base).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(["api", "kafkas_mgmt", "v1", "kafkas"])
        .push(instance_id)
        .extend(["metrics", "query_range"]);
    Ok(url)
}

fn check_status(status: StatusCode, instance_id: &str) -> Result<(), AdapterError> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AdapterError::Unauthorized {
            status: status.as_u16(),
        }),
        StatusCode::NOT_FOUND => Err(AdapterError::InstanceNotFound(instance_id.to_string())),
        status if !status.is_success() => Err(AdapterError::Status {
            status: status.as_u16(),
        }),
        _ => Ok(()),
    }
}

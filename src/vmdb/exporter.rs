use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::vmdb::endpoint::{resolver_for, EndpointResolver};
use crate::vmdb::sample::{SampleBatch, EXEC_TIMESTAMP_METRIC};

/// Sink for exported samples and source of the last execution time.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    async fn push_metrics(&self, batch: &SampleBatch) -> Result<()>;

    /// `None` when the backend holds no record of a previous run.
    async fn query_last_exec_timestamp(&self) -> Result<Option<DateTime<Utc>>>;
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    status: String,
    data: QueryData,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(rename = "resultType", default)]
    result_type: String,
    #[serde(default)]
    result: Vec<QuerySeries>,
}

#[derive(Debug, Deserialize)]
struct QuerySeries {
    /// `[unix_seconds, "value"]`
    value: Vec<serde_json::Value>,
}

#[derive(Debug)]
pub struct VmExporter {
    client: Client,
    resolver: Box<dyn EndpointResolver>,
    last_exec_search_range: String,
}

impl VmExporter {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_resolver(
            client,
            resolver_for(&config.endpoint),
            config.last_exec_search_range.clone(),
        ))
    }

    pub fn with_resolver(
        client: Client,
        resolver: Box<dyn EndpointResolver>,
        last_exec_search_range: String,
    ) -> Self {
        Self {
            client,
            resolver,
            last_exec_search_range,
        }
    }

    pub fn last_exec_query(&self) -> String {
        format!(
            "last_over_time({}[{}])",
            EXEC_TIMESTAMP_METRIC, self.last_exec_search_range
        )
    }

    fn last_exec_query_url(&self) -> Result<Url> {
        let mut url = self.resolver.query_url()?;
        url.query_pairs_mut()
            .append_pair("query", &self.last_exec_query());
        Ok(url)
    }
}

#[async_trait]
impl MetricsBackend for VmExporter {
    async fn push_metrics(&self, batch: &SampleBatch) -> Result<()> {
        let body = batch.to_json_lines()?;
        let url = self.resolver.import_url()?;
        tracing::debug!("Pushing {} samples to {}", batch.len(), url);

        let response = self.client.post(url).body(body).send().await?;

        if response.status() != StatusCode::NO_CONTENT {
            return Err(Error::UnexpectedStatus(response.status().as_u16()));
        }

        Ok(())
    }

    async fn query_last_exec_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        let url = self.last_exec_query_url()?;
        tracing::debug!("Querying last execution timestamp: {}", url);

        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(Error::UnexpectedStatus(response.status().as_u16()));
        }

        let bytes = response.bytes().await?;
        let parsed: QueryResponse = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Decode(format!("query response: {}", e)))?;
        tracing::debug!(
            status = %parsed.status,
            result_type = %parsed.data.result_type,
            series = parsed.data.result.len(),
            "Last execution query answered"
        );

        extract_last_exec_timestamp(&parsed.data.result)
    }
}

/// Reads the millisecond epoch carried as the string value of the first
/// series. No series means no previous execution.
fn extract_last_exec_timestamp(result: &[QuerySeries]) -> Result<Option<DateTime<Utc>>> {
    let Some(series) = result.first() else {
        return Ok(None);
    };

    let raw = series
        .value
        .get(1)
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            Error::TimestampConversion(format!("expected [ts, \"value\"], got {:?}", series.value))
        })?;

    let millis = match raw.parse::<i64>() {
        Ok(ms) => ms,
        Err(_) => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
            .ok_or_else(|| Error::TimestampConversion(format!("'{}' is not a millisecond epoch", raw)))?,
    };

    Utc.timestamp_millis_opt(millis)
        .single()
        .map(Some)
        .ok_or_else(|| Error::TimestampConversion(format!("{} is out of range", millis)))
}

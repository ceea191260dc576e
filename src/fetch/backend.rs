//! The bucketed single-fetch: one HTTP round trip to the backend,
//! turned into one aligned [`Timeseries`].
//!
//! ```text
//! FetchRequest --URL,GET--> raw points --bucket by slot--> per-slot reduce --> Timeseries
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::BackendError;
use crate::fetch::resolution::Resolution;
use crate::series::Timeseries;
use crate::tagset::TaggedMetric;
use crate::timerange::Timerange;

/// The reducer applied within one output bucket, and to one query overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMethod {
    Mean,
    Min,
    Max,
}

impl SampleMethod {
    fn field_name(self) -> &'static str {
        match self {
            SampleMethod::Mean => "average",
            SampleMethod::Min => "min",
            SampleMethod::Max => "max",
        }
    }

    fn reduce(self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        match self {
            SampleMethod::Mean => values.iter().sum::<f64>() / values.len() as f64,
            SampleMethod::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            SampleMethod::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// One bucketed-fetch request: the tagged series to pull, the name to fetch
/// it under, the grid to bucket into, and the reducer to apply.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub tagged: TaggedMetric,
    pub graphite_name: String,
    pub timerange: Timerange,
    pub sample_method: SampleMethod,
}

/// A single raw point as the backend reports it. Extra JSON fields are
/// tolerated; only the ones a given [`SampleMethod`] needs are read.
#[derive(Debug, Clone, Deserialize)]
struct RawPoint {
    timestamp: i64,
    average: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawResponse {
    values: Vec<RawPoint>,
}

/// The backend contract: fetch one bucketed timeseries. Implemented by
/// [`HttpBackend`] against the real service, and by test doubles elsewhere.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_single(&self, request: &FetchRequest, now_ms: i64) -> Result<Timeseries, BackendError>;
}

/// An HTTP [`Backend`] against a Graphite-like view service.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    tenant_id: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, tenant_id: impl Into<String>, request_timeout: Duration) -> Self {
        let client = reqwest::Client::builder().timeout(request_timeout).build().expect("reqwest client builder");
        HttpBackend { client, base_url: base_url.into(), tenant_id: tenant_id.into() }
    }

    fn url(&self, request: &FetchRequest, resolution: Resolution) -> String {
        format!(
            "{}/v2.0/{}/views/{}?from={}&to={}&resolution={}&select=numPoints,{}",
            self.base_url.trim_end_matches('/'),
            self.tenant_id,
            request.graphite_name,
            request.timerange.start_ms(),
            request.timerange.end_ms() + request.timerange.resolution_ms(),
            resolution,
            request.sample_method.field_name(),
        )
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_single(&self, request: &FetchRequest, now_ms: i64) -> Result<Timeseries, BackendError> {
        let age_ms = now_ms - request.timerange.start_ms();
        let resolution = Resolution::choose(request.timerange.resolution_ms(), age_ms);
        let url = self.url(request, resolution);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::warn!(metric = %request.tagged.metric_key, %url, "fetch timed out");
                BackendError::FetchTimeoutError { metric: request.tagged.clone() }
            } else {
                tracing::warn!(metric = %request.tagged.metric_key, %url, error = %e, "fetch failed");
                BackendError::FetchIoError { metric: request.tagged.clone(), reason: e.to_string() }
            }
        })?;

        let body: RawResponse = response.json().await.map_err(|e| {
            tracing::warn!(metric = %request.tagged.metric_key, error = %e, "invalid series response");
            BackendError::InvalidSeriesError { metric: request.tagged.clone(), reason: e.to_string() }
        })?;

        tracing::debug!(metric = %request.tagged.metric_key, resolution = %resolution, points = body.values.len(), "fetched series");
        Ok(bucket(&body.values, request))
    }
}

/// Assign raw points to slots and reduce each bucket.
fn bucket(points: &[RawPoint], request: &FetchRequest) -> Timeseries {
    let timerange = request.timerange;
    let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); timerange.slots()];

    for point in points {
        let Some(slot) = timerange.slot_index(point.timestamp) else { continue };
        let value = match request.sample_method {
            SampleMethod::Mean => point.average,
            SampleMethod::Min => point.min,
            SampleMethod::Max => point.max,
        };
        if let Some(v) = value {
            buckets[slot].push(v);
        }
    }

    let values = buckets.iter().map(|b| request.sample_method.reduce(b)).collect();
    Timeseries::new(values, request.tagged.tag_set.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagset::{MetricKey, TagSet, TaggedMetric};

    fn req(sample_method: SampleMethod) -> FetchRequest {
        FetchRequest {
            tagged: TaggedMetric::new(MetricKey::new("m").unwrap(), TagSet::new()),
            graphite_name: "servers.web.cpu".to_string(),
            timerange: Timerange::new(0, 90_000, 30_000).unwrap(),
            sample_method,
        }
    }

    #[test]
    fn bucket_assigns_by_floor_and_drops_out_of_range() {
        let points = vec![
            RawPoint { timestamp: 0, average: Some(1.0), min: None, max: None },
            RawPoint { timestamp: 29_999, average: Some(3.0), min: None, max: None },
            RawPoint { timestamp: 30_000, average: Some(5.0), min: None, max: None },
            RawPoint { timestamp: -1, average: Some(99.0), min: None, max: None },
            RawPoint { timestamp: 1_000_000, average: Some(99.0), min: None, max: None },
        ];
        let ts = bucket(&points, &req(SampleMethod::Mean));
        assert_eq!(ts.values[0], 2.0);
        assert_eq!(ts.values[1], 5.0);
        assert!(ts.values[2].is_nan());
        assert!(ts.values[3].is_nan());
    }

    #[test]
    fn empty_bucket_reduces_to_nan() {
        let ts = bucket(&[], &req(SampleMethod::Max));
        assert!(ts.values.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn url_embeds_requested_fields() {
        let backend = HttpBackend::new("http://backend", "tenant1", Duration::from_secs(5));
        let url = backend.url(&req(SampleMethod::Mean), Resolution::Full);
        assert!(url.contains("/v2.0/tenant1/views/servers.web.cpu"));
        assert!(url.contains("from=0"));
        assert!(url.contains("to=120000"));
        assert!(url.contains("resolution=FULL"));
        assert!(url.contains("select=numPoints,average"));
    }
}

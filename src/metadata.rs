//! The tag-index interface: consumed by the evaluator, implemented by an
//! external collaborator. Only the shape is in scope here.

use async_trait::async_trait;

use crate::error::EvalError;
use crate::tagset::{MetricKey, TagSet};

/// A read-only handle onto the wide-column tag index backing `fetch`
/// expressions.
#[async_trait]
pub trait MetadataApi: Send + Sync {
    async fn get_all_tags(&self, metric_key: &MetricKey) -> Result<Vec<TagSet>, EvalError>;
    async fn get_all_metrics(&self) -> Result<Vec<MetricKey>, EvalError>;
    async fn get_metrics_for_tag(&self, key: &str, value: &str) -> Result<Vec<MetricKey>, EvalError>;
}

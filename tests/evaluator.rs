//! End-to-end evaluator scenarios against stub metadata/backend collaborators.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tsquery::error::{BackendError, EvalError};
use tsquery::evaluate;
use tsquery::fetch::{Backend, FetchLimiter, FetchRequest, MultiFetchConfig, SampleMethod};
use tsquery::metadata::MetadataApi;
use tsquery::registry::FunctionRegistry;
use tsquery::series::Timeseries;
use tsquery::tagset::{MetricKey, Predicate, TagSet};
use tsquery::timerange::Timerange;
use tsquery::{EvaluationContext, Expression, Value};

struct FixedMetadata(Vec<TagSet>);

#[async_trait]
impl MetadataApi for FixedMetadata {
    async fn get_all_tags(&self, _metric_key: &MetricKey) -> Result<Vec<TagSet>, EvalError> {
        Ok(self.0.clone())
    }
    async fn get_all_metrics(&self) -> Result<Vec<MetricKey>, EvalError> {
        Ok(vec![])
    }
    async fn get_metrics_for_tag(&self, _key: &str, _value: &str) -> Result<Vec<MetricKey>, EvalError> {
        Ok(vec![])
    }
}

struct RampBackend;

#[async_trait]
impl Backend for RampBackend {
    async fn fetch_single(&self, request: &FetchRequest, _now_ms: i64) -> Result<Timeseries, BackendError> {
        let values = (0..request.timerange.slots()).map(|i| i as f64).collect();
        Ok(Timeseries::new(values, request.tagged.tag_set.clone()))
    }
}

fn tags(pairs: &[(&str, &str)]) -> TagSet {
    TagSet::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
}

fn context(metadata: Vec<TagSet>) -> EvaluationContext {
    EvaluationContext {
        metadata: Arc::new(FixedMetadata(metadata)),
        backend: Arc::new(RampBackend),
        predicate: Predicate::True,
        sample_method: SampleMethod::Mean,
        timerange: Timerange::new(0, 150_000, 30_000).unwrap(),
        limiter: Arc::new(FetchLimiter::new(1_000)),
        cancel: CancellationToken::new(),
        registry: Arc::new(FunctionRegistry::builtin()),
        multi_fetch_config: MultiFetchConfig::default(),
        now_ms: 0,
    }
}

#[tokio::test]
async fn fetch_then_derivative_end_to_end() {
    let ctx = context(vec![tags(&[("env", "prod")])]);
    let fetch = Expression::Fetch { metric_name: "cpu".to_string(), local_predicate: None };
    let expr = Expression::Call { name: "derivative".to_string(), args: vec![fetch], group_by: None };

    let value = evaluate(&expr, &ctx).await.unwrap();
    let list = match value {
        Value::SeriesList(list) => list,
        _ => panic!("expected series list"),
    };
    assert_eq!(list.series[0].values[0], 0.0);
    assert!((list.series[0].values[1] - (1.0 / 30.0)).abs() < 1e-9);
}

#[tokio::test]
async fn aggregate_requires_group_by() {
    let ctx = context(vec![tags(&[("env", "prod")])]);
    let fetch = Expression::Fetch { metric_name: "cpu".to_string(), local_predicate: None };
    let expr = Expression::Call { name: "sum".to_string(), args: vec![fetch], group_by: None };
    let err = evaluate(&expr, &ctx).await.unwrap_err();
    assert!(matches!(err, EvalError::SyntaxError(_)));
}

#[tokio::test]
async fn fetch_limit_exceeded_aborts_the_query() {
    let mut ctx = context(vec![tags(&[("host", "a")]), tags(&[("host", "b")]), tags(&[("host", "c")])]);
    ctx.limiter = Arc::new(FetchLimiter::new(1));
    let expr = Expression::Fetch { metric_name: "cpu".to_string(), local_predicate: None };
    let err = evaluate(&expr, &ctx).await.unwrap_err();
    assert!(matches!(err, EvalError::Fetch(_)));
}

#[tokio::test]
async fn arithmetic_join_over_two_fetches() {
    let ctx = context(vec![tags(&[("env", "prod")])]);
    let left = Expression::Fetch { metric_name: "cpu".to_string(), local_predicate: None };
    let right = Expression::Scalar(10.0);
    let expr = Expression::Call { name: "add".to_string(), args: vec![left, right], group_by: None };
    let value = evaluate(&expr, &ctx).await.unwrap();
    match value {
        Value::SeriesList(list) => assert_eq!(list.series[0].values[2], 12.0),
        _ => panic!("expected series list"),
    }
}

#[tokio::test]
async fn fetch_with_local_predicate_merges_with_context_predicate() {
    let mut ctx = context(vec![tags(&[("env", "prod"), ("dc", "a")]), tags(&[("env", "prod"), ("dc", "b")])]);
    ctx.predicate = Predicate::Equal("env".to_string(), "prod".to_string());
    let local = Predicate::Equal("dc".to_string(), "a".to_string());
    let expr = Expression::Fetch { metric_name: "cpu".to_string(), local_predicate: Some(local) };
    let value = evaluate(&expr, &ctx).await.unwrap();
    match value {
        Value::SeriesList(list) => assert_eq!(list.len(), 1),
        _ => panic!("expected series list"),
    }
}

#[allow(dead_code)]
fn ensure_duration_unused_for_now() -> Duration {
    Duration::from_secs(1)
}

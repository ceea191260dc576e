//! The query evaluator: a small interpreter over [`Expression`] trees,
//! producing a [`Value`] per node. Fetch leaves are the only async work;
//! `evaluate` recurses through `Box::pin` since async fns can't recurse
//! directly.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::EvalError;
use crate::fetch::{Backend, FetchLimiter, FetchRequest, MultiFetchConfig, SampleMethod};
use crate::metadata::MetadataApi;
use crate::registry::FunctionRegistry;
use crate::tagset::Predicate;
use crate::timerange::Timerange;
use crate::value::Value;

/// A future boxed for recursive async evaluation; `Send` so it can be
/// awaited across `tokio::spawn`-free worker boundaries.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One node in a query AST. Parsing into this shape happens upstream; this
/// crate only evaluates it.
#[derive(Debug, Clone)]
pub enum Expression {
    Scalar(f64),
    Duration(i64),
    String(String),
    Fetch { metric_name: String, local_predicate: Option<Predicate> },
    Call { name: String, args: Vec<Expression>, group_by: Option<Vec<String>> },
}

/// Everything one query's evaluation needs, threaded unchanged through the
/// recursive descent.
pub struct EvaluationContext {
    pub metadata: Arc<dyn MetadataApi>,
    pub backend: Arc<dyn Backend>,
    pub predicate: Predicate,
    pub sample_method: SampleMethod,
    pub timerange: Timerange,
    pub limiter: Arc<FetchLimiter>,
    pub cancel: CancellationToken,
    pub registry: Arc<FunctionRegistry>,
    pub multi_fetch_config: MultiFetchConfig,
    pub now_ms: i64,
}

/// Evaluate `expr` under `ctx`. Errors propagate fail-fast: the first child
/// expression that fails aborts the parent with its error.
pub fn evaluate<'a>(expr: &'a Expression, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(async move {
        match expr {
            Expression::Scalar(v) => Ok(Value::Scalar(*v)),
            Expression::Duration(v) => Ok(Value::Duration(*v)),
            Expression::String(v) => Ok(Value::String(v.clone())),
            Expression::Fetch { metric_name, local_predicate } => {
                evaluate_fetch(metric_name, local_predicate.clone(), ctx).await
            }
            Expression::Call { name, args, group_by } => {
                let function = ctx.registry.lookup(name).ok_or_else(|| {
                    tracing::warn!(function = %name, "unknown function in query");
                    EvalError::SyntaxError(format!("unknown function '{name}'"))
                })?;
                function(args, group_by.as_deref(), ctx).await
            }
        }
    })
}

/// `fetch(metric_name, local_predicate)`: merge predicates, enumerate
/// tagged series via the metadata API, admit them through the fetch limit,
/// then run the bounded multi-fetch.
async fn evaluate_fetch(
    metric_name: &str,
    local_predicate: Option<Predicate>,
    ctx: &EvaluationContext,
) -> Result<Value, EvalError> {
    let merged = Predicate::merge(Some(ctx.predicate.clone()), local_predicate);

    let metric_key = crate::tagset::MetricKey::new(metric_name.to_string())
        .ok_or_else(|| EvalError::SyntaxError("fetch metric_name must be non-empty".to_string()))?;

    let tag_sets = ctx.metadata.get_all_tags(&metric_key).await?;

    tracing::debug!(metric = %metric_name, candidates = tag_sets.len(), "resolved tag sets for fetch");

    let requests: Vec<FetchRequest> = tag_sets
        .into_iter()
        .filter(|tags| merged.apply(tags))
        .map(|tags| FetchRequest {
            tagged: crate::tagset::TaggedMetric::new(metric_key.clone(), tags),
            graphite_name: metric_name.to_string(),
            timerange: ctx.timerange,
            sample_method: ctx.sample_method,
        })
        .collect();

    let series_list = crate::fetch::multi_fetch(
        Arc::clone(&ctx.backend),
        requests,
        &ctx.limiter,
        ctx.multi_fetch_config,
        ctx.cancel.clone(),
        ctx.now_ms,
        metric_name,
        ctx.timerange,
    )
    .await?;

    Ok(Value::SeriesList(series_list))
}

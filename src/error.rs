//! Error types for every failing subsystem.
//!
//! Each enum below corresponds to one failure domain: rule compilation/
//! inversion, the backend HTTP transport, fetch admission/cancellation, and
//! the evaluator. Errors are kept as small,
//! per-concern `thiserror` enums rather than one crate-wide catch-all, and
//! carry the originating `TaggedMetric` wherever the failure is about one.

use thiserror::Error;

use crate::tagset::TaggedMetric;

/// Errors raised constructing or using a [`crate::timerange::Timerange`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimerangeError {
    #[error("resolution_ms must be > 0, got {0}")]
    NonPositiveResolution(i64),
    #[error("start_ms ({start}) must be <= end_ms ({end})")]
    StartAfterEnd { start: i64, end: i64 },
    #[error("(end_ms - start_ms) must be a multiple of resolution_ms: end={end}, start={start}, resolution={resolution}")]
    Unaligned { start: i64, end: i64, resolution: i64 },
}

/// Errors raised compiling, matching, or inverting naming rules.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuleError {
    #[error("rule pattern is invalid: {reason}")]
    InvalidPattern { reason: String },
    #[error("rule metric_key is invalid: {reason}")]
    InvalidMetricKey { reason: String },
    #[error("custom regex for tag '{tag}' is invalid: {reason}")]
    InvalidCustomRegex { tag: String, reason: String },
    #[error("invalid rule file YAML: {0}")]
    InvalidYaml(String),
    #[error("tag '{tag}' required to render '{metric_key}' is missing")]
    MissingTag { metric_key: String, tag: String },
    #[error("metric_key pattern cannot interpolate '{metric_key}'")]
    CannotInterpolate { metric_key: String },
}

/// Errors raised by the backend HTTP transport for a single bucketed fetch.
#[derive(Debug, Error, Clone)]
pub enum BackendError {
    #[error("fetch for {metric:?} failed: {reason}")]
    FetchIoError { metric: TaggedMetric, reason: String },
    #[error("fetch for {metric:?} timed out")]
    FetchTimeoutError { metric: TaggedMetric },
    #[error("fetch for {metric:?} returned an invalid series payload: {reason}")]
    InvalidSeriesError { metric: TaggedMetric, reason: String },
}

/// Errors raised by the bounded multi-fetch fan-out.
#[derive(Debug, Error, Clone)]
pub enum FetchError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("fetch limit exceeded: admitting {requested} more would exceed the limit of {limit}")]
    FetchLimitExceeded { requested: u64, limit: u64 },
    #[error("fetch was cancelled")]
    Cancelled,
}

/// Errors raised evaluating a query AST.
#[derive(Debug, Error, Clone)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    SyntaxError(String),
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: &'static str, got: &'static str },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Rule(#[from] RuleError),
}

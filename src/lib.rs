//! A time-series query engine: a bidirectional metric naming rule set, a
//! tagged-series evaluator, and a bounded-concurrency fetch layer fronting a
//! Graphite-like backend.
//!
//! ```text
//! AST -> evaluator (evaluator, registry) -> fetch(metric, predicate) leaf
//!   -> resolve via rules -> enumerate tagged series -> admit (fetch::limiter)
//!   -> bounded multi-fetch (fetch::multi) -> SeriesList
//!   -> group/aggregate, transforms, arithmetic -> result Value
//! ```

pub mod arithmetic;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod fetch;
pub mod group;
pub mod metadata;
pub mod registry;
pub mod rules;
pub mod series;
pub mod tagset;
pub mod timerange;
pub mod transforms;
pub mod value;

pub use error::{BackendError, EvalError, FetchError, RuleError, TimerangeError};
pub use evaluator::{evaluate, EvaluationContext, Expression};
pub use group::{aggregate, group_by, Reducer};
pub use rules::{CompiledRule, RawRule, RuleFile, RuleSet};
pub use series::{SeriesList, Timeseries};
pub use tagset::{MatchRegex, MetricKey, Predicate, TagSet, TaggedMetric};
pub use timerange::Timerange;
pub use value::Value;

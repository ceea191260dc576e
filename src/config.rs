//! Engine-level configuration structs. Plain data only, loading these from
//! a file or environment is an external shell concern, out of scope here.

use std::time::Duration;

use crate::fetch::{MultiFetchConfig, SampleMethod};

/// Configuration for one [`crate::fetch::HttpBackend`] instance.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub tenant_id: String,
    pub request_timeout: Duration,
}

/// Per-query knobs an engine operator supplies alongside the parsed AST.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub sample_method: SampleMethod,
    pub fetch_limit: u64,
    pub multi_fetch: MultiFetchConfig,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig { sample_method: SampleMethod::Mean, fetch_limit: 10_000, multi_fetch: MultiFetchConfig::default() }
    }
}

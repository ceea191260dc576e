//! Bounded multi-fetch: a semaphore-bounded worker pool over
//! [`Backend::fetch_single`], a shared admission counter, and a one-shot
//! cancellation broadcast.
//!
//! ```text
//! requests[] --admit(limiter)--> JoinSet(Semaphore(parallelism)) --first error--> cancel --> SeriesList | FetchError
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{BackendError, FetchError};
use crate::fetch::backend::{Backend, FetchRequest};
use crate::fetch::limiter::FetchLimiter;
use crate::series::SeriesList;
use crate::timerange::Timerange;

/// Fixed knobs for one multi-fetch call.
#[derive(Debug, Clone, Copy)]
pub struct MultiFetchConfig {
    pub parallelism: usize,
    pub per_request_timeout: Duration,
}

impl Default for MultiFetchConfig {
    fn default() -> Self {
        MultiFetchConfig { parallelism: 20, per_request_timeout: Duration::from_secs(10) }
    }
}

/// Fetch every request in `requests`, honoring `limiter`'s admission gate and
/// `cancel`'s cancellation broadcast. On the first worker error, `cancel` is
/// triggered and outstanding workers abandon their in-flight requests; the
/// batch surfaces that triggering error (first in input order among the
/// errors actually observed), not any resulting cancellation.
pub async fn multi_fetch(
    backend: Arc<dyn Backend>,
    requests: Vec<FetchRequest>,
    limiter: &FetchLimiter,
    config: MultiFetchConfig,
    cancel: CancellationToken,
    now_ms: i64,
    name: impl Into<String>,
    timerange: Timerange,
) -> Result<SeriesList, FetchError> {
    let name = name.into();

    if requests.is_empty() {
        return Ok(SeriesList::empty(timerange, name));
    }

    limiter.consume(requests.len() as u64)?;

    let semaphore = Arc::new(Semaphore::new(config.parallelism));
    let mut tasks = JoinSet::new();

    for (index, request) in requests.into_iter().enumerate() {
        let backend = Arc::clone(&backend);
        let semaphore = Arc::clone(&semaphore);
        let cancel = cancel.clone();
        let timeout = config.per_request_timeout;

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");

            if cancel.is_cancelled() {
                return (index, Err(FetchError::Cancelled));
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(FetchError::Cancelled),
                result = tokio::time::timeout(timeout, backend.fetch_single(&request, now_ms)) => match result {
                    Ok(Ok(series)) => Ok(series),
                    Ok(Err(e)) => Err(FetchError::Backend(e)),
                    Err(_) => Err(FetchError::Backend(BackendError::FetchTimeoutError { metric: request.tagged.clone() })),
                },
            };
            (index, outcome)
        });
    }

    let mut ok_series = Vec::new();
    let mut first_error: Option<(usize, FetchError)> = None;

    while let Some(joined) = tasks.join_next().await {
        let (index, outcome) = joined.expect("worker task panicked");
        match outcome {
            Ok(series) => ok_series.push((index, series)),
            Err(FetchError::Cancelled) => {}
            Err(e) => {
                tracing::warn!(error = %e, "fetch worker failed, cancelling batch");
                cancel.cancel();
                let replace = match &first_error {
                    None => true,
                    Some((seen_index, _)) => index < *seen_index,
                };
                if replace {
                    first_error = Some((index, e));
                }
            }
        }
    }

    if let Some((_, error)) = first_error {
        return Err(error);
    }

    ok_series.sort_by_key(|(index, _)| *index);
    let series = ok_series.into_iter().map(|(_, s)| s).collect();
    Ok(SeriesList::new(series, timerange, name))
}

//! The concurrent fetch layer: one HTTP round trip bucketed into a
//! [`crate::series::Timeseries`] ([`backend`]), fanned out with bounded
//! concurrency and a shared admission counter ([`multi`], [`limiter`]).

mod backend;
mod limiter;
mod multi;
mod resolution;

pub use backend::{Backend, FetchRequest, HttpBackend, SampleMethod};
pub use limiter::FetchLimiter;
pub use multi::{multi_fetch, MultiFetchConfig};
pub use resolution::Resolution;

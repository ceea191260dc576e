//! The series model: an aligned float vector plus a tag set, and a list of
//! them sharing one timerange.

use crate::tagset::TagSet;
use crate::timerange::Timerange;

/// One aligned float vector plus the tag set identifying it. Missing samples
/// are `f64::NAN`.
#[derive(Debug, Clone)]
pub struct Timeseries {
    pub values: Vec<f64>,
    pub tag_set: TagSet,
}

impl Timeseries {
    pub fn new(values: Vec<f64>, tag_set: TagSet) -> Self {
        Timeseries { values, tag_set }
    }

    pub fn all_nan(slots: usize, tag_set: TagSet) -> Self {
        Timeseries { values: vec![f64::NAN; slots], tag_set }
    }
}

/// A vector of [`Timeseries`] sharing one [`Timerange`], plus the metric name
/// they were fetched under. `series[i].values.len() == timerange.slots()`
/// for every `i` (an invariant every constructor here upholds).
#[derive(Debug, Clone)]
pub struct SeriesList {
    pub series: Vec<Timeseries>,
    pub timerange: Timerange,
    pub name: String,
}

impl SeriesList {
    /// Construct a `SeriesList`, asserting the slot-count invariant in debug
    /// builds. A mismatch here is a programming error in a producer, not a
    /// recoverable runtime condition.
    pub fn new(series: Vec<Timeseries>, timerange: Timerange, name: impl Into<String>) -> Self {
        debug_assert!(series.iter().all(|s| s.values.len() == timerange.slots()));
        SeriesList { series, timerange, name: name.into() }
    }

    pub fn empty(timerange: Timerange, name: impl Into<String>) -> Self {
        SeriesList { series: Vec::new(), timerange, name: name.into() }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

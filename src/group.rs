//! Group-by and aggregation: partition a series list by a tag-key subset,
//! then reduce each partition slot-wise.

use crate::series::{SeriesList, Timeseries};
use crate::tagset::TagSet;

/// The reducer applied to one bucket of values within an aggregation. Each
/// reducer first drops NaN from its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Sum,
    Mean,
    Min,
    Max,
}

impl Reducer {
    pub fn reduce(self, values: &[f64]) -> f64 {
        let filtered: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        match self {
            Reducer::Sum => filtered.iter().sum(),
            Reducer::Mean => {
                if filtered.is_empty() {
                    f64::NAN
                } else {
                    filtered.iter().sum::<f64>() / filtered.len() as f64
                }
            }
            Reducer::Min => filtered.into_iter().fold(f64::NAN, |acc, v| if acc.is_nan() { v } else { acc.min(v) }),
            Reducer::Max => filtered.into_iter().fold(f64::NAN, |acc, v| if acc.is_nan() { v } else { acc.max(v) }),
        }
    }
}

/// One partition of a `group_by`: a representative tag set (the projection
/// of any member onto the grouping keys) and the indices of its members in
/// first-encounter order.
#[derive(Debug, Clone)]
pub struct Group {
    pub representative: TagSet,
    pub members: Vec<usize>,
}

/// Partition `series` by agreement on `tags` (absent key compares as empty
/// string, per `TagSet::get`). Every input series appears in exactly one
/// group; groups are returned in first-encounter order.
pub fn group_by(series: &[Timeseries], tags: &[String]) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();

    for (index, s) in series.iter().enumerate() {
        let key = s.tag_set.project(tags);
        match groups.iter_mut().find(|g| g.representative == key) {
            Some(group) => group.members.push(index),
            None => groups.push(Group { representative: key, members: vec![index] }),
        }
    }

    groups
}

/// Group `list.series` by `tags`, then reduce each group slot-wise with
/// `reducer`. Every member of a group must share `list.timerange`'s slot
/// count (upheld by `SeriesList`'s own invariant).
pub fn aggregate(list: &SeriesList, reducer: Reducer, tags: &[String]) -> SeriesList {
    let groups = group_by(&list.series, tags);
    let slots = list.timerange.slots();

    let aggregated = groups
        .into_iter()
        .map(|group| {
            let values = (0..slots)
                .map(|slot| {
                    let slot_values: Vec<f64> = group.members.iter().map(|&i| list.series[i].values[slot]).collect();
                    reducer.reduce(&slot_values)
                })
                .collect();
            Timeseries::new(values, group.representative)
        })
        .collect();

    SeriesList::new(aggregated, list.timerange, list.name.clone())
}

//! Arithmetic join: elementwise binary operator over two series lists,
//! pairing series by tag-set join-compatibility.

use crate::series::{SeriesList, Timeseries};

/// Emit one output series per join-compatible pair `(l, r)`, where `l.tag_set`
/// and `r.tag_set` agree on every key present in both. Incompatible pairs
/// contribute nothing. Both inputs must share a timerange; output order is
/// unspecified (callers compare as a set keyed by tag_set).
pub fn binop(f: impl Fn(f64, f64) -> f64, left: &SeriesList, right: &SeriesList) -> SeriesList {
    debug_assert_eq!(left.timerange, right.timerange, "arithmetic join requires a shared timerange");

    let mut series = Vec::new();
    for l in &left.series {
        for r in &right.series {
            if !l.tag_set.join_compatible(&r.tag_set) {
                continue;
            }
            let values = l.values.iter().zip(r.values.iter()).map(|(&lv, &rv)| f(lv, rv)).collect();
            series.push(Timeseries::new(values, l.tag_set.union(&r.tag_set)));
        }
    }

    SeriesList::new(series, left.timerange, format!("{}+{}", left.name, right.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagset::TagSet;
    use crate::timerange::Timerange;

    fn tags(pairs: &[(&str, &str)]) -> TagSet {
        TagSet::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    fn find<'a>(list: &'a SeriesList, tag_set: &TagSet) -> &'a Timeseries {
        list.series.iter().find(|s| &s.tag_set == tag_set).expect("expected series not found")
    }

    #[test]
    fn join_pairs_series_by_shared_tag_agreement() {
        let tr = Timerange::new(0, 60_000, 30_000).unwrap();
        let left = SeriesList::new(
            vec![
                Timeseries::new(vec![1.0, 2.0, 3.0], tags(&[("env", "prod"), ("host", "#1")])),
                Timeseries::new(vec![7.0, 7.0, 7.0], tags(&[("env", "stg"), ("host", "#2")])),
                Timeseries::new(vec![1.0, 0.0, 2.0], tags(&[("env", "stg"), ("host", "#3")])),
            ],
            tr,
            "left",
        );
        let right = SeriesList::new(
            vec![
                Timeseries::new(vec![5.0, 5.0, 5.0], tags(&[("env", "stg")])),
                Timeseries::new(vec![10.0, 100.0, 1000.0], tags(&[("env", "prod")])),
            ],
            tr,
            "right",
        );

        let result = binop(|a, b| a + b, &left, &right);
        assert_eq!(result.len(), 3);

        assert_eq!(find(&result, &tags(&[("env", "prod"), ("host", "#1")])).values, vec![11.0, 102.0, 1003.0]);
        assert_eq!(find(&result, &tags(&[("env", "stg"), ("host", "#2")])).values, vec![12.0, 12.0, 12.0]);
        assert_eq!(find(&result, &tags(&[("env", "stg"), ("host", "#3")])).values, vec![6.0, 5.0, 7.0]);
    }

    #[test]
    fn incompatible_pairs_contribute_nothing() {
        let tr = Timerange::new(0, 30_000, 30_000).unwrap();
        let left = SeriesList::new(vec![Timeseries::new(vec![1.0, 1.0], tags(&[("env", "prod")]))], tr, "left");
        let right = SeriesList::new(vec![Timeseries::new(vec![1.0, 1.0], tags(&[("env", "stg")]))], tr, "right");
        let result = binop(|a, b| a + b, &left, &right);
        assert!(result.is_empty());
    }
}

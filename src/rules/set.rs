//! The ordered rule set: forward `match` and inverse `to_name`.
//!
//! ```text
//! GraphiteName ──match──▶ TaggedMetric ──to_name──▶ GraphiteName (round-trips)
//! ```
//!
//! A tag that appears in a rule's `metric_key` template is "consumed" into
//! the rendered metric key rather than surfacing in the returned tag set.
//! See [`RuleSet::try_match`] for why this is the only reading that makes
//! the round trip hold.

use std::collections::HashMap;

use crate::error::RuleError;
use crate::rules::compiled::{render_parts, CompiledRule};
use crate::rules::raw::RawRule;
use crate::tagset::{MetricKey, TagSet, TaggedMetric};

/// An ordered, immutable list of [`CompiledRule`]s. Order is significant:
/// forward matching and metric-key lookup both pick the first rule that
/// matches.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile every rule in `raw`, in order. The first compilation failure
    /// aborts the whole load.
    pub fn compile(raw: &[RawRule]) -> Result<Self, RuleError> {
        let rules = raw.iter().map(CompiledRule::compile).collect::<Result<Vec<_>, _>>()?;
        Ok(RuleSet { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Test each rule in order; the first whose anchored regex matches
    /// `name` wins.
    ///
    /// A pattern tag that is also referenced by that rule's `metric_key`
    /// template is substituted into the rendered metric key and does *not*
    /// appear in the returned tag set. Only tags exclusive to `pattern`
    /// survive as tags. This is what makes example rules like
    /// `pattern: "prefix.%foo%.%bar%", metric_key: "test-metric.%bar%"`
    /// round-trip: `bar` is encoded in the metric key, not carried
    /// alongside it as a tag.
    pub fn try_match(&self, name: &str) -> Option<TaggedMetric> {
        for rule in &self.rules {
            let Some(captures) = rule.pattern_regex.captures(name) else { continue };

            let mut captured: HashMap<String, String> = HashMap::new();
            for tag in &rule.pattern_tags {
                let value = captures.name(tag)?.as_str().to_string();
                captured.insert(tag.clone(), value);
            }

            let metric_key_str = render_parts(&rule.metric_key_parts, &captured).ok()?;
            let metric_key = MetricKey::new(metric_key_str)?;

            let mut tag_set = TagSet::new();
            for tag in &rule.pattern_tags {
                if !rule.metric_key_tags.contains(tag) {
                    tag_set.insert(tag.clone(), captured[tag].clone());
                }
            }

            return Some(TaggedMetric::new(metric_key, tag_set));
        }
        None
    }

    /// Render a [`TaggedMetric`] back to its dotted name.
    ///
    /// 1. Find the first rule whose `metric_key` template matches
    ///    `tagged.metric_key`, recovering the tag values it had consumed
    ///    during forward matching (e.g. `bar` above) from that match. If no
    ///    rule's `metric_key` pattern matches, that's `CannotInterpolate`.
    /// 2. Substitute `%tag%` in the rule's `pattern` using those recovered
    ///    values plus `tagged.tag_set`, erroring with `MissingTag` if any
    ///    placeholder has no value in either source.
    pub fn to_name(&self, tagged: &TaggedMetric) -> Result<String, RuleError> {
        let metric_key_str = tagged.metric_key.as_str();

        let (rule, captures) = self
            .rules
            .iter()
            .find_map(|r| r.metric_key_regex.captures(metric_key_str).map(|c| (r, c)))
            .ok_or_else(|| RuleError::CannotInterpolate { metric_key: metric_key_str.to_string() })?;

        let mut values: HashMap<String, String> =
            tagged.tag_set.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        for tag in &rule.metric_key_tags {
            if let Some(m) = captures.name(tag) {
                values.insert(tag.clone(), m.as_str().to_string());
            }
        }

        render_parts(&rule.pattern_parts, &values)
            .map_err(|tag| RuleError::MissingTag { metric_key: metric_key_str.to_string(), tag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;

    fn raw(pattern: &str, metric_key: &str) -> RawRule {
        RawRule { pattern: pattern.to_string(), metric_key: metric_key.to_string(), regex_overrides: StdHashMap::new() }
    }

    #[test]
    fn simple_rule_matches_and_extracts_tags() {
        let set = RuleSet::compile(&[raw("prefix.%foo%", "test-metric")]).unwrap();
        let tagged = set.try_match("prefix.abc").unwrap();
        assert_eq!(tagged.metric_key.as_str(), "test-metric");
        assert_eq!(tagged.tag_set.get("foo"), "abc");
    }

    #[test]
    fn simple_rule_does_not_match_extra_segment() {
        let set = RuleSet::compile(&[raw("prefix.%foo%", "test-metric")]).unwrap();
        assert!(set.try_match("prefix.abc.def").is_none());
    }

    #[test]
    fn rule_with_interpolated_metric_key_round_trips() {
        let set = RuleSet::compile(&[raw("prefix.%foo%.%bar%", "test-metric.%bar%")]).unwrap();
        let tagged = set.try_match("prefix.fooValue.barValue").unwrap();
        assert_eq!(tagged.metric_key.as_str(), "test-metric.barValue");
        assert_eq!(tagged.tag_set.get("foo"), "fooValue");
        assert!(!tagged.tag_set.contains_key("bar"));

        let name = set.to_name(&tagged).unwrap();
        assert_eq!(name, "prefix.fooValue.barValue");
    }

    #[test]
    fn round_trip_law_holds_for_every_matched_name() {
        let set = RuleSet::compile(&[raw("servers.%host%.cpu.%stat%", "server.cpu")]).unwrap();
        let name = "servers.web-01.cpu.user";
        let tagged = set.try_match(name).unwrap();
        assert_eq!(set.to_name(&tagged).unwrap(), name);
    }

    #[test]
    fn first_matching_rule_wins() {
        let set = RuleSet::compile(&[raw("prefix.%foo%", "specific"), raw("%anything%", "catch-all")]).unwrap();
        let tagged = set.try_match("prefix.abc").unwrap();
        assert_eq!(tagged.metric_key.as_str(), "specific");
    }

    #[test]
    fn to_name_missing_tag_errors() {
        let set = RuleSet::compile(&[raw("prefix.%foo%.%bar%", "test-metric")]).unwrap();
        let tagged = TaggedMetric::new(MetricKey::new("test-metric").unwrap(), TagSet::from_pairs([("foo".to_string(), "x".to_string())]));
        let err = set.to_name(&tagged).unwrap_err();
        assert!(matches!(err, RuleError::MissingTag { .. }));
    }

    #[test]
    fn to_name_no_matching_metric_key_pattern_errors() {
        let set = RuleSet::compile(&[raw("prefix.%foo%", "test-metric")]).unwrap();
        let tagged = TaggedMetric::new(MetricKey::new("other-metric").unwrap(), TagSet::new());
        let err = set.to_name(&tagged).unwrap_err();
        assert!(matches!(err, RuleError::CannotInterpolate { .. }));
    }
}

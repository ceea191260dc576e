//! Tag sets and the boolean predicate AST that filters them.
//!
//! ```text
//! TagSet            canonical_string()
//! {env: prod,   ───────────────────────▶  "dc=a,env=prod"
//!  dc: a}
//! ```
//!
//! `TagSet` is backed by a `BTreeMap` so ascending-key order and content
//! equality fall out of the container instead of needing a manual sort on
//! every serialization.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

/// A non-empty identifier naming one metric stream, independent of its tags.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricKey(String);

impl MetricKey {
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.is_empty() { None } else { Some(MetricKey(key)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered key -> value map of tag names to tag values. Both keys and
/// values are non-empty strings; equality and serialization are by content,
/// not insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    pub fn new() -> Self {
        TagSet(BTreeMap::new())
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        TagSet(pairs.into_iter().collect())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// An absent key compares as empty string.
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `k1=v1,k2=v2` with keys sorted ascending.
    pub fn canonical_string(&self) -> String {
        self.0.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(",")
    }

    /// Project this tag set onto a subset of keys, producing a new tag set
    /// holding only the keys present in `keys` (used by `group_by`'s
    /// representative tag set).
    pub fn project(&self, keys: &[String]) -> TagSet {
        let mut out = TagSet::new();
        for key in keys {
            if let Some(value) = self.0.get(key) {
                out.insert(key.clone(), value.clone());
            }
        }
        out
    }

    /// Union two tag sets. On key collision, `other`'s value wins, callers
    /// (arithmetic join) only union tag sets that already agree on shared
    /// keys, so collisions never occur in practice.
    pub fn union(&self, other: &TagSet) -> TagSet {
        let mut out = self.clone();
        for (k, v) in other.0.iter() {
            out.0.insert(k.clone(), v.clone());
        }
        out
    }

    /// True iff `self` and `other` agree on every key present in both,
    /// the join-compatibility test used by arithmetic.
    pub fn join_compatible(&self, other: &TagSet) -> bool {
        self.0.iter().all(|(k, v)| match other.0.get(k) {
            Some(other_v) => other_v == v,
            None => true,
        })
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

/// A (metric_key, tag_set) pair: the structured form a [`crate::rules::RuleSet`]
/// resolves a dotted name into, and into which it can be inverted back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaggedMetric {
    pub metric_key: MetricKey,
    pub tag_set: TagSet,
}

impl TaggedMetric {
    pub fn new(metric_key: MetricKey, tag_set: TagSet) -> Self {
        TaggedMetric { metric_key, tag_set }
    }
}

/// A boolean filter AST over a [`TagSet`]. Application is pure and total:
/// every variant has a defined result for every tag set, including the
/// empty one.
#[derive(Debug, Clone)]
pub enum Predicate {
    True,
    False,
    Equal(String, String),
    NotEqual(String, String),
    MatchRegex(String, MatchRegex),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

/// A regex wrapper with value semantics (`regex::Regex` has none) so
/// `Predicate` can derive the comparisons it needs.
#[derive(Debug, Clone)]
pub struct MatchRegex {
    pattern: String,
    compiled: Regex,
}

impl MatchRegex {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(MatchRegex { pattern: pattern.to_string(), compiled: Regex::new(pattern)? })
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.compiled.is_match(haystack)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl PartialEq for MatchRegex {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Predicate {
    /// Apply the predicate to `tags`. Total: `apply(&TagSet::new())` is
    /// well-defined for every predicate.
    pub fn apply(&self, tags: &TagSet) -> bool {
        match self {
            Predicate::True => true,
            Predicate::False => false,
            Predicate::Equal(key, value) => tags.get(key) == value,
            Predicate::NotEqual(key, value) => tags.get(key) != value,
            Predicate::MatchRegex(key, regex) => regex.is_match(tags.get(key)),
            Predicate::And(list) => list.iter().all(|p| p.apply(tags)),
            Predicate::Or(list) => list.iter().any(|p| p.apply(tags)),
            Predicate::Not(inner) => !inner.apply(tags),
        }
    }

    /// Merge two optional local/context predicates for a `fetch`:
    /// `context.predicate ∧ local_predicate`, tolerating either side being
    /// absent.
    pub fn merge(a: Option<Predicate>, b: Option<Predicate>) -> Predicate {
        match (a, b) {
            (Some(a), Some(b)) => Predicate::And(vec![a, b]),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => Predicate::True,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> TagSet {
        TagSet::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn canonical_string_sorts_keys() {
        let t = tags(&[("env", "prod"), ("dc", "a")]);
        assert_eq!(t.canonical_string(), "dc=a,env=prod");
    }

    #[test]
    fn absent_key_compares_as_empty() {
        let t = TagSet::new();
        assert!(Predicate::Equal("env".into(), "".into()).apply(&t));
        assert!(!Predicate::Equal("env".into(), "prod".into()).apply(&t));
    }

    #[test]
    fn predicate_apply_is_well_defined_on_empty_tagset() {
        let t = TagSet::new();
        let p = Predicate::And(vec![Predicate::True, Predicate::Not(Box::new(Predicate::False))]);
        assert!(p.apply(&t));
    }

    #[test]
    fn join_compatible_requires_agreement_on_shared_keys() {
        let a = tags(&[("env", "prod"), ("host", "h1")]);
        let b = tags(&[("env", "prod")]);
        let c = tags(&[("env", "stg")]);
        assert!(a.join_compatible(&b));
        assert!(!a.join_compatible(&c));
    }

    #[test]
    fn merge_predicate_and_semantics() {
        let t = tags(&[("env", "prod"), ("dc", "a")]);
        let merged = Predicate::merge(
            Some(Predicate::Equal("env".into(), "prod".into())),
            Some(Predicate::Equal("dc".into(), "a".into())),
        );
        assert!(merged.apply(&t));
        let merged_none = Predicate::merge(None, None);
        assert!(merged_none.apply(&t));
    }
}

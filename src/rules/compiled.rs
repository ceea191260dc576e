//! Pattern compilation: the pure, cacheable `pattern -> anchored regex`
//! transform described in the design notes ("rule engine as regex
//! synthesis").
//!
//! A pattern is a sequence of literal segments and `%tag%` placeholders:
//!
//! ```text
//! "prefix.%foo%.%bar%"
//!   -> [Literal("prefix."), Tag("foo"), Literal("."), Tag("bar")]
//!   -> ^prefix\.(?P<foo>[^.]+)\.(?P<bar>[^.]+)$
//! ```
//!
//! Each `%tag%` captures a maximal non-empty run of characters excluding the
//! backend's segment separator (`.`), unless a custom regex override is
//! supplied for that tag.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::error::RuleError;
use crate::rules::raw::RawRule;

/// One piece of a pattern: either literal text or a named tag placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PatternPart {
    Literal(String),
    Tag(String),
}

/// Split `pattern` into literal/tag parts, in the order they appear.
///
/// Errors on: an empty pattern, `%%` (empty tag name), an unclosed `%`, a
/// tag name repeated within this one pattern, and two tags with no literal
/// separator between them (`%a%%b%`).
pub(crate) fn parse_pattern(pattern: &str) -> Result<Vec<PatternPart>, RuleError> {
    if pattern.is_empty() {
        return Err(RuleError::InvalidPattern { reason: "pattern is empty".to_string() });
    }

    let mut parts = Vec::new();
    let mut seen_tags = HashSet::new();
    let mut chars = pattern.chars();
    let mut literal = String::new();
    let mut prev_was_tag = false;

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            prev_was_tag = false;
            continue;
        }

        if !literal.is_empty() {
            parts.push(PatternPart::Literal(std::mem::take(&mut literal)));
        } else if prev_was_tag {
            return Err(RuleError::InvalidPattern {
                reason: "adjacent tags with no separator between them".to_string(),
            });
        }

        let mut tag = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '%' {
                closed = true;
                break;
            }
            tag.push(c);
        }
        if !closed {
            return Err(RuleError::InvalidPattern { reason: "unclosed '%'".to_string() });
        }
        if tag.is_empty() {
            return Err(RuleError::InvalidPattern { reason: "empty tag name ('%%')".to_string() });
        }
        if !seen_tags.insert(tag.clone()) {
            return Err(RuleError::InvalidPattern { reason: format!("tag '{tag}' repeated in pattern") });
        }
        parts.push(PatternPart::Tag(tag));
        prev_was_tag = true;
    }

    if !literal.is_empty() {
        parts.push(PatternPart::Literal(literal));
    }

    Ok(parts)
}

/// Ordered list of tag names embedded in `parts`.
pub(crate) fn tags_in(parts: &[PatternPart]) -> Vec<String> {
    parts
        .iter()
        .filter_map(|p| match p {
            PatternPart::Tag(name) => Some(name.clone()),
            PatternPart::Literal(_) => None,
        })
        .collect()
}

/// Validate a custom per-tag regex: it must compile and must not itself
/// contain capturing groups (otherwise embedding it as `(?P<tag>...)` would
/// shift every subsequent named-capture index).
fn validate_custom_regex(tag: &str, pattern: &str) -> Result<(), RuleError> {
    let compiled = Regex::new(pattern)
        .map_err(|e| RuleError::InvalidCustomRegex { tag: tag.to_string(), reason: e.to_string() })?;
    // captures_len() counts the implicit whole-match group; >1 means the
    // custom regex has its own capturing groups.
    if compiled.captures_len() > 1 {
        return Err(RuleError::InvalidCustomRegex {
            tag: tag.to_string(),
            reason: "custom regex must not contain capturing groups".to_string(),
        });
    }
    Ok(())
}

/// Build the anchored, full-string-match regex for `parts`, using
/// `overrides[tag]` in place of the default `[^.]+` body where present.
pub(crate) fn build_regex(parts: &[PatternPart], overrides: &HashMap<String, String>) -> Result<Regex, RuleError> {
    let mut body = String::from("^");
    for part in parts {
        match part {
            PatternPart::Literal(lit) => body.push_str(&regex::escape(lit)),
            PatternPart::Tag(name) => {
                let inner = match overrides.get(name) {
                    Some(custom) => custom.as_str(),
                    None => "[^.]+",
                };
                body.push_str(&format!("(?P<{name}>{inner})"));
            }
        }
    }
    body.push('$');
    Regex::new(&body).map_err(|e| RuleError::InvalidPattern { reason: e.to_string() })
}

/// A compiled, immutable rule: the tag lists embedded in each template, the
/// two anchored matchers, and the template parts needed to render back out.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub(crate) pattern_parts: Vec<PatternPart>,
    pub(crate) metric_key_parts: Vec<PatternPart>,
    pub(crate) pattern_tags: Vec<String>,
    pub(crate) metric_key_tags: Vec<String>,
    pub(crate) pattern_regex: Regex,
    pub(crate) metric_key_regex: Regex,
}

impl CompiledRule {
    /// Compile a [`RawRule`]: parse both templates, validate any custom
    /// regex overrides, and build the anchored forward/inverse regexes.
    pub fn compile(raw: &RawRule) -> Result<Self, RuleError> {
        if raw.metric_key.is_empty() {
            return Err(RuleError::InvalidMetricKey { reason: "metric_key is empty".to_string() });
        }

        for (tag, pattern) in &raw.regex_overrides {
            validate_custom_regex(tag, pattern)?;
        }

        let pattern_parts = parse_pattern(&raw.pattern)?;
        let metric_key_parts = parse_pattern(&raw.metric_key)?;

        let pattern_tags = tags_in(&pattern_parts);
        let metric_key_tags = tags_in(&metric_key_parts);

        let pattern_regex = build_regex(&pattern_parts, &raw.regex_overrides)?;
        let metric_key_regex = build_regex(&metric_key_parts, &raw.regex_overrides)?;

        Ok(CompiledRule {
            pattern_parts,
            metric_key_parts,
            pattern_tags,
            metric_key_tags,
            pattern_regex,
            metric_key_regex,
        })
    }
}

/// Render `parts`, substituting each `Tag(name)` with `values[name]`.
/// Returns the first missing tag name as `Err` if any placeholder has no
/// value.
pub(crate) fn render_parts(parts: &[PatternPart], values: &HashMap<String, String>) -> Result<String, String> {
    let mut out = String::new();
    for part in parts {
        match part {
            PatternPart::Literal(lit) => out.push_str(lit),
            PatternPart::Tag(name) => match values.get(name) {
                Some(value) => out.push_str(value),
                None => return Err(name.clone()),
            },
        }
    }
    Ok(out)
}

//! The bidirectional naming rule engine (dotted Graphite name <-> tagged
//! metric), split into three layers:
//!
//! - `raw`: the on-disk YAML shape
//! - `compiled`: pattern -> regex compilation
//! - `set`: the ordered [`RuleSet`] doing the actual matching/rendering

mod compiled;
mod raw;
mod set;

pub use compiled::CompiledRule;
pub use raw::{RawRule, RuleFile};
pub use set::RuleSet;

impl RuleSet {
    /// Parse and compile a rule file in one step.
    pub fn load_yaml(yaml: &str) -> Result<Self, crate::error::RuleError> {
        let file = RuleFile::parse_yaml(yaml)?;
        let rule_count = file.rules.len();
        let set = RuleSet::compile(&file.rules).inspect_err(|e| {
            tracing::warn!(error = %e, "rule file failed to compile");
        })?;
        tracing::debug!(rule_count, "loaded rule file");
        Ok(set)
    }
}

//! Process-wide default rule set
//!
//! Zero-config convenience over a shared [`RuleSet`]. Code that wants an
//! isolated registry should construct its own `RuleSet` and pass it around.

use crate::error::Result;
use crate::predicate::Args;
use crate::ruleset::{Rule, RuleSet};
use std::sync::LazyLock;

static DEFAULT_RULES: LazyLock<RuleSet> = LazyLock::new(|| RuleSet::with_label("default_rules"));

/// The shared default rule set
pub fn default_rules() -> &'static RuleSet {
    &DEFAULT_RULES
}

pub fn add_rule(name: impl Into<String>, rule: impl Into<Rule>) -> Result<()> {
    DEFAULT_RULES.add_rule(name, rule)
}

pub fn set_rule(name: impl Into<String>, rule: impl Into<Rule>) {
    DEFAULT_RULES.set_rule(name, rule)
}

pub fn replace_rule(name: &str, rule: impl Into<Rule>) -> Result<()> {
    DEFAULT_RULES.replace_rule(name, rule)
}

pub fn remove_rule(name: &str) -> Result<()> {
    DEFAULT_RULES.remove_rule(name)
}

pub fn rule_exists(name: &str) -> bool {
    DEFAULT_RULES.rule_exists(name)
}

pub fn test_rule<'a>(name: &str, args: impl Into<Args<'a>>) -> bool {
    DEFAULT_RULES.test_rule(name, args)
}

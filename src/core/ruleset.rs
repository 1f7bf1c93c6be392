//! Named registry of predicates
//!
//! A [`RuleSet`] maps rule names to predicates. Lookups are by name only and
//! an unknown rule always tests as `false`, so callers can ask about rules
//! that were never registered without special-casing them.

use crate::error::{Result, RulesError};
use crate::predicate::{Args, Predicate, Signature};
use ahash::AHashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// A registered predicate plus its optional display name
#[derive(Debug, Clone)]
pub struct Rule {
    predicate: Predicate,
    verbose_name: Option<String>,
}

impl Rule {
    pub fn new(predicate: Predicate) -> Self {
        Rule {
            predicate,
            verbose_name: None,
        }
    }

    /// Attach a human-readable name
    pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = Some(verbose_name.into());
        self
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn verbose_name(&self) -> Option<&str> {
        self.verbose_name.as_deref()
    }
}

impl From<Predicate> for Rule {
    fn from(predicate: Predicate) -> Self {
        Rule::new(predicate)
    }
}

impl From<&Predicate> for Rule {
    fn from(predicate: &Predicate) -> Self {
        Rule::new(predicate.clone())
    }
}

/// Serializable summary of one registered rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose_name: Option<String>,
    pub predicate: String,
    pub signature: Signature,
}

/// Registry of named rules
///
/// Registration and lookup both take `&self`; the map sits behind a
/// read-write lock so a `RuleSet` can be shared between threads or stored in
/// a `static`. Rules are normally registered once at startup and read
/// afterwards.
///
/// # Examples
///
/// ```
/// use rulekit::{builtin, RuleSet};
///
/// let rules = RuleSet::new();
/// rules.add_rule("can_publish", builtin::always_true()).unwrap();
///
/// assert!(rules.test_rule("can_publish", ()));
/// assert!(!rules.test_rule("never_registered", ()));
/// ```
pub struct RuleSet {
    label: String,
    rules: RwLock<AHashMap<String, Rule>>,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::with_label("rules")
    }

    /// Create an empty rule set whose log lines carry `label`
    pub fn with_label(label: impl Into<String>) -> Self {
        RuleSet {
            label: label.into(),
            rules: RwLock::new(AHashMap::new()),
        }
    }

    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::new()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Register a new rule
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRule` if `name` is already registered.
    pub fn add_rule(&self, name: impl Into<String>, rule: impl Into<Rule>) -> Result<()> {
        let name = name.into();
        let rule = rule.into();
        let mut rules = self.rules.write();
        if rules.contains_key(&name) {
            return Err(RulesError::DuplicateRule(name));
        }
        debug!(
            "[{}] Adding rule '{}' -> {}",
            self.label,
            name,
            rule.predicate.name()
        );
        rules.insert(name, rule);
        Ok(())
    }

    /// Register or overwrite a rule unconditionally
    pub fn set_rule(&self, name: impl Into<String>, rule: impl Into<Rule>) {
        let name = name.into();
        let rule = rule.into();
        debug!(
            "[{}] Setting rule '{}' -> {}",
            self.label,
            name,
            rule.predicate.name()
        );
        self.rules.write().insert(name, rule);
    }

    /// Overwrite an existing rule
    ///
    /// # Errors
    ///
    /// Returns `MissingRule` if `name` is not registered.
    pub fn replace_rule(&self, name: &str, rule: impl Into<Rule>) -> Result<()> {
        let rule = rule.into();
        let mut rules = self.rules.write();
        match rules.get_mut(name) {
            Some(existing) => {
                debug!(
                    "[{}] Replacing rule '{}' -> {}",
                    self.label,
                    name,
                    rule.predicate.name()
                );
                *existing = rule;
                Ok(())
            }
            None => Err(RulesError::MissingRule(name.to_string())),
        }
    }

    /// Unregister a rule
    ///
    /// # Errors
    ///
    /// Returns `MissingRule` if `name` is not registered.
    pub fn remove_rule(&self, name: &str) -> Result<()> {
        match self.rules.write().remove(name) {
            Some(_) => {
                debug!("[{}] Removed rule '{}'", self.label, name);
                Ok(())
            }
            None => Err(RulesError::MissingRule(name.to_string())),
        }
    }

    pub fn rule_exists(&self, name: &str) -> bool {
        self.rules.read().contains_key(name)
    }

    /// Display name of a rule, falling back to the rule name itself
    pub fn verbose_name(&self, name: &str) -> String {
        self.rules
            .read()
            .get(name)
            .and_then(|rule| rule.verbose_name.clone())
            .unwrap_or_else(|| name.to_string())
    }

    /// The predicate registered under `name`
    pub fn get(&self, name: &str) -> Option<Predicate> {
        self.rules.read().get(name).map(|rule| rule.predicate.clone())
    }

    /// Test the rule registered under `name`
    ///
    /// Unknown rules test as `false`. The registry lock is released before
    /// the predicate runs, so predicates may consult this rule set too.
    pub fn test_rule<'a>(&self, name: &str, args: impl Into<Args<'a>>) -> bool {
        let Some(predicate) = self.get(name) else {
            trace!("[{}] No rule named '{}', denying", self.label, name);
            return false;
        };
        let result = predicate.test(args);
        trace!("[{}] Rule '{}' tested {}", self.label, name, result);
        result
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// Registered rule names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rules.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove every rule
    pub fn clear(&self) {
        self.rules.write().clear();
        debug!("[{}] Cleared all rules", self.label);
    }

    /// Summaries of all rules, sorted by name
    pub fn describe(&self) -> Vec<RuleInfo> {
        let mut infos: Vec<RuleInfo> = self
            .rules
            .read()
            .iter()
            .map(|(name, rule)| RuleInfo {
                name: name.clone(),
                verbose_name: rule.verbose_name.clone(),
                predicate: rule.predicate.name().to_string(),
                signature: rule.predicate.signature(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Serialize the rule summaries to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.describe())?)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("label", &self.label)
            .field("rules", &self.names())
            .finish()
    }
}

/// Builder for a pre-populated [`RuleSet`]
///
/// # Examples
///
/// ```
/// use rulekit::{builtin, Rule, RuleSet};
///
/// # fn main() -> rulekit::Result<()> {
/// let perms = RuleSet::builder()
///     .label("permissions")
///     .rule("books.view_book", builtin::always_allow())
///     .rule(
///         "books.delete_book",
///         Rule::new(builtin::always_deny()).with_verbose_name("Delete book"),
///     )
///     .build()?;
///
/// assert_eq!(perms.verbose_name("books.delete_book"), "Delete book");
/// # Ok(())
/// # }
/// ```
pub struct RuleSetBuilder {
    label: Option<String>,
    rules: Vec<(String, Rule)>,
}

impl RuleSetBuilder {
    pub fn new() -> Self {
        RuleSetBuilder {
            label: None,
            rules: Vec::new(),
        }
    }

    /// Set the label used in log lines
    pub fn label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Queue a rule for registration
    pub fn rule<S: Into<String>, R: Into<Rule>>(mut self, name: S, rule: R) -> Self {
        self.rules.push((name.into(), rule.into()));
        self
    }

    /// Build the rule set
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRule` if the same name was queued twice.
    pub fn build(self) -> Result<RuleSet> {
        let ruleset = match self.label {
            Some(label) => RuleSet::with_label(label),
            None => RuleSet::new(),
        };
        for (name, rule) in self.rules {
            ruleset.add_rule(name, rule)?;
        }
        Ok(ruleset)
    }
}

impl Default for RuleSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

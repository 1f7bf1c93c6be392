//! Predicate engine internals
//!
//! Leaves first: [`predicate`] values are evaluated inside a per-call
//! [`context`], registered by name in a [`ruleset::RuleSet`], and exposed
//! through the process-wide [`rulesets`] and [`permissions`] facades.

pub mod context;
pub mod error;
pub mod permissions;
pub mod predicate;
pub mod ruleset;
pub mod rulesets;
pub mod validation;

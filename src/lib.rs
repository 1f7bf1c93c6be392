//! # rulekit - Composable Authorization Predicates
//!
//! `rulekit` decides "can this subject do this action on this object?" with
//! plain Rust predicates instead of a database-backed permission table:
//!
//! - **Predicates** over zero, one or two context values (subject, target)
//! - **Three-valued logic**: a predicate may abstain; `&`, `|`, `^`, `!`
//!   combine predicates with short-circuiting and treat abstention as neutral
//! - **Invocation context**: predicates evaluated within one `test()` call
//!   share a scratchpad for memoisation; separate calls never do
//! - **Rule sets**: name-to-predicate registries, with shared default `rules`
//!   and `permissions` instances for zero-config use
//!
//! ## Quick Start
//!
//! ```rust
//! use rulekit::{builtin, Predicate, RuleSet, Result};
//!
//! struct User { name: &'static str, groups: Vec<String> }
//! struct Doc { owner: &'static str }
//!
//! impl builtin::Principal for User {
//!     fn group_names(&self) -> Vec<String> {
//!         self.groups.clone()
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let is_author = Predicate::on_pair(|user: &User, doc: &Doc| doc.owner == user.name)
//!     .named("is_author");
//! let is_editor = builtin::is_group_member::<User>(&["editors"])?;
//!
//! let rules = RuleSet::new();
//! rules.add_rule("change_doc", &is_author | &is_editor)?;
//!
//! let doc = Doc { owner: "alice" };
//! let alice = User { name: "alice", groups: vec![] };
//! let bob = User { name: "bob", groups: vec![] };
//! let carol = User { name: "carol", groups: vec!["editors".into()] };
//!
//! assert!(rules.test_rule("change_doc", (&alice, &doc)));
//! assert!(!rules.test_rule("change_doc", (&bob, &doc)));
//! assert!(rules.test_rule("change_doc", (&carol, &doc)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Shared registries
//!
//! ```rust
//! use rulekit::{add_perm, builtin, has_perm};
//!
//! add_perm("books.view_book", builtin::always_allow()).unwrap();
//! assert!(has_perm("books.view_book", ()));
//! assert!(!has_perm("books.burn_book", ()));
//! ```

pub mod core;

// Re-export core modules internally so crate:: paths in core still work
#[allow(unused_imports)]
pub(crate) use crate::core::{error, permissions, predicate, ruleset, rulesets, validation};

pub use crate::core::context;

// Re-export core types that users need
pub use crate::core::{
    context::{Context, Scratchpad},
    error::{Result, RulesError},
    permissions::{
        add_perm, has_perm, perm_exists, permissions, remove_perm, replace_perm, set_perm,
        ObjectPermissionBackend,
    },
    predicate::{builtin, Arg, Args, Check, Predicate, Signature, Verdict, MAX_ARITY},
    ruleset::{Rule, RuleInfo, RuleSet, RuleSetBuilder},
    rulesets::{add_rule, default_rules, remove_rule, replace_rule, rule_exists, set_rule, test_rule},
    validation::PermissionName,
};

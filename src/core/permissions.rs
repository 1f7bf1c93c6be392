//! Object-level permissions
//!
//! Permissions are ordinary rules kept in their own namespace, named by
//! convention `app_label.action_model`. [`ObjectPermissionBackend`] is the
//! single entry point an outer layer (views, admin, API handlers) needs:
//! given a user, a permission name and optionally an object, is the action
//! allowed?

use crate::error::Result;
use crate::predicate::{Arg, Args};
use crate::ruleset::{Rule, RuleSet};
use crate::validation::PermissionName;
use std::any::Any;
use std::sync::LazyLock;
use tracing::trace;

static PERMISSIONS: LazyLock<RuleSet> = LazyLock::new(|| RuleSet::with_label("permissions"));

/// The shared permission rule set
pub fn permissions() -> &'static RuleSet {
    &PERMISSIONS
}

pub fn add_perm(name: impl Into<String>, rule: impl Into<Rule>) -> Result<()> {
    PERMISSIONS.add_rule(name, rule)
}

pub fn set_perm(name: impl Into<String>, rule: impl Into<Rule>) {
    PERMISSIONS.set_rule(name, rule)
}

pub fn replace_perm(name: &str, rule: impl Into<Rule>) -> Result<()> {
    PERMISSIONS.replace_rule(name, rule)
}

pub fn remove_perm(name: &str) -> Result<()> {
    PERMISSIONS.remove_rule(name)
}

pub fn perm_exists(name: &str) -> bool {
    PERMISSIONS.rule_exists(name)
}

pub fn has_perm<'a>(name: &str, args: impl Into<Args<'a>>) -> bool {
    PERMISSIONS.test_rule(name, args)
}

/// Permission checks against a permission rule set
///
/// Defaults to the shared [`permissions()`] registry; use [`new`](Self::new)
/// to check against an injected one instead.
///
/// # Examples
///
/// ```
/// use rulekit::{ObjectPermissionBackend, Predicate, RuleSet};
///
/// struct User { id: u32 }
/// struct Book { author_id: u32 }
///
/// let perms = RuleSet::new();
/// perms
///     .add_rule(
///         "books.change_book",
///         Predicate::on_pair(|user: &User, book: &Book| book.author_id == user.id),
///     )
///     .unwrap();
///
/// let backend = ObjectPermissionBackend::new(&perms);
/// let author = User { id: 7 };
/// let book = Book { author_id: 7 };
///
/// assert!(backend.has_perm(&author, "books.change_book", Some(&book)));
/// assert!(!backend.has_perm(&User { id: 8 }, "books.change_book", Some(&book)));
/// assert!(!backend.has_perm(&author, "books.change_book", None::<&Book>));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ObjectPermissionBackend<'r> {
    permissions: &'r RuleSet,
}

impl<'r> ObjectPermissionBackend<'r> {
    pub fn new(permissions: &'r RuleSet) -> Self {
        ObjectPermissionBackend { permissions }
    }

    /// Whether `user` holds `perm`, optionally on `obj`
    ///
    /// Without an object the permission's predicate sees the target slot as
    /// not given. Unknown permissions are denied.
    pub fn has_perm<U: Any, O: Any>(&self, user: &U, perm: &str, obj: Option<&O>) -> bool {
        let target = obj.map_or(Arg::NOT_GIVEN, Arg::new);
        let allowed = self
            .permissions
            .test_rule(perm, (Arg::new(user), target));
        trace!("Permission check '{}' -> {}", perm, allowed);
        allowed
    }

    /// [`has_perm`](Self::has_perm) for a validated permission name
    pub fn has_named_perm<U: Any, O: Any>(
        &self,
        user: &U,
        perm: &PermissionName,
        obj: Option<&O>,
    ) -> bool {
        self.has_perm(user, perm.as_str(), obj)
    }

    /// Whether `user` may access the app at all
    ///
    /// Tests the rule registered under the bare app label.
    pub fn has_module_perms<U: Any>(&self, user: &U, app_label: &str) -> bool {
        self.permissions.test_rule(app_label, (user,))
    }
}

impl Default for ObjectPermissionBackend<'static> {
    fn default() -> Self {
        ObjectPermissionBackend::new(permissions())
    }
}

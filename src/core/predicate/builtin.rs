//! Predefined predicates
//!
//! Constant predicates plus account-flag and group checks over any user type
//! implementing [`Principal`]. A subject that is missing or of a different
//! type simply fails the check, the same way a custom user model without a
//! given flag would.

use super::{Predicate, Signature, Verdict};
use crate::error::{Result, RulesError};
use ahash::AHashSet;
use std::rc::Rc;

/// What the account predicates need to know about a user
pub trait Principal {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn is_active(&self) -> bool {
        true
    }

    fn is_staff(&self) -> bool {
        false
    }

    fn is_superuser(&self) -> bool {
        false
    }

    /// Names of the groups this user belongs to
    fn group_names(&self) -> Vec<String>;
}

/// Scratchpad key prefix for memoised group names
const GROUP_CACHE_KEY: &str = "rulekit.group_names";

/// Group names listed in an `is_group_member` name before eliding
const MAX_NAMED_GROUPS: usize = 3;

pub fn always_true() -> Predicate {
    Predicate::nullary(|| true).named("always_true")
}

pub fn always_false() -> Predicate {
    Predicate::nullary(|| false).named("always_false")
}

pub fn always_allow() -> Predicate {
    Predicate::nullary(|| true).named("always_allow")
}

pub fn always_deny() -> Predicate {
    Predicate::nullary(|| false).named("always_deny")
}

pub fn is_authenticated<U: Principal + 'static>() -> Predicate {
    Predicate::on_subject(|user: &U| user.is_authenticated()).named("is_authenticated")
}

pub fn is_active<U: Principal + 'static>() -> Predicate {
    Predicate::on_subject(|user: &U| user.is_active()).named("is_active")
}

pub fn is_staff<U: Principal + 'static>() -> Predicate {
    Predicate::on_subject(|user: &U| user.is_staff()).named("is_staff")
}

pub fn is_superuser<U: Principal + 'static>() -> Predicate {
    Predicate::on_subject(|user: &U| user.is_superuser()).named("is_superuser")
}

/// True when the subject belongs to every one of `groups`
///
/// The subject's group names are read once per invocation and shared with
/// every other membership check evaluated in the same `test()` call.
///
/// # Errors
///
/// Returns `EmptyGroupList` if `groups` is empty.
///
/// # Examples
///
/// ```
/// use rulekit::builtin::{is_group_member, Principal};
///
/// struct User(Vec<String>);
///
/// impl Principal for User {
///     fn group_names(&self) -> Vec<String> {
///         self.0.clone()
///     }
/// }
///
/// let editors = is_group_member::<User>(&["editors"]).unwrap();
/// assert_eq!(editors.name(), "is_group_member:editors");
/// assert!(editors.test((&User(vec!["editors".into()]),)));
/// assert!(!editors.test((&User(vec![]),)));
/// ```
pub fn is_group_member<U: Principal + 'static>(groups: &[&str]) -> Result<Predicate> {
    if groups.is_empty() {
        return Err(RulesError::EmptyGroupList);
    }

    let mut shown: Vec<&str> = groups.iter().copied().take(MAX_NAMED_GROUPS).collect();
    if groups.len() > MAX_NAMED_GROUPS {
        shown.push("...");
    }
    let name = format!("is_group_member:{}", shown.join(","));

    let required: Vec<String> = groups.iter().map(|g| g.to_string()).collect();

    let predicate = Predicate::new(Signature::Unary, move |ctx, args| {
        let Some(user) = args[0].downcast::<U>() else {
            return Verdict::False;
        };
        // Keyed by subject address
        let key = format!("{}:{:p}", GROUP_CACHE_KEY, user);
        let member_of: Rc<AHashSet<String>> = ctx.get_or_insert_with(&key, || {
            Rc::new(user.group_names().into_iter().collect())
        });
        Verdict::from(required.iter().all(|group| member_of.contains(group)))
    });

    Ok(predicate.named(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct User {
        staff: bool,
        superuser: bool,
        active: bool,
        groups: Vec<&'static str>,
        lookups: AtomicUsize,
    }

    impl User {
        fn new(groups: &[&'static str]) -> Self {
            User {
                staff: true,
                superuser: true,
                active: true,
                groups: groups.to_vec(),
                lookups: AtomicUsize::new(0),
            }
        }
    }

    impl Principal for User {
        fn is_active(&self) -> bool {
            self.active
        }

        fn is_staff(&self) -> bool {
            self.staff
        }

        fn is_superuser(&self) -> bool {
            self.superuser
        }

        fn group_names(&self) -> Vec<String> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.groups.iter().map(|g| g.to_string()).collect()
        }
    }

    struct SwappedUser;

    #[test]
    fn test_constant_predicates() {
        assert!(always_true().test(()));
        assert!(!always_false().test(()));
        assert!(always_allow().test(()));
        assert!(!always_deny().test(()));
        assert_eq!(always_allow().name(), "always_allow");
    }

    #[test]
    fn test_account_flags() {
        let user = User::new(&[]);

        assert!(is_authenticated::<User>().test((&user,)));
        assert!(is_superuser::<User>().test((&user,)));
        assert!(is_staff::<User>().test((&user,)));
        assert!(is_active::<User>().test((&user,)));

        assert!(!is_authenticated::<User>().test((&SwappedUser,)));
        assert!(!is_superuser::<User>().test((&SwappedUser,)));
        assert!(!is_staff::<User>().test((&SwappedUser,)));
        assert!(!is_active::<User>().test(()));
    }

    #[test]
    fn test_inactive_user() {
        let mut user = User::new(&[]);
        user.active = false;
        user.staff = false;

        assert!(!is_active::<User>().test((&user,)));
        assert!(!is_staff::<User>().test((&user,)));
    }

    #[test]
    fn test_group_member_names() {
        let p1 = is_group_member::<User>(&["somegroup"]).unwrap();
        assert_eq!(p1.name(), "is_group_member:somegroup");
        assert_eq!(p1.arity(), 1);

        let p2 = is_group_member::<User>(&["g1", "g2", "g3", "g4"]).unwrap();
        assert_eq!(p2.name(), "is_group_member:g1,g2,g3,...");

        assert!(matches!(
            is_group_member::<User>(&[]),
            Err(RulesError::EmptyGroupList)
        ));
    }

    #[test]
    fn test_group_membership() {
        let user = User::new(&["editors"]);

        let editors = is_group_member::<User>(&["editors"]).unwrap();
        assert!(editors.test((&user,)));
        assert!(!editors.test((&SwappedUser,)));

        let both = is_group_member::<User>(&["editors", "staff"]).unwrap();
        assert!(!both.test((&user,)));
    }

    #[test]
    fn test_group_names_read_once_per_invocation() {
        let user = User::new(&["editors", "staff"]);
        let editors = is_group_member::<User>(&["editors"]).unwrap();
        let staff = is_group_member::<User>(&["staff"]).unwrap();
        let both = &editors & &staff;

        assert!(both.test((&user,)));
        assert_eq!(user.lookups.load(Ordering::SeqCst), 1);

        // A new top-level call starts with an empty scratchpad
        assert!(both.test((&user,)));
        assert_eq!(user.lookups.load(Ordering::SeqCst), 2);
    }
}

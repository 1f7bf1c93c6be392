//! End-to-end rule and permission scenarios

use rulekit::builtin::{self, Principal};
use rulekit::{ObjectPermissionBackend, PermissionName, Predicate, Rule, RuleSet, RulesError};

struct User {
    name: &'static str,
    groups: Vec<&'static str>,
    superuser: bool,
}

impl User {
    fn new(name: &'static str, groups: &[&'static str]) -> Self {
        User {
            name,
            groups: groups.to_vec(),
            superuser: false,
        }
    }
}

impl Principal for User {
    fn is_superuser(&self) -> bool {
        self.superuser
    }

    fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.to_string()).collect()
    }
}

struct Document {
    owner: &'static str,
}

fn is_author() -> Predicate {
    Predicate::on_pair(|user: &User, doc: &Document| doc.owner == user.name).named("is_author")
}

fn is_editor() -> Predicate {
    builtin::is_group_member::<User>(&["editors"]).unwrap()
}

fn doc_rules() -> RuleSet {
    let rules = RuleSet::with_label("docs");
    rules.add_rule("change_doc", is_author() | is_editor()).unwrap();
    rules.add_rule("delete_doc", is_author()).unwrap();
    rules
        .add_rule("create_doc", builtin::is_superuser::<User>())
        .unwrap();
    rules
}

#[test]
fn test_change_doc_scenario() {
    let rules = doc_rules();
    let doc = Document { owner: "alice" };

    let alice = User::new("alice", &[]);
    let bob = User::new("bob", &[]);
    let carol = User::new("carol", &["editors"]);

    assert!(rules.test_rule("change_doc", (&alice, &doc)));
    assert!(!rules.test_rule("change_doc", (&bob, &doc)));
    assert!(rules.test_rule("change_doc", (&carol, &doc)));

    assert!(rules.test_rule("delete_doc", (&alice, &doc)));
    assert!(!rules.test_rule("delete_doc", (&carol, &doc)));
}

#[test]
fn test_rule_without_target() {
    let rules = doc_rules();
    let carol = User::new("carol", &["editors"]);
    let alice = User::new("alice", &[]);

    // Editors may change any document; authorship needs a document
    assert!(rules.test_rule("change_doc", (&carol,)));
    assert!(!rules.test_rule("change_doc", (&alice,)));
}

#[test]
fn test_superuser_rule() {
    let rules = doc_rules();
    let mut boss = User::new("boss", &[]);
    assert!(!rules.test_rule("create_doc", (&boss,)));

    boss.superuser = true;
    assert!(rules.test_rule("create_doc", (&boss,)));
}

#[test]
fn test_rule_lifecycle() {
    let rules = RuleSet::new();
    rules.add_rule("somerule", builtin::always_true()).unwrap();

    assert!(matches!(
        rules.add_rule("somerule", builtin::always_true()),
        Err(RulesError::DuplicateRule(_))
    ));

    rules.remove_rule("somerule").unwrap();
    assert!(!rules.rule_exists("somerule"));
    assert!(!rules.test_rule("somerule", ()));
}

#[test]
fn test_model_permissions_with_backend() {
    let perms = RuleSet::with_label("permissions");
    let change = PermissionName::for_model("docs", "change", "Document").unwrap();
    let view = PermissionName::for_model("docs", "view", "Document").unwrap();

    perms
        .add_rule(
            change.as_str(),
            Rule::new(is_author() | is_editor()).with_verbose_name("Change document"),
        )
        .unwrap();
    perms.add_rule(view.as_str(), builtin::always_allow()).unwrap();
    perms
        .add_rule(change.app_label(), builtin::is_authenticated::<User>())
        .unwrap();

    let backend = ObjectPermissionBackend::new(&perms);
    let doc = Document { owner: "alice" };
    let alice = User::new("alice", &[]);
    let bob = User::new("bob", &[]);

    assert!(backend.has_named_perm(&alice, &change, Some(&doc)));
    assert!(!backend.has_named_perm(&bob, &change, Some(&doc)));
    assert!(backend.has_perm(&bob, "docs.view_document", None::<&Document>));
    assert!(!backend.has_perm(&bob, "docs.delete_document", Some(&doc)));

    assert!(backend.has_module_perms(&bob, "docs"));
    assert!(!backend.has_module_perms(&bob, "billing"));

    assert_eq!(perms.verbose_name("docs.change_document"), "Change document");
}

#[test]
fn test_shared_default_rules() {
    rulekit::add_rule("scenarios.publish", builtin::always_true()).unwrap();
    assert!(rulekit::test_rule("scenarios.publish", ()));

    rulekit::set_rule("scenarios.publish", builtin::always_false());
    assert!(!rulekit::test_rule("scenarios.publish", ()));

    rulekit::remove_rule("scenarios.publish").unwrap();
    assert!(!rulekit::rule_exists("scenarios.publish"));
    assert!(!rulekit::test_rule("scenarios.never_registered", ()));
}

#[test]
fn test_shared_permissions_backend() {
    rulekit::add_perm("scenarios.read_doc", is_author()).unwrap();
    let backend = ObjectPermissionBackend::default();
    let doc = Document { owner: "alice" };

    assert!(backend.has_perm(&User::new("alice", &[]), "scenarios.read_doc", Some(&doc)));
    assert!(!backend.has_perm(&User::new("bob", &[]), "scenarios.read_doc", Some(&doc)));

    rulekit::remove_perm("scenarios.read_doc").unwrap();
    assert!(!rulekit::perm_exists("scenarios.read_doc"));
}

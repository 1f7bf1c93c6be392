//! Validation for permission names
//!
//! Permissions are rules keyed by convention as `app_label.codename`, where
//! the codename for model permissions is `action_model` (for example
//! `books.change_book`). [`PermissionName`] checks and builds such names.

use crate::error::{Result, RulesError};
use regex::Regex;

/// A validated `app_label.codename` permission identifier
///
/// # Rules
/// - Exactly one `.` separating app label and codename
/// - Both parts: lowercase letters, digits and underscores, starting with a letter
///
/// # Examples
///
/// ```
/// use rulekit::PermissionName;
///
/// let perm = PermissionName::for_model("books", "change", "Book").unwrap();
/// assert_eq!(perm.as_str(), "books.change_book");
/// assert_eq!(perm.app_label(), "books");
///
/// assert!(PermissionName::new("books").is_err()); // no codename
/// assert!(PermissionName::new("Books.view").is_err()); // uppercase
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionName {
    full: String,
    split: usize,
}

impl PermissionName {
    /// Pattern for a single identifier part
    const PART_PATTERN: &'static str = r"^[a-z][a-z0-9_]*$";

    /// Parse and validate `app_label.codename`
    ///
    /// # Errors
    ///
    /// Returns `InvalidPermissionName` if the name doesn't meet the rules.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let full = name.into();
        let Some(split) = full.find('.') else {
            return Err(RulesError::InvalidPermissionName(format!(
                "'{}' must have the form app_label.codename",
                full
            )));
        };

        Self::validate_part(&full[..split], "app label")?;
        Self::validate_part(&full[split + 1..], "codename")?;

        Ok(PermissionName { full, split })
    }

    /// Conventional name for an action on a model, e.g. `books.add_book`
    pub fn for_model(app_label: &str, action: &str, model: &str) -> Result<Self> {
        Self::new(format!(
            "{}.{}_{}",
            app_label,
            action,
            model.to_lowercase()
        ))
    }

    fn validate_part(part: &str, what: &str) -> Result<()> {
        let re = Regex::new(Self::PART_PATTERN)
            .map_err(|e| RulesError::InvalidPermissionName(e.to_string()))?;
        if !re.is_match(part) {
            return Err(RulesError::InvalidPermissionName(format!(
                "{} '{}' must be lowercase letters, digits and underscores, starting with a letter",
                what, part
            )));
        }
        Ok(())
    }

    pub fn app_label(&self) -> &str {
        &self.full[..self.split]
    }

    pub fn codename(&self) -> &str {
        &self.full[self.split + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }

    pub fn into_string(self) -> String {
        self.full
    }
}

impl AsRef<str> for PermissionName {
    fn as_ref(&self) -> &str {
        &self.full
    }
}

impl std::fmt::Display for PermissionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full)
    }
}

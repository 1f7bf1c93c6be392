use thiserror::Error;

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("A rule with name `{0}` already exists")]
    DuplicateRule(String),

    #[error("No rule with name `{0}` is registered")]
    MissingRule(String),

    #[error("Incompatible predicate: arity {0} exceeds the maximum of 2")]
    ArityTooLarge(usize),

    #[error("is_group_member requires at least one group name")]
    EmptyGroupList,

    #[error("Invalid permission name: {0}")]
    InvalidPermissionName(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RulesError>;

//! Directory group entries.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::ValidationError;

/// Longest accepted group name.
pub const MAX_GROUP_NAME_LEN: usize = 200;

/// A `posixGroup` entry keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    pub name: String,
    pub gid: u32,
    pub member_usernames: BTreeSet<String>,
}

impl GroupRecord {
    pub fn new(name: impl Into<String>, gid: u32) -> Self {
        Self {
            name: name.into(),
            gid,
            member_usernames: BTreeSet::new(),
        }
    }
}

/// Group names are non-empty and at most [`MAX_GROUP_NAME_LEN`] characters.
pub fn validate_group_name(name: &str) -> Result<&str, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::invalid("name", "must not be blank"));
    }
    if name.chars().count() > MAX_GROUP_NAME_LEN {
        return Err(ValidationError::invalid(
            "name",
            format!("must be at most {MAX_GROUP_NAME_LEN} characters"),
        ));
    }
    Ok(name)
}

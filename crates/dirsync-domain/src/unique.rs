//! Uniqueness checks for directory-unique attributes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Attributes that must be unique across their collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueField {
    Username,
    Uid,
    GroupName,
    Gid,
    SecurityIdentifier,
    DomainName,
    SecurityIdentifierPrefix,
}

impl UniqueField {
    /// Human-readable label used in field-level messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Username => "Username",
            Self::Uid => "User ID",
            Self::GroupName => "Name",
            Self::Gid => "Group ID",
            Self::SecurityIdentifier => "SID",
            Self::DomainName => "Domain name",
            Self::SecurityIdentifierPrefix => "Domain SID",
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reject `candidate` if it is already taken in `existing`.
///
/// `current` is the record's own stored value on update. One occurrence of it
/// is discounted so a record can keep its own value.
pub fn check_unique<T>(
    field: UniqueField,
    candidate: T,
    existing: &[T],
    current: Option<&T>,
) -> Result<T, ValidationError>
where
    T: PartialEq + fmt::Display,
{
    let mut taken = existing.iter().filter(|v| **v == candidate).count();
    if current.is_some_and(|own| *own == candidate) {
        taken = taken.saturating_sub(1);
    }
    if taken > 0 {
        return Err(ValidationError::DuplicateValue {
            field,
            value: candidate.to_string(),
        });
    }
    Ok(candidate)
}

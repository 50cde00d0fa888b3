use std::fmt;

use dirsync_domain::error::ValidationError;
use dirsync_domain::unique::UniqueField;

/// What a dangling reference pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    User,
    Group,
    Domain,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Domain => "samba domain",
        })
    }
}

/// Identity store error variants.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("{field} already assigned. Choose something else.")]
    DuplicateValue { field: UniqueField, value: String },
    #[error("User ID {uid} is in a restricted range. Choose something else.")]
    RestrictedRange { uid: u32 },
    #[error("{kind} {key:?} does not exist")]
    MissingReference { kind: ReferenceKind, key: String },
    #[error("stored password of {username} is not a usable hash")]
    MalformedHash { username: String },
    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("group not found: {0}")]
    GroupNotFound(String),
    #[error("backend error: {0:#}")]
    Backend(#[from] anyhow::Error),
}

impl IdentityError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateValue { .. } => "DUPLICATE_VALUE",
            Self::RestrictedRange { .. } => "RESTRICTED_RANGE",
            Self::MissingReference { .. } => "MISSING_REFERENCE",
            Self::MalformedHash { .. } => "MALFORMED_HASH",
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::GroupNotFound(_) => "GROUP_NOT_FOUND",
            Self::Backend(_) => "BACKEND",
        }
    }

    /// The record field a validation message belongs to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::DuplicateValue { field, .. } => Some(match field {
                UniqueField::Username => "username",
                UniqueField::Uid => "uid",
                UniqueField::GroupName => "name",
                UniqueField::Gid => "gid",
                UniqueField::SecurityIdentifier => "security_identifier",
                UniqueField::DomainName => "domain_name",
                UniqueField::SecurityIdentifierPrefix => "security_identifier_prefix",
            }),
            Self::RestrictedRange { .. } => Some("uid"),
            Self::MissingReference { kind, .. } => Some(match kind {
                ReferenceKind::User => "member_usernames",
                ReferenceKind::Group => "gid",
                ReferenceKind::Domain => "domain",
            }),
            Self::MalformedHash { .. } => Some("password"),
            Self::InvalidValue { field, .. } => Some(*field),
            Self::UserNotFound(_) | Self::GroupNotFound(_) | Self::Backend(_) => None,
        }
    }
}

impl From<ValidationError> for IdentityError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::DuplicateValue { field, value } => Self::DuplicateValue { field, value },
            ValidationError::RestrictedRange { uid } => Self::RestrictedRange { uid },
            ValidationError::InvalidValue { field, reason } => Self::InvalidValue { field, reason },
        }
    }
}

/// The local account store could not be brought in line with a directory user.
///
/// Reported next to a successful directory save, never in place of it.
#[derive(Debug, thiserror::Error)]
#[error("local account sync failed for {username}")]
pub struct MirrorError {
    pub username: String,
    #[source]
    pub source: IdentityError,
}

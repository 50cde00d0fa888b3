use crate::unique::UniqueField;

/// A record failed one of the save-time invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} already assigned: {value}")]
    DuplicateValue { field: UniqueField, value: String },
    #[error("user ID {uid} is in a restricted range")]
    RestrictedRange { uid: u32 },
    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

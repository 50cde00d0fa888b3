//! Numeric POSIX identifier allocation.
//!
//! Allocation is advisory: it reads the current values and proposes
//! `max + 1` without reserving anything. Callers must serialise
//! allocate/check/write or rely on the directory rejecting duplicates.

use crate::error::ValidationError;
use crate::unique::UniqueField;

/// First uid handed out when the directory has no users yet.
pub const UID_BASE: u32 = 10_000;

/// First gid handed out when the directory has no groups yet.
pub const GID_BASE: u32 = 5_000;

/// Uids below this are reserved for system accounts.
pub const MIN_UID: u32 = 2_000;

/// Uids in this band are reserved for service accounts.
pub const RESERVED_UID_BAND: std::ops::Range<u32> = 60_000..70_000;

/// Return `requested`, or `max(existing) + 1`, or `base` when nothing exists yet.
pub fn allocate_numeric_id(
    field: UniqueField,
    requested: Option<u32>,
    existing: &[u32],
    base: u32,
) -> Result<u32, ValidationError> {
    if let Some(id) = requested {
        return Ok(id);
    }
    match existing.iter().max() {
        None => Ok(base),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| ValidationError::invalid(field_name(field), "identifier space exhausted")),
    }
}

/// Reject uids reserved for system and service accounts.
pub fn validate_uid(uid: u32) -> Result<u32, ValidationError> {
    if uid < MIN_UID || RESERVED_UID_BAND.contains(&uid) {
        return Err(ValidationError::RestrictedRange { uid });
    }
    Ok(uid)
}

fn field_name(field: UniqueField) -> &'static str {
    match field {
        UniqueField::Gid => "gid",
        _ => "uid",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_start_at_base_when_empty() {
        assert_eq!(allocate_numeric_id(UniqueField::Uid, None, &[], 10_000), Ok(10_000));
    }

    #[test]
    fn should_allocate_one_past_the_maximum() {
        assert_eq!(
            allocate_numeric_id(UniqueField::Uid, None, &[10_005, 10_010], 10_000),
            Ok(10_011)
        );
    }

    #[test]
    fn should_honour_requested_value() {
        assert_eq!(
            allocate_numeric_id(UniqueField::Gid, Some(42), &[5_000], GID_BASE),
            Ok(42)
        );
    }

    #[test]
    fn should_fail_when_identifier_space_is_exhausted() {
        let err = allocate_numeric_id(UniqueField::Gid, None, &[u32::MAX], GID_BASE).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { field: "gid", .. }));
    }

    #[test]
    fn should_reject_restricted_uids() {
        assert_eq!(validate_uid(1_999), Err(ValidationError::RestrictedRange { uid: 1_999 }));
        assert_eq!(validate_uid(65_000), Err(ValidationError::RestrictedRange { uid: 65_000 }));
        assert!(validate_uid(60_000).is_err());
        assert!(validate_uid(69_999).is_err());
    }

    #[test]
    fn should_accept_uids_outside_reserved_ranges() {
        assert_eq!(validate_uid(2_000), Ok(2_000));
        assert_eq!(validate_uid(59_999), Ok(59_999));
        assert_eq!(validate_uid(70_000), Ok(70_000));
    }
}

use serde::Serialize;

use dirsync_domain::user::UserRecord;

use crate::error::MirrorError;

/// Directory attributes whose full value set can be listed for
/// uniqueness checks and id allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexedAttribute {
    Username,
    Uid,
    UserSecurityIdentifier,
    GroupName,
    Gid,
    DomainName,
    DomainSecurityIdentifier,
}

/// Fields accepted when creating a user. Blank strings mean "derive it".
#[derive(Debug, Clone, Default)]
pub struct CreateUserInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Primary group gid; must reference an existing group.
    pub gid: u32,
    /// Allocated as `max + 1` (base 10000) when `None`.
    pub uid: Option<u32>,
    pub full_name: String,
    pub gecos: String,
    pub home_directory: String,
    pub login_shell: Option<String>,
    pub phone: String,
    pub mobile_phone: Option<String>,
    pub photo: Option<Vec<u8>>,
    /// Plaintext; a random secret is generated when `None`.
    pub password: Option<String>,
    /// Samba domain, required when the compatibility subsystem is enabled.
    pub domain: Option<String>,
}

impl CreateUserInput {
    pub fn new(
        username: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        gid: u32,
    ) -> Self {
        Self {
            username: username.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            gid,
            ..Default::default()
        }
    }
}

/// Partial update of a user. `None` keeps the stored value; `Some("")`
/// blanks a derived field so it is derived again.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub photo: Option<Vec<u8>>,
    pub gecos: Option<String>,
    pub home_directory: Option<String>,
    pub login_shell: Option<String>,
    pub password: Option<String>,
    pub domain: Option<String>,
    pub acct_flags: Option<String>,
}

impl UpdateUserInput {
    pub fn is_empty(&self) -> bool {
        self.uid.is_none()
            && self.gid.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.full_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.mobile_phone.is_none()
            && self.photo.is_none()
            && self.gecos.is_none()
            && self.home_directory.is_none()
            && self.login_shell.is_none()
            && self.password.is_none()
            && self.domain.is_none()
            && self.acct_flags.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateGroupInput {
    pub name: String,
    /// Allocated as `max + 1` (base 5000) when `None`.
    pub gid: Option<u32>,
    pub member_usernames: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateGroupInput {
    pub gid: Option<u32>,
    /// Replaces the whole member set when `Some`.
    pub member_usernames: Option<Vec<String>>,
}

/// How the local account store reacted to a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorOutcome {
    Created,
    Updated,
}

/// Result of a committed user save.
///
/// The directory write has happened; `mirror` says whether the local
/// account followed it.
#[derive(Debug)]
pub struct UserSaved {
    pub user: UserRecord,
    pub mirror: Result<MirrorOutcome, MirrorError>,
}

/// A password reset: the new plaintext goes back to the caller once.
#[derive(Debug)]
pub struct PasswordReset {
    pub secret: String,
    pub saved: UserSaved,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_detect_empty_update() {
        assert!(UpdateUserInput::default().is_empty());
        let clear_mobile = UpdateUserInput {
            mobile_phone: Some(String::new()),
            ..Default::default()
        };
        assert!(!clear_mobile.is_empty());
        let flags = UpdateUserInput {
            acct_flags: Some("[UX         ]".into()),
            ..Default::default()
        };
        assert!(!flags.is_empty());
    }
}

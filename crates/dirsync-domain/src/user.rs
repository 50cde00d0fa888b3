//! Directory user entries.

use serde::Serialize;

use crate::local_account::LocalAccount;

/// Default login shell for new accounts.
pub const DEFAULT_LOGIN_SHELL: &str = "/bin/bash";

/// Default Samba account flags: a normal user account.
pub const DEFAULT_ACCT_FLAGS: &str = "[U          ]";

/// Default Samba logon hours: every hour of every day.
pub const DEFAULT_LOGON_HOURS: &str = "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF";

/// A `posixAccount` + `inetOrgPerson` entry keyed by username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub username: String,
    pub uid: u32,
    /// Primary group, a reference to [`crate::group::GroupRecord::gid`].
    pub gid: u32,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub mobile_phone: Option<String>,
    #[serde(skip_serializing)]
    pub photo: Option<Vec<u8>>,
    pub gecos: String,
    pub home_directory: String,
    pub login_shell: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Present only when the compatibility subsystem is enabled.
    pub compat: Option<CompatibilityFields>,
}

impl UserRecord {
    /// A record with the required fields set and everything else blank or default.
    pub fn new(
        username: impl Into<String>,
        uid: u32,
        gid: u32,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            uid,
            gid,
            first_name: first_name.into(),
            last_name: last_name.into(),
            full_name: String::new(),
            email: email.into(),
            phone: String::new(),
            mobile_phone: None,
            photo: None,
            gecos: String::new(),
            home_directory: String::new(),
            login_shell: DEFAULT_LOGIN_SHELL.to_owned(),
            password_hash: String::new(),
            compat: None,
        }
    }

    /// The subset of fields mirrored into the local account store.
    pub fn local_account(&self) -> LocalAccount {
        LocalAccount {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Samba `sambaSamAccount` attributes.
///
/// Timestamps are unix seconds; zero means "never".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityFields {
    /// Reference to [`crate::sam_domain::DomainRecord::domain_name`].
    pub domain: String,
    pub acct_flags: String,
    #[serde(skip_serializing)]
    pub lm_password: String,
    #[serde(skip_serializing)]
    pub nt_password: String,
    /// Derived from the domain prefix and uid on every save.
    pub security_identifier: String,
    pub pwd_last_set: i64,
    pub pwd_can_change: i64,
    pub pwd_must_change: i64,
    pub logon_time: i64,
    pub logoff_time: i64,
    pub kickoff_time: i64,
    pub bad_password_count: i64,
    pub bad_password_time: i64,
    pub logon_hours: String,
}

impl CompatibilityFields {
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            acct_flags: DEFAULT_ACCT_FLAGS.to_owned(),
            lm_password: String::new(),
            nt_password: String::new(),
            security_identifier: String::new(),
            pwd_last_set: 0,
            pwd_can_change: 0,
            pwd_must_change: 0,
            logon_time: 0,
            logoff_time: 0,
            kickoff_time: 0,
            bad_password_count: 0,
            bad_password_time: 0,
            logon_hours: DEFAULT_LOGON_HOURS.to_owned(),
        }
    }
}

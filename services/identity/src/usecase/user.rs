use anyhow::Context as _;
use chrono::Utc;
use tracing::info;

use dirsync_domain::derive::fill_derived_fields;
use dirsync_domain::id::{UID_BASE, allocate_numeric_id, validate_uid};
use dirsync_domain::policy::IdentityPolicy;
use dirsync_domain::unique::{UniqueField, check_unique};
use dirsync_domain::user::{CompatibilityFields, UserRecord};
use dirsync_password::{DEFAULT_SECRET_LEN, PasswordCodec, generate_random_secret};

use crate::domain::repository::{DirectoryGateway, LocalAccountStore};
use crate::domain::types::{CreateUserInput, IndexedAttribute, UpdateUserInput, UserSaved};
use crate::error::{IdentityError, ReferenceKind};
use crate::usecase::mirror::MirrorSynchronizer;
use crate::usecase::password::apply_password;

/// Parse a numeric attribute listing.
pub(crate) async fn numeric_values<D: DirectoryGateway>(
    directory: &D,
    attribute: IndexedAttribute,
) -> Result<Vec<u32>, IdentityError> {
    directory
        .list_values(attribute)
        .await?
        .iter()
        .map(|v| {
            v.parse::<u32>()
                .with_context(|| format!("non-numeric {attribute:?} value {v:?} in directory"))
                .map_err(IdentityError::from)
        })
        .collect()
}

fn require(field: &'static str, value: &str) -> Result<(), IdentityError> {
    if value.trim().is_empty() {
        return Err(IdentityError::InvalidValue {
            field,
            reason: "this field is required".into(),
        });
    }
    Ok(())
}

/// Validate `user` and fill its derived fields: required fields, username
/// uniqueness (create only), uid allocation and reserved ranges, uid
/// uniqueness, primary group reference, then full name, gecos and home
/// directory.
///
/// Nothing is written; any error leaves the directory untouched.
pub(crate) async fn validate_user<D: DirectoryGateway>(
    directory: &D,
    policy: &IdentityPolicy,
    user: &mut UserRecord,
    previous: Option<&UserRecord>,
    requested_uid: Option<u32>,
) -> Result<(), IdentityError> {
    require("username", &user.username)?;
    require("first_name", &user.first_name)?;
    require("last_name", &user.last_name)?;
    require("email", &user.email)?;

    if previous.is_none() {
        let usernames = directory.list_values(IndexedAttribute::Username).await?;
        check_unique(UniqueField::Username, user.username.clone(), &usernames, None)?;
    }

    let uids = numeric_values(directory, IndexedAttribute::Uid).await?;
    let uid = allocate_numeric_id(UniqueField::Uid, requested_uid, &uids, UID_BASE)?;
    let uid = validate_uid(uid)?;
    user.uid = check_unique(UniqueField::Uid, uid, &uids, previous.map(|p| &p.uid))?;

    let gids = numeric_values(directory, IndexedAttribute::Gid).await?;
    if !gids.contains(&user.gid) {
        return Err(IdentityError::MissingReference {
            kind: ReferenceKind::Group,
            key: user.gid.to_string(),
        });
    }

    fill_derived_fields(user, &policy.home_template);
    Ok(())
}

/// Resolve the user's samba domain and derive a unique SID from the uid.
///
/// No-op unless the compatibility subsystem is enabled.
pub(crate) async fn bind_domain<D: DirectoryGateway>(
    directory: &D,
    policy: &IdentityPolicy,
    user: &mut UserRecord,
    previous: Option<&UserRecord>,
) -> Result<(), IdentityError> {
    if !policy.compatibility {
        return Ok(());
    }
    let uid = user.uid;
    let compat = user.compat.as_mut().ok_or_else(|| IdentityError::MissingReference {
        kind: ReferenceKind::Domain,
        key: String::new(),
    })?;
    let domain = directory
        .find_domain(&compat.domain)
        .await?
        .ok_or_else(|| IdentityError::MissingReference {
            kind: ReferenceKind::Domain,
            key: compat.domain.clone(),
        })?;
    let sids = directory
        .list_values(IndexedAttribute::UserSecurityIdentifier)
        .await?;
    let own_sid = previous
        .and_then(|p| p.compat.as_ref())
        .map(|c| &c.security_identifier);
    compat.security_identifier = check_unique(
        UniqueField::SecurityIdentifier,
        domain.security_identifier(uid),
        &sids,
        own_sid,
    )?;
    Ok(())
}

/// Attach compatibility fields for `domain`, refusing them when the subsystem is off.
fn attach_domain(
    user: &mut UserRecord,
    policy: &IdentityPolicy,
    domain: Option<String>,
) -> Result<(), IdentityError> {
    let Some(domain) = domain else {
        return Ok(());
    };
    if !policy.compatibility {
        return Err(IdentityError::InvalidValue {
            field: "domain",
            reason: "the compatibility subsystem is disabled".into(),
        });
    }
    match user.compat.as_mut() {
        Some(compat) => compat.domain = domain,
        None => user.compat = Some(CompatibilityFields::for_domain(domain)),
    }
    Ok(())
}

// ── CreateUser ───────────────────────────────────────────────────────────────

pub struct CreateUserUseCase<'a, D: DirectoryGateway, L: LocalAccountStore> {
    pub directory: &'a D,
    pub mirror: &'a MirrorSynchronizer<L>,
    pub policy: &'a IdentityPolicy,
    pub codec: PasswordCodec,
}

impl<D: DirectoryGateway, L: LocalAccountStore> CreateUserUseCase<'_, D, L> {
    pub async fn execute(&self, input: CreateUserInput) -> Result<UserSaved, IdentityError> {
        let mut user = UserRecord::new(
            input.username,
            0,
            input.gid,
            input.first_name,
            input.last_name,
            input.email,
        );
        user.full_name = input.full_name;
        user.gecos = input.gecos;
        user.home_directory = input.home_directory;
        if let Some(shell) = input.login_shell {
            user.login_shell = shell;
        }
        user.phone = input.phone;
        user.mobile_phone = input.mobile_phone;
        user.photo = input.photo;
        attach_domain(&mut user, self.policy, input.domain)?;

        validate_user(self.directory, self.policy, &mut user, None, input.uid).await?;
        let plaintext = input
            .password
            .unwrap_or_else(|| generate_random_secret(DEFAULT_SECRET_LEN));
        apply_password(&mut user, &self.codec, &plaintext, Utc::now().timestamp());
        bind_domain(self.directory, self.policy, &mut user, None).await?;

        self.directory.create_user(&user).await?;
        info!(username = %user.username, uid = user.uid, gid = user.gid, "user created");

        let mirror = self.mirror.sync(&user.local_account()).await;
        Ok(UserSaved { user, mirror })
    }
}

// ── GetUser / ListUsers ──────────────────────────────────────────────────────

pub struct GetUserUseCase<'a, D: DirectoryGateway> {
    pub directory: &'a D,
}

impl<D: DirectoryGateway> GetUserUseCase<'_, D> {
    pub async fn execute(&self, username: &str) -> Result<UserRecord, IdentityError> {
        self.directory
            .find_user(username)
            .await?
            .ok_or_else(|| IdentityError::UserNotFound(username.to_owned()))
    }
}

pub struct ListUsersUseCase<'a, D: DirectoryGateway> {
    pub directory: &'a D,
}

impl<D: DirectoryGateway> ListUsersUseCase<'_, D> {
    /// All users ordered by uid.
    pub async fn execute(&self) -> Result<Vec<UserRecord>, IdentityError> {
        let mut users = self.directory.list_users().await?;
        users.sort_by(|a, b| a.uid.cmp(&b.uid).then_with(|| a.username.cmp(&b.username)));
        Ok(users)
    }
}

// ── UpdateUser ───────────────────────────────────────────────────────────────

pub struct UpdateUserUseCase<'a, D: DirectoryGateway, L: LocalAccountStore> {
    pub directory: &'a D,
    pub mirror: &'a MirrorSynchronizer<L>,
    pub policy: &'a IdentityPolicy,
    pub codec: PasswordCodec,
}

impl<D: DirectoryGateway, L: LocalAccountStore> UpdateUserUseCase<'_, D, L> {
    /// Apply `input` to the stored user and save it through the full pipeline.
    ///
    /// An empty input still re-saves, which re-derives the SID.
    pub async fn execute(
        &self,
        username: &str,
        input: UpdateUserInput,
    ) -> Result<UserSaved, IdentityError> {
        let previous = GetUserUseCase {
            directory: self.directory,
        }
        .execute(username)
        .await?;
        let mut user = previous.clone();

        if let Some(gid) = input.gid {
            user.gid = gid;
        }
        if let Some(v) = input.first_name {
            user.first_name = v;
        }
        if let Some(v) = input.last_name {
            user.last_name = v;
        }
        if let Some(v) = input.full_name {
            user.full_name = v;
        }
        if let Some(v) = input.email {
            user.email = v;
        }
        if let Some(v) = input.phone {
            user.phone = v;
        }
        if let Some(v) = input.mobile_phone {
            user.mobile_phone = (!v.is_empty()).then_some(v);
        }
        if let Some(v) = input.photo {
            user.photo = Some(v);
        }
        if let Some(v) = input.gecos {
            user.gecos = v;
        }
        if let Some(v) = input.home_directory {
            user.home_directory = v;
        }
        if let Some(v) = input.login_shell {
            user.login_shell = v;
        }
        attach_domain(&mut user, self.policy, input.domain)?;
        if let (Some(flags), Some(compat)) = (input.acct_flags, user.compat.as_mut()) {
            compat.acct_flags = flags;
        }

        let requested_uid = input.uid.or(Some(previous.uid));
        validate_user(
            self.directory,
            self.policy,
            &mut user,
            Some(&previous),
            requested_uid,
        )
        .await?;
        if let Some(plaintext) = input.password {
            apply_password(&mut user, &self.codec, &plaintext, Utc::now().timestamp());
        }
        bind_domain(self.directory, self.policy, &mut user, Some(&previous)).await?;

        self.directory.update_user(&user).await?;
        info!(username = %user.username, uid = user.uid, gid = user.gid, "user updated");

        let mirror = self.mirror.sync(&user.local_account()).await;
        Ok(UserSaved { user, mirror })
    }
}

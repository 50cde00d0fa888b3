#![allow(async_fn_in_trait)]

use dirsync_domain::group::GroupRecord;
use dirsync_domain::local_account::LocalAccount;
use dirsync_domain::sam_domain::DomainRecord;
use dirsync_domain::user::UserRecord;

use crate::domain::types::IndexedAttribute;
use crate::error::IdentityError;

/// Persistence port for directory entries.
///
/// `create_*` must refuse to overwrite an existing key and report it as
/// [`IdentityError::DuplicateValue`]; that is the authoritative uniqueness
/// guard behind the advisory checks done before a write.
pub trait DirectoryGateway: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, IdentityError>;
    async fn list_users(&self) -> Result<Vec<UserRecord>, IdentityError>;
    async fn create_user(&self, user: &UserRecord) -> Result<(), IdentityError>;
    async fn update_user(&self, user: &UserRecord) -> Result<(), IdentityError>;

    async fn find_group(&self, name: &str) -> Result<Option<GroupRecord>, IdentityError>;
    async fn list_groups(&self) -> Result<Vec<GroupRecord>, IdentityError>;
    async fn create_group(&self, group: &GroupRecord) -> Result<(), IdentityError>;
    async fn update_group(&self, group: &GroupRecord) -> Result<(), IdentityError>;

    async fn find_domain(&self, name: &str) -> Result<Option<DomainRecord>, IdentityError>;
    async fn list_domains(&self) -> Result<Vec<DomainRecord>, IdentityError>;
    async fn create_domain(&self, domain: &DomainRecord) -> Result<(), IdentityError>;

    /// Every stored value of `attribute`, one entry per record.
    async fn list_values(&self, attribute: IndexedAttribute) -> Result<Vec<String>, IdentityError>;
}

/// Port for the secondary account table mirrored from directory users.
pub trait LocalAccountStore: Send + Sync {
    async fn find_by_username(&self, username: &str)
    -> Result<Option<LocalAccount>, IdentityError>;

    /// Insert or overwrite the account keyed by `account.username`. Idempotent.
    async fn upsert(&self, account: &LocalAccount) -> Result<(), IdentityError>;
}

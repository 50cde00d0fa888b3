use tokio::sync::Mutex;

use dirsync_domain::group::GroupRecord;
use dirsync_domain::policy::IdentityPolicy;
use dirsync_domain::sam_domain::DomainRecord;
use dirsync_domain::user::UserRecord;
use dirsync_password::PasswordCodec;

use crate::domain::repository::{DirectoryGateway, LocalAccountStore};
use crate::domain::types::{
    CreateGroupInput, CreateUserInput, MirrorOutcome, PasswordReset, UpdateGroupInput,
    UpdateUserInput, UserSaved,
};
use crate::error::IdentityError;
use crate::usecase::group::{
    CreateGroupUseCase, GetGroupUseCase, ListGroupsUseCase, UpdateGroupUseCase,
};
use crate::usecase::mirror::MirrorSynchronizer;
use crate::usecase::password::PasswordUseCase;
use crate::usecase::sam_domain::{CreateDomainUseCase, ListDomainsUseCase};
use crate::usecase::user::{
    CreateUserUseCase, GetUserUseCase, ListUsersUseCase, UpdateUserUseCase,
};

/// Entry point for every identity operation.
///
/// Writes are serialised so that id allocation, uniqueness checks and the
/// directory write happen without interleaving within one process.
pub struct IdentityService<D: DirectoryGateway, L: LocalAccountStore> {
    directory: D,
    mirror: MirrorSynchronizer<L>,
    policy: IdentityPolicy,
    codec: PasswordCodec,
    write_lock: Mutex<()>,
}

impl<D: DirectoryGateway, L: LocalAccountStore> IdentityService<D, L> {
    pub fn new(directory: D, local_accounts: L, policy: IdentityPolicy) -> Self {
        let codec = PasswordCodec::new(policy.compatibility);
        Self {
            directory,
            mirror: MirrorSynchronizer::new(local_accounts),
            policy,
            codec,
            write_lock: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> &IdentityPolicy {
        &self.policy
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn local_accounts(&self) -> &L {
        &self.mirror.store
    }

    fn update_usecase(&self) -> UpdateUserUseCase<'_, D, L> {
        UpdateUserUseCase {
            directory: &self.directory,
            mirror: &self.mirror,
            policy: &self.policy,
            codec: self.codec,
        }
    }

    fn passwords(&self) -> PasswordUseCase<'_, D, L> {
        PasswordUseCase {
            update: self.update_usecase(),
        }
    }

    // ── users ────────────────────────────────────────────────────────────────

    pub async fn create_user(&self, input: CreateUserInput) -> Result<UserSaved, IdentityError> {
        let _guard = self.write_lock.lock().await;
        CreateUserUseCase {
            directory: &self.directory,
            mirror: &self.mirror,
            policy: &self.policy,
            codec: self.codec,
        }
        .execute(input)
        .await
    }

    pub async fn update_user(
        &self,
        username: &str,
        input: UpdateUserInput,
    ) -> Result<UserSaved, IdentityError> {
        let _guard = self.write_lock.lock().await;
        self.update_usecase().execute(username, input).await
    }

    pub async fn get_user(&self, username: &str) -> Result<UserRecord, IdentityError> {
        GetUserUseCase {
            directory: &self.directory,
        }
        .execute(username)
        .await
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, IdentityError> {
        ListUsersUseCase {
            directory: &self.directory,
        }
        .execute()
        .await
    }

    /// Push the stored user into the local account store again.
    pub async fn resync_local_account(&self, username: &str) -> Result<MirrorOutcome, IdentityError> {
        let user = self.get_user(username).await?;
        self.mirror
            .sync(&user.local_account())
            .await
            .map_err(|e| e.source)
    }

    // ── passwords ────────────────────────────────────────────────────────────

    pub async fn set_password(&self, username: &str, plaintext: &str) -> Result<UserSaved, IdentityError> {
        let _guard = self.write_lock.lock().await;
        self.passwords().set(username, plaintext).await
    }

    pub async fn check_password(&self, username: &str, plaintext: &str) -> Result<bool, IdentityError> {
        self.passwords().check(username, plaintext).await
    }

    pub async fn has_usable_password(&self, username: &str) -> Result<bool, IdentityError> {
        self.passwords().has_usable(username).await
    }

    pub async fn change_password(
        &self,
        username: &str,
        current: &str,
        new: &str,
    ) -> Result<UserSaved, IdentityError> {
        let _guard = self.write_lock.lock().await;
        self.passwords().change(username, current, new).await
    }

    pub async fn reset_password(&self, username: &str) -> Result<PasswordReset, IdentityError> {
        let _guard = self.write_lock.lock().await;
        self.passwords().reset(username).await
    }

    // ── groups ───────────────────────────────────────────────────────────────

    pub async fn create_group(&self, input: CreateGroupInput) -> Result<GroupRecord, IdentityError> {
        let _guard = self.write_lock.lock().await;
        CreateGroupUseCase {
            directory: &self.directory,
        }
        .execute(input)
        .await
    }

    pub async fn update_group(
        &self,
        name: &str,
        input: UpdateGroupInput,
    ) -> Result<GroupRecord, IdentityError> {
        let _guard = self.write_lock.lock().await;
        UpdateGroupUseCase {
            directory: &self.directory,
        }
        .execute(name, input)
        .await
    }

    pub async fn add_group_member(&self, name: &str, username: &str) -> Result<GroupRecord, IdentityError> {
        let _guard = self.write_lock.lock().await;
        UpdateGroupUseCase {
            directory: &self.directory,
        }
        .add_member(name, username)
        .await
    }

    pub async fn remove_group_member(
        &self,
        name: &str,
        username: &str,
    ) -> Result<GroupRecord, IdentityError> {
        let _guard = self.write_lock.lock().await;
        UpdateGroupUseCase {
            directory: &self.directory,
        }
        .remove_member(name, username)
        .await
    }

    pub async fn get_group(&self, name: &str) -> Result<GroupRecord, IdentityError> {
        GetGroupUseCase {
            directory: &self.directory,
        }
        .execute(name)
        .await
    }

    pub async fn list_groups(&self) -> Result<Vec<GroupRecord>, IdentityError> {
        ListGroupsUseCase {
            directory: &self.directory,
        }
        .execute()
        .await
    }

    // ── samba domains ────────────────────────────────────────────────────────

    pub async fn create_domain(
        &self,
        domain_name: &str,
        security_identifier_prefix: &str,
    ) -> Result<DomainRecord, IdentityError> {
        let _guard = self.write_lock.lock().await;
        CreateDomainUseCase {
            directory: &self.directory,
            policy: &self.policy,
        }
        .execute(DomainRecord {
            domain_name: domain_name.to_owned(),
            security_identifier_prefix: security_identifier_prefix.to_owned(),
        })
        .await
    }

    pub async fn list_domains(&self) -> Result<Vec<DomainRecord>, IdentityError> {
        ListDomainsUseCase {
            directory: &self.directory,
            policy: &self.policy,
        }
        .execute()
        .await
    }
}

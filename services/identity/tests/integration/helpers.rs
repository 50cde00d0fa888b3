use std::sync::{Arc, Mutex};

use dirsync_domain::group::GroupRecord;
use dirsync_domain::local_account::LocalAccount;
use dirsync_domain::policy::IdentityPolicy;
use dirsync_domain::sam_domain::DomainRecord;
use dirsync_identity::domain::repository::LocalAccountStore;
use dirsync_identity::domain::types::CreateUserInput;
use dirsync_identity::error::IdentityError;
use dirsync_identity::infra::memory::{MemoryDirectory, MemoryLocalAccounts};
use dirsync_identity::service::IdentityService;

pub type MemoryService = IdentityService<MemoryDirectory, MemoryLocalAccounts>;

pub const STAFF_GID: u32 = 5_000;
pub const DOMAIN_PREFIX: &str = "S-1-5-21-1004336348-1177238915-682003330";

/// Service over empty in-memory adapters with a `staff` group (gid 5000).
pub fn service() -> MemoryService {
    service_with(IdentityPolicy::default())
}

/// Same as [`service`] with the compatibility subsystem on and a `STATS` domain.
pub fn compat_service() -> MemoryService {
    let service = service_with(IdentityPolicy {
        compatibility: true,
        ..Default::default()
    });
    service.directory().seed_domain(DomainRecord {
        domain_name: "STATS".into(),
        security_identifier_prefix: DOMAIN_PREFIX.into(),
    });
    service
}

pub fn service_with(policy: IdentityPolicy) -> MemoryService {
    let directory = MemoryDirectory::default();
    directory.seed_group(GroupRecord::new("staff", STAFF_GID));
    IdentityService::new(directory, MemoryLocalAccounts::default(), policy)
}

pub fn ada() -> CreateUserInput {
    CreateUserInput::new("ada", "Ada", "Lovelace", "ada@example.com", STAFF_GID)
}

pub fn user(username: &str) -> CreateUserInput {
    CreateUserInput::new(
        username,
        "Test",
        "User",
        format!("{username}@example.com"),
        STAFF_GID,
    )
}

// ── FlakyLocalAccounts ───────────────────────────────────────────────────────

/// Local account store that fails every upsert while `down` is set.
#[derive(Clone, Default)]
pub struct FlakyLocalAccounts {
    pub inner: MemoryLocalAccounts,
    pub down: Arc<Mutex<bool>>,
}

impl FlakyLocalAccounts {
    pub fn set_down(&self, down: bool) {
        *self.down.lock().unwrap() = down;
    }
}

impl LocalAccountStore for FlakyLocalAccounts {
    async fn find_by_username(&self, username: &str) -> Result<Option<LocalAccount>, IdentityError> {
        self.inner.find_by_username(username).await
    }

    async fn upsert(&self, account: &LocalAccount) -> Result<(), IdentityError> {
        if *self.down.lock().unwrap() {
            return Err(IdentityError::Backend(anyhow::anyhow!("local account table unavailable")));
        }
        self.inner.upsert(account).await
    }
}

pub fn flaky_service() -> (IdentityService<MemoryDirectory, FlakyLocalAccounts>, FlakyLocalAccounts) {
    let directory = MemoryDirectory::default();
    directory.seed_group(GroupRecord::new("staff", STAFF_GID));
    let store = FlakyLocalAccounts::default();
    let service = IdentityService::new(directory, store.clone(), IdentityPolicy::default());
    (service, store)
}

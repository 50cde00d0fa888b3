//! In-process adapters for both ports.
//!
//! They honour the same contracts as the LDAP and SQL adapters (including
//! duplicate refusal on create) and are what the test suites run against.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use dirsync_domain::group::GroupRecord;
use dirsync_domain::local_account::LocalAccount;
use dirsync_domain::sam_domain::DomainRecord;
use dirsync_domain::unique::UniqueField;
use dirsync_domain::user::UserRecord;

use crate::domain::repository::{DirectoryGateway, LocalAccountStore};
use crate::domain::types::IndexedAttribute;
use crate::error::IdentityError;

#[derive(Debug, Default)]
struct DirectoryState {
    users: BTreeMap<String, UserRecord>,
    groups: BTreeMap<String, GroupRecord>,
    domains: BTreeMap<String, DomainRecord>,
}

/// Directory kept in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl MemoryDirectory {
    fn state(&self) -> Result<MutexGuard<'_, DirectoryState>, IdentityError> {
        self.state
            .lock()
            .map_err(|_| IdentityError::Backend(anyhow::anyhow!("memory directory poisoned")))
    }

    fn seed_state(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().expect("memory directory poisoned")
    }

    /// Insert or replace a user without any validation.
    ///
    /// # Panics
    ///
    /// When an earlier holder of the state lock panicked.
    pub fn seed_user(&self, user: UserRecord) {
        self.seed_state().users.insert(user.username.clone(), user);
    }

    pub fn seed_group(&self, group: GroupRecord) {
        self.seed_state().groups.insert(group.name.clone(), group);
    }

    pub fn seed_domain(&self, domain: DomainRecord) {
        self.seed_state()
            .domains
            .insert(domain.domain_name.clone(), domain);
    }
}

fn duplicate(field: UniqueField, value: &str) -> IdentityError {
    IdentityError::DuplicateValue {
        field,
        value: value.to_owned(),
    }
}

impl DirectoryGateway for MemoryDirectory {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, IdentityError> {
        Ok(self.state()?.users.get(username).cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, IdentityError> {
        Ok(self.state()?.users.values().cloned().collect())
    }

    async fn create_user(&self, user: &UserRecord) -> Result<(), IdentityError> {
        let mut state = self.state()?;
        if state.users.contains_key(&user.username) {
            return Err(duplicate(UniqueField::Username, &user.username));
        }
        state.users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &UserRecord) -> Result<(), IdentityError> {
        let mut state = self.state()?;
        match state.users.get_mut(&user.username) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(IdentityError::UserNotFound(user.username.clone())),
        }
    }

    async fn find_group(&self, name: &str) -> Result<Option<GroupRecord>, IdentityError> {
        Ok(self.state()?.groups.get(name).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, IdentityError> {
        Ok(self.state()?.groups.values().cloned().collect())
    }

    async fn create_group(&self, group: &GroupRecord) -> Result<(), IdentityError> {
        let mut state = self.state()?;
        if state.groups.contains_key(&group.name) {
            return Err(duplicate(UniqueField::GroupName, &group.name));
        }
        state.groups.insert(group.name.clone(), group.clone());
        Ok(())
    }

    async fn update_group(&self, group: &GroupRecord) -> Result<(), IdentityError> {
        let mut state = self.state()?;
        match state.groups.get_mut(&group.name) {
            Some(stored) => {
                *stored = group.clone();
                Ok(())
            }
            None => Err(IdentityError::GroupNotFound(group.name.clone())),
        }
    }

    async fn find_domain(&self, name: &str) -> Result<Option<DomainRecord>, IdentityError> {
        Ok(self.state()?.domains.get(name).cloned())
    }

    async fn list_domains(&self) -> Result<Vec<DomainRecord>, IdentityError> {
        Ok(self.state()?.domains.values().cloned().collect())
    }

    async fn create_domain(&self, domain: &DomainRecord) -> Result<(), IdentityError> {
        let mut state = self.state()?;
        if state.domains.contains_key(&domain.domain_name) {
            return Err(duplicate(UniqueField::DomainName, &domain.domain_name));
        }
        state
            .domains
            .insert(domain.domain_name.clone(), domain.clone());
        Ok(())
    }

    async fn list_values(&self, attribute: IndexedAttribute) -> Result<Vec<String>, IdentityError> {
        let state = self.state()?;
        let values = match attribute {
            IndexedAttribute::Username => state.users.keys().cloned().collect(),
            IndexedAttribute::Uid => state.users.values().map(|u| u.uid.to_string()).collect(),
            IndexedAttribute::UserSecurityIdentifier => state
                .users
                .values()
                .filter_map(|u| u.compat.as_ref())
                .map(|c| c.security_identifier.clone())
                .filter(|sid| !sid.is_empty())
                .collect(),
            IndexedAttribute::GroupName => state.groups.keys().cloned().collect(),
            IndexedAttribute::Gid => state.groups.values().map(|g| g.gid.to_string()).collect(),
            IndexedAttribute::DomainName => state.domains.keys().cloned().collect(),
            IndexedAttribute::DomainSecurityIdentifier => state
                .domains
                .values()
                .map(|d| d.security_identifier_prefix.clone())
                .collect(),
        };
        Ok(values)
    }
}

/// Local account table kept in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocalAccounts {
    accounts: Arc<Mutex<BTreeMap<String, LocalAccount>>>,
}

impl MemoryLocalAccounts {
    fn accounts(&self) -> Result<MutexGuard<'_, BTreeMap<String, LocalAccount>>, IdentityError> {
        self.accounts
            .lock()
            .map_err(|_| IdentityError::Backend(anyhow::anyhow!("memory account store poisoned")))
    }

    /// Every stored account, ordered by username.
    pub fn snapshot(&self) -> Vec<LocalAccount> {
        self.accounts()
            .map(|accounts| accounts.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl LocalAccountStore for MemoryLocalAccounts {
    async fn find_by_username(&self, username: &str) -> Result<Option<LocalAccount>, IdentityError> {
        Ok(self.accounts()?.get(username).cloned())
    }

    async fn upsert(&self, account: &LocalAccount) -> Result<(), IdentityError> {
        self.accounts()?
            .insert(account.username.clone(), account.clone());
        Ok(())
    }
}

use tracing::{info, warn};

use dirsync_domain::local_account::LocalAccount;

use crate::domain::repository::LocalAccountStore;
use crate::domain::types::MirrorOutcome;
use crate::error::{IdentityError, MirrorError};

/// One-way projection of directory users into the local account store.
///
/// Last writer wins: names and email are overwritten without comparing.
pub struct MirrorSynchronizer<L: LocalAccountStore> {
    pub store: L,
}

impl<L: LocalAccountStore> MirrorSynchronizer<L> {
    pub fn new(store: L) -> Self {
        Self { store }
    }

    pub async fn sync(&self, account: &LocalAccount) -> Result<MirrorOutcome, MirrorError> {
        let result = self.upsert(account).await;
        match &result {
            Ok(outcome) => {
                info!(username = %account.username, outcome = ?outcome, "local account synced");
            }
            Err(e) => {
                warn!(username = %account.username, error = %e.source, "local account sync failed");
            }
        }
        result
    }

    async fn upsert(&self, account: &LocalAccount) -> Result<MirrorOutcome, MirrorError> {
        let wrap = |source: IdentityError| MirrorError {
            username: account.username.clone(),
            source,
        };
        let existing = self
            .store
            .find_by_username(&account.username)
            .await
            .map_err(wrap)?;
        self.store.upsert(account).await.map_err(wrap)?;
        Ok(match existing {
            Some(_) => MirrorOutcome::Updated,
            None => MirrorOutcome::Created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct MockStore {
        accounts: Mutex<BTreeMap<String, LocalAccount>>,
        upserts: Mutex<u32>,
        fail: bool,
    }

    impl MockStore {
        fn new(fail: bool) -> Self {
            Self {
                accounts: Mutex::new(BTreeMap::new()),
                upserts: Mutex::new(0),
                fail,
            }
        }
    }

    impl LocalAccountStore for MockStore {
        async fn find_by_username(
            &self,
            username: &str,
        ) -> Result<Option<LocalAccount>, IdentityError> {
            Ok(self.accounts.lock().unwrap().get(username).cloned())
        }

        async fn upsert(&self, account: &LocalAccount) -> Result<(), IdentityError> {
            if self.fail {
                return Err(IdentityError::Backend(anyhow::anyhow!("table locked")));
            }
            *self.upserts.lock().unwrap() += 1;
            self.accounts
                .lock()
                .unwrap()
                .insert(account.username.clone(), account.clone());
            Ok(())
        }
    }

    fn ada(last_name: &str) -> LocalAccount {
        LocalAccount {
            username: "ada".into(),
            first_name: "Ada".into(),
            last_name: last_name.into(),
            email: "ada@example.com".into(),
        }
    }

    #[tokio::test]
    async fn should_create_missing_account() {
        let mirror = MirrorSynchronizer::new(MockStore::new(false));
        let outcome = mirror.sync(&ada("Lovelace")).await.unwrap();
        assert_eq!(outcome, MirrorOutcome::Created);
        assert_eq!(*mirror.store.upserts.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn should_overwrite_existing_account() {
        let mirror = MirrorSynchronizer::new(MockStore::new(false));
        mirror.sync(&ada("Lovelace")).await.unwrap();
        let outcome = mirror.sync(&ada("Byron")).await.unwrap();
        assert_eq!(outcome, MirrorOutcome::Updated);
        let accounts = mirror.store.accounts.lock().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts["ada"].last_name, "Byron");
    }

    #[tokio::test]
    async fn should_be_idempotent() {
        let mirror = MirrorSynchronizer::new(MockStore::new(false));
        mirror.sync(&ada("Lovelace")).await.unwrap();
        mirror.sync(&ada("Lovelace")).await.unwrap();
        assert_eq!(mirror.store.accounts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_report_store_failure() {
        let mirror = MirrorSynchronizer::new(MockStore::new(true));
        let err = mirror.sync(&ada("Lovelace")).await.unwrap_err();
        assert_eq!(err.username, "ada");
        assert!(matches!(err.source, IdentityError::Backend(_)));
    }
}

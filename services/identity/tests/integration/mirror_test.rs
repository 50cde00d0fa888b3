use dirsync_identity::domain::types::{MirrorOutcome, UpdateUserInput};
use dirsync_identity::error::IdentityError;

use crate::helpers::{ada, flaky_service, service};

#[tokio::test]
async fn should_mirror_create_then_update_without_duplicate() {
    let service = service();
    let created = service.create_user(ada()).await.unwrap();
    assert_eq!(created.mirror.unwrap(), MirrorOutcome::Created);

    let accounts = service.local_accounts().snapshot();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].username, "ada");
    assert_eq!(accounts[0].first_name, "Ada");
    assert_eq!(accounts[0].last_name, "Lovelace");
    assert_eq!(accounts[0].email, "ada@example.com");

    let updated = service
        .update_user(
            "ada",
            UpdateUserInput {
                last_name: Some("Byron".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.mirror.unwrap(), MirrorOutcome::Updated);

    let accounts = service.local_accounts().snapshot();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].last_name, "Byron");
}

#[tokio::test]
async fn should_mirror_password_changes_too() {
    let service = service();
    service.create_user(ada()).await.unwrap();
    let saved = service.set_password("ada", "secret").await.unwrap();
    assert_eq!(saved.mirror.unwrap(), MirrorOutcome::Updated);
    assert_eq!(service.local_accounts().snapshot().len(), 1);
}

#[tokio::test]
async fn should_keep_directory_write_when_mirror_fails() {
    let (service, store) = flaky_service();
    store.set_down(true);

    let saved = service.create_user(ada()).await.unwrap();
    let err = saved.mirror.unwrap_err();
    assert_eq!(err.username, "ada");
    assert!(matches!(err.source, IdentityError::Backend(_)));
    assert!(service.get_user("ada").await.is_ok());
    assert!(store.inner.snapshot().is_empty());

    store.set_down(false);
    let outcome = service.resync_local_account("ada").await.unwrap();
    assert_eq!(outcome, MirrorOutcome::Created);
    assert_eq!(store.inner.snapshot().len(), 1);
}

#[tokio::test]
async fn should_report_unknown_user_on_resync() {
    let service = service();
    assert!(matches!(
        service.resync_local_account("ghost").await.unwrap_err(),
        IdentityError::UserNotFound(_)
    ));
}

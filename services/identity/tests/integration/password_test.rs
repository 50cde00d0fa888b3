use dirsync_domain::user::UserRecord;
use dirsync_identity::domain::types::CreateUserInput;
use dirsync_identity::error::IdentityError;

use crate::helpers::{ada, compat_service, service};

#[tokio::test]
async fn should_verify_only_the_stored_password() {
    let service = service();
    service
        .create_user(CreateUserInput {
            password: Some("correct horse".into()),
            ..ada()
        })
        .await
        .unwrap();

    assert!(service.has_usable_password("ada").await.unwrap());
    assert!(service.check_password("ada", "correct horse").await.unwrap());
    assert!(!service.check_password("ada", "Correct horse").await.unwrap());
}

#[tokio::test]
async fn should_generate_usable_password_on_create() {
    let service = service();
    let saved = service.create_user(ada()).await.unwrap();
    assert!(dirsync_password::is_usable(&saved.user.password_hash));
    assert!(saved.user.compat.is_none());
}

#[tokio::test]
async fn should_change_and_reset_password() {
    let service = service();
    service
        .create_user(CreateUserInput {
            password: Some("first".into()),
            ..ada()
        })
        .await
        .unwrap();

    let err = service.change_password("ada", "wrong", "second").await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidValue { field: "password", .. }));

    service.change_password("ada", "first", "second").await.unwrap();
    assert!(service.check_password("ada", "second").await.unwrap());

    let reset = service.reset_password("ada").await.unwrap();
    assert!(service.check_password("ada", &reset.secret).await.unwrap());
    assert!(!service.check_password("ada", "second").await.unwrap());
}

#[tokio::test]
async fn should_refresh_legacy_hashes_on_set() {
    let service = compat_service();
    let created = service
        .create_user(CreateUserInput {
            domain: Some("STATS".into()),
            password: Some("old".into()),
            ..ada()
        })
        .await
        .unwrap();
    let saved = service.set_password("ada", "password").await.unwrap();

    let compat = saved.user.compat.unwrap();
    assert_eq!(compat.nt_password, "8846F7EAEE8FB117AD06BDD830B7586C");
    assert_ne!(created.user.password_hash, saved.user.password_hash);
    assert!(compat.pwd_last_set >= created.user.compat.unwrap().pwd_last_set);
}

#[tokio::test]
async fn should_not_serialize_hashes() {
    let service = compat_service();
    let saved = service
        .create_user(CreateUserInput {
            domain: Some("STATS".into()),
            ..ada()
        })
        .await
        .unwrap();
    let json = serde_json::to_string(&saved.user).unwrap();
    assert!(!json.contains("{SSHA}"));
    assert!(!json.contains(&saved.user.compat.unwrap().nt_password));
}

#[tokio::test]
async fn should_reset_password_for_system_uid() {
    let service = service();
    service.directory().seed_user(UserRecord::new(
        "backup", 1_500, 5_000, "Backup", "Operator", "backup@example.com",
    ));

    let reset = service.reset_password("backup").await.unwrap();
    assert_eq!(reset.saved.user.uid, 1_500);
    assert!(service.check_password("backup", &reset.secret).await.unwrap());
    assert!(service.has_usable_password("backup").await.unwrap());
}

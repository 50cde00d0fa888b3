use std::sync::Arc;

use dirsync_domain::policy::{HomeTemplate, IdentityPolicy};
use dirsync_domain::unique::UniqueField;
use dirsync_identity::domain::types::{CreateUserInput, UpdateUserInput};
use dirsync_identity::error::{IdentityError, ReferenceKind};

use crate::helpers::{DOMAIN_PREFIX, ada, compat_service, service, service_with, user};

// ── derivations ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_derive_full_name_gecos_and_home() {
    let service = service();
    let saved = service.create_user(ada()).await.unwrap();

    assert_eq!(saved.user.full_name, "Ada Lovelace");
    assert_eq!(saved.user.gecos, "Ada Lovelace");
    assert_eq!(saved.user.home_directory, "/home/ada");
    assert_eq!(service.get_user("ada").await.unwrap(), saved.user);
}

#[tokio::test]
async fn should_ascii_fold_gecos() {
    let service = service();
    let saved = service
        .create_user(CreateUserInput::new("zoe", "Zoë", "Brontë", "zoe@example.com", 5_000))
        .await
        .unwrap();
    assert_eq!(saved.user.full_name, "Zoë Brontë");
    assert_eq!(saved.user.gecos, "Zoe Bronte");
}

#[tokio::test]
async fn should_use_configured_home_template() {
    let service = service_with(IdentityPolicy {
        home_template: HomeTemplate::new("/srv/home/{username}").unwrap(),
        compatibility: false,
    });
    let saved = service.create_user(ada()).await.unwrap();
    assert_eq!(saved.user.home_directory, "/srv/home/ada");
}

#[tokio::test]
async fn should_keep_supplied_home_directory() {
    let service = service();
    let saved = service
        .create_user(CreateUserInput {
            home_directory: "/data/ada".into(),
            ..ada()
        })
        .await
        .unwrap();
    assert_eq!(saved.user.home_directory, "/data/ada");
}

// ── uid allocation ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_allocate_uids_from_base() {
    let service = service();
    let first = service.create_user(user("u1")).await.unwrap();
    assert_eq!(first.user.uid, 10_000);

    service
        .create_user(CreateUserInput {
            uid: Some(10_010),
            ..user("u2")
        })
        .await
        .unwrap();
    let third = service.create_user(user("u3")).await.unwrap();
    assert_eq!(third.user.uid, 10_011);
}

#[tokio::test]
async fn should_reject_restricted_and_taken_uids() {
    let service = service();
    for uid in [1_999, 60_000, 65_000, 69_999] {
        let err = service
            .create_user(CreateUserInput {
                uid: Some(uid),
                ..ada()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::RestrictedRange { .. }), "uid {uid}");
    }

    service
        .create_user(CreateUserInput {
            uid: Some(70_000),
            ..ada()
        })
        .await
        .unwrap();
    let err = service
        .create_user(CreateUserInput {
            uid: Some(70_000),
            ..user("bob")
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IdentityError::DuplicateValue {
            field: UniqueField::Uid,
            ..
        }
    ));
    assert_eq!(err.to_string(), "User ID already assigned. Choose something else.");
}

#[tokio::test]
async fn should_allocate_distinct_uids_under_concurrency() {
    let service = Arc::new(service());
    let mut handles = Vec::new();
    for i in 0..16 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.create_user(user(&format!("user{i}"))).await.map(|s| s.user.uid)
        }));
    }
    let mut uids = Vec::new();
    for handle in handles {
        uids.push(handle.await.unwrap().unwrap());
    }
    uids.sort_unstable();
    uids.dedup();
    assert_eq!(uids.len(), 16);
    assert_eq!(uids.first(), Some(&10_000));
    assert_eq!(uids.last(), Some(&10_015));
}

// ── references and uniqueness ────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_duplicate_username_and_missing_group() {
    let service = service();
    service.create_user(ada()).await.unwrap();

    let err = service.create_user(ada()).await.unwrap_err();
    assert_eq!(err.field(), Some("username"));

    let err = service
        .create_user(CreateUserInput {
            gid: 9_999,
            ..user("bob")
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IdentityError::MissingReference {
            kind: ReferenceKind::Group,
            ..
        }
    ));
}

// ── updates ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_update_fields_and_rederive_blanked_ones() {
    let service = service();
    service.create_user(ada()).await.unwrap();

    let saved = service
        .update_user(
            "ada",
            UpdateUserInput {
                last_name: Some("Byron".into()),
                full_name: Some(String::new()),
                gecos: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(saved.user.uid, 10_000);
    assert_eq!(saved.user.full_name, "Ada Byron");
    assert_eq!(saved.user.gecos, "Ada Byron");
}

#[tokio::test]
async fn should_list_users_ordered_by_uid() {
    let service = service();
    service
        .create_user(CreateUserInput {
            uid: Some(30_000),
            ..user("zed")
        })
        .await
        .unwrap();
    service
        .create_user(CreateUserInput {
            uid: Some(20_000),
            ..user("amy")
        })
        .await
        .unwrap();
    let names: Vec<_> = service
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(names, vec!["amy", "zed"]);
}

// ── compatibility subsystem ──────────────────────────────────────────────────

#[tokio::test]
async fn should_fill_samba_fields_when_compatible() {
    let service = compat_service();
    let saved = service
        .create_user(CreateUserInput {
            domain: Some("STATS".into()),
            password: Some("password".into()),
            ..ada()
        })
        .await
        .unwrap();

    let compat = saved.user.compat.unwrap();
    assert_eq!(compat.security_identifier, format!("{DOMAIN_PREFIX}-21000"));
    assert_eq!(compat.acct_flags, "[U          ]");
    assert_eq!(compat.logon_hours, "F".repeat(42));
    assert_eq!(compat.nt_password, "8846F7EAEE8FB117AD06BDD830B7586C");
    assert_eq!(compat.lm_password, "E52CAC67419A9A224A3B108F3FA6CB6D");
    assert_eq!(compat.kickoff_time, 0);
}

#[tokio::test]
async fn should_rederive_sid_when_uid_changes() {
    let service = compat_service();
    service
        .create_user(CreateUserInput {
            domain: Some("STATS".into()),
            ..ada()
        })
        .await
        .unwrap();
    let saved = service
        .update_user(
            "ada",
            UpdateUserInput {
                uid: Some(10_500),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        saved.user.compat.unwrap().security_identifier,
        format!("{DOMAIN_PREFIX}-22000")
    );
}

#[tokio::test]
async fn should_require_existing_domain() {
    let service = compat_service();
    let err = service
        .create_user(CreateUserInput {
            domain: Some("NOWHERE".into()),
            ..ada()
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IdentityError::MissingReference {
            kind: ReferenceKind::Domain,
            ..
        }
    ));
    assert!(matches!(
        service.get_user("ada").await.unwrap_err(),
        IdentityError::UserNotFound(_)
    ));
}

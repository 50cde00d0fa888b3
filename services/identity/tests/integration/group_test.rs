use dirsync_domain::unique::UniqueField;
use dirsync_identity::domain::types::{CreateGroupInput, UpdateGroupInput};
use dirsync_identity::error::IdentityError;

use crate::helpers::{ada, service};

fn group(name: &str) -> CreateGroupInput {
    CreateGroupInput {
        name: name.into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn should_reject_second_group_with_same_name() {
    let service = service();
    service.create_group(group("research")).await.unwrap();
    let err = service.create_group(group("research")).await.unwrap_err();
    assert!(matches!(
        err,
        IdentityError::DuplicateValue {
            field: UniqueField::GroupName,
            ..
        }
    ));
    assert_eq!(err.to_string(), "Name already assigned. Choose something else.");
}

#[tokio::test]
async fn should_allocate_gids_after_highest() {
    let service = service();
    let research = service.create_group(group("research")).await.unwrap();
    assert_eq!(research.gid, 5_001);
    let ops = service
        .create_group(CreateGroupInput {
            gid: Some(7_000),
            ..group("ops")
        })
        .await
        .unwrap();
    assert_eq!(ops.gid, 7_000);
    let next = service.create_group(group("next")).await.unwrap();
    assert_eq!(next.gid, 7_001);

    let gids: Vec<_> = service
        .list_groups()
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.gid)
        .collect();
    assert_eq!(gids, vec![5_000, 5_001, 7_000, 7_001]);
}

#[tokio::test]
async fn should_manage_members_of_existing_users_only() {
    let service = service();
    service.create_user(ada()).await.unwrap();

    service.add_group_member("staff", "ada").await.unwrap();
    let staff = service.get_group("staff").await.unwrap();
    assert!(staff.member_usernames.contains("ada"));

    let err = service.add_group_member("staff", "ghost").await.unwrap_err();
    assert_eq!(err.kind(), "MISSING_REFERENCE");

    let staff = service.remove_group_member("staff", "ada").await.unwrap();
    assert!(staff.member_usernames.is_empty());
}

#[tokio::test]
async fn should_refuse_gid_owned_by_another_group() {
    let service = service();
    service.create_group(group("research")).await.unwrap();
    let err = service
        .update_group(
            "research",
            UpdateGroupInput {
                gid: Some(5_000),
                member_usernames: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("gid"));
}

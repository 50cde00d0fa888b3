use std::collections::BTreeSet;

use tracing::info;

use dirsync_domain::group::{GroupRecord, validate_group_name};
use dirsync_domain::id::{GID_BASE, allocate_numeric_id};
use dirsync_domain::unique::{UniqueField, check_unique};

use crate::domain::repository::DirectoryGateway;
use crate::domain::types::{CreateGroupInput, IndexedAttribute, UpdateGroupInput};
use crate::error::{IdentityError, ReferenceKind};
use crate::usecase::user::numeric_values;

async fn ensure_members_exist<'m, D: DirectoryGateway>(
    directory: &D,
    members: impl IntoIterator<Item = &'m String>,
) -> Result<(), IdentityError> {
    let usernames = directory.list_values(IndexedAttribute::Username).await?;
    for member in members {
        if !usernames.contains(member) {
            return Err(IdentityError::MissingReference {
                kind: ReferenceKind::User,
                key: member.clone(),
            });
        }
    }
    Ok(())
}

async fn assign_gid<D: DirectoryGateway>(
    directory: &D,
    requested: Option<u32>,
    current: Option<u32>,
) -> Result<u32, IdentityError> {
    let gids = numeric_values(directory, IndexedAttribute::Gid).await?;
    let gid = allocate_numeric_id(UniqueField::Gid, requested, &gids, GID_BASE)?;
    Ok(check_unique(UniqueField::Gid, gid, &gids, current.as_ref())?)
}

pub struct CreateGroupUseCase<'a, D: DirectoryGateway> {
    pub directory: &'a D,
}

impl<D: DirectoryGateway> CreateGroupUseCase<'_, D> {
    pub async fn execute(&self, input: CreateGroupInput) -> Result<GroupRecord, IdentityError> {
        let name = validate_group_name(&input.name)?.to_owned();
        let names = self.directory.list_values(IndexedAttribute::GroupName).await?;
        let name = check_unique(UniqueField::GroupName, name, &names, None)?;
        let gid = assign_gid(self.directory, input.gid, None).await?;

        let members: BTreeSet<String> = input.member_usernames.into_iter().collect();
        ensure_members_exist(self.directory, &members).await?;

        let group = GroupRecord {
            name,
            gid,
            member_usernames: members,
        };
        self.directory.create_group(&group).await?;
        info!(name = %group.name, gid = group.gid, "group created");
        Ok(group)
    }
}

pub struct GetGroupUseCase<'a, D: DirectoryGateway> {
    pub directory: &'a D,
}

impl<D: DirectoryGateway> GetGroupUseCase<'_, D> {
    pub async fn execute(&self, name: &str) -> Result<GroupRecord, IdentityError> {
        self.directory
            .find_group(name)
            .await?
            .ok_or_else(|| IdentityError::GroupNotFound(name.to_owned()))
    }
}

pub struct ListGroupsUseCase<'a, D: DirectoryGateway> {
    pub directory: &'a D,
}

impl<D: DirectoryGateway> ListGroupsUseCase<'_, D> {
    /// All groups ordered by gid.
    pub async fn execute(&self) -> Result<Vec<GroupRecord>, IdentityError> {
        let mut groups = self.directory.list_groups().await?;
        groups.sort_by(|a, b| a.gid.cmp(&b.gid).then_with(|| a.name.cmp(&b.name)));
        Ok(groups)
    }
}

pub struct UpdateGroupUseCase<'a, D: DirectoryGateway> {
    pub directory: &'a D,
}

impl<D: DirectoryGateway> UpdateGroupUseCase<'_, D> {
    pub async fn execute(
        &self,
        name: &str,
        input: UpdateGroupInput,
    ) -> Result<GroupRecord, IdentityError> {
        let mut group = GetGroupUseCase {
            directory: self.directory,
        }
        .execute(name)
        .await?;

        if input.gid.is_some() {
            group.gid = assign_gid(self.directory, input.gid, Some(group.gid)).await?;
        }
        if let Some(members) = input.member_usernames {
            let members: BTreeSet<String> = members.into_iter().collect();
            ensure_members_exist(self.directory, &members).await?;
            group.member_usernames = members;
        }

        self.directory.update_group(&group).await?;
        info!(name = %group.name, gid = group.gid, "group updated");
        Ok(group)
    }

    /// Add `username` to the group. Adding an existing member is a no-op.
    pub async fn add_member(&self, name: &str, username: &str) -> Result<GroupRecord, IdentityError> {
        let mut group = GetGroupUseCase {
            directory: self.directory,
        }
        .execute(name)
        .await?;
        if group.member_usernames.contains(username) {
            return Ok(group);
        }
        let member = username.to_owned();
        ensure_members_exist(self.directory, [&member]).await?;
        group.member_usernames.insert(member);
        self.directory.update_group(&group).await?;
        info!(name = %group.name, member = username, "group member added");
        Ok(group)
    }

    /// Remove `username` from the group. Removing a non-member is a no-op.
    pub async fn remove_member(
        &self,
        name: &str,
        username: &str,
    ) -> Result<GroupRecord, IdentityError> {
        let mut group = GetGroupUseCase {
            directory: self.directory,
        }
        .execute(name)
        .await?;
        if group.member_usernames.remove(username) {
            self.directory.update_group(&group).await?;
            info!(name = %group.name, member = username, "group member removed");
        }
        Ok(group)
    }
}

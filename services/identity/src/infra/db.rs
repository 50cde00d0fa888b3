use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    sea_query::OnConflict,
};
use uuid::Uuid;

use dirsync_domain::local_account::LocalAccount;
use dirsync_identity_schema::local_accounts;

use crate::domain::repository::LocalAccountStore;
use crate::error::IdentityError;

#[derive(Clone)]
pub struct DbLocalAccountStore {
    pub db: DatabaseConnection,
}

impl LocalAccountStore for DbLocalAccountStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<LocalAccount>, IdentityError> {
        let model = local_accounts::Entity::find()
            .filter(local_accounts::Column::Username.eq(username))
            .one(&self.db)
            .await
            .context("find local account by username")?;
        Ok(model.map(local_account_from_model))
    }

    async fn upsert(&self, account: &LocalAccount) -> Result<(), IdentityError> {
        let now = Utc::now();
        let model = local_accounts::ActiveModel {
            id: Set(Uuid::now_v7()),
            username: Set(account.username.clone()),
            first_name: Set(account.first_name.clone()),
            last_name: Set(account.last_name.clone()),
            email: Set(account.email.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        local_accounts::Entity::insert(model)
            .on_conflict(
                OnConflict::column(local_accounts::Column::Username)
                    .update_columns([
                        local_accounts::Column::FirstName,
                        local_accounts::Column::LastName,
                        local_accounts::Column::Email,
                        local_accounts::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("upsert local account")?;
        Ok(())
    }
}

fn local_account_from_model(model: local_accounts::Model) -> LocalAccount {
    LocalAccount {
        username: model.username,
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
    }
}

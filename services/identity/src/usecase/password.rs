use chrono::Utc;
use tracing::{info, warn};

use dirsync_domain::user::UserRecord;
use dirsync_password::{DEFAULT_SECRET_LEN, PasswordCodec, generate_random_secret};

use crate::domain::repository::{DirectoryGateway, LocalAccountStore};
use crate::domain::types::{PasswordReset, UserSaved};
use crate::error::IdentityError;
use crate::usecase::user::{GetUserUseCase, UpdateUserUseCase, bind_domain};

/// Store every encoded form of `plaintext` on `user`.
///
/// Legacy hashes and `pwd_last_set` are only touched when the user carries
/// compatibility fields and the codec produced legacy hashes.
pub(crate) fn apply_password(user: &mut UserRecord, codec: &PasswordCodec, plaintext: &str, now: i64) {
    let encoded = codec.encode(plaintext);
    user.password_hash = encoded.primary;
    if let (Some(legacy), Some(compat)) = (encoded.legacy, user.compat.as_mut()) {
        compat.lm_password = legacy.lm;
        compat.nt_password = legacy.nt;
        compat.pwd_last_set = now;
    }
}

/// Password operations.
///
/// Writes store the new hashes on the user as found in the directory. Field
/// validation is not re-run, so entries created outside this service (system
/// uids, dangling primary groups) can still have their password set.
pub struct PasswordUseCase<'a, D: DirectoryGateway, L: LocalAccountStore> {
    pub update: UpdateUserUseCase<'a, D, L>,
}

impl<D: DirectoryGateway, L: LocalAccountStore> PasswordUseCase<'_, D, L> {
    async fn stored_hash(&self, username: &str) -> Result<(UserRecord, PasswordCodec), IdentityError> {
        let user = GetUserUseCase {
            directory: self.update.directory,
        }
        .execute(username)
        .await?;
        Ok((user, self.update.codec))
    }

    /// Replace the password and save the user.
    ///
    /// Samba users get their SID derived again from the stored uid.
    pub async fn set(&self, username: &str, plaintext: &str) -> Result<UserSaved, IdentityError> {
        let (previous, codec) = self.stored_hash(username).await?;
        let mut user = previous.clone();
        apply_password(&mut user, &codec, plaintext, Utc::now().timestamp());
        if user.compat.is_some() {
            bind_domain(self.update.directory, self.update.policy, &mut user, Some(&previous))
                .await?;
        }

        self.update.directory.update_user(&user).await?;
        info!(username, "password changed");

        let mirror = self.update.mirror.sync(&user.local_account()).await;
        Ok(UserSaved { user, mirror })
    }

    /// Verify `plaintext` against the stored primary hash.
    ///
    /// A stored value that is not a usable hash is an error, not a mismatch.
    pub async fn check(&self, username: &str, plaintext: &str) -> Result<bool, IdentityError> {
        let (user, codec) = self.stored_hash(username).await?;
        if !codec.is_usable(&user.password_hash) {
            return Err(IdentityError::MalformedHash {
                username: username.to_owned(),
            });
        }
        let ok = codec.verify(plaintext, &user.password_hash);
        if !ok {
            warn!(username, "password check failed");
        }
        Ok(ok)
    }

    pub async fn has_usable(&self, username: &str) -> Result<bool, IdentityError> {
        let (user, codec) = self.stored_hash(username).await?;
        Ok(codec.is_usable(&user.password_hash))
    }

    /// Set a new password after proving knowledge of the current one.
    pub async fn change(
        &self,
        username: &str,
        current: &str,
        new: &str,
    ) -> Result<UserSaved, IdentityError> {
        if !self.check(username, current).await? {
            return Err(IdentityError::InvalidValue {
                field: "password",
                reason: "current password does not match".into(),
            });
        }
        self.set(username, new).await
    }

    /// Replace the password with a generated secret, returned once.
    pub async fn reset(&self, username: &str) -> Result<PasswordReset, IdentityError> {
        let secret = generate_random_secret(DEFAULT_SECRET_LEN);
        let saved = self.set(username, &secret).await?;
        Ok(PasswordReset { secret, saved })
    }
}

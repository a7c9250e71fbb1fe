use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::config::SecurityConfig;
use crate::constants::auth::TOKEN_BYTES;
use crate::db::is_unique_violation;
use crate::entities::{auth_tokens, prelude::*, users};
use crate::models::NewUser;

/// Result of a registration insert.
#[derive(Debug)]
pub enum CreateUser {
    Created(users::Model),
    EmailTaken,
    UsernameTaken,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        Users::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    pub async fn get_by_ids(&self, ids: &[i32]) -> Result<Vec<users::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Users::find()
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("Failed to query users by ID")
    }

    pub async fn list(&self) -> Result<Vec<users::Model>> {
        Users::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")
    }

    async fn taken(&self, user: &NewUser) -> Result<Option<CreateUser>> {
        if self.get_by_email(&user.email).await?.is_some() {
            return Ok(Some(CreateUser::EmailTaken));
        }

        let by_username = Users::find()
            .filter(users::Column::Username.eq(user.username.as_str()))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(by_username.map(|_| CreateUser::UsernameTaken))
    }

    /// Inserts a user with an already computed password hash.
    pub async fn create(&self, user: &NewUser, password_hash: String) -> Result<CreateUser> {
        if let Some(conflict) = self.taken(user).await? {
            return Ok(conflict);
        }

        let active = users::ActiveModel {
            email: Set(user.email.clone()),
            username: Set(user.username.clone()),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            password_hash: Set(password_hash),
            date_joined: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(CreateUser::Created(model)),
            Err(e) if is_unique_violation(&e) => Ok(self
                .taken(user)
                .await?
                .unwrap_or(CreateUser::EmailTaken)),
            Err(e) => Err(e).context("Failed to insert user"),
        }
    }

    pub async fn update_password_hash(&self, user_id: i32, password_hash: String) -> Result<()> {
        let user = Users::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Returns the user's token, creating one when none exists.
    pub async fn issue_token(&self, user_id: i32) -> Result<String> {
        if let Some(existing) = self.token_for_user(user_id).await? {
            return Ok(existing.key);
        }

        let key = generate_token();
        let token = auth_tokens::ActiveModel {
            key: Set(key.clone()),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        match AuthTokens::insert(token).exec(&self.conn).await {
            Ok(_) => Ok(key),
            // A concurrent login won the race for this user
            Err(e) if is_unique_violation(&e) => self
                .token_for_user(user_id)
                .await?
                .map(|t| t.key)
                .ok_or_else(|| anyhow::anyhow!("Token for user {user_id} disappeared")),
            Err(e) => Err(e).context("Failed to insert auth token"),
        }
    }

    async fn token_for_user(&self, user_id: i32) -> Result<Option<auth_tokens::Model>> {
        AuthTokens::find()
            .filter(auth_tokens::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query auth token")
    }

    pub async fn user_by_token(&self, key: &str) -> Result<Option<users::Model>> {
        let found = AuthTokens::find_by_id(key.to_string())
            .find_also_related(Users)
            .one(&self.conn)
            .await
            .context("Failed to query user by token")?;

        Ok(found.and_then(|(_, user)| user))
    }

    pub async fn revoke_tokens(&self, user_id: i32) -> Result<()> {
        AuthTokens::delete_many()
            .filter(auth_tokens::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete auth token")?;
        Ok(())
    }
}

/// Hash a password using Argon2id with the configured cost parameters.
/// CPU-bound; call it from `spawn_blocking`.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored PHC hash string. The parameters are
/// read from the hash itself.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate a random token key (40 character hex string)
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; TOKEN_BYTES] = rng.random();

    bytes
        .iter()
        .fold(String::with_capacity(TOKEN_BYTES * 2), |mut acc, b| {
            use std::fmt::Write;
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_params() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        }
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse", &cheap_params()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify_password("anything", "not-a-hash").is_err());
    }
}

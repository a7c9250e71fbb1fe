//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::{self, CreateUser, Store};
use crate::entities::users;
use crate::models::{
    AuthUser, FieldErrors, LoginInput, RegistrationInput, SetPasswordInput, Subscription,
    UserProfile, Viewer,
};
use crate::services::user_service::{UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn profiles(
        &self,
        viewer: &Viewer,
        users: Vec<users::Model>,
    ) -> Result<Vec<UserProfile>, UserError> {
        let followed = match viewer.id() {
            Some(viewer_id) => {
                let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
                self.store.followed_among(viewer_id, &ids).await?
            }
            None => HashSet::new(),
        };

        Ok(users
            .into_iter()
            .map(|u| {
                let is_subscribed = followed.contains(&u.id);
                UserProfile::from_model(u, is_subscribed)
            })
            .collect())
    }

    /// Builds subscription views for `authors`, keeping their order.
    async fn subscription_views(
        &self,
        authors: Vec<users::Model>,
        recipes_limit: Option<usize>,
    ) -> Result<Vec<Subscription>, UserError> {
        let ids: Vec<i32> = authors.iter().map(|a| a.id).collect();
        let mut recipes = self.store.recipes_by_authors(&ids, recipes_limit).await?;

        Ok(authors
            .into_iter()
            .map(|author| {
                let entry = recipes.remove(&author.id).unwrap_or_default();
                Subscription {
                    author: UserProfile::from_model(author, true),
                    recipes: entry.recipes,
                    recipes_count: entry.count,
                }
            })
            .collect())
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(&self, input: RegistrationInput) -> Result<UserProfile, UserError> {
        let user = input.validate()?;
        let hash = db::hash_password(user.password.clone(), &self.security).await?;

        match self.store.create_user(&user, hash).await? {
            CreateUser::Created(model) => {
                info!(user_id = model.id, username = %model.username, "User registered");
                Ok(UserProfile::from_model(model, false))
            }
            CreateUser::EmailTaken => Err(UserError::Validation(FieldErrors::single(
                "email",
                "A user with that email already exists.",
            ))),
            CreateUser::UsernameTaken => Err(UserError::Validation(FieldErrors::single(
                "username",
                "A user with that username already exists.",
            ))),
        }
    }

    async fn login(&self, input: LoginInput) -> Result<String, UserError> {
        let (email, password) = input.validate()?;

        let Some(user) = self.store.get_user_by_email(&email).await? else {
            return Err(UserError::InvalidCredentials);
        };

        if !db::verify_password(password, user.password_hash.clone()).await? {
            return Err(UserError::InvalidCredentials);
        }

        Ok(self.store.issue_token(user.id).await?)
    }

    async fn logout(&self, user: &AuthUser) -> Result<(), UserError> {
        self.store.revoke_tokens(user.id).await?;
        Ok(())
    }

    async fn authenticate(&self, token: &str) -> Result<Option<AuthUser>, UserError> {
        let user = self.store.user_by_token(token).await?;
        Ok(user.map(AuthUser::from))
    }

    async fn list(&self, viewer: &Viewer) -> Result<Vec<UserProfile>, UserError> {
        let users = self.store.list_users().await?;
        self.profiles(viewer, users).await
    }

    async fn get(&self, viewer: &Viewer, id: i32) -> Result<UserProfile, UserError> {
        let user = self.store.get_user(id).await?.ok_or(UserError::NotFound)?;
        self.profiles(viewer, vec![user])
            .await?
            .pop()
            .ok_or(UserError::NotFound)
    }

    async fn set_password(
        &self,
        user: &AuthUser,
        input: SetPasswordInput,
    ) -> Result<(), UserError> {
        let (current, new) = input.validate()?;

        let stored = self
            .store
            .get_user(user.id)
            .await?
            .ok_or(UserError::NotFound)?;

        if !db::verify_password(current, stored.password_hash).await? {
            return Err(UserError::Validation(FieldErrors::single(
                "current_password",
                "Wrong password.",
            )));
        }

        let hash = db::hash_password(new, &self.security).await?;
        self.store.update_user_password_hash(user.id, hash).await?;

        info!(user_id = user.id, "Password changed");
        Ok(())
    }

    async fn subscribe(
        &self,
        user: &AuthUser,
        author_id: i32,
        recipes_limit: Option<usize>,
    ) -> Result<Subscription, UserError> {
        let author = self
            .store
            .get_user(author_id)
            .await?
            .ok_or(UserError::NotFound)?;

        if author.id == user.id {
            return Err(UserError::SelfFollow);
        }

        if !self.store.follow(user.id, author.id).await? {
            return Err(UserError::AlreadySubscribed);
        }

        self.subscription_views(vec![author], recipes_limit)
            .await?
            .pop()
            .ok_or(UserError::NotFound)
    }

    async fn unsubscribe(&self, user: &AuthUser, author_id: i32) -> Result<(), UserError> {
        if self.store.get_user(author_id).await?.is_none() {
            return Err(UserError::NotFound);
        }

        if !self.store.unfollow(user.id, author_id).await? {
            return Err(UserError::NotSubscribed);
        }

        Ok(())
    }

    async fn subscriptions(
        &self,
        user: &AuthUser,
        recipes_limit: Option<usize>,
    ) -> Result<Vec<Subscription>, UserError> {
        let author_ids = self.store.followed_authors(user.id).await?;

        let mut by_id: HashMap<i32, users::Model> = self
            .store
            .get_users_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let authors: Vec<users::Model> = author_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();

        self.subscription_views(authors, recipes_limit).await
    }
}

//! Domain service for accounts, tokens and subscriptions.

use thiserror::Error;

use crate::models::{
    AuthUser, FieldErrors, LoginInput, RegistrationInput, SetPasswordInput, Subscription,
    UserProfile, Viewer,
};

/// Errors specific to user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Unable to log in with provided credentials")]
    InvalidCredentials,

    #[error("You cannot subscribe to yourself")]
    SelfFollow,

    #[error("You are already subscribed to this user")]
    AlreadySubscribed,

    #[error("You are not subscribed to this user")]
    NotSubscribed,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<FieldErrors> for UserError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Domain service trait for users.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Validation`] for bad fields or a taken email or
    /// username.
    async fn register(&self, input: RegistrationInput) -> Result<UserProfile, UserError>;

    /// Verifies credentials and returns the user's token, issuing one if
    /// needed.
    async fn login(&self, input: LoginInput) -> Result<String, UserError>;

    async fn logout(&self, user: &AuthUser) -> Result<(), UserError>;

    /// Resolves a token key to its user.
    async fn authenticate(&self, token: &str) -> Result<Option<AuthUser>, UserError>;

    async fn list(&self, viewer: &Viewer) -> Result<Vec<UserProfile>, UserError>;

    async fn get(&self, viewer: &Viewer, id: i32) -> Result<UserProfile, UserError>;

    async fn set_password(
        &self,
        user: &AuthUser,
        input: SetPasswordInput,
    ) -> Result<(), UserError>;

    /// Follows `author_id` and returns the subscription view of the author.
    async fn subscribe(
        &self,
        user: &AuthUser,
        author_id: i32,
        recipes_limit: Option<usize>,
    ) -> Result<Subscription, UserError>;

    async fn unsubscribe(&self, user: &AuthUser, author_id: i32) -> Result<(), UserError>;

    /// Followed authors, oldest follow first.
    async fn subscriptions(
        &self,
        user: &AuthUser,
        recipes_limit: Option<usize>,
    ) -> Result<Vec<Subscription>, UserError>;
}

//! Domain service for recipes, favorites, the shopping cart and the
//! shopping-list download.

use thiserror::Error;

use crate::models::{
    AuthUser, FieldErrors, RecipeCollection, RecipeDetails, RecipeFilter, RecipeInput,
    RecipeSummary, Viewer,
};

/// Errors specific to recipe operations.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Recipe not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Only the author may change this recipe")]
    Forbidden,

    #[error("Recipe is already in your {0}")]
    AlreadyInCollection(RecipeCollection),

    #[error("Recipe is not in your {0}")]
    NotInCollection(RecipeCollection),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RecipeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<FieldErrors> for RecipeError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Domain service trait for recipes.
#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    /// Lists recipes newest first, annotated for the viewer.
    async fn list(
        &self,
        viewer: &Viewer,
        filter: &RecipeFilter,
    ) -> Result<Vec<RecipeDetails>, RecipeError>;

    async fn get(&self, viewer: &Viewer, id: i32) -> Result<RecipeDetails, RecipeError>;

    /// Validates and stores a recipe with its ingredients and tags.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::Validation`] for bad fields or unknown
    /// ingredient/tag ids; nothing is written in that case.
    async fn create(
        &self,
        author: &AuthUser,
        input: RecipeInput,
    ) -> Result<RecipeDetails, RecipeError>;

    /// Updates scalar fields and replaces ingredients and tags.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::Forbidden`] when `user` is not the author.
    async fn update(
        &self,
        user: &AuthUser,
        id: i32,
        input: RecipeInput,
    ) -> Result<RecipeDetails, RecipeError>;

    async fn delete(&self, user: &AuthUser, id: i32) -> Result<(), RecipeError>;

    /// Adds a recipe to the user's favorites or cart.
    async fn add_to_collection(
        &self,
        user: &AuthUser,
        collection: RecipeCollection,
        id: i32,
    ) -> Result<RecipeSummary, RecipeError>;

    async fn remove_from_collection(
        &self,
        user: &AuthUser,
        collection: RecipeCollection,
        id: i32,
    ) -> Result<(), RecipeError>;

    /// Renders the aggregated shopping list for the user's cart.
    async fn shopping_list(&self, user: &AuthUser) -> Result<String, RecipeError>;
}

//! `SeaORM` implementation of the `RecipeService` trait.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::db::{MissingReferences, RecipeRow, Store, WriteOutcome};
use crate::models::{
    AuthUser, FieldErrors, RecipeCollection, RecipeDetails, RecipeFilter, RecipeInput,
    RecipeSummary, UserProfile, Viewer, shopping_list,
};
use crate::services::recipe_service::{RecipeError, RecipeService};

pub struct SeaOrmRecipeService {
    store: Store,
}

impl SeaOrmRecipeService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Batch-loads tags, ingredient lines, authors and the viewer's follow
    /// flags for a page of rows.
    async fn assemble(
        &self,
        viewer: &Viewer,
        rows: Vec<RecipeRow>,
    ) -> Result<Vec<RecipeDetails>, RecipeError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let author_ids: Vec<i32> = rows
            .iter()
            .map(|r| r.author_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let mut tags = self.store.tags_for_recipes(&recipe_ids).await?;
        let mut ingredients = self.store.ingredients_for_recipes(&recipe_ids).await?;
        let authors: HashMap<i32, _> = self
            .store
            .get_users_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let followed = match viewer.id() {
            Some(viewer_id) => self.store.followed_among(viewer_id, &author_ids).await?,
            None => HashSet::new(),
        };

        rows.into_iter()
            .map(|row| {
                let author = authors.get(&row.author_id).cloned().ok_or_else(|| {
                    RecipeError::Internal(format!(
                        "Author {} of recipe {} missing",
                        row.author_id, row.id
                    ))
                })?;
                let is_subscribed = followed.contains(&row.author_id);

                Ok(RecipeDetails {
                    id: row.id,
                    author: UserProfile::from_model(author, is_subscribed),
                    tags: tags.remove(&row.id).unwrap_or_default(),
                    ingredients: ingredients.remove(&row.id).unwrap_or_default(),
                    name: row.name,
                    text: row.text,
                    image: row.image,
                    cooking_time: row.cooking_time,
                    pub_date: row.pub_date,
                    is_favorited: row.is_favorited,
                    is_in_shopping_cart: row.is_in_shopping_cart,
                })
            })
            .collect()
    }

    /// Loads the recipe's author and checks it against `user`.
    async fn authorize(&self, user: &AuthUser, id: i32) -> Result<(), RecipeError> {
        let author_id = self
            .store
            .recipe_author(id)
            .await?
            .ok_or(RecipeError::NotFound)?;

        if author_id != user.id {
            return Err(RecipeError::Forbidden);
        }
        Ok(())
    }
}

fn missing_to_field_errors(missing: &MissingReferences) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for id in &missing.ingredients {
        errors.add("ingredients", format!("Ingredient {id} does not exist."));
    }
    for id in &missing.tags {
        errors.add("tags", format!("Tag {id} does not exist."));
    }
    errors
}

#[async_trait]
impl RecipeService for SeaOrmRecipeService {
    async fn list(
        &self,
        viewer: &Viewer,
        filter: &RecipeFilter,
    ) -> Result<Vec<RecipeDetails>, RecipeError> {
        let rows = self.store.list_recipes(viewer.id(), filter).await?;
        self.assemble(viewer, rows).await
    }

    async fn get(&self, viewer: &Viewer, id: i32) -> Result<RecipeDetails, RecipeError> {
        let row = self
            .store
            .get_recipe(viewer.id(), id)
            .await?
            .ok_or(RecipeError::NotFound)?;

        self.assemble(viewer, vec![row])
            .await?
            .pop()
            .ok_or(RecipeError::NotFound)
    }

    async fn create(
        &self,
        author: &AuthUser,
        input: RecipeInput,
    ) -> Result<RecipeDetails, RecipeError> {
        let draft = input.validate_create()?;

        let id = match self.store.create_recipe(author.id, &draft).await? {
            WriteOutcome::Written(id) => id,
            WriteOutcome::MissingReferences(missing) => {
                return Err(RecipeError::Validation(missing_to_field_errors(&missing)));
            }
            WriteOutcome::NotFound => return Err(RecipeError::NotFound),
        };

        info!(recipe_id = id, author_id = author.id, "Recipe created");
        self.get(&Viewer::User(author.clone()), id).await
    }

    async fn update(
        &self,
        user: &AuthUser,
        id: i32,
        input: RecipeInput,
    ) -> Result<RecipeDetails, RecipeError> {
        self.authorize(user, id).await?;
        let patch = input.validate_update()?;

        match self.store.update_recipe(id, &patch).await? {
            WriteOutcome::Written(()) => {}
            WriteOutcome::MissingReferences(missing) => {
                return Err(RecipeError::Validation(missing_to_field_errors(&missing)));
            }
            WriteOutcome::NotFound => return Err(RecipeError::NotFound),
        }

        info!(recipe_id = id, author_id = user.id, "Recipe updated");
        self.get(&Viewer::User(user.clone()), id).await
    }

    async fn delete(&self, user: &AuthUser, id: i32) -> Result<(), RecipeError> {
        self.authorize(user, id).await?;

        if !self.store.delete_recipe(id).await? {
            return Err(RecipeError::NotFound);
        }

        info!(recipe_id = id, author_id = user.id, "Recipe deleted");
        Ok(())
    }

    async fn add_to_collection(
        &self,
        user: &AuthUser,
        collection: RecipeCollection,
        id: i32,
    ) -> Result<RecipeSummary, RecipeError> {
        let summary = self
            .store
            .recipe_summary(id)
            .await?
            .ok_or(RecipeError::NotFound)?;

        if !self.store.add_to_collection(collection, user.id, id).await? {
            return Err(RecipeError::AlreadyInCollection(collection));
        }

        Ok(summary)
    }

    async fn remove_from_collection(
        &self,
        user: &AuthUser,
        collection: RecipeCollection,
        id: i32,
    ) -> Result<(), RecipeError> {
        if self.store.recipe_author(id).await?.is_none() {
            return Err(RecipeError::NotFound);
        }

        if !self
            .store
            .remove_from_collection(collection, user.id, id)
            .await?
        {
            return Err(RecipeError::NotInCollection(collection));
        }

        Ok(())
    }

    async fn shopping_list(&self, user: &AuthUser) -> Result<String, RecipeError> {
        let lines = self.store.shopping_list(user.id).await?;
        Ok(shopping_list::render(&lines))
    }
}

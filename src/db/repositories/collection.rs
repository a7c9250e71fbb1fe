use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::db::{is_unique_violation, timestamp};
use crate::entities::{favorites, prelude::*, shopping_cart};
use crate::models::RecipeCollection;

/// Favorites and shopping cart: per-user sets of recipes keyed by the
/// composite (user, recipe) primary key.
pub struct CollectionRepository {
    conn: DatabaseConnection,
}

impl CollectionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns `false` when the pair was already present.
    pub async fn add(
        &self,
        collection: RecipeCollection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool> {
        let created_at = timestamp();
        let result = match collection {
            RecipeCollection::Favorites => {
                Favorites::insert(favorites::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                    created_at: Set(created_at),
                })
                .exec_without_returning(&self.conn)
                .await
            }
            RecipeCollection::ShoppingCart => {
                ShoppingCart::insert(shopping_cart::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                    created_at: Set(created_at),
                })
                .exec_without_returning(&self.conn)
                .await
            }
        };

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to add recipe to {collection}")),
        }
    }

    /// Returns `false` when there was nothing to remove.
    pub async fn remove(
        &self,
        collection: RecipeCollection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool> {
        let result = match collection {
            RecipeCollection::Favorites => {
                Favorites::delete_many()
                    .filter(favorites::Column::UserId.eq(user_id))
                    .filter(favorites::Column::RecipeId.eq(recipe_id))
                    .exec(&self.conn)
                    .await
            }
            RecipeCollection::ShoppingCart => {
                ShoppingCart::delete_many()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                    .exec(&self.conn)
                    .await
            }
        }
        .with_context(|| format!("Failed to remove recipe from {collection}"))?;

        Ok(result.rows_affected > 0)
    }
}

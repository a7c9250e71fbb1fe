use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};

use crate::entities::{ingredients, prelude::*, recipe_ingredients, recipes, shopping_cart};
use crate::models::ShoppingListLine;

pub struct ShoppingListRepository {
    conn: DatabaseConnection,
}

impl ShoppingListRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Sums ingredient amounts across every recipe in `user_id`'s cart,
    /// one line per (name, unit), ordered by name then unit.
    pub async fn aggregate(&self, user_id: i32) -> Result<Vec<ShoppingListLine>> {
        ShoppingCart::find()
            .select_only()
            .column_as(ingredients::Column::Name, "name")
            .column_as(ingredients::Column::MeasurementUnit, "measurement_unit")
            .column_as(recipe_ingredients::Column::Amount.sum(), "total")
            .join(JoinType::InnerJoin, shopping_cart::Relation::Recipe.def())
            .join(JoinType::InnerJoin, recipes::Relation::RecipeIngredients.def())
            .join(
                JoinType::InnerJoin,
                recipe_ingredients::Relation::Ingredient.def(),
            )
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .group_by(ingredients::Column::Name)
            .group_by(ingredients::Column::MeasurementUnit)
            .order_by_asc(ingredients::Column::Name)
            .order_by_asc(ingredients::Column::MeasurementUnit)
            .into_model::<ShoppingListLine>()
            .all(&self.conn)
            .await
            .context("Failed to aggregate shopping list")
    }
}

use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::db::is_unique_violation;
use crate::entities::{ingredients, prelude::*};

pub struct IngredientRepository {
    conn: DatabaseConnection,
}

impl IngredientRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Lists ingredients in id order, optionally narrowed to names starting
    /// with `prefix`, ignoring case in any script.
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<ingredients::Model>> {
        let mut query = Ingredients::find();
        if let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) {
            query = query.filter(
                Expr::col((Ingredients, ingredients::Column::NameLower))
                    .like(LikeExpr::new(prefix_pattern(prefix)).escape(LIKE_ESCAPE)),
            );
        }

        query
            .order_by_asc(ingredients::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list ingredients")
    }

    pub async fn get(&self, id: i32) -> Result<Option<ingredients::Model>> {
        Ingredients::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query ingredient")
    }

    /// Returns `None` when the (name, unit) pair already exists.
    pub async fn create(
        &self,
        name: &str,
        measurement_unit: &str,
    ) -> Result<Option<ingredients::Model>> {
        let active = ingredients::ActiveModel {
            name: Set(name.to_string()),
            measurement_unit: Set(measurement_unit.to_string()),
            name_lower: Set(name.to_lowercase()),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(model)),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e).context("Failed to insert ingredient"),
        }
    }
}

const LIKE_ESCAPE: char = '\\';

/// `LIKE` pattern matching values that start with `prefix`, lowercased and
/// with its wildcard characters taken literally.
fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.to_lowercase().chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

use anyhow::Result;
use sea_orm::sea_query::{Expr, Query, SelectStatement, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    TransactionTrait,
};
use std::collections::{HashMap, HashSet};

use crate::entities::{
    favorites, ingredients, prelude::*, recipe_ingredients, recipe_tags, recipes, shopping_cart,
    tags,
};
use crate::models::{
    IngredientAmount, RecipeCollection, RecipeDraft, RecipeFilter, RecipeIngredientLine,
    RecipePatch, RecipeSummary,
};

/// A recipe row with the viewer's favorite and cart flags already resolved.
#[derive(Debug, Clone, FromQueryResult)]
pub struct RecipeRow {
    pub id: i32,
    pub author_id: i32,
    pub name: String,
    pub text: String,
    pub image: Option<String>,
    pub cooking_time: i32,
    pub pub_date: String,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// Referenced ids that do not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingReferences {
    pub ingredients: Vec<i32>,
    pub tags: Vec<i32>,
}

impl MissingReferences {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty() && self.tags.is_empty()
    }
}

#[derive(Debug)]
pub enum WriteOutcome<T> {
    Written(T),
    NotFound,
    MissingReferences(MissingReferences),
}

#[derive(Debug, FromQueryResult)]
struct RecipeTagRow {
    recipe_id: i32,
    id: i32,
    name: String,
    color: String,
    slug: String,
}

#[derive(Debug, FromQueryResult)]
struct RecipeIngredientRow {
    recipe_id: i32,
    id: i32,
    name: String,
    measurement_unit: String,
    amount: i32,
}

#[derive(Debug, FromQueryResult)]
struct PreviewRow {
    id: i32,
    author_id: i32,
    name: String,
    image: Option<String>,
    cooking_time: i32,
}

/// Total recipe count for an author plus the newest few.
#[derive(Debug, Clone, Default)]
pub struct AuthorRecipes {
    pub count: u64,
    pub recipes: Vec<RecipeSummary>,
}

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    fn annotated(viewer_id: Option<i32>) -> Select<Recipes> {
        Recipes::find()
            .select_only()
            .columns([
                recipes::Column::Id,
                recipes::Column::AuthorId,
                recipes::Column::Name,
                recipes::Column::Text,
                recipes::Column::Image,
                recipes::Column::CookingTime,
                recipes::Column::PubDate,
            ])
            .column_as(
                viewer_flag(RecipeCollection::Favorites, viewer_id),
                "is_favorited",
            )
            .column_as(
                viewer_flag(RecipeCollection::ShoppingCart, viewer_id),
                "is_in_shopping_cart",
            )
    }

    /// Newest first. Collection filters are ignored for anonymous viewers.
    pub async fn list(
        &self,
        viewer_id: Option<i32>,
        filter: &RecipeFilter,
    ) -> Result<Vec<RecipeRow>> {
        let mut query = Self::annotated(viewer_id);

        if let Some(author_id) = filter.author {
            query = query.filter(recipes::Column::AuthorId.eq(author_id));
        }

        if !filter.tags.is_empty() {
            let tagged = Query::select()
                .expr(Expr::val(1))
                .from(RecipeTags)
                .inner_join(
                    Tags,
                    Expr::col((Tags, tags::Column::Id))
                        .equals((RecipeTags, recipe_tags::Column::TagId)),
                )
                .and_where(
                    Expr::col((RecipeTags, recipe_tags::Column::RecipeId))
                        .equals((Recipes, recipes::Column::Id)),
                )
                .and_where(Expr::col((Tags, tags::Column::Slug)).is_in(filter.tags.iter().cloned()))
                .to_owned();
            query = query.filter(Expr::exists(tagged));
        }

        if let Some(user_id) = viewer_id {
            if filter.favorited_only {
                query = query.filter(Expr::exists(membership(
                    RecipeCollection::Favorites,
                    user_id,
                )));
            }
            if filter.in_cart_only {
                query = query.filter(Expr::exists(membership(
                    RecipeCollection::ShoppingCart,
                    user_id,
                )));
            }
        }

        let rows = query
            .order_by_desc(recipes::Column::PubDate)
            .order_by_desc(recipes::Column::Id)
            .into_model::<RecipeRow>()
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn get(&self, viewer_id: Option<i32>, id: i32) -> Result<Option<RecipeRow>> {
        let row = Self::annotated(viewer_id)
            .filter(recipes::Column::Id.eq(id))
            .into_model::<RecipeRow>()
            .one(&self.conn)
            .await?;

        Ok(row)
    }

    pub async fn author_of(&self, id: i32) -> Result<Option<i32>> {
        let author = Recipes::find_by_id(id)
            .select_only()
            .column(recipes::Column::AuthorId)
            .into_tuple::<i32>()
            .one(&self.conn)
            .await?;

        Ok(author)
    }

    pub async fn summary(&self, id: i32) -> Result<Option<RecipeSummary>> {
        let recipe = Recipes::find_by_id(id).one(&self.conn).await?;

        Ok(recipe.map(|r| RecipeSummary {
            id: r.id,
            name: r.name,
            image: r.image,
            cooking_time: r.cooking_time,
        }))
    }

    /// Tags per recipe, each list ordered by tag name.
    pub async fn tags_for(&self, recipe_ids: &[i32]) -> Result<HashMap<i32, Vec<tags::Model>>> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = RecipeTags::find()
            .select_only()
            .column(recipe_tags::Column::RecipeId)
            .column_as(tags::Column::Id, "id")
            .column_as(tags::Column::Name, "name")
            .column_as(tags::Column::Color, "color")
            .column_as(tags::Column::Slug, "slug")
            .join(JoinType::InnerJoin, recipe_tags::Relation::Tag.def())
            .filter(recipe_tags::Column::RecipeId.is_in(recipe_ids.iter().copied()))
            .order_by_asc(tags::Column::Name)
            .into_model::<RecipeTagRow>()
            .all(&self.conn)
            .await?;

        let mut by_recipe: HashMap<i32, Vec<tags::Model>> = HashMap::new();
        for row in rows {
            by_recipe.entry(row.recipe_id).or_default().push(tags::Model {
                id: row.id,
                name: row.name,
                color: row.color,
                slug: row.slug,
            });
        }

        Ok(by_recipe)
    }

    /// Ingredient amounts per recipe, each list ordered by ingredient name.
    pub async fn ingredients_for(
        &self,
        recipe_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<RecipeIngredientLine>>> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = RecipeIngredients::find()
            .select_only()
            .column(recipe_ingredients::Column::RecipeId)
            .column_as(ingredients::Column::Id, "id")
            .column_as(ingredients::Column::Name, "name")
            .column_as(ingredients::Column::MeasurementUnit, "measurement_unit")
            .column(recipe_ingredients::Column::Amount)
            .join(
                JoinType::InnerJoin,
                recipe_ingredients::Relation::Ingredient.def(),
            )
            .filter(recipe_ingredients::Column::RecipeId.is_in(recipe_ids.iter().copied()))
            .order_by_asc(ingredients::Column::Name)
            .order_by_asc(ingredients::Column::Id)
            .into_model::<RecipeIngredientRow>()
            .all(&self.conn)
            .await?;

        let mut by_recipe: HashMap<i32, Vec<RecipeIngredientLine>> = HashMap::new();
        for row in rows {
            by_recipe
                .entry(row.recipe_id)
                .or_default()
                .push(RecipeIngredientLine {
                    id: row.id,
                    name: row.name,
                    measurement_unit: row.measurement_unit,
                    amount: row.amount,
                });
        }

        Ok(by_recipe)
    }

    /// Recipe counts and newest-first previews for each author, with the
    /// preview capped at `limit` entries.
    pub async fn by_authors(
        &self,
        author_ids: &[i32],
        limit: Option<usize>,
    ) -> Result<HashMap<i32, AuthorRecipes>> {
        if author_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = Recipes::find()
            .select_only()
            .columns([
                recipes::Column::Id,
                recipes::Column::AuthorId,
                recipes::Column::Name,
                recipes::Column::Image,
                recipes::Column::CookingTime,
            ])
            .filter(recipes::Column::AuthorId.is_in(author_ids.iter().copied()))
            .order_by_desc(recipes::Column::PubDate)
            .order_by_desc(recipes::Column::Id)
            .into_model::<PreviewRow>()
            .all(&self.conn)
            .await?;

        let mut by_author: HashMap<i32, AuthorRecipes> = HashMap::new();
        for row in rows {
            let entry = by_author.entry(row.author_id).or_default();
            entry.count += 1;
            if limit.is_none_or(|cap| entry.recipes.len() < cap) {
                entry.recipes.push(RecipeSummary {
                    id: row.id,
                    name: row.name,
                    image: row.image,
                    cooking_time: row.cooking_time,
                });
            }
        }

        Ok(by_author)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    async fn missing_references<C: ConnectionTrait>(
        conn: &C,
        amounts: &[IngredientAmount],
        tag_ids: &[i32],
    ) -> Result<MissingReferences> {
        let wanted_ingredients: Vec<i32> = amounts.iter().map(|a| a.ingredient_id).collect();

        let found_ingredients: HashSet<i32> = Ingredients::find()
            .select_only()
            .column(ingredients::Column::Id)
            .filter(ingredients::Column::Id.is_in(wanted_ingredients.iter().copied()))
            .into_tuple::<i32>()
            .all(conn)
            .await?
            .into_iter()
            .collect();

        let found_tags: HashSet<i32> = Tags::find()
            .select_only()
            .column(tags::Column::Id)
            .filter(tags::Column::Id.is_in(tag_ids.iter().copied()))
            .into_tuple::<i32>()
            .all(conn)
            .await?
            .into_iter()
            .collect();

        Ok(MissingReferences {
            ingredients: wanted_ingredients
                .into_iter()
                .filter(|id| !found_ingredients.contains(id))
                .collect(),
            tags: tag_ids
                .iter()
                .copied()
                .filter(|id| !found_tags.contains(id))
                .collect(),
        })
    }

    async fn insert_links<C: ConnectionTrait>(
        conn: &C,
        recipe_id: i32,
        amounts: &[IngredientAmount],
        tag_ids: &[i32],
    ) -> Result<()> {
        if !amounts.is_empty() {
            let rows: Vec<recipe_ingredients::ActiveModel> = amounts
                .iter()
                .map(|a| recipe_ingredients::ActiveModel {
                    recipe_id: Set(recipe_id),
                    ingredient_id: Set(a.ingredient_id),
                    amount: Set(a.amount),
                })
                .collect();

            RecipeIngredients::insert_many(rows)
                .exec_without_returning(conn)
                .await?;
        }

        if !tag_ids.is_empty() {
            let rows: Vec<recipe_tags::ActiveModel> = tag_ids
                .iter()
                .map(|&tag_id| recipe_tags::ActiveModel {
                    recipe_id: Set(recipe_id),
                    tag_id: Set(tag_id),
                })
                .collect();

            RecipeTags::insert_many(rows)
                .exec_without_returning(conn)
                .await?;
        }

        Ok(())
    }

    /// Inserts the recipe with its ingredient amounts and tag links in one
    /// transaction. Unknown references abort the write.
    pub async fn create(&self, author_id: i32, draft: &RecipeDraft) -> Result<WriteOutcome<i32>> {
        let txn = self.conn.begin().await?;

        let missing = Self::missing_references(&txn, &draft.ingredients, &draft.tags).await?;
        if !missing.is_empty() {
            return Ok(WriteOutcome::MissingReferences(missing));
        }

        let recipe = recipes::ActiveModel {
            author_id: Set(author_id),
            name: Set(draft.name.clone()),
            text: Set(draft.text.clone()),
            image: Set(draft.image.clone()),
            cooking_time: Set(draft.cooking_time),
            pub_date: Set(crate::db::timestamp()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        Self::insert_links(&txn, recipe.id, &draft.ingredients, &draft.tags).await?;

        txn.commit().await?;
        Ok(WriteOutcome::Written(recipe.id))
    }

    /// Applies scalar changes and replaces the ingredient and tag sets.
    pub async fn update(&self, id: i32, patch: &RecipePatch) -> Result<WriteOutcome<()>> {
        let txn = self.conn.begin().await?;

        let Some(recipe) = Recipes::find_by_id(id).one(&txn).await? else {
            return Ok(WriteOutcome::NotFound);
        };

        let missing = Self::missing_references(&txn, &patch.ingredients, &patch.tags).await?;
        if !missing.is_empty() {
            return Ok(WriteOutcome::MissingReferences(missing));
        }

        let mut active: recipes::ActiveModel = recipe.into();
        if let Some(name) = &patch.name {
            active.name = Set(name.clone());
        }
        if let Some(text) = &patch.text {
            active.text = Set(text.clone());
        }
        if let Some(image) = &patch.image {
            active.image = Set(Some(image.clone()));
        }
        if let Some(cooking_time) = patch.cooking_time {
            active.cooking_time = Set(cooking_time);
        }
        if active.is_changed() {
            active.update(&txn).await?;
        }

        RecipeIngredients::delete_many()
            .filter(recipe_ingredients::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        RecipeTags::delete_many()
            .filter(recipe_tags::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;

        Self::insert_links(&txn, id, &patch.ingredients, &patch.tags).await?;

        txn.commit().await?;
        Ok(WriteOutcome::Written(()))
    }

    /// Removes the recipe and everything that points at it.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        Favorites::delete_many()
            .filter(favorites::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        ShoppingCart::delete_many()
            .filter(shopping_cart::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        RecipeIngredients::delete_many()
            .filter(recipe_ingredients::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        RecipeTags::delete_many()
            .filter(recipe_tags::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        let result = Recipes::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}

/// `SELECT 1 FROM <collection> WHERE recipe_id = recipes.id AND user_id = ?`
fn membership(collection: RecipeCollection, user_id: i32) -> SelectStatement {
    match collection {
        RecipeCollection::Favorites => Query::select()
            .expr(Expr::val(1))
            .from(Favorites)
            .and_where(
                Expr::col((Favorites, favorites::Column::RecipeId))
                    .equals((Recipes, recipes::Column::Id)),
            )
            .and_where(Expr::col((Favorites, favorites::Column::UserId)).eq(user_id))
            .to_owned(),
        RecipeCollection::ShoppingCart => Query::select()
            .expr(Expr::val(1))
            .from(ShoppingCart)
            .and_where(
                Expr::col((ShoppingCart, shopping_cart::Column::RecipeId))
                    .equals((Recipes, recipes::Column::Id)),
            )
            .and_where(Expr::col((ShoppingCart, shopping_cart::Column::UserId)).eq(user_id))
            .to_owned(),
    }
}

fn viewer_flag(collection: RecipeCollection, viewer_id: Option<i32>) -> SimpleExpr {
    match viewer_id {
        Some(user_id) => Expr::exists(membership(collection, user_id)),
        None => Expr::value(false),
    }
}

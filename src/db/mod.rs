use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{ingredients, tags, users};
use crate::models::{
    NewUser, RecipeCollection, RecipeDraft, RecipeFilter, RecipeIngredientLine, RecipePatch,
    RecipeSummary, ShoppingListLine,
};

pub mod migrator;
pub mod repositories;

pub use repositories::recipe::{AuthorRecipes, MissingReferences, RecipeRow, WriteOutcome};
pub use repositories::user::CreateUser;

/// True when the database rejected a write because of a unique or
/// primary-key constraint.
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// RFC 3339 UTC with fixed microsecond precision, so stored timestamps sort
/// lexically.
#[must_use]
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn tag_repo(&self) -> repositories::tag::TagRepository {
        repositories::tag::TagRepository::new(self.conn.clone())
    }

    fn ingredient_repo(&self) -> repositories::ingredient::IngredientRepository {
        repositories::ingredient::IngredientRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    fn collection_repo(&self) -> repositories::collection::CollectionRepository {
        repositories::collection::CollectionRepository::new(self.conn.clone())
    }

    fn follow_repo(&self) -> repositories::follow::FollowRepository {
        repositories::follow::FollowRepository::new(self.conn.clone())
    }

    fn shopping_list_repo(&self) -> repositories::shopping_list::ShoppingListRepository {
        repositories::shopping_list::ShoppingListRepository::new(self.conn.clone())
    }

    // Users and tokens

    pub async fn get_user(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_users_by_ids(&self, ids: &[i32]) -> Result<Vec<users::Model>> {
        self.user_repo().get_by_ids(ids).await
    }

    pub async fn list_users(&self) -> Result<Vec<users::Model>> {
        self.user_repo().list().await
    }

    pub async fn create_user(&self, user: &NewUser, password_hash: String) -> Result<CreateUser> {
        self.user_repo().create(user, password_hash).await
    }

    pub async fn update_user_password_hash(&self, user_id: i32, hash: String) -> Result<()> {
        self.user_repo().update_password_hash(user_id, hash).await
    }

    pub async fn issue_token(&self, user_id: i32) -> Result<String> {
        self.user_repo().issue_token(user_id).await
    }

    pub async fn user_by_token(&self, key: &str) -> Result<Option<users::Model>> {
        self.user_repo().user_by_token(key).await
    }

    pub async fn revoke_tokens(&self, user_id: i32) -> Result<()> {
        self.user_repo().revoke_tokens(user_id).await
    }

    // Reference data

    pub async fn list_tags(&self) -> Result<Vec<tags::Model>> {
        self.tag_repo().list().await
    }

    pub async fn get_tag(&self, id: i32) -> Result<Option<tags::Model>> {
        self.tag_repo().get(id).await
    }

    pub async fn create_tag(
        &self,
        name: &str,
        color: &str,
        slug: &str,
    ) -> Result<Option<tags::Model>> {
        self.tag_repo().create(name, color, slug).await
    }

    pub async fn list_ingredients(&self, prefix: Option<&str>) -> Result<Vec<ingredients::Model>> {
        self.ingredient_repo().list(prefix).await
    }

    pub async fn get_ingredient(&self, id: i32) -> Result<Option<ingredients::Model>> {
        self.ingredient_repo().get(id).await
    }

    pub async fn create_ingredient(
        &self,
        name: &str,
        measurement_unit: &str,
    ) -> Result<Option<ingredients::Model>> {
        self.ingredient_repo().create(name, measurement_unit).await
    }

    // Recipes

    pub async fn list_recipes(
        &self,
        viewer_id: Option<i32>,
        filter: &RecipeFilter,
    ) -> Result<Vec<RecipeRow>> {
        self.recipe_repo().list(viewer_id, filter).await
    }

    pub async fn get_recipe(&self, viewer_id: Option<i32>, id: i32) -> Result<Option<RecipeRow>> {
        self.recipe_repo().get(viewer_id, id).await
    }

    pub async fn recipe_author(&self, id: i32) -> Result<Option<i32>> {
        self.recipe_repo().author_of(id).await
    }

    pub async fn recipe_summary(&self, id: i32) -> Result<Option<RecipeSummary>> {
        self.recipe_repo().summary(id).await
    }

    pub async fn tags_for_recipes(&self, ids: &[i32]) -> Result<HashMap<i32, Vec<tags::Model>>> {
        self.recipe_repo().tags_for(ids).await
    }

    pub async fn ingredients_for_recipes(
        &self,
        ids: &[i32],
    ) -> Result<HashMap<i32, Vec<RecipeIngredientLine>>> {
        self.recipe_repo().ingredients_for(ids).await
    }

    pub async fn recipes_by_authors(
        &self,
        author_ids: &[i32],
        limit: Option<usize>,
    ) -> Result<HashMap<i32, AuthorRecipes>> {
        self.recipe_repo().by_authors(author_ids, limit).await
    }

    pub async fn create_recipe(
        &self,
        author_id: i32,
        draft: &RecipeDraft,
    ) -> Result<WriteOutcome<i32>> {
        self.recipe_repo().create(author_id, draft).await
    }

    pub async fn update_recipe(&self, id: i32, patch: &RecipePatch) -> Result<WriteOutcome<()>> {
        self.recipe_repo().update(id, patch).await
    }

    pub async fn delete_recipe(&self, id: i32) -> Result<bool> {
        self.recipe_repo().delete(id).await
    }

    // Favorites and shopping cart

    pub async fn add_to_collection(
        &self,
        collection: RecipeCollection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool> {
        self.collection_repo()
            .add(collection, user_id, recipe_id)
            .await
    }

    pub async fn remove_from_collection(
        &self,
        collection: RecipeCollection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool> {
        self.collection_repo()
            .remove(collection, user_id, recipe_id)
            .await
    }

    pub async fn shopping_list(&self, user_id: i32) -> Result<Vec<ShoppingListLine>> {
        self.shopping_list_repo().aggregate(user_id).await
    }

    // Follows

    pub async fn follow(&self, user_id: i32, author_id: i32) -> Result<bool> {
        self.follow_repo().follow(user_id, author_id).await
    }

    pub async fn unfollow(&self, user_id: i32, author_id: i32) -> Result<bool> {
        self.follow_repo().unfollow(user_id, author_id).await
    }

    pub async fn followed_authors(&self, user_id: i32) -> Result<Vec<i32>> {
        self.follow_repo().followed_authors(user_id).await
    }

    pub async fn followed_among(&self, user_id: i32, author_ids: &[i32]) -> Result<HashSet<i32>> {
        self.follow_repo().followed_among(user_id, author_ids).await
    }
}

/// Hashes on a blocking thread.
pub async fn hash_password(password: String, config: &SecurityConfig) -> Result<String> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || repositories::user::hash_password(&password, &config))
        .await
        .map_err(|e| anyhow::anyhow!("Password hashing task panicked: {e}"))?
}

/// Verifies on a blocking thread.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        repositories::user::verify_password(&password, &password_hash)
    })
    .await
    .map_err(|e| anyhow::anyhow!("Password verification task panicked: {e}"))?
}

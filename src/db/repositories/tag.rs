use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::db::is_unique_violation;
use crate::entities::{prelude::*, tags};

pub struct TagRepository {
    conn: DatabaseConnection,
}

impl TagRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<tags::Model>> {
        Tags::find()
            .order_by_asc(tags::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list tags")
    }

    pub async fn get(&self, id: i32) -> Result<Option<tags::Model>> {
        Tags::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query tag")
    }

    /// Returns `None` when the name or slug is already used.
    pub async fn create(&self, name: &str, color: &str, slug: &str) -> Result<Option<tags::Model>> {
        let active = tags::ActiveModel {
            name: Set(name.to_string()),
            color: Set(color.to_string()),
            slug: Set(slug.to_string()),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(model)),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e).context("Failed to insert tag"),
        }
    }
}

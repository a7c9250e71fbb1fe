use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashSet;

use crate::db::{is_unique_violation, timestamp};
use crate::entities::{follows, prelude::*};

pub struct FollowRepository {
    conn: DatabaseConnection,
}

impl FollowRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns `false` when `user_id` already follows `author_id`.
    pub async fn follow(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let row = follows::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
            created_at: Set(timestamp()),
            ..Default::default()
        };

        match Follows::insert(row).exec(&self.conn).await {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e).context("Failed to insert follow"),
        }
    }

    /// Returns `false` when there was no such follow.
    pub async fn unfollow(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let result = Follows::delete_many()
            .filter(follows::Column::UserId.eq(user_id))
            .filter(follows::Column::AuthorId.eq(author_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete follow")?;

        Ok(result.rows_affected > 0)
    }

    /// Authors followed by `user_id`, oldest follow first.
    pub async fn followed_authors(&self, user_id: i32) -> Result<Vec<i32>> {
        Follows::find()
            .select_only()
            .column(follows::Column::AuthorId)
            .filter(follows::Column::UserId.eq(user_id))
            .order_by_asc(follows::Column::CreatedAt)
            .order_by_asc(follows::Column::Id)
            .into_tuple::<i32>()
            .all(&self.conn)
            .await
            .context("Failed to list followed authors")
    }

    /// The subset of `author_ids` that `user_id` follows.
    pub async fn followed_among(&self, user_id: i32, author_ids: &[i32]) -> Result<HashSet<i32>> {
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids = Follows::find()
            .select_only()
            .column(follows::Column::AuthorId)
            .filter(follows::Column::UserId.eq(user_id))
            .filter(follows::Column::AuthorId.is_in(author_ids.iter().copied()))
            .into_tuple::<i32>()
            .all(&self.conn)
            .await
            .context("Failed to query follows")?;

        Ok(ids.into_iter().collect())
    }
}

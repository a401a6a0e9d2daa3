//! # PostgreSQL `PostRepository`
//!
//! Maps the `posts` table to the domain `Post`. Engagement mutations are single
//! `UPDATE ... RETURNING` statements: the row lock Postgres takes for the update
//! serializes concurrent toggles on one post, so no read-modify-write crosses
//! the process boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{CallerId, LikeOutcome, Post, PostDraft, PostRepository, StorageError};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

const POST_COLUMNS: &str = r#"id, username, image_url, caption, "timestamp", likes_count,
    share_count, liked_by, created_at, updated_at"#;

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

fn backend(e: sqlx::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

fn counter(id: Uuid, name: &str, value: i64) -> Result<u64, StorageError> {
    u64::try_from(value).map_err(|_| StorageError::Corrupt {
        id,
        reason: format!("negative {name}: {value}"),
    })
}

fn row_to_post(row: &PgRow) -> Result<Post, StorageError> {
    let id: Uuid = row.try_get("id").map_err(backend)?;
    let liked_by: Vec<String> = row.try_get("liked_by").map_err(backend)?;
    Ok(Post {
        id,
        username: row.try_get("username").map_err(backend)?,
        image_url: row.try_get("image_url").map_err(backend)?,
        caption: row.try_get("caption").map_err(backend)?,
        timestamp: row.try_get("timestamp").map_err(backend)?,
        likes_count: counter(id, "likes_count", row.try_get("likes_count").map_err(backend)?)?,
        share_count: counter(id, "share_count", row.try_get("share_count").map_err(backend)?)?,
        liked_by: liked_by.into_iter().map(CallerId::new).collect(),
        created_at: row.try_get("created_at").map_err(backend)?,
        updated_at: row.try_get("updated_at").map_err(backend)?,
    })
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool and brings the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(backend)?;
        let repo = Self::new(pool);
        repo.migrate().await?;
        Ok(repo)
    }

    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        tracing::info!("post schema migrated");
        Ok(())
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn insert(&self, draft: PostDraft) -> Result<Post, StorageError> {
        let id = Uuid::now_v7();
        sqlx::query(
            r#"
            INSERT INTO posts (id, username, image_url, caption, "timestamp", created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5, $5)
            "#,
        )
        .bind(id)
        .bind(draft.username())
        .bind(draft.image_url())
        .bind(draft.caption())
        .bind(draft.timestamp())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        tracing::debug!(post_id = %id, "inserted post");
        Ok(draft.into_post(id))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StorageError> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.as_ref().map(row_to_post).transpose()
    }

    /// Served by `posts_timeline_idx ("timestamp" DESC, seq ASC)`.
    async fn find_page(&self, limit: u32, offset: u64) -> Result<Vec<Post>, StorageError> {
        let rows = sqlx::query(&format!(
            r#"SELECT {POST_COLUMNS} FROM posts ORDER BY "timestamp" DESC, seq ASC LIMIT $1 OFFSET $2"#
        ))
        .bind(i64::from(limit))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(row_to_post).collect()
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        Ok(total.max(0) as u64)
    }

    async fn apply_like_toggle(
        &self,
        id: Uuid,
        caller: &CallerId,
        now: DateTime<Utc>,
    ) -> Result<Option<LikeOutcome>, StorageError> {
        // SET expressions see the pre-update row; RETURNING sees the new one.
        let row = sqlx::query(
            r#"
            UPDATE posts
            SET liked_by = CASE WHEN $2 = ANY(liked_by)
                                THEN array_remove(liked_by, $2)
                                ELSE array_append(liked_by, $2) END,
                likes_count = CASE WHEN $2 = ANY(liked_by)
                                   THEN GREATEST(likes_count - 1, 0)
                                   ELSE likes_count + 1 END,
                updated_at = GREATEST(updated_at, $3)
            WHERE id = $1
            RETURNING likes_count, $2 = ANY(liked_by) AS liked
            "#,
        )
        .bind(id)
        .bind(caller.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(LikeOutcome {
            post_id: id,
            likes_count: counter(id, "likes_count", row.try_get("likes_count").map_err(backend)?)?,
            liked: row.try_get("liked").map_err(backend)?,
        }))
    }

    async fn apply_share_increment(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<u64>, StorageError> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE posts
            SET share_count = share_count + 1,
                updated_at = GREATEST(updated_at, $2)
            WHERE id = $1
            RETURNING share_count
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        count.map(|c| counter(id, "share_count", c)).transpose()
    }
}

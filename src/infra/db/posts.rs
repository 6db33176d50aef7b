use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, NewTimelineEntry, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;
use crate::domain::types::ContentType;

use super::timeline::{delete_entry, insert_entry};
use super::{PostgresRepositories, map_sqlx_error};

const POST_COLUMNS: &str = "id, author_id, title, body, image, created_at, last_updated";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    author_id: Uuid,
    title: String,
    body: String,
    image: Option<String>,
    created_at: OffsetDateTime,
    last_updated: Option<OffsetDateTime>,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            body: row.body,
            image: row.image,
            created_at: row.created_at,
            last_updated: row.last_updated,
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<PostRecord>, RepoError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(author_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<PostRecord>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = ANY($1) ORDER BY created_at DESC, id DESC"
        ))
        .bind(ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post_with_entry(
        &self,
        params: CreatePostParams,
    ) -> Result<(PostRecord, bool), RepoError> {
        let CreatePostParams {
            author_id,
            title,
            body,
            image,
        } = params;

        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO posts (id, author_id, title, body, image, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(title)
        .bind(body)
        .bind(image)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        let post = PostRecord::from(row);

        let (_, created) = insert_entry(&mut *tx, NewTimelineEntry::for_post(&post)).await?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok((post, created))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            UPDATE posts
            SET title = $2, body = $3, image = $4, last_updated = $5
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(params.id)
        .bind(params.title)
        .bind(params.body)
        .bind(params.image)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_post_with_entry(
        &self,
        post_id: Uuid,
        author_id: Uuid,
    ) -> Result<bool, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let entry_removed = delete_entry(&mut *tx, author_id, ContentType::Post, post_id).await?;

        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        // Dropping `tx` rolls the entry removal back.
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(entry_removed)
    }
}

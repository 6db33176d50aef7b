use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CommentsRepo, CommentsWriteRepo, CreateCommentParams, RepoError,
};
use crate::domain::entities::CommentRecord;

use super::{PostgresRepositories, map_sqlx_error};

const COMMENT_COLUMNS: &str = "id, post_id, author_id, text, created_at, approved";

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    author_id: Uuid,
    text: String,
    created_at: OffsetDateTime,
    approved: bool,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            text: row.text,
            created_at: row.created_at,
            approved: row.approved,
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CommentRecord::from))
    }

    async fn list_for_post(
        &self,
        post_id: Uuid,
        approved: Option<bool>,
    ) -> Result<Vec<CommentRecord>, RepoError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = "
        ));
        qb.push_bind(post_id);

        if let Some(approved) = approved {
            qb.push(" AND approved = ");
            qb.push_bind(approved);
        }

        qb.push(" ORDER BY created_at DESC, id DESC");

        let rows = qb
            .build_query_as::<CommentRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }
}

#[async_trait]
impl CommentsWriteRepo for PostgresRepositories {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            INSERT INTO comments (id, post_id, author_id, text, created_at, approved)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(params.post_id)
        .bind(params.author_id)
        .bind(params.text)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn set_approved(&self, id: Uuid, approved: bool) -> Result<CommentRecord, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "UPDATE comments SET approved = $2 WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(approved)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(CommentRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_disapproved(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM comments WHERE post_id = $1 AND approved = FALSE")
            .bind(post_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{FollowsRepo, RepoError};
use crate::domain::entities::FollowRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct FollowRow {
    follower_id: Uuid,
    followee_id: Uuid,
    created_at: OffsetDateTime,
}

impl From<FollowRow> for FollowRecord {
    fn from(row: FollowRow) -> Self {
        Self {
            follower_id: row.follower_id,
            followee_id: row.followee_id,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl FollowsRepo for PostgresRepositories {
    async fn followees_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT followee_id FROM follows WHERE follower_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn followers_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT follower_id FROM follows WHERE followee_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn follow(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<Option<FollowRecord>, RepoError> {
        let row = sqlx::query_as::<_, FollowRow>(
            r#"
            INSERT INTO follows (follower_id, followee_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            RETURNING follower_id, followee_id, created_at
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(FollowRecord::from))
    }

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id)
            .bind(followee_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}

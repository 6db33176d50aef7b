use async_trait::async_trait;
use sqlx::{PgConnection, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{NewTimelineEntry, RepoError, TimelineRepo};
use crate::domain::entities::TimelineEntryRecord;
use crate::domain::types::ContentType;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TimelineEntryRow {
    id: Uuid,
    user_id: Uuid,
    content_type: ContentType,
    content_id: Uuid,
    date: OffsetDateTime,
}

impl From<TimelineEntryRow> for TimelineEntryRecord {
    fn from(row: TimelineEntryRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            content_type: row.content_type,
            content_id: row.content_id,
            date: row.date,
        }
    }
}

/// Get-or-create on `(content_type, content_id, user_id, date)`.
///
/// Runs on the caller's connection so it can join a post write's transaction.
pub(super) async fn insert_entry(
    conn: &mut PgConnection,
    entry: NewTimelineEntry,
) -> Result<(TimelineEntryRecord, bool), RepoError> {
    let inserted = sqlx::query_as::<_, TimelineEntryRow>(
        r#"
        INSERT INTO timeline_entries (id, user_id, content_type, content_id, date)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (content_type, content_id, user_id, date) DO NOTHING
        RETURNING id, user_id, content_type, content_id, date
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.user_id)
    .bind(entry.content_type)
    .bind(entry.content_id)
    .bind(entry.date)
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    if let Some(row) = inserted {
        return Ok((row.into(), true));
    }

    let existing = sqlx::query_as::<_, TimelineEntryRow>(
        r#"
        SELECT id, user_id, content_type, content_id, date
        FROM timeline_entries
        WHERE content_type = $1 AND content_id = $2 AND user_id = $3 AND date = $4
        "#,
    )
    .bind(entry.content_type)
    .bind(entry.content_id)
    .bind(entry.user_id)
    .bind(entry.date)
    .fetch_one(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok((existing.into(), false))
}

/// Remove `user_id`'s entry for `content_id`; `false` when none existed.
pub(super) async fn delete_entry(
    conn: &mut PgConnection,
    user_id: Uuid,
    content_type: ContentType,
    content_id: Uuid,
) -> Result<bool, RepoError> {
    let result = sqlx::query(
        "DELETE FROM timeline_entries WHERE user_id = $1 AND content_type = $2 AND content_id = $3",
    )
    .bind(user_id)
    .bind(content_type)
    .bind(content_id)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl TimelineRepo for PostgresRepositories {
    async fn list_content_ids(
        &self,
        content_type: ContentType,
        user_ids: &[Uuid],
        since: Option<OffsetDateTime>,
    ) -> Result<Vec<Uuid>, RepoError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::new(
            "SELECT content_id FROM timeline_entries WHERE content_type = ",
        );
        qb.push_bind(content_type);
        qb.push(" AND user_id = ANY(");
        qb.push_bind(user_ids);
        qb.push(")");

        if let Some(since) = since {
            qb.push(" AND date > ");
            qb.push_bind(since);
        }

        qb.push(" GROUP BY content_id ORDER BY MAX(date) DESC, content_id DESC");

        let ids = qb
            .build_query_scalar::<Uuid>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(ids)
    }
}

//! Feed aggregation.
//!
//! A user's feed is built from the timeline entries owned by the user and,
//! when the follow subsystem is wired, by every account the user follows.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{FollowsRepo, PostsRepo, TimelineRepo};
use crate::cache::{CollectionCache, CollectionKind, InvalidationEvent, derive_key};
use crate::domain::entities::PostRecord;
use crate::domain::types::ContentType;

#[derive(Clone)]
pub struct TimelineService {
    cache: CollectionCache,
    timeline: Arc<dyn TimelineRepo>,
    posts: Arc<dyn PostsRepo>,
    follows: Option<Arc<dyn FollowsRepo>>,
}

impl TimelineService {
    pub fn new(
        cache: CollectionCache,
        timeline: Arc<dyn TimelineRepo>,
        posts: Arc<dyn PostsRepo>,
        follows: Option<Arc<dyn FollowsRepo>>,
    ) -> Self {
        Self {
            cache,
            timeline,
            posts,
            follows,
        }
    }

    pub fn follows_enabled(&self) -> bool {
        self.follows.is_some()
    }

    /// The user plus every account the user follows.
    pub async fn authors(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let mut authors = vec![user_id];
        if let Some(follows) = &self.follows {
            for followee in follows.followees_of(user_id).await? {
                if !authors.contains(&followee) {
                    authors.push(followee);
                }
            }
        }
        Ok(authors)
    }

    /// Distinct content ids in the user's feed, newest entry first.
    ///
    /// With `max_age_days` only entries dated strictly after
    /// `now - max_age_days` are kept; a window larger than the representable
    /// date range is unbounded. Windowed results depend on the clock and are
    /// never cached.
    pub async fn timeline_ids(
        &self,
        content_type: ContentType,
        user_id: Uuid,
        max_age_days: Option<u32>,
    ) -> Result<Vec<Uuid>, AppError> {
        match max_age_days {
            Some(days) => {
                let since =
                    OffsetDateTime::now_utc().checked_sub(Duration::days(i64::from(days)));
                self.load_ids(content_type, user_id, since).await
            }
            None => {
                let key = derive_key(CollectionKind::Timeline, user_id);
                let this = self.clone();
                self.cache
                    .get_or_load(&key, || async move {
                        this.load_ids(content_type, user_id, None).await
                    })
                    .await
            }
        }
    }

    /// Posts for `ids`, newest first, cached as the user's hydrated feed.
    pub async fn hydrated_timeline(
        &self,
        user_id: Uuid,
        ids: Vec<Uuid>,
    ) -> Result<Vec<PostRecord>, AppError> {
        let key = derive_key(CollectionKind::PostsTimeline, user_id);
        let posts = self.posts.clone();
        self.cache
            .get_or_load(&key, || async move {
                posts.list_by_ids(&ids).await.map_err(AppError::from)
            })
            .await
    }

    /// The user's feed of posts, newest first.
    #[instrument(skip(self))]
    pub async fn list_timeline(
        &self,
        user_id: Uuid,
        max_age_days: Option<u32>,
    ) -> Result<Vec<PostRecord>, AppError> {
        let ids = self
            .timeline_ids(ContentType::Post, user_id, max_age_days)
            .await?;

        if max_age_days.is_some() {
            let posts = self.posts.list_by_ids(&ids).await?;
            debug!(user_id = %user_id, count = posts.len(), "Windowed timeline loaded");
            return Ok(posts);
        }

        self.hydrated_timeline(user_id, ids).await
    }

    async fn load_ids(
        &self,
        content_type: ContentType,
        user_id: Uuid,
        since: Option<OffsetDateTime>,
    ) -> Result<Vec<Uuid>, AppError> {
        let authors = self.authors(user_id).await?;
        let ids = self
            .timeline
            .list_content_ids(content_type, &authors, since)
            .await?;
        Ok(ids)
    }
}

/// Events making every feed that shows `author_id`'s posts stale: the
/// author's own and, when follows are wired, each follower's.
pub(crate) async fn feed_events(
    follows: Option<&Arc<dyn FollowsRepo>>,
    author_id: Uuid,
) -> Result<Vec<InvalidationEvent>, AppError> {
    let mut events = vec![InvalidationEvent::posts_timeline(author_id)];
    if let Some(follows) = follows {
        events.extend(
            follows
                .followers_of(author_id)
                .await?
                .into_iter()
                .map(InvalidationEvent::posts_timeline),
        );
    }
    Ok(events)
}

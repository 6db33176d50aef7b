use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::FollowsRepo;
use crate::cache::{CollectionCache, InvalidationEvent};
use crate::domain::policy::{self, Actor};

/// Follow graph mutations. Only constructed when follows are enabled.
#[derive(Clone)]
pub struct FollowService {
    follows: Arc<dyn FollowsRepo>,
    cache: CollectionCache,
}

impl FollowService {
    pub fn new(follows: Arc<dyn FollowsRepo>, cache: CollectionCache) -> Self {
        Self { follows, cache }
    }

    /// Returns `false` when the actor already followed `followee_id`.
    #[instrument(skip(self))]
    pub async fn follow(&self, actor: &Actor, followee_id: Uuid) -> Result<bool, AppError> {
        let follower_id = policy::require_user(actor, "follow")?;
        policy::ensure(policy::can_follow(actor, followee_id), "follow")?;

        let created = self.follows.follow(follower_id, followee_id).await?.is_some();
        if created {
            self.cache
                .bust(&[InvalidationEvent::posts_timeline(follower_id)])
                .await;
        }

        info!(
            target = "application::follows::follow",
            follower_id = %follower_id,
            followee_id = %followee_id,
            created,
            "Follow recorded"
        );

        Ok(created)
    }

    /// Returns `false` when there was no follow to remove.
    #[instrument(skip(self))]
    pub async fn unfollow(&self, actor: &Actor, followee_id: Uuid) -> Result<bool, AppError> {
        let follower_id = policy::require_user(actor, "unfollow")?;

        let removed = self.follows.unfollow(follower_id, followee_id).await?;
        if removed {
            self.cache
                .bust(&[InvalidationEvent::posts_timeline(follower_id)])
                .await;
        }

        info!(
            target = "application::follows::unfollow",
            follower_id = %follower_id,
            followee_id = %followee_id,
            removed,
            "Follow removed"
        );

        Ok(removed)
    }

    pub async fn followees(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        Ok(self.follows.followees_of(user_id).await?)
    }

    pub async fn followers(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        Ok(self.follows.followers_of(user_id).await?)
    }
}

//! Cached per-owner collections.
//!
//! Every accessor reads through [`CollectionCache`] under the key derived from
//! its collection kind and owner id. Counts are taken from the cached list and
//! are never stored on their own.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{CommentsRepo, CommentsWriteRepo, PostsRepo};
use crate::cache::{CollectionCache, CollectionKind, InvalidationEvent, derive_key};
use crate::domain::entities::{CommentRecord, PostRecord};
use crate::domain::policy::{self, Actor};

/// Which comments of a post to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentFilter {
    #[default]
    All,
    Approved,
    Disapproved,
}

impl CommentFilter {
    fn collection(self) -> CollectionKind {
        match self {
            CommentFilter::All => CollectionKind::Comments,
            CommentFilter::Approved => CollectionKind::ApprovedComments,
            CommentFilter::Disapproved => CollectionKind::DisapprovedComments,
        }
    }

    fn approved_flag(self) -> Option<bool> {
        match self {
            CommentFilter::All => None,
            CommentFilter::Approved => Some(true),
            CommentFilter::Disapproved => Some(false),
        }
    }
}

#[derive(Clone)]
pub struct CollectionService {
    cache: CollectionCache,
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
    comments_writer: Arc<dyn CommentsWriteRepo>,
}

impl CollectionService {
    pub fn new(
        cache: CollectionCache,
        posts: Arc<dyn PostsRepo>,
        comments: Arc<dyn CommentsRepo>,
        comments_writer: Arc<dyn CommentsWriteRepo>,
    ) -> Self {
        Self {
            cache,
            posts,
            comments,
            comments_writer,
        }
    }

    pub async fn comments(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, AppError> {
        self.filtered_comments(post_id, CommentFilter::All).await
    }

    pub async fn approved_comments(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, AppError> {
        self.filtered_comments(post_id, CommentFilter::Approved)
            .await
    }

    pub async fn disapproved_comments(
        &self,
        post_id: Uuid,
    ) -> Result<Vec<CommentRecord>, AppError> {
        self.filtered_comments(post_id, CommentFilter::Disapproved)
            .await
    }

    pub async fn comments_count(&self, post_id: Uuid) -> Result<usize, AppError> {
        Ok(self.comments(post_id).await?.len())
    }

    pub async fn approved_comments_count(&self, post_id: Uuid) -> Result<usize, AppError> {
        Ok(self.approved_comments(post_id).await?.len())
    }

    pub async fn disapproved_comments_count(&self, post_id: Uuid) -> Result<usize, AppError> {
        Ok(self.disapproved_comments(post_id).await?.len())
    }

    /// Comments on `post_id` selected by `filter`, newest first.
    pub async fn filtered_comments(
        &self,
        post_id: Uuid,
        filter: CommentFilter,
    ) -> Result<Vec<CommentRecord>, AppError> {
        let key = derive_key(filter.collection(), post_id);
        let repo = self.comments.clone();
        self.cache
            .get_or_load(&key, || async move {
                repo.list_for_post(post_id, filter.approved_flag())
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    /// Posts authored by `user_id`, newest first.
    pub async fn posts(&self, user_id: Uuid) -> Result<Vec<PostRecord>, AppError> {
        let key = derive_key(CollectionKind::Posts, user_id);
        let repo = self.posts.clone();
        self.cache
            .get_or_load(&key, || async move {
                repo.list_by_author(user_id).await.map_err(AppError::from)
            })
            .await
    }

    pub async fn post_count(&self, user_id: Uuid) -> Result<usize, AppError> {
        Ok(self.posts(user_id).await?.len())
    }

    /// Purge the disapproved comments of a post the actor authored.
    ///
    /// Returns the number of comments removed. Nothing is busted when there
    /// was nothing to remove.
    #[instrument(skip(self))]
    pub async fn delete_disapproved(&self, actor: &Actor, post_id: Uuid) -> Result<u64, AppError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(AppError::not_found("post"))?;
        policy::ensure(
            policy::can_moderate_comments(actor, &post),
            "delete disapproved comments",
        )?;

        let deleted = self.comments_writer.delete_disapproved(post_id).await?;
        if deleted > 0 {
            self.cache
                .bust(&[
                    InvalidationEvent::disapproved_comments(post_id),
                    InvalidationEvent::comments(post_id),
                ])
                .await;
        }

        info!(
            target = "application::collections::delete_disapproved",
            post_id = %post_id,
            deleted,
            "Disapproved comments deleted"
        );

        Ok(deleted)
    }
}

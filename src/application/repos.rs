//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{CommentRecord, FollowRecord, PostRecord};
use crate::domain::types::ContentType;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Failure to remove a media object referenced by a post.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid media reference `{reference}`")]
    InvalidReference { reference: String },
    #[error("media removal failed for `{reference}`")]
    Removal {
        reference: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    /// New image reference; `None` clears it.
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct NewTimelineEntry {
    pub user_id: Uuid,
    pub content_type: ContentType,
    pub content_id: Uuid,
    pub date: OffsetDateTime,
}

impl NewTimelineEntry {
    /// The entry placing `post` in its author's feed.
    pub fn for_post(post: &PostRecord) -> Self {
        Self {
            user_id: post.author_id,
            content_type: ContentType::Post,
            content_id: post.id,
            date: post.created_at,
        }
    }
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;

    /// Posts authored by `author_id`, newest first.
    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<PostRecord>, RepoError>;

    /// Posts whose id is in `ids`, newest first. Unknown ids are skipped.
    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    /// Insert the post and the author's timeline entry for it atomically.
    ///
    /// The entry is dated with the post's `created_at`; the flag is `true`
    /// when the entry row was newly written.
    async fn create_post_with_entry(
        &self,
        params: CreatePostParams,
    ) -> Result<(PostRecord, bool), RepoError>;

    /// Replace title, body and image and stamp `last_updated`.
    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    /// Delete the post (comments cascade) and the author's timeline entry for
    /// it atomically. Returns `false` when there was no entry to remove.
    async fn delete_post_with_entry(
        &self,
        post_id: Uuid,
        author_id: Uuid,
    ) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>, RepoError>;

    /// Comments on `post_id`, newest first, optionally filtered by approval flag.
    async fn list_for_post(
        &self,
        post_id: Uuid,
        approved: Option<bool>,
    ) -> Result<Vec<CommentRecord>, RepoError>;
}

#[async_trait]
pub trait CommentsWriteRepo: Send + Sync {
    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;

    async fn set_approved(&self, id: Uuid, approved: bool) -> Result<CommentRecord, RepoError>;

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError>;

    /// Delete every disapproved comment on `post_id`, returning how many went.
    async fn delete_disapproved(&self, post_id: Uuid) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait TimelineRepo: Send + Sync {
    /// Distinct content ids from entries owned by any of `user_ids`, newest
    /// entry first, restricted to `date > since` when given.
    async fn list_content_ids(
        &self,
        content_type: ContentType,
        user_ids: &[Uuid],
        since: Option<OffsetDateTime>,
    ) -> Result<Vec<Uuid>, RepoError>;
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    /// Accounts `user_id` follows.
    async fn followees_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, RepoError>;

    /// Accounts following `user_id`.
    async fn followers_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, RepoError>;

    /// Returns `None` when the follow already existed.
    async fn follow(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<Option<FollowRecord>, RepoError>;

    /// Returns `false` when there was nothing to remove.
    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Remove the object behind `reference`. An already-absent object is success.
    async fn remove(&self, reference: &str) -> Result<(), MediaError>;
}

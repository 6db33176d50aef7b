use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::collections::{CollectionService, CommentFilter};
use crate::application::error::AppError;
use crate::application::repos::{
    CommentsRepo, CommentsWriteRepo, CreateCommentParams, PostsRepo,
};
use crate::cache::{CollectionCache, InvalidationEvent};
use crate::domain::comments::{Transition, transition};
use crate::domain::entities::CommentRecord;
use crate::domain::policy::{self, Actor};
use crate::domain::posts::validate_comment_text;
use crate::domain::types::Approval;

#[derive(Debug, Clone)]
pub struct CreateCommentCommand {
    pub post_id: Uuid,
    pub text: String,
}

/// Whether a moderation request changed the stored state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "comment", rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Changed(CommentRecord),
    Unchanged(CommentRecord),
}

impl ApprovalOutcome {
    pub fn comment(&self) -> &CommentRecord {
        match self {
            ApprovalOutcome::Changed(comment) | ApprovalOutcome::Unchanged(comment) => comment,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, ApprovalOutcome::Changed(_))
    }
}

#[derive(Clone)]
pub struct CommentService {
    posts: Arc<dyn PostsRepo>,
    reader: Arc<dyn CommentsRepo>,
    writer: Arc<dyn CommentsWriteRepo>,
    cache: CollectionCache,
    collections: CollectionService,
}

impl CommentService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        reader: Arc<dyn CommentsRepo>,
        writer: Arc<dyn CommentsWriteRepo>,
        cache: CollectionCache,
        collections: CollectionService,
    ) -> Self {
        Self {
            posts,
            reader,
            writer,
            cache,
            collections,
        }
    }

    #[instrument(skip(self, command), fields(post_id = %command.post_id))]
    pub async fn create_comment(
        &self,
        actor: &Actor,
        command: CreateCommentCommand,
    ) -> Result<CommentRecord, AppError> {
        policy::ensure(policy::can_comment(actor), "comment")?;
        let author_id = policy::require_user(actor, "comment")?;
        if self.posts.find_by_id(command.post_id).await?.is_none() {
            return Err(AppError::not_found("post"));
        }
        validate_comment_text(&command.text)?;

        let comment = self
            .writer
            .create_comment(CreateCommentParams {
                post_id: command.post_id,
                author_id,
                text: command.text,
            })
            .await?;

        self.cache
            .bust(&[InvalidationEvent::comments(comment.post_id)])
            .await;

        info!(
            target = "application::comments::create_comment",
            comment_id = %comment.id,
            post_id = %comment.post_id,
            "Comment created"
        );

        Ok(comment)
    }

    /// Delete a comment the actor wrote, returning the id of its post.
    #[instrument(skip(self))]
    pub async fn delete_comment(&self, actor: &Actor, comment_id: Uuid) -> Result<Uuid, AppError> {
        let comment = self.load_comment(comment_id).await?;
        policy::ensure(
            policy::can_delete_comment(actor, &comment),
            "delete comment",
        )?;

        self.writer.delete_comment(comment.id).await?;
        self.cache
            .bust(&[InvalidationEvent::comments(comment.post_id)])
            .await;

        info!(
            target = "application::comments::delete_comment",
            comment_id = %comment.id,
            post_id = %comment.post_id,
            "Comment deleted"
        );

        Ok(comment.post_id)
    }

    /// Move a comment to `target`. Asking for the current state is a no-op
    /// that leaves the cache alone.
    #[instrument(skip(self))]
    pub async fn set_comment_approval(
        &self,
        actor: &Actor,
        comment_id: Uuid,
        target: Approval,
    ) -> Result<ApprovalOutcome, AppError> {
        let comment = self.load_comment(comment_id).await?;
        let post = self
            .posts
            .find_by_id(comment.post_id)
            .await?
            .ok_or(AppError::not_found("post"))?;
        policy::ensure(
            policy::can_moderate_comments(actor, &post),
            "moderate comment",
        )?;

        match transition(comment.approval(), target) {
            Transition::Stay => Ok(ApprovalOutcome::Unchanged(comment)),
            Transition::Flip(next) => {
                let updated = self
                    .writer
                    .set_approved(comment.id, next.is_approved())
                    .await?;
                self.cache
                    .bust(&[InvalidationEvent::comments(updated.post_id)])
                    .await;

                info!(
                    target = "application::comments::set_comment_approval",
                    comment_id = %updated.id,
                    approval = next.as_str(),
                    "Comment moderated"
                );

                Ok(ApprovalOutcome::Changed(updated))
            }
        }
    }

    pub async fn approve(
        &self,
        actor: &Actor,
        comment_id: Uuid,
    ) -> Result<ApprovalOutcome, AppError> {
        self.set_comment_approval(actor, comment_id, Approval::Approved)
            .await
    }

    pub async fn disapprove(
        &self,
        actor: &Actor,
        comment_id: Uuid,
    ) -> Result<ApprovalOutcome, AppError> {
        self.set_comment_approval(actor, comment_id, Approval::Disapproved)
            .await
    }

    /// Comments on `post_id` selected by `filter`, newest first.
    pub async fn list_post_comments(
        &self,
        post_id: Uuid,
        filter: CommentFilter,
    ) -> Result<Vec<CommentRecord>, AppError> {
        self.collections.filtered_comments(post_id, filter).await
    }

    async fn load_comment(&self, id: Uuid) -> Result<CommentRecord, AppError> {
        self.reader
            .find_by_id(id)
            .await?
            .ok_or(AppError::not_found("comment"))
    }
}

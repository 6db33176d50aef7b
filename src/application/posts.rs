use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::collections::CollectionService;
use crate::application::error::AppError;
use crate::application::repos::{
    CreatePostParams, FollowsRepo, MediaStore, PostsRepo, PostsWriteRepo, UpdatePostParams,
};
use crate::application::timeline::feed_events;
use crate::cache::{CollectionCache, InvalidationEvent};
use crate::domain::entities::PostRecord;
use crate::domain::policy::{self, Actor};
use crate::domain::posts::{validate_body, validate_image_reference, validate_title};

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub body: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EditPostCommand {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    /// Image the post should carry afterwards; `None` or empty clears it.
    pub image: Option<String>,
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    follows: Option<Arc<dyn FollowsRepo>>,
    media: Arc<dyn MediaStore>,
    cache: CollectionCache,
    collections: CollectionService,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        follows: Option<Arc<dyn FollowsRepo>>,
        media: Arc<dyn MediaStore>,
        cache: CollectionCache,
        collections: CollectionService,
    ) -> Self {
        Self {
            reader,
            writer,
            follows,
            media,
            cache,
            collections,
        }
    }

    #[instrument(skip(self, command), fields(title_len = command.title.len()))]
    pub async fn create_post(
        &self,
        actor: &Actor,
        command: CreatePostCommand,
    ) -> Result<PostRecord, AppError> {
        let author_id = policy::require_user(actor, "create post")?;
        policy::ensure(policy::can_create_post(actor), "create post")?;
        validate_title(&command.title)?;
        validate_body(&command.body)?;
        let image = command.image.filter(|reference| !reference.is_empty());
        if let Some(reference) = image.as_deref() {
            validate_image_reference(reference)?;
        }

        let events = feed_events(self.follows.as_ref(), author_id).await?;

        let (post, created) = self
            .writer
            .create_post_with_entry(CreatePostParams {
                author_id,
                title: command.title,
                body: command.body,
                image,
            })
            .await?;

        self.cache.bust(&events).await;

        info!(
            target = "application::posts::create_post",
            post_id = %post.id,
            author_id = %author_id,
            timeline_entry_created = created,
            busted_feeds = events.len(),
            "Post created"
        );

        Ok(post)
    }

    #[instrument(skip(self, command), fields(post_id = %command.id))]
    pub async fn edit_post(
        &self,
        actor: &Actor,
        command: EditPostCommand,
    ) -> Result<PostRecord, AppError> {
        let post = self.load_post(command.id).await?;
        policy::ensure(policy::can_edit_post(actor, &post), "edit post")?;
        validate_title(&command.title)?;
        validate_body(&command.body)?;
        let image = command.image.filter(|reference| !reference.is_empty());
        if let Some(reference) = image.as_deref() {
            validate_image_reference(reference)?;
        }

        let events = feed_events(self.follows.as_ref(), post.author_id).await?;

        // The old file goes before the row changes; a failed removal leaves the post as it was.
        let current = post.image.as_deref().filter(|_| post.has_media());
        let image_changed = current != image.as_deref();
        if let Some(old) = current.filter(|_| image_changed) {
            self.media.remove(old).await?;
        }

        let updated = self
            .writer
            .update_post(UpdatePostParams {
                id: post.id,
                title: command.title,
                body: command.body,
                image,
            })
            .await?;

        self.cache.bust(&events).await;

        info!(
            target = "application::posts::edit_post",
            post_id = %updated.id,
            image_changed,
            busted_feeds = events.len(),
            "Post edited"
        );

        Ok(updated)
    }

    /// Delete a post, its media, its timeline entry and its comments.
    ///
    /// Media is removed first; if that fails nothing else is touched. The
    /// post row and its timeline entry go together or not at all.
    #[instrument(skip(self))]
    pub async fn delete_post(&self, actor: &Actor, post_id: Uuid) -> Result<(), AppError> {
        let post = self.load_post(post_id).await?;
        policy::ensure(policy::can_delete_post(actor, &post), "delete post")?;

        let mut events = feed_events(self.follows.as_ref(), post.author_id).await?;
        events.push(InvalidationEvent::comments(post.id));

        if let Some(reference) = post.image.as_deref().filter(|_| post.has_media()) {
            self.media.remove(reference).await?;
        }

        let entry_removed = self
            .writer
            .delete_post_with_entry(post.id, post.author_id)
            .await?;
        if !entry_removed {
            warn!(
                target = "application::posts::delete_post",
                post_id = %post.id,
                author_id = %post.author_id,
                "Timeline entry missing for deleted post"
            );
        }

        self.cache.bust(&events).await;

        info!(
            target = "application::posts::delete_post",
            post_id = %post.id,
            had_media = post.has_media(),
            "Post deleted"
        );

        Ok(())
    }

    /// Posts authored by `user_id`, newest first.
    pub async fn list_user_posts(&self, user_id: Uuid) -> Result<Vec<PostRecord>, AppError> {
        self.collections.posts(user_id).await
    }

    async fn load_post(&self, id: Uuid) -> Result<PostRecord, AppError> {
        self.reader
            .find_by_id(id)
            .await?
            .ok_or(AppError::not_found("post"))
    }
}

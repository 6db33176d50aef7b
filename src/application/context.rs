use std::sync::Arc;

use crate::application::{
    collections::CollectionService,
    comments::CommentService,
    follows::FollowService,
    posts::PostService,
    repos::{
        CommentsRepo, CommentsWriteRepo, FollowsRepo, MediaStore, PostsRepo, PostsWriteRepo,
        TimelineRepo,
    },
    timeline::TimelineService,
};
use crate::cache::CollectionCache;

/// Persistence capabilities the services are built from.
#[derive(Clone)]
pub struct Repositories {
    pub posts: Arc<dyn PostsRepo>,
    pub posts_writer: Arc<dyn PostsWriteRepo>,
    pub comments: Arc<dyn CommentsRepo>,
    pub comments_writer: Arc<dyn CommentsWriteRepo>,
    pub timeline: Arc<dyn TimelineRepo>,
    pub follows: Arc<dyn FollowsRepo>,
    pub media: Arc<dyn MediaStore>,
}

impl Repositories {
    /// Use one adapter for every repository trait.
    pub fn from_shared<R>(repo: Arc<R>, media: Arc<dyn MediaStore>) -> Self
    where
        R: PostsRepo
            + PostsWriteRepo
            + CommentsRepo
            + CommentsWriteRepo
            + TimelineRepo
            + FollowsRepo
            + 'static,
    {
        Self {
            posts: repo.clone(),
            posts_writer: repo.clone(),
            comments: repo.clone(),
            comments_writer: repo.clone(),
            timeline: repo.clone(),
            follows: repo,
            media,
        }
    }
}

/// Fully wired services sharing one collection cache.
#[derive(Clone)]
pub struct AppContext {
    pub cache: CollectionCache,
    pub collections: CollectionService,
    pub timeline: TimelineService,
    pub posts: PostService,
    pub comments: CommentService,
    /// `None` when the follow subsystem is disabled.
    pub follows: Option<FollowService>,
}

impl AppContext {
    pub fn new(repos: Repositories, cache: CollectionCache, follows_enabled: bool) -> Self {
        let follows = follows_enabled.then(|| repos.follows.clone());

        let collections = CollectionService::new(
            cache.clone(),
            repos.posts.clone(),
            repos.comments.clone(),
            repos.comments_writer.clone(),
        );
        let timeline = TimelineService::new(
            cache.clone(),
            repos.timeline.clone(),
            repos.posts.clone(),
            follows.clone(),
        );
        let posts = PostService::new(
            repos.posts.clone(),
            repos.posts_writer.clone(),
            follows.clone(),
            repos.media.clone(),
            cache.clone(),
            collections.clone(),
        );
        let comments = CommentService::new(
            repos.posts.clone(),
            repos.comments.clone(),
            repos.comments_writer.clone(),
            cache.clone(),
            collections.clone(),
        );
        let follows = follows.map(|repo| FollowService::new(repo, cache.clone()));

        Self {
            cache,
            collections,
            timeline,
            posts,
            comments,
            follows,
        }
    }
}

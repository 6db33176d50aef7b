//! Shared wiring for the integration tests: the in-memory adapter behind a
//! fully built [`AppContext`], with a cache backend that records busts.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use feedline::{
    application::{
        context::{AppContext, Repositories},
        posts::CreatePostCommand,
        repos::{MediaError, MediaStore, PostsWriteRepo},
    },
    cache::{CacheBackend, CacheConfig, CollectionCache, MemoryCacheBackend},
    domain::{entities::PostRecord, policy::Actor},
    infra::memory::InMemoryRepositories,
};
use uuid::Uuid;

/// Cache backend that forwards to [`MemoryCacheBackend`] and remembers every
/// key it was asked to delete.
pub struct RecordingBackend {
    inner: MemoryCacheBackend,
    deleted: Mutex<Vec<String>>,
}

impl RecordingBackend {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: MemoryCacheBackend::new(config),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().expect("deleted lock").clone()
    }

    pub fn reset(&self) {
        self.deleted.lock().expect("deleted lock").clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }
}

#[async_trait]
impl CacheBackend for RecordingBackend {
    async fn get(&self, key: &str) -> Option<Bytes> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes) {
        self.inner.set(key, value).await;
    }

    async fn delete_many(&self, keys: &[String]) {
        self.deleted
            .lock()
            .expect("deleted lock")
            .extend(keys.iter().cloned());
        self.inner.delete_many(keys).await;
    }
}

/// Media store that accepts every removal and records it.
#[derive(Default)]
pub struct RecordingMedia {
    removed: Mutex<Vec<String>>,
}

impl RecordingMedia {
    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().expect("removed lock").clone()
    }
}

#[async_trait]
impl MediaStore for RecordingMedia {
    async fn remove(&self, reference: &str) -> Result<(), MediaError> {
        self.removed
            .lock()
            .expect("removed lock")
            .push(reference.to_string());
        Ok(())
    }
}

/// Media store whose removals always fail.
pub struct FailingMedia;

#[async_trait]
impl MediaStore for FailingMedia {
    async fn remove(&self, reference: &str) -> Result<(), MediaError> {
        Err(MediaError::Removal {
            reference: reference.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume"),
        })
    }
}

pub struct Harness {
    pub app: AppContext,
    pub store: Arc<InMemoryRepositories>,
    pub backend: Arc<RecordingBackend>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(Arc::new(RecordingMedia::default()), true, true)
    }

    pub fn with_media(media: Arc<dyn MediaStore>) -> Self {
        Self::build(media, true, true)
    }

    pub fn without_follows() -> Self {
        Self::build(Arc::new(RecordingMedia::default()), false, true)
    }

    pub fn without_cache() -> Self {
        Self::build(Arc::new(RecordingMedia::default()), true, false)
    }

    /// Route post writes through whatever `wrap` builds around the store.
    pub fn with_posts_writer(
        wrap: impl FnOnce(Arc<InMemoryRepositories>) -> Arc<dyn PostsWriteRepo>,
    ) -> Self {
        let store = Arc::new(InMemoryRepositories::new());
        let mut repos = Repositories::from_shared(
            store.clone(),
            Arc::new(RecordingMedia::default()),
        );
        repos.posts_writer = wrap(store.clone());
        Self::assemble(store, repos, true, true)
    }

    fn build(media: Arc<dyn MediaStore>, follows_enabled: bool, cache_enabled: bool) -> Self {
        let store = Arc::new(InMemoryRepositories::new());
        let repos = Repositories::from_shared(store.clone(), media);
        Self::assemble(store, repos, follows_enabled, cache_enabled)
    }

    fn assemble(
        store: Arc<InMemoryRepositories>,
        repos: Repositories,
        follows_enabled: bool,
        cache_enabled: bool,
    ) -> Self {
        let config = CacheConfig {
            enabled: cache_enabled,
            ..Default::default()
        };
        let backend = Arc::new(RecordingBackend::new(&config));
        let cache = CollectionCache::new(config, backend.clone());
        let app = AppContext::new(repos, cache, follows_enabled);
        Self {
            app,
            store,
            backend,
        }
    }

    pub async fn post(&self, author: Uuid, body: &str) -> PostRecord {
        self.app
            .posts
            .create_post(
                &Actor::User(author),
                CreatePostCommand {
                    title: String::new(),
                    body: body.to_string(),
                    image: None,
                },
            )
            .await
            .expect("post should be created")
    }

    pub async fn follow(&self, follower: Uuid, followee: Uuid) {
        let created = self
            .app
            .follows
            .as_ref()
            .expect("follows enabled")
            .follow(&Actor::User(follower), followee)
            .await
            .expect("follow should succeed");
        assert!(created);
    }
}

pub fn bodies(posts: &[PostRecord]) -> Vec<&str> {
    posts.iter().map(|post| post.body.as_str()).collect()
}

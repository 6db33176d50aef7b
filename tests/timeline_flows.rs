//! End-to-end feed behaviour over the in-memory adapter.

mod support;

use std::sync::Arc;

use async_trait::async_trait;
use feedline::{
    application::{
        error::AppError,
        posts::{CreatePostCommand, EditPostCommand},
        repos::{
            CreatePostParams, FollowsRepo, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
        },
    },
    domain::{entities::PostRecord, policy::Actor},
    infra::memory::InMemoryRepositories,
};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use support::{FailingMedia, Harness, RecordingMedia, bodies};

#[tokio::test]
async fn create_edit_delete_keeps_feed_in_step() {
    let harness = Harness::new();
    let user = Uuid::new_v4();
    let actor = Actor::User(user);

    let post = harness.post(user, "hello").await;
    let feed = harness.app.timeline.list_timeline(user, None).await.unwrap();
    assert_eq!(bodies(&feed), vec!["hello"]);
    assert_eq!(harness.app.collections.post_count(user).await.unwrap(), 1);

    let edited = harness
        .app
        .posts
        .edit_post(
            &actor,
            EditPostCommand {
                id: post.id,
                title: "greeting".to_string(),
                body: "hello again".to_string(),
                image: None,
            },
        )
        .await
        .unwrap();
    assert!(edited.last_updated.is_some());
    assert_eq!(edited.created_at, post.created_at);

    let feed = harness.app.timeline.list_timeline(user, None).await.unwrap();
    assert_eq!(bodies(&feed), vec!["hello again"]);
    assert_eq!(feed[0].title, "greeting");

    harness.app.posts.delete_post(&actor, post.id).await.unwrap();

    let feed = harness.app.timeline.list_timeline(user, None).await.unwrap();
    assert!(feed.is_empty());
    assert_eq!(harness.app.collections.post_count(user).await.unwrap(), 0);
    assert!(harness.store.timeline_entries().is_empty());
}

#[tokio::test]
async fn feed_merges_own_and_followed_posts_newest_first() {
    let harness = Harness::new();
    let user = Uuid::new_v4();
    let followee = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    harness.follow(user, followee).await;

    harness.post(user, "u1").await;
    harness.post(followee, "f1").await;
    harness.post(user, "u2").await;
    harness.post(stranger, "g1").await;
    harness.post(followee, "f2").await;
    harness.post(user, "u3").await;

    let feed = harness.app.timeline.list_timeline(user, None).await.unwrap();
    assert_eq!(bodies(&feed), vec!["u3", "f2", "u2", "f1", "u1"]);

    let authors = harness.app.timeline.authors(user).await.unwrap();
    assert_eq!(authors, vec![user, followee]);

    // The followee's own feed does not include the follower.
    let followee_feed = harness
        .app
        .timeline
        .list_timeline(followee, None)
        .await
        .unwrap();
    assert_eq!(bodies(&followee_feed), vec!["f2", "f1"]);
}

#[tokio::test]
async fn recency_window_drops_old_entries() {
    let harness = Harness::new();
    let user = Uuid::new_v4();
    let old = harness.post(user, "old").await;
    let recent = harness.post(user, "recent").await;

    let now = OffsetDateTime::now_utc();
    harness
        .store
        .set_post_created_at(old.id, now - Duration::days(10))
        .unwrap();
    harness
        .store
        .set_post_created_at(recent.id, now - Duration::days(2))
        .unwrap();

    let windowed = harness
        .app
        .timeline
        .list_timeline(user, Some(7))
        .await
        .unwrap();
    assert_eq!(bodies(&windowed), vec!["recent"]);

    let full = harness.app.timeline.list_timeline(user, None).await.unwrap();
    assert_eq!(bodies(&full), vec!["recent", "old"]);

    // A windowed read after the full read still applies its window.
    let windowed = harness
        .app
        .timeline
        .list_timeline(user, Some(7))
        .await
        .unwrap();
    assert_eq!(bodies(&windowed), vec!["recent"]);
}

#[tokio::test]
async fn unbounded_recency_window_keeps_every_entry() {
    let harness = Harness::new();
    let user = Uuid::new_v4();
    let ancient = harness.post(user, "ancient").await;
    harness.post(user, "fresh").await;
    harness
        .store
        .set_post_created_at(ancient.id, OffsetDateTime::now_utc() - Duration::days(3650))
        .unwrap();

    let feed = harness
        .app
        .timeline
        .list_timeline(user, Some(u32::MAX))
        .await
        .unwrap();
    assert_eq!(bodies(&feed), vec!["fresh", "ancient"]);
}

#[tokio::test]
async fn cached_feed_sees_new_posts_from_followees() {
    let harness = Harness::new();
    let user = Uuid::new_v4();
    let followee = Uuid::new_v4();
    harness.follow(user, followee).await;
    harness.post(user, "mine").await;

    let feed = harness.app.timeline.list_timeline(user, None).await.unwrap();
    assert_eq!(bodies(&feed), vec!["mine"]);

    harness.post(followee, "theirs").await;

    let feed = harness.app.timeline.list_timeline(user, None).await.unwrap();
    assert_eq!(bodies(&feed), vec!["theirs", "mine"]);
}

#[tokio::test]
async fn follow_and_unfollow_refresh_cached_feed() {
    let harness = Harness::new();
    let user = Uuid::new_v4();
    let followee = Uuid::new_v4();
    harness.post(followee, "theirs").await;
    harness.post(user, "mine").await;

    let feed = harness.app.timeline.list_timeline(user, None).await.unwrap();
    assert_eq!(bodies(&feed), vec!["mine"]);

    harness.follow(user, followee).await;
    let feed = harness.app.timeline.list_timeline(user, None).await.unwrap();
    assert_eq!(bodies(&feed), vec!["mine", "theirs"]);

    let follows = harness.app.follows.as_ref().unwrap();
    assert!(follows.unfollow(&Actor::User(user), followee).await.unwrap());
    let feed = harness.app.timeline.list_timeline(user, None).await.unwrap();
    assert_eq!(bodies(&feed), vec!["mine"]);
}

#[tokio::test]
async fn disabled_follows_limit_feed_to_own_posts() {
    let harness = Harness::without_follows();
    let user = Uuid::new_v4();
    let followee = Uuid::new_v4();
    assert!(harness.app.follows.is_none());
    assert!(!harness.app.timeline.follows_enabled());

    // A follow row written straight to the store is ignored.
    harness.store.follow(user, followee).await.unwrap();
    harness.post(user, "mine").await;
    harness.post(followee, "theirs").await;

    let feed = harness.app.timeline.list_timeline(user, None).await.unwrap();
    assert_eq!(bodies(&feed), vec!["mine"]);
}

#[tokio::test]
async fn only_author_may_delete_post() {
    let harness = Harness::new();
    let author = Uuid::new_v4();
    let post = harness.post(author, "keep me").await;

    let err = harness
        .app
        .posts
        .delete_post(&Actor::User(Uuid::new_v4()), post.id)
        .await
        .expect_err("stranger must not delete");
    assert!(err.is_unauthorized());
    assert_eq!(err.exit_code(), 3);

    let err = harness
        .app
        .posts
        .delete_post(&Actor::Anonymous, post.id)
        .await
        .expect_err("anonymous must not delete");
    assert!(err.is_unauthorized());

    assert!(harness.store.find_by_id(post.id).await.unwrap().is_some());
    assert_eq!(harness.store.timeline_entries().len(), 1);
}

#[tokio::test]
async fn only_author_may_edit_post() {
    let harness = Harness::new();
    let author = Uuid::new_v4();
    let post = harness.post(author, "original").await;

    let err = harness
        .app
        .posts
        .edit_post(
            &Actor::User(Uuid::new_v4()),
            EditPostCommand {
                id: post.id,
                title: String::new(),
                body: "hijacked".to_string(),
                image: None,
            },
        )
        .await
        .expect_err("stranger must not edit");
    assert!(err.is_unauthorized());

    let stored = harness.store.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.body, "original");
}

#[tokio::test]
async fn media_failure_aborts_delete() {
    let harness = Harness::with_media(Arc::new(FailingMedia));
    let author = Uuid::new_v4();
    let post = harness
        .app
        .posts
        .create_post(
            &Actor::User(author),
            CreatePostCommand {
                title: "photo".to_string(),
                body: "look".to_string(),
                image: Some("images/cat.png".to_string()),
            },
        )
        .await
        .unwrap();

    let err = harness
        .app
        .posts
        .delete_post(&Actor::User(author), post.id)
        .await
        .expect_err("media removal fails");
    assert!(matches!(err, AppError::Media(_)));
    assert!(err.is_store_failure());

    assert!(harness.store.find_by_id(post.id).await.unwrap().is_some());
    assert_eq!(harness.store.timeline_entries().len(), 1);
    let feed = harness
        .app
        .timeline
        .list_timeline(author, None)
        .await
        .unwrap();
    assert_eq!(bodies(&feed), vec!["look"]);
}

#[tokio::test]
async fn delete_removes_attached_media() {
    let media = Arc::new(RecordingMedia::default());
    let harness = Harness::with_media(media.clone());
    let author = Uuid::new_v4();
    let with_image = harness
        .app
        .posts
        .create_post(
            &Actor::User(author),
            CreatePostCommand {
                title: String::new(),
                body: "picture".to_string(),
                image: Some("images/dog.png".to_string()),
            },
        )
        .await
        .unwrap();
    let plain = harness.post(author, "text only").await;

    harness
        .app
        .posts
        .delete_post(&Actor::User(author), with_image.id)
        .await
        .unwrap();
    harness
        .app
        .posts
        .delete_post(&Actor::User(author), plain.id)
        .await
        .unwrap();

    assert_eq!(media.removed(), vec!["images/dog.png".to_string()]);
}

#[tokio::test]
async fn create_post_rejects_anonymous_and_invalid_input() {
    let harness = Harness::new();

    let err = harness
        .app
        .posts
        .create_post(
            &Actor::Anonymous,
            CreatePostCommand {
                title: String::new(),
                body: "hi".to_string(),
                image: None,
            },
        )
        .await
        .expect_err("anonymous");
    assert!(err.is_unauthorized());

    let err = harness
        .app
        .posts
        .create_post(
            &Actor::User(Uuid::new_v4()),
            CreatePostCommand {
                title: "x".repeat(101),
                body: "hi".to_string(),
                image: None,
            },
        )
        .await
        .expect_err("title too long");
    assert_eq!(err.exit_code(), 2);

    let err = harness
        .app
        .posts
        .create_post(
            &Actor::User(Uuid::new_v4()),
            CreatePostCommand {
                title: String::new(),
                body: "hi".to_string(),
                image: Some("../secret".to_string()),
            },
        )
        .await
        .expect_err("escaping image path");
    assert_eq!(err.exit_code(), 2);

    assert!(harness.store.timeline_entries().is_empty());
}

#[tokio::test]
async fn missing_post_is_not_found() {
    let harness = Harness::new();
    let err = harness
        .app
        .posts
        .delete_post(&Actor::User(Uuid::new_v4()), Uuid::new_v4())
        .await
        .expect_err("missing post");
    assert!(err.is_not_found());
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn users_cannot_follow_themselves() {
    let harness = Harness::new();
    let user = Uuid::new_v4();
    let err = harness
        .app
        .follows
        .as_ref()
        .unwrap()
        .follow(&Actor::User(user), user)
        .await
        .expect_err("self follow");
    assert!(err.is_unauthorized());
    assert!(harness.store.followees_of(user).await.unwrap().is_empty());
}

/// Post writer whose deletes always time out; everything else reaches the store.
struct TimingOutDeletes(Arc<InMemoryRepositories>);

#[async_trait]
impl PostsWriteRepo for TimingOutDeletes {
    async fn create_post_with_entry(
        &self,
        params: CreatePostParams,
    ) -> Result<(PostRecord, bool), RepoError> {
        self.0.create_post_with_entry(params).await
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        self.0.update_post(params).await
    }

    async fn delete_post_with_entry(
        &self,
        _post_id: Uuid,
        _author_id: Uuid,
    ) -> Result<bool, RepoError> {
        Err(RepoError::Timeout)
    }
}

#[tokio::test]
async fn failed_delete_keeps_post_entry_and_feed() {
    let harness = Harness::with_posts_writer(|store| Arc::new(TimingOutDeletes(store)));
    let author = Uuid::new_v4();
    let post = harness.post(author, "survivor").await;
    harness.app.timeline.list_timeline(author, None).await.unwrap();
    harness.backend.reset();

    let err = harness
        .app
        .posts
        .delete_post(&Actor::User(author), post.id)
        .await
        .expect_err("delete times out");
    assert!(matches!(err, AppError::Repo(RepoError::Timeout)));

    assert!(harness.store.find_by_id(post.id).await.unwrap().is_some());
    assert_eq!(harness.store.timeline_entries().len(), 1);
    assert!(harness.backend.deleted().is_empty());
    let feed = harness
        .app
        .timeline
        .list_timeline(author, None)
        .await
        .unwrap();
    assert_eq!(bodies(&feed), vec!["survivor"]);
}

async fn post_with_image(harness: &Harness, author: Uuid, image: &str) -> PostRecord {
    harness
        .app
        .posts
        .create_post(
            &Actor::User(author),
            CreatePostCommand {
                title: String::new(),
                body: "framed".to_string(),
                image: Some(image.to_string()),
            },
        )
        .await
        .unwrap()
}

fn edit(post: &PostRecord, image: Option<&str>) -> EditPostCommand {
    EditPostCommand {
        id: post.id,
        title: post.title.clone(),
        body: post.body.clone(),
        image: image.map(str::to_string),
    }
}

#[tokio::test]
async fn edit_replaces_image_and_removes_old_file() {
    let media = Arc::new(RecordingMedia::default());
    let harness = Harness::with_media(media.clone());
    let author = Uuid::new_v4();
    let post = post_with_image(&harness, author, "images/old.png").await;

    let edited = harness
        .app
        .posts
        .edit_post(&Actor::User(author), edit(&post, Some("images/new.png")))
        .await
        .unwrap();

    assert_eq!(edited.image.as_deref(), Some("images/new.png"));
    assert_eq!(media.removed(), vec!["images/old.png".to_string()]);
    let feed = harness
        .app
        .timeline
        .list_timeline(author, None)
        .await
        .unwrap();
    assert_eq!(feed[0].image.as_deref(), Some("images/new.png"));
}

#[tokio::test]
async fn edit_clears_image() {
    let media = Arc::new(RecordingMedia::default());
    let harness = Harness::with_media(media.clone());
    let author = Uuid::new_v4();
    let post = post_with_image(&harness, author, "images/old.png").await;

    let edited = harness
        .app
        .posts
        .edit_post(&Actor::User(author), edit(&post, None))
        .await
        .unwrap();

    assert!(edited.image.is_none());
    assert!(!edited.has_media());
    assert_eq!(media.removed(), vec!["images/old.png".to_string()]);
}

#[tokio::test]
async fn edit_keeping_image_removes_nothing() {
    let media = Arc::new(RecordingMedia::default());
    let harness = Harness::with_media(media.clone());
    let author = Uuid::new_v4();
    let post = post_with_image(&harness, author, "images/same.png").await;
    let plain = harness.post(author, "text").await;

    harness
        .app
        .posts
        .edit_post(&Actor::User(author), edit(&post, Some("images/same.png")))
        .await
        .unwrap();
    harness
        .app
        .posts
        .edit_post(&Actor::User(author), edit(&plain, Some("images/added.png")))
        .await
        .unwrap();

    assert!(media.removed().is_empty());
    let stored = harness.store.find_by_id(plain.id).await.unwrap().unwrap();
    assert_eq!(stored.image.as_deref(), Some("images/added.png"));
}

#[tokio::test]
async fn edit_rejects_escaping_image_path() {
    let media = Arc::new(RecordingMedia::default());
    let harness = Harness::with_media(media.clone());
    let author = Uuid::new_v4();
    let post = post_with_image(&harness, author, "images/old.png").await;

    let err = harness
        .app
        .posts
        .edit_post(&Actor::User(author), edit(&post, Some("../etc/passwd")))
        .await
        .expect_err("escaping image path");
    assert_eq!(err.exit_code(), 2);
    assert!(media.removed().is_empty());
}

#[tokio::test]
async fn media_failure_aborts_image_edit() {
    let harness = Harness::with_media(Arc::new(FailingMedia));
    let author = Uuid::new_v4();
    let post = post_with_image(&harness, author, "images/old.png").await;
    harness.backend.reset();

    let err = harness
        .app
        .posts
        .edit_post(&Actor::User(author), edit(&post, Some("images/new.png")))
        .await
        .expect_err("media removal fails");
    assert!(matches!(err, AppError::Media(_)));

    let stored = harness.store.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.image.as_deref(), Some("images/old.png"));
    assert!(stored.last_updated.is_none());
    assert!(harness.backend.deleted().is_empty());
}

//! In-process repository adapter.
//!
//! Implements every repository trait over a single lock-protected state so
//! embedded callers and tests can run without Postgres. Ordering and
//! uniqueness rules follow the Postgres adapter.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CommentsRepo, CommentsWriteRepo, CreateCommentParams, CreatePostParams, FollowsRepo,
    NewTimelineEntry, PostsRepo, PostsWriteRepo, RepoError, TimelineRepo, UpdatePostParams,
};
use crate::domain::entities::{CommentRecord, FollowRecord, PostRecord, TimelineEntryRecord};
use crate::domain::types::ContentType;
use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "infra::memory";

#[derive(Default)]
struct MemoryState {
    // Insertion order doubles as the tie-breaker for equal timestamps.
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
    timeline: Vec<TimelineEntryRecord>,
    follows: Vec<FollowRecord>,
}

impl MemoryState {
    /// Get-or-create on `(content_type, content_id, user_id, date)`.
    fn add_entry(&mut self, entry: NewTimelineEntry) -> (TimelineEntryRecord, bool) {
        if let Some(existing) = self.timeline.iter().find(|existing| {
            existing.content_type == entry.content_type
                && existing.content_id == entry.content_id
                && existing.user_id == entry.user_id
                && existing.date == entry.date
        }) {
            return (existing.clone(), false);
        }

        let record = TimelineEntryRecord {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            content_type: entry.content_type,
            content_id: entry.content_id,
            date: entry.date,
        };
        self.timeline.push(record.clone());
        (record, true)
    }

    fn remove_entry(
        &mut self,
        user_id: Uuid,
        content_type: ContentType,
        content_id: Uuid,
    ) -> bool {
        let before = self.timeline.len();
        self.timeline.retain(|entry| {
            !(entry.user_id == user_id
                && entry.content_type == content_type
                && entry.content_id == content_id)
        });
        self.timeline.len() < before
    }
}

#[derive(Default)]
pub struct InMemoryRepositories {
    state: RwLock<MemoryState>,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a post and every timeline entry pointing at it to `at`.
    pub fn set_post_created_at(&self, post_id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "set_post_created_at");
        let post = state
            .posts
            .iter_mut()
            .find(|post| post.id == post_id)
            .ok_or(RepoError::NotFound)?;
        post.created_at = at;
        for entry in state
            .timeline
            .iter_mut()
            .filter(|entry| entry.content_type == ContentType::Post && entry.content_id == post_id)
        {
            entry.date = at;
        }
        Ok(())
    }

    pub fn timeline_entries(&self) -> Vec<TimelineEntryRecord> {
        rw_read(&self.state, SOURCE, "timeline_entries")
            .timeline
            .clone()
    }

    pub fn comment_count(&self) -> usize {
        rw_read(&self.state, SOURCE, "comment_count").comments.len()
    }
}

/// Newest first; among equal timestamps the later insert wins.
fn newest_first<T: Clone>(
    items: impl DoubleEndedIterator<Item = T>,
    created_at: impl Fn(&T) -> OffsetDateTime,
) -> Vec<T> {
    let mut sorted: Vec<T> = items.rev().collect();
    sorted.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    sorted
}

#[async_trait]
impl PostsRepo for InMemoryRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "posts.find_by_id");
        Ok(state.posts.iter().find(|post| post.id == id).cloned())
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<PostRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "posts.list_by_author");
        Ok(newest_first(
            state
                .posts
                .iter()
                .filter(|post| post.author_id == author_id)
                .cloned(),
            |post| post.created_at,
        ))
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<PostRecord>, RepoError> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let state = rw_read(&self.state, SOURCE, "posts.list_by_ids");
        Ok(newest_first(
            state
                .posts
                .iter()
                .filter(|post| wanted.contains(&post.id))
                .cloned(),
            |post| post.created_at,
        ))
    }
}

#[async_trait]
impl PostsWriteRepo for InMemoryRepositories {
    async fn create_post_with_entry(
        &self,
        params: CreatePostParams,
    ) -> Result<(PostRecord, bool), RepoError> {
        let post = PostRecord {
            id: Uuid::new_v4(),
            author_id: params.author_id,
            title: params.title,
            body: params.body,
            image: params.image,
            created_at: OffsetDateTime::now_utc(),
            last_updated: None,
        };
        let mut state = rw_write(&self.state, SOURCE, "posts.create_with_entry");
        let (_, created) = state.add_entry(NewTimelineEntry::for_post(&post));
        state.posts.push(post.clone());
        Ok((post, created))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "posts.update");
        let post = state
            .posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.title = params.title;
        post.body = params.body;
        post.image = params.image;
        post.last_updated = Some(OffsetDateTime::now_utc());
        Ok(post.clone())
    }

    async fn delete_post_with_entry(
        &self,
        post_id: Uuid,
        author_id: Uuid,
    ) -> Result<bool, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "posts.delete_with_entry");
        let index = state
            .posts
            .iter()
            .position(|post| post.id == post_id)
            .ok_or(RepoError::NotFound)?;

        let entry_removed = state.remove_entry(author_id, ContentType::Post, post_id);
        state.posts.remove(index);
        state.comments.retain(|comment| comment.post_id != post_id);
        Ok(entry_removed)
    }
}

#[async_trait]
impl CommentsRepo for InMemoryRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "comments.find_by_id");
        Ok(state.comments.iter().find(|comment| comment.id == id).cloned())
    }

    async fn list_for_post(
        &self,
        post_id: Uuid,
        approved: Option<bool>,
    ) -> Result<Vec<CommentRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "comments.list_for_post");
        Ok(newest_first(
            state
                .comments
                .iter()
                .filter(|comment| comment.post_id == post_id)
                .filter(|comment| approved.is_none_or(|flag| comment.approved == flag))
                .cloned(),
            |comment| comment.created_at,
        ))
    }
}

#[async_trait]
impl CommentsWriteRepo for InMemoryRepositories {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "comments.create");
        if !state.posts.iter().any(|post| post.id == params.post_id) {
            return Err(RepoError::InvalidInput {
                message: format!("post {} does not exist", params.post_id),
            });
        }
        let comment = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            author_id: params.author_id,
            text: params.text,
            created_at: OffsetDateTime::now_utc(),
            approved: true,
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn set_approved(&self, id: Uuid, approved: bool) -> Result<CommentRecord, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "comments.set_approved");
        let comment = state
            .comments
            .iter_mut()
            .find(|comment| comment.id == id)
            .ok_or(RepoError::NotFound)?;
        comment.approved = approved;
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "comments.delete");
        let before = state.comments.len();
        state.comments.retain(|comment| comment.id != id);
        if state.comments.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_disapproved(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "comments.delete_disapproved");
        let before = state.comments.len();
        state
            .comments
            .retain(|comment| comment.post_id != post_id || comment.approved);
        Ok((before - state.comments.len()) as u64)
    }
}

#[async_trait]
impl TimelineRepo for InMemoryRepositories {
    async fn list_content_ids(
        &self,
        content_type: ContentType,
        user_ids: &[Uuid],
        since: Option<OffsetDateTime>,
    ) -> Result<Vec<Uuid>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "timeline.list_content_ids");
        let entries = newest_first(
            state
                .timeline
                .iter()
                .filter(|entry| entry.content_type == content_type)
                .filter(|entry| user_ids.contains(&entry.user_id))
                .filter(|entry| since.is_none_or(|since| entry.date > since)),
            |entry| entry.date,
        );

        let mut seen = HashSet::new();
        Ok(entries
            .into_iter()
            .map(|entry| entry.content_id)
            .filter(|id| seen.insert(*id))
            .collect())
    }
}

#[async_trait]
impl FollowsRepo for InMemoryRepositories {
    async fn followees_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "follows.followees_of");
        Ok(state
            .follows
            .iter()
            .filter(|follow| follow.follower_id == user_id)
            .map(|follow| follow.followee_id)
            .collect())
    }

    async fn followers_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "follows.followers_of");
        Ok(state
            .follows
            .iter()
            .filter(|follow| follow.followee_id == user_id)
            .map(|follow| follow.follower_id)
            .collect())
    }

    async fn follow(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<Option<FollowRecord>, RepoError> {
        if follower_id == followee_id {
            return Err(RepoError::Integrity {
                message: "a user cannot follow themselves".to_string(),
            });
        }
        let mut state = rw_write(&self.state, SOURCE, "follows.follow");
        if state
            .follows
            .iter()
            .any(|follow| follow.follower_id == follower_id && follow.followee_id == followee_id)
        {
            return Ok(None);
        }
        let record = FollowRecord {
            follower_id,
            followee_id,
            created_at: OffsetDateTime::now_utc(),
        };
        state.follows.push(record.clone());
        Ok(Some(record))
    }

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "follows.unfollow");
        let before = state.follows.len();
        state.follows.retain(|follow| {
            !(follow.follower_id == follower_id && follow.followee_id == followee_id)
        });
        Ok(state.follows.len() < before)
    }
}

//! Invalidation events.
//!
//! Write paths describe what changed as an [`InvalidationEvent`]; each event
//! kind declares the set of collections it makes stale.

use std::fmt;

use uuid::Uuid;

use super::keys::CollectionKind;

/// Types of domain change that invalidate cached collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A user's authored posts or feed changed.
    PostsTimeline,
    /// Any comment on a post was created, deleted or re-moderated.
    Comments,
    /// Only the approved subset of a post's comments changed.
    ApprovedComments,
    /// Only the disapproved subset of a post's comments changed.
    DisapprovedComments,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::PostsTimeline => "posts_timeline",
            EventKind::Comments => "comments",
            EventKind::ApprovedComments => "approved_comments",
            EventKind::DisapprovedComments => "disapproved_comments",
        }
    }

    /// Every collection that must be evicted when this event occurs.
    pub fn bust_set(self) -> &'static [CollectionKind] {
        match self {
            EventKind::PostsTimeline => &[
                CollectionKind::Posts,
                CollectionKind::Timeline,
                CollectionKind::PostsTimeline,
            ],
            EventKind::Comments => &[
                CollectionKind::Comments,
                CollectionKind::ApprovedComments,
                CollectionKind::DisapprovedComments,
            ],
            EventKind::ApprovedComments => &[CollectionKind::ApprovedComments],
            EventKind::DisapprovedComments => &[CollectionKind::DisapprovedComments],
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A change of kind `kind` touching collections owned by `owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidationEvent {
    pub kind: EventKind,
    pub owner: Uuid,
}

impl InvalidationEvent {
    pub fn new(kind: EventKind, owner: Uuid) -> Self {
        Self { kind, owner }
    }

    /// The user's posts or feed changed.
    pub fn posts_timeline(user_id: Uuid) -> Self {
        Self::new(EventKind::PostsTimeline, user_id)
    }

    /// The post's comments changed.
    pub fn comments(post_id: Uuid) -> Self {
        Self::new(EventKind::Comments, post_id)
    }

    pub fn approved_comments(post_id: Uuid) -> Self {
        Self::new(EventKind::ApprovedComments, post_id)
    }

    pub fn disapproved_comments(post_id: Uuid) -> Self {
        Self::new(EventKind::DisapprovedComments, post_id)
    }
}

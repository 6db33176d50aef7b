//! Cache key definitions.
//!
//! Maps `(CollectionKind, owner id)` to a deterministic key string. Every kind
//! carries its own namespace prefix, so keys for distinct pairs never collide.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

const KEY_PREFIX: &str = "tml";

/// A cacheable derived collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionKind {
    // Owned by a user
    /// Posts authored by a user.
    Posts,
    /// Content ids visible in a user's feed.
    Timeline,
    /// Hydrated posts of a user's feed.
    PostsTimeline,

    // Owned by a post
    /// Every comment on a post.
    Comments,
    /// Approved comments on a post.
    ApprovedComments,
    /// Disapproved comments on a post.
    DisapprovedComments,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 6] = [
        CollectionKind::Posts,
        CollectionKind::Timeline,
        CollectionKind::PostsTimeline,
        CollectionKind::Comments,
        CollectionKind::ApprovedComments,
        CollectionKind::DisapprovedComments,
    ];

    /// Registered name used in configuration, logs and metric labels.
    pub fn name(self) -> &'static str {
        match self {
            CollectionKind::Posts => "posts",
            CollectionKind::Timeline => "timeline",
            CollectionKind::PostsTimeline => "posts_timeline",
            CollectionKind::Comments => "comments",
            CollectionKind::ApprovedComments => "approved_comments",
            CollectionKind::DisapprovedComments => "disapproved_comments",
        }
    }

    fn namespace(self) -> &'static str {
        match self {
            CollectionKind::Posts => "p",
            CollectionKind::Timeline => "t",
            CollectionKind::PostsTimeline => "pt",
            CollectionKind::Comments => "c",
            CollectionKind::ApprovedComments => "ac",
            CollectionKind::DisapprovedComments => "dc",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// A collection name that no [`CollectionKind`] is registered under.
    /// Reaching this means the caller is wired incorrectly.
    #[error("unknown cache collection type `{0}`")]
    UnknownCollectionType(String),
}

impl FromStr for CollectionKind {
    type Err = KeyError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        CollectionKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| KeyError::UnknownCollectionType(name.to_string()))
    }
}

/// Build the cache key for one collection owned by `owner`.
pub fn derive_key(kind: CollectionKind, owner: Uuid) -> String {
    format!("{KEY_PREFIX}_{}-{owner}", kind.namespace())
}

/// Build a cache key from a collection name.
pub fn derive_key_for(name: &str, owner: Uuid) -> Result<String, KeyError> {
    let kind = CollectionKind::from_str(name)?;
    Ok(derive_key(kind, owner))
}

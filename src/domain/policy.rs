//! Authorization policy for every mutating operation.
//!
//! Each write path asks exactly one of these functions; none of the services
//! compare actor ids on their own.

use uuid::Uuid;

use super::entities::{CommentRecord, PostRecord};
use super::error::DomainError;

/// Who is performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User(Uuid),
}

impl Actor {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Actor::Anonymous => None,
            Actor::User(id) => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }

    fn is(&self, user_id: Uuid) -> bool {
        self.user_id() == Some(user_id)
    }
}

pub fn can_create_post(actor: &Actor) -> bool {
    actor.is_authenticated()
}

pub fn can_edit_post(actor: &Actor, post: &PostRecord) -> bool {
    actor.is(post.author_id)
}

pub fn can_delete_post(actor: &Actor, post: &PostRecord) -> bool {
    actor.is(post.author_id)
}

pub fn can_comment(actor: &Actor) -> bool {
    actor.is_authenticated()
}

pub fn can_delete_comment(actor: &Actor, comment: &CommentRecord) -> bool {
    actor.is(comment.author_id)
}

/// Approving, disapproving and purging comments is reserved to the author of
/// the post they belong to.
pub fn can_moderate_comments(actor: &Actor, post: &PostRecord) -> bool {
    actor.is(post.author_id)
}

pub fn can_follow(actor: &Actor, followee_id: Uuid) -> bool {
    actor.is_authenticated() && !actor.is(followee_id)
}

/// Turn a policy decision into a typed failure.
pub fn ensure(allowed: bool, action: &'static str) -> Result<(), DomainError> {
    if allowed {
        Ok(())
    } else {
        Err(DomainError::unauthorized(action))
    }
}

/// Resolve the acting user, failing for anonymous actors.
pub fn require_user(actor: &Actor, action: &'static str) -> Result<Uuid, DomainError> {
    actor
        .user_id()
        .ok_or(DomainError::unauthorized(action))
}

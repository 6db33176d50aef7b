//! Comment moderation state machine.

use super::types::Approval;

/// Maximum number of characters accepted in a comment.
pub const COMMENT_TEXT_MAX_CHARS: usize = 500;

/// Result of asking a comment to move to a target approval state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The comment must move to the target state.
    Flip(Approval),
    /// The comment is already in the target state.
    Stay,
}

/// Compute the transition from `current` towards `target`.
///
/// `approve` and `disapprove` are the only transitions and both are
/// idempotent: asking for the current state yields [`Transition::Stay`].
pub fn transition(current: Approval, target: Approval) -> Transition {
    if current == target {
        Transition::Stay
    } else {
        Transition::Flip(target)
    }
}

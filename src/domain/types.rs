//! Shared domain enumerations aligned with persisted database enums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of content a timeline entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "timeline_content_type", rename_all = "snake_case")]
pub enum ContentType {
    Post,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Post => "post",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moderation state of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approval {
    Approved,
    Disapproved,
}

impl Approval {
    pub fn from_flag(approved: bool) -> Self {
        if approved {
            Approval::Approved
        } else {
            Approval::Disapproved
        }
    }

    pub fn is_approved(self) -> bool {
        matches!(self, Approval::Approved)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Approval::Approved => "approved",
            Approval::Disapproved => "disapproved",
        }
    }
}

//! Field rules for posts and comments.

use std::path::{Component, Path};

use super::comments::COMMENT_TEXT_MAX_CHARS;
use super::error::DomainError;

pub const TITLE_MAX_CHARS: usize = 100;
pub const BODY_MAX_CHARS: usize = 500;

pub fn validate_title(title: &str) -> Result<(), DomainError> {
    ensure_max_chars(title, TITLE_MAX_CHARS, "title")
}

pub fn validate_body(body: &str) -> Result<(), DomainError> {
    if body.trim().is_empty() {
        return Err(DomainError::validation("body must not be empty"));
    }
    ensure_max_chars(body, BODY_MAX_CHARS, "body")
}

pub fn validate_comment_text(text: &str) -> Result<(), DomainError> {
    ensure_max_chars(text, COMMENT_TEXT_MAX_CHARS, "text")
}

/// Image references are relative paths inside the media root.
pub fn validate_image_reference(reference: &str) -> Result<(), DomainError> {
    let path = Path::new(reference);
    let escapes_root = path.is_absolute()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)));
    if reference.trim().is_empty() || escapes_root {
        return Err(DomainError::validation(format!(
            "image reference `{reference}` must be a relative media path"
        )));
    }
    Ok(())
}

fn ensure_max_chars(value: &str, max: usize, field: &'static str) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{field} exceeds {max} characters"
        )));
    }
    Ok(())
}

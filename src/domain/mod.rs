//! Domain layer types and invariants.

pub mod comments;
pub mod entities;
pub mod error;
pub mod policy;
pub mod posts;
pub mod types;

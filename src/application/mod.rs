pub mod collections;
pub mod comments;
pub mod context;
pub mod error;
pub mod follows;
pub mod posts;
pub mod repos;
pub mod timeline;

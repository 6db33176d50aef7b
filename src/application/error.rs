use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::repos::{MediaError, RepoError},
    cache::KeyError,
    domain::error::DomainError,
    infra::error::InfraError,
};

/// Flattened view of an error chain, outermost message first.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Cache(#[from] KeyError),
    #[error(transparent)]
    Infra(#[from] InfraError),
}

impl AppError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::Domain(DomainError::not_found(entity))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Domain(DomainError::validation(message))
    }

    pub fn unauthorized(action: &'static str) -> Self {
        Self::Domain(DomainError::unauthorized(action))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::Domain(DomainError::NotFound { .. }) | AppError::Repo(RepoError::NotFound)
        )
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Domain(DomainError::Unauthorized { .. }))
    }

    /// Failures of a collaborator rather than of the request.
    pub fn is_store_failure(&self) -> bool {
        match self {
            AppError::Repo(RepoError::NotFound) => false,
            AppError::Repo(_) | AppError::Media(_) | AppError::Infra(_) => true,
            AppError::Domain(_) | AppError::Cache(_) => false,
        }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Domain(DomainError::Validation { .. }) => 2,
            AppError::Domain(DomainError::Unauthorized { .. }) => 3,
            AppError::Domain(DomainError::NotFound { .. })
            | AppError::Repo(RepoError::NotFound) => 4,
            AppError::Repo(_) | AppError::Media(_) => 5,
            AppError::Infra(InfraError::Configuration { .. }) => 78,
            AppError::Infra(_) => 6,
            AppError::Cache(_) => 70,
        }
    }
}

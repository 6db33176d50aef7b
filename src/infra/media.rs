//! Filesystem-backed media storage.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::application::repos::{MediaError, MediaStore};

/// Media files stored under a single root directory.
#[derive(Debug)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the absolute filesystem path for a media reference.
    ///
    /// References must stay inside the root: absolute paths and `..` are rejected.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf, MediaError> {
        let relative = Path::new(reference);
        if reference.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(MediaError::InvalidReference {
                reference: reference.to_string(),
            });
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStore for MediaStorage {
    /// Remove the stored file. Missing files are treated as success.
    async fn remove(&self, reference: &str) -> Result<(), MediaError> {
        let absolute = self.resolve(reference)?;
        match fs::remove_file(&absolute).await {
            Ok(()) => {
                debug!(reference, "Media file removed");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(reference, "Media file already absent");
                Ok(())
            }
            Err(source) => Err(MediaError::Removal {
                reference: reference.to_string(),
                source,
            }),
        }
    }
}

//! Blob deletion capability used to clear listing images.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::CollaboratorError;

#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn delete_blob(&self, container_name: &str, path: &str) -> Result<(), CollaboratorError>;
}

/// Blobs keyed by container then path.
#[derive(Default)]
pub struct InMemoryBlobStorage {
    containers: Mutex<HashMap<String, HashSet<String>>>,
}

impl InMemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, container_name: &str, path: &str) {
        self.containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(container_name.to_string())
            .or_default()
            .insert(path.to_string());
    }

    pub fn contains(&self, container_name: &str, path: &str) -> bool {
        self.containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(container_name)
            .is_some_and(|paths| paths.contains(path))
    }

    pub fn len(&self, container_name: &str) -> usize {
        self.containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(container_name)
            .map_or(0, HashSet::len)
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    async fn delete_blob(&self, container_name: &str, path: &str) -> Result<(), CollaboratorError> {
        let removed = self
            .containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(container_name)
            .is_some_and(|paths| paths.remove(path));

        if removed {
            Ok(())
        } else {
            Err(CollaboratorError::backend(format!(
                "blob {container_name}/{path} does not exist"
            )))
        }
    }
}

use async_trait::async_trait;

use crate::{entities::upload::UploadedFile, errors::StorageError};

pub mod supabase;

/// Object store holding uploaded media, addressed by public URL.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Stores `file` under `folder` with a freshly generated key and
    /// returns the public URL it is served from.
    async fn upload(&self, file: &UploadedFile, folder: &str) -> Result<String, StorageError>;

    /// Removes the object behind a URL previously returned by `upload`.
    /// Returns `Ok(false)` without touching the store when the URL does not
    /// belong to it.
    async fn delete(&self, public_url: &str) -> Result<bool, StorageError>;

    /// Whether the store is reachable and the configured bucket exists.
    async fn check_connection(&self) -> Result<bool, StorageError>;
}

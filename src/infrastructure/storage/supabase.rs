use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use url::Url;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::{
    entities::upload::UploadedFile,
    errors::StorageError,
    settings::AppConfig,
};

use super::MediaStorage;

/// Supabase Storage over its REST API.
#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    api_key: Zeroizing<String>,
    bucket: String,
}

#[derive(Debug, Deserialize)]
struct BucketInfo {
    name: String,
}

impl SupabaseStorage {
    pub fn new(client: Client, base_url: &str, api_key: &str, bucket: &str) -> Result<Self, StorageError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| StorageError::Configuration(format!("storage URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StorageError::Configuration(format!("storage URL '{base_url}' must be http(s)")));
        }
        if bucket.trim().is_empty() {
            return Err(StorageError::Configuration("bucket name is empty".into()));
        }

        Ok(SupabaseStorage {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: Zeroizing::new(api_key.to_string()),
            bucket: bucket.trim().to_string(),
        })
    }

    pub fn from_config(config: &AppConfig, client: Client) -> Result<Self, StorageError> {
        Self::new(client, &config.storage_url, &config.storage_key, &config.storage_bucket)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// `folder/<uuid>.<ext>`; the original filename never reaches the key.
    pub fn object_key(folder: &str, file: &UploadedFile) -> String {
        let folder = folder.trim_matches('/');
        let name = match file.extension() {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        if folder.is_empty() {
            name
        } else {
            format!("{folder}/{name}")
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}{}", self.public_prefix(), key)
    }

    /// Recovers the storage key from a URL issued by [`Self::public_url`].
    /// Anything that does not point into this bucket yields `None`.
    pub fn storage_key_from_url(&self, public_url: &str) -> Option<String> {
        let cleaned = public_url.trim().trim_end_matches('?');
        let url = Url::parse(cleaned).ok()?;
        let base = Url::parse(&self.base_url).ok()?;
        if url.origin() != base.origin() {
            return None;
        }

        let path_prefix = format!(
            "{}/storage/v1/object/public/{}/",
            base.path().trim_end_matches('/'),
            self.bucket
        );
        let key = url.path().strip_prefix(&path_prefix)?;
        if key.is_empty() {
            return None;
        }

        urlencoding::decode(key).ok().map(|k| k.into_owned())
    }

    fn public_prefix(&self) -> String {
        format!("{}/storage/v1/object/public/{}/", self.base_url, self.bucket)
    }

    fn object_endpoint(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key)
    }

    fn bucket_endpoint(&self) -> String {
        format!("{}/storage/v1/object/{}", self.base_url, self.bucket)
    }
}

async fn ensure_success(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(StorageError::Rejected { status: status.as_u16(), message })
}

#[async_trait]
impl MediaStorage for SupabaseStorage {
    #[instrument(skip(self, file), fields(size = file.len()))]
    async fn upload(&self, file: &UploadedFile, folder: &str) -> Result<String, StorageError> {
        if file.is_empty() {
            return Err(StorageError::EmptyFile);
        }

        let key = Self::object_key(folder, file);

        let response = self.client
            .post(self.object_endpoint(&key))
            .bearer_auth(self.api_key.as_str())
            .header("apikey", self.api_key.as_str())
            .header(CONTENT_TYPE, file.mime_type())
            .header("x-upsert", "true")
            .body(file.bytes.clone())
            .send()
            .await?;
        ensure_success(response).await?;

        let public_url = self.public_url(&key);
        info!("Uploaded {} to object store", key);
        Ok(public_url)
    }

    #[instrument(skip(self))]
    async fn delete(&self, public_url: &str) -> Result<bool, StorageError> {
        let Some(key) = self.storage_key_from_url(public_url) else {
            warn!("Not a URL of bucket '{}', skipping delete: {}", self.bucket, public_url);
            return Ok(false);
        };

        let response = self.client
            .delete(self.bucket_endpoint())
            .bearer_auth(self.api_key.as_str())
            .header("apikey", self.api_key.as_str())
            .json(&serde_json::json!({ "prefixes": [key] }))
            .send()
            .await?;
        ensure_success(response).await?;

        info!("Deleted {} from object store", key);
        Ok(true)
    }

    async fn check_connection(&self) -> Result<bool, StorageError> {
        let response = self.client
            .get(format!("{}/storage/v1/bucket", self.base_url))
            .bearer_auth(self.api_key.as_str())
            .header("apikey", self.api_key.as_str())
            .send()
            .await?;
        let buckets: Vec<BucketInfo> = ensure_success(response).await?.json().await?;

        Ok(buckets.iter().any(|b| b.name == self.bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> SupabaseStorage {
        SupabaseStorage::new(Client::new(), "https://abc.supabase.co/", "key", "portfolio-media").unwrap()
    }

    #[test]
    fn object_keys_are_unique_and_keep_the_extension() {
        let file = UploadedFile::new("My Résumé Shot.JPG", vec![1]);
        let first = SupabaseStorage::object_key("project_images", &file);
        let second = SupabaseStorage::object_key("project_images", &file);

        assert_ne!(first, second);
        assert!(first.starts_with("project_images/"));
        assert!(first.ends_with(".jpg"));
        assert!(!first.contains("Shot"));
        let stem = first.trim_start_matches("project_images/").trim_end_matches(".jpg");
        assert!(Uuid::parse_str(stem).is_ok());
    }

    #[test]
    fn object_key_without_extension() {
        let key = SupabaseStorage::object_key("/demo_images/", &UploadedFile::new("README", vec![1]));
        let stem = key.strip_prefix("demo_images/").unwrap();
        assert!(Uuid::parse_str(stem).is_ok());
    }

    #[test]
    fn public_url_round_trips_to_the_key() {
        let s = storage();
        let url = s.public_url("demo_images/abc.png");
        assert_eq!(url, "https://abc.supabase.co/storage/v1/object/public/portfolio-media/demo_images/abc.png");
        assert_eq!(s.storage_key_from_url(&url).as_deref(), Some("demo_images/abc.png"));
        assert_eq!(s.storage_key_from_url(&format!("{url}?")).as_deref(), Some("demo_images/abc.png"));
    }

    #[test]
    fn foreign_urls_are_not_ours() {
        let s = storage();
        for url in [
            "",
            "not a url",
            "https://via.placeholder.com/400x300",
            "https://other.supabase.co/storage/v1/object/public/portfolio-media/a.png",
            "https://abc.supabase.co/storage/v1/object/public/other-bucket/a.png",
            "https://abc.supabase.co/storage/v1/object/public/portfolio-media/",
            "http://abc.supabase.co/storage/v1/object/public/portfolio-media/a.png",
        ] {
            assert_eq!(s.storage_key_from_url(url), None, "{url}");
        }
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(SupabaseStorage::new(Client::new(), "abc.supabase.co", "k", "b").is_err());
        assert!(SupabaseStorage::new(Client::new(), "https://abc.supabase.co", "k", " ").is_err());
    }

    #[tokio::test]
    async fn delete_of_foreign_url_is_a_no_op() {
        assert!(!storage().delete("https://example.com/image.png").await.unwrap());
    }

    #[tokio::test]
    async fn empty_files_are_not_uploaded() {
        let result = storage().upload(&UploadedFile::new("a.png", Vec::new()), "project_images").await;
        assert!(matches!(result, Err(StorageError::EmptyFile)));
    }
}

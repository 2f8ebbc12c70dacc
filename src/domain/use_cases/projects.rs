use std::{sync::Arc, time::Duration};

use chrono::Utc;
use futures::future::join_all;
use humantime::format_duration;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    constants::START_TIME,
    entities::{
        demo_media::{DemoMedia, DemoMediaFields, DemoMediaInsert, MediaType},
        health::HealthCheckResponse,
        project::{Project, ProjectSubmission},
        upload::UploadedFile,
    },
    errors::{AppError, StorageError},
    repositories::project::ProjectRepository,
    storage::MediaStorage,
};

pub const PROJECT_IMAGE_FOLDER: &str = "project_images";

/// Outcome of the best-effort file cleanup that follows a delete.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileCleanup {
    pub attempted: usize,
    pub deleted: usize,
}

#[derive(Clone)]
pub struct ProjectHandler {
    pub project_repo: Arc<dyn ProjectRepository>,
    pub storage: Arc<dyn MediaStorage>,
}

impl ProjectHandler {
    pub fn new(project_repo: Arc<dyn ProjectRepository>, storage: Arc<dyn MediaStorage>) -> Self {
        ProjectHandler { project_repo, storage }
    }

    /// Retrieves all projects, newest first
    pub async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        self.project_repo.list_projects().await
    }

    /// Retrieves a project by its ID
    pub async fn get_project(&self, id: i64) -> Result<Project, AppError> {
        self.project_repo.get_project_by_id(id).await
    }

    /// Creates a project from a submitted form. Files are uploaded before the
    /// transaction opens; a failed thumbnail upload leaves `image_url` empty.
    pub async fn create_project(&self, submission: ProjectSubmission) -> Result<Project, AppError> {
        let fields = submission.fields.clone().normalized();
        fields.validate()?;

        let uploaded_image = self.upload_thumbnail(&submission).await;
        let image_url = match (&submission.image, &uploaded_image) {
            (_, Some(url)) => url.clone(),
            (Some(_), None) => String::new(),
            (None, None) => fields.image_url.clone(),
        };
        let demo_media = self.upload_demo_media(&submission).await;

        let insert = fields.into_insert(image_url, demo_media);
        let id = match self.project_repo.create_project(&insert).await {
            Ok(id) => id,
            Err(e) => {
                self.discard_uploads(uploaded_image, &insert.demo_media).await;
                return Err(e);
            }
        };

        info!("Created project {} ({} technologies)", id, insert.technologies.len());
        self.project_repo.get_project_by_id(id).await
    }

    /// Replaces a project's fields and technologies. New demo files replace the
    /// whole demo media set; without them the existing set is kept. A failed
    /// thumbnail upload keeps the submitted `image_url`.
    pub async fn update_project(&self, id: i64, submission: ProjectSubmission) -> Result<Project, AppError> {
        let current = self.project_repo.get_project_by_id(id).await?;

        let fields = submission.fields.clone().normalized();
        fields.validate()?;

        let uploaded_image = self.upload_thumbnail(&submission).await;
        let image_url = uploaded_image.clone().unwrap_or_else(|| fields.image_url.clone());
        let demo_media = if submission.has_demo_media() {
            Some(self.upload_demo_media(&submission).await)
        } else {
            None
        };

        let update = fields.into_update(image_url, demo_media);
        if let Err(e) = self.project_repo.update_project(id, &update).await {
            let uploaded = update.demo_media.as_deref().unwrap_or_default();
            self.discard_uploads(uploaded_image, uploaded).await;
            return Err(e);
        }

        // Files the project no longer references
        let mut stale = Vec::new();
        if !current.image_url.is_empty() && current.image_url != update.image_url {
            stale.push(current.image_url.clone());
        }
        if update.demo_media.is_some() {
            stale.extend(current.demo_media.iter().map(|m| m.media_url.clone()));
        }
        self.delete_files(stale).await;

        info!("Updated project {}", id);
        self.project_repo.get_project_by_id(id).await
    }

    /// Deletes a project and its rows, then tries to remove its stored files.
    pub async fn delete_project(&self, id: i64) -> Result<FileCleanup, AppError> {
        let project = self.project_repo.get_project_by_id(id).await?;

        self.project_repo.delete_project(id).await?;
        info!("Deleted project {} ({})", id, project.title);

        Ok(self.delete_files(project.stored_file_urls()).await)
    }

    /// Uploads one demo media file and appends it to the project.
    pub async fn add_demo_media(
        &self,
        project_id: i64,
        fields: DemoMediaFields,
        file: Option<UploadedFile>,
    ) -> Result<DemoMedia, AppError> {
        let Some(file) = file else {
            return Err(AppError::field("file", "A media file is required"));
        };
        // Parse before uploading so bad input never reaches the store
        let draft = fields.clone().into_insert(String::new())?;

        self.project_repo.get_project_by_id(project_id).await?;

        let media_url = self.storage.upload(&file, draft.media_type.folder()).await?;
        let insert = fields.into_insert(media_url.clone())?.describe_file(&file);

        match self.project_repo.add_demo_media(project_id, &insert).await {
            Ok(media) => Ok(media),
            Err(e) => {
                self.delete_files(vec![media_url]).await;
                Err(e)
            }
        }
    }

    pub async fn health(&self) -> HealthCheckResponse {
        let now = Utc::now();
        let uptime = now.signed_duration_since(*START_TIME).num_seconds().max(0) as u64;

        let storage = match self.storage.check_connection().await {
            Ok(true) => "connected",
            Ok(false) => "bucket missing",
            Err(e) => {
                warn!("Object store health check failed: {}", e);
                "unavailable"
            }
        };

        let mut response = HealthCheckResponse {
            status: "healthy".to_string(),
            timestamp: now.to_rfc3339(),
            uptime: format_duration(Duration::from_secs(uptime)).to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: "connected".to_string(),
            storage: storage.to_string(),
            total_projects: None,
            error: None,
        };

        match self.project_repo.count_projects().await {
            Ok(count) => response.total_projects = Some(count),
            Err(e) => {
                response.status = "unhealthy".to_string();
                response.database = "unavailable".to_string();
                response.error = Some(e.to_string());
            }
        }

        response
    }

    /// URL of the newly stored thumbnail, if one was sent and the upload worked.
    async fn upload_thumbnail(&self, submission: &ProjectSubmission) -> Option<String> {
        let file = submission.image.as_ref()?;
        match self.storage.upload(file, PROJECT_IMAGE_FOLDER).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Upload to {} failed, continuing without the file: {}", PROJECT_IMAGE_FOLDER, e);
                None
            }
        }
    }

    /// Uploads demo images then videos. Failed uploads are dropped; the
    /// order index is left for the repository to assign.
    async fn upload_demo_media(&self, submission: &ProjectSubmission) -> Vec<DemoMediaInsert> {
        let files = submission.demo_images.iter().map(|f| (MediaType::Image, f))
            .chain(submission.demo_videos.iter().map(|f| (MediaType::Video, f)));

        let mut inserts = Vec::new();
        for (media_type, file) in files {
            let url = match self.storage.upload(file, media_type.folder()).await {
                Ok(url) => url,
                Err(e) => {
                    warn!("Skipping demo {} {:?}: {}", media_type, file.file_name, e);
                    continue;
                }
            };

            let mut insert = DemoMediaInsert::new(media_type, url).describe_file(file);
            if media_type == MediaType::Video {
                insert.autoplay = submission.video_autoplay;
                insert.muted = submission.video_muted;
            }
            inserts.push(insert);
        }
        inserts
    }

    /// Removes files uploaded for a write that then failed.
    async fn discard_uploads(&self, image_url: Option<String>, demo_media: &[DemoMediaInsert]) {
        let mut urls: Vec<String> = demo_media.iter().map(|m| m.media_url.clone()).collect();
        urls.extend(image_url);
        self.delete_files(urls).await;
    }

    /// Best-effort removal; failures are logged and counted, never raised.
    pub async fn delete_files(&self, urls: Vec<String>) -> FileCleanup {
        let attempted = urls.len();
        let results = join_all(urls.iter().map(|url| self.storage.delete(url))).await;

        let mut deleted = 0;
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => log_storage_failure(url, &e),
            }
        }

        FileCleanup { attempted, deleted }
    }
}

fn log_storage_failure(url: &str, err: &StorageError) {
    warn!("Failed to delete {} from object store: {}", url, err);
}

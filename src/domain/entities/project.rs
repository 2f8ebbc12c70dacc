use std::borrow::Cow;

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use validator::{Validate, ValidationError};

use crate::entities::{
    demo_media::{DemoMedia, DemoMediaInsert, MediaType},
    technology::{join_technologies, parse_technologies, technology_name_too_long, Technology},
    upload::UploadedFile,
};

// ───── Constants ──────────────────────────────────────────────────────
pub const MAX_TITLE_LENGTH: u64 = 100;
pub const MAX_URL_LENGTH: u64 = 500;
pub const MAX_TECHNOLOGY_LENGTH: usize = 50;

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub github_url: String,
    pub demo_url: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A project together with the rows it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub github_url: String,
    pub demo_url: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub technologies: Vec<Technology>,
    pub demo_media: Vec<DemoMedia>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectInsert {
    pub title: String,
    pub description: String,
    pub github_url: String,
    pub demo_url: String,
    pub image_url: String,
    pub technologies: Vec<String>,
    pub demo_media: Vec<DemoMediaInsert>,
}

/// Full replacement of a project's editable state. Technologies are always
/// replaced; demo media only when `demo_media` is `Some`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectUpdate {
    pub title: String,
    pub description: String,
    pub github_url: String,
    pub demo_url: String,
    pub image_url: String,
    pub technologies: Vec<String>,
    pub demo_media: Option<Vec<DemoMediaInsert>>,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub github_url: String,
    pub demo_url: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub technologies: Vec<String>,
    pub demo_images: Vec<DemoMedia>,
    pub demo_videos: Vec<DemoMedia>,
    pub total_demo_images: usize,
    pub total_demo_videos: usize,
}

// ───── Input & Validation ───────────────────────────────────────────

#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct ProjectFields {
    #[serde(default)]
    #[validate(length(min = 1, max = MAX_TITLE_LENGTH, message = "Title is required (at most 100 characters)"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[serde(default)]
    #[validate(length(max = MAX_URL_LENGTH), custom(function = "validate_optional_url"))]
    pub github_url: String,

    #[serde(default)]
    #[validate(length(max = MAX_URL_LENGTH), custom(function = "validate_optional_url"))]
    pub demo_url: String,

    #[serde(default)]
    #[validate(length(max = MAX_URL_LENGTH), custom(function = "validate_optional_url"))]
    pub image_url: String,

    #[serde(default)]
    #[validate(custom(function = "validate_technologies"))]
    pub technologies: String,
}

#[derive(Debug, MultipartForm)]
pub struct ProjectUpload {
    pub title: Option<Text<String>>,
    pub description: Option<Text<String>>,
    pub github_url: Option<Text<String>>,
    pub demo_url: Option<Text<String>>,
    pub image_url: Option<Text<String>>,
    pub technologies: Option<Text<String>>,

    #[multipart(limit = "10MB")]
    pub image: Option<TempFile>,

    #[multipart(limit = "100MB")]
    pub demo_images: Vec<TempFile>,

    #[multipart(limit = "100MB")]
    pub demo_videos: Vec<TempFile>,

    pub video_autoplay: Option<Text<String>>,
    pub video_muted: Option<Text<String>>,
}

/// Everything a create or edit form carries once files are read.
#[derive(Debug, Default, Clone)]
pub struct ProjectSubmission {
    pub fields: ProjectFields,
    pub image: Option<UploadedFile>,
    pub demo_images: Vec<UploadedFile>,
    pub demo_videos: Vec<UploadedFile>,
    pub video_autoplay: bool,
    pub video_muted: bool,
}

impl ProjectSubmission {
    pub fn from_fields(fields: ProjectFields) -> Self {
        ProjectSubmission {
            fields,
            video_muted: true,
            ..Default::default()
        }
    }

    pub fn has_demo_media(&self) -> bool {
        !self.demo_images.is_empty() || !self.demo_videos.is_empty()
    }
}

fn validate_optional_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(new_validation_error("invalid_url", "Must be an http(s) URL")),
    }
}

fn validate_technologies(value: &str) -> Result<(), ValidationError> {
    if parse_technologies(value).iter().any(|name| technology_name_too_long(name)) {
        return Err(new_validation_error(
            "technology_too_long",
            "Each technology must be at most 50 characters",
        ));
    }
    Ok(())
}

fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

// ───── Conversions ──────────────────────────────────────────────────

impl ProjectFields {
    /// Trims every single-line field. Descriptions keep their inner layout.
    pub fn normalized(self) -> Self {
        ProjectFields {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            github_url: self.github_url.trim().to_string(),
            demo_url: self.demo_url.trim().to_string(),
            image_url: self.image_url.trim().trim_end_matches('?').to_string(),
            technologies: self.technologies,
        }
    }

    pub fn from_upload(form: &ProjectUpload) -> Self {
        let text = |field: &Option<Text<String>>| field.as_ref().map(|t| t.0.clone()).unwrap_or_default();
        ProjectFields {
            title: text(&form.title),
            description: text(&form.description),
            github_url: text(&form.github_url),
            demo_url: text(&form.demo_url),
            image_url: text(&form.image_url),
            technologies: text(&form.technologies),
        }
    }

    /// Prefill for the edit form.
    pub fn from_project(project: &Project) -> Self {
        ProjectFields {
            title: project.title.clone(),
            description: project.description.clone(),
            github_url: project.github_url.clone(),
            demo_url: project.demo_url.clone(),
            image_url: project.image_url.clone(),
            technologies: project.technologies_string(),
        }
    }

    pub fn into_insert(self, image_url: String, demo_media: Vec<DemoMediaInsert>) -> ProjectInsert {
        ProjectInsert {
            technologies: parse_technologies(&self.technologies),
            title: self.title,
            description: self.description,
            github_url: self.github_url,
            demo_url: self.demo_url,
            image_url,
            demo_media,
        }
    }

    pub fn into_update(self, image_url: String, demo_media: Option<Vec<DemoMediaInsert>>) -> ProjectUpdate {
        ProjectUpdate {
            technologies: parse_technologies(&self.technologies),
            title: self.title,
            description: self.description,
            github_url: self.github_url,
            demo_url: self.demo_url,
            image_url,
            demo_media,
        }
    }
}

impl Project {
    pub fn from_parts(row: ProjectRow, technologies: Vec<Technology>, demo_media: Vec<DemoMedia>) -> Self {
        Project {
            id: row.id,
            title: row.title,
            description: row.description,
            github_url: row.github_url,
            demo_url: row.demo_url,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
            technologies,
            demo_media,
        }
    }

    pub fn technology_names(&self) -> Vec<String> {
        self.technologies.iter().map(|t| t.name.clone()).collect()
    }

    pub fn technologies_string(&self) -> String {
        join_technologies(self.technologies.iter().map(|t| t.name.as_str()))
    }

    pub fn demo_of_type(&self, media_type: MediaType) -> impl Iterator<Item = &DemoMedia> {
        self.demo_media.iter().filter(move |m| m.media_type == media_type)
    }

    /// Every object store URL this project references: thumbnail first,
    /// then demo media in display order.
    pub fn stored_file_urls(&self) -> Vec<String> {
        std::iter::once(self.image_url.as_str())
            .chain(self.demo_media.iter().map(|m| m.media_url.as_str()))
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn to_response(&self) -> ProjectResponse {
        let demo_images: Vec<DemoMedia> = self.demo_of_type(MediaType::Image).cloned().collect();
        let demo_videos: Vec<DemoMedia> = self.demo_of_type(MediaType::Video).cloned().collect();

        ProjectResponse {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            github_url: self.github_url.clone(),
            demo_url: self.demo_url.clone(),
            image_url: self.image_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            technologies: self.technology_names(),
            total_demo_images: demo_images.len(),
            total_demo_videos: demo_videos.len(),
            demo_images,
            demo_videos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(id: i64, media_type: MediaType, url: &str) -> DemoMedia {
        DemoMedia {
            id,
            project_id: 1,
            media_type,
            media_url: url.to_string(),
            media_name: None,
            caption: None,
            order_index: id as i32,
            width: None,
            height: None,
            duration_seconds: None,
            format: None,
            autoplay: false,
            muted: true,
            created_at: Utc::now(),
        }
    }

    fn project() -> Project {
        let now = Utc::now();
        Project {
            id: 1,
            title: "Portfolio".into(),
            description: "Site".into(),
            github_url: String::new(),
            demo_url: String::new(),
            image_url: "https://x.supabase.co/thumb.png".into(),
            created_at: now,
            updated_at: now,
            technologies: vec![
                Technology { id: 1, name: "Go".into(), project_id: 1 },
                Technology { id: 2, name: "Rust".into(), project_id: 1 },
            ],
            demo_media: vec![
                media(1, MediaType::Image, "https://x/a.png"),
                media(2, MediaType::Video, "https://x/b.mp4"),
                media(3, MediaType::Image, "https://x/c.png"),
            ],
        }
    }

    fn valid_fields() -> ProjectFields {
        ProjectFields {
            title: "Portfolio".into(),
            description: "A site".into(),
            technologies: "Go, Rust".into(),
            ..Default::default()
        }
    }

    #[test]
    fn response_splits_demo_media_by_type() {
        let response = project().to_response();
        assert_eq!(response.technologies, vec!["Go", "Rust"]);
        assert_eq!(response.total_demo_images, 2);
        assert_eq!(response.total_demo_videos, 1);
        assert_eq!(response.demo_videos[0].media_url, "https://x/b.mp4");
    }

    #[test]
    fn response_json_has_the_expected_keys() {
        let json = serde_json::to_value(project().to_response()).unwrap();
        for key in [
            "id", "title", "description", "github_url", "demo_url", "image_url", "created_at",
            "updated_at", "technologies", "demo_images", "demo_videos", "total_demo_images",
            "total_demo_videos",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["demo_images"][0]["media_type"], "image");
    }

    #[test]
    fn stored_file_urls_skip_blank_thumbnail() {
        let mut p = project();
        assert_eq!(p.stored_file_urls().len(), 4);
        p.image_url.clear();
        assert_eq!(
            p.stored_file_urls(),
            vec!["https://x/a.png", "https://x/b.mp4", "https://x/c.png"]
        );
    }

    #[test]
    fn missing_title_fails_validation() {
        let fields = ProjectFields { title: "   ".into(), ..valid_fields() }.normalized();
        let errors = fields.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn urls_must_be_http() {
        assert!(valid_fields().validate().is_ok());

        let bad = ProjectFields { github_url: "ftp://host/repo".into(), ..valid_fields() };
        assert!(bad.validate().unwrap_err().field_errors().contains_key("github_url"));

        let good = ProjectFields { demo_url: "https://demo.example.com".into(), ..valid_fields() };
        assert!(good.validate().is_ok());
    }

    #[test]
    fn overlong_technology_fails_validation() {
        let fields = ProjectFields { technologies: format!("Go, {}", "x".repeat(51)), ..valid_fields() };
        assert!(fields.validate().unwrap_err().field_errors().contains_key("technologies"));
    }

    #[test]
    fn insert_parses_technologies() {
        let insert = valid_fields().into_insert(String::new(), Vec::new());
        assert_eq!(insert.technologies, vec!["Go", "Rust"]);
        assert_eq!(insert.image_url, "");

        let update = ProjectFields { technologies: String::new(), ..valid_fields() }.into_update(String::new(), None);
        assert!(update.technologies.is_empty());
        assert!(update.demo_media.is_none());
    }

    #[test]
    fn edit_prefill_joins_technologies() {
        let fields = ProjectFields::from_project(&project());
        assert_eq!(fields.technologies, "Go, Rust");
        assert_eq!(fields.title, "Portfolio");
    }

    #[test]
    fn normalized_strips_trailing_question_mark_from_image_url() {
        let fields = ProjectFields { image_url: " https://x/a.png? ".into(), ..valid_fields() }.normalized();
        assert_eq!(fields.image_url, "https://x/a.png");
    }
}

use std::{fmt, str::FromStr};

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{entities::upload::UploadedFile, errors::{AppError, FieldError}};

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "media_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// Object store folder that files of this type are uploaded into.
    pub fn folder(&self) -> &'static str {
        match self {
            MediaType::Image => "demo_images",
            MediaType::Video => "demo_videos",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            other => Err(AppError::field("media_type", format!("Unknown media type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DemoMedia {
    pub id: i64,
    pub project_id: i64,
    pub media_type: MediaType,
    pub media_url: String,
    pub media_name: Option<String>,
    pub caption: Option<String>,
    pub order_index: i32,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration_seconds: Option<i32>,
    pub format: Option<String>,
    pub autoplay: bool,
    pub muted: bool,
    pub created_at: DateTime<Utc>,
}

/// A demo media row waiting to be inserted. A `None` order index is
/// resolved at insert time to one past the project's current maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoMediaInsert {
    pub media_type: MediaType,
    pub media_url: String,
    pub media_name: Option<String>,
    pub caption: Option<String>,
    pub order_index: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration_seconds: Option<i32>,
    pub format: Option<String>,
    pub autoplay: bool,
    pub muted: bool,
}

impl DemoMediaInsert {
    pub fn new(media_type: MediaType, media_url: impl Into<String>) -> Self {
        DemoMediaInsert {
            media_type,
            media_url: media_url.into(),
            media_name: None,
            caption: None,
            order_index: None,
            width: None,
            height: None,
            duration_seconds: None,
            format: None,
            autoplay: false,
            muted: true,
        }
    }

    /// Fills name and format from the uploaded file where the form left them out.
    pub fn describe_file(mut self, file: &UploadedFile) -> Self {
        if self.media_name.is_none() {
            self.media_name = file.display_name();
        }
        if self.format.is_none() {
            self.format = file.extension();
        }
        self
    }
}

// ───── Input & Validation ───────────────────────────────────────────

#[derive(Debug, MultipartForm)]
pub struct DemoMediaUpload {
    #[multipart(limit = "100MB")]
    pub file: TempFile,
    pub media_type: Text<String>,
    pub media_name: Option<Text<String>>,
    pub caption: Option<Text<String>>,
    pub order_index: Option<Text<String>>,
    pub width: Option<Text<String>>,
    pub height: Option<Text<String>>,
    pub duration_seconds: Option<Text<String>>,
    pub autoplay: Option<Text<String>>,
    pub muted: Option<Text<String>>,
}

/// Text fields of the demo media form, still as submitted.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DemoMediaFields {
    pub media_type: String,
    pub media_name: Option<String>,
    pub caption: Option<String>,
    pub order_index: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub duration_seconds: Option<String>,
    pub autoplay: Option<String>,
    pub muted: Option<String>,
}

impl DemoMediaFields {
    pub fn from_upload(form: &DemoMediaUpload) -> Self {
        let text = |field: &Option<Text<String>>| field.as_ref().map(|t| t.0.clone());
        DemoMediaFields {
            media_type: form.media_type.0.clone(),
            media_name: text(&form.media_name),
            caption: text(&form.caption),
            order_index: text(&form.order_index),
            width: text(&form.width),
            height: text(&form.height),
            duration_seconds: text(&form.duration_seconds),
            autoplay: text(&form.autoplay),
            muted: text(&form.muted),
        }
    }

    /// Parses the submitted values into an insert for `media_url`.
    /// All field problems are reported together.
    pub fn into_insert(self, media_url: String) -> Result<DemoMediaInsert, AppError> {
        let mut errors = Vec::new();

        let media_type = match self.media_type.parse::<MediaType>() {
            Ok(media_type) => Some(media_type),
            Err(AppError::ValidationError(mut field_errors)) => {
                errors.append(&mut field_errors);
                None
            }
            Err(e) => return Err(e),
        };

        let mut number = |field: &'static str, value: Option<String>, min: i32| {
            match parse_optional_int(value.as_deref(), min) {
                Ok(parsed) => parsed,
                Err(message) => {
                    errors.push(FieldError { field: field.to_string(), message });
                    None
                }
            }
        };

        let order_index = number("order_index", self.order_index, 0);
        let width = number("width", self.width, 1);
        let height = number("height", self.height, 1);
        let duration_seconds = number("duration_seconds", self.duration_seconds, 0);

        let Some(media_type) = media_type.filter(|_| errors.is_empty()) else {
            return Err(AppError::ValidationError(errors));
        };

        let mut insert = DemoMediaInsert::new(media_type, media_url);
        insert.media_name = non_blank(self.media_name).map(|n| n.chars().take(100).collect());
        insert.caption = non_blank(self.caption);
        insert.order_index = order_index;
        insert.width = width;
        insert.height = height;
        insert.duration_seconds = duration_seconds.filter(|_| media_type == MediaType::Video);
        insert.autoplay = media_type == MediaType::Video && is_checked(self.autoplay.as_deref());
        insert.muted = self.muted.as_deref().map_or(true, |v| is_checked(Some(v)));
        Ok(insert)
    }
}

/// HTML checkboxes submit "on"; API clients tend to send "true" or "1".
pub fn is_checked(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_lowercase()).as_deref(),
        Some("on" | "true" | "1" | "yes")
    )
}

fn parse_optional_int(value: Option<&str>, min: i32) -> Result<Option<i32>, String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => match raw.parse::<i32>() {
            Ok(n) if n >= min => Ok(Some(n)),
            Ok(_) => Err(format!("Must be at least {min}")),
            Err(_) => Err(format!("'{raw}' is not a whole number")),
        },
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(media_type: &str) -> DemoMediaFields {
        DemoMediaFields {
            media_type: media_type.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn blank_order_index_is_left_for_the_database() {
        let mut f = fields("image");
        f.order_index = Some("  ".into());
        let insert = f.into_insert("https://cdn/x.png".into()).unwrap();
        assert_eq!(insert.order_index, None);
        assert_eq!(insert.media_type, MediaType::Image);
        assert!(insert.muted);
        assert!(!insert.autoplay);
    }

    #[test]
    fn explicit_values_are_parsed() {
        let mut f = fields("Video");
        f.order_index = Some("4".into());
        f.duration_seconds = Some("90".into());
        f.autoplay = Some("on".into());
        f.muted = Some("false".into());
        f.media_name = Some("  Walkthrough ".into());

        let insert = f.into_insert("https://cdn/x.mp4".into()).unwrap();
        assert_eq!(insert.media_type, MediaType::Video);
        assert_eq!(insert.order_index, Some(4));
        assert_eq!(insert.duration_seconds, Some(90));
        assert!(insert.autoplay);
        assert!(!insert.muted);
        assert_eq!(insert.media_name.as_deref(), Some("Walkthrough"));
    }

    #[test]
    fn video_only_fields_are_ignored_for_images() {
        let mut f = fields("image");
        f.duration_seconds = Some("12".into());
        f.autoplay = Some("on".into());
        let insert = f.into_insert("u".into()).unwrap();
        assert_eq!(insert.duration_seconds, None);
        assert!(!insert.autoplay);
    }

    #[test]
    fn invalid_fields_are_reported_together() {
        let mut f = fields("audio");
        f.order_index = Some("-1".into());
        f.width = Some("wide".into());

        match f.into_insert("u".into()) {
            Err(AppError::ValidationError(errors)) => {
                let names: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(names, vec!["media_type", "order_index", "width"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn checkbox_values() {
        assert!(is_checked(Some("on")));
        assert!(is_checked(Some("TRUE")));
        assert!(!is_checked(Some("off")));
        assert!(!is_checked(None));
    }
}

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

static EXTENSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]{1,10}$").expect("valid extension regex"));

/// A file received from a form, fully read into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        UploadedFile {
            file_name: Some(file_name.into()),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lowercase extension of the original filename when it is a plain
    /// alphanumeric token, otherwise the one sniffed from the bytes.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .filter(|ext| EXTENSION_RE.is_match(ext))
            .or_else(|| infer::get(&self.bytes).map(|kind| kind.extension().to_string()))
    }

    pub fn mime_type(&self) -> String {
        self.content_type
            .clone()
            .filter(|ct| !ct.trim().is_empty())
            .or_else(|| infer::get(&self.bytes).map(|kind| kind.mime_type().to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }

    /// Display name derived from the original filename, without its directory.
    pub fn display_name(&self) -> Option<String> {
        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).file_name())
            .and_then(|name| name.to_str())
            .map(|name| name.chars().take(100).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn extension_comes_from_the_filename() {
        let file = UploadedFile::new("Screen Shot.PNG", vec![1, 2, 3]);
        assert_eq!(file.extension().as_deref(), Some("png"));
    }

    #[test]
    fn suspicious_extension_falls_back_to_sniffing() {
        let file = UploadedFile::new("shot.p?ng", PNG_MAGIC.to_vec());
        assert_eq!(file.extension().as_deref(), Some("png"));

        let unknown = UploadedFile::new("notes", vec![1, 2, 3]);
        assert_eq!(unknown.extension(), None);
    }

    #[test]
    fn mime_type_prefers_the_declared_one() {
        let declared = UploadedFile::new("a.png", PNG_MAGIC.to_vec()).with_content_type("image/x-custom");
        assert_eq!(declared.mime_type(), "image/x-custom");

        let sniffed = UploadedFile::new("a", PNG_MAGIC.to_vec());
        assert_eq!(sniffed.mime_type(), "image/png");

        let unknown = UploadedFile::new("a", vec![0]);
        assert_eq!(unknown.mime_type(), "application/octet-stream");
    }

    #[test]
    fn display_name_strips_directories() {
        let file = UploadedFile::new("C:/Users/me/demo.mp4", vec![]);
        assert_eq!(file.display_name().as_deref(), Some("demo.mp4"));
    }
}

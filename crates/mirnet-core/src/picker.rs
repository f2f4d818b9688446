//! File picker boundary
//!
//! Only PNG and JPEG images reach the upload orchestrator, and nothing
//! reaches it while an upload is in flight.

use crate::error::PickerError;
use mirnet_api::{Blob, SourceFile};
use std::path::Path;
use tracing::debug;

/// Media types the picker accepts
pub const ACCEPTED_MEDIA_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

/// Accepted image types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageMediaType {
    /// `image/png`
    Png,
    /// `image/jpeg`
    Jpeg,
}

impl ImageMediaType {
    /// MIME string
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Parse a MIME string, ignoring parameters and case
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Guess from a file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImageMediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drop target / file dialog
#[derive(Debug, Clone, Copy, Default)]
pub struct FilePicker;

impl FilePicker {
    /// Create picker
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Files that pass the media-type filter.
    ///
    /// A disabled picker (upload in flight) accepts nothing.
    #[must_use]
    pub fn filter(&self, files: Vec<SourceFile>, enabled: bool) -> Vec<SourceFile> {
        if !enabled {
            debug!(dropped = files.len(), "picker disabled; ignoring files");
            return Vec::new();
        }

        files
            .into_iter()
            .filter(|file| {
                let accepted = ImageMediaType::from_mime(file.blob.media_type()).is_some();
                if !accepted {
                    debug!(name = %file.name, media_type = file.blob.media_type(), "rejected file");
                }
                accepted
            })
            .collect()
    }

    /// Read a file from disk, typing it by extension
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<SourceFile, PickerError> {
        let path = path.as_ref();
        let media_type = ImageMediaType::from_path(path)
            .ok_or_else(|| PickerError::UnsupportedMediaType(path.display().to_string()))?;

        let data = tokio::fs::read(path).await.map_err(|source| PickerError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(%name, bytes = data.len(), %media_type, "loaded file");

        Ok(SourceFile::new(name, Blob::new(data, media_type.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(name: &str, media_type: &str) -> SourceFile {
        SourceFile::new(name, Blob::new(vec![1u8], media_type))
    }

    #[test]
    fn accepted_types_match_enum() {
        for mime in ACCEPTED_MEDIA_TYPES {
            let parsed = ImageMediaType::from_mime(mime).unwrap();
            assert_eq!(parsed.as_str(), mime);
        }
    }

    #[test]
    fn mime_parsing_ignores_case_and_params() {
        assert_eq!(ImageMediaType::from_mime("IMAGE/PNG"), Some(ImageMediaType::Png));
        assert_eq!(
            ImageMediaType::from_mime("image/jpeg; q=0.9"),
            Some(ImageMediaType::Jpeg)
        );
        assert_eq!(ImageMediaType::from_mime("image/gif"), None);
        assert_eq!(ImageMediaType::from_mime(""), None);
    }

    #[test]
    fn extension_guessing() {
        assert_eq!(ImageMediaType::from_path(Path::new("a.PNG")), Some(ImageMediaType::Png));
        assert_eq!(ImageMediaType::from_path(Path::new("b.jpg")), Some(ImageMediaType::Jpeg));
        assert_eq!(ImageMediaType::from_path(Path::new("c.JPEG")), Some(ImageMediaType::Jpeg));
        assert_eq!(ImageMediaType::from_path(Path::new("d.webp")), None);
        assert_eq!(ImageMediaType::from_path(Path::new("noext")), None);
    }

    #[test]
    fn filter_keeps_png_and_jpeg() {
        let picker = FilePicker::new();
        let kept = picker.filter(
            vec![
                file("a.png", "image/png"),
                file("b.gif", "image/gif"),
                file("c.jpg", "image/jpeg"),
                file("d", ""),
            ],
            true,
        );
        let names: Vec<_> = kept.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "c.jpg"]);
    }

    #[test]
    fn disabled_picker_accepts_nothing() {
        let picker = FilePicker::new();
        assert!(picker.filter(vec![file("a.png", "image/png")], false).is_empty());
    }

    #[tokio::test]
    async fn load_reads_and_types_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.JPG");
        std::fs::write(&path, [0xFFu8, 0xD8, 0xFF]).unwrap();

        let file = FilePicker::new().load(&path).await.unwrap();
        assert_eq!(file.name, "photo.JPG");
        assert_eq!(file.blob.media_type(), "image/jpeg");
        assert_eq!(file.blob.len(), 3);
    }

    #[tokio::test]
    async fn load_rejects_unsupported_extension() {
        let result = FilePicker::new().load("notes.txt").await;
        assert!(matches!(result, Err(PickerError::UnsupportedMediaType(_))));
    }

    #[tokio::test]
    async fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FilePicker::new().load(dir.path().join("absent.png")).await;
        assert!(matches!(result, Err(PickerError::Io { .. })));
    }
}

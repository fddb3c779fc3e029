use std::path::Path;

use crate::error::{StudioError, ValidationError};

/// MIME types the upload form accepts.
pub const ALLOWED_MIME_TYPES: [&str; 8] = [
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/bmp",
    "image/gif",
    "image/tiff",
    "image/webp",
    "image/svg+xml",
];

/// A file picked or dropped by the user, held in memory until it is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a local file; the MIME type comes from its extension.
    ///
    /// Size and type are checked against the file's metadata first, so a
    /// rejected file is never loaded into memory.
    pub async fn from_path(path: &Path, max_bytes: u64) -> Result<Self, StudioError> {
        let size = tokio::fs::metadata(path).await?.len();
        let mime_type = mime_from_extension(path).unwrap_or("application/octet-stream");
        check(size, mime_type, max_bytes)?;

        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::new(name, mime_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn validate(&self, max_bytes: u64) -> Result<(), ValidationError> {
        check(self.size(), &self.mime_type, max_bytes)
    }
}

/// Size is checked before type.
fn check(size: u64, mime_type: &str, max_bytes: u64) -> Result<(), ValidationError> {
    if size > max_bytes {
        return Err(ValidationError::FileTooLarge {
            size,
            limit: max_bytes,
        });
    }
    if !ALLOWED_MIME_TYPES.contains(&mime_type) {
        return Err(ValidationError::UnsupportedType {
            mime_type: mime_type.to_string(),
        });
    }
    Ok(())
}

pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "bmp" => Some("image/bmp"),
        "gif" => Some("image/gif"),
        "tif" | "tiff" => Some("image/tiff"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_UPLOAD_BYTES;

    #[test]
    fn oversized_file_is_rejected_first() {
        let file = UploadFile::new("big.exe", "application/x-msdownload", vec![0; 11]);
        assert_eq!(
            file.validate(10),
            Err(ValidationError::FileTooLarge { size: 11, limit: 10 })
        );
    }

    #[test]
    fn exactly_the_limit_is_accepted() {
        let file = UploadFile::new("edge.png", "image/png", vec![0; 64]);
        assert!(file.validate(64).is_ok());
    }

    #[test]
    fn every_allowed_type_passes_and_others_fail() {
        for mime in ALLOWED_MIME_TYPES {
            let file = UploadFile::new("a", mime, vec![1, 2, 3]);
            assert!(file.validate(MAX_UPLOAD_BYTES).is_ok(), "{mime}");
        }
        for mime in ["text/plain", "image/heic", "", "application/pdf"] {
            let file = UploadFile::new("a", mime, vec![1]);
            assert!(matches!(
                file.validate(MAX_UPLOAD_BYTES),
                Err(ValidationError::UnsupportedType { .. })
            ));
        }
    }

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(mime_from_extension(Path::new("cat.PNG")), Some("image/png"));
        assert_eq!(mime_from_extension(Path::new("scan.tif")), Some("image/tiff"));
        assert_eq!(mime_from_extension(Path::new("logo.svg")), Some("image/svg+xml"));
        assert_eq!(mime_from_extension(Path::new("notes.txt")), None);
        assert_eq!(mime_from_extension(Path::new("README")), None);
    }

    async fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("qr-studio-upload-test").join(name);
        tokio::fs::create_dir_all(&dir).await.unwrap();
        dir
    }

    #[tokio::test]
    async fn from_path_reads_bytes_and_guesses_type() {
        let path = scratch_dir("tiny").await.join("tiny.gif");
        tokio::fs::write(&path, b"GIF89a").await.unwrap();

        let file = UploadFile::from_path(&path, MAX_UPLOAD_BYTES).await.unwrap();
        assert_eq!(file.name, "tiny.gif");
        assert_eq!(file.mime_type, "image/gif");
        assert_eq!(file.size(), 6);
    }

    #[tokio::test]
    async fn oversized_file_on_disk_is_rejected_from_metadata() {
        let path = scratch_dir("sparse").await.join("huge.png");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(300 * 1024 * 1024).unwrap();
        drop(file);

        let err = UploadFile::from_path(&path, MAX_UPLOAD_BYTES).await.unwrap_err();
        assert!(matches!(
            err,
            StudioError::Validation(ValidationError::FileTooLarge {
                size: 314_572_800,
                limit: MAX_UPLOAD_BYTES
            })
        ));
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn unknown_extension_is_rejected_before_reading() {
        let path = scratch_dir("notes").await.join("notes.txt");
        tokio::fs::write(&path, b"hello").await.unwrap();

        let err = UploadFile::from_path(&path, MAX_UPLOAD_BYTES).await.unwrap_err();
        assert!(matches!(
            err,
            StudioError::Validation(ValidationError::UnsupportedType { ref mime_type })
                if mime_type == "application/octet-stream"
        ));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let path = scratch_dir("missing").await.join("gone.png");
        let err = UploadFile::from_path(&path, MAX_UPLOAD_BYTES).await.unwrap_err();
        assert!(matches!(err, StudioError::Io(_)));
    }
}

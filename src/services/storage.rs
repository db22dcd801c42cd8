use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use log::{debug, warn};
use uuid::Uuid;

use crate::errors::ApiError;

pub const MAX_ATTACHMENT_BYTES: u64 = 50 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: [&str; 8] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-ms-wmv",
    "video/webm",
];

/// A file received with a submission, still sitting in its temp location.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    pub temp_path: PathBuf,
}

impl UploadedFile {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !ALLOWED_MIME_TYPES.contains(&self.mime_type.as_str()) {
            return Err(ApiError::field(
                "attachment",
                "The attachment must be a file of type: jpeg, jpg, png, mp4, mov, avi, wmv, webm.",
            ));
        }
        if self.size > MAX_ATTACHMENT_BYTES {
            return Err(ApiError::field(
                "attachment",
                "The attachment may not be greater than 51200 kilobytes.",
            ));
        }
        Ok(())
    }

    fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| extension_for_mime(&self.mime_type).to_string())
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/x-msvideo" => "avi",
        "video/x-ms-wmv" => "wmv",
        "video/webm" => "webm",
        _ => "bin",
    }
}

/// Content type served for a stored file, by extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("wmv") => "video/x-ms-wmv",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

/// Public file store rooted at `storage_root`. Paths handed out are relative to it.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copies the upload to `complaints/<unix-ts>_<uuid>.<ext>` and returns that relative path.
    pub async fn save(&self, upload: &UploadedFile) -> Result<String, ApiError> {
        let relative = format!(
            "complaints/{}_{}.{}",
            Utc::now().timestamp(),
            Uuid::new_v4(),
            upload.extension()
        );
        let target = self.root.join(&relative);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ApiError::Internal(format!("Failed to create storage directory: {}", e)))?;
        }

        tokio::fs::copy(&upload.temp_path, &target)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to store attachment: {}", e)))?;

        debug!("Stored attachment {} ({} bytes)", relative, upload.size);
        Ok(relative)
    }

    /// Removes a stored file. A file that is already gone is not an error.
    pub async fn delete(&self, relative: &str) -> Result<(), ApiError> {
        let Some(path) = self.resolve(relative) else {
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Attachment {} was already missing", relative);
                Ok(())
            }
            Err(e) => Err(ApiError::Internal(format!("Failed to delete attachment: {}", e))),
        }
    }

    /// Absolute path for a relative one, refusing anything that escapes the root.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        if relative.as_os_str().is_empty()
            || !relative.components().all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }

    pub async fn exists(&self, relative: &str) -> bool {
        match self.resolve(relative) {
            Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(dir: &Path, name: &str, mime: &str, size: u64) -> UploadedFile {
        let temp_path = dir.join("upload.tmp");
        std::fs::write(&temp_path, b"fake image bytes").unwrap();
        UploadedFile {
            file_name: name.to_string(),
            mime_type: mime.to_string(),
            size,
            temp_path,
        }
    }

    #[test]
    fn test_validate_mime_and_size() {
        let dir = tempfile::tempdir().unwrap();
        assert!(upload(dir.path(), "a.png", "image/png", 10).validate().is_ok());
        assert!(upload(dir.path(), "a.pdf", "application/pdf", 10).validate().is_err());
        assert!(upload(dir.path(), "a.mp4", "video/mp4", MAX_ATTACHMENT_BYTES).validate().is_ok());
        assert!(upload(dir.path(), "a.mp4", "video/mp4", MAX_ATTACHMENT_BYTES + 1).validate().is_err());
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let store = AttachmentStore::new("/srv/storage");
        assert_eq!(
            store.resolve("complaints/1_x.png"),
            Some(PathBuf::from("/srv/storage/complaints/1_x.png"))
        );
        assert_eq!(store.resolve("../etc/passwd"), None);
        assert_eq!(store.resolve("/etc/passwd"), None);
        assert_eq!(store.resolve(""), None);
    }

    #[tokio::test]
    async fn test_save_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = AttachmentStore::new(dir.path().join("public"));
        let file = upload(dir.path(), "Photo.JPG", "image/jpeg", 16);

        let relative = store.save(&file).await.unwrap();
        assert!(relative.starts_with("complaints/"));
        assert!(relative.ends_with(".jpg"));
        assert!(store.exists(&relative).await);

        store.delete(&relative).await.unwrap();
        assert!(!store.exists(&relative).await);
        // second delete is a no-op
        store.delete(&relative).await.unwrap();
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("a/b.MOV")), "video/quicktime");
        assert_eq!(content_type_for(Path::new("a/b")), "application/octet-stream");
    }
}

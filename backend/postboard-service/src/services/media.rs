/// Profile image storage on the local filesystem
use crate::config::MediaConfig;
use crate::error::{AppError, Result};
use doc_store::generate_id;
use mime::Mime;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct MediaStorage {
    dir: PathBuf,
    base_url: String,
    default_image_url: String,
}

impl MediaStorage {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_image_url: config.default_image_url.clone(),
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    pub fn default_image_url(&self) -> &str {
        &self.default_image_url
    }

    /// Write an image under a random name and return its public URL.
    pub async fn save(&self, bytes: &[u8], content_type: &Mime) -> Result<String> {
        let extension = image_extension(content_type)
            .ok_or_else(|| AppError::BadRequest("Wrong file type submitted".to_string()))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("No image submitted".to_string()));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let file_name = format!("{}.{}", generate_id(), extension);
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;

        info!(%file_name, size = bytes.len(), "image stored");
        Ok(format!("{}/{}", self.base_url, file_name))
    }

    /// Read a stored image back by file name.
    ///
    /// Only flat names with an image extension resolve; anything that could
    /// step outside the media directory is treated as missing.
    pub async fn open(&self, file_name: &str) -> Result<(Vec<u8>, Mime)> {
        let not_found = || AppError::NotFound("Image not found".to_string());

        let (stem, extension) = file_name.rsplit_once('.').ok_or_else(not_found)?;
        let valid_stem = !stem.is_empty()
            && stem
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        let content_type = match extension {
            "png" => mime::IMAGE_PNG,
            "jpg" | "jpeg" => mime::IMAGE_JPEG,
            _ => return Err(not_found()),
        };
        if !valid_stem {
            return Err(not_found());
        }

        match tokio::fs::read(self.dir.join(file_name)).await {
            Ok(bytes) => Ok((bytes, content_type)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }
}

/// File extension for accepted image types.
pub fn image_extension(content_type: &Mime) -> Option<&'static str> {
    if *content_type == mime::IMAGE_PNG {
        Some("png")
    } else if *content_type == mime::IMAGE_JPEG {
        Some("jpg")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &std::path::Path) -> MediaStorage {
        MediaStorage::new(&MediaConfig {
            dir: dir.to_path_buf(),
            base_url: "http://cdn.test/media/".into(),
            default_image_url: "http://cdn.test/media/no-img.png".into(),
        })
    }

    #[test]
    fn only_png_and_jpeg_are_accepted() {
        assert_eq!(image_extension(&mime::IMAGE_PNG), Some("png"));
        assert_eq!(image_extension(&mime::IMAGE_JPEG), Some("jpg"));
        assert_eq!(image_extension(&mime::IMAGE_GIF), None);
        assert_eq!(image_extension(&mime::TEXT_PLAIN), None);
    }

    #[tokio::test]
    async fn save_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let media = storage(dir.path());

        let url = media.save(b"\x89PNG", &mime::IMAGE_PNG).await.unwrap();
        assert!(url.starts_with("http://cdn.test/media/"));
        assert!(url.ends_with(".png"));

        let name = url.rsplit('/').next().unwrap();
        assert_eq!(std::fs::read(dir.path().join(name)).unwrap(), b"\x89PNG");
    }

    #[tokio::test]
    async fn wrong_type_is_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let media = storage(&dir.path().join("nested"));

        let err = media.save(b"GIF89a", &mime::IMAGE_GIF).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(!dir.path().join("nested").exists());
    }

    #[tokio::test]
    async fn saved_image_opens_with_its_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let media = storage(dir.path());

        let url = media.save(b"\xff\xd8\xff", &mime::IMAGE_JPEG).await.unwrap();
        let name = url.rsplit('/').next().unwrap();

        let (bytes, content_type) = media.open(name).await.unwrap();
        assert_eq!(bytes, b"\xff\xd8\xff");
        assert_eq!(content_type, mime::IMAGE_JPEG);
    }

    #[tokio::test]
    async fn open_rejects_unknown_and_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"secret").unwrap();
        let media = storage(&dir.path().join("images"));

        for name in ["missing.png", "../notes.txt", "..png", "a/b.png", "noext", ".png"] {
            let err = media.open(name).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)), "{name} resolved");
        }
    }
}

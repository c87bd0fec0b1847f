//! Uploaded files and their acceptance rules.

use bytes::Bytes;
use jardin_common::{AppError, AppResult, MediaStore, StoredMedia};
use jardin_db::entities::gallery_item::MediaType;

use crate::representation::{effective_content_type, media_type_of};

/// A file part received with a request.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Client-side file name.
    pub file_name: String,
    /// Declared `Content-Type` of the part.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

impl FileUpload {
    /// Classify the upload as image or video.
    ///
    /// `field` names the input field in the error when the upload is empty
    /// or neither kind.
    pub fn inspect(&self, field: &str) -> AppResult<(MediaType, String)> {
        if self.data.is_empty() {
            return Err(AppError::field(field, "The submitted file is empty."));
        }

        let content_type = effective_content_type(self.content_type.as_deref(), &self.file_name)
            .ok_or_else(|| AppError::field(field, "Could not determine the file type."))?;

        match media_type_of(&content_type) {
            Some(kind) => Ok((kind, content_type)),
            None => Err(AppError::field(
                field,
                format!("Unsupported file type \"{content_type}\". Upload an image or a video."),
            )),
        }
    }

    /// Accept the upload only if it is an image; returns its content type.
    pub fn require_image(&self, field: &str) -> AppResult<String> {
        match self.inspect(field)? {
            (MediaType::Image, content_type) => Ok(content_type),
            (MediaType::Video, _) => Err(AppError::field(field, "Upload a valid image.")),
        }
    }

    /// Send the upload to the media store under `folder`.
    pub async fn store(
        &self,
        store: &dyn MediaStore,
        folder: &str,
        content_type: &str,
    ) -> AppResult<StoredMedia> {
        let stored = store
            .upload(folder, &self.file_name, &self.data, content_type)
            .await?;

        tracing::info!(
            folder = folder,
            key = %stored.key,
            size = stored.size,
            "Upload accepted by media store"
        );

        Ok(stored)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn upload(name: &str, content_type: Option<&str>, data: &'static [u8]) -> FileUpload {
        FileUpload {
            file_name: name.to_string(),
            content_type: content_type.map(str::to_string),
            data: Bytes::from_static(data),
        }
    }

    #[test]
    fn test_inspect_video() {
        let (kind, ct) = upload("clip.mp4", Some("video/mp4"), b"data")
            .inspect("media_file_upload")
            .unwrap();
        assert_eq!(kind, MediaType::Video);
        assert_eq!(ct, "video/mp4");
    }

    #[test]
    fn test_rejects_documents() {
        let err = upload("doc.pdf", Some("application/pdf"), b"data")
            .inspect("media_file_upload")
            .unwrap_err();
        match err {
            AppError::InvalidFields(fields) => assert!(fields.contains_key("media_file_upload")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_empty_file() {
        assert!(upload("a.png", Some("image/png"), b"").inspect("photo").is_err());
    }

    #[test]
    fn test_require_image_rejects_video() {
        assert!(upload("clip.webm", None, b"data").require_image("cover").is_err());
        assert!(upload("foto.png", None, b"data").require_image("cover").is_ok());
    }
}

//! Outward representation helpers.
//!
//! Media references are stored as the media host returned them and made
//! absolute against the request origin on the way out.

use jardin_db::entities::gallery_item::MediaType;

/// Scheme and host of the current request, e.g. `https://jardin.example`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin(String);

impl Origin {
    /// Build from a scheme and a `Host` header value.
    #[must_use]
    pub fn new(scheme: &str, host: &str) -> Self {
        Self(format!("{scheme}://{}", host.trim_end_matches('/')))
    }

    /// Take the scheme, host and port of a configured site URL.
    ///
    /// Falls back to the raw string when it does not parse as a URL.
    #[must_use]
    pub fn from_site_url(site_url: &str) -> Self {
        match url::Url::parse(site_url) {
            Ok(url) => Self(url.origin().ascii_serialization()),
            Err(_) => Self(site_url.trim_end_matches('/').to_string()),
        }
    }

    /// The origin as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Make a stored media reference absolute.
///
/// Empty or missing references give `None`. References that already carry a
/// scheme are returned unchanged.
#[must_use]
pub fn absolute_media_url(origin: &Origin, reference: Option<&str>) -> Option<String> {
    let reference = reference?.trim();
    if reference.is_empty() {
        return None;
    }
    if has_scheme(reference) {
        return Some(reference.to_string());
    }
    if reference.starts_with('/') {
        Some(format!("{}{reference}", origin.as_str()))
    } else {
        Some(format!("{}/{reference}", origin.as_str()))
    }
}

fn has_scheme(reference: &str) -> bool {
    reference.starts_with("//")
        || reference.split_once("://").is_some_and(|(scheme, _)| {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        })
}

/// Mean of the given ratings rounded to two decimals, `None` when empty.
#[must_use]
pub fn average_rating(ratings: &[i32]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    let mean = sum as f64 / ratings.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}

/// MIME type for a file extension.
#[must_use]
pub fn content_type_from_extension(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let content_type = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "heic" => "image/heic",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "ogv" => "video/ogg",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        _ => return None,
    };
    Some(content_type)
}

/// Content type of an upload.
///
/// The declared header wins unless it is missing or the generic
/// `application/octet-stream`, in which case the file extension decides.
#[must_use]
pub fn effective_content_type(declared: Option<&str>, file_name: &str) -> Option<String> {
    let declared = declared
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    declared.or_else(|| content_type_from_extension(file_name).map(str::to_string))
}

/// Gallery media type of a content type; `None` unless image or video.
#[must_use]
pub fn media_type_of(content_type: &str) -> Option<MediaType> {
    if content_type.starts_with("image/") {
        Some(MediaType::Image)
    } else if content_type.starts_with("video/") {
        Some(MediaType::Video)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin::new("https", "jardin.example")
    }

    #[test]
    fn test_relative_path_gets_origin() {
        assert_eq!(
            absolute_media_url(&origin(), Some("posts/cover1.jpg")).as_deref(),
            Some("https://jardin.example/posts/cover1.jpg")
        );
        assert_eq!(
            absolute_media_url(&origin(), Some("/media/posts/cover1.jpg")).as_deref(),
            Some("https://jardin.example/media/posts/cover1.jpg")
        );
    }

    #[test]
    fn test_absolute_url_unchanged() {
        assert_eq!(
            absolute_media_url(&origin(), Some("https://cdn.example.com/x.jpg")).as_deref(),
            Some("https://cdn.example.com/x.jpg")
        );
    }

    #[test]
    fn test_empty_reference_is_null() {
        assert_eq!(absolute_media_url(&origin(), None), None);
        assert_eq!(absolute_media_url(&origin(), Some("")), None);
    }

    #[test]
    fn test_origin_from_site_url() {
        let origin = Origin::from_site_url("http://localhost:8000/api/");
        assert_eq!(origin.as_str(), "http://localhost:8000");
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), None);
        assert_eq!(average_rating(&[3, 5, 4]), Some(4.0));
        assert_eq!(average_rating(&[5, 4, 4]), Some(4.33));
    }

    #[test]
    fn test_header_wins_over_extension() {
        assert_eq!(
            effective_content_type(Some("video/mp4"), "clip.jpg").as_deref(),
            Some("video/mp4")
        );
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(
            effective_content_type(Some("application/octet-stream"), "clip.MP4").as_deref(),
            Some("video/mp4")
        );
        assert_eq!(
            effective_content_type(None, "foto.jpeg").as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(effective_content_type(None, "notes.txt"), None);
    }

    #[test]
    fn test_media_type_of() {
        assert_eq!(media_type_of("image/png"), Some(MediaType::Image));
        assert_eq!(media_type_of("video/webm"), Some(MediaType::Video));
        assert_eq!(media_type_of("application/pdf"), None);
    }
}

use std::path::Path;

/// Reported in listings when the extension maps to no known type
pub const UNKNOWN_MIME: &str = "unknown";

/// Maps confusable reported types onto the type browsers expect for playback.
pub fn normalize_mime(mime_type: &str) -> String {
    match mime_type {
        "application/mp4" => "video/mp4".to_string(),
        other => other.to_string(),
    }
}

/// Extension-based guess, normalized. `None` when the extension is unknown.
pub fn guess_mime(name: &str) -> Option<String> {
    mime_guess::from_path(Path::new(name))
        .first()
        .map(|m| normalize_mime(m.essence_str()))
}

/// Type shown in listings.
pub fn listing_mime(name: &str) -> String {
    guess_mime(name).unwrap_or_else(|| UNKNOWN_MIME.to_string())
}

/// Type sent as `Content-Type` when streaming.
pub fn content_type_for(name: &str) -> String {
    guess_mime(name).unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string())
}

/// Audio and video play in place; everything else is offered as a download.
pub fn is_inline(content_type: &str) -> bool {
    content_type.starts_with("video/") || content_type.starts_with("audio/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("report.pdf").as_deref(), Some("application/pdf"));
        assert_eq!(guess_mime("photo.PNG").as_deref(), Some("image/png"));
        assert_eq!(guess_mime("clip.mp4").as_deref(), Some("video/mp4"));
        assert_eq!(guess_mime("noextension"), None);
    }

    #[test]
    fn test_normalize_mime() {
        assert_eq!(normalize_mime("application/mp4"), "video/mp4");
        assert_eq!(normalize_mime("audio/mpeg"), "audio/mpeg");
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(listing_mime("data.zzzunknownext"), UNKNOWN_MIME);
        assert_eq!(content_type_for("data.zzzunknownext"), "application/octet-stream");
    }

    #[test]
    fn test_is_inline() {
        assert!(is_inline("video/mp4"));
        assert!(is_inline("audio/ogg"));
        assert!(!is_inline("image/png"));
        assert!(!is_inline("application/pdf"));
    }
}

use once_cell::sync::Lazy;
use regex::Regex;

static VIDEO_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:v=|/|be/)([a-zA-Z0-9_-]{11})").expect("video id pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    pub video_id: String,
}

/// Finds the first 11-character video id that follows `v=`, `/` or `be/`.
///
/// The token is not checked against the platform; a miss there is handled by
/// the real-data adapter.
pub fn classify(topic: &str) -> Option<VideoReference> {
    VIDEO_ID_PATTERN
        .captures(topic)
        .and_then(|captures| captures.get(1))
        .map(|id| VideoReference {
            video_id: id.as_str().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(topic: &str) -> Option<String> {
        classify(topic).map(|reference| reference.video_id)
    }

    #[test]
    fn matches_watch_urls() {
        assert_eq!(
            id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(id("watch?v=dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));
    }

    #[test]
    fn matches_short_links_and_paths() {
        assert_eq!(id("https://youtu.be/kJQP7kiw5Fk"), Some("kJQP7kiw5Fk".to_string()));
        assert_eq!(
            id("https://www.youtube.com/shorts/abc_DEF-123"),
            Some("abc_DEF-123".to_string())
        );
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(
            id("/aaaaaaaaaaa and v=bbbbbbbbbbb"),
            Some("aaaaaaaaaaa".to_string())
        );
    }

    #[test]
    fn plain_keywords_do_not_match() {
        assert_eq!(id("despacito"), None);
        assert_eq!(id(""), None);
        assert_eq!(id("v=short"), None);
    }
}

//! Video link validation.

use std::sync::LazyLock;

use regex::Regex;

/// Optional scheme, optional `www.`, one of the three YouTube host forms, an
/// optional path form and an 11-character video id. Anchored at the start
/// only: trailing query parameters are accepted.
pub static VIDEO_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(https?://)?(www\.)?(youtube|youtu|youtube-nocookie)\.(com|be)/(watch\?v=|embed/|v/|.+\?v=)?([^&=%\?]{11})",
    )
    .unwrap()
});

/// Whether `url` is a recognized video link.
pub fn is_video_url(url: &str) -> bool {
    VIDEO_URL_REGEX.is_match(url)
}

/// Extract the 11-character video id from a recognized link.
pub fn video_id(url: &str) -> Option<&str> {
    VIDEO_URL_REGEX
        .captures(url)
        .and_then(|caps| caps.get(6))
        .map(|m| m.as_str())
}

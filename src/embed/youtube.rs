use std::sync::LazyLock;

use regex::Regex;

use super::{Platform, Resolver};

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:youtu\.be/|/v/|/u/\w+/|/embed/|/e/|[?&]v=)([^#&?/]*)").unwrap()
});

const ID_LENGTH: usize = 11;

pub(super) struct YouTube;

impl Resolver for YouTube {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    fn domains(&self) -> &'static [&'static str] {
        &["youtube.com", "youtu.be", "youtube-nocookie.com"]
    }

    fn extract(&self, url: &str) -> Option<String> {
        if !self.on_domain(url) {
            return None;
        }
        let id = VIDEO_ID.captures(url.trim())?.get(1)?.as_str();
        (id.len() == ID_LENGTH).then(|| id.to_owned())
    }

    fn embed_url(&self, id: &str) -> String {
        format!("https://www.youtube.com/embed/{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_link() {
        assert_eq!(
            YouTube.resolve("https://youtu.be/dQw4w9WgXcQ").unwrap().as_str(),
            "https://www.youtube.com/embed/dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_known_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=42",
            "https://www.youtube.com/v/dQw4w9WgXcQ?version=3",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/e/dQw4w9WgXcQ",
            "https://www.youtube.com/user/someone#p/u/1/dQw4w9WgXcQ",
            "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ",
        ] {
            assert_eq!(YouTube.extract(url).as_deref(), Some("dQw4w9WgXcQ"), "{url}");
        }
    }

    #[test]
    fn test_wrong_length_ids() {
        assert_eq!(YouTube.resolve("https://youtu.be/dQw4w9WgXc"), None);
        assert_eq!(YouTube.resolve("https://www.youtube.com/watch?v=dQw4w9WgXcQQ"), None);
        assert!(YouTube.recognize("https://www.youtube.com/watch?v=short"));
    }

    #[test]
    fn test_channel_is_loose_only() {
        let url = "https://www.youtube.com/@channel";
        assert!(YouTube.recognize(url));
        assert_eq!(YouTube.resolve(url), None);
    }
}

use std::sync::LazyLock;

use regex::Regex;

use super::{Platform, Resolver};

static STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://)?[^/?#]+/(?:i/web|[a-z0-9_]+)/status(?:es)?/(\d+)(?:[/?#]|$)")
        .unwrap()
});

pub(super) struct Twitter;

impl Resolver for Twitter {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn domains(&self) -> &'static [&'static str] {
        &["twitter.com", "x.com"]
    }

    fn extract(&self, url: &str) -> Option<String> {
        if !self.on_domain(url) {
            return None;
        }
        STATUS
            .captures(url.trim())
            .map(|captures| captures[1].to_owned())
    }

    fn embed_url(&self, id: &str) -> String {
        format!("https://platform.twitter.com/embed/Tweet.html?id={id}")
    }
}

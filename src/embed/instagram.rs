use std::sync::LazyLock;

use regex::Regex;

use super::{Platform, Resolver};

static POST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://)?[^/?#]+/(?:[a-z0-9_.]+/)?(?:p|reel|tv)/([A-Za-z0-9_-]+)")
        .unwrap()
});

pub(super) struct Instagram;

impl Resolver for Instagram {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    fn domains(&self) -> &'static [&'static str] {
        &["instagram.com", "instagr.am"]
    }

    fn extract(&self, url: &str) -> Option<String> {
        if !self.on_domain(url) {
            return None;
        }
        POST.captures(url.trim())
            .map(|captures| captures[1].to_owned())
    }

    fn embed_url(&self, id: &str) -> String {
        format!("https://www.instagram.com/p/{id}/embed/")
    }
}

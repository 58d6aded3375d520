use std::sync::LazyLock;

use regex::Regex;

use super::{Platform, Resolver};

static VIDEO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/@[^/?#]+/video/(\d+)").unwrap());

static BARE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

// The regex crate has no lookaround, so the boundaries are matched explicitly.
static LONG_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{19})(?:\D|$)").unwrap());

pub(super) struct TikTok;

impl Resolver for TikTok {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    fn domains(&self) -> &'static [&'static str] {
        &["tiktok.com"]
    }

    fn extract(&self, url: &str) -> Option<String> {
        let url = url.trim();
        if BARE.is_match(url) {
            return Some(url.to_owned());
        }
        if !self.on_domain(url) {
            return None;
        }
        VIDEO
            .captures(url)
            .or_else(|| LONG_ID.captures(url))
            .map(|captures| captures[1].to_owned())
    }

    fn embed_url(&self, id: &str) -> String {
        format!("https://www.tiktok.com/embed/v2/{id}")
    }
}

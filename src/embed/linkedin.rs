use std::sync::LazyLock;

use regex::Regex;

use super::{Platform, Resolver};

static URN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"urn:li:(activity|share|ugcPost):(\d+)").unwrap());

static POST_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/posts/[^/?#]*?-(activity|share|ugcPost)-(\d+)").unwrap());

pub(super) struct LinkedIn;

impl Resolver for LinkedIn {
    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }

    fn domains(&self) -> &'static [&'static str] {
        &["linkedin.com"]
    }

    /// The identifier keeps its kind: `activity:123`.
    fn extract(&self, url: &str) -> Option<String> {
        if !self.on_domain(url) {
            return None;
        }
        let url = urlencoding::decode(url.trim()).ok()?;
        URN.captures(&url)
            .or_else(|| POST_SLUG.captures(&url))
            .map(|captures| format!("{}:{}", &captures[1], &captures[2]))
    }

    fn embed_url(&self, id: &str) -> String {
        format!("https://www.linkedin.com/embed/feed/update/urn:li:{id}")
    }
}

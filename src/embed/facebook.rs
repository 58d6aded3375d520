use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::{Platform, Resolver};

static POST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?[^/?#]+/(?:[^?#]*/)?(?:posts|videos|watch|photo|permalink\.php|groups|pages|events)(?:[/?#.]|$)",
    )
    .unwrap()
});

pub(super) struct Facebook;

impl Resolver for Facebook {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    fn domains(&self) -> &'static [&'static str] {
        &["facebook.com", "fb.com", "fb.watch"]
    }

    /// No identifier is extracted: the plugin takes the whole URL.
    fn extract(&self, url: &str) -> Option<String> {
        let url = url.trim();
        (self.on_domain(url) && POST.is_match(url)).then(|| url.to_owned())
    }

    fn embed_url(&self, href: &str) -> String {
        format!(
            "https://www.facebook.com/plugins/post.php?href={}&show_text=true&width=500",
            urlencoding::encode(href)
        )
    }

    /// Unlike the other platforms, a loose match is enough to embed.
    fn resolve(&self, url: &str) -> Option<Url> {
        let url = url.trim();
        if !self.recognize(url) {
            return None;
        }
        Url::parse(&self.embed_url(url)).ok()
    }
}

//! Per-platform URL recognition and embed resolution.
//!
//! Every platform follows the same two-tier check: a strict pattern that extracts the
//! identifier an embed needs, and a loose "is this on the platform's domain" check that
//! only tells the caller a link card is appropriate.

use std::{fmt, str::FromStr};

use url::Url;

mod facebook;
mod instagram;
mod linkedin;
mod tiktok;
mod twitter;
mod youtube;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Facebook,
    Twitter,
    Instagram,
    TikTok,
    YouTube,
    LinkedIn,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Twitter,
        Platform::Instagram,
        Platform::TikTok,
        Platform::YouTube,
        Platform::Facebook,
        Platform::LinkedIn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Twitter => "twitter",
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::YouTube => "youtube",
            Platform::LinkedIn => "linkedin",
        }
    }

    pub fn resolver(self) -> &'static dyn Resolver {
        match self {
            Platform::Facebook => &facebook::Facebook,
            Platform::Twitter => &twitter::Twitter,
            Platform::Instagram => &instagram::Instagram,
            Platform::TikTok => &tiktok::TikTok,
            Platform::YouTube => &youtube::YouTube,
            Platform::LinkedIn => &linkedin::LinkedIn,
        }
    }

    pub fn recognize(self, url: &str) -> bool {
        self.resolver().recognize(url)
    }

    pub fn resolve(self, url: &str) -> Option<Url> {
        self.resolver().resolve(url)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "facebook" => Ok(Platform::Facebook),
            "twitter" | "x" => Ok(Platform::Twitter),
            "instagram" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::TikTok),
            "youtube" => Ok(Platform::YouTube),
            "linkedin" => Ok(Platform::LinkedIn),
            _ => Err(UnknownPlatform(s.to_owned())),
        }
    }
}

pub trait Resolver: Sync {
    fn platform(&self) -> Platform;

    /// Host names (and their subdomains) owned by the platform.
    fn domains(&self) -> &'static [&'static str];

    /// Strict match; yields the identifier the embed template is keyed by.
    fn extract(&self, url: &str) -> Option<String>;

    fn embed_url(&self, id: &str) -> String;

    fn on_domain(&self, url: &str) -> bool {
        host_of(url).is_some_and(|host| {
            self.domains()
                .iter()
                .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
        })
    }

    fn recognize(&self, url: &str) -> bool {
        self.extract(url).is_some() || self.on_domain(url)
    }

    /// A loose-only match resolves to `None`; the caller falls back to a link card.
    fn resolve(&self, url: &str) -> Option<Url> {
        let id = self.extract(url)?;
        Url::parse(&self.embed_url(&id)).ok()
    }
}

/// Lower-cased host of an http(s) URL. Scheme-less input is read as https.
pub(crate) fn host_of(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() || url.chars().any(char::is_whitespace) {
        return None;
    }
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{url}")).ok()?,
        Err(_) => return None,
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.host_str().map(str::to_ascii_lowercase)
}

/// First platform whose resolver recognizes the URL.
pub fn detect(url: &str) -> Option<Platform> {
    Platform::ALL
        .into_iter()
        .find(|platform| platform.resolver().on_domain(url))
        .or_else(|| {
            Platform::ALL
                .into_iter()
                .find(|platform| platform.recognize(url))
        })
}

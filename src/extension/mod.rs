//! Embed nodes: how a URL becomes a persisted block and how that block round-trips
//! through markup.
//!
//! The persisted form is a container carrying `data-type` / `data-src` (plus size and
//! title attributes) around one child: an `<iframe>` for platform embeds, an `<a>` for
//! generic link cards. Only the container's attributes are read back.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    document::{AttrValue, Document, Name, Node},
    embed::{self, Platform},
};

mod frame;

const CONTAINER_TAG: &str = "div";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbedType {
    Platform(Platform),
    Generic,
}

impl EmbedType {
    pub fn as_str(self) -> &'static str {
        match self {
            EmbedType::Platform(platform) => platform.as_str(),
            EmbedType::Generic => "generic",
        }
    }
}

impl fmt::Display for EmbedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbedType {
    type Err = embed::UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("generic") {
            return Ok(EmbedType::Generic);
        }
        s.parse().map(EmbedType::Platform)
    }
}

/// Width as a percentage of the column, 1–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Width(u8);

impl Width {
    pub const FULL: Width = Width(100);

    pub fn new(percent: u32) -> Option<Self> {
        u8::try_from(percent)
            .ok()
            .filter(|percent| (1..=100).contains(percent))
            .map(Width)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Width {
    fn default() -> Self {
        Self::FULL
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedNode {
    pub src: String,
    pub kind: EmbedType,
    pub width: Width,
    pub height: Option<u32>,
    pub title: Option<String>,
}

impl EmbedNode {
    pub fn resize(&mut self, width: Width, height: Option<u32>) {
        self.width = width;
        self.height = height;
    }

    pub(crate) fn to_markup(&self) -> (Name, IndexMap<Name, AttrValue>, Vec<Node>) {
        let mut attrs = IndexMap::<Name, AttrValue>::new();
        attrs.insert("data-type".into(), self.kind.as_str().into());
        attrs.insert("data-src".into(), self.src.clone().into());
        attrs.insert("data-width".into(), u32::from(self.width.get()).into());
        if let Some(height) = self.height {
            attrs.insert("data-height".into(), height.into());
        }
        if let Some(title) = &self.title {
            attrs.insert("data-title".into(), title.clone().into());
        }
        let child = match self.kind {
            EmbedType::Platform(platform) => frame::iframe(platform, self),
            EmbedType::Generic => frame::link_card(self),
        };
        (CONTAINER_TAG.into(), attrs, vec![child])
    }

    /// Reads a container element back. Anything malformed yields `None` so the caller
    /// can keep the element as plain markup.
    pub fn from_element(tag: &str, attrs: &IndexMap<Name, AttrValue>) -> Option<Self> {
        if !tag.eq_ignore_ascii_case(CONTAINER_TAG) {
            return None;
        }
        let kind = attrs.get("data-type")?.to_str()?.parse::<EmbedType>().ok()?;
        let src = attrs.get("data-src")?.to_str()?.trim();
        // stored markup is untrusted: the src must belong to the declared platform
        http_url(src)?;
        if matches!(kind, EmbedType::Platform(platform) if !platform.recognize(src)) {
            return None;
        }
        let width = match attrs.get("data-width") {
            Some(width) => Width::new(u32::try_from(width.to_integer()?).ok()?)?,
            None => Width::default(),
        };
        let height = match attrs.get("data-height") {
            Some(height) => Some(u32::try_from(height.to_integer()?).ok()?),
            None => None,
        };
        let title = attrs
            .get("data-title")
            .and_then(AttrValue::to_str)
            .map(ToOwned::to_owned);
        Some(Self {
            src: src.to_owned(),
            kind,
            width,
            height,
            title,
        })
    }
}

pub fn serialize(node: &EmbedNode) -> String {
    let (tag, attrs, children) = node.to_markup();
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = crate::document::html::write_element(&mut out, &tag, &attrs, &children);
    out
}

pub fn deserialize(markup: &str) -> Option<EmbedNode> {
    match Document::parse(markup).children() {
        [Node::Embed(embed)] => Some(embed.clone()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{url} is not an embeddable {platform} URL")]
pub struct EmbedRejected {
    pub platform: Platform,
    pub url: String,
    /// The URL is on the platform's domain but carries no usable identifier.
    pub on_platform: bool,
}

/// Builds the embed node for a URL without touching any document.
pub fn build(platform: Platform, url: &str) -> Result<EmbedNode, EmbedRejected> {
    let resolver = platform.resolver();
    match resolver.resolve(url) {
        Some(resolved) => Ok(EmbedNode {
            src: resolved.into(),
            kind: EmbedType::Platform(resolver.platform()),
            width: Width::default(),
            height: None,
            title: None,
        }),
        None => Err(EmbedRejected {
            platform,
            url: url.to_owned(),
            on_platform: resolver.recognize(url),
        }),
    }
}

/// Inserts a platform embed at the document cursor; the stored `src` is the resolved URL.
pub fn insert(document: &mut Document, platform: Platform, url: &str) -> Result<(), EmbedRejected> {
    let node = build(platform, url)?;
    debug!(%platform, src = %node.src, "insert embed");
    document.insert_at_cursor(Node::Embed(node));
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inserted {
    Embed(Platform),
    LinkCard,
}

/// Embed when resolvable, otherwise a generic link card for any http(s) URL.
pub fn insert_or_fallback(
    document: &mut Document,
    platform: Platform,
    url: &str,
    title: Option<String>,
) -> Result<Inserted, EmbedRejected> {
    match insert(document, platform, url) {
        Ok(()) => Ok(Inserted::Embed(platform)),
        Err(rejected) => {
            let card = link_card_node(url, title).ok_or(rejected)?;
            debug!(%platform, url, "embed unavailable, inserting link card");
            document.insert_at_cursor(Node::Embed(card));
            Ok(Inserted::LinkCard)
        }
    }
}

fn http_url(url: &str) -> Option<url::Url> {
    url::Url::parse(url.trim())
        .ok()
        .filter(|parsed| matches!(parsed.scheme(), "http" | "https"))
}

pub fn link_card_node(url: &str, title: Option<String>) -> Option<EmbedNode> {
    let parsed = http_url(url)?;
    Some(EmbedNode {
        src: parsed.into(),
        kind: EmbedType::Generic,
        width: Width::default(),
        height: None,
        title: title.filter(|title| !title.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn node(platform: Platform, url: &str) -> EmbedNode {
        build(platform, url).unwrap()
    }

    fn samples() -> Vec<EmbedNode> {
        let mut nodes = vec![
            node(Platform::Twitter, "https://twitter.com/user/status/1234567890123456789"),
            node(Platform::Instagram, "https://www.instagram.com/p/ABC123xyz/"),
            node(Platform::TikTok, "https://www.tiktok.com/@a/video/7212345678901234567"),
            node(Platform::Facebook, "https://www.facebook.com/page/posts/1?a=1&b=2"),
            node(Platform::YouTube, "https://youtu.be/dQw4w9WgXcQ"),
            node(Platform::LinkedIn, "https://www.linkedin.com/feed/update/urn:li:share:42"),
        ];
        let mut resized = node(Platform::YouTube, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        resized.resize(Width::new(50).unwrap(), Some(360));
        nodes.push(resized);
        nodes.push(link_card_node("https://example.com/a?b=c&d=\"e\"", Some("A <b> title".into())).unwrap());
        nodes
    }

    #[test]
    fn test_round_trip() {
        for node in samples() {
            let markup = serialize(&node);
            assert_eq!(deserialize(&markup), Some(node), "{markup}");
        }
    }

    #[test]
    fn test_serialized_shape() {
        let markup = serialize(&node(Platform::Twitter, "https://x.com/u/status/99"));
        assert!(markup.starts_with(
            r#"<div data-type="twitter" data-src="https://platform.twitter.com/embed/Tweet.html?id=99" data-width="100">"#
        ));
        assert!(markup.contains(r#"<iframe src="https://platform.twitter.com/embed/Tweet.html?id=99" width="100%""#));
        assert!(markup.ends_with("</iframe></div>"));
    }

    #[test]
    fn test_stored_src_is_resolved_url() {
        let mut document = Document::new();
        insert(&mut document, Platform::Instagram, "https://www.instagram.com/reel/XYZ/").unwrap();
        let embeds = document.embeds().collect::<Vec<_>>();
        assert_eq!(embeds.len(), 1);
        assert_eq!(embeds[0].src, "https://www.instagram.com/p/XYZ/embed/");
        assert_eq!(embeds[0].kind, EmbedType::Platform(Platform::Instagram));
    }

    #[test]
    fn test_rejection_leaves_document_untouched() {
        let mut document = Document::new();
        let rejected = insert(&mut document, Platform::YouTube, "https://www.youtube.com/@channel").unwrap_err();
        assert!(rejected.on_platform);
        assert!(document.children().is_empty());

        let rejected = insert(&mut document, Platform::YouTube, "not-a-url").unwrap_err();
        assert!(!rejected.on_platform);
    }

    #[test]
    fn test_fallback_to_link_card() {
        let mut document = Document::new();
        assert_eq!(
            insert_or_fallback(&mut document, Platform::Twitter, "https://twitter.com/someone", None),
            Ok(Inserted::LinkCard)
        );
        assert_eq!(
            insert_or_fallback(&mut document, Platform::Twitter, "https://x.com/a/status/1", None),
            Ok(Inserted::Embed(Platform::Twitter))
        );
        assert!(insert_or_fallback(&mut document, Platform::Twitter, "not-a-url", None).is_err());
        let kinds = document.embeds().map(|embed| embed.kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![EmbedType::Generic, EmbedType::Platform(Platform::Twitter)]
        );
    }

    #[test]
    fn test_malformed_containers_are_skipped() {
        for markup in [
            r#"<div data-type="myspace" data-src="https://myspace.com/x"><iframe></iframe></div>"#,
            r#"<div data-type="youtube" data-src=""><iframe></iframe></div>"#,
            r#"<div data-type="youtube" data-src="https://www.youtube.com/embed/dQw4w9WgXcQ" data-width="0"></div>"#,
            r#"<div data-type="youtube" data-src="https://www.youtube.com/embed/dQw4w9WgXcQ" data-width="wide"></div>"#,
            r#"<span data-type="youtube" data-src="https://www.youtube.com/embed/dQw4w9WgXcQ"></span>"#,
            r#"<div data-type="youtube" data-src="https://evil.example/x"></div>"#,
            r#"<div data-type="youtube" data-src="dQw4w9WgXcQ"></div>"#,
            r#"<div data-type="generic" data-src="javascript:alert(1)"></div>"#,
            r#"<div data-type="generic" data-src="/relative/path"></div>"#,
            r#"<p>plain</p>"#,
        ] {
            assert_eq!(deserialize(markup), None, "{markup}");
        }
    }

    #[test]
    fn test_malformed_container_survives_document_parse() {
        let document = Document::parse(
            r#"<p>before</p><div data-type="myspace" data-src="x"></div><div data-type="youtube" data-src="https://www.youtube.com/embed/dQw4w9WgXcQ"></div>"#,
        );
        assert_eq!(document.children().len(), 3);
        assert!(matches!(document.children()[1], Node::Element { .. }));
        assert_eq!(document.embeds().count(), 1);
    }

    #[test]
    fn test_width_bounds() {
        assert_eq!(Width::new(0), None);
        assert_eq!(Width::new(101), None);
        assert_eq!(Width::new(1).map(Width::get), Some(1));
        assert_eq!(Width::default().get(), 100);
    }
}

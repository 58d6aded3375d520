//! Title and preview metadata for generic link cards.

use std::sync::LazyLock;

use indexmap::IndexMap;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

static OG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property^="og:"]"#).unwrap());
static TWITTER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name^="twitter:"]"#).unwrap());
static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static DESCRIPTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkCard {
    pub href: Url,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<Url>,
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("not an http(s) link: {0}")]
    NotHttp(String),
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(reqwest::StatusCode),
}

impl LinkCard {
    pub fn fallback(href: Url) -> Self {
        let title = href
            .host_str()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| href.to_string());
        Self {
            href,
            title,
            description: None,
            image: None,
        }
    }
}

fn parse_card(href: Url, html: &str) -> LinkCard {
    let doc = Html::parse_document(html);
    let meta_props = doc
        .select(&OG_SELECTOR)
        .filter_map(|meta| Some((meta.value().attr("property")?, meta.value().attr("content")?)))
        .chain(
            doc.select(&TWITTER_SELECTOR)
                .filter_map(|meta| Some((meta.value().attr("name")?, meta.value().attr("content")?))),
        )
        .collect::<IndexMap<_, _>>();
    let prop = |og: &str, twitter: &str| {
        meta_props
            .get(og)
            .or_else(|| meta_props.get(twitter))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
    };

    let title = prop("og:title", "twitter:title").or_else(|| {
        doc.select(&TITLE_SELECTOR)
            .next()
            .map(|tag| tag.text().collect::<String>().trim().to_owned())
            .filter(|title| !title.is_empty())
    });
    let description = prop("og:description", "twitter:description").or_else(|| {
        doc.select(&DESCRIPTION_SELECTOR)
            .next()
            .and_then(|tag| tag.attr("content"))
            .map(ToOwned::to_owned)
    });
    // relative image paths resolve against the page
    let image = prop("og:image", "twitter:image").and_then(|image| href.join(&image).ok());

    let mut card = LinkCard::fallback(href);
    if let Some(title) = title {
        card.title = title;
    }
    card.description = description;
    card.image = image;
    card
}

async fn fetch_card(client: &reqwest::Client, href: &Url) -> Result<LinkCard, Error> {
    if !matches!(href.scheme(), "http" | "https") {
        return Err(Error::NotHttp(href.to_string()));
    }
    let response = client
        .get(href.clone())
        .header("Accept", "text/html")
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(Error::Status(response.status()));
    }
    let html = response.text().await?;
    Ok(parse_card(href.clone(), &html))
}

/// Never fails: any fetch or parse problem yields a card titled with the host name.
pub async fn resolve_link_card(client: &reqwest::Client, href: Url) -> LinkCard {
    match fetch_card(client, &href).await {
        Ok(card) => {
            info!(?card, "link card resolved");
            card
        }
        Err(e) => {
            warn!(%e, %href, "failed to resolve link card");
            LinkCard::fallback(href)
        }
    }
}

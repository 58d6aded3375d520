use indexmap::IndexMap;

use crate::{
    document::{AttrValue, Name, Node},
    embed::Platform,
    extension::EmbedNode,
};

/// Frame height used when the node carries none; each player has its own natural size.
fn default_height(platform: Platform) -> u32 {
    match platform {
        Platform::Twitter => 500,
        Platform::Instagram => 540,
        Platform::TikTok => 740,
        Platform::Facebook => 600,
        Platform::YouTube => 315,
        Platform::LinkedIn => 570,
    }
}

fn allow(platform: Platform) -> Option<&'static str> {
    match platform {
        Platform::YouTube => Some(
            "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture; web-share",
        ),
        Platform::Facebook => Some("autoplay; clipboard-write; encrypted-media; picture-in-picture; web-share"),
        Platform::TikTok => Some("encrypted-media"),
        Platform::Twitter | Platform::Instagram | Platform::LinkedIn => None,
    }
}

pub(super) fn iframe(platform: Platform, node: &EmbedNode) -> Node {
    let mut attrs = IndexMap::<Name, AttrValue>::new();
    attrs.insert("src".into(), node.src.clone().into());
    attrs.insert("width".into(), format!("{}%", node.width.get()).into());
    attrs.insert(
        "height".into(),
        node.height.unwrap_or_else(|| default_height(platform)).into(),
    );
    attrs.insert("frameborder".into(), "0".into());
    attrs.insert("scrolling".into(), "no".into());
    if let Some(allow) = allow(platform) {
        attrs.insert("allow".into(), allow.into());
    }
    attrs.insert("allowfullscreen".into(), true.into());
    attrs.insert("loading".into(), "lazy".into());
    Node::Element {
        tag: "iframe".into(),
        attrs,
        children: Vec::new(),
    }
}

pub(super) fn link_card(node: &EmbedNode) -> Node {
    let mut attrs = IndexMap::<Name, AttrValue>::new();
    attrs.insert("href".into(), node.src.clone().into());
    attrs.insert("target".into(), "_blank".into());
    attrs.insert("rel".into(), "noopener noreferrer".into());
    let label = node.title.as_deref().unwrap_or(&node.src);
    Node::Element {
        tag: "a".into(),
        attrs,
        children: vec![Node::Text(html_escape::encode_text(label).into_owned())],
    }
}

//! HTML-backed rich-text document tree.
//!
//! Parsing goes through `html_parser`; elements that carry an embed container or an
//! image are lifted into [`Node::Embed`] and [`Node::Image`] so the rest of the crate
//! never has to inspect raw attributes.

use indexmap::IndexMap;
use tracing::warn;

use crate::extension::EmbedNode;

pub mod html;
mod types;
pub use types::{AttrValue, Name};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element {
        tag: Name,
        attrs: IndexMap<Name, AttrValue>,
        children: Vec<Node>,
    },
    Text(String),
    Embed(EmbedNode),
    Image(ImageNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageNode {
    pub src: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub alt: Option<String>,
    /// Every other attribute the element carried, written back unchanged.
    pub attrs: IndexMap<Name, AttrValue>,
}

impl ImageNode {
    pub(crate) fn to_markup(&self) -> (Name, IndexMap<Name, AttrValue>) {
        let mut attrs = IndexMap::<Name, AttrValue>::new();
        attrs.insert("src".into(), self.src.clone().into());
        if let Some(width) = self.width {
            attrs.insert("width".into(), width.into());
        }
        if let Some(height) = self.height {
            attrs.insert("height".into(), height.into());
        }
        if let Some(alt) = &self.alt {
            attrs.insert("alt".into(), alt.clone().into());
        }
        attrs.extend(
            self.attrs
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        ("img".into(), attrs)
    }

    /// Images without a source are left as plain elements.
    pub(crate) fn from_attrs(mut attrs: IndexMap<Name, AttrValue>) -> Result<Self, IndexMap<Name, AttrValue>> {
        let src = match attrs.get("src").and_then(AttrValue::to_str) {
            Some(src) if !src.is_empty() => src.to_owned(),
            _ => return Err(attrs),
        };
        // a dimension that is not a number stays a plain attribute
        let mut dimension = |name: &str| {
            let value = attrs
                .get(name)
                .and_then(AttrValue::to_integer)
                .and_then(|v| u32::try_from(v).ok())?;
            attrs.shift_remove(name);
            Some(value)
        };
        let width = dimension("width");
        let height = dimension("height");
        attrs.shift_remove("src");
        let alt = match attrs.shift_remove("alt") {
            Some(AttrValue::OwnedStr(alt)) => Some(alt),
            Some(AttrValue::StaticStr(alt)) => Some(alt.to_owned()),
            Some(other) => {
                attrs.insert("alt".into(), other);
                None
            }
            None => None,
        };
        Ok(Self {
            src,
            width,
            height,
            alt,
            attrs,
        })
    }
}

fn lift_element(tag: Name, attrs: IndexMap<Name, AttrValue>, children: Vec<Node>) -> Node {
    let attrs = if tag.eq_ignore_ascii_case("img") {
        match ImageNode::from_attrs(attrs) {
            Ok(image) => return Node::Image(image),
            Err(attrs) => attrs,
        }
    } else {
        attrs
    };
    if let Some(embed) = EmbedNode::from_element(&tag, &attrs) {
        return Node::Embed(embed);
    }
    Node::Element {
        tag,
        attrs,
        children,
    }
}

impl From<html_parser::Node> for Node {
    fn from(value: html_parser::Node) -> Self {
        match value {
            html_parser::Node::Comment(_) => Node::Text(String::new()),
            html_parser::Node::Text(text) => Node::Text(text),
            html_parser::Node::Element(html_parser::Element {
                id,
                name,
                children,
                attributes,
                classes,
                ..
            }) => {
                let mut attributes = attributes.into_iter().collect::<Vec<_>>();
                attributes.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));
                let mut attrs = attributes
                    .into_iter()
                    .map(|(name, value)| match value {
                        Some(value) => (
                            name.into(),
                            html_escape::decode_html_entities(&value).into_owned().into(),
                        ),
                        None => (name.into(), AttrValue::Bool(true)),
                    })
                    .collect::<IndexMap<Name, AttrValue>>();
                if let Some(id) = id {
                    attrs.insert("id".into(), id.into());
                }
                if !classes.is_empty() {
                    attrs.insert("class".into(), classes.join(" ").into());
                }
                let children = children.into_iter().map(Into::into).collect();
                lift_element(name.into(), attrs, children)
            }
        }
    }
}

/// A document plus the position new blocks are inserted at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    children: Vec<Node>,
    cursor: usize,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Malformed markup degrades to a single text node instead of failing the parse.
    pub fn parse(src: &str) -> Self {
        if src.trim().is_empty() {
            return Self::default();
        }
        let children: Vec<Node> = match html_parser::Dom::parse(src) {
            Ok(dom) => dom.children.into_iter().map(Into::into).collect(),
            Err(e) => {
                warn!(%e, "failed to parse html");
                vec![Node::Text(src.to_string())]
            }
        };
        let cursor = children.len();
        Self { children, cursor }
    }

    pub fn from_nodes(children: Vec<Node>) -> Self {
        let cursor = children.len();
        Self { children, cursor }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, position: usize) {
        self.cursor = position.min(self.children.len());
    }

    pub fn insert_at_cursor(&mut self, node: Node) {
        self.children.insert(self.cursor, node);
        self.cursor += 1;
    }

    pub fn remove(&mut self, index: usize) -> Option<Node> {
        if index >= self.children.len() {
            return None;
        }
        if index < self.cursor {
            self.cursor -= 1;
        }
        Some(self.children.remove(index))
    }

    /// Removes every node, at any depth, matching the predicate. Returns how many went.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&Node) -> bool) -> usize {
        let before_cursor = self.children[..self.cursor]
            .iter()
            .filter(|node| predicate(node))
            .count();
        let mut removed = 0;
        self.children.retain(|node| {
            let keep = !predicate(node);
            if !keep {
                removed += 1;
            }
            keep
        });
        self.cursor -= before_cursor;
        for node in &mut self.children {
            removed += remove_nested(node, &mut predicate);
        }
        removed
    }

    pub fn images(&self) -> Vec<&ImageNode> {
        let mut out = Vec::new();
        collect_images(&self.children, &mut out);
        out
    }

    pub fn for_each_image_mut(&mut self, mut f: impl FnMut(&mut ImageNode)) {
        visit_images_mut(&mut self.children, &mut f);
    }

    pub fn embeds(&self) -> impl Iterator<Item = &EmbedNode> {
        let mut out = Vec::new();
        collect_embeds(&self.children, &mut out);
        out.into_iter()
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = html::write_nodes(&mut out, &self.children);
        out
    }
}

fn remove_nested(node: &mut Node, predicate: &mut impl FnMut(&Node) -> bool) -> usize {
    let Node::Element { children, .. } = node else {
        return 0;
    };
    let before = children.len();
    children.retain(|child| !predicate(child));
    let mut removed = before - children.len();
    for child in children {
        removed += remove_nested(child, predicate);
    }
    removed
}

fn collect_images<'a>(nodes: &'a [Node], out: &mut Vec<&'a ImageNode>) {
    for node in nodes {
        match node {
            Node::Image(image) => out.push(image),
            Node::Element { children, .. } => collect_images(children, out),
            Node::Text(_) | Node::Embed(_) => {}
        }
    }
}

fn collect_embeds<'a>(nodes: &'a [Node], out: &mut Vec<&'a EmbedNode>) {
    for node in nodes {
        match node {
            Node::Embed(embed) => out.push(embed),
            Node::Element { children, .. } => collect_embeds(children, out),
            Node::Text(_) | Node::Image(_) => {}
        }
    }
}

fn visit_images_mut(nodes: &mut [Node], f: &mut impl FnMut(&mut ImageNode)) {
    for node in nodes {
        match node {
            Node::Image(image) => f(image),
            Node::Element { children, .. } => visit_images_mut(children, f),
            Node::Text(_) | Node::Embed(_) => {}
        }
    }
}

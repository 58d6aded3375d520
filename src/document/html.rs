use std::fmt::Write;

use indexmap::IndexMap;

use crate::document::{
    Node,
    types::{AttrValue, Name},
};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

pub(crate) fn write_attrs<W: Write>(
    out: &mut W,
    attrs: &IndexMap<Name, AttrValue>,
) -> std::fmt::Result {
    for (name, value) in attrs {
        match value {
            AttrValue::Bool(false) => {}
            AttrValue::Bool(true) => write!(out, " {name}")?,
            AttrValue::Integer(i) => write!(out, " {name}=\"{i}\"")?,
            AttrValue::OwnedStr(s) => write!(
                out,
                " {name}=\"{}\"",
                html_escape::encode_double_quoted_attribute(s)
            )?,
            AttrValue::StaticStr(s) => write!(
                out,
                " {name}=\"{}\"",
                html_escape::encode_double_quoted_attribute(s)
            )?,
        }
    }
    Ok(())
}

pub(crate) fn write_element<W: Write>(
    out: &mut W,
    tag: &Name,
    attrs: &IndexMap<Name, AttrValue>,
    children: &[Node],
) -> std::fmt::Result {
    write!(out, "<{tag}")?;
    write_attrs(out, attrs)?;
    if is_void(tag) {
        return out.write_str("/>");
    }
    out.write_char('>')?;
    write_nodes(out, children)?;
    write!(out, "</{tag}>")
}

/// Text nodes are written verbatim: they keep the escaped form they were parsed with.
pub(crate) fn write_nodes<W: Write>(out: &mut W, nodes: &[Node]) -> std::fmt::Result {
    for node in nodes {
        match node {
            Node::Text(text) => out.write_str(text)?,
            Node::Element {
                tag,
                attrs,
                children,
            } => write_element(out, tag, attrs, children)?,
            Node::Embed(embed) => {
                let (tag, attrs, children) = embed.to_markup();
                write_element(out, &tag, &attrs, &children)?;
            }
            Node::Image(image) => {
                let (tag, attrs) = image.to_markup();
                write_element(out, &tag, &attrs, &[])?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use indexmap::indexmap;

    use super::*;

    #[test]
    fn test_escape_attribute_values() {
        let mut out = String::new();
        write_attrs(
            &mut out,
            &indexmap! {
                "href".into() => "https://example.com/?a=1&b=\"2\"".into(),
                "hidden".into() => true.into(),
                "draggable".into() => false.into(),
            },
        )
        .unwrap();
        assert_eq!(
            out,
            r#" href="https://example.com/?a=1&amp;b=&quot;2&quot;" hidden"#
        );
    }

    #[test]
    fn test_void_and_container_elements() {
        let mut out = String::new();
        write_nodes(
            &mut out,
            &[
                Node::Element {
                    tag: "p".into(),
                    attrs: Default::default(),
                    children: vec![Node::Text("a &amp; b".into())],
                },
                Node::Element {
                    tag: "br".into(),
                    attrs: Default::default(),
                    children: vec![],
                },
            ],
        )
        .unwrap();
        assert_eq!(out, "<p>a &amp; b</p><br/>");
    }
}

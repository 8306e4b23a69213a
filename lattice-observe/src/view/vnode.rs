//! Rendered Output
//!
//! A `VNode` is what a render function produces. The runtime only stores the
//! latest output per instance; it never diffs two trees.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

/// A node of rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VNode {
    Text {
        text: String,
    },
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
        children: Vec<VNode>,
    },
}

impl VNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::Element {
            tag: tag.into(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute. No effect on text nodes.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Element { attrs, .. } = &mut self {
            attrs.insert(name.into(), value.into());
        }
        self
    }

    /// Append a child. No effect on text nodes.
    pub fn child(mut self, node: VNode) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.push(node);
        }
        self
    }

    pub fn children<I>(self, nodes: I) -> Self
    where
        I: IntoIterator<Item = VNode>,
    {
        nodes.into_iter().fold(self, VNode::child)
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Element { children, .. } => children.iter().map(VNode::text_content).collect(),
        }
    }
}

fn escape(text: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for ch in text.chars() {
        match ch {
            '&' => f.write_str("&amp;")?,
            '<' => f.write_str("&lt;")?,
            '>' => f.write_str("&gt;")?,
            '"' => f.write_str("&quot;")?,
            _ => write!(f, "{ch}")?,
        }
    }
    Ok(())
}

impl fmt::Display for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { text } => escape(text, f),
            Self::Element {
                tag,
                attrs,
                children,
            } => {
                write!(f, "<{tag}")?;
                for (name, value) in attrs {
                    write!(f, " {name}=\"")?;
                    escape(value, f)?;
                    f.write_str("\"")?;
                }
                f.write_str(">")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                write!(f, "</{tag}>")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_markup() {
        let node = VNode::element("p")
            .attr("class", "count")
            .child(VNode::text("a < b"));

        assert_eq!(node.to_string(), r#"<p class="count">a &lt; b</p>"#);
        assert_eq!(node.text_content(), "a < b");
    }

    #[test]
    fn serializes_with_type_tag() {
        let node = VNode::element("ul").children([VNode::text("1"), VNode::text("2")]);

        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "type": "element",
                "tag": "ul",
                "attrs": {},
                "children": [
                    {"type": "text", "text": "1"},
                    {"type": "text", "text": "2"}
                ]
            })
        );
    }
}

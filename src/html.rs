use crate::node::{ContentNode, ElementNode};
use html5ever::{LocalName, Namespace, QualName};
use kuchiki::traits::TendrilSink;
use kuchiki::{Attribute, ExpandedName, NodeData, NodeRef};

// Void and raw-text elements are only recognized in the HTML namespace.
const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parses markup as the inner content of a container element. Comments,
/// doctypes and processing instructions are dropped.
pub fn parse_fragment(markup: &str) -> Vec<ContentNode> {
    // The explicit <body> keeps leading <script>/<style> in body instead of
    // letting the parser hoist them into <head>.
    let document = kuchiki::parse_html().one(format!("<body>{markup}</body>"));
    let Ok(body) = document.select_first("body") else {
        return Vec::new();
    };
    body.as_node()
        .children()
        .filter_map(|child| convert_node(&child))
        .collect()
}

fn convert_node(node: &NodeRef) -> Option<ContentNode> {
    match node.data() {
        NodeData::Element(el) => {
            let mut element = ElementNode::new(el.name.local.as_ref());
            let attrs = el.attributes.borrow();
            for (key, attr) in attrs.map.iter() {
                element
                    .attributes
                    .push((key.local.as_ref().to_string(), attr.value.clone()));
            }
            element.children = node
                .children()
                .filter_map(|child| convert_node(&child))
                .collect();
            Some(ContentNode::Element(element))
        }
        NodeData::Text(text) => Some(ContentNode::Text(text.borrow().clone())),
        _ => None,
    }
}

/// Serializes a list of sibling nodes, e.g. a container's children.
pub fn to_markup(nodes: &[ContentNode]) -> String {
    let fragment = NodeRef::new(NodeData::DocumentFragment);
    for node in nodes {
        fragment.append(to_kuchiki(node));
    }
    fragment.to_string()
}

impl ContentNode {
    pub fn to_markup(&self) -> String {
        to_kuchiki(self).to_string()
    }
}

fn to_kuchiki(node: &ContentNode) -> NodeRef {
    match node {
        ContentNode::Text(text) => NodeRef::new_text(text.as_str()),
        ContentNode::Element(el) => {
            let attributes = el.attributes.iter().map(|(key, value)| {
                (
                    ExpandedName::new(Namespace::from(""), LocalName::from(key.as_str())),
                    Attribute {
                        prefix: None,
                        value: value.clone(),
                    },
                )
            });
            let name = QualName::new(
                None,
                Namespace::from(HTML_NAMESPACE),
                LocalName::from(el.tag.as_str()),
            );
            let element = NodeRef::new_element(name, attributes);
            for child in &el.children {
                element.append(to_kuchiki(child));
            }
            element
        }
    }
}

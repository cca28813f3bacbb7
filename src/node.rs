/// An owned piece of rich content: an element with ordered children, or a
/// run of text.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentNode {
    Element(ElementNode),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    /// Lowercase tag name.
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<ContentNode>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// A copy of this element without its children.
    pub fn shallow_clone(&self) -> ElementNode {
        ElementNode {
            tag: self.tag.clone(),
            attributes: self.attributes.clone(),
            children: Vec::new(),
        }
    }
}

impl ContentNode {
    pub fn element(tag: impl Into<String>) -> ContentNode {
        ContentNode::Element(ElementNode::new(tag))
    }

    pub fn text(text: impl Into<String>) -> ContentNode {
        ContentNode::Text(text.into())
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> ContentNode {
        if let ContentNode::Element(el) = &mut self {
            el.attributes.push((name.into().to_ascii_lowercase(), value.into()));
        }
        self
    }

    pub fn with_child(mut self, child: ContentNode) -> ContentNode {
        if let ContentNode::Element(el) = &mut self {
            el.children.push(child);
        }
        self
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            ContentNode::Element(el) => Some(el),
            ContentNode::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[ContentNode] {
        match self {
            ContentNode::Element(el) => &el.children,
            ContentNode::Text(_) => &[],
        }
    }

    /// Concatenated text of this node and its descendants, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            ContentNode::Text(text) => out.push_str(text),
            ContentNode::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element(ElementNode),
    Text(String),
}

#[derive(Debug, Clone)]
struct TreeNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena snapshot of a container's live content. Ids are assigned in
/// pre-order starting with the container itself at `NodeId(0)`, so a host
/// that builds its own `RenderTree` from the same content sees the same ids.
#[derive(Debug, Clone)]
pub struct RenderTree {
    nodes: Vec<TreeNode>,
}

impl RenderTree {
    pub fn from_root(root: &ContentNode) -> Self {
        let mut tree = RenderTree { nodes: Vec::new() };
        tree.insert(root, None);
        tree
    }

    fn insert(&mut self, node: &ContentNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let kind = match node {
            ContentNode::Element(el) => NodeKind::Element(el.shallow_clone()),
            ContentNode::Text(text) => NodeKind::Text(text.clone()),
        };
        self.nodes.push(TreeNode {
            kind,
            parent,
            children: Vec::new(),
        });
        for child in node.children() {
            let child_id = self.insert(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementNode> {
        match self.nodes.get(id.0).map(|node| &node.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(id.0).map(|node| &node.kind) {
            Some(NodeKind::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Element copy of `id` with no children.
    pub fn shallow_clone(&self, id: NodeId) -> ContentNode {
        match self.nodes.get(id.0).map(|node| &node.kind) {
            Some(NodeKind::Element(el)) => ContentNode::Element(el.shallow_clone()),
            Some(NodeKind::Text(text)) => ContentNode::Text(text.clone()),
            None => ContentNode::Text(String::new()),
        }
    }

    /// Deep, independent copy of the subtree rooted at `id`.
    pub fn clone_subtree(&self, id: NodeId) -> ContentNode {
        let mut node = self.shallow_clone(id);
        if let ContentNode::Element(el) = &mut node {
            el.children = self
                .children(id)
                .iter()
                .map(|child| self.clone_subtree(*child))
                .collect();
        }
        node
    }
}

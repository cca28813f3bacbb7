//! Deterministic in-memory host used by the unit tests.
//!
//! Layout model: every char is one column wide and a line holds `columns`
//! chars. Lines are `line_height` tall and glyph boxes `glyph_height` tall,
//! vertically centered in the line. Block tags start and end lines; inline
//! tags flow; `data-height="N"` makes an atomic block box of N px;
//! `script` and `data-hidden` subtrees are not rendered. A container with a
//! scale factor reports every rendered length multiplied by it.

use crate::geometry::{ComputedStyle, Display, ElementBox, Geometry, RangeBox, RenderHost};
use crate::node::{ContentNode, NodeId, RenderTree};
use crate::types::{Insets, Px};
use std::cell::{Cell, RefCell};

const BLOCK_TAGS: &[&str] = &[
    "div", "p", "section", "article", "ul", "ol", "li", "table", "tr", "td", "h1", "h2", "h3",
    "blockquote", "pre",
];

#[derive(Debug, Clone)]
pub(crate) struct MockContainer {
    height: Px,
    insets: Insets,
    scale: f64,
    root: ContentNode,
    layout: Layout,
}

impl MockContainer {
    pub fn new(height: i32) -> Self {
        Self {
            height: Px::from_i32(height),
            insets: Insets::default(),
            scale: 1.0,
            root: container_root(&[]),
            layout: Layout::default(),
        }
    }

    pub fn insets(mut self, insets: Insets) -> Self {
        self.insets = insets;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Metrics {
    columns: usize,
    line_height: Px,
    glyph_height: Px,
}

impl Metrics {
    fn lead(&self) -> Px {
        (self.line_height - self.glyph_height) / 2
    }
}

#[derive(Debug, Clone, Default)]
struct Layout {
    tree: Option<RenderTree>,
    boxes: Vec<(Px, Px)>,
    block: Vec<bool>,
    // Per text node: line top of every char; empty when not rendered.
    glyphs: Vec<Vec<Px>>,
    // Per text node: caret used for empty or hidden selections.
    carets: Vec<Px>,
    content_bottom: Px,
}

struct Cursor {
    y: Px,
    col: usize,
}

impl Cursor {
    fn close_line(&mut self, metrics: &Metrics) {
        if self.col > 0 {
            self.y += metrics.line_height;
            self.col = 0;
        }
    }
}

fn container_root(children: &[ContentNode]) -> ContentNode {
    let mut root = ContentNode::element("div").with_attr("class", "container");
    for child in children {
        root = root.with_child(child.clone());
    }
    root
}

fn is_hidden(tree: &RenderTree, id: NodeId) -> bool {
    tree.element(id)
        .map(|el| el.tag == "script" || el.attr("data-hidden").is_some())
        .unwrap_or(false)
}

fn atomic_height(tree: &RenderTree, id: NodeId) -> Option<Px> {
    tree.element(id)
        .and_then(|el| el.attr("data-height"))
        .and_then(|value| value.parse::<f64>().ok())
        .map(Px::from_f64)
}

impl Layout {
    fn compute(root: &ContentNode, top: Px, metrics: &Metrics) -> Layout {
        let tree = RenderTree::from_root(root);
        let n = tree.len();
        let mut layout = Layout {
            tree: None,
            boxes: vec![(Px::ZERO, Px::ZERO); n],
            block: vec![false; n],
            glyphs: vec![Vec::new(); n],
            carets: vec![Px::ZERO; n],
            content_bottom: Px::ZERO,
        };
        let mut cursor = Cursor { y: top, col: 0 };
        for child in tree.children(tree.root()).to_vec() {
            layout.place(&tree, child, &mut cursor, metrics, false);
        }
        cursor.close_line(metrics);
        layout.content_bottom = cursor.y;
        layout.block[0] = true;
        layout.tree = Some(tree);
        layout
    }

    // Returns the painted extent of the node, if any.
    fn place(
        &mut self,
        tree: &RenderTree,
        id: NodeId,
        cursor: &mut Cursor,
        metrics: &Metrics,
        hidden: bool,
    ) -> Option<(Px, Px)> {
        let lead = metrics.lead();
        if let Some(text) = tree.text(id) {
            let caret = if cursor.col >= metrics.columns {
                cursor.y + metrics.line_height + lead
            } else {
                cursor.y + lead
            };
            self.carets[id.0] = caret;
            if hidden {
                return None;
            }
            let mut glyphs = Vec::with_capacity(text.chars().count());
            for _ in text.chars() {
                if cursor.col >= metrics.columns {
                    cursor.y += metrics.line_height;
                    cursor.col = 0;
                }
                glyphs.push(cursor.y);
                cursor.col += 1;
            }
            let extent = match (glyphs.first(), glyphs.last()) {
                (Some(first), Some(last)) => {
                    Some((*first + lead, *last + lead + metrics.glyph_height))
                }
                _ => None,
            };
            self.glyphs[id.0] = glyphs;
            return extent;
        }

        let children = tree.children(id).to_vec();
        if hidden || is_hidden(tree, id) {
            self.boxes[id.0] = (cursor.y, Px::ZERO);
            for child in children {
                self.place(tree, child, cursor, metrics, true);
            }
            return None;
        }

        if let Some(height) = atomic_height(tree, id) {
            cursor.close_line(metrics);
            let top = cursor.y;
            self.boxes[id.0] = (top, height);
            self.block[id.0] = true;
            for child in children {
                self.place(tree, child, cursor, metrics, true);
            }
            cursor.y += height;
            return Some((top, top + height));
        }

        let tag = tree.element(id).map(|el| el.tag.as_str()).unwrap_or("");
        if BLOCK_TAGS.contains(&tag) {
            cursor.close_line(metrics);
            let top = cursor.y;
            for child in children {
                self.place(tree, child, cursor, metrics, false);
            }
            cursor.close_line(metrics);
            self.boxes[id.0] = (top, cursor.y - top);
            self.block[id.0] = true;
            return Some((top, cursor.y));
        }

        let start = cursor.y + lead;
        let mut extent: Option<(Px, Px)> = None;
        for child in children {
            if let Some((top, bottom)) = self.place(tree, child, cursor, metrics, false) {
                extent = Some(match extent {
                    Some((t, b)) => (t.min(top), b.max(bottom)),
                    None => (top, bottom),
                });
            }
        }
        match extent {
            Some((top, bottom)) => self.boxes[id.0] = (top, bottom - top),
            None => self.boxes[id.0] = (start, Px::ZERO),
        }
        extent
    }
}

pub(crate) struct MockHost {
    containers: RefCell<Vec<MockContainer>>,
    metrics: Metrics,
    unsettled_samples: Cell<u32>,
    typeset_polls: Cell<u32>,
    range_queries: Cell<usize>,
    writes: RefCell<Vec<(usize, String)>>,
}

impl MockHost {
    pub fn new(containers: Vec<MockContainer>) -> Self {
        let host = Self {
            containers: RefCell::new(containers),
            metrics: Metrics {
                columns: 10,
                line_height: Px::from_i32(20),
                glyph_height: Px::from_i32(16),
            },
            unsettled_samples: Cell::new(0),
            typeset_polls: Cell::new(0),
            range_queries: Cell::new(0),
            writes: RefCell::new(Vec::new()),
        };
        host.relayout_all();
        host
    }

    pub fn with_source(containers: Vec<MockContainer>, markup: &str) -> Self {
        let host = MockHost::new(containers);
        host.set_content(0, &crate::html::parse_fragment(markup));
        host.writes.borrow_mut().clear();
        host
    }

    /// The next `samples` height samples keep growing by one pixel each.
    pub fn unsettled_for(&self, samples: u32) {
        self.unsettled_samples.set(samples);
    }

    /// Typesetting reports pending for the next `polls` queries.
    pub fn typesetting_for(&self, polls: u32) {
        self.typeset_polls.set(polls);
    }

    pub fn range_queries(&self) -> usize {
        self.range_queries.get()
    }

    pub fn writes(&self) -> Vec<(usize, String)> {
        self.writes.borrow().clone()
    }

    pub fn markup(&self, container: usize) -> String {
        crate::html::to_markup(self.containers.borrow()[container].root.children())
    }

    fn relayout_all(&self) {
        let metrics = self.metrics;
        for container in self.containers.borrow_mut().iter_mut() {
            container.layout = Layout::compute(&container.root, container.insets.top(), &metrics);
        }
    }

    fn with_layout<T>(&self, container: usize, f: impl FnOnce(&MockContainer) -> T) -> T {
        let containers = self.containers.borrow();
        f(&containers[container])
    }
}

impl Geometry for MockHost {
    fn element_box(&self, container: usize, node: NodeId) -> ElementBox {
        if node.0 == 0 {
            return self.container_box(container);
        }
        self.with_layout(container, |c| {
            let (top, height) = c.layout.boxes.get(node.0).copied().unwrap_or_default();
            ElementBox {
                top: top.scale(c.scale),
                height: height.scale(c.scale),
                offset_height: height,
                scroll_height: height,
            }
        })
    }

    fn range_box(&self, container: usize, node: NodeId, start: usize, end: usize) -> RangeBox {
        self.range_queries.set(self.range_queries.get() + 1);
        let metrics = self.metrics;
        self.with_layout(container, |c| {
            let glyphs = c.layout.glyphs.get(node.0).map(Vec::as_slice).unwrap_or(&[]);
            let lead = metrics.lead();
            let (top, height) = if start >= end || end > glyphs.len() {
                let caret = glyphs
                    .get(start)
                    .or(glyphs.last())
                    .map(|line| *line + lead)
                    .unwrap_or_else(|| c.layout.carets.get(node.0).copied().unwrap_or_default());
                (caret, Px::ZERO)
            } else {
                let top = glyphs[start] + lead;
                let bottom = glyphs[end - 1] + lead + metrics.glyph_height;
                (top, bottom - top)
            };
            RangeBox {
                top: top.scale(c.scale),
                height: height.scale(c.scale),
            }
        })
    }

    fn style(&self, container: usize, node: NodeId) -> ComputedStyle {
        let line_height = self.metrics.line_height;
        self.with_layout(container, |c| ComputedStyle {
            display: if c.layout.block.get(node.0).copied().unwrap_or(false) {
                Display::Block
            } else {
                Display::Inline
            },
            line_height,
        })
    }
}

impl RenderHost for MockHost {
    fn container_count(&self) -> usize {
        self.containers.borrow().len()
    }

    fn container_box(&self, container: usize) -> ElementBox {
        self.with_layout(container, |c| {
            let content = c.layout.content_bottom + c.insets.bottom();
            ElementBox {
                top: Px::ZERO,
                height: c.height.scale(c.scale),
                offset_height: c.height,
                scroll_height: c.height.max(content),
            }
        })
    }

    fn container_insets(&self, container: usize) -> Insets {
        self.with_layout(container, |c| c.insets)
    }

    fn set_content(&self, container: usize, content: &[ContentNode]) {
        let metrics = self.metrics;
        {
            let mut containers = self.containers.borrow_mut();
            let target = &mut containers[container];
            target.root = container_root(content);
            target.layout = Layout::compute(&target.root, target.insets.top(), &metrics);
        }
        self.writes
            .borrow_mut()
            .push((container, crate::html::to_markup(content)));
    }

    fn snapshot(&self, container: usize) -> ContentNode {
        self.with_layout(container, |c| c.root.clone())
    }

    fn content_height(&self, container: usize) -> Px {
        let base = self.container_box(container).full_height();
        let pending = self.unsettled_samples.get();
        if pending > 0 {
            self.unsettled_samples.set(pending - 1);
            return base + Px::from_i32(pending as i32);
        }
        base
    }

    fn typesetting_pending(&self) -> bool {
        let pending = self.typeset_polls.get();
        if pending > 0 {
            self.typeset_polls.set(pending - 1);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_wraps_at_column_limit() {
        let host = MockHost::with_source(vec![MockContainer::new(100)], "abcdefghijklmno");
        let full = host.range_box(0, NodeId(1), 0, 15);
        assert_eq!(full.top, Px::from_i32(2));
        assert_eq!(full.height, Px::from_i32(36), "two lines: 20 + 16");
        let second_line = host.range_box(0, NodeId(1), 10, 11);
        assert_eq!(second_line.top, Px::from_i32(22));
        assert_eq!(host.range_box(0, NodeId(1), 3, 3).height, Px::ZERO);
    }

    #[test]
    fn blocks_and_atomics_stack() {
        let host = MockHost::with_source(
            vec![MockContainer::new(100)],
            r#"<p>abc</p><div data-height="30"></div><p>d<span>ef</span></p>"#,
        );
        // ids: 0 root, 1 p, 2 text, 3 div, 4 p, 5 text, 6 span, 7 text
        assert_eq!(host.element_box(0, NodeId(1)).top, Px::ZERO);
        assert_eq!(host.element_box(0, NodeId(3)).top, Px::from_i32(20));
        assert_eq!(host.element_box(0, NodeId(3)).height, Px::from_i32(30));
        assert_eq!(host.element_box(0, NodeId(4)).top, Px::from_i32(50));
        let span = host.element_box(0, NodeId(6));
        assert_eq!(span.top, Px::from_i32(52));
        assert_eq!(span.height, Px::from_i32(16));
        assert_eq!(host.style(0, NodeId(6)).display, Display::Inline);
        assert_eq!(host.container_box(0).scroll_height, Px::from_i32(100));
    }

    #[test]
    fn scale_multiplies_rendered_lengths() {
        let host = MockHost::with_source(vec![MockContainer::new(100).scale(2.0)], "<p>abc</p>");
        let p = host.element_box(0, NodeId(1));
        assert_eq!(p.height, Px::from_i32(40));
        assert_eq!(p.offset_height, Px::from_i32(20));
        assert_eq!(host.range_box(0, NodeId(2), 0, 1).top, Px::from_i32(4));
    }
}

//! Measurement seams. The splitting algorithm never renders anything itself;
//! it asks a host for rendered geometry of the live content, addressed by
//! container index and [`NodeId`] of the container's [`RenderTree`] snapshot.
//!
//! All `top` values are relative to the top border edge of the container
//! being measured and, like `height`, are *rendered* lengths (after any
//! transform). `offset_height` and `scroll_height` are untransformed layout
//! lengths, so `height / offset_height` is the node's scale factor.
//!
//! [`RenderTree`]: crate::node::RenderTree

use crate::node::{ContentNode, NodeId};
use crate::types::{Insets, Px};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
}

impl Display {
    pub fn is_block(self) -> bool {
        matches!(self, Display::Block)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementBox {
    pub top: Px,
    pub height: Px,
    pub offset_height: Px,
    pub scroll_height: Px,
}

impl ElementBox {
    /// Rendered-over-layout ratio; 1.0 when the layout height is unknown.
    pub fn scale(&self) -> f64 {
        let offset = self.offset_height.to_f64();
        if offset <= 0.0 {
            return 1.0;
        }
        let scale = self.height.to_f64() / offset;
        if scale.is_finite() && scale > 0.0 { scale } else { 1.0 }
    }

    /// Rendered height including content that scrolls out of the box.
    pub fn full_height(&self) -> Px {
        self.height.max(self.scroll_height.scale(self.scale()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeBox {
    pub top: Px,
    pub height: Px,
}

impl RangeBox {
    pub fn bottom(&self) -> Px {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    /// Computed (unscaled) line height.
    pub line_height: Px,
}

/// Geometry Provider.
pub trait Geometry {
    fn element_box(&self, container: usize, node: NodeId) -> ElementBox;

    /// Bounding box of the text selection `[start, end)` in char offsets of
    /// the text node `node`. An empty selection reports the caret position
    /// with zero height.
    fn range_box(&self, container: usize, node: NodeId, start: usize, end: usize) -> RangeBox;

    fn style(&self, container: usize, node: NodeId) -> ComputedStyle;
}

/// The live destination containers plus the inputs the settlement oracle
/// samples. Methods take `&self`; hosts mutate through interior mutability
/// the way a document does.
pub trait RenderHost: Geometry {
    fn container_count(&self) -> usize;

    fn container_box(&self, container: usize) -> ElementBox;

    fn container_insets(&self, container: usize) -> Insets;

    /// Replaces the container's content and schedules rendering.
    fn set_content(&self, container: usize, content: &[ContentNode]);

    /// The container's current live content, rooted at the container element
    /// itself.
    fn snapshot(&self, container: usize) -> ContentNode;

    /// Height sample used to detect render settlement.
    fn content_height(&self, container: usize) -> Px {
        self.container_box(container).full_height()
    }

    /// True while an external typesetting queue still has work pending.
    fn typesetting_pending(&self) -> bool {
        false
    }
}

use crate::geometry::{Display, Geometry, RangeBox};
use crate::node::{ContentNode, NodeId};
use crate::reflow::{Piece, SlotPieces};
use crate::split::Splitter;
use crate::types::{Extent, Px};

/// Largest offset in `[lo, hi)` that does not spill, assuming `lo` itself
/// fits and `hi` does not. Every step halves the open interval, so the
/// search issues at most `ceil(log2(hi - lo))` measurements.
pub fn search_boundary(lo: usize, hi: usize, mut spills: impl FnMut(usize) -> bool) -> usize {
    let (mut lo, mut hi) = (lo, hi);
    while hi > lo + 1 {
        let mid = lo + (hi - lo) / 2;
        if spills(mid) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    lo
}

// Byte offset of every char boundary, including the end of the string.
fn char_bounds(text: &str) -> Vec<usize> {
    let mut bounds: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
    bounds.push(text.len());
    bounds
}

impl<G: Geometry + ?Sized> Splitter<'_, G> {
    /// Text Boundary Search: splits one text run across slots starting at
    /// `from`, at char offsets where the rendered selection crosses a slot
    /// bound.
    pub(crate) fn split_text(&mut self, id: NodeId, from: usize) -> SlotPieces {
        let tree = self.tree;
        let mut out = SlotPieces::new();
        let Some(text) = tree.text(id) else {
            return out;
        };
        let bounds = char_bounds(text);
        let len = bounds.len() - 1;

        let full = self.geometry.range_box(self.container, id, 0, len);
        if !full.height.is_positive() {
            out.insert(from, Piece::unmeasured(ContentNode::text(text), false));
            return out;
        }

        let (append, scale) = self.line_fill(id);
        let placement = self.locate(full.top, full.bottom() + append, false, from);
        if !placement.overflow {
            out.insert(
                placement.slot,
                Piece::measured(ContentNode::text(text), line_extent(full, append, scale), false),
            );
            return out;
        }

        let mut pos = 0;
        for slot in placement.slot..self.slots.len() {
            let end = self.boundary(id, pos, len, slot, append);
            if end > pos {
                let range = self.geometry.range_box(self.container, id, pos, end);
                out.insert(
                    slot,
                    Piece::measured(
                        ContentNode::text(&text[bounds[pos]..bounds[end]]),
                        line_extent(range, append, scale),
                        false,
                    ),
                );
            }
            pos = end;
            if pos >= len {
                break;
            }
        }
        out
    }

    /// Maximal `end` such that `[pos, end)` stays inside `slot`.
    fn boundary(&mut self, id: NodeId, pos: usize, len: usize, slot: usize, append: Px) -> usize {
        let geometry = self.geometry;
        let container = self.container;
        let mut measurements = 0u64;
        let end = search_boundary(pos, len + 1, |end| {
            measurements += 1;
            let range = geometry.range_box(container, id, pos, end);
            self.locate(range.top, range.bottom() + append, true, slot).slot > slot
        });
        self.stats.measurements += measurements;
        end
    }

    /// Half of the line-height not covered by glyph boxes, applied above and
    /// below a selection, plus the parent's scale factor. The split is
    /// assumed symmetric; real ascent/descent is not measured.
    fn line_fill(&self, id: NodeId) -> (Px, f64) {
        let Some(parent) = self.tree.parent(id) else {
            return (Px::ZERO, 1.0);
        };
        let scale = self.geometry.element_box(self.container, parent).scale();
        let style = self.geometry.style(self.container, parent);
        if style.display == Display::Inline {
            return (Px::ZERO, scale);
        }
        let line_height = style.line_height.scale(scale);
        let glyph = self.geometry.range_box(self.container, id, 0, 1).height;
        (((line_height - glyph) / 2).max(Px::ZERO), scale)
    }
}

fn line_extent(range: RangeBox, append: Px, scale: f64) -> Extent {
    Extent::new(
        (range.top - append).unscale(scale),
        (range.bottom() + append).unscale(scale),
    )
}

use crate::config::{NodeRole, SplitConfig};
use crate::geometry::Geometry;
use crate::node::{NodeId, RenderTree};
use crate::plan::{Placement, Slot, locate};
use crate::reflow::{Branch, Piece, SlotPieces};
use crate::types::{Extent, Px};

/// Counters collected over one split run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitStats {
    /// Overflow tests issued by the text boundary search.
    pub measurements: u64,
    /// Unsplittable nodes pushed whole into a later slot.
    pub relocated: u64,
    /// Pieces moved by the line reflow correction.
    pub reflowed: u64,
    /// Follow-previous / follow-next nodes placed by relocation.
    pub anchored: u64,
}

/// Tree Splitter over one measured container.
pub(crate) struct Splitter<'a, G: Geometry + ?Sized> {
    pub(crate) geometry: &'a G,
    pub(crate) container: usize,
    pub(crate) tree: &'a RenderTree,
    pub(crate) slots: &'a [Slot],
    pub(crate) config: &'a SplitConfig,
    pub(crate) stats: SplitStats,
}

impl<'a, G: Geometry + ?Sized> Splitter<'a, G> {
    pub fn new(
        geometry: &'a G,
        container: usize,
        tree: &'a RenderTree,
        slots: &'a [Slot],
        config: &'a SplitConfig,
    ) -> Self {
        Self {
            geometry,
            container,
            tree,
            slots,
            config,
            stats: SplitStats::default(),
        }
    }

    /// Splits the container's content. The container box itself is never
    /// placed as a unit: its children are, so slot extents reflect content.
    pub fn split_root(&mut self) -> SlotPieces {
        if self.slots.is_empty() {
            return SlotPieces::new();
        }
        let root = self.tree.root();
        self.split_children(root, 0, true)
    }

    pub(crate) fn locate(&self, top: Px, bottom: Px, unsplittable: bool, from: usize) -> Placement {
        locate(
            self.slots,
            from,
            top,
            bottom,
            unsplittable,
            self.config.height_gap,
        )
    }

    fn role(&self, id: NodeId) -> NodeRole {
        self.tree
            .element(id)
            .map(|el| self.config.role(el))
            .unwrap_or(NodeRole::Flow)
    }

    /// Assigns `id` and its descendants to slots at or after `from`.
    pub fn split_node(&mut self, id: NodeId, from: usize) -> SlotPieces {
        if self.tree.text(id).is_some() {
            return self.split_text(id, from);
        }

        let bx = self.geometry.element_box(self.container, id);
        let is_block = self.geometry.style(self.container, id).display.is_block();
        let height = bx.full_height();
        let mut out = SlotPieces::new();
        if !height.is_positive() {
            out.insert(
                from,
                Piece::unmeasured(self.tree.clone_subtree(id), is_block),
            );
            return out;
        }

        let scale = bx.scale();
        let top = bx.top;
        let bottom = top + height;
        let children = self.tree.children(id);
        let unsplittable = children.is_empty() || self.role(id) == NodeRole::Unsplittable;
        let placement = self.locate(top, bottom, unsplittable, from);

        if !placement.overflow {
            if unsplittable && placement.slot > from {
                let natural = self.locate(top, top, false, from).slot;
                if natural < placement.slot {
                    self.stats.relocated += 1;
                    log::trace!(
                        "relocating unsplittable node {:?} from slot {} to slot {}",
                        id,
                        natural,
                        placement.slot
                    );
                }
            }
            let extent = Extent::new(top.unscale(scale), bottom.unscale(scale));
            out.insert(
                placement.slot,
                Piece::measured(self.tree.clone_subtree(id), extent, is_block),
            );
            return out;
        }

        self.split_children(id, placement.slot, is_block)
    }

    /// Walks the children of an overflowing element in document order, each
    /// starting no earlier than the slot its previous sibling ended in.
    fn split_children(&mut self, id: NodeId, start: usize, is_block: bool) -> SlotPieces {
        let tree = self.tree;
        let children = tree.children(id);
        let mut branch = Branch::new(self.config.line_offset);
        let mut previous = start;
        let mut held = None;
        let last_idx = children.len().saturating_sub(1);
        for (idx, child) in children.iter().enumerate() {
            match self.role(*child) {
                NodeRole::FollowPrevious => {
                    self.stats.anchored += 1;
                    branch.anchor(previous, self.tree.clone_subtree(*child));
                    continue;
                }
                NodeRole::FollowNext => {
                    self.stats.anchored += 1;
                    let node = self.tree.clone_subtree(*child);
                    if idx == last_idx {
                        branch.anchor(previous, node);
                    } else {
                        // A second follow-next before any content keeps its own order.
                        if let Some(earlier) = held.replace(node) {
                            branch.anchor(previous, earlier);
                        }
                    }
                    continue;
                }
                NodeRole::Flow | NodeRole::Unsplittable => {}
            }

            let pieces = self.split_node(*child, previous);
            let (Some(first), Some(last)) = (
                pieces.keys().next().copied(),
                pieces.keys().next_back().copied(),
            ) else {
                continue;
            };
            if let Some(node) = held.take() {
                branch.anchor(first, node);
            }
            for (slot, piece) in pieces {
                branch.accept(slot, piece);
            }
            previous = last;
        }
        if let Some(node) = held.take() {
            branch.anchor(previous, node);
        }

        self.stats.reflowed += branch.reflowed() as u64;
        branch.finish(&self.tree.shallow_clone(id), is_block)
    }
}

//! Per-branch fragment assembly with line reflow correction.
//!
//! While a split element walks its children, every child's per-slot pieces
//! are collected into pending lists, one per slot. When a measured piece
//! opens a slot, trailing inline pieces of the immediately preceding slot
//! that sit on the same visual line are moved across, so one rendered line
//! never straddles two containers. Once all children are in, each pending
//! list becomes one shallow clone of the element.

use crate::node::ContentNode;
use crate::types::{Extent, Px};
use std::collections::BTreeMap;

/// A cloned node assigned to one slot.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Piece {
    pub node: ContentNode,
    /// `None` for anchored and zero-height pieces.
    pub extent: Option<Extent>,
    pub is_block: bool,
}

impl Piece {
    pub fn measured(node: ContentNode, extent: Extent, is_block: bool) -> Self {
        Self {
            node,
            extent: Some(extent),
            is_block,
        }
    }

    pub fn unmeasured(node: ContentNode, is_block: bool) -> Self {
        Self {
            node,
            extent: None,
            is_block,
        }
    }
}

pub(crate) type SlotPieces = BTreeMap<usize, Piece>;

pub(crate) struct Branch {
    line_offset: Px,
    pending: BTreeMap<usize, Vec<Piece>>,
    reflowed: usize,
}

impl Branch {
    pub fn new(line_offset: Px) -> Self {
        Self {
            line_offset,
            pending: BTreeMap::new(),
            reflowed: 0,
        }
    }

    /// Number of pieces moved across a slot boundary so far.
    pub fn reflowed(&self) -> usize {
        self.reflowed
    }

    /// Relocation-only placement: no geometry, no correction.
    pub fn anchor(&mut self, slot: usize, node: ContentNode) {
        self.pending
            .entry(slot)
            .or_default()
            .push(Piece::unmeasured(node, false));
    }

    pub fn accept(&mut self, slot: usize, piece: Piece) {
        if let Some(extent) = piece.extent {
            let opens_slot = !self
                .pending
                .get(&slot)
                .is_some_and(|pieces| pieces.iter().any(|p| p.extent.is_some()));
            if opens_slot && slot > 0 {
                self.pull_same_line(slot, extent);
            }
        }
        self.pending.entry(slot).or_default().push(piece);
    }

    fn pull_same_line(&mut self, slot: usize, first: Extent) {
        let line_offset = self.line_offset;
        let Some(previous) = self.pending.get_mut(&(slot - 1)) else {
            return;
        };
        // Anchored pieces travel with the measured piece they trail.
        let mut cut = previous.len();
        for (idx, piece) in previous.iter().enumerate().rev() {
            match piece.extent {
                None => continue,
                Some(extent) if !piece.is_block && same_line(extent, first, line_offset) => {
                    cut = idx
                }
                Some(_) => break,
            }
        }
        if cut == previous.len() {
            return;
        }
        let mut moved: Vec<Piece> = previous.drain(cut..).collect();
        if previous.is_empty() {
            self.pending.remove(&(slot - 1));
        }
        self.reflowed += moved.len();
        log::trace!(
            "reflow: moving {} piece(s) from slot {} to slot {}",
            moved.len(),
            slot - 1,
            slot
        );
        let target = self.pending.entry(slot).or_default();
        moved.append(target);
        *target = moved;
    }

    /// Builds one clone of `shell` per pending slot, children in order.
    pub fn finish(self, shell: &ContentNode, is_block: bool) -> SlotPieces {
        let mut out = SlotPieces::new();
        for (slot, pieces) in self.pending {
            let mut node = shell.clone();
            let mut extent = None;
            if let ContentNode::Element(el) = &mut node {
                el.children.clear();
                for piece in pieces {
                    extent = Extent::merge(extent, piece.extent);
                    el.children.push(piece.node);
                }
            }
            out.insert(
                slot,
                Piece {
                    node,
                    extent,
                    is_block,
                },
            );
        }
        out
    }
}

// Vertical overlap beyond `line_offset` means both sit on one visual line.
fn same_line(candidate: Extent, first: Extent, line_offset: Px) -> bool {
    candidate.bottom - line_offset > first.top && candidate.top + line_offset < first.bottom
}

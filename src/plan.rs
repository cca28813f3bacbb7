use crate::error::TextSplitError;
use crate::geometry::RenderHost;
use crate::node::ContentNode;
use crate::types::{Extent, Px};

/// Planning record for one destination container.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub index: usize,
    /// Usable rendered capacity.
    pub height: Px,
    /// Start of this slot's region in the virtual stacked space.
    pub top: Px,
    /// Scaled top inset excluded from (source) or netted out of capacity.
    pub inset_top: Px,
    /// Measured extent consumed by the assigned fragment (unscaled).
    pub used: Option<Extent>,
    pub fragment: Option<ContentNode>,
}

impl Slot {
    pub fn bound(&self) -> Px {
        self.top + self.height
    }

    /// Children of the assigned fragment, i.e. what goes into the container.
    pub fn content(&self) -> &[ContentNode] {
        self.fragment
            .as_ref()
            .map(|fragment| fragment.children())
            .unwrap_or(&[])
    }
}

/// Usable rendered height of one container: its rendered height minus the
/// scaled bottom inset, and minus the scaled top inset unless `include_top`
/// (the container holding the live source, whose node offsets already start
/// below its top inset).
pub fn usable_height<H: RenderHost + ?Sized>(
    host: &H,
    container: usize,
    include_top: bool,
) -> Result<Px, TextSplitError> {
    let count = host.container_count();
    if container >= count {
        return Err(TextSplitError::NoContainer {
            index: container,
            count,
        });
    }
    Ok(capacity_of(host, container, include_top).0)
}

fn capacity_of<H: RenderHost + ?Sized>(host: &H, container: usize, include_top: bool) -> (Px, Px) {
    let bx = host.container_box(container);
    let insets = host.container_insets(container);
    let scale = bx.scale();
    let inset_top = insets.top().scale(scale);
    let mut height = bx.height - insets.bottom().scale(scale);
    if !include_top {
        height -= inset_top;
    }
    (height.max(Px::ZERO), inset_top)
}

/// Capacity Planner: one slot per container, regions stacked contiguously
/// from zero. The first container is the one holding the rendered source.
pub fn plan_slots<H: RenderHost + ?Sized>(host: &H) -> Vec<Slot> {
    let mut top = Px::ZERO;
    (0..host.container_count())
        .map(|index| {
            let (height, inset_top) = capacity_of(host, index, index == 0);
            let slot = Slot {
                index,
                height,
                top,
                inset_top,
                used: None,
                fragment: None,
            };
            top += height;
            slot
        })
        .collect()
}

/// Where a measured box starts, and whether it crosses that slot's bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub slot: usize,
    pub overflow: bool,
}

/// Finds the first slot at or after `from` whose region bound reaches `top`.
/// Unsplittable boxes that cross the bound are pushed whole into the next
/// slot instead of overflowing. Boxes below every region land in the last
/// slot; the last slot never reports overflow.
pub fn locate(
    slots: &[Slot],
    from: usize,
    top: Px,
    bottom: Px,
    unsplittable: bool,
    gap: Px,
) -> Placement {
    let last = slots.len().saturating_sub(1);
    for (i, slot) in slots.iter().enumerate().skip(from) {
        let bound = slot.bound() + gap;
        if top > bound {
            continue;
        }
        let overflow = i < last && bottom > bound;
        if overflow && unsplittable {
            return Placement {
                slot: (i + 1).min(last),
                overflow: false,
            };
        }
        return Placement { slot: i, overflow };
    }
    Placement {
        slot: last,
        overflow: false,
    }
}

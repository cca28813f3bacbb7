mod config;
mod debug;
mod error;
mod geometry;
mod html;
mod node;
mod plan;
mod reflow;
mod settle;
mod split;
#[cfg(test)]
mod test_host;
mod text;
mod types;

pub use config::{MatchSet, NodeRole, SplitConfig};
pub use error::TextSplitError;
pub use geometry::{ComputedStyle, Display, ElementBox, Geometry, RangeBox, RenderHost};
pub use html::{parse_fragment, to_markup};
pub use node::{ContentNode, ElementNode, NodeId, RenderTree};
pub use plan::{Placement, Slot, locate, plan_slots, usable_height};
pub use settle::{CancelToken, Debouncer, SettleStatus, wait_for_settle};
pub use split::SplitStats;
pub use text::search_boundary;
pub use types::{Extent, Insets, Px};

use debug::DebugLogger;
use split::Splitter;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// What to paginate.
#[derive(Debug, Clone)]
pub enum SplitContent {
    /// Markup mounted into the first container before measuring.
    Markup(String),
    /// Already-parsed nodes mounted into the first container.
    Nodes(Vec<ContentNode>),
    /// Whatever the first container currently renders; no mount, no wait.
    Live,
}

impl From<&str> for SplitContent {
    fn from(value: &str) -> Self {
        SplitContent::Markup(value.to_string())
    }
}

impl From<String> for SplitContent {
    fn from(value: String) -> Self {
        SplitContent::Markup(value)
    }
}

impl From<Vec<ContentNode>> for SplitContent {
    fn from(value: Vec<ContentNode>) -> Self {
        SplitContent::Nodes(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotReport {
    pub index: usize,
    pub capacity: Px,
    pub top: Px,
    /// Rendered top padding and border the slot's capacity was reduced by.
    pub inset_top: Px,
    pub used: Option<Extent>,
    /// Used height plus the container's (unscaled) padding and border.
    pub expected_total: Px,
    /// Height the host reports for the container after write-back.
    pub real: Px,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitReport {
    pub slots: Vec<SlotReport>,
    pub stats: SplitStats,
    pub settle_polls: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SplitOutcome {
    Applied(SplitReport),
    /// A newer call started before this one could write anything back.
    Superseded,
}

/// Split Orchestrator. One instance debounces its own calls: starting a
/// split supersedes any split or measurement still waiting on rendering.
pub struct TextSplit {
    config: SplitConfig,
    debouncer: Debouncer,
    debug: Option<DebugLogger>,
}

impl Default for TextSplit {
    fn default() -> Self {
        Self {
            config: SplitConfig::default(),
            debouncer: Debouncer::new(),
            debug: None,
        }
    }
}

impl TextSplit {
    pub fn builder() -> TextSplitBuilder {
        TextSplitBuilder::new()
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Supersedes every outstanding call without starting a new one.
    pub fn cancel(&self) {
        self.debouncer.cancel_all();
    }

    pub async fn split_text<H: RenderHost + ?Sized>(
        &self,
        host: &H,
        content: impl Into<SplitContent>,
    ) -> Result<SplitOutcome, TextSplitError> {
        self.split_text_with_hook(host, content, || std::future::ready(()))
            .await
    }

    /// Mounts `content` into the first container, runs `hook` (typically
    /// kicking off math typesetting), waits for rendering to settle, then
    /// splits and overwrites every container with its fragment.
    pub async fn split_text_with_hook<H, F, Fut>(
        &self,
        host: &H,
        content: impl Into<SplitContent>,
        hook: F,
    ) -> Result<SplitOutcome, TextSplitError>
    where
        H: RenderHost + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let token = self.debouncer.issue();
        if host.container_count() == 0 {
            return Ok(SplitOutcome::Applied(SplitReport::default()));
        }
        let Some(settle_polls) = self
            .mount_and_settle(host, 0, content.into(), hook, &token)
            .await?
        else {
            return Ok(SplitOutcome::Superseded);
        };

        let started = Instant::now();
        let (slots, stats) = self.split_live(host);
        if token.is_cancelled() {
            log::debug!("split_text: superseded before write-back");
            return Ok(SplitOutcome::Superseded);
        }
        for slot in &slots {
            host.set_content(slot.index, slot.content());
        }

        let report = SplitReport {
            slots: slots.iter().map(|slot| slot_report(host, slot)).collect(),
            stats,
            settle_polls,
        };
        for slot in &report.slots {
            log::debug!(
                "slot {}: capacity {} used {} expected {} real {}",
                slot.index,
                slot.capacity,
                slot.used.map(Extent::height).unwrap_or(Px::ZERO),
                slot.expected_total,
                slot.real
            );
        }
        log::info!(
            "split_text: {} slot(s) in {:.2}ms ({} measurements, {} relocated, {} reflowed)",
            report.slots.len(),
            started.elapsed().as_secs_f64() * 1000.0,
            stats.measurements,
            stats.relocated,
            stats.reflowed
        );
        if let Some(debug) = &self.debug {
            debug.log_split(&report);
        }
        Ok(SplitOutcome::Applied(report))
    }

    /// How much of `available` the current content of `container` would
    /// consume if the container were cut at that height. Both `available` and
    /// the result are in the container's rendered units, below its top inset.
    /// Nothing is written to the host.
    pub fn measure_used_height<H: RenderHost + ?Sized>(
        &self,
        host: &H,
        container: usize,
        available: Px,
    ) -> Result<Px, TextSplitError> {
        let count = host.container_count();
        if container >= count {
            return Err(TextSplitError::NoContainer {
                index: container,
                count,
            });
        }
        let available = available.max(Px::ZERO);
        let scale = host.container_box(container).scale();
        let inset_top = host.container_insets(container).top().scale(scale);
        let head = inset_top + available;
        let slots = [
            Slot {
                index: 0,
                height: head,
                top: Px::ZERO,
                inset_top,
                used: None,
                fragment: None,
            },
            Slot {
                index: 1,
                height: Px::UNBOUNDED,
                top: head,
                inset_top: Px::ZERO,
                used: None,
                fragment: None,
            },
        ];
        let tree = RenderTree::from_root(&host.snapshot(container));
        let mut splitter = Splitter::new(host, container, &tree, &slots, &self.config);
        let pieces = splitter.split_root();
        // Extents are unscaled; report in the same rendered units as `available`.
        let used = pieces
            .get(&0)
            .and_then(|piece| piece.extent)
            .map(|extent| extent.height().scale(scale))
            .unwrap_or(Px::ZERO);
        Ok(used.max(Px::ZERO).min(available))
    }

    /// Mounts `content` into `container`, waits for it to settle and measures
    /// it with [`TextSplit::measure_used_height`]. `None` when a newer call
    /// superseded this one.
    pub async fn measure_content<H, F, Fut>(
        &self,
        host: &H,
        container: usize,
        content: impl Into<SplitContent>,
        available: Px,
        hook: F,
    ) -> Result<Option<Px>, TextSplitError>
    where
        H: RenderHost + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let token = self.debouncer.issue();
        let count = host.container_count();
        if container >= count {
            return Err(TextSplitError::NoContainer {
                index: container,
                count,
            });
        }
        if self
            .mount_and_settle(host, container, content.into(), hook, &token)
            .await?
            .is_none()
        {
            return Ok(None);
        }
        self.measure_used_height(host, container, available).map(Some)
    }

    // Returns the number of settle polls, or `None` when superseded.
    async fn mount_and_settle<H, F, Fut>(
        &self,
        host: &H,
        container: usize,
        content: SplitContent,
        hook: F,
        token: &CancelToken,
    ) -> Result<Option<usize>, TextSplitError>
    where
        H: RenderHost + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let nodes = match content {
            SplitContent::Live => return Ok(Some(0)),
            SplitContent::Markup(markup) => html::parse_fragment(&markup),
            SplitContent::Nodes(nodes) => nodes,
        };
        host.set_content(container, &nodes);
        hook().await;
        if token.is_cancelled() {
            log::debug!("split: superseded while the pre-measure hook ran");
            return Ok(None);
        }
        match settle::wait_for_settle(host, container, &self.config, token).await? {
            SettleStatus::Settled { polls } => Ok(Some(polls)),
            SettleStatus::Cancelled => Ok(None),
        }
    }

    /// Plans the containers and splits the first one's live content.
    fn split_live<H: RenderHost + ?Sized>(&self, host: &H) -> (Vec<Slot>, SplitStats) {
        let mut slots = plan_slots(host);
        let tree = RenderTree::from_root(&host.snapshot(0));
        let (pieces, stats) = {
            let mut splitter = Splitter::new(host, 0, &tree, &slots, &self.config);
            let pieces = splitter.split_root();
            (pieces, splitter.stats)
        };
        for (index, piece) in pieces {
            if let Some(slot) = slots.get_mut(index) {
                slot.used = piece.extent;
                slot.fragment = Some(piece.node);
            }
        }
        (slots, stats)
    }
}

fn slot_report<H: RenderHost + ?Sized>(host: &H, slot: &Slot) -> SlotReport {
    let used_height = slot.used.map(Extent::height).unwrap_or(Px::ZERO);
    SlotReport {
        index: slot.index,
        capacity: slot.height,
        top: slot.top,
        inset_top: slot.inset_top,
        used: slot.used,
        expected_total: used_height + host.container_insets(slot.index).total(),
        real: host.container_box(slot.index).offset_height,
    }
}

pub struct TextSplitBuilder {
    config: SplitConfig,
    debug_path: Option<PathBuf>,
}

impl Default for TextSplitBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSplitBuilder {
    pub fn new() -> Self {
        Self {
            config: SplitConfig::default(),
            debug_path: None,
        }
    }

    pub fn config(mut self, config: SplitConfig) -> Self {
        self.config = config;
        self
    }

    pub fn height_gap(mut self, px: f32) -> Self {
        self.config.height_gap = Px::from_f32(px);
        self
    }

    pub fn line_offset(mut self, px: f32) -> Self {
        self.config.line_offset = Px::from_f32(px);
        self
    }

    pub fn unsplittable(mut self, set: MatchSet) -> Self {
        self.config.unsplittable = set;
        self
    }

    pub fn unsplittable_tag(mut self, tag: &str) -> Self {
        self.config.unsplittable.insert_tag(tag);
        self
    }

    pub fn unsplittable_class(mut self, class: &str) -> Self {
        self.config.unsplittable.insert_class(class);
        self
    }

    pub fn follow_previous(mut self, set: MatchSet) -> Self {
        self.config.follow_previous = set;
        self
    }

    pub fn follow_previous_tag(mut self, tag: &str) -> Self {
        self.config.follow_previous.insert_tag(tag);
        self
    }

    pub fn follow_previous_class(mut self, class: &str) -> Self {
        self.config.follow_previous.insert_class(class);
        self
    }

    pub fn follow_next(mut self, set: MatchSet) -> Self {
        self.config.follow_next = set;
        self
    }

    pub fn follow_next_tag(mut self, tag: &str) -> Self {
        self.config.follow_next.insert_tag(tag);
        self
    }

    pub fn follow_next_class(mut self, class: &str) -> Self {
        self.config.follow_next.insert_class(class);
        self
    }

    pub fn settle_interval(mut self, interval: Duration) -> Self {
        self.config.settle_interval = interval;
        self
    }

    pub fn settle_gap(mut self, px: f32) -> Self {
        self.config.settle_gap = Px::from_f32(px);
        self
    }

    // Unbounded by default: a host that never stops changing is waited on.
    pub fn settle_max_polls(mut self, polls: usize) -> Self {
        self.config.settle_max_polls = Some(polls);
        self
    }

    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<TextSplit, TextSplitError> {
        self.config.validate()?;
        let debug = match self.debug_path {
            Some(path) => Some(DebugLogger::new(path)?),
            None => None,
        };
        Ok(TextSplit {
            config: self.config,
            debouncer: Debouncer::new(),
            debug,
        })
    }
}

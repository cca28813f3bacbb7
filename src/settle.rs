//! Render settlement and supersession.
//!
//! Hosts render asynchronously: mounting markup and typesetting embedded math
//! keep changing the container's height for a while. Measurements are only
//! trusted once two consecutive height samples agree within the configured
//! gap and the host reports no pending typesetting work.

use crate::config::SplitConfig;
use crate::error::TextSplitError;
use crate::geometry::RenderHost;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Issues one [`CancelToken`] per call; issuing a new token supersedes every
/// token issued before it.
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> CancelToken {
        let issued = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        CancelToken {
            generation: Arc::clone(&self.generation),
            issued,
        }
    }

    /// Supersedes every outstanding token without starting a new call.
    pub fn cancel_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    generation: Arc<AtomicU64>,
    issued: u64,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.generation.load(Ordering::SeqCst) != self.issued
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStatus {
    Settled { polls: usize },
    Cancelled,
}

/// Waits until `container` stops changing height. Polls every
/// `settle_interval`; without `settle_max_polls` this waits for as long as
/// the host keeps changing.
pub async fn wait_for_settle<H: RenderHost + ?Sized>(
    host: &H,
    container: usize,
    config: &SplitConfig,
    token: &CancelToken,
) -> Result<SettleStatus, TextSplitError> {
    let mut height = host.content_height(container);
    let mut polls = 0usize;
    loop {
        tokio::time::sleep(config.settle_interval).await;
        if token.is_cancelled() {
            log::debug!("settle: superseded after {} polls", polls);
            return Ok(SettleStatus::Cancelled);
        }
        polls += 1;
        let sample = host.content_height(container);
        if (sample - height).abs() < config.settle_gap && !host.typesetting_pending() {
            log::trace!("settle: container {} stable at {} after {} polls", container, sample, polls);
            return Ok(SettleStatus::Settled { polls });
        }
        if config.settle_max_polls.is_some_and(|max| polls >= max) {
            return Err(TextSplitError::SettleTimeout { polls });
        }
        height = sample;
    }
}

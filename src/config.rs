use crate::error::TextSplitError;
use crate::node::ElementNode;
use crate::types::Px;
use std::collections::BTreeSet;
use std::time::Duration;

/// How the splitter treats an element child while walking a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Positioned by its own geometry, split when it overflows.
    Flow,
    /// Relocated whole, never partially cloned across slots.
    Unsplittable,
    /// Placed in the slot the previous sibling ended in; contributes no height.
    FollowPrevious,
    /// Placed in the slot the next sibling starts in; contributes no height.
    FollowNext,
}

/// Tag and class identities for one node category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSet {
    tags: BTreeSet<String>,
    classes: BTreeSet<String>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_ascii_lowercase());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.insert(class.to_string());
        self
    }

    pub fn insert_tag(&mut self, tag: &str) {
        self.tags.insert(tag.to_ascii_lowercase());
    }

    pub fn insert_class(&mut self, class: &str) {
        self.classes.insert(class.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.classes.is_empty()
    }

    pub fn matches(&self, element: &ElementNode) -> bool {
        if self.tags.contains(&element.tag.to_ascii_lowercase()) {
            return true;
        }
        !self.classes.is_empty() && element.classes().any(|cls| self.classes.contains(cls))
    }
}

#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Overflow tolerance absorbing sub-pixel noise.
    pub height_gap: Px,
    /// Vertical overlap below which two fragments are not on the same line.
    pub line_offset: Px,
    pub unsplittable: MatchSet,
    pub follow_previous: MatchSet,
    pub follow_next: MatchSet,
    pub settle_interval: Duration,
    pub settle_gap: Px,
    /// `None` polls until the rendered height converges.
    pub settle_max_polls: Option<usize>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            height_gap: Px::from_milli_i64(1),
            line_offset: Px::from_i32(1),
            unsplittable: MatchSet::new().class("MathJax").class("MathJax_Display"),
            follow_previous: MatchSet::new().tag("script"),
            follow_next: MatchSet::new().class("MathJax_Preview"),
            settle_interval: Duration::from_millis(50),
            settle_gap: Px::from_milli_i64(100),
            settle_max_polls: None,
        }
    }
}

impl SplitConfig {
    pub fn role(&self, element: &ElementNode) -> NodeRole {
        if self.follow_previous.matches(element) {
            NodeRole::FollowPrevious
        } else if self.follow_next.matches(element) {
            NodeRole::FollowNext
        } else if self.unsplittable.matches(element) {
            NodeRole::Unsplittable
        } else {
            NodeRole::Flow
        }
    }

    pub fn validate(&self) -> Result<(), TextSplitError> {
        if self.height_gap < Px::ZERO {
            return Err(TextSplitError::InvalidConfiguration(format!(
                "height_gap must not be negative (got {})",
                self.height_gap
            )));
        }
        if self.line_offset < Px::ZERO {
            return Err(TextSplitError::InvalidConfiguration(format!(
                "line_offset must not be negative (got {})",
                self.line_offset
            )));
        }
        if !self.settle_gap.is_positive() {
            return Err(TextSplitError::InvalidConfiguration(
                "settle_gap must be positive".to_string(),
            ));
        }
        if self.settle_interval.is_zero() {
            return Err(TextSplitError::InvalidConfiguration(
                "settle_interval must be non-zero".to_string(),
            ));
        }
        if self.settle_max_polls == Some(0) {
            return Err(TextSplitError::InvalidConfiguration(
                "settle_max_polls must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

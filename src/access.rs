// src/access.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Qualities that require a purchase unless configured otherwise
pub const DEFAULT_PREMIUM_QUALITIES: [&str; 2] = ["1080p", "720p"];

/// Access verdict for a quality label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessTier {
    Free,
    Premium,
}

impl AccessTier {
    pub fn is_premium(self) -> bool {
        self == AccessTier::Premium
    }
}

/// The set of quality labels gated behind checkout.
///
/// Labels are matched exactly. Anything not in the set, including labels the
/// policy has never heard of, is free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPolicy {
    premium: BTreeSet<String>,
}

impl TierPolicy {
    pub fn new<I, S>(premium_labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            premium: premium_labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn classify(&self, quality_label: &str) -> AccessTier {
        if self.premium.contains(quality_label) {
            AccessTier::Premium
        } else {
            AccessTier::Free
        }
    }

    pub fn is_premium(&self, quality_label: &str) -> bool {
        self.classify(quality_label).is_premium()
    }

    pub fn premium_labels(&self) -> impl Iterator<Item = &str> {
        self.premium.iter().map(String::as_str)
    }
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PREMIUM_QUALITIES)
    }
}

//! Record-level filters applied after parsing.
//!
//! A `Reader` is configured once with a builder and then applied to a parsed
//! feedback sequence. Filtering is silent: records that fail a filter are
//! dropped and only counted in the debug log.

use crate::types::{FeedbackRecord, ItemId, UserId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Configurable feedback filter.
///
/// Filters run in this order:
/// 1. `user_set` / `item_set` membership
/// 2. `bin_threshold` (keep ratings >= threshold, rewritten to 1.0)
/// 3. `min_user_freq`
/// 4. `min_item_freq`
///
/// Frequency filters are single-pass: dropping rare items may leave a user
/// below `min_user_freq` again, which is not re-checked.
#[derive(Debug, Clone, Default)]
pub struct Reader {
    user_set: Option<HashSet<UserId>>,
    item_set: Option<HashSet<ItemId>>,
    bin_threshold: Option<f32>,
    min_user_freq: usize,
    min_item_freq: usize,
}

impl Reader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only records whose user is in `users`
    pub fn with_user_set<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<UserId>,
    {
        self.user_set = Some(users.into_iter().map(Into::into).collect());
        self
    }

    /// Keep only records whose item is in `items`
    pub fn with_item_set<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ItemId>,
    {
        self.item_set = Some(items.into_iter().map(Into::into).collect());
        self
    }

    /// Binarize feedback: ratings below `threshold` are dropped, the rest become 1.0
    pub fn with_bin_threshold(mut self, threshold: f32) -> Self {
        self.bin_threshold = Some(threshold);
        self
    }

    /// Drop users with fewer than `min` records (0 disables)
    pub fn with_min_user_freq(mut self, min: usize) -> Self {
        self.min_user_freq = min;
        self
    }

    /// Drop items with fewer than `min` records (0 disables)
    pub fn with_min_item_freq(mut self, min: usize) -> Self {
        self.min_item_freq = min;
        self
    }

    /// Apply every configured filter, preserving record order.
    pub fn read(&self, records: Vec<FeedbackRecord>) -> Vec<FeedbackRecord> {
        let input_len = records.len();

        let mut current: Vec<FeedbackRecord> = records
            .into_iter()
            .filter(|r| {
                self.user_set.as_ref().is_none_or(|set| set.contains(&r.user_id))
                    && self.item_set.as_ref().is_none_or(|set| set.contains(&r.item_id))
            })
            .collect();

        if let Some(threshold) = self.bin_threshold {
            current = current
                .into_iter()
                .filter(|r| r.rating >= threshold)
                .map(|mut r| {
                    r.rating = 1.0;
                    r
                })
                .collect();
        }

        if self.min_user_freq > 1 {
            let counts = count_by(&current, |r| &r.user_id);
            current.retain(|r| counts[r.user_id.as_str()] >= self.min_user_freq);
        }

        if self.min_item_freq > 1 {
            let counts = count_by(&current, |r| &r.item_id);
            current.retain(|r| counts[r.item_id.as_str()] >= self.min_item_freq);
        }

        debug!(
            "Reader kept {} of {} records ({} dropped)",
            current.len(),
            input_len,
            input_len - current.len()
        );
        current
    }
}

fn count_by<F>(records: &[FeedbackRecord], key: F) -> HashMap<String, usize>
where
    F: Fn(&FeedbackRecord) -> &String,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        *counts.entry(key(record).clone()).or_insert(0) += 1;
    }
    counts
}

//! Dataset loading and dense indexing.
//!
//! - `Dataset::load_from_files` parses both input files (in parallel) and
//!   drops feedback for items that have no document
//! - `IdMap` assigns stable dense indices to opaque ids
//! - `InteractionSet` stores feedback as dense triples with per-user item sets,
//!   the shape models train and evaluate on

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::reader::Reader;
use crate::types::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

impl Dataset {
    /// Load a dataset directory
    ///
    /// Steps:
    /// 1. Parse the feedback and plot files in parallel
    /// 2. Apply the configured `Reader` filters, restricted to items with a document
    /// 3. Validate that something is left
    pub fn load_from_files(data_dir: &Path, options: &LoadOptions) -> Result<Self> {
        info!("Loading dataset from {:?}", data_dir);

        let feedback_path = data_dir.join(&options.feedback_file);
        let plot_path = data_dir.join(&options.plot_file);

        // Rayon's `join` runs both parsers in parallel
        let (feedback, documents) = rayon::join(
            || parser::parse_feedback(&feedback_path, &options.feedback_sep),
            || parser::parse_documents(&plot_path),
        );
        let feedback = feedback?;
        let documents = documents?;

        info!(
            "Parsed {} feedback records and {} documents",
            feedback.len(),
            documents.len()
        );

        let mut reader = Reader::new()
            .with_min_user_freq(options.min_user_freq)
            .with_min_item_freq(options.min_item_freq);
        if let Some(threshold) = options.bin_threshold {
            reader = reader.with_bin_threshold(threshold);
        }

        let dataset = Self::from_parts_with_reader(feedback, documents, reader);
        dataset.validate()?;

        let (users, items, records) = dataset.counts();
        info!(
            "Dataset ready: {} users, {} items, {} records",
            users, items, records
        );
        Ok(dataset)
    }

    /// Build a dataset from in-memory feedback and documents.
    ///
    /// Feedback on items without a document is dropped silently.
    pub fn from_parts(
        feedback: Vec<FeedbackRecord>,
        documents: BTreeMap<ItemId, RawDocument>,
    ) -> Self {
        Self::from_parts_with_reader(feedback, documents, Reader::new())
    }

    /// Same as [`Dataset::from_parts`] but with additional reader filters.
    ///
    /// The item set of `reader` is always replaced by the document keys.
    pub fn from_parts_with_reader(
        feedback: Vec<FeedbackRecord>,
        documents: BTreeMap<ItemId, RawDocument>,
        reader: Reader,
    ) -> Self {
        let before = feedback.len();
        let feedback = reader
            .with_item_set(documents.keys().cloned())
            .read(feedback);

        if feedback.len() < before {
            debug!(
                "Dropped {} records referencing items without a document",
                before - feedback.len()
            );
        }

        Self {
            feedback,
            documents,
        }
    }

    /// Validate data integrity
    ///
    /// Check that:
    /// - at least one record survived filtering
    /// - every record's item has a document
    pub fn validate(&self) -> Result<()> {
        if self.feedback.is_empty() {
            return Err(DataLoadError::ValidationError(
                "no feedback left after filtering".to_string(),
            ));
        }
        if let Some(orphan) = self
            .feedback
            .iter()
            .find(|r| !self.documents.contains_key(&r.item_id))
        {
            return Err(DataLoadError::ValidationError(format!(
                "item {} has feedback but no document",
                orphan.item_id
            )));
        }
        Ok(())
    }
}

// =============================================================================
// IdMap
// =============================================================================

/// Maps opaque ids to dense indices `0..len` in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    ids: Vec<String>,
    index: HashMap<String, usize>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the index of `id`, assigning the next free one if it is new
    pub fn get_or_insert(&mut self, id: &str) -> usize {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.ids.len();
        self.ids.push(id.to_string());
        self.index.insert(id.to_string(), idx);
        idx
    }

    pub fn get(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Raw id for a dense index
    pub fn id(&self, idx: usize) -> Option<&str> {
        self.ids.get(idx).map(|s| s.as_str())
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// =============================================================================
// InteractionSet
// =============================================================================

/// One feedback record in dense index space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub user: usize,
    pub item: usize,
    pub rating: f32,
}

/// Feedback stored as dense triples with per-user lookups.
#[derive(Debug, Clone, Default)]
pub struct InteractionSet {
    interactions: Vec<Interaction>,
    user_items: HashMap<usize, HashSet<usize>>,
    user_ratings: HashMap<usize, Vec<(usize, f32)>>,
}

impl InteractionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records, resolving ids through the given maps.
    ///
    /// Records whose user or item is missing from a map are skipped; the
    /// number of skipped records is returned alongside the set.
    pub fn from_records<'a, I>(records: I, users: &IdMap, items: &IdMap) -> (Self, usize)
    where
        I: IntoIterator<Item = &'a FeedbackRecord>,
    {
        let mut set = Self::new();
        let mut skipped = 0;
        for record in records {
            match (users.get(&record.user_id), items.get(&record.item_id)) {
                (Some(user), Some(item)) => set.insert(Interaction {
                    user,
                    item,
                    rating: record.rating,
                }),
                _ => skipped += 1,
            }
        }
        (set, skipped)
    }

    /// Insert a triple and update the per-user indices
    pub fn insert(&mut self, interaction: Interaction) {
        self.user_items
            .entry(interaction.user)
            .or_default()
            .insert(interaction.item);
        self.user_ratings
            .entry(interaction.user)
            .or_default()
            .push((interaction.item, interaction.rating));
        self.interactions.push(interaction);
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Distinct items the user interacted with
    pub fn user_items(&self, user: usize) -> Option<&HashSet<usize>> {
        self.user_items.get(&user)
    }

    /// `(item, rating)` pairs for a user, in insertion order
    pub fn user_ratings(&self, user: usize) -> &[(usize, f32)] {
        self.user_ratings
            .get(&user)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Users with at least one interaction, ascending
    pub fn users(&self) -> Vec<usize> {
        let mut users: Vec<usize> = self.user_items.keys().copied().collect();
        users.sort_unstable();
        users
    }

    /// Number of interactions per item index, for items `0..n_items`
    pub fn item_counts(&self, n_items: usize) -> Vec<u32> {
        let mut counts = vec![0u32; n_items];
        for interaction in &self.interactions {
            if let Some(count) = counts.get_mut(interaction.item) {
                *count += 1;
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documents(ids: &[&str]) -> BTreeMap<ItemId, RawDocument> {
        ids.iter()
            .map(|id| (id.to_string(), RawDocument::new(*id, "some plot")))
            .collect()
    }

    #[test]
    fn test_from_parts_drops_items_without_document() {
        let feedback = vec![
            FeedbackRecord::new("u1", "i1", 4.0),
            FeedbackRecord::new("u1", "i2", 3.0),
            FeedbackRecord::new("u2", "i3", 5.0),
        ];
        let dataset = Dataset::from_parts(feedback, documents(&["i1", "i3"]));

        assert_eq!(dataset.counts(), (2, 2, 2));
        assert!(dataset.feedback().iter().all(|r| r.item_id != "i2"));
        assert!(dataset.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_dataset() {
        let dataset = Dataset::from_parts(
            vec![FeedbackRecord::new("u1", "missing", 1.0)],
            documents(&["i1"]),
        );
        assert!(matches!(
            dataset.validate(),
            Err(DataLoadError::ValidationError(_))
        ));
    }

    #[test]
    fn test_id_map_first_seen_order() {
        let mut map = IdMap::new();
        assert_eq!(map.get_or_insert("b"), 0);
        assert_eq!(map.get_or_insert("a"), 1);
        assert_eq!(map.get_or_insert("b"), 0);

        assert_eq!(map.len(), 2);
        assert_eq!(map.id(1), Some("a"));
        assert_eq!(map.get("c"), None);
    }

    #[test]
    fn test_interaction_set_from_records() {
        let mut users = IdMap::new();
        let mut items = IdMap::new();
        users.get_or_insert("u1");
        items.get_or_insert("i1");
        items.get_or_insert("i2");

        let records = vec![
            FeedbackRecord::new("u1", "i1", 4.0),
            FeedbackRecord::new("u1", "i2", 2.0),
            FeedbackRecord::new("u9", "i1", 1.0),
        ];
        let (set, skipped) = InteractionSet::from_records(&records, &users, &items);

        assert_eq!(set.len(), 2);
        assert_eq!(skipped, 1);
        assert_eq!(set.user_items(0).map(|s| s.len()), Some(2));
        assert_eq!(set.user_ratings(0), &[(0, 4.0), (1, 2.0)]);
        assert_eq!(set.item_counts(3), vec![1, 1, 0]);
        assert!(set.user_ratings(7).is_empty());
    }
}

//! Core domain types for feedback and item plot data.
//!
//! This module defines the fundamental data structures used throughout the system:
//! - Type aliases for domain clarity (UserId, ItemId)
//! - FeedbackRecord: one (user, item, rating) triple
//! - RawDocument: the plot text attached to an item
//! - Dataset: the loaded, filtered feedback together with its documents

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// =============================================================================
// Type Aliases
// =============================================================================
// Identifiers are opaque strings taken verbatim from the input files.

/// Opaque identifier for a user
pub type UserId = String;

/// Opaque identifier for an item (a movie in the reference dataset)
pub type ItemId = String;

// =============================================================================
// Feedback
// =============================================================================

/// A single piece of explicit or implicit feedback from a user on an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub user_id: UserId,
    pub item_id: ItemId,
    /// Rating value; implicit feedback is conventionally 1.0
    pub rating: f32,
}

impl FeedbackRecord {
    pub fn new(user_id: impl Into<UserId>, item_id: impl Into<ItemId>, rating: f32) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            rating,
        }
    }
}

// =============================================================================
// Documents
// =============================================================================

/// Raw text attached to an item (its plot summary)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub item_id: ItemId,
    pub text: String,
}

impl RawDocument {
    pub fn new(item_id: impl Into<ItemId>, text: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            text: text.into(),
        }
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Options that control how a dataset directory is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// File name of the feedback triples inside the data directory
    pub feedback_file: String,
    /// File name of the item plots inside the data directory
    pub plot_file: String,
    /// Field separator used by the feedback file
    pub feedback_sep: String,
    /// Drop users with fewer records than this (0 disables)
    pub min_user_freq: usize,
    /// Drop items with fewer records than this (0 disables)
    pub min_item_freq: usize,
    /// Keep only records rated at or above this value, rewritten to 1.0
    pub bin_threshold: Option<f32>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            feedback_file: "ratings.dat".to_string(),
            plot_file: "plots.dat".to_string(),
            feedback_sep: "::".to_string(),
            min_user_freq: 0,
            min_item_freq: 0,
            bin_threshold: None,
        }
    }
}

/// Feedback records restricted to items that have a document, plus the documents.
///
/// Built once by [`Dataset::load_from_files`] or [`Dataset::from_parts`] and
/// read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub(crate) feedback: Vec<FeedbackRecord>,
    pub(crate) documents: BTreeMap<ItemId, RawDocument>,
}

impl Dataset {
    /// Feedback records in load order
    pub fn feedback(&self) -> &[FeedbackRecord] {
        &self.feedback
    }

    /// All documents keyed by item id, in id order
    pub fn documents(&self) -> &BTreeMap<ItemId, RawDocument> {
        &self.documents
    }

    /// Documents of items that have at least one feedback record
    pub fn rated_documents(&self) -> BTreeMap<ItemId, RawDocument> {
        let rated: HashSet<&str> = self.feedback.iter().map(|r| r.item_id.as_str()).collect();
        self.documents
            .iter()
            .filter(|(item_id, _)| rated.contains(item_id.as_str()))
            .map(|(item_id, document)| (item_id.clone(), document.clone()))
            .collect()
    }

    /// Look up a single document
    pub fn get_document(&self, item_id: &str) -> Option<&RawDocument> {
        self.documents.get(item_id)
    }

    /// Get counts for debugging/validation: (users, items, records)
    pub fn counts(&self) -> (usize, usize, usize) {
        let users: HashSet<&str> = self.feedback.iter().map(|r| r.user_id.as_str()).collect();
        let items: HashSet<&str> = self.feedback.iter().map(|r| r.item_id.as_str()).collect();
        (users.len(), items.len(), self.feedback.len())
    }
}

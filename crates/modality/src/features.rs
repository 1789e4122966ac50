//! Generic per-item feature tables.
//!
//! A `FeatureTable` is a dense matrix with one row per item, every row the
//! same length. Its `FeatureOrigin` records where the numbers came from;
//! models that need side information only ask for a table of a given
//! dimension, so any origin can be supplied.

use crate::error::{ModalityError, Result};
use data_loader::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Semantic origin of a feature table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureOrigin {
    /// Bag-of-tokens counts or weights from item text
    Text,
    /// Visual embeddings (e.g. CNN image features)
    Visual,
    /// Anything else
    Generic,
}

impl fmt::Display for FeatureOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeatureOrigin::Text => "text",
            FeatureOrigin::Visual => "visual",
            FeatureOrigin::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Fixed-dimension feature rows keyed by item id.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    ids: Vec<ItemId>,
    index: HashMap<ItemId, usize>,
    rows: Vec<Vec<f32>>,
    dim: usize,
    origin: FeatureOrigin,
}

impl FeatureTable {
    /// Build a table, checking that ids are unique and all rows share one length.
    ///
    /// The dimension is taken from the first row (0 for an empty table).
    pub fn from_rows(ids: Vec<ItemId>, rows: Vec<Vec<f32>>, origin: FeatureOrigin) -> Result<Self> {
        if ids.len() != rows.len() {
            return Err(ModalityError::LengthMismatch {
                ids: ids.len(),
                rows: rows.len(),
            });
        }

        let dim = rows.first().map_or(0, |row| row.len());
        let mut index = HashMap::with_capacity(ids.len());
        for (position, (item_id, row)) in ids.iter().zip(&rows).enumerate() {
            if row.len() != dim {
                return Err(ModalityError::DimensionMismatch {
                    item_id: item_id.clone(),
                    expected: dim,
                    found: row.len(),
                });
            }
            if index.insert(item_id.clone(), position).is_some() {
                return Err(ModalityError::DuplicateItem(item_id.clone()));
            }
        }

        Ok(Self {
            ids,
            index,
            rows,
            dim,
            origin,
        })
    }

    /// Re-tag the table with a different origin. The numbers are untouched.
    ///
    /// A model built around one kind of features will now see another kind
    /// with different statistics, and nothing validates that. The change is
    /// logged so it shows up next to the results.
    pub fn relabel(mut self, origin: FeatureOrigin) -> Self {
        if self.origin != origin {
            warn!(
                "Relabeling {} features as {} ({} items, dim {}); values are passed through unchanged",
                self.origin,
                origin,
                self.ids.len(),
                self.dim
            );
            self.origin = origin;
        }
        self
    }

    pub fn get(&self, item_id: &str) -> Option<&[f32]> {
        self.index.get(item_id).map(|&position| self.rows[position].as_slice())
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.index.contains_key(item_id)
    }

    /// Iterate `(item_id, row)` in table order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.ids
            .iter()
            .zip(&self.rows)
            .map(|(id, row)| (id.as_str(), row.as_slice()))
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn origin(&self) -> FeatureOrigin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Rows reordered to match `item_ids` (a model's dense item order).
    ///
    /// Items without a row get a zero row; their count is returned so the
    /// caller can report it.
    pub fn align<S: AsRef<str>>(&self, item_ids: &[S]) -> (AlignedFeatures, usize) {
        let mut missing = 0;
        let rows = item_ids
            .iter()
            .map(|id| match self.get(id.as_ref()) {
                Some(row) => row.to_vec(),
                None => {
                    missing += 1;
                    vec![0.0; self.dim]
                }
            })
            .collect();

        (
            AlignedFeatures {
                rows,
                dim: self.dim,
                origin: self.origin,
            },
            missing,
        )
    }
}

/// Feature rows indexed by dense item index rather than item id.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedFeatures {
    rows: Vec<Vec<f32>>,
    dim: usize,
    origin: FeatureOrigin,
}

impl AlignedFeatures {
    pub fn row(&self, item: usize) -> Option<&[f32]> {
        self.rows.get(item).map(|row| row.as_slice())
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn origin(&self) -> FeatureOrigin {
        self.origin
    }

    /// Number of item rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

//! # Data Loader Crate
//!
//! Loads user feedback and item plot texts and indexes them for training.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (FeedbackRecord, RawDocument, Dataset)
//! - **parser**: Parse feedback and plot files into Rust structs
//! - **reader**: Record-level filters (item/user sets, frequencies, binarization)
//! - **index**: Dataset loading plus dense id maps and interaction sets
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{Dataset, LoadOptions};
//! use std::path::Path;
//!
//! let dataset = Dataset::load_from_files(Path::new("data/ml-1m"), &LoadOptions::default())?;
//! let (users, items, records) = dataset.counts();
//! println!("{} users rated {} items ({} records)", users, items, records);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod reader;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use index::{IdMap, Interaction, InteractionSet};
pub use reader::Reader;
pub use types::{
    // Type aliases
    UserId,
    ItemId,
    // Core types
    FeedbackRecord,
    RawDocument,
    Dataset,
    LoadOptions,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_empty_dataset() {
        let dataset = Dataset::default();
        assert_eq!(dataset.counts(), (0, 0, 0));
        assert!(dataset.documents().is_empty());
    }

    #[test]
    fn test_get_document() {
        let mut documents = BTreeMap::new();
        documents.insert("1".to_string(), RawDocument::new("1", "a boy and his droid"));
        let dataset = Dataset::from_parts(vec![FeedbackRecord::new("u", "1", 5.0)], documents);

        assert_eq!(dataset.get_document("1").unwrap().text, "a boy and his droid");
        assert!(dataset.get_document("2").is_none());
    }

    #[test]
    fn test_rated_documents() {
        let mut documents = BTreeMap::new();
        documents.insert("1".to_string(), RawDocument::new("1", "rated"));
        documents.insert("2".to_string(), RawDocument::new("2", "never rated"));
        let dataset = Dataset::from_parts(vec![FeedbackRecord::new("u", "1", 5.0)], documents);

        let rated = dataset.rated_documents();
        assert_eq!(rated.len(), 1);
        assert!(rated.contains_key("1"));
        assert_eq!(dataset.documents().len(), 2);
    }

    #[test]
    fn test_load_options_defaults() {
        let options = LoadOptions::default();
        assert_eq!(options.feedback_sep, "::");
        assert_eq!(options.feedback_file, "ratings.dat");
        assert!(options.bin_threshold.is_none());
    }
}

//! # Modality Crate
//!
//! Turns item side information into numeric per-item feature tables.
//!
//! ## Components
//!
//! - **tokenizer**: the `Tokenizer` capability and the rule-based `BaseTokenizer`
//! - **stopwords**: stop word sets removed during tokenization
//! - **text**: `TextModality`, a bag-of-tokens count vectorizer with a
//!   vocabulary cap and document-frequency pruning
//! - **features**: `FeatureTable`, the fixed-dimension per-item matrix models consume
//!
//! ## Example Usage
//!
//! ```ignore
//! use modality::{BaseTokenizer, FeatureOrigin, StopWords, TextModality};
//!
//! let tokenizer = BaseTokenizer::new('\t').with_stop_words(StopWords::english());
//! let features = TextModality::new(tokenizer)
//!     .with_max_vocab(5000)
//!     .with_max_doc_freq(0.5)
//!     .build(dataset.documents())?;
//!
//! // Hand the text counts to a model that expects visual features
//! let item_features = features.into_counts().relabel(FeatureOrigin::Visual);
//! ```

pub mod error;
pub mod features;
pub mod stopwords;
pub mod text;
pub mod tokenizer;

pub use error::{ModalityError, Result};
pub use features::{AlignedFeatures, FeatureOrigin, FeatureTable};
pub use stopwords::StopWords;
pub use text::{TextFeatures, TextModality, TextModalityConfig, Vocabulary};
pub use tokenizer::{BaseTokenizer, TextRule, Tokenizer, TokenizerConfig};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip_builds_modality() {
        let config = TextModalityConfig {
            max_vocab: 10,
            max_doc_freq: 1.0,
            min_doc_freq: 1,
            tokenizer: TokenizerConfig {
                sep: '\t',
                stop_words: Some("english".to_string()),
                rules: TextRule::defaults(),
            },
        };
        let modality = TextModality::from_config(&config).unwrap();

        let ids = vec!["1".to_string()];
        let features = modality.build_corpus(ids, &["the\tdroid\tescapes"]).unwrap();
        assert_eq!(features.vocabulary().tokens(), &["droid", "escapes"]);
    }

    #[test]
    fn test_from_config_rejects_bad_limits() {
        let config = TextModalityConfig {
            max_vocab: 0,
            ..TextModalityConfig::default()
        };
        assert!(TextModality::from_config(&config).is_err());
    }
}

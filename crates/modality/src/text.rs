//! Text modality: bag-of-tokens vectors from item documents.
//!
//! ## Algorithm
//! 1. Tokenize every document (in parallel, order preserved)
//! 2. Count total term frequency and document frequency per token
//! 3. Drop tokens seen in more than `max_doc_freq` of the documents or in
//!    fewer than `min_doc_freq` documents
//! 4. Keep the `max_vocab` most frequent tokens (ties broken by token)
//! 5. Index the kept tokens in lexicographic order and count them per document
//!
//! Step 4 selects a prefix of one fixed ordering, so a larger cap always
//! yields a superset of the vocabulary of a smaller cap.

use crate::error::{ModalityError, Result};
use crate::features::{FeatureOrigin, FeatureTable};
use crate::tokenizer::{Tokenizer, TokenizerConfig};
use data_loader::{ItemId, RawDocument};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// Serializable settings for [`TextModality`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextModalityConfig {
    /// Maximum number of tokens kept
    pub max_vocab: usize,
    /// Tokens in more than this fraction of documents are dropped, in (0, 1]
    pub max_doc_freq: f64,
    /// Tokens in fewer documents than this are dropped
    pub min_doc_freq: usize,
    pub tokenizer: TokenizerConfig,
}

impl Default for TextModalityConfig {
    fn default() -> Self {
        Self {
            max_vocab: 5000,
            max_doc_freq: 0.5,
            min_doc_freq: 1,
            tokenizer: TokenizerConfig::default(),
        }
    }
}

/// Token ↔ column mapping of a built text modality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: HashMap<String, usize>,
    doc_freq: Vec<usize>,
}

impl Vocabulary {
    fn from_sorted(entries: Vec<(String, usize)>) -> Self {
        let mut tokens = Vec::with_capacity(entries.len());
        let mut doc_freq = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());
        for (position, (token, df)) in entries.into_iter().enumerate() {
            index.insert(token.clone(), position);
            tokens.push(token);
            doc_freq.push(df);
        }
        Self {
            tokens,
            index,
            doc_freq,
        }
    }

    /// Column of a token
    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    pub fn token(&self, column: usize) -> Option<&str> {
        self.tokens.get(column).map(|s| s.as_str())
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Number of documents containing the token at `column`
    pub fn doc_freq(&self, column: usize) -> Option<usize> {
        self.doc_freq.get(column).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Output of [`TextModality::build`]: the vocabulary and the count table.
#[derive(Debug, Clone)]
pub struct TextFeatures {
    vocabulary: Vocabulary,
    counts: FeatureTable,
}

impl TextFeatures {
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Raw token counts, one row per document
    pub fn counts(&self) -> &FeatureTable {
        &self.counts
    }

    pub fn into_counts(self) -> FeatureTable {
        self.counts
    }

    /// TF-IDF weighted, L2-normalized rows over the same vocabulary.
    ///
    /// idf(t) = ln((1 + n) / (1 + df(t))) + 1
    pub fn tf_idf(&self) -> Result<FeatureTable> {
        let n_docs = self.counts.len() as f32;
        let idf: Vec<f32> = (0..self.vocabulary.len())
            .map(|column| {
                let df = self.vocabulary.doc_freq(column).unwrap_or(0) as f32;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let rows: Vec<Vec<f32>> = self
            .counts
            .iter()
            .map(|(_, row)| {
                let mut weighted: Vec<f32> = row.iter().zip(&idf).map(|(tf, w)| tf * w).collect();
                let norm = weighted.iter().map(|v| v * v).sum::<f32>().sqrt();
                if norm > 0.0 {
                    weighted.iter_mut().for_each(|v| *v /= norm);
                }
                weighted
            })
            .collect();

        FeatureTable::from_rows(self.counts.ids().to_vec(), rows, FeatureOrigin::Text)
    }
}

/// Builds fixed-length token-count vectors for item documents.
pub struct TextModality {
    tokenizer: Box<dyn Tokenizer>,
    max_vocab: usize,
    max_doc_freq: f64,
    min_doc_freq: usize,
}

impl TextModality {
    /// Create a builder with the default limits (5000 tokens, max_doc_freq 0.5)
    pub fn new(tokenizer: impl Tokenizer + 'static) -> Self {
        let defaults = TextModalityConfig::default();
        Self {
            tokenizer: Box::new(tokenizer),
            max_vocab: defaults.max_vocab,
            max_doc_freq: defaults.max_doc_freq,
            min_doc_freq: defaults.min_doc_freq,
        }
    }

    pub fn from_config(config: &TextModalityConfig) -> Result<Self> {
        let modality = Self::new(config.tokenizer.build()?)
            .with_max_vocab(config.max_vocab)
            .with_max_doc_freq(config.max_doc_freq)
            .with_min_doc_freq(config.min_doc_freq);
        modality.validate()?;
        Ok(modality)
    }

    pub fn with_max_vocab(mut self, max_vocab: usize) -> Self {
        self.max_vocab = max_vocab;
        self
    }

    pub fn with_max_doc_freq(mut self, max_doc_freq: f64) -> Self {
        self.max_doc_freq = max_doc_freq;
        self
    }

    pub fn with_min_doc_freq(mut self, min_doc_freq: usize) -> Self {
        self.min_doc_freq = min_doc_freq;
        self
    }

    /// Check the limits: `max_vocab > 0` and `max_doc_freq` in (0, 1]
    pub fn validate(&self) -> Result<()> {
        if self.max_vocab == 0 {
            return Err(ModalityError::InvalidConfig {
                field: "max_vocab".to_string(),
                value: self.max_vocab.to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if !(self.max_doc_freq > 0.0 && self.max_doc_freq <= 1.0) {
            return Err(ModalityError::InvalidConfig {
                field: "max_doc_freq".to_string(),
                value: self.max_doc_freq.to_string(),
                reason: "must be a fraction in (0, 1]".to_string(),
            });
        }
        Ok(())
    }

    /// Build count vectors for every document, keyed by item id
    pub fn build(&self, documents: &BTreeMap<ItemId, RawDocument>) -> Result<TextFeatures> {
        let (ids, texts): (Vec<ItemId>, Vec<&str>) = documents
            .iter()
            .map(|(id, doc)| (id.clone(), doc.text.as_str()))
            .unzip();
        self.build_corpus(ids, &texts)
    }

    /// Build count vectors for parallel `ids` / `texts` slices
    #[instrument(skip_all, fields(documents = texts.len()))]
    pub fn build_corpus(&self, ids: Vec<ItemId>, texts: &[&str]) -> Result<TextFeatures> {
        self.validate()?;
        if ids.len() != texts.len() {
            return Err(ModalityError::LengthMismatch {
                ids: ids.len(),
                rows: texts.len(),
            });
        }

        let tokenized: Vec<Vec<String>> = texts
            .par_iter()
            .map(|text| self.tokenizer.tokenize(text))
            .collect();

        let vocabulary = self.build_vocabulary(&tokenized);
        if vocabulary.is_empty() {
            warn!("Text modality produced an empty vocabulary; all feature rows have length 0");
        }

        let rows: Vec<Vec<f32>> = tokenized
            .par_iter()
            .map(|tokens| {
                let mut row = vec![0.0f32; vocabulary.len()];
                for token in tokens {
                    if let Some(column) = vocabulary.index_of(token) {
                        row[column] += 1.0;
                    }
                }
                row
            })
            .collect();

        let counts = FeatureTable::from_rows(ids, rows, FeatureOrigin::Text)?;
        info!(
            "Built text modality: {} documents, vocabulary of {} tokens",
            counts.len(),
            vocabulary.len()
        );

        Ok(TextFeatures { vocabulary, counts })
    }

    fn build_vocabulary(&self, tokenized: &[Vec<String>]) -> Vocabulary {
        let n_docs = tokenized.len();
        let mut term_freq: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();

        for tokens in tokenized {
            let mut seen: HashSet<&str> = HashSet::new();
            for token in tokens {
                *term_freq.entry(token.as_str()).or_insert(0) += 1;
                if seen.insert(token.as_str()) {
                    *doc_freq.entry(token.as_str()).or_insert(0) += 1;
                }
            }
        }

        let max_docs = self.max_doc_freq * n_docs as f64;
        let mut candidates: Vec<(&str, usize, usize)> = term_freq
            .into_iter()
            .filter_map(|(token, tf)| {
                let df = doc_freq.get(token).copied().unwrap_or(0);
                // tolerance absorbs float noise in fraction * n
                let within_max = df as f64 <= max_docs + 1e-9;
                (within_max && df >= self.min_doc_freq).then_some((token, tf, df))
            })
            .collect();

        let distinct = candidates.len();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        candidates.truncate(self.max_vocab);

        let mut kept: Vec<(String, usize)> = candidates
            .into_iter()
            .map(|(token, _, df)| (token.to_string(), df))
            .collect();
        kept.sort_by(|a, b| a.0.cmp(&b.0));

        debug!(
            "Vocabulary: {} candidate tokens after document-frequency pruning, {} kept",
            distinct,
            kept.len()
        );
        Vocabulary::from_sorted(kept)
    }
}

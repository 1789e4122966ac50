//! Tokenization capability.
//!
//! Anything that turns a text into a sequence of tokens can drive the text
//! modality. `BaseTokenizer` is the reference implementation: it applies a
//! list of pre-processing rules, splits on a separator character and removes
//! stop words.

use crate::error::{ModalityError, Result};
use crate::stopwords::StopWords;
use serde::{Deserialize, Serialize};

/// Splits a text into tokens.
///
/// `Send + Sync` lets documents be tokenized in parallel.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Pre-processing applied to the raw text before splitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRule {
    Lowercase,
    /// Remove `<...>` markup
    StripTags,
    /// Remove ASCII digits
    StripNumeric,
    /// Replace ASCII punctuation with a space (the separator is kept)
    StripPunctuation,
    /// Collapse runs of spaces into one
    CollapseSpaces,
}

impl TextRule {
    pub fn defaults() -> Vec<TextRule> {
        vec![
            TextRule::Lowercase,
            TextRule::StripTags,
            TextRule::StripNumeric,
            TextRule::StripPunctuation,
            TextRule::CollapseSpaces,
        ]
    }

    fn apply(self, text: &str, sep: char) -> String {
        match self {
            TextRule::Lowercase => text.to_lowercase(),
            TextRule::StripTags => strip_tags(text),
            TextRule::StripNumeric => text.chars().filter(|c| !c.is_ascii_digit()).collect(),
            TextRule::StripPunctuation => text
                .chars()
                .map(|c| if c.is_ascii_punctuation() && c != sep { ' ' } else { c })
                .collect(),
            TextRule::CollapseSpaces => {
                let mut out = String::with_capacity(text.len());
                let mut previous_space = false;
                for c in text.chars() {
                    if c == ' ' {
                        if !previous_space {
                            out.push(c);
                        }
                        previous_space = true;
                    } else {
                        out.push(c);
                        previous_space = false;
                    }
                }
                out
            }
        }
    }
}

fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Rule-based tokenizer splitting on one separator character.
///
/// ## Example
/// ```ignore
/// let tokenizer = BaseTokenizer::new('\t').with_stop_words(StopWords::english());
/// assert_eq!(tokenizer.tokenize("The\tdroid\tescapes"), vec!["droid", "escapes"]);
/// ```
#[derive(Debug, Clone)]
pub struct BaseTokenizer {
    sep: char,
    stop_words: Option<StopWords>,
    rules: Vec<TextRule>,
}

impl BaseTokenizer {
    /// Create a tokenizer with the default rules and no stop words
    pub fn new(sep: char) -> Self {
        Self {
            sep,
            stop_words: None,
            rules: TextRule::defaults(),
        }
    }

    pub fn with_stop_words(mut self, stop_words: StopWords) -> Self {
        self.stop_words = Some(stop_words);
        self
    }

    /// Replace the pre-processing rules (an empty list disables them)
    pub fn with_rules(mut self, rules: Vec<TextRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn sep(&self) -> char {
        self.sep
    }
}

impl Default for BaseTokenizer {
    fn default() -> Self {
        Self::new(' ')
    }
}

impl Tokenizer for BaseTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let processed = self
            .rules
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc, self.sep));

        processed
            .split(self.sep)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .filter(|token| {
                self.stop_words
                    .as_ref()
                    .is_none_or(|stop_words| !stop_words.contains(token))
            })
            .map(str::to_string)
            .collect()
    }
}

/// Serializable description of a `BaseTokenizer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub sep: char,
    /// Language of the built-in stop word list, e.g. `"english"`
    pub stop_words: Option<String>,
    pub rules: Vec<TextRule>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            sep: ' ',
            stop_words: None,
            rules: TextRule::defaults(),
        }
    }
}

impl TokenizerConfig {
    pub fn build(&self) -> Result<BaseTokenizer> {
        let mut tokenizer = BaseTokenizer::new(self.sep).with_rules(self.rules.clone());
        if let Some(language) = &self.stop_words {
            let stop_words =
                StopWords::for_language(language).ok_or_else(|| ModalityError::InvalidConfig {
                    field: "stop_words".to_string(),
                    value: language.clone(),
                    reason: "no built-in stop word list for this language".to_string(),
                })?;
            tokenizer = tokenizer.with_stop_words(stop_words);
        }
        Ok(tokenizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_tab_with_stop_words() {
        let tokenizer = BaseTokenizer::new('\t').with_stop_words(StopWords::english());
        let tokens = tokenizer.tokenize("The\tdroid\tescapes\tfrom\tthe\tEmpire");
        assert_eq!(tokens, vec!["droid", "escapes", "empire"]);
    }

    #[test]
    fn test_default_rules() {
        let tokenizer = BaseTokenizer::default();
        let tokens = tokenizer.tokenize("<b>Luke</b>, aged 19,   meets   Obi-Wan!");
        assert_eq!(tokens, vec!["luke", "aged", "meets", "obi", "wan"]);
    }

    #[test]
    fn test_no_rules_keeps_raw_tokens() {
        let tokenizer = BaseTokenizer::new(' ').with_rules(Vec::new());
        assert_eq!(tokenizer.tokenize("Hello, World"), vec!["Hello,", "World"]);
    }

    #[test]
    fn test_punctuation_separator_survives_rules() {
        let tokenizer = BaseTokenizer::new(',');
        assert_eq!(tokenizer.tokenize("a.b,c"), vec!["a b", "c"]);
    }

    #[test]
    fn test_tokenizer_as_trait_object() {
        struct Chars;
        impl Tokenizer for Chars {
            fn tokenize(&self, text: &str) -> Vec<String> {
                text.chars().map(String::from).collect()
            }
        }

        let tokenizers: Vec<Box<dyn Tokenizer>> = vec![Box::new(Chars), Box::new(BaseTokenizer::default())];
        assert_eq!(tokenizers[0].tokenize("ab"), vec!["a", "b"]);
        assert_eq!(tokenizers[1].tokenize("a b"), vec!["a", "b"]);
    }

    #[test]
    fn test_config_unknown_language() {
        let config = TokenizerConfig {
            stop_words: Some("klingon".to_string()),
            ..TokenizerConfig::default()
        };
        assert!(matches!(
            config.build(),
            Err(ModalityError::InvalidConfig { .. })
        ));
    }
}

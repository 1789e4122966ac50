//! Parsers for the feedback and plot files.
//!
//! - feedback: `user<sep>item<sep>rating[<sep>timestamp]` (MovieLens uses `::`)
//! - plots: `item::plot text` where the text may itself contain tabs or `::`
//!
//! The path-based functions read the file and delegate to the `_str`
//! variants, which keeps the line-level logic testable without fixtures.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Helper function to read a file with ISO-8859-1 encoding (Latin-1)
///
/// The MovieLens files use ISO-8859-1, not UTF-8. Every byte maps directly
/// to the Unicode code point of the same value.
fn read_latin1(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    Ok(bytes.iter().map(|&b| b as char).collect())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse a feedback file
pub fn parse_feedback(path: &Path, sep: &str) -> Result<Vec<FeedbackRecord>> {
    let content = read_latin1(path)?;
    parse_feedback_str(&content, sep, &file_label(path))
}

/// Parse feedback lines from an in-memory string
///
/// `file` only labels parse errors.
pub fn parse_feedback_str(content: &str, sep: &str, file: &str) -> Result<Vec<FeedbackRecord>> {
    if sep.is_empty() {
        return Err(DataLoadError::InvalidValue {
            field: "separator".to_string(),
            value: String::new(),
        });
    }

    let mut records = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue; // Skip empty lines
        }

        let mut parts = line_trimmed.split(sep);

        let user_id = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DataLoadError::ParseError {
                file: file.to_string(),
                line: line_no,
                reason: "Missing userId".to_string(),
            })?;
        let item_id = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DataLoadError::ParseError {
                file: file.to_string(),
                line: line_no,
                reason: "Missing itemId".to_string(),
            })?;
        let rating_value = parts.next().ok_or_else(|| DataLoadError::ParseError {
            file: file.to_string(),
            line: line_no,
            reason: "Missing rating".to_string(),
        })?;
        // A trailing timestamp column is allowed and ignored

        let rating: f32 = rating_value
            .trim()
            .parse()
            .map_err(|e| DataLoadError::ParseError {
                file: file.to_string(),
                line: line_no,
                reason: format!("Invalid rating: {}", e),
            })?;
        if !rating.is_finite() {
            return Err(DataLoadError::InvalidValue {
                field: "rating".to_string(),
                value: rating_value.to_string(),
            });
        }

        records.push(FeedbackRecord::new(user_id.trim(), item_id.trim(), rating));
    }

    Ok(records)
}

/// Parse a plot file into documents keyed by item id
pub fn parse_documents(path: &Path) -> Result<BTreeMap<ItemId, RawDocument>> {
    let content = read_latin1(path)?;
    parse_documents_str(&content, &file_label(path))
}

/// Parse plot lines from an in-memory string
///
/// Format: `item::text`. Only the first `::` separates the id; the rest of
/// the line is the document text, kept verbatim.
pub fn parse_documents_str(content: &str, file: &str) -> Result<BTreeMap<ItemId, RawDocument>> {
    let mut documents = BTreeMap::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let (item_id, text) = line
            .trim_end_matches(['\r', '\n'])
            .split_once("::")
            .ok_or_else(|| DataLoadError::ParseError {
                file: file.to_string(),
                line: line_no,
                reason: "Missing '::' between itemId and text".to_string(),
            })?;
        let item_id = item_id.trim();
        if item_id.is_empty() {
            return Err(DataLoadError::ParseError {
                file: file.to_string(),
                line: line_no,
                reason: "Missing itemId".to_string(),
            });
        }

        if documents.contains_key(item_id) {
            return Err(DataLoadError::DuplicateKey {
                entity: "document".to_string(),
                id: item_id.to_string(),
                line: line_no,
            });
        }
        documents.insert(item_id.to_string(), RawDocument::new(item_id, text));
    }

    Ok(documents)
}

//! # Labeled Corpus Parsing
//!
//! The rating variant trains on records separated by a double-tab
//! delimiter, each record `<text><TAB><numeric label>`.

use crate::errors::{CLResult, CharloomError};

/// Separator between labeled records.
pub const RECORD_DELIMITER: &str = "\t\t";

/// One training record for the rating variant.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    /// The text to score.
    pub text: String,

    /// The supervised label.
    pub label: f32,
}

/// Parse a delimiter-separated labeled corpus.
///
/// Records whose text is two characters or shorter are discarded as noise.
/// A longer record with no label separator, or with a label that fails to
/// parse, is a data error.
pub fn parse_labeled_corpus(raw: &str) -> CLResult<Vec<LabeledRecord>> {
    let mut records = Vec::new();

    for chunk in raw.split(RECORD_DELIMITER) {
        let (text, label) = match chunk.split_once('\t') {
            Some(parts) => parts,
            None => {
                if chunk.chars().count() <= 2 {
                    continue;
                }
                return Err(CharloomError::Parse(format!(
                    "labeled record has no label separator: {chunk:?}"
                )));
            }
        };

        if text.chars().count() <= 2 {
            continue;
        }

        let label: f32 = label
            .trim()
            .parse()
            .map_err(|e: std::num::ParseFloatError| {
                CharloomError::Parse(format!("bad label {label:?}: {e}"))
            })?;

        records.push(LabeledRecord {
            text: text.to_string(),
            label,
        });
    }

    Ok(records)
}

/// Normalize a message for rating.
///
/// Tabs become spaces (they would collide with the record delimiters),
/// non-ASCII characters are stripped, and the result is trimmed and
/// lowercased.
pub fn normalize_message(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\t' { ' ' } else { c })
        .filter(char::is_ascii)
        .collect::<String>()
        .trim()
        .to_lowercase()
}

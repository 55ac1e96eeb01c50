//! # Pretrained Embedding Loading
//!
//! Text format, one row per symbol: the symbol, then `width` decimal
//! components, space-separated. Every row must match the configured width;
//! a mismatch is fatal with no partial load.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use compact_str::CompactString;

use crate::{
    errors::{CLResult, CharloomError},
    vocab::CharVocab,
};

/// Pretrained symbol embeddings, keyed by symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct PretrainedEmbedding {
    width: usize,
    vectors: HashMap<CompactString, Vec<f32>>,
}

impl PretrainedEmbedding {
    /// The embedding width every row carries.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The number of symbols covered.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Check if no symbols are covered.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// The vector for a symbol, if covered.
    pub fn vector(
        &self,
        symbol: &str,
    ) -> Option<&[f32]> {
        self.vectors.get(symbol).map(Vec::as_slice)
    }

    /// The number of vocabulary symbols this embedding covers.
    pub fn coverage(
        &self,
        vocab: &CharVocab,
    ) -> usize {
        vocab
            .symbols()
            .iter()
            .filter(|s| self.vectors.contains_key(s.as_str()))
            .count()
    }
}

/// Load a pretrained embedding from a file.
pub fn load_embedding_path<P: AsRef<Path>>(
    path: P,
    expected_width: usize,
) -> CLResult<PretrainedEmbedding> {
    let reader = BufReader::new(File::open(path)?);
    read_embedding(reader, expected_width)
}

/// Read a pretrained embedding from a line reader.
///
/// ## Arguments
/// * `reader` - the line source.
/// * `expected_width` - the embedding width the model is configured with.
///
/// ## Returns
/// The embedding, or a fatal data error on any row whose width differs
/// from `expected_width` or whose components fail to parse.
pub fn read_embedding<R: BufRead>(
    reader: R,
    expected_width: usize,
) -> CLResult<PretrainedEmbedding> {
    let mut vectors = HashMap::new();

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split(' ');
        let symbol = parts
            .next()
            .ok_or_else(|| CharloomError::Parse("embedding row has no symbol".into()))?;

        let components: Vec<f32> = parts
            .map(|p| {
                p.parse()
                    .map_err(|e: std::num::ParseFloatError| CharloomError::Parse(e.to_string()))
            })
            .collect::<CLResult<_>>()?;

        if components.len() != expected_width {
            return Err(CharloomError::EmbeddingWidthMismatch {
                expected: expected_width,
                found: components.len(),
            });
        }

        vectors.insert(CompactString::from(symbol), components);
    }

    Ok(PretrainedEmbedding {
        width: expected_width,
        vectors,
    })
}

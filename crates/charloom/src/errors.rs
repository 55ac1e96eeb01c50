//! # Error Types

use std::path::PathBuf;

use crate::types::TokenId;

/// Errors from charloom operations.
#[derive(Debug, thiserror::Error)]
pub enum CharloomError {
    /// The vocabulary has no symbols.
    #[error("vocabulary is empty")]
    EmptyVocabulary,

    /// A reserved token demanded by the active options is absent or misplaced.
    #[error("reserved token {token:?} missing from vocabulary")]
    MissingReservedToken {
        /// The reserved token that was expected.
        token: String,
    },

    /// Vocabulary data is inconsistent.
    #[error("{0}")]
    VocabConflict(String),

    /// A character has no id and the vocabulary carries no OOV fallback.
    #[error("symbol {symbol:?} not in vocabulary")]
    UnknownSymbol {
        /// The character that could not be encoded.
        symbol: char,
    },

    /// An id does not name a vocabulary symbol.
    #[error("token id {id} out of vocabulary range")]
    TokenOutOfRange {
        /// The offending id.
        id: TokenId,
    },

    /// Sampling temperature must be strictly positive.
    #[error("temperature must be > 0, got {tau}")]
    InvalidTemperature {
        /// The rejected temperature value.
        tau: f32,
    },

    /// Every candidate symbol was masked out of the sampling distribution.
    #[error("no unmasked probability mass to sample from")]
    DegenerateDistribution,

    /// Fixed windows must hold at least one input/target pair.
    #[error("window width ({width}) must be >= 2")]
    WindowTooNarrow {
        /// The rejected window width.
        width: usize,
    },

    /// A pretrained embedding row does not match the configured width.
    #[error("embedding width mismatch: expected {expected}, found {found}")]
    EmbeddingWidthMismatch {
        /// The configured embedding width.
        expected: usize,
        /// The width found in the file.
        found: usize,
    },

    /// A checkpoint directory is missing its paired vocabulary.
    #[error("checkpoint {} has no paired vocab.json", .path.display())]
    CheckpointMissingVocab {
        /// The checkpoint directory.
        path: PathBuf,
    },

    /// A checkpoint directory is missing its weight files.
    #[error("checkpoint {} has no weight files", .path.display())]
    CheckpointMissingWeights {
        /// The checkpoint directory.
        path: PathBuf,
    },

    /// Invalid component configuration.
    #[error("{0}")]
    Config(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Parse error (labels, embedding rows, etc.)
    #[error("parse error: {0}")]
    Parse(String),

    /// Error from an external component.
    #[error("{0}")]
    External(String),
}

/// Result type for charloom operations.
pub type Result<T> = core::result::Result<T, CharloomError>;

/// Result type for charloom operations.
pub type CLResult<T> = Result<T>;

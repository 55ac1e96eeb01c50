//! # Corpus Windowing

use std::sync::Arc;

use crate::{
    errors::{CLResult, CharloomError},
    types::{EncodedSequence, TokenId},
    vocab::CharVocab,
};

/// How raw corpus text is sliced into supervised examples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Each newline-delimited line is one example.
    Line,

    /// The flattened character stream is sliced into contiguous windows of
    /// the configured width.
    Fixed {
        /// The window width, in characters; at least 2.
        width: usize,
    },
}

/// When example order is shuffled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShufflePolicy {
    /// Keep corpus order.
    Never,

    /// Shuffle once before training.
    #[default]
    Once,

    /// Reshuffle at the start of every epoch.
    EachEpoch,
}

/// Options for the [`CorpusWindower`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowerOptions {
    /// The windowing policy.
    pub policy: WindowPolicy,

    /// Drop a trailing partial window instead of keeping it short.
    /// Only meaningful under [`WindowPolicy::Fixed`].
    pub drop_remainder: bool,

    /// Order examples by length before batching, so batch padding is
    /// mostly applied to similarly sized neighbors.
    pub sort_by_length: bool,
}

impl Default for WindowerOptions {
    fn default() -> Self {
        Self {
            policy: WindowPolicy::Line,
            drop_remainder: false,
            sort_by_length: false,
        }
    }
}

impl WindowerOptions {
    /// Sets the windowing policy.
    pub fn with_policy(
        self,
        policy: WindowPolicy,
    ) -> Self {
        Self { policy, ..self }
    }

    /// Sets the drop-remainder flag.
    pub fn with_drop_remainder(
        self,
        drop_remainder: bool,
    ) -> Self {
        Self {
            drop_remainder,
            ..self
        }
    }

    /// Sets the sort-by-length flag.
    pub fn with_sort_by_length(
        self,
        sort_by_length: bool,
    ) -> Self {
        Self {
            sort_by_length,
            ..self
        }
    }
}

/// One supervised next-character example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    /// Ids at positions `0..n-1`.
    pub input: EncodedSequence,

    /// Ids at positions `1..n`.
    pub target: EncodedSequence,
}

impl Example {
    fn from_ids(ids: &[TokenId]) -> Self {
        Self {
            input: ids[..ids.len() - 1].to_vec(),
            target: ids[1..].to_vec(),
        }
    }
}

/// Turns raw training text into fixed-shape supervised windows.
pub struct CorpusWindower {
    vocab: Arc<CharVocab>,
    options: WindowerOptions,
}

impl CorpusWindower {
    /// Create a windower.
    ///
    /// ## Returns
    /// The windower, or a fatal configuration error when the vocabulary
    /// does not carry the mask id batch padding depends on, or the fixed
    /// window width cannot hold an input/target pair.
    pub fn new(
        vocab: Arc<CharVocab>,
        options: WindowerOptions,
    ) -> CLResult<Self> {
        if vocab.mask_id().is_none() {
            return Err(CharloomError::MissingReservedToken {
                token: "[MASK]".to_string(),
            });
        }
        if let WindowPolicy::Fixed { width } = options.policy
            && width < 2
        {
            return Err(CharloomError::WindowTooNarrow { width });
        }
        Ok(Self { vocab, options })
    }

    /// The windower options.
    pub fn options(&self) -> &WindowerOptions {
        &self.options
    }

    /// Slice a corpus into supervised examples.
    ///
    /// Slices too short to hold an input/target pair are skipped.
    pub fn windows(
        &self,
        corpus: &str,
    ) -> CLResult<Vec<Example>> {
        let mut examples = match self.options.policy {
            WindowPolicy::Line => self.line_windows(corpus)?,
            WindowPolicy::Fixed { width } => self.fixed_windows(corpus, width)?,
        };

        if self.options.sort_by_length {
            examples.sort_by_key(|e| e.input.len());
        }
        Ok(examples)
    }

    fn line_windows(
        &self,
        corpus: &str,
    ) -> CLResult<Vec<Example>> {
        let mut examples = Vec::new();
        for line in corpus.lines() {
            let ids = self.vocab.encode(line)?;
            if ids.len() >= 2 {
                examples.push(Example::from_ids(&ids));
            }
        }
        Ok(examples)
    }

    fn fixed_windows(
        &self,
        corpus: &str,
        width: usize,
    ) -> CLResult<Vec<Example>> {
        let ids = self.vocab.encode(corpus)?;
        let mut examples = Vec::new();
        for chunk in ids.chunks(width) {
            if chunk.len() < width && self.options.drop_remainder {
                continue;
            }
            if chunk.len() >= 2 {
                examples.push(Example::from_ids(chunk));
            }
        }
        Ok(examples)
    }
}

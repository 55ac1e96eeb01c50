//! # Batching and Epoch Ordering

use rand::{Rng, seq::SliceRandom};

use crate::{
    dataset::{Example, ShufflePolicy},
    errors::{CLResult, CharloomError},
    types::{EncodedSequence, TokenId},
};

/// A batch of equally sized input/target pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Input sequences, padded to the batch width.
    pub inputs: Vec<EncodedSequence>,

    /// Target sequences, padded to the batch width.
    pub targets: Vec<EncodedSequence>,
}

impl Batch {
    /// The number of examples in the batch.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Check if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// The padded sequence width.
    pub fn width(&self) -> usize {
        self.inputs.first().map(Vec::len).unwrap_or(0)
    }
}

/// Group examples into fixed-size batches, padding every sequence to the
/// longest member of its batch with `pad_id`.
///
/// A trailing partial batch is kept.
pub fn pad_to_batches(
    examples: &[Example],
    batch_size: usize,
    pad_id: TokenId,
) -> CLResult<Vec<Batch>> {
    if batch_size == 0 {
        return Err(CharloomError::Config("batch size must be > 0".into()));
    }

    let pad = |seq: &EncodedSequence, width: usize| {
        let mut padded = seq.clone();
        padded.resize(width, pad_id);
        padded
    };

    Ok(examples
        .chunks(batch_size)
        .map(|chunk| {
            let width = chunk.iter().map(|e| e.input.len()).max().unwrap_or(0);
            Batch {
                inputs: chunk.iter().map(|e| pad(&e.input, width)).collect(),
                targets: chunk.iter().map(|e| pad(&e.target, width)).collect(),
            }
        })
        .collect())
}

/// Example ordering across epochs, driven by a [`ShufflePolicy`].
pub struct EpochPlan {
    examples: Vec<Example>,
    shuffle: ShufflePolicy,
}

impl EpochPlan {
    /// Create a plan over the examples.
    ///
    /// Under [`ShufflePolicy::Once`] the order is shuffled here and reused
    /// by every epoch.
    pub fn new<R: Rng>(
        mut examples: Vec<Example>,
        shuffle: ShufflePolicy,
        rng: &mut R,
    ) -> Self {
        if shuffle == ShufflePolicy::Once {
            examples.shuffle(rng);
        }
        Self { examples, shuffle }
    }

    /// The number of examples.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Check if the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// The example order for the next epoch.
    ///
    /// Under [`ShufflePolicy::EachEpoch`] this reshuffles; otherwise the
    /// order is stable across calls.
    pub fn next_epoch<R: Rng>(
        &mut self,
        rng: &mut R,
    ) -> &[Example] {
        if self.shuffle == ShufflePolicy::EachEpoch {
            self.examples.shuffle(rng);
        }
        &self.examples
    }
}

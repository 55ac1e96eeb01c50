//! # Sequence Transducer Contract
//!
//! A transducer is a stateful function mapping a token sequence (plus prior
//! recurrent state) to per-position score vectors and updated state. The
//! numeric internals (embedding table, recurrent cell equations, output
//! projection) are hidden behind the [`SequenceTransducer`] and
//! [`ScoringTransducer`] capability traits; any conforming numeric backend
//! is acceptable.
//!
//! The contract a conforming backend must honor:
//! * determinism given fixed weights, state, and inputs with
//!   `training = false`;
//! * state shape fixed per layer and independent of sequence length;
//! * output logits exactly vocabulary-size wide per position.
//!
//! See:
//! * [`state`] for the threaded recurrent state model.
//! * [`bigram`] for the built-in count-based reference backend.
//! * [`embedding`] for the pretrained-embedding loader.

use std::path::Path;

use crate::{
    errors::CLResult,
    types::{Logits, TokenId},
};

pub mod bigram;
pub mod embedding;
pub mod state;

#[doc(inline)]
pub use bigram::{BigramOptions, BigramScorer, BigramTransducer};
#[doc(inline)]
pub use embedding::PretrainedEmbedding;
#[doc(inline)]
pub use state::{LayerState, LayerWidths, StateInit, TransducerState};

/// Output of one [`SequenceTransducer::step`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    /// One score vector per input position, each vocabulary-size wide.
    pub logits: Vec<Logits>,

    /// The updated recurrent state, to be threaded into the next call.
    pub state: TransducerState,
}

/// A stateful multi-layer recurrent sequence model.
///
/// The transducer is stateless across independent `step` calls except for
/// the explicitly threaded state value; this is what allows incremental,
/// one-character-at-a-time decoding without recomputing the whole history.
pub trait SequenceTransducer {
    /// The vocabulary size; the width of every logits row.
    fn vocab_size(&self) -> usize;

    /// The fixed per-layer state widths.
    fn state_widths(&self) -> Vec<LayerWidths>;

    /// Advance the model over `inputs`.
    ///
    /// ## Arguments
    /// * `inputs` - token ids to consume, in order.
    /// * `state` - the threaded recurrent state; `None` requests the
    ///   backend's well-defined initial state (all-zero or noise-seeded,
    ///   per its [`StateInit`] configuration) rather than failing.
    /// * `training` - enables training-only behavior such as dropout.
    ///
    /// ## Returns
    /// One logits row per input position plus the updated state.
    fn step(
        &self,
        inputs: &[TokenId],
        state: Option<TransducerState>,
        training: bool,
    ) -> CLResult<StepOutput>;
}

/// A single-shot scoring model with no externally visible state.
pub trait ScoringTransducer {
    /// The vocabulary size the model was trained against.
    fn vocab_size(&self) -> usize;

    /// Score a complete encoded text with a scalar in `[-1, 1]`.
    fn score(
        &self,
        inputs: &[TokenId],
    ) -> CLResult<f32>;
}

/// Weight persistence seam for checkpointing.
///
/// Backends own their weight file layout inside the checkpoint directory;
/// the file names must match the `ckpt*` pattern. Pairing with the
/// vocabulary snapshot is orchestrated by [`crate::checkpoint`].
pub trait PersistentTransducer {
    /// Write the learned parameters into `dir`.
    fn save_weights(
        &self,
        dir: &Path,
    ) -> CLResult<()>;

    /// Replace the learned parameters from `dir`.
    ///
    /// Fails without partial effect when the persisted weights do not match
    /// the model's configured vocabulary size.
    fn load_weights(
        &mut self,
        dir: &Path,
    ) -> CLResult<()>;
}

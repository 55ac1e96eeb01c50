//! # `charloom` Character Sequence-Model Runtime
//!
//! A character-level sequence-modeling runtime with two consumers: a
//! generator that autoregressively produces text from a seed phrase, and a
//! rater that scores a complete text with a scalar. Both share a reversible
//! character/vocabulary codec, a stateful recurrent transducer abstraction,
//! and a corpus-windowing/checkpointing pipeline.
//!
//! See:
//! * [`vocab`] to build vocabularies and encode/decode text.
//! * [`transducer`] for the sequence-model contract and the built-in
//!   count-based reference backend.
//! * [`generate`] for the autoregressive decoding loop.
//! * [`rate`] for single-shot scoring.
//! * [`dataset`] and [`training`] to window corpora and drive training.
//! * [`checkpoint`] to persist paired weights and vocabularies.
//! * [`session`] for the interactive stdin/stdout protocols.
//!
//! The numeric internals of a recurrent model (embedding table, gated
//! recurrent cells, output projection) are deliberately behind the
//! [`transducer::SequenceTransducer`] capability trait; any conforming
//! numeric backend is acceptable.
//!
//! ## Crate Features
//!
//! #### feature: ``default``
//!
//! * ``training``
//!
//! #### feature: ``training``
//!
//! The training feature enables the corpus windowing, batching, and
//! training-support code.
//!
//! #### feature: ``testing``
//!
//! Enables deterministic transducer stubs for downstream tests.
#![warn(missing_docs, unused)]

pub mod checkpoint;
pub mod errors;
pub mod generate;
pub mod rate;
pub mod session;
pub mod transducer;
pub mod types;
pub mod vocab;

#[cfg(feature = "training")]
pub mod dataset;

#[cfg(feature = "training")]
pub mod training;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use errors::{CLResult, CharloomError};
pub use types::{EncodedSequence, Logits, TokenId};

//! # Autoregressive Generation
//!
//! The decoding loop that turns a seed phrase into a message, one sampled
//! character at a time, against any [`crate::transducer::SequenceTransducer`].
//!
//! See:
//! * [`Generator`] for the decoding state machine.
//! * [`PredictionMask`] and [`sample_categorical`] for masked temperature
//!   sampling.

mod generator;
mod sampler;

#[doc(inline)]
pub use generator::*;
#[doc(inline)]
pub use sampler::*;

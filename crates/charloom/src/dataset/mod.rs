//! # Training Data Pipeline
//!
//! Turns raw corpus text into fixed-shape supervised windows and batches
//! for next-character prediction.
//!
//! See:
//! * [`CorpusWindower`] for the windowing policies.
//! * [`pad_to_batches`] and [`EpochPlan`] for batching and shuffling.

mod batcher;
mod windower;

#[doc(inline)]
pub use batcher::*;
#[doc(inline)]
pub use windower::*;

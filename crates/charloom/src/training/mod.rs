//! # Training Support
//!
//! Run configuration and the loss-plateau early-stop mechanism. The
//! training loop itself is thin wiring owned by the caller: window, batch,
//! update the backend, watch the loss, rotate checkpoints.

mod early_stop;
mod training_options;

#[doc(inline)]
pub use early_stop::*;
#[doc(inline)]
pub use training_options::*;

//! # Checkpoint Persistence
//!
//! A checkpoint directory pairs the transducer's learned parameters
//! (`ckpt*` files, owned by the backend) with the vocabulary snapshot
//! (`vocab.json`) used to produce them. Weights are meaningless against any
//! other vocabulary, so the pair is loaded and validated together.

use std::{fs, path::Path};

use crate::errors::CLResult;

mod manager;

#[doc(inline)]
pub use manager::*;

/// The vocabulary snapshot file inside a checkpoint directory.
pub const VOCAB_FILE: &str = "vocab.json";

/// The weight-file prefix inside a checkpoint directory.
pub const WEIGHTS_PREFIX: &str = "ckpt";

/// The weight file written by the built-in count-based backends.
pub const WEIGHTS_FILE: &str = "ckpt.json";

/// Write a file through a temp sibling plus rename, so readers never
/// observe a half-written file.
pub(crate) fn write_atomic(
    path: &Path,
    bytes: &[u8],
) -> CLResult<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

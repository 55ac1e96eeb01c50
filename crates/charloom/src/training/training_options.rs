//! # Training Run Configuration

use std::path::PathBuf;

use crate::{
    dataset::{ShufflePolicy, WindowerOptions},
    errors::{CLResult, CharloomError},
};

/// Configuration for one training run.
///
/// The numeric-model widths (embedding, recurrent layers, dropout,
/// learning rate) are carried for the backend; the reference backend only
/// consumes the pipeline fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOptions {
    /// Examples per batch.
    pub batch_size: usize,

    /// Embedding width.
    pub embedding_units: usize,

    /// Recurrent width per layer.
    pub rnn_units: Vec<usize>,

    /// Dropout rate, in `[0, 1)`.
    pub dropout_rate: f32,

    /// Number of training epochs.
    pub epochs: usize,

    /// Optimizer learning rate.
    pub learning_rate: f32,

    /// Continue from the persisted checkpoint instead of starting fresh.
    pub restore: bool,

    /// Optional pretrained-embedding file to initialize the embedding
    /// layer from.
    pub pretrained_embedding: Option<PathBuf>,

    /// Windowing configuration.
    pub windower: WindowerOptions,

    /// When example order is shuffled.
    pub shuffle: ShufflePolicy,

    /// Snapshot the working checkpoint every this many epochs; zero
    /// disables rotation.
    pub rotate_every: usize,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            batch_size: 40,
            embedding_units: 128,
            rnn_units: vec![1024, 256],
            dropout_rate: 0.1,
            epochs: 30,
            learning_rate: 3.0e-4,
            restore: false,
            pretrained_embedding: None,
            windower: WindowerOptions::default(),
            shuffle: ShufflePolicy::default(),
            rotate_every: 5,
        }
    }
}

impl TrainingOptions {
    /// Validate the options.
    pub fn validate(&self) -> CLResult<()> {
        if self.batch_size == 0 {
            return Err(CharloomError::Config("batch size must be > 0".into()));
        }
        if self.epochs == 0 {
            return Err(CharloomError::Config("epoch count must be > 0".into()));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(CharloomError::Config(format!(
                "dropout rate must be in [0, 1), got {}",
                self.dropout_rate
            )));
        }
        if self.rnn_units.is_empty() {
            return Err(CharloomError::Config(
                "at least one recurrent layer width is required".into(),
            ));
        }
        Ok(())
    }
}

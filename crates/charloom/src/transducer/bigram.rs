//! # Count-Based Reference Backend
//!
//! A transition-count bigram model conforming to the transducer contracts
//! with plain arithmetic. It exists so the full pipeline (windowing,
//! training, checkpointing, interactive sessions) can run and be tested
//! without an external numeric library; neural backends plug in through the
//! same traits.

use std::path::Path;

use crate::{
    checkpoint::{WEIGHTS_FILE, write_atomic},
    errors::{CLResult, CharloomError},
    transducer::{
        LayerState, LayerWidths, PersistentTransducer, ScoringTransducer, SequenceTransducer,
        StepOutput, TransducerState,
    },
    types::{Logits, TokenId},
};

/// The hidden-state value encoding "no previous context".
const NO_CONTEXT: f32 = -1.0;

/// Options for the count-based backends.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BigramOptions {
    /// Additive smoothing applied to every transition count.
    pub smoothing: f32,
}

impl Default for BigramOptions {
    fn default() -> Self {
        Self { smoothing: 0.5 }
    }
}

impl BigramOptions {
    /// Sets the additive smoothing.
    pub fn with_smoothing(
        self,
        smoothing: f32,
    ) -> Self {
        Self { smoothing }
    }

    /// Initializes a [`BigramTransducer`] from these options.
    pub fn init(
        self,
        vocab_size: usize,
    ) -> BigramTransducer {
        BigramTransducer::new(vocab_size, self)
    }
}

/// Count-based next-symbol model.
///
/// Logits for a position are the log-smoothed transition counts out of the
/// symbol at that position; with no context yet, out of the symbol
/// marginals. State is a single layer carrying the previous token id.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BigramTransducer {
    vocab_size: usize,
    smoothing: f32,
    counts: Vec<Vec<u32>>,
    unigram: Vec<u32>,
}

impl BigramTransducer {
    /// Create an untrained model over a vocabulary.
    pub fn new(
        vocab_size: usize,
        options: BigramOptions,
    ) -> Self {
        Self {
            vocab_size,
            smoothing: options.smoothing,
            counts: vec![vec![0; vocab_size]; vocab_size],
            unigram: vec![0; vocab_size],
        }
    }

    /// Accumulate transition counts from one supervised example.
    ///
    /// ## Arguments
    /// * `input` - ids at positions `0..n`.
    /// * `target` - ids at positions `1..n+1`; same length as `input`.
    /// * `skip` - id excluded from counting (batch padding).
    pub fn update_from_example(
        &mut self,
        input: &[TokenId],
        target: &[TokenId],
        skip: Option<TokenId>,
    ) -> CLResult<()> {
        if input.len() != target.len() {
            return Err(CharloomError::Config(format!(
                "input length ({}) != target length ({})",
                input.len(),
                target.len()
            )));
        }

        for (&i, &t) in input.iter().zip(target) {
            if skip == Some(i) || skip == Some(t) {
                continue;
            }
            self.check_id(i)?;
            self.check_id(t)?;
            self.counts[i as usize][t as usize] += 1;
            self.unigram[t as usize] += 1;
        }
        Ok(())
    }

    /// Mean negative log-likelihood of one supervised example.
    pub fn example_loss(
        &self,
        input: &[TokenId],
        target: &[TokenId],
        skip: Option<TokenId>,
    ) -> CLResult<f32> {
        let mut total = 0.0f64;
        let mut n = 0usize;

        for (&i, &t) in input.iter().zip(target) {
            if skip == Some(i) || skip == Some(t) {
                continue;
            }
            self.check_id(i)?;
            self.check_id(t)?;

            let row = &self.counts[i as usize];
            let row_total: u64 = row.iter().map(|&c| c as u64).sum();
            let denom = row_total as f64 + f64::from(self.smoothing) * self.vocab_size as f64;
            let p = (f64::from(row[t as usize]) + f64::from(self.smoothing)) / denom;
            total -= p.ln();
            n += 1;
        }

        if n == 0 {
            return Ok(0.0);
        }
        Ok((total / n as f64) as f32)
    }

    fn check_id(
        &self,
        id: TokenId,
    ) -> CLResult<()> {
        if (id as usize) < self.vocab_size {
            Ok(())
        } else {
            Err(CharloomError::TokenOutOfRange { id })
        }
    }

    fn context_logits(
        &self,
        context: Option<TokenId>,
    ) -> Logits {
        let row = match context {
            Some(id) => &self.counts[id as usize],
            None => &self.unigram,
        };
        row.iter()
            .map(|&c| (c as f32 + self.smoothing).ln())
            .collect()
    }

    fn decode_context(
        &self,
        state: &TransducerState,
    ) -> Option<TokenId> {
        let value = *state.layers().first()?.hidden.first()?;
        if value < 0.0 || value >= self.vocab_size as f32 {
            None
        } else {
            Some(value as TokenId)
        }
    }

    fn encode_context(
        &self,
        context: Option<TokenId>,
    ) -> TransducerState {
        let value = match context {
            Some(id) => id as f32,
            None => NO_CONTEXT,
        };
        TransducerState::from_layers(vec![LayerState {
            hidden: vec![value],
            cell: None,
        }])
    }
}

impl SequenceTransducer for BigramTransducer {
    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn state_widths(&self) -> Vec<LayerWidths> {
        vec![LayerWidths {
            hidden: 1,
            cell: None,
        }]
    }

    fn step(
        &self,
        inputs: &[TokenId],
        state: Option<TransducerState>,
        _training: bool,
    ) -> CLResult<StepOutput> {
        let mut context = match &state {
            Some(state) => self.decode_context(state),
            None => None,
        };

        let mut logits = Vec::with_capacity(inputs.len());
        for &id in inputs {
            self.check_id(id)?;
            logits.push(self.context_logits(Some(id)));
            context = Some(id);
        }

        Ok(StepOutput {
            logits,
            state: self.encode_context(context),
        })
    }
}

impl PersistentTransducer for BigramTransducer {
    fn save_weights(
        &self,
        dir: &Path,
    ) -> CLResult<()> {
        write_atomic(&dir.join(WEIGHTS_FILE), &serde_json::to_vec(self)?)
    }

    fn load_weights(
        &mut self,
        dir: &Path,
    ) -> CLResult<()> {
        let bytes = std::fs::read(dir.join(WEIGHTS_FILE))?;
        let loaded: Self = serde_json::from_slice(&bytes)?;
        if loaded.vocab_size != self.vocab_size {
            return Err(CharloomError::VocabConflict(format!(
                "checkpoint weights cover {} symbols, vocabulary has {}",
                loaded.vocab_size, self.vocab_size
            )));
        }
        *self = loaded;
        Ok(())
    }
}

/// Count-based scoring model for the rating variant.
///
/// Accumulates the mean label of every observed transition; a text scores
/// as the tanh-squashed mean over its transitions, falling back to the
/// global label mean for unseen transitions.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BigramScorer {
    vocab_size: usize,
    sums: Vec<Vec<f32>>,
    counts: Vec<Vec<u32>>,
    label_sum: f64,
    label_count: u64,
}

impl BigramScorer {
    /// Create an untrained scorer over a vocabulary.
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            sums: vec![vec![0.0; vocab_size]; vocab_size],
            counts: vec![vec![0; vocab_size]; vocab_size],
            label_sum: 0.0,
            label_count: 0,
        }
    }

    /// Accumulate one labeled example.
    pub fn update_from_example(
        &mut self,
        input: &[TokenId],
        label: f32,
    ) -> CLResult<()> {
        for &id in input {
            if (id as usize) >= self.vocab_size {
                return Err(CharloomError::TokenOutOfRange { id });
            }
        }

        for pair in input.windows(2) {
            let (a, b) = (pair[0] as usize, pair[1] as usize);
            self.sums[a][b] += label;
            self.counts[a][b] += 1;
        }
        self.label_sum += f64::from(label);
        self.label_count += 1;
        Ok(())
    }

    fn global_mean(&self) -> f32 {
        if self.label_count == 0 {
            return 0.0;
        }
        (self.label_sum / self.label_count as f64) as f32
    }
}

impl ScoringTransducer for BigramScorer {
    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn score(
        &self,
        inputs: &[TokenId],
    ) -> CLResult<f32> {
        for &id in inputs {
            if (id as usize) >= self.vocab_size {
                return Err(CharloomError::TokenOutOfRange { id });
            }
        }

        let global = self.global_mean();
        if inputs.len() < 2 {
            return Ok(global.tanh());
        }

        let mut total = 0.0f64;
        let mut n = 0usize;
        for pair in inputs.windows(2) {
            let (a, b) = (pair[0] as usize, pair[1] as usize);
            let mean = if self.counts[a][b] > 0 {
                self.sums[a][b] / self.counts[a][b] as f32
            } else {
                global
            };
            total += f64::from(mean);
            n += 1;
        }

        Ok(((total / n as f64) as f32).tanh())
    }
}

impl PersistentTransducer for BigramScorer {
    fn save_weights(
        &self,
        dir: &Path,
    ) -> CLResult<()> {
        write_atomic(&dir.join(WEIGHTS_FILE), &serde_json::to_vec(self)?)
    }

    fn load_weights(
        &mut self,
        dir: &Path,
    ) -> CLResult<()> {
        let bytes = std::fs::read(dir.join(WEIGHTS_FILE))?;
        let loaded: Self = serde_json::from_slice(&bytes)?;
        if loaded.vocab_size != self.vocab_size {
            return Err(CharloomError::VocabConflict(format!(
                "checkpoint weights cover {} symbols, vocabulary has {}",
                loaded.vocab_size, self.vocab_size
            )));
        }
        *self = loaded;
        Ok(())
    }
}

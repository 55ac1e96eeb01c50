//! # Masked Temperature Sampling

use rand::Rng;

use crate::{
    errors::{CLResult, CharloomError},
    types::TokenId,
    vocab::CharVocab,
};

/// Additive prediction mask.
///
/// Holds negative infinity at every id that must never be sampled as
/// generation output (the mask, OOV, and message-start ids), zero
/// elsewhere; added to logits before the categorical draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionMask {
    mask: Vec<f32>,
}

impl PredictionMask {
    /// Build the mask for a vocabulary, banning whichever reserved ids its
    /// options activate.
    pub fn for_vocab(vocab: &CharVocab) -> Self {
        let mut mask = vec![0.0; vocab.len()];
        for id in [vocab.mask_id(), vocab.oov_id(), vocab.start_id()]
            .into_iter()
            .flatten()
        {
            mask[id as usize] = f32::NEG_INFINITY;
        }
        Self { mask }
    }

    /// The mask width.
    pub fn len(&self) -> usize {
        self.mask.len()
    }

    /// Check if the mask is empty.
    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Check if an id is banned from sampled output.
    pub fn is_banned(
        &self,
        id: TokenId,
    ) -> bool {
        self.mask
            .get(id as usize)
            .is_some_and(|&v| v == f32::NEG_INFINITY)
    }

    /// The additive mask values.
    pub fn values(&self) -> &[f32] {
        &self.mask
    }
}

/// Sample one id from the masked, temperature-scaled categorical
/// distribution over `logits`.
///
/// Temperature below 1 sharpens the distribution toward the argmax; above 1
/// flattens it toward uniform. Masked ids carry zero probability.
///
/// ## Arguments
/// * `logits` - one score per vocabulary symbol.
/// * `temperature` - scaling divisor; must be validated positive by the
///   caller.
/// * `mask` - the additive prediction mask; same width as `logits`.
/// * `rng` - the random source; inject a seeded generator for
///   reproducibility.
pub fn sample_categorical<R: Rng>(
    logits: &[f32],
    temperature: f32,
    mask: &PredictionMask,
    rng: &mut R,
) -> CLResult<TokenId> {
    if logits.len() != mask.len() {
        return Err(CharloomError::Config(format!(
            "logits width ({}) != vocabulary size ({})",
            logits.len(),
            mask.len()
        )));
    }

    let scaled: Vec<f32> = logits
        .iter()
        .zip(mask.values())
        .map(|(&l, &m)| l / temperature + m)
        .collect();

    let max = scaled
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if max == f32::NEG_INFINITY {
        return Err(CharloomError::DegenerateDistribution);
    }

    let weights: Vec<f64> = scaled
        .iter()
        .map(|&v| f64::from(v - max).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(CharloomError::DegenerateDistribution);
    }

    // Inverse-CDF draw over the unnormalized weights.
    let mut point = rng.random::<f64>() * total;
    for (id, &w) in weights.iter().enumerate() {
        point -= w;
        if point <= 0.0 {
            return Ok(id as TokenId);
        }
    }

    // Rounding can leave the draw just past the last positive weight.
    let last = weights
        .iter()
        .rposition(|&w| w > 0.0)
        .ok_or(CharloomError::DegenerateDistribution)?;
    Ok(last as TokenId)
}

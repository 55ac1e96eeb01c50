//! # Rating Runner

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    errors::{CLResult, CharloomError},
    transducer::ScoringTransducer,
    vocab::CharVocab,
};

/// One rated text.
#[derive(Debug, Clone, PartialEq)]
pub struct Rated {
    /// The scalar score, bounded to `[-1, 1]` by the scoring model.
    pub score: f32,

    /// Wall-clock time the call took.
    pub elapsed: Duration,
}

/// Single-shot text rater.
///
/// No state threading and no loop; the whole text is encoded and scored in
/// one call.
pub struct Rater<M: ScoringTransducer> {
    model: M,
    vocab: Arc<CharVocab>,
}

impl<M: ScoringTransducer> Rater<M> {
    /// Create a rater.
    ///
    /// ## Returns
    /// The rater, or a fatal configuration error when the vocabulary lacks
    /// the mask scheme or disagrees with the model width.
    pub fn new(
        model: M,
        vocab: Arc<CharVocab>,
    ) -> CLResult<Self> {
        if vocab.oov_id().is_none() {
            return Err(CharloomError::MissingReservedToken {
                token: "[UNK]".to_string(),
            });
        }
        if model.vocab_size() != vocab.len() {
            return Err(CharloomError::VocabConflict(format!(
                "model width ({}) != vocabulary size ({})",
                model.vocab_size(),
                vocab.len()
            )));
        }
        Ok(Self { model, vocab })
    }

    /// The vocabulary the rater encodes against.
    pub fn vocab(&self) -> &Arc<CharVocab> {
        &self.vocab
    }

    /// Rate a complete text.
    pub fn rate(
        &self,
        text: &str,
    ) -> CLResult<Rated> {
        let start = Instant::now();
        let ids = self.vocab.encode(text)?;
        let score = self.model.score(&ids)?;
        Ok(Rated {
            score,
            elapsed: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{testing::FixedScorer, vocab::VocabOptions};

    #[test]
    fn test_rate() {
        let vocab = Arc::new(CharVocab::build("some text", VocabOptions::rater()).unwrap());
        let rater = Rater::new(FixedScorer::new(vocab.len(), 0.75), vocab).unwrap();

        let rated = rater.rate("some text").unwrap();
        assert_eq!(rated.score, 0.75);
    }

    #[test]
    fn test_rater_requires_the_mask_scheme() {
        let options = VocabOptions::rater().with_mask_scheme(false);
        let vocab = Arc::new(CharVocab::build("abc", options).unwrap());
        assert!(matches!(
            Rater::new(FixedScorer::new(vocab.len(), 0.0), vocab),
            Err(CharloomError::MissingReservedToken { .. })
        ));
    }

    #[test]
    fn test_rater_rejects_width_mismatch() {
        let vocab = Arc::new(CharVocab::build("abc", VocabOptions::rater()).unwrap());
        assert!(matches!(
            Rater::new(FixedScorer::new(2, 0.0), vocab),
            Err(CharloomError::VocabConflict(_))
        ));
    }
}

//! # Test Support
//!
//! Deterministic transducer stubs for exercising the decoding and rating
//! machinery without trained weights.

use crate::{
    errors::{CLResult, CharloomError},
    transducer::{
        LayerState, LayerWidths, ScoringTransducer, SequenceTransducer, StepOutput,
        TransducerState,
    },
    types::TokenId,
};

/// How strongly a scripted prediction dominates the rest of the row.
const SCRIPT_LOGIT: f32 = 100.0;

/// A transducer that argmax-predicts a fixed script of ids, one per step
/// call, repeating the final entry once the script is exhausted.
///
/// The step counter threads through the state, so a fresh `None` state
/// restarts the script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedTransducer {
    vocab_size: usize,
    script: Vec<TokenId>,
}

impl ScriptedTransducer {
    /// Create a scripted transducer.
    ///
    /// ## Arguments
    /// * `vocab_size` - width of every logits row.
    /// * `script` - ids to predict, in order; must be non-empty and in
    ///   range.
    pub fn new(
        vocab_size: usize,
        script: Vec<TokenId>,
    ) -> Self {
        assert!(!script.is_empty(), "script must be non-empty");
        assert!(
            script.iter().all(|&id| (id as usize) < vocab_size),
            "script ids must be in range"
        );
        Self { vocab_size, script }
    }

    fn cursor(
        &self,
        state: &Option<TransducerState>,
    ) -> usize {
        state
            .as_ref()
            .and_then(|s| s.layers().first())
            .and_then(|l| l.hidden.first())
            .map(|&v| v as usize)
            .unwrap_or(0)
    }
}

impl SequenceTransducer for ScriptedTransducer {
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
        for &id in inputs {
            if (id as usize) >= self.vocab_size {
                return Err(CharloomError::TokenOutOfRange { id });
            }
        }

        let cursor = self.cursor(&state);
        let scripted = self.script[cursor.min(self.script.len() - 1)];

        let mut row = vec![0.0; self.vocab_size];
        row[scripted as usize] = SCRIPT_LOGIT;

        Ok(StepOutput {
            logits: vec![row; inputs.len()],
            state: TransducerState::from_layers(vec![LayerState {
                hidden: vec![(cursor + 1) as f32],
                cell: None,
            }]),
        })
    }
}

/// A scorer that returns a fixed value for every input.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedScorer {
    vocab_size: usize,
    score: f32,
}

impl FixedScorer {
    /// Create a fixed scorer.
    pub fn new(
        vocab_size: usize,
        score: f32,
    ) -> Self {
        Self { vocab_size, score }
    }
}

impl ScoringTransducer for FixedScorer {
    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn score(
        &self,
        _inputs: &[TokenId],
    ) -> CLResult<f32> {
        Ok(self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_transducer_advances_per_step() {
        let model = ScriptedTransducer::new(4, vec![2, 3]);

        let first = model.step(&[0, 1], None, false).unwrap();
        assert_eq!(first.logits.len(), 2);
        assert_eq!(first.logits[1][2], SCRIPT_LOGIT);

        let second = model.step(&[2], Some(first.state), false).unwrap();
        assert_eq!(second.logits[0][3], SCRIPT_LOGIT);

        // Exhausted scripts repeat the final entry.
        let third = model.step(&[3], Some(second.state), false).unwrap();
        assert_eq!(third.logits[0][3], SCRIPT_LOGIT);
    }
}

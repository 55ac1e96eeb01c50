//! # Decoding State Machine

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use rand::Rng;

use crate::{
    errors::{CLResult, CharloomError},
    generate::{PredictionMask, sample_categorical},
    transducer::SequenceTransducer,
    types::TokenId,
    vocab::{CharVocab, MESSAGE_TERMINATOR},
};

/// Options for the [`Generator`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorOptions {
    /// Sampling temperature; must be strictly positive.
    pub temperature: f32,

    /// Hard cap on produced characters, bounding worst-case latency when
    /// the model degenerates into a non-terminating loop.
    pub max_chars: usize,

    /// The character that ends a message.
    pub terminator: char,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            max_chars: 1000,
            terminator: MESSAGE_TERMINATOR,
        }
    }
}

impl GeneratorOptions {
    /// Sets the sampling temperature.
    pub fn with_temperature(
        self,
        temperature: f32,
    ) -> Self {
        Self {
            temperature,
            ..self
        }
    }

    /// Sets the produced-character cap.
    pub fn with_max_chars(
        self,
        max_chars: usize,
    ) -> Self {
        Self { max_chars, ..self }
    }

    /// Sets the terminator character.
    pub fn with_terminator(
        self,
        terminator: char,
    ) -> Self {
        Self { terminator, ..self }
    }

    /// Validate the options.
    pub fn validate(&self) -> CLResult<()> {
        if !(self.temperature > 0.0 && self.temperature.is_finite()) {
            return Err(CharloomError::InvalidTemperature {
                tau: self.temperature,
            });
        }
        if self.max_chars == 0 {
            return Err(CharloomError::Config("max_chars must be > 0".into()));
        }
        Ok(())
    }
}

/// How a generation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The model produced the terminator character.
    Terminated,

    /// The produced-character cap was reached first. A valid outcome, not
    /// an error.
    Truncated,
}

/// One generated message.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    /// The produced text, truncated at the first terminator, with embedded
    /// newlines replaced by spaces. Does not include the seed.
    pub text: String,

    /// How the run ended.
    pub outcome: GenerationOutcome,

    /// Wall-clock time the run took.
    pub elapsed: Duration,
}

/// Autoregressive character generator.
///
/// Owns no mutable state across calls; the model and vocabulary are
/// read-only after load, so one generator can serve repeated calls. Each
/// call threads its own transducer state and consumes the injected random
/// source, which is why repeated calls with the same seed phrase diverge.
pub struct Generator<M: SequenceTransducer> {
    model: M,
    vocab: Arc<CharVocab>,
    mask: PredictionMask,
    options: GeneratorOptions,
    start_id: Option<TokenId>,
}

impl<M: SequenceTransducer> Generator<M> {
    /// Create a generator.
    ///
    /// ## Arguments
    /// * `model` - the sequence transducer to decode against.
    /// * `vocab` - the vocabulary paired with the model's weights.
    /// * `options` - sampling and termination options.
    ///
    /// ## Returns
    /// The generator, or a fatal configuration error when the options are
    /// invalid, the vocabulary lacks the reserved tokens generation
    /// depends on, or the model width disagrees with the vocabulary.
    pub fn new(
        model: M,
        vocab: Arc<CharVocab>,
        options: GeneratorOptions,
    ) -> CLResult<Self> {
        options.validate()?;

        for (token, id) in [("[MASK]", vocab.mask_id()), ("[UNK]", vocab.oov_id())] {
            if id.is_none() {
                return Err(CharloomError::MissingReservedToken {
                    token: token.to_string(),
                });
            }
        }
        let start_id = vocab.start_id();

        if model.vocab_size() != vocab.len() {
            return Err(CharloomError::VocabConflict(format!(
                "model width ({}) != vocabulary size ({})",
                model.vocab_size(),
                vocab.len()
            )));
        }

        let mask = PredictionMask::for_vocab(&vocab);
        Ok(Self {
            model,
            vocab,
            mask,
            options,
            start_id,
        })
    }

    /// The vocabulary the generator decodes against.
    pub fn vocab(&self) -> &Arc<CharVocab> {
        &self.vocab
    }

    /// The generator options.
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Generate one message from a seed phrase.
    ///
    /// The seed (possibly empty) is prefixed with the message-start token
    /// when the vocabulary carries one, then fed through the transducer;
    /// output characters are sampled one at a time with the state threaded
    /// between steps, until the terminator appears or the character cap is
    /// hit.
    pub fn generate<R: Rng>(
        &self,
        seed: &str,
        rng: &mut R,
    ) -> CLResult<Generated> {
        let start = Instant::now();

        let mut inputs: Vec<TokenId> = self.start_id.into_iter().collect();
        inputs.extend(self.vocab.encode(seed)?);
        if inputs.is_empty() {
            return Err(CharloomError::Config(
                "an empty seed needs a vocabulary with a message-start token".into(),
            ));
        }

        let mut state = None;
        let mut text = String::new();
        let mut produced = 0usize;

        let outcome = loop {
            let out = self.model.step(&inputs, state.take(), false)?;
            state = Some(out.state);

            let last = out
                .logits
                .last()
                .ok_or_else(|| CharloomError::External("transducer produced no logits".into()))?;

            let id = sample_categorical(last, self.options.temperature, &self.mask, rng)?;
            let symbol = self
                .vocab
                .symbol(id)
                .ok_or(CharloomError::TokenOutOfRange { id })?;

            text.push_str(symbol);
            produced += symbol.chars().count();

            if symbol.contains(self.options.terminator) {
                break GenerationOutcome::Terminated;
            }
            if produced >= self.options.max_chars {
                break GenerationOutcome::Truncated;
            }

            inputs = vec![id];
        };

        let text = match text.split_once(self.options.terminator) {
            Some((head, _)) => head,
            None => text.as_str(),
        }
        .replace('\n', " ");

        Ok(Generated {
            text,
            outcome,
            elapsed: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        testing::ScriptedTransducer,
        transducer::{BigramOptions, BigramTransducer},
        vocab::VocabOptions,
    };

    fn vocab(corpus: &str) -> Arc<CharVocab> {
        Arc::new(CharVocab::build(corpus, VocabOptions::generator()).unwrap())
    }

    #[test]
    fn test_scripted_generation_terminates() {
        // Symbols: [MASK]=0, [UNK]=1, [START]=2, letter block, then "$".
        let vocab = vocab("ab$");
        let b = vocab.id_for_char('b').unwrap();
        let terminator = vocab.id_for_char('$').unwrap();

        let model = ScriptedTransducer::new(vocab.len(), vec![b, terminator]);
        let generator = Generator::new(model, vocab, GeneratorOptions::default()).unwrap();

        let out = generator
            .generate("a", &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(out.text, "b");
        assert_eq!(out.outcome, GenerationOutcome::Terminated);
    }

    #[test]
    fn test_reserved_ids_never_appear_in_output() {
        let vocab = vocab("to be or not to be$");
        let mut model = BigramOptions::default().init(vocab.len());
        let ids = vocab.encode("to be or not to be$").unwrap();
        model
            .update_from_example(&ids[..ids.len() - 1], &ids[1..], None)
            .unwrap();

        let generator = Generator::new(
            model,
            vocab.clone(),
            GeneratorOptions::default().with_max_chars(200),
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let out = generator.generate("to", &mut rng).unwrap();
            assert!(!out.text.contains("[MASK]"));
            assert!(!out.text.contains("[UNK]"));
            assert!(!out.text.contains("[START]"));
        }
    }

    #[test]
    fn test_generation_always_halts_within_the_cap() {
        // A model that never produces the terminator.
        let vocab = vocab("abc$");
        let a = vocab.id_for_char('a').unwrap();

        for tau in [0.25, 1.0, 4.0] {
            let generator = Generator::new(
                ScriptedTransducer::new(vocab.len(), vec![a]),
                vocab.clone(),
                GeneratorOptions::default().with_temperature(tau),
            )
            .unwrap();

            let out = generator
                .generate("abc", &mut StdRng::seed_from_u64(5))
                .unwrap();
            assert_eq!(out.outcome, GenerationOutcome::Truncated);
            assert_eq!(out.text.chars().count(), 1000);
        }
    }

    #[test]
    fn test_output_is_truncated_at_the_terminator_and_single_line() {
        let vocab = vocab("ab\n$");
        let newline = vocab.id_for_char('\n').unwrap();
        let a = vocab.id_for_char('a').unwrap();
        let terminator = vocab.id_for_char('$').unwrap();
        let b = vocab.id_for_char('b').unwrap();

        let model = ScriptedTransducer::new(vocab.len(), vec![a, newline, a, terminator, b]);
        let generator = Generator::new(model, vocab, GeneratorOptions::default()).unwrap();

        let out = generator
            .generate("", &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(out.text, "a a");
        assert_eq!(out.outcome, GenerationOutcome::Terminated);
    }

    #[test]
    fn test_temperature_must_be_positive() {
        let vocab = vocab("ab$");
        let model = BigramTransducer::new(vocab.len(), BigramOptions::default());
        assert!(matches!(
            Generator::new(
                model,
                vocab,
                GeneratorOptions::default().with_temperature(0.0),
            ),
            Err(CharloomError::InvalidTemperature { .. })
        ));
    }

    #[test]
    fn test_generation_without_a_start_token() {
        // A vocabulary without a message-start token: the seed alone primes
        // the model, and only the mask and OOV ids are banned.
        let vocab = Arc::new(CharVocab::build("abc\n", VocabOptions::rater()).unwrap());
        let b = vocab.id_for_char('b').unwrap();
        let newline = vocab.id_for_char('\n').unwrap();

        let model = ScriptedTransducer::new(vocab.len(), vec![b, newline]);
        let generator = Generator::new(
            model,
            vocab,
            GeneratorOptions::default().with_terminator('\n'),
        )
        .unwrap();

        let out = generator
            .generate("a", &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(out.text, "b");
        assert_eq!(out.outcome, GenerationOutcome::Terminated);

        let err = generator.generate("", &mut StdRng::seed_from_u64(0));
        assert!(matches!(err, Err(CharloomError::Config(_))));
    }

    #[test]
    fn test_generator_requires_the_mask_scheme() {
        let options = VocabOptions::generator().with_mask_scheme(false);
        let vocab = Arc::new(CharVocab::build("ab$", options).unwrap());
        let model = BigramTransducer::new(vocab.len(), BigramOptions::default());
        assert!(matches!(
            Generator::new(model, vocab, GeneratorOptions::default()),
            Err(CharloomError::MissingReservedToken { .. })
        ));
    }

    #[test]
    fn test_model_and_vocab_widths_must_agree() {
        let vocab = vocab("ab$");
        let model = BigramTransducer::new(4, BigramOptions::default());
        assert!(matches!(
            Generator::new(model, vocab, GeneratorOptions::default()),
            Err(CharloomError::VocabConflict(_))
        ));
    }
}

#![allow(missing_docs)]

use std::sync::Arc;

use charloom::{
    CLResult, CharloomError, TokenId,
    checkpoint::CheckpointManager,
    dataset::{CorpusWindower, EpochPlan, ShufflePolicy, WindowerOptions, pad_to_batches},
    generate::{GenerationOutcome, Generator, GeneratorOptions},
    rate::{Rater, parse_labeled_corpus},
    session::run_generation_session,
    training::EarlyStopping,
    transducer::{
        BigramOptions, BigramScorer, BigramTransducer, LayerState, LayerWidths,
        SequenceTransducer, StepOutput, TransducerState,
    },
    vocab::{CharVocab, VocabOptions},
};
use compact_str::CompactString;
use rand::{SeedableRng, rngs::StdRng};
use tempdir::TempDir;

/// A downstream-style stub: argmax-predicts a fixed script, one id per
/// step, counting steps through the threaded state.
struct ArgmaxStub {
    vocab_size: usize,
    script: Vec<TokenId>,
}

impl SequenceTransducer for ArgmaxStub {
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
        let cursor = state
            .as_ref()
            .and_then(|s| s.layers().first())
            .and_then(|l| l.hidden.first())
            .map(|&v| v as usize)
            .unwrap_or(0);

        let scripted = self.script[cursor.min(self.script.len() - 1)];
        let mut row = vec![0.0; self.vocab_size];
        row[scripted as usize] = 100.0;

        Ok(StepOutput {
            logits: vec![row; inputs.len()],
            state: TransducerState::from_layers(vec![LayerState {
                hidden: vec![(cursor + 1) as f32],
                cell: None,
            }]),
        })
    }
}

#[test]
fn end_to_end_scripted_generation() {
    let symbols: Vec<CompactString> = ["[MASK]", "[UNK]", "a", "b", "c", "\n"]
        .into_iter()
        .map(CompactString::from)
        .collect();
    let vocab = Arc::new(CharVocab::from_symbols(symbols, VocabOptions::rater()).unwrap());

    let stub = ArgmaxStub {
        vocab_size: vocab.len(),
        script: vec![
            vocab.id_for_char('b').unwrap(),
            vocab.id_for_char('\n').unwrap(),
        ],
    };

    let generator = Generator::new(
        stub,
        vocab,
        GeneratorOptions::default().with_terminator('\n'),
    )
    .unwrap();

    let seed = "a";
    let out = generator
        .generate(seed, &mut StdRng::seed_from_u64(0))
        .unwrap();

    assert_eq!(format!("{seed}{}", out.text), "ab");
    assert_eq!(out.outcome, GenerationOutcome::Terminated);
}

const CORPUS: &str = "\
the linux kernel is great$
use linux$
linux is the best$
the best tools are free$
free software for the win$
";

fn train_generator_model(
    vocab: &Arc<CharVocab>,
    epochs: usize,
) -> BigramTransducer {
    let windower = CorpusWindower::new(
        vocab.clone(),
        WindowerOptions::default().with_sort_by_length(true),
    )
    .unwrap();
    let examples = windower.windows(CORPUS).unwrap();

    let mut plan = EpochPlan::new(examples, ShufflePolicy::Once, &mut StdRng::seed_from_u64(7));
    let mut model = BigramOptions::default().init(vocab.len());
    let mut stopper = EarlyStopping::default();
    let pad = vocab.mask_id().unwrap();

    let mut rng = StdRng::seed_from_u64(8);
    for _ in 0..epochs {
        let batches = pad_to_batches(plan.next_epoch(&mut rng), 2, pad).unwrap();

        let mut loss = 0.0;
        let mut n = 0usize;
        for batch in &batches {
            for (input, target) in batch.inputs.iter().zip(&batch.targets) {
                model.update_from_example(input, target, Some(pad)).unwrap();
                loss += model.example_loss(input, target, Some(pad)).unwrap();
                n += 1;
            }
        }

        if stopper.update(loss / n as f32) {
            break;
        }
    }
    model
}

#[test]
fn train_checkpoint_restore_reproduces_generation() {
    let vocab = Arc::new(CharVocab::build(CORPUS, VocabOptions::generator()).unwrap());
    let model = train_generator_model(&vocab, 4);

    let dir = TempDir::new("pipeline").unwrap();
    let manager = CheckpointManager::new(dir.path());
    manager.save(&model, &vocab).unwrap();

    let restored_vocab = Arc::new(manager.load_vocab(VocabOptions::generator()).unwrap());
    assert_eq!(restored_vocab.symbols(), vocab.symbols());

    let mut restored = BigramOptions::default().init(restored_vocab.len());
    manager.load_weights(&mut restored).unwrap();

    let original = Generator::new(model, vocab, GeneratorOptions::default()).unwrap();
    let reloaded = Generator::new(restored, restored_vocab, GeneratorOptions::default()).unwrap();

    // Identical weights, vocabulary, temperature, and random source give
    // identical output.
    for seed_phrase in ["linux ", "the ", ""] {
        let a = original
            .generate(seed_phrase, &mut StdRng::seed_from_u64(99))
            .unwrap();
        let b = reloaded
            .generate(seed_phrase, &mut StdRng::seed_from_u64(99))
            .unwrap();
        assert_eq!(a.text, b.text);
        assert_eq!(a.outcome, b.outcome);
    }
}

#[test]
fn full_prefix_and_incremental_stepping_agree() {
    let vocab = Arc::new(CharVocab::build(CORPUS, VocabOptions::generator()).unwrap());
    let model = train_generator_model(&vocab, 2);

    let ids = vocab.encode("linux is").unwrap();

    let full = model.step(&ids, None, false).unwrap();

    let mut state = None;
    let mut last = None;
    for &id in &ids {
        let out = model.step(&[id], state.take(), false).unwrap();
        state = Some(out.state);
        last = out.logits.into_iter().next_back();
    }

    assert_eq!(full.logits.last(), last.as_ref());
}

#[test]
fn generation_session_over_a_trained_model() {
    let vocab = Arc::new(CharVocab::build(CORPUS, VocabOptions::generator()).unwrap());
    let model = train_generator_model(&vocab, 2);
    let generator = Generator::new(model, vocab, GeneratorOptions::default()).unwrap();

    let mut out = Vec::new();
    run_generation_session(
        &generator,
        &mut StdRng::seed_from_u64(3),
        "linux \nuse \n".as_bytes(),
        &mut out,
    )
    .unwrap();

    let out = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("linux "));
    assert!(lines[3].starts_with("use "));
    assert!(!lines[0].contains("[MASK]"));
    assert!(!lines[0].contains("[START]"));
}

#[test]
fn rater_training_pipeline_round_trips() {
    let raw = "i love this\t0.9\t\tawful spam\t-0.8\t\tok\t0.1\t\tgreat work\t0.7";
    let records = parse_labeled_corpus(raw).unwrap();
    assert_eq!(records.len(), 3);

    let text: String = records.iter().map(|r| r.text.as_str()).collect();
    let vocab = Arc::new(CharVocab::build(&text, VocabOptions::rater()).unwrap());

    let mut scorer = BigramScorer::new(vocab.len());
    for record in &records {
        let ids = vocab.encode(&record.text).unwrap();
        scorer.update_from_example(&ids, record.label).unwrap();
    }

    let dir = TempDir::new("rater").unwrap();
    let manager = CheckpointManager::new(dir.path());
    manager.save(&scorer, &vocab).unwrap();

    let restored_vocab = Arc::new(manager.load_vocab(VocabOptions::rater()).unwrap());
    let mut restored = BigramScorer::new(restored_vocab.len());
    manager.load_weights(&mut restored).unwrap();

    let rater = Rater::new(scorer, vocab).unwrap();
    let reloaded = Rater::new(restored, restored_vocab).unwrap();

    for sample in ["i love this", "awful spam", "something new"] {
        let a = rater.rate(sample).unwrap().score;
        let b = reloaded.rate(sample).unwrap().score;
        assert_eq!(a, b);
        assert!((-1.0..=1.0).contains(&a));
    }
}

#[test]
fn restore_against_the_wrong_vocabulary_fails() {
    let vocab = Arc::new(CharVocab::build(CORPUS, VocabOptions::generator()).unwrap());
    let model = train_generator_model(&vocab, 1);

    let dir = TempDir::new("mismatch").unwrap();
    let manager = CheckpointManager::new(dir.path());
    manager.save(&model, &vocab).unwrap();

    let other = CharVocab::build("xy", VocabOptions::generator()).unwrap();
    let mut restored = BigramOptions::default().init(other.len());
    assert!(matches!(
        manager.load_weights(&mut restored),
        Err(CharloomError::VocabConflict(_))
    ));
}

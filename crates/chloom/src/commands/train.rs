use std::{
    io::{self, Read},
    path::PathBuf,
    sync::Arc,
};

use charloom::{
    checkpoint::CheckpointManager,
    dataset::{
        CorpusWindower, EpochPlan, Example, ShufflePolicy, WindowPolicy, WindowerOptions,
        pad_to_batches,
    },
    errors::CharloomError,
    rate::{normalize_message, parse_labeled_corpus},
    training::{EarlyStopping, TrainingOptions},
    transducer::{
        BigramOptions, BigramScorer, BigramTransducer, ScoringTransducer,
        embedding::load_embedding_path,
    },
    vocab::{CharVocab, VocabOptions},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::logging::LogArgs;

/// Windowing policies for the train commands.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum WindowMode {
    /// One example per corpus line.
    Line,

    /// Contiguous fixed-width windows over the flattened corpus.
    Fixed,
}

/// Shuffle policies for the train commands.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ShuffleMode {
    /// Keep corpus order.
    Never,

    /// Shuffle once before training.
    Once,

    /// Reshuffle every epoch.
    EachEpoch,
}

impl From<ShuffleMode> for ShufflePolicy {
    fn from(mode: ShuffleMode) -> Self {
        match mode {
            ShuffleMode::Never => ShufflePolicy::Never,
            ShuffleMode::Once => ShufflePolicy::Once,
            ShuffleMode::EachEpoch => ShufflePolicy::EachEpoch,
        }
    }
}

/// Args for the train-generator command.
#[derive(clap::Args, Debug)]
pub struct TrainGeneratorArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    /// Checkpoint directory.
    #[arg(long, default_value = "checkpoint")]
    checkpoint: PathBuf,

    /// Examples per batch.
    #[arg(long, default_value_t = 40)]
    batch_size: usize,

    /// Embedding width.
    #[arg(long, default_value_t = 128)]
    embedding_units: usize,

    /// Recurrent width per layer.
    #[arg(long, value_delimiter = ',', default_values_t = [1024, 256])]
    rnn_units: Vec<usize>,

    /// Dropout rate.
    #[arg(long, default_value_t = 0.1)]
    dropout: f32,

    /// Training epochs.
    #[arg(long, default_value_t = 30)]
    epochs: usize,

    /// Optimizer learning rate.
    #[arg(long, default_value_t = 0.0003)]
    learning_rate: f32,

    /// Continue from the saved checkpoint instead of starting fresh.
    #[arg(long)]
    restore: bool,

    /// Pretrained embedding file.
    #[arg(long)]
    pretrained_embedding: Option<PathBuf>,

    /// Snapshot the checkpoint every N epochs (0 disables rotation).
    #[arg(long, default_value_t = 5)]
    rotate_every: usize,

    /// Windowing policy.
    #[arg(long, value_enum, default_value_t = WindowMode::Line)]
    window: WindowMode,

    /// Window width for the fixed policy.
    #[arg(long, default_value_t = 100)]
    window_width: usize,

    /// Drop a trailing partial window instead of keeping it short.
    #[arg(long)]
    drop_remainder: bool,

    /// Order examples by length before batching.
    #[arg(long)]
    sort_by_length: bool,

    /// Shuffle policy.
    #[arg(long, value_enum, default_value_t = ShuffleMode::Once)]
    shuffle: ShuffleMode,

    /// Random seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
}

impl TrainGeneratorArgs {
    fn training_options(&self) -> TrainingOptions {
        let policy = match self.window {
            WindowMode::Line => WindowPolicy::Line,
            WindowMode::Fixed => WindowPolicy::Fixed {
                width: self.window_width,
            },
        };

        TrainingOptions {
            batch_size: self.batch_size,
            embedding_units: self.embedding_units,
            rnn_units: self.rnn_units.clone(),
            dropout_rate: self.dropout,
            epochs: self.epochs,
            learning_rate: self.learning_rate,
            restore: self.restore,
            pretrained_embedding: self.pretrained_embedding.clone(),
            windower: WindowerOptions::default()
                .with_policy(policy)
                .with_drop_remainder(self.drop_remainder)
                .with_sort_by_length(self.sort_by_length),
            shuffle: self.shuffle.into(),
            rotate_every: self.rotate_every,
        }
    }

    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let options = self.training_options();
        options.validate()?;

        let mut corpus = String::new();
        io::stdin().read_to_string(&mut corpus)?;

        let manager = CheckpointManager::new(&self.checkpoint);
        let vocab = if options.restore {
            Arc::new(manager.load_vocab(VocabOptions::generator())?)
        } else {
            Arc::new(CharVocab::build(&corpus, VocabOptions::generator())?)
        };
        log::info!("vocabulary: {} symbols", vocab.len());

        if let Some(path) = &options.pretrained_embedding {
            let embedding = load_embedding_path(path, options.embedding_units)?;
            log::info!(
                "pretrained embedding: {} rows cover {}/{} symbols",
                embedding.len(),
                embedding.coverage(&vocab),
                vocab.len()
            );
            log::warn!("the count-based backend does not consume pretrained embeddings");
        }

        let windower = CorpusWindower::new(vocab.clone(), options.windower)?;
        let examples = windower.windows(&corpus)?;
        log::info!("{} training examples", examples.len());

        let mut model = BigramOptions::default().init(vocab.len());
        if options.restore {
            manager.load_weights(&mut model)?;
        }

        let mut rng = seeded_rng(self.seed);
        run_epochs(
            &mut model,
            &manager,
            &vocab,
            examples,
            &options,
            &mut rng,
        )?;

        manager.save(&model, &vocab)?;
        Ok(())
    }
}

/// The epoch loop shared with restore-and-continue runs: batch, update,
/// watch the loss, rotate.
fn run_epochs<R: Rng>(
    model: &mut BigramTransducer,
    manager: &CheckpointManager,
    vocab: &Arc<CharVocab>,
    examples: Vec<Example>,
    options: &TrainingOptions,
    rng: &mut R,
) -> Result<(), CharloomError> {
    let pad = vocab
        .mask_id()
        .ok_or_else(|| CharloomError::MissingReservedToken {
            token: "[MASK]".to_string(),
        })?;

    let mut plan = EpochPlan::new(examples, options.shuffle, rng);
    let mut stopper = EarlyStopping::default();

    for epoch in 1..=options.epochs {
        let batches = pad_to_batches(plan.next_epoch(rng), options.batch_size, pad)?;

        let mut loss_sum = 0.0;
        let mut n = 0usize;
        for batch in &batches {
            for (input, target) in batch.inputs.iter().zip(&batch.targets) {
                model.update_from_example(input, target, Some(pad))?;
                loss_sum += model.example_loss(input, target, Some(pad))?;
                n += 1;
            }
        }
        let loss = if n == 0 { 0.0 } else { loss_sum / n as f32 };
        log::info!("epoch {epoch}/{}: loss {loss:.4}", options.epochs);

        if options.rotate_every > 0 && epoch % options.rotate_every == 0 {
            manager.save(model, vocab)?;
            manager.rotate(Some(loss))?;
        }

        if stopper.update(loss) {
            log::info!("loss plateaued, stopping early");
            break;
        }
    }
    Ok(())
}

/// Args for the train-rater command.
#[derive(clap::Args, Debug)]
pub struct TrainRaterArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    /// Checkpoint directory.
    #[arg(long, default_value = "rating-checkpoint")]
    checkpoint: PathBuf,

    /// Training epochs.
    #[arg(long, default_value_t = 10)]
    epochs: usize,

    /// Continue from the saved checkpoint instead of starting fresh.
    #[arg(long)]
    restore: bool,

    /// Snapshot the checkpoint every N epochs (0 disables rotation).
    #[arg(long, default_value_t = 5)]
    rotate_every: usize,
}

impl TrainRaterArgs {
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let mut raw = String::new();
        io::stdin().read_to_string(&mut raw)?;

        let mut records = parse_labeled_corpus(&raw)?;
        for record in &mut records {
            record.text = normalize_message(&record.text);
        }
        log::info!("{} labeled records", records.len());

        let text: String = records.iter().map(|r| r.text.as_str()).collect();
        let manager = CheckpointManager::new(&self.checkpoint);
        let vocab = if self.restore {
            Arc::new(manager.load_vocab(VocabOptions::rater())?)
        } else {
            Arc::new(CharVocab::build(&text, VocabOptions::rater())?)
        };
        log::info!("vocabulary: {} symbols", vocab.len());

        let mut scorer = BigramScorer::new(vocab.len());
        if self.restore {
            manager.load_weights(&mut scorer)?;
        }

        let mut stopper = EarlyStopping::default();
        for epoch in 1..=self.epochs {
            let mut loss = 0.0f64;
            for record in &records {
                let ids = vocab.encode(&record.text)?;
                scorer.update_from_example(&ids, record.label)?;
                let err = f64::from(scorer.score(&ids)? - record.label);
                loss += err * err;
            }
            let loss = if records.is_empty() {
                0.0
            } else {
                (loss / records.len() as f64) as f32
            };
            log::info!("epoch {epoch}/{}: mse {loss:.4}", self.epochs);

            if self.rotate_every > 0 && epoch % self.rotate_every == 0 {
                manager.save(&scorer, &vocab)?;
                manager.rotate(Some(loss))?;
            }
            if stopper.update(loss) {
                log::info!("loss plateaued, stopping early");
                break;
            }
        }

        manager.save(&scorer, &vocab)?;
        Ok(())
    }
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

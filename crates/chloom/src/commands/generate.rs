use std::{io, path::PathBuf};

use charloom::{
    checkpoint::CheckpointManager,
    generate::{Generator, GeneratorOptions},
    session::run_generation_session,
    transducer::BigramOptions,
    vocab::VocabOptions,
};

use crate::logging::LogArgs;

use super::train::seeded_rng;

/// Args for the generate command.
#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    /// Checkpoint directory.
    #[arg(long, default_value = "checkpoint")]
    checkpoint: PathBuf,

    /// Sampling temperature.
    #[arg(long, default_value_t = 1.0)]
    temperature: f32,

    /// Random seed for a reproducible session.
    #[arg(long)]
    seed: Option<u64>,
}

impl GenerateArgs {
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let manager = CheckpointManager::new(&self.checkpoint);
        let vocab = std::sync::Arc::new(manager.load_vocab(VocabOptions::generator())?);

        let mut model = BigramOptions::default().init(vocab.len());
        manager.load_weights(&mut model)?;

        let generator = Generator::new(
            model,
            vocab,
            GeneratorOptions::default().with_temperature(self.temperature),
        )?;

        log::info!("generating; type starting phrases, one per line");

        let mut rng = seeded_rng(self.seed);
        run_generation_session(
            &generator,
            &mut rng,
            io::stdin().lock(),
            io::stdout().lock(),
        )?;
        Ok(())
    }
}

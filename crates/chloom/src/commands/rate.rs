use std::{io, path::PathBuf};

use charloom::{
    checkpoint::CheckpointManager,
    rate::Rater,
    session::run_rating_session,
    transducer::BigramScorer,
    vocab::VocabOptions,
};

use crate::logging::LogArgs;

/// Args for the rate command.
#[derive(clap::Args, Debug)]
pub struct RateArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    /// Checkpoint directory.
    #[arg(long, default_value = "rating-checkpoint")]
    checkpoint: PathBuf,
}

impl RateArgs {
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let manager = CheckpointManager::new(&self.checkpoint);
        let vocab = std::sync::Arc::new(manager.load_vocab(VocabOptions::rater())?);

        let mut scorer = BigramScorer::new(vocab.len());
        manager.load_weights(&mut scorer)?;

        let rater = Rater::new(scorer, vocab)?;

        log::info!("rating; delimit messages with a tab followed by a newline");

        run_rating_session(&rater, io::stdin().lock(), io::stdout().lock())?;
        Ok(())
    }
}

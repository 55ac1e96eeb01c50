//! # `chloom`
//!
//! Command-line interface for the `charloom` sequence-model runtime.

use clap::{Parser, Subcommand};

mod commands;
mod logging;

use commands::{GenerateArgs, RateArgs, TrainGeneratorArgs, TrainRaterArgs};

/// Character-level message generation and rating.
#[derive(Parser, Debug)]
#[command(name = "chloom", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train the generation model from a line corpus on stdin.
    TrainGenerator(TrainGeneratorArgs),

    /// Train the rating model from a tab-delimited labeled corpus on stdin.
    TrainRater(TrainRaterArgs),

    /// Generate messages interactively against a checkpoint.
    Generate(GenerateArgs),

    /// Rate messages interactively against a checkpoint.
    Rate(RateArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::TrainGenerator(args) => args.run(),
        Commands::TrainRater(args) => args.run(),
        Commands::Generate(args) => args.run(),
        Commands::Rate(args) => args.run(),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

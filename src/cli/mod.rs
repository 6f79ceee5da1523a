// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes to a use case. No
// training or sampling logic lives here.
//
//   1. `train`    - trains, resuming from the latest checkpoint
//   2. `generate` - loads a checkpoint and prints generated text

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, GenerateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "char-rnn",
    version,
    about = "Train a character-level GRU on a line-per-example corpus, then generate text in its style."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Generate(args) => run_generate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training model '{}' from '{}'", args.model, args.data_dir);
    let summary = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training stopped at step {} ({} checkpoints saved this run).",
        summary.final_step, summary.checkpoints_saved
    );
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    use crate::application::generate_use_case::GenerateUseCase;

    let use_case = GenerateUseCase::new(&args.checkpoint_dir, &args.model)?;
    println!("Checkpoint step {}", use_case.step());
    for text in use_case.generate(&args.primes, args.seed)? {
        println!("\t{}", text);
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;

    #[test]
    fn test_train_defaults_map_to_config() {
        let cli = Cli::try_parse_from(["char-rnn", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.model, "trump_tweets");
        assert_eq!(cfg.data_dir, "data");
        assert_eq!(cfg.max_steps, None);
        assert_eq!(cfg.batch_size, 128);
    }

    #[test]
    fn test_generate_collects_primes() {
        let cli = Cli::try_parse_from([
            "char-rnn", "generate", "--model", "poems", "--prime", "The", "--prime", "A", "--seed", "3",
        ])
        .unwrap();
        let Commands::Generate(args) = cli.command else { panic!("expected generate") };
        assert_eq!(args.model, "poems");
        assert_eq!(args.primes, vec!["The", "A"]);
        assert_eq!(args.seed, Some(3));
    }
}

// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Two subcommands: `train` and `generate`.
//
// Only run-level options are flags. The hyperparameters
// (alphabet, layer widths, batch size, learning rate, window,
// temperature, ...) are fixed in TrainConfig::default().

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train (or resume training) a character model on <data-dir>/<model>.txt
    Train(TrainArgs),

    /// Generate text from the latest checkpoint of a model
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Model name: selects the corpus file and the checkpoint subdirectory
    #[arg(long, default_value = "trump_tweets")]
    pub model: String,

    /// Directory containing <model>.txt, one example per line
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Root directory for per-model checkpoints
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Stop after this many training steps (default: run until interrupted)
    #[arg(long)]
    pub max_steps: Option<u64>,

    /// Seed for shuffling and sampling, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:       a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            max_steps:      a.max_steps,
            rng_seed:       a.seed,
            ..TrainConfig::for_model(a.model)
        }
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Model name whose checkpoints to load
    #[arg(long, default_value = "trump_tweets")]
    pub model: String,

    /// Root directory for per-model checkpoints
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Text to continue; repeat for several. Defaults to the training seeds
    #[arg(long = "prime")]
    pub primes: Vec<String>,

    /// Seed for sampling, for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,
}

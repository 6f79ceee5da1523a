// ============================================================
// Layer 2: TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Validate the configuration
//   Step 2: Load the corpus lines         (Layer 4 - data)
//   Step 3: Build chunker + batch stream  (Layer 4 - data)
//   Step 4: Save config for generation    (Layer 6 - infra)
//   Step 5: Run the training loop         (Layer 5 - ml)

use anyhow::{bail, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::{chunker::WindowedChunker, loader::LineCorpusLoader, stream::BatchStreamExt};
use crate::domain::{traits::CorpusSource, vocabulary::Vocabulary};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::trainer::{run_training, TrainingSummary};

/// The alphabet the model reads and writes. Note that '8' is not
/// part of it, and the apostrophe appears twice (the repeat is
/// skipped when the Vocabulary is built).
pub const DEFAULT_VOCABULARY: &str =
    " $%'()+,-./123456790:;=?ABCDEFGHIJKLMNOPQRSTUVWXYZ'\"_abcdefghijklmnopqrstuvwxyz{|}@#➡📈";

/// Prompts sampled from at every logging interval.
pub const DEFAULT_SEEDS: [&str; 11] = ["Hillary", "I", "R", "T", "@", "N", "M", ".", "G", "A", "W"];

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Immutable once the run
// starts; serialisable so generation can rebuild the same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Name of the corpus and of the checkpoint subdirectory
    pub model:          String,
    pub data_dir:       String,
    pub checkpoint_dir: String,
    /// Ordered alphabet; index = position of first occurrence
    pub vocabulary:     String,
    /// Width of each stacked GRU layer, bottom first
    pub hidden_sizes:   Vec<usize>,
    pub batch_size:     usize,
    pub learning_rate:  f64,
    /// Training steps between report / sample / checkpoint
    pub skip_step:      u64,
    /// Characters per training chunk (the unroll length)
    pub window:         usize,
    /// Characters shared by consecutive chunks of one line
    pub overlap:        usize,
    /// Logit divisor when sampling; below 1.0 is greedier
    pub temperature:    f64,
    /// Characters generated after each seed
    pub len_generated:  usize,
    pub seeds:          Vec<String>,
    /// Fixes shuffling and sampling; None draws from entropy
    pub rng_seed:       Option<u64>,
    /// Stop after this many steps in this run; None runs forever
    pub max_steps:      Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model:          "trump_tweets".to_string(),
            data_dir:       "data".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            vocabulary:     DEFAULT_VOCABULARY.to_string(),
            hidden_sizes:   vec![128, 256],
            batch_size:     128,
            learning_rate:  3e-4,
            skip_step:      50,
            window:         50,
            overlap:        25,
            temperature:    0.2,
            len_generated:  200,
            seeds:          DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect(),
            rng_seed:       None,
            max_steps:      None,
        }
    }
}

impl TrainConfig {
    /// Default hyperparameters for the named model.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self { model: model.into(), ..Self::default() }
    }

    pub fn vocab(&self) -> Vocabulary {
        Vocabulary::new(&self.vocabulary)
    }

    /// Reject combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.vocab().is_empty() {
            bail!("vocabulary must not be empty");
        }
        if self.hidden_sizes.is_empty() || self.hidden_sizes.contains(&0) {
            bail!("hidden_sizes must be a non-empty list of positive widths");
        }
        if self.batch_size == 0 {
            bail!("batch_size must be positive");
        }
        if self.skip_step == 0 {
            bail!("skip_step must be positive");
        }
        // The loss needs a next character to predict
        if self.window < 2 {
            bail!("window must be at least 2, got {}", self.window);
        }
        if self.overlap >= self.window {
            bail!("overlap ({}) must be less than window ({})", self.overlap, self.window);
        }
        if !(self.temperature > 0.0) {
            bail!("temperature must be positive, got {}", self.temperature);
        }
        Ok(())
    }

    /// RNG for this run: seeded when `rng_seed` is set.
    pub fn rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train on `<data_dir>/<model>.txt`.
    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;
        self.execute_with(&LineCorpusLoader::for_model(&cfg.data_dir, &cfg.model))
    }

    /// Train on any corpus source.
    pub fn execute_with(&self, source: &impl CorpusSource) -> Result<TrainingSummary> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Load corpus ───────────────────────────────────────────────
        let lines = source.load_lines()?;
        if lines.is_empty() {
            tracing::warn!("Corpus for '{}' has no lines", cfg.model);
        }

        // ── Step 3: Lazy chunk → batch pipeline ───────────────────────────────
        // The chunker gets its own RNG derived from the run RNG so
        // shuffling and sampling are reproducible together.
        let mut rng   = cfg.rng();
        let chunk_rng = StdRng::seed_from_u64(rng.gen());
        let chunker   = WindowedChunker::new(&lines, &cfg.vocab(), cfg.window, cfg.overlap, chunk_rng);
        let batches   = chunker.batches(cfg.batch_size);

        // ── Step 4: Save config for generation ────────────────────────────────
        let ckpt_manager = CheckpointManager::for_model(&cfg.checkpoint_dir, &cfg.model);
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(ckpt_manager.dir())?;

        // ── Step 5: Train ─────────────────────────────────────────────────────
        run_training(cfg, batches, &ckpt_manager, &metrics, &mut rng)
    }
}

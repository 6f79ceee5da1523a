// ============================================================
// Layer 5: Training Loop
// ============================================================
// Pulls batches forever and takes one Adam step per batch.
//
//   restore latest checkpoint (or start at step 0)
//   loop:
//     batch  → one-hot → forward_loss → backward → Adam step
//     step  += 1
//     every skip_step steps:
//       print "Iter / Loss / Time", append metrics row
//       generate text from every seed and print it
//       checkpoint if the loss ratchet allows
//
// There is no epoch limit: the chunk stream reshuffles on its
// own and training runs until the process is stopped, the
// stream runs dry, or the optional max_steps budget is spent.
// A crash mid-step loses only the work since the last
// checkpoint; nothing is rolled back.

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::ElementConversion,
};
use rand::Rng;
use std::time::Instant;

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::CharBatcher;
use crate::domain::chunk::Chunk;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{MetricsLogger, StepMetrics},
};
use crate::ml::{
    default_device,
    generator::Generator,
    model::{CharRnnConfig, CharRnnModel},
    TrainBackend,
};

// ─── LossRatchet ──────────────────────────────────────────────────────────────
/// Decides whether a logging interval writes a checkpoint.
///
/// The first interval of a run always saves and becomes the
/// baseline. After that only a strictly lower loss saves, and it
/// becomes the new baseline. The baseline lives in memory, so a
/// resumed run again saves unconditionally on its first interval.
#[derive(Debug, Default)]
pub struct LossRatchet {
    best: Option<f64>,
}

impl LossRatchet {
    pub fn should_save(&mut self, loss: f64) -> bool {
        let save = match self.best {
            None       => true,
            Some(best) => loss < best,
        };
        // NaN/inf would lock the ratchet forever
        if save && loss.is_finite() {
            self.best = Some(loss);
        }
        save
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }
}

/// What one call to `run_training` did.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    /// Step restored from the checkpoint (0 when starting fresh)
    pub start_step:        u64,
    /// Step counter when the loop stopped
    pub final_step:        u64,
    pub checkpoints_saved: usize,
    pub last_loss:         Option<f64>,
}

pub fn run_training<I, R>(
    cfg:          &TrainConfig,
    batches:      I,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
    rng:          &mut R,
) -> Result<TrainingSummary>
where
    I: Iterator<Item = Vec<Chunk>>,
    R: Rng,
{
    let device = default_device();
    tracing::info!("Using device: {:?}", device);

    // ── Build model and optimiser, then resume if possible ───────────────────
    let vocab     = cfg.vocab();
    let model_cfg = CharRnnConfig::new(vocab.len(), cfg.hidden_sizes.clone());
    let model: CharRnnModel<TrainBackend> = model_cfg.init(&device);
    let optim = AdamConfig::new().init::<TrainBackend, CharRnnModel<TrainBackend>>();

    let (mut model, mut optim, restored) =
        ckpt_manager.restore::<TrainBackend, _, _>(model, optim, &device)?;
    let start_step = restored.map_or(0, |meta| meta.step);
    let mut step   = start_step;
    if step == 0 {
        tracing::info!("No checkpoint found, starting from scratch");
    } else {
        tracing::info!("Resuming from step {}", step);
    }
    tracing::info!("Model ready: GRU layers {:?}, vocab {}", cfg.hidden_sizes, vocab.len());
    tracing::debug!("Alphabet: {:?}", vocab.as_string());

    let batcher   = CharBatcher::<TrainBackend>::new(device.clone(), vocab.len());
    let generator = Generator::new(vocab, cfg.seeds.clone(), cfg.len_generated, cfg.temperature);

    let mut ratchet   = LossRatchet::default();
    let mut saved     = 0usize;
    let mut last_loss = None;
    let mut last_log  = Instant::now();

    for batch in batches {
        if batch.is_empty() {
            tracing::warn!("Batch stream ended at step {}", step);
            break;
        }

        // ── Forward + backward + Adam update ─────────────────────────────────
        let loss     = model.forward_loss(batcher.batch(&batch).inputs);
        let loss_val = loss.clone().into_scalar().elem::<f64>();

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model     = optim.step(cfg.learning_rate, model, grads);
        step     += 1;
        last_loss = Some(loss_val);

        // ── Periodic report, samples and checkpoint ──────────────────────────
        if step % cfg.skip_step == 0 {
            let elapsed = last_log.elapsed().as_secs_f64();
            println!("Iter {}. \n    Loss {}. Time {}", step, loss_val, elapsed);
            // Only positions followed by a real char are scored.
            let scored: usize = batch.iter().map(|c| c.valid_len().saturating_sub(1)).sum();
            tracing::debug!(
                "step={} loss={:.4} per_char={:.4} elapsed={:.2}s",
                step,
                loss_val,
                loss_val / scored.max(1) as f64,
                elapsed
            );
            metrics.log(&StepMetrics::new(step, loss_val, elapsed))?;

            // model.valid() drops autodiff tracking for sampling
            let sampler = model.valid();
            for text in generator.generate_all(&sampler, &device, rng)? {
                println!("\t{}", text);
            }
            last_log = Instant::now();

            if ratchet.should_save(loss_val) {
                ckpt_manager.save::<TrainBackend, _, _>(&model, &optim, step, loss_val)?;
                saved += 1;
            }
        }

        if cfg.max_steps.is_some_and(|max| step - start_step >= max) {
            tracing::info!("Reached max_steps after {} steps", step - start_step);
            break;
        }
    }

    Ok(TrainingSummary {
        start_step,
        final_step: step,
        checkpoints_saved: saved,
        last_loss,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{chunker::WindowedChunker, stream::BatchStreamExt};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_first_interval_always_saves() {
        let mut r = LossRatchet::default();
        assert!(r.should_save(100.0));
        assert_eq!(r.best(), Some(100.0));
    }

    #[test]
    fn test_only_strict_improvement_saves() {
        let mut r = LossRatchet::default();
        assert!(r.should_save(10.0));
        assert!(!r.should_save(10.0));
        assert!(!r.should_save(12.0));
        assert!(r.should_save(9.5));
        assert_eq!(r.best(), Some(9.5));
        assert!(!r.should_save(9.7));
    }

    #[test]
    fn test_non_finite_loss_never_becomes_baseline() {
        let mut r = LossRatchet::default();
        assert!(r.should_save(f64::NAN));
        assert_eq!(r.best(), None);
        assert!(r.should_save(5.0));
        assert_eq!(r.best(), Some(5.0));
    }

    fn tiny_config(dir: &std::path::Path, max_steps: u64) -> TrainConfig {
        TrainConfig {
            checkpoint_dir: dir.display().to_string(),
            vocabulary:     "abcdefgh ".to_string(),
            hidden_sizes:   vec![6, 4],
            batch_size:     2,
            learning_rate:  1e-2,
            skip_step:      2,
            window:         6,
            overlap:        3,
            len_generated:  5,
            seeds:          vec!["ab".to_string(), "h".to_string()],
            rng_seed:       Some(1),
            max_steps:      Some(max_steps),
            ..TrainConfig::for_model("tiny")
        }
    }

    fn run(cfg: &TrainConfig) -> TrainingSummary {
        let lines: Vec<String> = ["abc def", "ghha bad", "fed cab gah", "a"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut rng = StdRng::seed_from_u64(9);
        let chunks  = WindowedChunker::new(&lines, &cfg.vocab(), cfg.window, cfg.overlap, StdRng::seed_from_u64(3));

        let ckpt    = CheckpointManager::for_model(&cfg.checkpoint_dir, &cfg.model);
        let metrics = MetricsLogger::new(ckpt.dir()).unwrap();
        run_training(cfg, chunks.batches(cfg.batch_size), &ckpt, &metrics, &mut rng).unwrap()
    }

    #[test]
    fn test_training_checkpoints_and_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path(), 4);

        let first = run(&cfg);
        assert_eq!(first.start_step, 0);
        assert_eq!(first.final_step, 4);
        assert!(first.checkpoints_saved >= 1);
        assert!(first.last_loss.unwrap() > 0.0);

        let ckpt  = CheckpointManager::for_model(&cfg.checkpoint_dir, &cfg.model);
        let saved = ckpt.latest().unwrap().unwrap().step;
        assert!(saved == 2 || saved == 4);

        // Second run continues the step counter from the checkpoint
        let second = run(&cfg);
        assert_eq!(second.start_step, saved);
        assert_eq!(second.final_step, saved + 4);
        assert!(ckpt.latest().unwrap().unwrap().step > saved);

        // One metrics row per interval across both runs
        let csv = std::fs::read_to_string(ckpt.dir().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 1 + 2 + 2);
    }

    #[test]
    fn test_empty_stream_stops_training() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path(), 100);

        let ckpt    = CheckpointManager::for_model(&cfg.checkpoint_dir, &cfg.model);
        let metrics = MetricsLogger::new(ckpt.dir()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let summary = run_training(&cfg, std::iter::once(Vec::new()), &ckpt, &metrics, &mut rng).unwrap();

        assert_eq!(summary.final_step, 0);
        assert_eq!(summary.checkpoints_saved, 0);
        assert!(summary.last_loss.is_none());
    }
}

// ============================================================
// Layer 6: Checkpoint Manager
// ============================================================
// Saves and restores training snapshots with Burn's recorders.
//
// What one snapshot holds:
//   1. model.mpk   all learned parameters
//   2. optim.mpk   Adam moment estimates, so a resumed run keeps
//                  its momentum instead of starting cold
//   3. meta.json   format version, global step, batch loss
//
// File layout:
//   checkpoints/<model>/
//     train_config.json      ← hyperparameters, to rebuild the model
//     checkpoint.json        ← points at the newest snapshot
//     char-rnn-50/           ← one directory per saved step
//     char-rnn-100/
//     ...
//
// Writes are crash-safe:
//   - a snapshot is assembled in a hidden staging directory and
//     renamed into place only once every file is written
//   - checkpoint.json is replaced via temp file + rename
// so after a crash the pointer names either the previous
// snapshot or the new one, never a half-written directory.
//
// NamedMpkFileRecorder with full precision is used instead of
// CompactRecorder: half precision would change the logits
// after a save/restore round trip.

use anyhow::{bail, Context, Result};
use burn::{
    module::AutodiffModule,
    optim::Optimizer,
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;

/// Bumped whenever the snapshot layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// Most recent snapshots kept on disk; older ones are pruned.
pub const KEEP_SNAPSHOTS: usize = 5;

const POINTER_FILE:    &str = "checkpoint.json";
const CONFIG_FILE:     &str = "train_config.json";
const META_FILE:       &str = "meta.json";
const MODEL_FILE:      &str = "model";
const OPTIM_FILE:      &str = "optim";
const SNAPSHOT_PREFIX: &str = "char-rnn-";

type SnapshotRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Contents of a snapshot's meta.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub format_version: u32,
    /// Global step at the moment of saving
    pub step: u64,
    /// Batch loss that triggered the save
    pub loss: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Pointer {
    format_version: u32,
    latest:         String,
}

/// Manages the snapshots of one model in one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager.
    /// Creates the directory if it doesn't already exist; an
    /// existing directory is not an error.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// `<root>/<model>`, one directory per model name.
    pub fn for_model(root: &str, model: &str) -> Self {
        Self::new(PathBuf::from(root).join(model))
    }

    /// Read-only access to an existing model directory. Unlike
    /// `for_model`, nothing is created on disk.
    pub fn open(root: &str, model: &str) -> Result<Self> {
        let dir = PathBuf::from(root).join(model);
        if !dir.is_dir() {
            bail!("No checkpoints for model '{}' in {}", model, root);
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a complete snapshot for `step` and make it the latest.
    pub fn save<B, M, O>(&self, model: &M, optim: &O, step: u64, loss: f64) -> Result<PathBuf>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        let name    = snapshot_name(step);
        let staging = self.dir.join(format!(".{name}.tmp"));
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .with_context(|| format!("Cannot clear stale '{}'", staging.display()))?;
        }
        fs::create_dir_all(&staging)
            .with_context(|| format!("Cannot create '{}'", staging.display()))?;

        let recorder = SnapshotRecorder::new();
        <SnapshotRecorder as Recorder<B>>::record(
            &recorder,
            model.clone().into_record(),
            staging.join(MODEL_FILE),
        )
        .with_context(|| format!("Failed to save model parameters for step {step}"))?;
        <SnapshotRecorder as Recorder<B>>::record(&recorder, optim.to_record(), staging.join(OPTIM_FILE))
            .with_context(|| format!("Failed to save optimizer state for step {step}"))?;

        let meta = SnapshotMeta { format_version: FORMAT_VERSION, step, loss };
        write_atomic(&staging.join(META_FILE), serde_json::to_string_pretty(&meta)?.as_bytes())?;

        // A directory with this name only exists if an earlier run
        // crashed between the rename and the pointer update.
        let target = self.dir.join(&name);
        if target.exists() {
            fs::remove_dir_all(&target)
                .with_context(|| format!("Cannot replace '{}'", target.display()))?;
        }
        fs::rename(&staging, &target)
            .with_context(|| format!("Cannot move snapshot into '{}'", target.display()))?;

        let pointer = Pointer { format_version: FORMAT_VERSION, latest: name };
        write_atomic(&self.dir.join(POINTER_FILE), serde_json::to_string_pretty(&pointer)?.as_bytes())?;

        self.prune();
        tracing::info!("Saved checkpoint: step {} (loss {:.4})", step, loss);
        Ok(target)
    }

    /// Metadata of the snapshot checkpoint.json points at, or None
    /// if nothing was saved yet. An unreadable pointer or snapshot
    /// is an error: training from scratch over a corrupt checkpoint
    /// would silently discard it.
    pub fn latest(&self) -> Result<Option<SnapshotMeta>> {
        let pointer_path = self.dir.join(POINTER_FILE);
        if !pointer_path.exists() {
            return Ok(None);
        }

        let pointer: Pointer = read_json(&pointer_path)?;
        check_version(pointer.format_version, &pointer_path)?;

        let meta_path = self.dir.join(&pointer.latest).join(META_FILE);
        let meta: SnapshotMeta = read_json(&meta_path)?;
        check_version(meta.format_version, &meta_path)?;
        Ok(Some(meta))
    }

    /// Load the latest snapshot into `model` and `optim`.
    /// With no snapshot on disk both are handed back untouched.
    pub fn restore<B, M, O>(
        &self,
        model:  M,
        optim:  O,
        device: &B::Device,
    ) -> Result<(M, O, Option<SnapshotMeta>)>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        let Some(meta) = self.latest()? else {
            return Ok((model, optim, None));
        };
        let path     = self.dir.join(snapshot_name(meta.step));
        let recorder = SnapshotRecorder::new();

        let model_record: <M as Module<B>>::Record =
            <SnapshotRecorder as Recorder<B>>::load(&recorder, path.join(MODEL_FILE), device)
                .with_context(|| format!("Cannot load model from '{}'", path.display()))?;
        let optim_record: O::Record =
            <SnapshotRecorder as Recorder<B>>::load(&recorder, path.join(OPTIM_FILE), device)
                .with_context(|| format!("Cannot load optimizer from '{}'", path.display()))?;

        tracing::info!("Restored checkpoint from step {}", meta.step);
        Ok((model.load_record(model_record), optim.load_record(optim_record), Some(meta)))
    }

    /// Load only the parameters of the latest snapshot, for
    /// generation without training.
    pub fn load_model<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<(M, SnapshotMeta)> {
        let Some(meta) = self.latest()? else {
            bail!(
                "No checkpoint found in '{}'. Have you run 'train' first?",
                self.dir.display()
            );
        };
        let path = self.dir.join(snapshot_name(meta.step)).join(MODEL_FILE);

        let record: M::Record = <SnapshotRecorder as Recorder<B>>::load(&SnapshotRecorder::new(), path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        tracing::info!("Loaded checkpoint from step {}", meta.step);
        Ok((model.load_record(record), meta))
    }

    /// Save the training configuration to JSON.
    ///
    /// Generation needs the exact architecture (vocabulary,
    /// hidden sizes) to rebuild the model before loading weights.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        write_atomic(&path, serde_json::to_string_pretty(cfg)?.as_bytes())?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration saved by `save_config`.
    pub fn load_config(&self) -> Result<TrainConfig> {
        read_json(&self.dir.join(CONFIG_FILE))
    }

    /// Steps of every snapshot directory on disk, ascending.
    pub fn snapshot_steps(&self) -> Result<Vec<u64>> {
        let mut steps = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read '{}'", self.dir.display()))?
        {
            let name = entry?.file_name();
            if let Some(step) = name
                .to_str()
                .and_then(|n| n.strip_prefix(SNAPSHOT_PREFIX))
                .and_then(|s| s.parse::<u64>().ok())
            {
                steps.push(step);
            }
        }
        steps.sort_unstable();
        Ok(steps)
    }

    /// Delete all but the newest KEEP_SNAPSHOTS snapshots. Failing
    /// to delete an old snapshot never fails the save.
    fn prune(&self) {
        let steps = match self.snapshot_steps() {
            Ok(steps) => steps,
            Err(e) => {
                tracing::warn!("Skipping checkpoint pruning: {e}");
                return;
            }
        };
        let excess = steps.len().saturating_sub(KEEP_SNAPSHOTS);
        for step in &steps[..excess] {
            let path = self.dir.join(snapshot_name(*step));
            match fs::remove_dir_all(&path) {
                Ok(()) => tracing::debug!("Pruned old checkpoint '{}'", path.display()),
                Err(e) => tracing::warn!("Cannot prune '{}': {}", path.display(), e),
            }
        }
    }
}

fn snapshot_name(step: u64) -> String {
    format!("{SNAPSHOT_PREFIX}{step}")
}

fn check_version(found: u32, path: &Path) -> Result<()> {
    if found != FORMAT_VERSION {
        bail!(
            "'{}' has checkpoint format {}, expected {}",
            path.display(),
            found,
            FORMAT_VERSION
        );
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Cannot parse '{}'", path.display()))
}

/// Write to a sibling temp file, fsync, then rename over `path`.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("'{}' has no parent directory", path.display()))?;
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("file");
    let temp      = parent.join(format!(".{file_name}.tmp"));

    let mut file = File::create(&temp)
        .with_context(|| format!("Cannot create '{}'", temp.display()))?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp, path)
        .with_context(|| format!("Cannot rename '{}' to '{}'", temp.display(), path.display()))?;
    sync_dir(parent)?;
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::optim::{AdamConfig, GradientsParams};

    use crate::data::batcher::{CharBatch, CharBatcher};
    use crate::domain::chunk::Chunk;
    use crate::ml::model::{CharRnnConfig, CharRnnModel};
    use crate::ml::TrainBackend as B;

    fn config() -> CharRnnConfig {
        CharRnnConfig::new(4, vec![5, 3])
    }

    fn batch() -> CharBatch<B> {
        CharBatcher::<B>::new(Default::default(), 4).batch(&[
            Chunk::padded(&[0, 1, 2, 3, 0], 6),
            Chunk::padded(&[3, 2], 6),
        ])
    }

    /// One Adam step so the optimizer has non-trivial state.
    fn train_once<O: Optimizer<CharRnnModel<B>, B>>(model: CharRnnModel<B>, optim: &mut O) -> CharRnnModel<B> {
        let loss  = model.forward_loss(batch().inputs);
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        optim.step(1e-2, model, grads)
    }

    fn loss_of(model: &CharRnnModel<B>) -> f32 {
        model.forward_loss(batch().inputs).into_scalar()
    }

    #[test]
    fn test_restore_without_checkpoint_starts_fresh() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());

        let model = config().init::<B>(&Default::default());
        let optim = AdamConfig::new().init::<B, CharRnnModel<B>>();
        let before = loss_of(&model);

        let (model, _, meta) = ckpt.restore::<B, _, _>(model, optim, &Default::default()).unwrap();
        assert!(meta.is_none());
        assert_eq!(loss_of(&model), before);
    }

    #[test]
    fn test_restore_reproduces_loss_and_optimizer_state() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());

        let mut optim = AdamConfig::new().init::<B, CharRnnModel<B>>();
        let model     = train_once(config().init::<B>(&Default::default()), &mut optim);
        ckpt.save::<B, _, _>(&model, &optim, 7, 1.25).unwrap();

        let fresh       = config().init::<B>(&Default::default());
        let fresh_optim = AdamConfig::new().init::<B, CharRnnModel<B>>();
        let (restored, mut restored_optim, meta) =
            ckpt.restore::<B, _, _>(fresh, fresh_optim, &Default::default()).unwrap();

        let meta = meta.unwrap();
        assert_eq!(meta.step, 7);
        assert_eq!(meta.loss, 1.25);
        assert_eq!(loss_of(&restored), loss_of(&model));

        // Same parameters + same Adam moments → identical next step
        let continued = train_once(model, &mut optim);
        let resumed   = train_once(restored, &mut restored_optim);
        assert_eq!(loss_of(&resumed), loss_of(&continued));
    }

    #[test]
    fn test_load_model_for_inference() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());

        let optim = AdamConfig::new().init::<B, CharRnnModel<B>>();
        let model = config().init::<B>(&Default::default());
        ckpt.save::<B, _, _>(&model, &optim, 3, 2.0).unwrap();

        let (loaded, meta) = ckpt
            .load_model::<B, _>(config().init::<B>(&Default::default()), &Default::default())
            .unwrap();
        assert_eq!(meta.step, 3);
        assert_eq!(loss_of(&loaded), loss_of(&model));
    }

    #[test]
    fn test_load_model_without_checkpoint_fails() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());
        let err  = ckpt
            .load_model::<B, _>(config().init::<B>(&Default::default()), &Default::default())
            .unwrap_err();
        assert!(err.to_string().contains("No checkpoint found"));
    }

    #[test]
    fn test_latest_follows_pointer_and_prunes_old_snapshots() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());

        let optim = AdamConfig::new().init::<B, CharRnnModel<B>>();
        let model = config().init::<B>(&Default::default());
        for step in 1..=7u64 {
            ckpt.save::<B, _, _>(&model, &optim, step * 10, 1.0).unwrap();
        }

        assert_eq!(ckpt.latest().unwrap().unwrap().step, 70);
        assert_eq!(ckpt.snapshot_steps().unwrap(), vec![30, 40, 50, 60, 70]);
        // No staging leftovers
        assert!(!dir.path().join(".char-rnn-70.tmp").exists());
    }

    #[test]
    fn test_open_does_not_create_directories() {
        let dir  = tempfile::tempdir().unwrap();
        let root = dir.path().display().to_string();

        assert!(CheckpointManager::open(&root, "typo").is_err());
        assert!(!dir.path().join("typo").exists());

        CheckpointManager::for_model(&root, "real");
        let opened = CheckpointManager::open(&root, "real").unwrap();
        assert_eq!(opened.dir(), dir.path().join("real").as_path());
    }

    #[test]
    fn test_corrupt_pointer_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());
        fs::write(dir.path().join(POINTER_FILE), "not json").unwrap();
        assert!(ckpt.latest().is_err());
    }

    #[test]
    fn test_unknown_format_version_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());
        fs::write(
            dir.path().join(POINTER_FILE),
            r#"{"format_version": 99, "latest": "char-rnn-1"}"#,
        )
        .unwrap();
        let err = ckpt.latest().unwrap_err();
        assert!(err.to_string().contains("expected 1"));
    }

    #[test]
    fn test_config_survives_save_and_load() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());
        let cfg  = TrainConfig::for_model("tweets");
        ckpt.save_config(&cfg).unwrap();
        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.hidden_sizes, cfg.hidden_sizes);
        assert_eq!(loaded.vocabulary, cfg.vocabulary);
    }
}

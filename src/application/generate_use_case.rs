// ============================================================
// Layer 2: Generate Use Case
// ============================================================
// Loads the latest checkpoint of a model and writes text from
// seed strings, without training.
//
//   1. Read train_config.json to rebuild the architecture
//   2. Load the newest snapshot's parameters
//   3. Run the Generator over the requested seeds

use anyhow::Result;

use crate::application::train_use_case::TrainConfig;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    default_device,
    generator::Generator,
    model::{CharRnnConfig, CharRnnModel},
    InnerBackend,
};

pub struct GenerateUseCase {
    config: TrainConfig,
    model:  CharRnnModel<InnerBackend>,
    step:   u64,
}

impl GenerateUseCase {
    pub fn new(checkpoint_dir: &str, model_name: &str) -> Result<Self> {
        let ckpt   = CheckpointManager::open(checkpoint_dir, model_name)?;
        let config = ckpt.load_config()?;
        config.validate()?;

        let device = default_device();
        let model  = CharRnnConfig::new(config.vocab().len(), config.hidden_sizes.clone())
            .init::<InnerBackend>(&device);
        let (model, meta) = ckpt.load_model::<InnerBackend, _>(model, &device)?;

        Ok(Self { config, model, step: meta.step })
    }

    /// Global step of the loaded checkpoint.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// One text per seed; the configured seeds when `seeds` is empty.
    pub fn generate(&self, seeds: &[String], rng_seed: Option<u64>) -> Result<Vec<String>> {
        let cfg   = &self.config;
        let seeds = if seeds.is_empty() { cfg.seeds.clone() } else { seeds.to_vec() };

        let generator = Generator::new(cfg.vocab(), seeds, cfg.len_generated, cfg.temperature);
        let mut rng   = TrainConfig { rng_seed, ..cfg.clone() }.rng();
        generator.generate_all(&self.model, &default_device(), &mut rng)
    }
}

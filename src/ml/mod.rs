// ============================================================
// Layer 5: ML / Model Layer (Burn)
// ============================================================
// All Burn-specific model code lives here. Other layers only
// see the model through these modules.
//
//   model.rs     - stacked GRU + dense head, the loss, and
//                  temperature sampling
//
//   trainer.rs   - the endless training loop: forward, loss,
//                  backward, Adam step, periodic generation and
//                  loss-gated checkpoints
//
//   generator.rs - stateful one-character-at-a-time generation
//                  from seed strings
//
// Backends:
//   TrainBackend = Autodiff<InnerBackend> for gradients
//   InnerBackend = NdArray by default, Wgpu with `--features wgpu`
//   model.valid() turns a TrainBackend model into an
//   InnerBackend one for generation, with no autodiff overhead.

/// Stacked GRU character model
pub mod model;

/// Training loop with resumable checkpoints
pub mod trainer;

/// Autoregressive text generation
pub mod generator;

#[cfg(feature = "wgpu")]
pub type InnerBackend = burn::backend::Wgpu;

#[cfg(not(feature = "wgpu"))]
pub type InnerBackend = burn::backend::NdArray;

pub type TrainBackend = burn::backend::Autodiff<InnerBackend>;

/// The default device of the configured backend.
pub fn default_device() -> <InnerBackend as burn::tensor::backend::Backend>::Device {
    Default::default()
}

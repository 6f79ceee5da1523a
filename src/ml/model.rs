// ============================================================
// Layer 5: Character RNN (Burn)
// ============================================================
// A stack of GRU layers reading one-hot characters, with a
// dense head that turns the top layer's output into one logit
// per vocabulary character at every time step.
//
//   one-hot [batch, steps, V]
//       → GRU(V → h1) → GRU(h1 → h2) → ... → Linear(hN → V)
//       → logits [batch, steps, V]
//
// The final hidden vector of every layer is handed back as a
// RecurrentState so generation can continue one character at
// a time without re-reading the whole text.

use burn::{
    nn::{
        gru::{Gru, GruConfig},
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{log_softmax, softmax},
};
use anyhow::{anyhow, Result};
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct CharRnnConfig {
    /// One-hot input width and logit count
    pub vocab_size:   usize,
    /// Width of each stacked GRU layer, bottom first
    pub hidden_sizes: Vec<usize>,
}

impl CharRnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CharRnnModel<B> {
        let mut d_input = self.vocab_size;
        let mut layers  = Vec::with_capacity(self.hidden_sizes.len());
        for &d_hidden in &self.hidden_sizes {
            layers.push(GruConfig::new(d_input, d_hidden, true).init(device));
            d_input = d_hidden;
        }
        let output = LinearConfig::new(d_input, self.vocab_size).init(device);
        CharRnnModel { layers, output }
    }
}

// ─── RecurrentState ───────────────────────────────────────────────────────────
/// Per-layer hidden vectors, each of shape [batch, width].
#[derive(Debug, Clone)]
pub struct RecurrentState<B: Backend> {
    layers: Vec<Tensor<B, 2>>,
}

impl<B: Backend> RecurrentState<B> {
    pub fn layers(&self) -> &[Tensor<B, 2>] {
        &self.layers
    }
}

// ─── SequenceTransducer ───────────────────────────────────────────────────────
/// Anything that reads a chunk of inputs from a prior state and
/// returns per-step outputs plus the state after the last step.
/// `None` as the prior state means "start from zeros".
pub trait SequenceTransducer<B: Backend> {
    fn step(
        &self,
        inputs: Tensor<B, 3>,
        state:  Option<RecurrentState<B>>,
    ) -> (Tensor<B, 3>, RecurrentState<B>);
}

#[derive(Module, Debug)]
pub struct CharRnnModel<B: Backend> {
    pub layers: Vec<Gru<B>>,
    pub output: Linear<B>,
}

impl<B: Backend> CharRnnModel<B> {
    /// inputs: [batch, steps, V] → logits [batch, steps, V], final state
    pub fn forward(
        &self,
        inputs: Tensor<B, 3>,
        state:  Option<RecurrentState<B>>,
    ) -> (Tensor<B, 3>, RecurrentState<B>) {
        let [batch_size, steps, _] = inputs.dims();

        let mut x     = inputs;
        let mut final_states = Vec::with_capacity(self.layers.len());
        for (i, gru) in self.layers.iter().enumerate() {
            let initial = state.as_ref().and_then(|s| s.layers.get(i).cloned());
            x = gru.forward(x, initial); // [batch, steps, width]

            let [_, _, width] = x.dims();
            let last = x
                .clone()
                .slice([0..batch_size, steps - 1..steps, 0..width])
                .reshape([batch_size, width]);
            final_states.push(last);
        }

        let logits = self.output.forward(x);
        (logits, RecurrentState { layers: final_states })
    }

    /// Summed next-character cross-entropy over the batch.
    ///
    /// The prediction at step t is scored against the one-hot
    /// input at step t+1. Padding steps are all-zero vectors, so
    /// they contribute nothing and each chunk is scored over its
    /// true length only.
    pub fn forward_loss(&self, inputs: Tensor<B, 3>) -> Tensor<B, 1> {
        let [batch_size, steps, vocab] = inputs.dims();
        if steps < 2 {
            return Tensor::zeros([1], &inputs.device());
        }

        let (logits, _) = self.forward(inputs.clone(), None);
        let predicted   = logits.slice([0..batch_size, 0..steps - 1, 0..vocab]);
        let targets     = inputs.slice([0..batch_size, 1..steps, 0..vocab]);

        (targets * log_softmax(predicted, 2)).sum().neg()
    }
}

impl<B: Backend> SequenceTransducer<B> for CharRnnModel<B> {
    fn step(
        &self,
        inputs: Tensor<B, 3>,
        state:  Option<RecurrentState<B>>,
    ) -> (Tensor<B, 3>, RecurrentState<B>) {
        self.forward(inputs, state)
    }
}

/// Draw one index per batch row from the last step's logits.
///
/// Logits are divided by `temperature` before the softmax:
/// below 1.0 sharpens the distribution, above 1.0 flattens it.
pub fn sample_last<B: Backend, R: Rng>(
    logits:      Tensor<B, 3>,
    temperature: f64,
    rng:         &mut R,
) -> Result<Vec<usize>> {
    let [batch_size, steps, vocab] = logits.dims();
    if steps == 0 {
        anyhow::bail!("cannot sample from an empty sequence");
    }

    let last  = logits
        .slice([0..batch_size, steps - 1..steps, 0..vocab])
        .reshape([batch_size, vocab]);
    let probs = softmax(last.div_scalar(temperature), 1)
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read probabilities: {e:?}"))?;

    probs
        .chunks(vocab)
        .map(|row| {
            let dist = WeightedIndex::new(row)
                .map_err(|e| anyhow!("Invalid sampling distribution: {e}"))?;
            Ok(dist.sample(rng))
        })
        .collect()
}

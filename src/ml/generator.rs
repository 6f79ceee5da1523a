// ============================================================
// Layer 5: Generator
// ============================================================
// Writes new text one character at a time.
//
// For each seed string:
//   1. state = None (the model starts from its zero state)
//   2. feed ONLY the most recent character, batch size 1
//   3. sample the next character from the final-step logits
//   4. append it, keep the returned state, repeat
//
// Because the state is carried forward, the model never has to
// re-read the text it already produced. Seeds never share state.

use anyhow::{bail, Result};
use burn::prelude::*;
use rand::Rng;

use crate::data::batcher::CharBatcher;
use crate::domain::vocabulary::Vocabulary;
use crate::ml::model::{sample_last, SequenceTransducer};

pub struct Generator {
    vocab:         Vocabulary,
    seeds:         Vec<String>,
    len_generated: usize,
    temperature:   f64,
}

impl Generator {
    pub fn new(vocab: Vocabulary, seeds: Vec<String>, len_generated: usize, temperature: f64) -> Self {
        Self { vocab, seeds, len_generated, temperature }
    }

    /// Extend `seed` by exactly `len_generated` sampled characters.
    pub fn generate<B, M, R>(
        &self,
        model:  &M,
        seed:   &str,
        device: &B::Device,
        rng:    &mut R,
    ) -> Result<String>
    where
        B: Backend,
        M: SequenceTransducer<B>,
        R: Rng,
    {
        let Some(last) = seed.chars().last() else {
            bail!("Seed text must not be empty");
        };
        let Some(mut index) = self.vocab.index_of(last) else {
            bail!("Seed '{seed}' ends with '{last}', which is not in the vocabulary");
        };

        let batcher   = CharBatcher::<B>::new(device.clone(), self.vocab.len());
        let mut text  = seed.to_string();
        let mut state = None;

        for _ in 0..self.len_generated {
            let input = batcher.one_hot(&[&[index as i32]]);
            let (logits, next_state) = model.step(input, state);

            index = sample_last(logits, self.temperature, rng)?[0];
            text.push_str(&self.vocab.decode(&[index as i32]));
            state = Some(next_state);
        }

        tracing::debug!("Generated {} chars from seed '{}'", self.len_generated, seed);
        Ok(text)
    }

    /// Run every configured seed independently, in order.
    pub fn generate_all<B, M, R>(&self, model: &M, device: &B::Device, rng: &mut R) -> Result<Vec<String>>
    where
        B: Backend,
        M: SequenceTransducer<B>,
        R: Rng,
    {
        self.seeds
            .iter()
            .map(|seed| self.generate(model, seed, device, rng))
            .collect()
    }
}

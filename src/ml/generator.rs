// ============================================================
// Layer 5 — Lick Generator
// ============================================================
// Autoregressive generation of new licks.
//
// A session keeps a rolling context of the last `length` coded
// (pitch, duration) pairs, seeded with sentinels, and an output list
// seeded with `length` sentinel events. Every step:
//
//   context ──▶ predictor ──▶ (pitch probs, duration probs)
//                                 │ choose() with its own randomness
//                                 ▼
//                         (pitch code, duration code)
//                                 │ decode + append to output
//                                 ▼
//                 push codes, evict oldest beyond `length`
//
// The session ends after `additional_notes` steps, or as soon as a
// START pitch is sampled.
//
// Decoding with randomness r:
//   r = 0   → argmax
//   r > 0   → p' ∝ exp(ln p / r), sample from p'
//
// Reference: Rust Book §10 (Traits), Burn Book §4 (Inference)

use std::collections::VecDeque;

use anyhow::{Result, anyhow, bail};
use burn::prelude::*;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use crate::data::vocab::Vocabulary;
use crate::domain::symbol::Event;
use crate::ml::model::LickModel;

/// Anything that maps a coded context to the two next-symbol distributions.
pub trait LickPredictor {
    fn predict(&self, pitch_ctx: &[usize], length_ctx: &[usize]) -> Result<(Vec<f32>, Vec<f32>)>;
}

/// Runs a trained model on a single context.
pub struct ModelPredictor<B: Backend> {
    model:  LickModel<B>,
    device: B::Device,
}

impl<B: Backend> ModelPredictor<B> {
    pub fn new(model: LickModel<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    fn codes(&self, ctx: &[usize]) -> Tensor<B, 2, Int> {
        let values: Vec<i64> = ctx.iter().map(|&c| c as i64).collect();
        Tensor::from_data(TensorData::new(values, [1, ctx.len()]), &self.device)
    }
}

impl<B: Backend> LickPredictor for ModelPredictor<B> {
    fn predict(&self, pitch_ctx: &[usize], length_ctx: &[usize]) -> Result<(Vec<f32>, Vec<f32>)> {
        let out = self.model.forward(self.codes(pitch_ctx), self.codes(length_ctx));
        Ok((to_probs(out.pitch)?, to_probs(out.length)?))
    }
}

fn to_probs<B: Backend>(t: Tensor<B, 2>) -> Result<Vec<f32>> {
    t.into_data()
        .convert::<f32>()
        .into_vec::<f32>()
        .map_err(|err| anyhow!("{err:?}"))
}

/// Pick one index from `probs` using randomness `r`.
pub fn choose<R: Rng + ?Sized>(probs: &[f32], r: f64, rng: &mut R) -> Result<usize> {
    if probs.is_empty() {
        bail!("cannot choose from an empty distribution");
    }
    if !r.is_finite() || r < 0.0 {
        bail!("randomness must be a finite value >= 0, got {r}");
    }
    if r == 0.0 {
        return Ok(argmax(probs));
    }

    // log p / r, normalised in f64 after subtracting the max
    let scaled: Vec<f64> = probs.iter().map(|&p| (p as f64).ln() / r).collect();
    let max = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Ok(argmax(probs));
    }
    let weights: Vec<f64> = scaled.iter().map(|&s| (s - max).exp()).collect();

    match WeightedIndex::new(&weights) {
        Ok(dist) => Ok(dist.sample(rng)),
        Err(_)   => Ok(argmax(probs)),
    }
}

fn argmax(probs: &[f32]) -> usize {
    // first maximum wins on ties
    let mut best = 0;
    for (i, &p) in probs.iter().enumerate() {
        if p > probs[best] {
            best = i;
        }
    }
    best
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub length:            usize,
    pub additional_notes:  usize,
    pub pitch_randomness:  f64,
    pub length_randomness: f64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            length:            17,
            additional_notes:  17,
            pitch_randomness:  0.55,
            length_randomness: 0.1,
        }
    }
}

/// State of one generation session.
struct Session {
    pitch_ctx:  VecDeque<usize>,
    length_ctx: VecDeque<usize>,
    output:     Vec<Event>,
    steps:      usize,
    finished:   bool,
}

impl Session {
    fn new(length: usize, sentinel: (usize, usize)) -> Self {
        Self {
            pitch_ctx:  VecDeque::from(vec![sentinel.0; length]),
            length_ctx: VecDeque::from(vec![sentinel.1; length]),
            output:     vec![Event::SENTINEL; length],
            steps:      0,
            finished:   false,
        }
    }

    fn is_done(&self, budget: usize) -> bool {
        self.finished || self.steps >= budget
    }

    fn push(&mut self, codes: (usize, usize), event: Event, length: usize) {
        self.pitch_ctx.push_back(codes.0);
        self.length_ctx.push_back(codes.1);
        if self.pitch_ctx.len() > length {
            self.pitch_ctx.pop_front();
            self.length_ctx.pop_front();
        }
        self.finished = event.pitch.is_start();
        self.output.push(event);
        self.steps += 1;
    }
}

pub struct LickGenerator<'a, P: LickPredictor> {
    predictor: &'a P,
    vocab:     &'a Vocabulary,
    settings:  GenerationSettings,
}

impl<'a, P: LickPredictor> LickGenerator<'a, P> {
    pub fn new(predictor: &'a P, vocab: &'a Vocabulary, settings: GenerationSettings) -> Result<Self> {
        if settings.length == 0 {
            bail!("generation context length must be at least 1");
        }
        for r in [settings.pitch_randomness, settings.length_randomness] {
            if !r.is_finite() || r < 0.0 {
                bail!("randomness must be a finite value >= 0, got {r}");
            }
        }
        Ok(Self { predictor, vocab, settings })
    }

    /// One lick, including its leading sentinel run.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Event>> {
        let length = self.settings.length;
        let mut session = Session::new(length, self.vocab.sentinel_codes()?);

        while !session.is_done(self.settings.additional_notes) {
            let pitch_ctx:  Vec<usize> = session.pitch_ctx.iter().copied().collect();
            let length_ctx: Vec<usize> = session.length_ctx.iter().copied().collect();
            let (pitch_probs, length_probs) = self.predictor.predict(&pitch_ctx, &length_ctx)?;

            let pitch_code  = choose(&pitch_probs, self.settings.pitch_randomness, rng)?;
            let length_code = choose(&length_probs, self.settings.length_randomness, rng)?;
            let event = self.vocab.decode(pitch_code, length_code)?;

            tracing::trace!("step {}: {}", session.steps + 1, event);
            session.push((pitch_code, length_code), event, length);
        }

        Ok(session.output)
    }

    /// `n` independent licks; each session starts from a fresh state.
    pub fn generate_n<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<Vec<Event>>> {
        (0..n).map(|_| self.generate(rng)).collect()
    }
}

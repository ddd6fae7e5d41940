// ============================================================
// Layer 4 — Lick Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<LickSample>
// into model-ready tensors.
//
// How batching works here:
//   Input:  N LickSamples, each with contexts of length L
//   Output: LickBatch with
//             contexts: Int   [N, L]
//             targets:  Float [N, vocab]
//
//   Contexts are flattened row by row and reshaped:
//   [s1_t1, ..., s1_tL, s2_t1, ..., sN_tL] → [N, L]
//
// Every sample has the same window length, so no padding is needed.
//
// Reference: Burn Book §4 (Batcher)

use std::marker::PhantomData;

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::LickSample;

// ─── LickBatch ────────────────────────────────────────────────────────────────
/// A batch of windowed examples. Batch size is the first dimension.
#[derive(Debug, Clone)]
pub struct LickBatch<B: Backend> {
    /// Pitch codes — shape: [batch_size, window]
    pub pitch_context: Tensor<B, 2, Int>,

    /// Duration codes — shape: [batch_size, window]
    pub length_context: Tensor<B, 2, Int>,

    /// One-hot next pitch — shape: [batch_size, pitch_vocab]
    pub pitch_target: Tensor<B, 2>,

    /// One-hot next duration — shape: [batch_size, length_vocab]
    pub length_target: Tensor<B, 2>,
}

// ─── LickBatcher ──────────────────────────────────────────────────────────────
/// Stateless; the backend parameter pins which tensors it produces.
#[derive(Clone, Debug)]
pub struct LickBatcher<B: Backend> {
    _backend: PhantomData<B>,
}

impl<B: Backend> LickBatcher<B> {
    pub fn new() -> Self {
        Self { _backend: PhantomData }
    }
}

impl<B: Backend> Default for LickBatcher<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Batcher<B, LickSample, LickBatch<B>> for LickBatcher<B> {
    fn batch(&self, items: Vec<LickSample>, device: &B::Device) -> LickBatch<B> {
        let batch_size   = items.len();
        let window       = items[0].window();
        let pitch_vocab  = items[0].pitch_target.len();
        let length_vocab = items[0].length_target.len();

        // ── Flatten contexts ──────────────────────────────────────────────────
        let pitch_flat: Vec<i64> = items
            .iter()
            .flat_map(|s| s.pitch_context.iter().map(|&x| x as i64))
            .collect();

        let length_flat: Vec<i64> = items
            .iter()
            .flat_map(|s| s.length_context.iter().map(|&x| x as i64))
            .collect();

        // ── Flatten one-hot targets ───────────────────────────────────────────
        let pitch_hot: Vec<f32> = items
            .iter()
            .flat_map(|s| s.pitch_target.iter().copied())
            .collect();

        let length_hot: Vec<f32> = items
            .iter()
            .flat_map(|s| s.length_target.iter().copied())
            .collect();

        // ── Create tensors ────────────────────────────────────────────────────
        let pitch_context = Tensor::<B, 2, Int>::from_data(
            TensorData::new(pitch_flat, [batch_size, window]), device,
        );

        let length_context = Tensor::<B, 2, Int>::from_data(
            TensorData::new(length_flat, [batch_size, window]), device,
        );

        let pitch_target = Tensor::<B, 2>::from_data(
            TensorData::new(pitch_hot, [batch_size, pitch_vocab]), device,
        );

        let length_target = Tensor::<B, 2>::from_data(
            TensorData::new(length_hot, [batch_size, length_vocab]), device,
        );

        LickBatch {
            pitch_context,
            length_context,
            pitch_target,
            length_target,
        }
    }
}

// ============================================================
// Layer 2 — Generate Use Case
// ============================================================
// Loads what a training run left behind and writes new licks:
//
//   corpus.json        → vocabulary (same codes as training)
//   train_config.json  → model architecture + window length
//   weights.mpk.gz     → trained parameters, or the snapshot
//                        named by `weights`
//
// then runs `n` independent generation sessions and hands each
// result to the MIDI writer.

use std::path::PathBuf;

use anyhow::Result;
use burn::prelude::Backend;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::data::vocab::Vocabulary;
use crate::domain::score::Scale;
use crate::domain::traits::LickSink;
use crate::infra::{
    checkpoint::CheckpointStore,
    corpus_store::CorpusStore,
    midi_writer::MidiLickWriter,
};
use crate::ml::InferBackend;
use crate::ml::generator::{GenerationSettings, LickGenerator, ModelPredictor};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    pub scale:             Scale,
    pub store_dir:         String,
    pub checkpoint_dir:    String,
    /// Snapshot to load instead of the best weights
    pub weights:           Option<String>,
    pub out_dir:           String,
    pub n:                 usize,
    /// Context length; the training window length when unset
    pub length:            Option<usize>,
    pub additional_notes:  usize,
    pub pitch_randomness:  f64,
    pub length_randomness: f64,
    /// Fixed seed for reproducible sampling
    pub seed:              Option<u64>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        let settings = GenerationSettings::default();
        Self {
            scale:             Scale::Both,
            store_dir:         "stored".to_string(),
            checkpoint_dir:    "weights".to_string(),
            weights:           None,
            out_dir:           "generated_midi".to_string(),
            n:                 10,
            length:            None,
            additional_notes:  settings.additional_notes,
            pitch_randomness:  settings.pitch_randomness,
            length_randomness: settings.length_randomness,
            seed:              None,
        }
    }
}

pub struct GenerateUseCase {
    config: GenerateConfig,
}

impl GenerateUseCase {
    pub fn new(config: GenerateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<PathBuf>> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        self.run::<InferBackend>(device)
    }

    pub fn run<B: Backend>(&self, device: B::Device) -> Result<Vec<PathBuf>> {
        let cfg = &self.config;

        // ── Rebuild the training-time vocabulary ──────────────────────────────
        let corpus = CorpusStore::new(&cfg.store_dir).load_corpus(cfg.scale)?;
        let vocab  = Vocabulary::from_events(&corpus.events);

        // ── Rebuild and load the model ────────────────────────────────────────
        let checkpoints = CheckpointStore::new(&cfg.checkpoint_dir).for_scale(cfg.scale)?;
        let train_cfg   = checkpoints.load_config()?;
        let model = train_cfg.model_config(&vocab).init::<B>(&device);
        let model = match &cfg.weights {
            Some(name) => checkpoints.load_snapshot(model, name, &device)?,
            None       => checkpoints.load_model(model, &device)?,
        };
        tracing::info!("Model for '{}' loaded", cfg.scale);

        let settings = GenerationSettings {
            length:            cfg.length.unwrap_or(train_cfg.length),
            additional_notes:  cfg.additional_notes,
            pitch_randomness:  cfg.pitch_randomness,
            length_randomness: cfg.length_randomness,
        };
        let predictor = ModelPredictor::new(model, device);
        let generator = LickGenerator::new(&predictor, &vocab, settings)?;

        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };

        // ── Generate + render ─────────────────────────────────────────────────
        let writer = MidiLickWriter::new(&cfg.out_dir);
        let mut written = Vec::with_capacity(cfg.n);
        for (idx, events) in generator.generate_n(cfg.n, &mut rng)?.iter().enumerate() {
            let path = writer.write_lick(events, cfg.scale, idx)?;
            tracing::info!("Lick {} → '{}'", idx + 1, path.display());
            written.push(path);
        }

        Ok(written)
    }
}

// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 0: Validate the config
//   Step 1: Load .mid scores of the scale   (Layer 4 - data)
//   Step 2: Flatten into one corpus         (Layer 4 - data)
//   Step 3: Build the vocabulary            (Layer 4 - data)
//   Step 4: Window into training samples    (Layer 4 - data)
//   Step 5: Store corpus + windows          (Layer 6 - infra)
//   Step 6: Split train/validation          (Layer 4 - data)
//   Step 7: Save config                     (Layer 6 - infra)
//   Step 8: Run training loop               (Layer 5 - ml)
//
// With `from_store`, steps 1-5 are replaced by reloading the
// corpus and windows an earlier run stored.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{Result, bail};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::data::{
    corpus::Corpus,
    dataset::{LickDataset, LickSample},
    loader::MidiScoreLoader,
    splitter::split_validation,
    vocab::Vocabulary,
    windowing::WindowEncoder,
};
use crate::domain::score::Scale;
use crate::domain::traits::ScoreSource;
use crate::infra::{
    checkpoint::CheckpointStore,
    corpus_store::CorpusStore,
    metrics::MetricsLogger,
};
use crate::ml::model::LickModelConfig;
use crate::ml::trainer::{TrainingOptions, TrainingReport, train_loop};
use crate::ml::TrainBackend;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved next to the weights so generation can rebuild the same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub scale:             Scale,
    pub data_dir:          String,
    pub store_dir:         String,
    pub checkpoint_dir:    String,
    /// Window length L (also the sentinel run length)
    pub length:            usize,
    pub epochs:            usize,
    pub batch_size:        usize,
    pub lr:                f64,
    pub patience:          usize,
    pub embed_dim:         usize,
    pub rnn_units:         usize,
    pub dropout:           f64,
    pub validation_split:  f64,
    pub save_improvements: bool,
    pub seed:              u64,
    /// Reuse the stored corpus and windows instead of reading MIDI
    #[serde(default)]
    pub from_store:        bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            scale:             Scale::Both,
            data_dir:          "data".to_string(),
            store_dir:         "stored".to_string(),
            checkpoint_dir:    "weights".to_string(),
            length:            17,
            epochs:            100,
            batch_size:        32,
            lr:                1e-3,
            patience:          5,
            embed_dim:         100,
            rnn_units:         256,
            dropout:           0.3,
            validation_split:  0.3,
            save_improvements: true,
            seed:              42,
            from_store:        false,
        }
    }
}

impl TrainConfig {
    /// Reject settings the loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.length == 0 {
            bail!("window length must be at least 1");
        }
        if self.epochs == 0 {
            bail!("epochs must be at least 1");
        }
        if self.batch_size == 0 {
            bail!("batch size must be at least 1");
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            bail!("validation split must be in [0, 1), got {}", self.validation_split);
        }
        Ok(())
    }

    /// Architecture for the given vocabulary sizes.
    pub fn model_config(&self, vocab: &Vocabulary) -> LickModelConfig {
        LickModelConfig::new(vocab.pitches.len(), vocab.lengths.len())
            .with_embed_dim(self.embed_dim)
            .with_rnn_units(self.rnn_units)
            .with_dropout(self.dropout)
    }

    fn training_options(&self) -> TrainingOptions {
        TrainingOptions {
            epochs:            self.epochs,
            batch_size:        self.batch_size,
            lr:                self.lr,
            patience:          self.patience,
            save_improvements: self.save_improvements,
            seed:              self.seed,
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

    /// Execute the full training pipeline on the GPU backend.
    pub fn execute(&self) -> Result<TrainingReport> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        self.run::<TrainBackend>(&device)
    }

    pub fn run<B: AutodiffBackend>(&self, device: &B::Device) -> Result<TrainingReport> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Steps 1-5: corpus, vocabulary and windows ─────────────────────────
        let (vocab, samples) = if cfg.from_store {
            self.reload_stored()?
        } else {
            self.prepare_from_midi()?
        };

        // ── Step 6: Hold out the tail for validation ──────────────────────────
        let (train_samples, val_samples) = split_validation(samples, cfg.validation_split);
        if train_samples.is_empty() {
            bail!("Validation split {} leaves no training samples", cfg.validation_split);
        }
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );

        // ── Step 7: Save config, start a fresh log ────────────────────────────
        let checkpoints = CheckpointStore::new(&cfg.checkpoint_dir).for_scale(cfg.scale)?;
        checkpoints.save_config(cfg)?;
        checkpoints.clear_snapshots()?;
        let metrics = MetricsLogger::new(checkpoints.dir())?;

        // ── Step 8: Train (Layer 5) ───────────────────────────────────────────
        let model = cfg.model_config(&vocab).init::<B>(device);
        let (_, report) = train_loop(
            model,
            LickDataset::new(train_samples),
            LickDataset::new(val_samples),
            &cfg.training_options(),
            &checkpoints,
            &metrics,
            device,
        )?;

        tracing::info!("Epoch metrics written to '{}'", metrics.csv_path().display());
        Ok(report)
    }

    /// Steps 1-5 from the MIDI folders.
    fn prepare_from_midi(&self) -> Result<(Vocabulary, Vec<LickSample>)> {
        let cfg = &self.config;

        // ── Step 1: Load scores ───────────────────────────────────────────────
        tracing::info!("Loading '{}' scores from '{}'", cfg.scale, cfg.data_dir);
        let scores = MidiScoreLoader::new(&cfg.data_dir).load_scores(cfg.scale)?;

        // ── Step 2: Flatten with sentinel runs ────────────────────────────────
        let corpus = Corpus::from_scores(&scores, cfg.length);

        // ── Step 3: Vocabulary ────────────────────────────────────────────────
        let vocab = Vocabulary::from_events(&corpus.events);
        tracing::info!(
            "Vocabulary: {} pitches, {} durations",
            vocab.pitches.len(),
            vocab.lengths.len()
        );

        // ── Step 4: Windowed samples ──────────────────────────────────────────
        let samples = WindowEncoder::new(cfg.length).encode(&corpus.events, &vocab)?;
        if samples.is_empty() {
            bail!(
                "No training windows for scale '{}': found {} scores in '{}'",
                cfg.scale,
                scores.len(),
                cfg.data_dir
            );
        }
        tracing::info!("Built {} windowed samples", samples.len());

        // ── Step 5: Persist the intermediate data ─────────────────────────────
        let store = CorpusStore::new(&cfg.store_dir);
        store.save_corpus(cfg.scale, &corpus)?;
        store.save_windows(cfg.scale, &samples)?;

        Ok((vocab, samples))
    }

    /// Steps 1-5 from the corpus and windows an earlier run stored.
    fn reload_stored(&self) -> Result<(Vocabulary, Vec<LickSample>)> {
        let cfg   = &self.config;
        let store = CorpusStore::new(&cfg.store_dir);

        let corpus  = store.load_corpus(cfg.scale)?;
        let vocab   = Vocabulary::from_events(&corpus.events);
        let samples = store.load_windows(cfg.scale)?;
        if samples.is_empty() {
            bail!("No training windows stored for scale '{}' in '{}'", cfg.scale, cfg.store_dir);
        }

        let consistent = samples.iter().all(|s| {
            s.window() == cfg.length
                && s.pitch_target.len() == vocab.pitches.len()
                && s.length_target.len() == vocab.lengths.len()
        });
        if !consistent {
            bail!(
                "Stored windows for '{}' do not match window length {} and the stored corpus. \
                 Train from MIDI again to rebuild them.",
                cfg.scale,
                cfg.length
            );
        }

        tracing::info!("Reloaded {} stored samples for '{}'", samples.len(), cfg.scale);
        Ok((vocab, samples))
    }
}

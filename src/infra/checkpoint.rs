// ============================================================
// Layer 6 — Checkpoint Store
// ============================================================
// Saves and restores model weights using Burn's gzip MessagePack
// recorder, one folder per scale.
//
//   CheckpointStore::new("weights")      ← handle on the base path
//       .for_scale(Scale::Both)          ← ScaleCheckpoints
//
// File layout:
//   weights/
//     both/
//       weights.mpk.gz                         ← best loss so far
//       weights-improvement-07-1_2345.mpk.gz   ← one per improving epoch
//       train_config.json                      ← hyperparameters
//       metrics.csv                            ← written by MetricsLogger
//
// Recorder writes are synchronous: once a save returns the file is
// on disk, and no handle stays open between saves.
//
// WeightsRecorder (NamedMpkGzFileRecorder<HalfPrecisionSettings>):
//   - MessagePack + gzip, half precision, ".mpk.gz" extension
//   - Loading fails if the architecture doesn't match
//
// Snapshots are addressed by name, with or without the extension:
//   weights-improvement-07-1_2345
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{HalfPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::score::Scale;
use crate::ml::model::LickModel;

type WeightsRecorder = NamedMpkGzFileRecorder<HalfPrecisionSettings>;

const BEST_WEIGHTS:    &str = "weights";
const SNAPSHOT_PREFIX: &str = "weights-improvement-";
const WEIGHTS_EXT:     &str = ".mpk.gz";
const CONFIG_FILE:     &str = "train_config.json";

/// Handle on the checkpoint base directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    base: PathBuf,
}

impl CheckpointStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Open (and create if needed) the folder of one scale.
    pub fn for_scale(&self, scale: Scale) -> Result<ScaleCheckpoints> {
        let dir = self.base.join(scale.key());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint folder '{}'", dir.display()))?;
        Ok(ScaleCheckpoints { dir })
    }
}

/// Checkpoints of a single scale.
#[derive(Debug, Clone)]
pub struct ScaleCheckpoints {
    dir: PathBuf,
}

impl ScaleCheckpoints {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Overwrite the canonical best-loss weights.
    pub fn save_best<B: Backend>(&self, model: &LickModel<B>) -> Result<()> {
        self.record(model, self.dir.join(BEST_WEIGHTS))
    }

    /// Keep a separate snapshot for this improving epoch.
    pub fn save_improvement<B: Backend>(&self, model: &LickModel<B>, epoch: usize, loss: f64) -> Result<()> {
        // the recorder swaps the extension, so the loss must not contain a dot
        let name = format!("{SNAPSHOT_PREFIX}{epoch:02}-{}", format!("{loss:.4}").replace('.', "_"));
        self.record(model, self.dir.join(name))
    }

    /// Names of the per-epoch snapshots in this folder, oldest epoch first.
    pub fn snapshots(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot list '{}'", self.dir.display()))?;

        let mut names = Vec::new();
        for entry in entries {
            let file = entry?.file_name().to_string_lossy().into_owned();
            if let Some(stem) = file.strip_suffix(WEIGHTS_EXT)
                && stem.starts_with(SNAPSHOT_PREFIX)
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete the snapshots of an earlier run.
    pub fn clear_snapshots(&self) -> Result<usize> {
        let names = self.snapshots()?;
        for name in &names {
            let path = self.dir.join(format!("{name}{WEIGHTS_EXT}"));
            fs::remove_file(&path)
                .with_context(|| format!("Cannot remove stale snapshot '{}'", path.display()))?;
        }
        if !names.is_empty() {
            tracing::info!("Removed {} snapshots of a previous run", names.len());
        }
        Ok(names.len())
    }

    fn record<B: Backend>(&self, model: &LickModel<B>, path: PathBuf) -> Result<()> {
        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;
        tracing::debug!("Saved checkpoint '{}'", path.display());
        Ok(())
    }

    /// Load the best weights into `model`.
    /// The model must have the architecture the checkpoint was saved with.
    pub fn load_model<B: Backend>(
        &self,
        model:  LickModel<B>,
        device: &B::Device,
    ) -> Result<LickModel<B>> {
        let path = self.dir.join(BEST_WEIGHTS);
        tracing::info!("Loading checkpoint '{}'", path.display());

        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Load one per-epoch snapshot into `model`.
    pub fn load_snapshot<B: Backend>(
        &self,
        model:  LickModel<B>,
        name:   &str,
        device: &B::Device,
    ) -> Result<LickModel<B>> {
        let stem = name.strip_suffix(WEIGHTS_EXT).unwrap_or(name);
        let available = self.snapshots()?;
        if !available.iter().any(|s| s == stem) {
            anyhow::bail!(
                "No snapshot '{stem}' in '{}'. Available: {}",
                self.dir.display(),
                if available.is_empty() { "none".to_string() } else { available.join(", ") }
            );
        }

        let path = self.dir.join(stem);
        tracing::info!("Loading snapshot '{}'", path.display());

        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load snapshot '{}'", path.display()))?;

        Ok(model.load_record(record))
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| {
                format!("Cannot write config to '{}'", path.display())
            })?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration the weights were produced with.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'generate'.",
                    path.display()
                )
            })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed training config '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::ml::model::LickModelConfig;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_scale_folders_are_separate() {
        let dir   = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let a = store.for_scale(Scale::Diatonic).unwrap();
        let b = store.for_scale(Scale::Both).unwrap();
        assert_ne!(a.dir(), b.dir());
        assert!(dir.path().join("diatonic").is_dir());
        assert!(dir.path().join("both").is_dir());
    }

    #[test]
    fn test_save_then_load_weights() {
        let dir     = tempfile::tempdir().unwrap();
        let scale   = CheckpointStore::new(dir.path()).for_scale(Scale::Alterated).unwrap();
        let device  = Default::default();
        let config  = LickModelConfig::new(4, 2).with_embed_dim(3).with_rnn_units(5);
        let model   = config.init::<TestBackend>(&device);

        scale.save_best(&model).unwrap();
        scale.save_improvement(&model, 3, 1.23456).unwrap();
        assert!(scale.dir().join("weights.mpk.gz").exists());
        assert!(scale.dir().join("weights-improvement-03-1_2346.mpk.gz").exists());

        let fresh = config.init::<TestBackend>(&device);
        assert!(scale.load_model(fresh, &device).is_ok());
    }

    #[test]
    fn test_weights_are_gzip_messagepack() {
        let dir    = tempfile::tempdir().unwrap();
        let scale  = CheckpointStore::new(dir.path()).for_scale(Scale::Both).unwrap();
        let device = Default::default();
        let model  = LickModelConfig::new(4, 2).with_embed_dim(3).with_rnn_units(5).init::<TestBackend>(&device);

        scale.save_best(&model).unwrap();
        let bytes = fs::read(scale.dir().join("weights.mpk.gz")).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        assert!(!scale.dir().join("weights.mpk").exists());
    }

    #[test]
    fn test_snapshots_load_by_name() {
        let dir    = tempfile::tempdir().unwrap();
        let scale  = CheckpointStore::new(dir.path()).for_scale(Scale::Diatonic).unwrap();
        let device = Default::default();
        let config = LickModelConfig::new(4, 2).with_embed_dim(3).with_rnn_units(5);

        scale.save_best(&config.init::<TestBackend>(&device)).unwrap();
        scale.save_improvement(&config.init::<TestBackend>(&device), 2, 3.5).unwrap();
        scale.save_improvement(&config.init::<TestBackend>(&device), 1, 4.0).unwrap();
        assert_eq!(
            scale.snapshots().unwrap(),
            vec!["weights-improvement-01-4_0000", "weights-improvement-02-3_5000"]
        );

        let fresh = || config.init::<TestBackend>(&device);
        assert!(scale.load_snapshot(fresh(), "weights-improvement-02-3_5000", &device).is_ok());
        assert!(scale.load_snapshot(fresh(), "weights-improvement-01-4_0000.mpk.gz", &device).is_ok());

        let err = scale.load_snapshot(fresh(), "weights-improvement-09-0_1000", &device).unwrap_err();
        assert!(err.to_string().contains("weights-improvement-01-4_0000"));
        // the best weights are not a snapshot
        assert!(scale.load_snapshot(fresh(), "weights", &device).is_err());
    }

    #[test]
    fn test_clear_snapshots_keeps_best_weights() {
        let dir    = tempfile::tempdir().unwrap();
        let scale  = CheckpointStore::new(dir.path()).for_scale(Scale::Both).unwrap();
        let device = Default::default();
        let model  = LickModelConfig::new(4, 2).with_embed_dim(3).with_rnn_units(5).init::<TestBackend>(&device);

        scale.save_best(&model).unwrap();
        scale.save_improvement(&model, 1, 2.0).unwrap();
        scale.save_improvement(&model, 2, 1.0).unwrap();

        assert_eq!(scale.clear_snapshots().unwrap(), 2);
        assert!(scale.snapshots().unwrap().is_empty());
        assert!(scale.dir().join("weights.mpk.gz").exists());
    }

    #[test]
    fn test_missing_checkpoint_is_error() {
        let dir    = tempfile::tempdir().unwrap();
        let scale  = CheckpointStore::new(dir.path()).for_scale(Scale::Both).unwrap();
        let device = Default::default();
        let model  = LickModelConfig::new(4, 2).init::<TestBackend>(&device);
        assert!(scale.load_model(model, &device).is_err());
        assert!(scale.load_config().is_err());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir   = tempfile::tempdir().unwrap();
        let scale = CheckpointStore::new(dir.path()).for_scale(Scale::Both).unwrap();
        let cfg   = TrainConfig { epochs: 7, ..TrainConfig::default() };
        scale.save_config(&cfg).unwrap();
        assert_eq!(scale.load_config().unwrap().epochs, 7);
    }
}

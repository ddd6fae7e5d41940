// ============================================================
// Layer 6 — Corpus Store
// ============================================================
// Persists the intermediate data of a training run, keyed by scale,
// so generation and auditing can run later without re-reading
// any MIDI:
//
//   stored/
//     <scale>/
//       corpus.json    ← flat event stream + lick names
//       windows.json   ← windowed samples (contexts + one-hot targets)
//
// Generation rebuilds the vocabulary from corpus.json, so it must
// be opened with the same scale key the training run used.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};

use crate::data::corpus::Corpus;
use crate::data::dataset::LickSample;
use crate::domain::score::Scale;

const CORPUS_FILE:  &str = "corpus.json";
const WINDOWS_FILE: &str = "windows.json";

pub struct CorpusStore {
    base: PathBuf,
}

impl CorpusStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn save_corpus(&self, scale: Scale, corpus: &Corpus) -> Result<()> {
        self.write(scale, CORPUS_FILE, corpus)?;
        tracing::info!("Stored corpus of {} events for '{}'", corpus.events.len(), scale);
        Ok(())
    }

    pub fn load_corpus(&self, scale: Scale) -> Result<Corpus> {
        self.read(scale, CORPUS_FILE)
    }

    pub fn save_windows(&self, scale: Scale, samples: &[LickSample]) -> Result<()> {
        self.write(scale, WINDOWS_FILE, &samples)?;
        tracing::info!("Stored {} windowed samples for '{}'", samples.len(), scale);
        Ok(())
    }

    pub fn load_windows(&self, scale: Scale) -> Result<Vec<LickSample>> {
        self.read(scale, WINDOWS_FILE)
    }

    fn write<T: Serialize + ?Sized>(&self, scale: Scale, file: &str, value: &T) -> Result<()> {
        let dir = self.base.join(scale.key());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create store folder '{}'", dir.display()))?;
        let path = dir.join(file);
        fs::write(&path, serde_json::to_vec(value)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    fn read<T: DeserializeOwned>(&self, scale: Scale, file: &str) -> Result<T> {
        let path = self.base.join(scale.key()).join(file);
        let bytes = fs::read(&path).with_context(|| {
            format!(
                "Cannot read '{}'. Run 'train' with --scale {} first.",
                path.display(),
                scale
            )
        })?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Malformed store file '{}'", path.display()))
    }
}

// ============================================================
// Layer 2 — Audit Use Case
// ============================================================
// Checks folders of generated licks against the stored training
// corpus and reports which of them are new material, one report
// per folder:
//
//   stored/<scale>/corpus.json        → training licks
//   <generated_dir>/<scale>/*.mid     → generated licks
//
// Generating from several epoch snapshots into separate folders and
// auditing them together shows how copying grows with training.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{
    loader::MidiScoreLoader,
    overfitting::{OverfittingReport, audit},
};
use crate::domain::score::{Lick, Scale};
use crate::domain::traits::ScoreSource;
use crate::infra::corpus_store::CorpusStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub scale:          Scale,
    pub store_dir:      String,
    /// One report per folder, in this order
    pub generated_dirs: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            scale:          Scale::Both,
            store_dir:      "stored".to_string(),
            generated_dirs: vec!["generated_midi".to_string()],
        }
    }
}

/// The audit of one generated folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderReport {
    pub folder: String,
    pub report: OverfittingReport,
}

pub struct AuditUseCase {
    config: AuditConfig,
}

impl AuditUseCase {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<FolderReport>> {
        let cfg = &self.config;

        let training = CorpusStore::new(&cfg.store_dir).load_corpus(cfg.scale)?.licks();

        cfg.generated_dirs
            .iter()
            .map(|dir| {
                let report = self.audit_folder(dir, &training)?;
                Ok(FolderReport { folder: dir.clone(), report })
            })
            .collect()
    }

    fn audit_folder(&self, generated_dir: &str, training: &[Lick]) -> Result<OverfittingReport> {
        let folder = Path::new(generated_dir).join(self.config.scale.key());
        let generated: Vec<Lick> = MidiScoreLoader::new(generated_dir)
            .load_dir(&folder)?
            .iter()
            .map(Lick::from_score)
            .collect();

        tracing::info!(
            "Auditing {} generated licks in '{}' against {} training licks",
            generated.len(),
            folder.display(),
            training.len()
        );

        Ok(audit(&generated, training))
    }
}

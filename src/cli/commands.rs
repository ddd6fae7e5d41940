// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `generate` and `audit`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    audit_use_case::AuditConfig,
    generate_use_case::GenerateConfig,
    train_use_case::TrainConfig,
};
use crate::domain::score::Scale;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the lick model on the .mid files of a scale
    Train(TrainArgs),

    /// Generate new licks with a trained model
    Generate(GenerateArgs),

    /// Check generated licks for copies of training licks
    Audit(AuditArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Which part of the corpus to train on
    #[arg(long, value_enum, default_value_t = Scale::Both)]
    pub scale: Scale,

    /// Folder with `diatonic/` and `alterated/` sub-folders of .mid files
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Where the flattened corpus and windows are stored
    #[arg(long, default_value = "stored")]
    pub store_dir: String,

    /// Where weights, config and metrics are saved
    #[arg(long, default_value = "weights")]
    pub checkpoint_dir: String,

    /// Context window length; also the sentinel run between licks
    #[arg(long, default_value_t = 17)]
    pub length: usize,

    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Epochs without a lower training loss before stopping
    #[arg(long, default_value_t = 5)]
    pub patience: usize,

    /// Width of each embedding (pitch and duration)
    #[arg(long, default_value_t = 100)]
    pub embed_dim: usize,

    /// Hidden units of both LSTM layers
    #[arg(long, default_value_t = 256)]
    pub rnn_units: usize,

    #[arg(long, default_value_t = 0.3)]
    pub dropout: f64,

    /// Share of windows (taken from the end) held out for validation
    #[arg(long, default_value_t = 0.3)]
    pub validation_split: f64,

    /// Keep only the best weights, not one file per improving epoch
    #[arg(long)]
    pub no_snapshots: bool,

    /// Seed of the per-epoch shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Retrain on the corpus and windows stored by an earlier run
    #[arg(long)]
    pub from_store: bool,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            scale:             a.scale,
            data_dir:          a.data_dir,
            store_dir:         a.store_dir,
            checkpoint_dir:    a.checkpoint_dir,
            length:            a.length,
            epochs:            a.epochs,
            batch_size:        a.batch_size,
            lr:                a.lr,
            patience:          a.patience,
            embed_dim:         a.embed_dim,
            rnn_units:         a.rnn_units,
            dropout:           a.dropout,
            validation_split:  a.validation_split,
            save_improvements: !a.no_snapshots,
            seed:              a.seed,
            from_store:        a.from_store,
        }
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(long, value_enum, default_value_t = Scale::Both)]
    pub scale: Scale,

    /// Number of licks to write
    #[arg(short, long, default_value_t = 10)]
    pub n: usize,

    /// Randomness of the pitch choice; 0 always takes the most likely
    #[arg(long, default_value_t = 0.55)]
    pub pitch_randomness: f64,

    /// Randomness of the duration choice
    #[arg(long, default_value_t = 0.1)]
    pub length_randomness: f64,

    /// Context length (defaults to the training window length)
    #[arg(long)]
    pub length: Option<usize>,

    /// Maximum number of new events per lick
    #[arg(long, default_value_t = 17)]
    pub additional_notes: usize,

    #[arg(long, default_value = "stored")]
    pub store_dir: String,

    #[arg(long, default_value = "weights")]
    pub checkpoint_dir: String,

    /// Use a per-epoch snapshot such as `weights-improvement-07-1_2345`
    /// instead of the best weights
    #[arg(long)]
    pub weights: Option<String>,

    /// Licks go to `<out_dir>/<scale>/`
    #[arg(long, default_value = "generated_midi")]
    pub out_dir: String,

    /// Fixed seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,
}

impl From<GenerateArgs> for GenerateConfig {
    fn from(a: GenerateArgs) -> Self {
        GenerateConfig {
            scale:             a.scale,
            store_dir:         a.store_dir,
            checkpoint_dir:    a.checkpoint_dir,
            weights:           a.weights,
            out_dir:           a.out_dir,
            n:                 a.n,
            length:            a.length,
            additional_notes:  a.additional_notes,
            pitch_randomness:  a.pitch_randomness,
            length_randomness: a.length_randomness,
            seed:              a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    #[arg(long, value_enum, default_value_t = Scale::Both)]
    pub scale: Scale,

    #[arg(long, default_value = "stored")]
    pub store_dir: String,

    /// Folder the `generate` command wrote to; repeat to compare runs
    #[arg(long = "generated-dir", default_value = "generated_midi")]
    pub generated_dirs: Vec<String>,
}

impl From<AuditArgs> for AuditConfig {
    fn from(a: AuditArgs) -> Self {
        AuditConfig {
            scale:          a.scale,
            store_dir:      a.store_dir,
            generated_dirs: a.generated_dirs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::Cli;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["lickgen", "train", "--scale", "diatonic"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.scale, Scale::Diatonic);
        assert_eq!(cfg.length, 17);
        assert!(cfg.save_improvements);
        assert!(!cfg.from_store);
    }

    #[test]
    fn test_generate_flags() {
        let cli = Cli::try_parse_from([
            "lickgen", "generate", "-n", "3", "--pitch-randomness", "0", "--seed", "5",
        ])
        .unwrap();
        let Commands::Generate(args) = cli.command else { panic!("expected generate") };
        let cfg: GenerateConfig = args.into();
        assert_eq!(cfg.n, 3);
        assert_eq!(cfg.pitch_randomness, 0.0);
        assert_eq!(cfg.seed, Some(5));
        assert_eq!(cfg.length, None);
        assert_eq!(cfg.weights, None);
    }

    #[test]
    fn test_generate_from_snapshot() {
        let cli = Cli::try_parse_from([
            "lickgen", "generate", "--weights", "weights-improvement-07-1_2345", "--out-dir", "runs/epoch07",
        ])
        .unwrap();
        let Commands::Generate(args) = cli.command else { panic!("expected generate") };
        let cfg: GenerateConfig = args.into();
        assert_eq!(cfg.weights.as_deref(), Some("weights-improvement-07-1_2345"));
        assert_eq!(cfg.out_dir, "runs/epoch07");
    }

    #[test]
    fn test_audit_takes_several_folders() {
        let cli = Cli::try_parse_from(["lickgen", "audit"]).unwrap();
        let Commands::Audit(args) = cli.command else { panic!("expected audit") };
        assert_eq!(AuditConfig::from(args).generated_dirs, vec!["generated_midi"]);

        let cli = Cli::try_parse_from([
            "lickgen", "audit", "--generated-dir", "runs/epoch05", "--generated-dir", "runs/epoch07",
        ])
        .unwrap();
        let Commands::Audit(args) = cli.command else { panic!("expected audit") };
        assert_eq!(AuditConfig::from(args).generated_dirs, vec!["runs/epoch05", "runs/epoch07"]);
    }

    #[test]
    fn test_train_from_store_flag() {
        let cli = Cli::try_parse_from(["lickgen", "train", "--from-store", "--epochs", "0"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert!(cfg.from_store);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_unknown_scale_rejected() {
        assert!(Cli::try_parse_from(["lickgen", "audit", "--scale", "lydian"]).is_err());
    }
}

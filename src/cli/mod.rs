// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with `clap` and routes to Layer 2.
//
//   1. `train`    — learn from the .mid licks of a scale
//   2. `generate` — write new licks with the trained model
//   3. `audit`    — count generated licks that aren't copies
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{AuditArgs, Commands, GenerateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "lickgen",
    version = "0.1.0",
    about = "Train an LSTM on jazz licks in MIDI, then generate new ones."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Generate(args) => run_generate(args),
            Commands::Audit(args)    => run_audit(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}' licks in: {}", args.scale, args.data_dir);

    let report = TrainUseCase::new(args.into()).execute()?;

    match report.best_epoch {
        Some(epoch) => println!(
            "Training complete after {} epochs. Best loss {:.4} at epoch {}{}.",
            report.epochs_run,
            report.best_loss,
            epoch,
            if report.stopped_early { " (stopped early)" } else { "" },
        ),
        None => println!("Training finished without a finite loss; no weights were saved."),
    }
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    use crate::application::generate_use_case::GenerateUseCase;

    let paths = GenerateUseCase::new(args.into()).execute()?;
    for path in &paths {
        println!("{}", path.display());
    }
    println!("\nWrote {} licks.", paths.len());
    Ok(())
}

fn run_audit(args: AuditArgs) -> Result<()> {
    use crate::application::audit_use_case::AuditUseCase;

    let reports = AuditUseCase::new(args.into()).execute()?;

    for folder in &reports {
        println!("{}: viable licks {:.1}%", folder.folder, folder.report.viable_fraction * 100.0);
        for name in &folder.report.viable_names {
            println!("  {name}");
        }
    }
    Ok(())
}

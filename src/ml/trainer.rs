// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Mini-batch train + validation loop using Burn's DataLoader and Adam.
//
// Per epoch:
//   1. shuffled training batches → forward_loss → backward → Adam step
//   2. validation batches on the inner backend (no autodiff, no dropout)
//   3. monitor the mean TRAINING loss:
//        improved → save weights.mpk.gz (and optionally a
//                   weights-improvement-<epoch>-<loss> snapshot)
//        stalled  → count towards `patience`
//   4. stop once `patience` epochs pass without improvement
//
// The best-seen weights are what the loop returns, whether it
// stopped early or ran every epoch.
//
// Key Burn insight:
//   - Training uses B: AutodiffBackend for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - Validation batcher must also use B::InnerBackend
//   - argmax(1) returns [batch,1] so we flatten before .equal()
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{ElementConversion, backend::AutodiffBackend},
};

use crate::data::{batcher::LickBatcher, dataset::LickDataset};
use crate::infra::checkpoint::ScaleCheckpoints;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{LickModel, categorical_cross_entropy};

#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub epochs:            usize,
    pub batch_size:        usize,
    pub lr:                f64,
    pub patience:          usize,
    /// Also keep one snapshot per improving epoch
    pub save_improvements: bool,
    /// Seed of the per-epoch shuffle
    pub seed:              u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            epochs:            100,
            batch_size:        32,
            lr:                1e-3,
            patience:          5,
            save_improvements: true,
            seed:              42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// None if no epoch produced a finite loss
    pub best_epoch:    Option<usize>,
    pub best_loss:     f64,
    pub epochs_run:    usize,
    pub stopped_early: bool,
}

// ─── Early stopping ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Improved,
    Stalled,
    Stop,
}

/// Tracks the best monitored loss; lower is better.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience:   usize,
    best_loss:  f64,
    best_epoch: Option<usize>,
    wait:       usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self { patience, best_loss: f64::INFINITY, best_epoch: None, wait: 0 }
    }

    pub fn observe(&mut self, epoch: usize, loss: f64) -> Progress {
        // NaN never compares lower, so a diverged epoch just stalls
        if loss < self.best_loss {
            self.best_loss  = loss;
            self.best_epoch = Some(epoch);
            self.wait       = 0;
            return Progress::Improved;
        }
        self.wait += 1;
        if self.wait >= self.patience { Progress::Stop } else { Progress::Stalled }
    }

    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

pub fn train_loop<B: AutodiffBackend>(
    model:         LickModel<B>,
    train_dataset: LickDataset,
    val_dataset:   LickDataset,
    opts:          &TrainingOptions,
    checkpoints:   &ScaleCheckpoints,
    metrics:       &MetricsLogger,
    device:        &B::Device,
) -> Result<(LickModel<B>, TrainingReport)> {
    let mut model = model;
    tracing::info!(
        "Training on {} samples, validating on {}",
        train_dataset.sample_count(),
        val_dataset.sample_count()
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-7).init::<B, LickModel<B>>();

    // ── Training data loader (AutodiffBackend, reshuffled every epoch) ───────
    let train_loader = DataLoaderBuilder::new(LickBatcher::<B>::new())
        .batch_size(opts.batch_size)
        .shuffle(opts.seed)
        .num_workers(1)
        .set_device(device.clone())
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_loader = DataLoaderBuilder::new(LickBatcher::<B::InnerBackend>::new())
        .batch_size(opts.batch_size)
        .num_workers(1)
        .set_device(device.clone())
        .build(val_dataset);

    let mut stopper = EarlyStopping::new(opts.patience);
    let mut best_model: Option<LickModel<B>> = None;
    let mut epochs_run    = 0usize;
    let mut stopped_early = false;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=opts.epochs {
        epochs_run = epoch;

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(
                batch.pitch_context,
                batch.length_context,
                batch.pitch_target,
                batch.length_target,
            );

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(opts.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum   = 0.0f64;
        let mut val_batches    = 0usize;
        let mut correct_pitch  = 0usize;
        let mut correct_length = 0usize;
        let mut total_samples  = 0usize;

        for batch in val_loader.iter() {
            let (logits, _) = model_valid.forward_logits(batch.pitch_context, batch.length_context);

            let batch_loss: f64 = (categorical_cross_entropy(logits.pitch.clone(), batch.pitch_target.clone())
                + categorical_cross_entropy(logits.length.clone(), batch.length_target.clone()))
                .into_scalar().elem::<f64>();
            val_loss_sum += batch_loss;
            val_batches  += 1;

            total_samples += batch.pitch_target.dims()[0];
            correct_pitch  += count_correct(logits.pitch, batch.pitch_target);
            correct_length += count_correct(logits.length, batch.length_target);
        }

        let avg_val_loss = if val_batches   > 0 { val_loss_sum / val_batches as f64 } else { f64::NAN };
        let pitch_acc    = if total_samples > 0 { correct_pitch  as f64 / total_samples as f64 } else { 0.0 };
        let length_acc   = if total_samples > 0 { correct_length as f64 / total_samples as f64 } else { 0.0 };

        // ── Checkpointing / early stopping ────────────────────────────────────
        let progress = stopper.observe(epoch, avg_train_loss);
        let improved = progress == Progress::Improved;

        println!(
            "Epoch {:>3}/{} | loss={:.4} | val_loss={:.4} | pitch_acc={:.1}% | dur_acc={:.1}%{}",
            epoch, opts.epochs, avg_train_loss, avg_val_loss,
            pitch_acc * 100.0, length_acc * 100.0,
            if improved { " | improved" } else { "" },
        );

        metrics.log(&EpochMetrics::new(
            epoch, avg_train_loss, avg_val_loss, pitch_acc, length_acc, improved,
        ))?;

        match progress {
            Progress::Improved => {
                checkpoints.save_best(&model)?;
                if opts.save_improvements {
                    checkpoints.save_improvement(&model, epoch, avg_train_loss)?;
                }
                tracing::info!("Loss improved to {:.4} at epoch {}", avg_train_loss, epoch);
                best_model = Some(model.clone());
            }
            Progress::Stalled => {
                tracing::debug!("No improvement over {:.4} at epoch {}", stopper.best_loss(), epoch);
            }
            Progress::Stop => {
                tracing::info!(
                    "Early stopping at epoch {}: no improvement for {} epochs",
                    epoch, opts.patience
                );
                stopped_early = true;
                break;
            }
        }
    }

    let report = TrainingReport {
        best_epoch: stopper.best_epoch(),
        best_loss:  stopper.best_loss(),
        epochs_run,
        stopped_early,
    };

    tracing::info!("Training complete: {:?}", report);
    Ok((best_model.unwrap_or(model), report))
}

/// Rows whose argmax matches the one-hot target's hot index.
fn count_correct<B: Backend>(logits: Tensor<B, 2>, one_hot: Tensor<B, 2>) -> usize {
    // argmax(1) returns shape [batch, 1] — flatten to [batch]
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    let expected  = one_hot.argmax(1).flatten::<1>(0, 1);
    let correct: i64 = predicted.equal(expected).int().sum().into_scalar().elem::<i64>();
    correct as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::data::{corpus::Corpus, splitter::split_validation, vocab::Vocabulary, windowing::WindowEncoder};
    use crate::domain::score::{Scale, Score};
    use crate::domain::symbol::Event;
    use crate::infra::checkpoint::CheckpointStore;
    use crate::ml::model::LickModelConfig;

    type TrainBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_early_stopping_counts_stalls() {
        let mut stopper = EarlyStopping::new(2);
        assert_eq!(stopper.observe(1, 3.0), Progress::Improved);
        assert_eq!(stopper.observe(2, 2.5), Progress::Improved);
        assert_eq!(stopper.observe(3, 2.5), Progress::Stalled);
        assert_eq!(stopper.observe(4, 2.7), Progress::Stop);
        assert_eq!(stopper.best_epoch(), Some(2));
        assert_eq!(stopper.best_loss(), 2.5);
    }

    #[test]
    fn test_improvement_resets_patience() {
        let mut stopper = EarlyStopping::new(2);
        stopper.observe(1, 3.0);
        assert_eq!(stopper.observe(2, 3.1), Progress::Stalled);
        assert_eq!(stopper.observe(3, 2.0), Progress::Improved);
        assert_eq!(stopper.observe(4, 2.1), Progress::Stalled);
    }

    #[test]
    fn test_nan_loss_stalls() {
        let mut stopper = EarlyStopping::new(1);
        assert_eq!(stopper.observe(1, f64::NAN), Progress::Stop);
        assert_eq!(stopper.best_epoch(), None);
    }

    #[test]
    fn test_short_training_run_writes_checkpoints() {
        let dir    = tempfile::tempdir().unwrap();
        let scores = vec![
            Score::new("a.mid", vec![Event::note(60, 0.5), Event::note(62, 0.5), Event::note(64, 1.0)]),
            Score::new("b.mid", vec![Event::note(67, 0.5), Event::rest(0.5), Event::note(65, 0.5)]),
        ];
        let corpus  = Corpus::from_scores(&scores, 4);
        let vocab   = Vocabulary::from_events(&corpus.events);
        let samples = WindowEncoder::new(4).encode(&corpus.events, &vocab).unwrap();
        let (train, val) = split_validation(samples, 0.3);

        let device = Default::default();
        let model  = LickModelConfig::new(vocab.pitches.len(), vocab.lengths.len())
            .with_embed_dim(4)
            .with_rnn_units(8)
            .init::<TrainBackend>(&device);

        let checkpoints = CheckpointStore::new(dir.path()).for_scale(Scale::Diatonic).unwrap();
        let metrics     = MetricsLogger::new(checkpoints.dir()).unwrap();
        let opts = TrainingOptions { epochs: 3, batch_size: 4, patience: 5, ..Default::default() };

        let (_model, report) = train_loop(
            model, LickDataset::new(train), LickDataset::new(val),
            &opts, &checkpoints, &metrics, &device,
        ).unwrap();

        assert_eq!(report.epochs_run, 3);
        assert!(!report.stopped_early);
        assert!(report.best_epoch.is_some());
        assert!(report.best_loss.is_finite());
        assert!(checkpoints.dir().join("weights.mpk.gz").exists());
        assert!(metrics.csv_path().exists());
    }

    #[test]
    fn test_stalled_run_stops_early_and_returns_best_weights() {
        let dir    = tempfile::tempdir().unwrap();
        let scores = vec![Score::new("a.mid", vec![Event::note(60, 0.5), Event::note(62, 0.5), Event::note(64, 1.0)])];
        let corpus  = Corpus::from_scores(&scores, 4);
        let vocab   = Vocabulary::from_events(&corpus.events);
        let mut samples = WindowEncoder::new(4).encode(&corpus.events, &vocab).unwrap();
        // one training sample: no shuffle order, so every epoch sees the same loss
        let val = samples.split_off(1);

        let device = Default::default();
        let config = LickModelConfig::new(vocab.pitches.len(), vocab.lengths.len())
            .with_embed_dim(4)
            .with_rnn_units(8)
            .with_dropout(0.0);
        let model  = config.init::<TrainBackend>(&device);

        let checkpoints = CheckpointStore::new(dir.path()).for_scale(Scale::Both).unwrap();
        let metrics     = MetricsLogger::new(checkpoints.dir()).unwrap();
        let opts = TrainingOptions { epochs: 5, batch_size: 8, lr: 0.0, patience: 1, ..Default::default() };

        let (best, report) = train_loop(
            model, LickDataset::new(samples), LickDataset::new(val),
            &opts, &checkpoints, &metrics, &device,
        ).unwrap();

        assert!(report.stopped_early);
        assert_eq!(report.epochs_run, 2);
        assert!(report.epochs_run < opts.epochs);
        assert_eq!(report.best_epoch, Some(1));

        let log = std::fs::read_to_string(metrics.csv_path()).unwrap();
        let improving = log.lines().skip(1).filter(|row| row.ends_with(",true")).count();
        assert_eq!(improving, 1);
        assert_eq!(checkpoints.snapshots().unwrap().len(), improving);

        let reloaded = checkpoints.load_model(config.init::<TrainBackend>(&device), &device).unwrap();
        let context  = || Tensor::<TrainBackend, 2, Int>::from_data(TensorData::new(vec![0i64; 4], [1, 4]), &device);
        let from_loop = best.forward(context(), context());
        let from_disk = reloaded.forward(context(), context());

        let flatten = |t: Tensor<TrainBackend, 2>| t.into_data().convert::<f32>().into_vec::<f32>().unwrap();
        for (a, b) in flatten(from_loop.pitch).iter().zip(flatten(from_disk.pitch)) {
            // weights are stored at half precision
            assert!((a - b).abs() < 1e-2, "{a} vs {b}");
        }
        for (a, b) in flatten(from_loop.length).iter().zip(flatten(from_disk.length)) {
            assert!((a - b).abs() < 1e-2, "{a} vs {b}");
        }
    }
}

// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Holds out the last `validation_fraction` of the samples for
// validation and keeps the rest for training:
//
//   [ s0 s1 s2 s3 s4 s5 s6 s7 s8 s9 ]   fraction = 0.3
//   └──────── train ───────┘└─ val ─┘
//
// The training share is floor(total * (1 - fraction)), so an
// uneven split gives the extra sample to validation. The split
// itself is not shuffled; the training loader reshuffles its half
// every epoch.
//
// Reference: Rust Book §8 (Vectors)

/// Split `samples` into (train, validation), validation taken from the tail.
///
/// # Arguments
/// * `samples`             - All available samples (consumed)
/// * `validation_fraction` - Share held out, e.g. 0.3 = 30%
pub fn split_validation<T>(mut samples: Vec<T>, validation_fraction: f64) -> (Vec<T>, Vec<T>) {
    let total     = samples.len();
    let fraction  = validation_fraction.clamp(0.0, 1.0);
    let split_at  = ((total as f64) * (1.0 - fraction)).floor() as usize;

    // split_off(n) leaves [0..n) in place and returns [n..total)
    let val = samples.split_off(split_at.min(total));

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}

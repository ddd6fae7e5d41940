use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One windowed training example.
/// Contexts hold integer codes; targets are one-hot over each vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LickSample {
    pub pitch_context:  Vec<u32>,
    pub length_context: Vec<u32>,
    pub pitch_target:   Vec<f32>,
    pub length_target:  Vec<f32>,
}

impl LickSample {
    pub fn window(&self) -> usize {
        self.pitch_context.len()
    }
}

#[cfg(test)]
impl LickSample {
    pub fn pitch_class(&self) -> usize {
        hot_index(&self.pitch_target)
    }

    pub fn length_class(&self) -> usize {
        hot_index(&self.length_target)
    }
}

#[cfg(test)]
fn hot_index(one_hot: &[f32]) -> usize {
    one_hot.iter().position(|&v| v == 1.0).unwrap_or(0)
}

pub struct LickDataset {
    samples: Vec<LickSample>,
}

impl LickDataset {
    pub fn new(samples: Vec<LickSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<LickSample> for LickDataset {
    fn get(&self, index: usize) -> Option<LickSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

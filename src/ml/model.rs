use burn::{
    nn::{
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
    tensor::activation::{log_softmax, softmax, tanh},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct LickModelConfig {
    pub pitch_vocab:  usize,
    pub length_vocab: usize,
    #[config(default = 100)]
    pub embed_dim:    usize,
    #[config(default = 256)]
    pub rnn_units:    usize,
    #[config(default = 0.3)]
    pub dropout:      f64,
}

impl LickModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LickModel<B> {
        let pitch_embedding  = EmbeddingConfig::new(self.pitch_vocab, self.embed_dim).init(device);
        let length_embedding = EmbeddingConfig::new(self.length_vocab, self.embed_dim).init(device);
        let first_lstm  = LstmConfig::new(2 * self.embed_dim, self.rnn_units, true).init(device);
        let second_lstm = LstmConfig::new(self.rnn_units, self.rnn_units, true).init(device);
        let dropout     = DropoutConfig::new(self.dropout).init();
        let attention   = AttentionPooling { score: LinearConfig::new(self.rnn_units, 1).init(device) };
        let pitch_head  = LinearConfig::new(self.rnn_units, self.pitch_vocab).init(device);
        let length_head = LinearConfig::new(self.rnn_units, self.length_vocab).init(device);
        LickModel {
            pitch_embedding, length_embedding,
            first_lstm, second_lstm, dropout,
            attention, pitch_head, length_head,
        }
    }
}

/// Global attention pooling over time steps.
#[derive(Module, Debug)]
pub struct AttentionPooling<B: Backend> {
    pub score: Linear<B>,
}

impl<B: Backend> AttentionPooling<B> {
    /// hidden: [batch, steps, units] → (context [batch, units], weights [batch, steps])
    pub fn forward(&self, hidden: Tensor<B, 3>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let [batch, steps, units] = hidden.dims();

        // One tanh-bounded score per step, softmax across steps.
        let scores  = tanh(self.score.forward(hidden.clone())).reshape([batch, steps]);
        let weights = softmax(scores, 1);

        // Repeat each step weight across the hidden width, weight and sum over time.
        let spread  = weights.clone().reshape([batch, steps, 1]).repeat_dim(2, units);
        let context = (hidden * spread).sum_dim(1).reshape([batch, units]);

        (context, weights)
    }
}

#[derive(Module, Debug)]
pub struct LickModel<B: Backend> {
    pub pitch_embedding:  Embedding<B>,
    pub length_embedding: Embedding<B>,
    pub first_lstm:       Lstm<B>,
    pub second_lstm:      Lstm<B>,
    pub dropout:          Dropout,
    pub attention:        AttentionPooling<B>,
    pub pitch_head:       Linear<B>,
    pub length_head:      Linear<B>,
}

/// Unnormalised scores of both heads.
pub struct LickLogits<B: Backend> {
    pub pitch:  Tensor<B, 2>,
    pub length: Tensor<B, 2>,
}

/// Probability distributions of both heads.
pub struct LickPrediction<B: Backend> {
    pub pitch:  Tensor<B, 2>,
    pub length: Tensor<B, 2>,
}

impl<B: Backend> LickModel<B> {
    /// pitch, length: [batch, window] codes → logits [batch, vocab] per head, attention [batch, window]
    pub fn forward_logits(
        &self,
        pitch:  Tensor<B, 2, Int>,
        length: Tensor<B, 2, Int>,
    ) -> (LickLogits<B>, Tensor<B, 2>) {
        let pitch_emb  = self.pitch_embedding.forward(pitch);
        let length_emb = self.length_embedding.forward(length);
        let merged = Tensor::cat(vec![pitch_emb, length_emb], 2); // [batch, window, 2*embed]

        let (hidden, _) = self.first_lstm.forward(merged, None);
        let (hidden, _) = self.second_lstm.forward(hidden, None);
        // Dropout is a no-op outside autodiff backends.
        let hidden = self.dropout.forward(hidden);

        let (context, weights) = self.attention.forward(hidden);

        let logits = LickLogits {
            pitch:  self.pitch_head.forward(context.clone()),
            length: self.length_head.forward(context),
        };
        (logits, weights)
    }

    pub fn forward(&self, pitch: Tensor<B, 2, Int>, length: Tensor<B, 2, Int>) -> LickPrediction<B> {
        let (logits, _) = self.forward_logits(pitch, length);
        LickPrediction {
            pitch:  softmax(logits.pitch, 1),
            length: softmax(logits.length, 1),
        }
    }

    /// Summed categorical cross-entropy of both heads against one-hot targets.
    pub fn forward_loss(
        &self,
        pitch:         Tensor<B, 2, Int>,
        length:        Tensor<B, 2, Int>,
        pitch_target:  Tensor<B, 2>,
        length_target: Tensor<B, 2>,
    ) -> (Tensor<B, 1>, LickLogits<B>) {
        let (logits, _) = self.forward_logits(pitch, length);
        let loss = categorical_cross_entropy(logits.pitch.clone(), pitch_target)
                 + categorical_cross_entropy(logits.length.clone(), length_target);
        (loss, logits)
    }
}

/// mean over the batch of −Σ one_hot · log softmax(logits)
pub fn categorical_cross_entropy<B: Backend>(logits: Tensor<B, 2>, one_hot: Tensor<B, 2>) -> Tensor<B, 1> {
    (one_hot * log_softmax(logits, 1)).sum_dim(1).mean().neg()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = NdArray<f32>;

    fn tiny_config() -> LickModelConfig {
        LickModelConfig::new(5, 3).with_embed_dim(4).with_rnn_units(8)
    }

    fn codes(device: &<TestBackend as Backend>::Device) -> (Tensor<TestBackend, 2, Int>, Tensor<TestBackend, 2, Int>) {
        let pitch = Tensor::from_data(TensorData::new(vec![0i64, 0, 1, 2, 0, 3, 4, 1], [2, 4]), device);
        let length = Tensor::from_data(TensorData::new(vec![0i64, 0, 1, 2, 0, 1, 1, 2], [2, 4]), device);
        (pitch, length)
    }

    fn to_vec(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.into_data().convert::<f32>().into_vec::<f32>().unwrap()
    }

    #[test]
    fn test_output_shapes() {
        let device = Default::default();
        let model  = tiny_config().init::<TestBackend>(&device);
        let (pitch, length) = codes(&device);
        let (logits, attention) = model.forward_logits(pitch, length);
        assert_eq!(logits.pitch.dims(), [2, 5]);
        assert_eq!(logits.length.dims(), [2, 3]);
        assert_eq!(attention.dims(), [2, 4]);
    }

    #[test]
    fn test_heads_and_attention_are_distributions() {
        let device = Default::default();
        let model  = tiny_config().init::<TestBackend>(&device);
        let (pitch, length) = codes(&device);
        let out = model.forward(pitch.clone(), length.clone());
        let (_, attention) = model.forward_logits(pitch, length);

        for (dist, width) in [(out.pitch, 5), (out.length, 3), (attention, 4)] {
            let values = to_vec(dist);
            for row in values.chunks(width) {
                let sum: f32 = row.iter().sum();
                assert!((sum - 1.0).abs() < 1e-4, "row sums to {sum}");
                assert!(row.iter().all(|&p| p >= 0.0));
            }
        }
    }

    #[test]
    fn test_context_is_weighted_mean_of_hidden_states() {
        let device  = Default::default();
        let pooling = AttentionPooling::<TestBackend> {
            score: LinearConfig::new(2, 1).init(&device),
        };
        // identical hidden states: any weighting returns that state
        let hidden = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(vec![0.5f32, -1.0, 0.5, -1.0, 0.5, -1.0], [1, 3, 2]),
            &device,
        );
        let (context, _) = pooling.forward(hidden);
        let values = to_vec(context);
        assert!((values[0] - 0.5).abs() < 1e-5);
        assert!((values[1] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_loss_is_finite_and_backpropagates() {
        type TrainBackend = Autodiff<TestBackend>;
        let device = Default::default();
        let model  = tiny_config().init::<TrainBackend>(&device);

        let pitch  = Tensor::<TrainBackend, 2, Int>::from_data(TensorData::new(vec![0i64, 1, 2], [1, 3]), &device);
        let length = Tensor::<TrainBackend, 2, Int>::from_data(TensorData::new(vec![0i64, 1, 1], [1, 3]), &device);
        let pitch_target  = Tensor::<TrainBackend, 2>::from_data(TensorData::new(vec![0.0f32, 0.0, 0.0, 1.0, 0.0], [1, 5]), &device);
        let length_target = Tensor::<TrainBackend, 2>::from_data(TensorData::new(vec![0.0f32, 0.0, 1.0], [1, 3]), &device);

        let (loss, _) = model.forward_loss(pitch, length, pitch_target, length_target);
        let value = loss.clone().into_data().convert::<f32>().into_vec::<f32>().unwrap()[0];
        assert!(value.is_finite());
        assert!(value > 0.0);
        let _ = loss.backward();
    }

    #[test]
    fn test_cross_entropy_of_confident_match_is_small() {
        let device  = Default::default();
        let logits  = Tensor::<TestBackend, 2>::from_data(TensorData::new(vec![20.0f32, 0.0, 0.0], [1, 3]), &device);
        let one_hot = Tensor::<TestBackend, 2>::from_data(TensorData::new(vec![1.0f32, 0.0, 0.0], [1, 3]), &device);
        let loss = categorical_cross_entropy(logits, one_hot);
        let value = loss.into_data().convert::<f32>().into_vec::<f32>().unwrap()[0];
        assert!(value < 1e-3);
    }
}

use burn::config::Config;
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig, LayerNorm, LayerNormConfig};
use burn::prelude::{Backend, Int};
use burn::tensor::Tensor;

use crate::init::{ParamVisitor, VisitParams};

/// Token lookup plus learned absolute positions, normalized.
#[derive(Config, Debug)]
pub struct WordAndPositionalEmbeddingConfig {
    pub vocab_size: usize,
    pub hidden_size: usize,
    #[config(default = 30)]
    pub max_sequence_length: usize,
    #[config(default = 0)]
    pub padding_idx: usize,
    #[config(default = 0.0)]
    pub dropout: f64,
}

impl WordAndPositionalEmbeddingConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> WordAndPositionalEmbedding<B> {
        WordAndPositionalEmbedding {
            words: EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device),
            positions: EmbeddingConfig::new(self.max_sequence_length, self.hidden_size).init(device),
            layer_norm: LayerNormConfig::new(self.hidden_size)
                .with_epsilon(1e-8)
                .init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            padding_idx: self.padding_idx,
            max_sequence_length: self.max_sequence_length,
        }
    }
}

#[derive(Module, Debug)]
pub struct WordAndPositionalEmbedding<B: Backend> {
    words: Embedding<B>,
    positions: Embedding<B>,
    layer_norm: LayerNorm<B>,
    dropout: Dropout,
    padding_idx: usize,
    max_sequence_length: usize,
}

impl<B: Backend> WordAndPositionalEmbedding<B> {
    pub fn padding_idx(&self) -> usize {
        self.padding_idx
    }

    pub fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }

    /// vocab x hidden
    pub fn word_embeddings(&self) -> Tensor<B, 2> {
        self.words.weight.val()
    }

    /// max_sequence_length x hidden
    pub fn positional_embeddings(&self) -> Tensor<B, 2> {
        self.positions.weight.val()
    }

    pub fn device(&self) -> B::Device {
        self.words.weight.val().device()
    }

    // batch x seq position ids 0..seq for every row
    fn position_ids(&self, batch: usize, seq: usize, device: &B::Device) -> Tensor<B, 2, Int> {
        Tensor::<B, 1, Int>::arange(0..seq as i64, device)
            .unsqueeze::<2>()
            .expand([batch, seq])
    }

    /// batch x seq token ids -> batch x seq x hidden
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch, seq] = tokens.dims();
        let device = tokens.device();

        let words = self.words.forward(tokens);
        let positions = self.positions.forward(self.position_ids(batch, seq, &device));

        let embeddings = self.layer_norm.forward(words + positions);
        self.dropout.forward(embeddings)
    }
}

impl<B: Backend> VisitParams<B> for WordAndPositionalEmbedding<B> {
    fn visit_params<V: ParamVisitor<B>>(mut self, visitor: &mut V) -> Self {
        self.words = visitor.embedding_table(self.words, Some(self.padding_idx));
        self.positions = visitor.embedding_table(self.positions, None);
        self
    }
}

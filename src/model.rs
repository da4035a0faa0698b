use burn::module::Module;
use burn::prelude::{Backend, Int};
use burn::tensor::Tensor;
use tracing::{debug, trace};

use crate::config::{Directionality, StreamConfig};
use crate::data::TokenBatch;
use crate::error::{ConfigurationError, ShapeError};
use crate::init::{NormalInit, ParamVisitor, VisitParams};
use crate::mask::padding_mask;
use crate::model::embedding::{WordAndPositionalEmbedding, WordAndPositionalEmbeddingConfig};
use crate::model::encoder::block::EncoderBlockConfig;
use crate::model::encoder::{DirectionalEncoder, DirectionalEncoderConfig};
use crate::ops::{to_batch_major, to_sequence_major};

pub mod embedding;
pub mod encoder;

impl StreamConfig {
    /// Builds a stream with freshly initialized N(0, 0.02) weights.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<TextualStream<B>, ConfigurationError> {
        self.validate()?;

        let block = EncoderBlockConfig::new(self.hidden_size, self.attention_heads, self.feedforward_size)
            .with_dropout(self.dropout)
            .with_activation(self.activation)
            .with_norm_type(self.norm_type);

        let encoder = DirectionalEncoderConfig::new(block, self.num_layers)
            .with_direction(self.direction)
            .init(device)?;

        let embedding = WordAndPositionalEmbeddingConfig::new(self.vocab_size, self.hidden_size)
            .with_max_sequence_length(self.max_sequence_length)
            .with_padding_idx(self.padding_idx)
            .with_dropout(self.dropout)
            .init(device);

        debug!(
            vocab_size = self.vocab_size,
            hidden_size = self.hidden_size,
            feedforward_size = self.feedforward_size,
            attention_heads = self.attention_heads,
            num_layers = self.num_layers,
            dropout = self.dropout,
            padding_idx = self.padding_idx,
            max_sequence_length = self.max_sequence_length,
            norm_type = %self.norm_type,
            activation = %self.activation,
            direction = %self.direction,
            "building textual stream"
        );

        Ok(TextualStream {
            embedding,
            encoder,
            vocab_size: self.vocab_size,
            hidden_size: self.hidden_size,
        }
        .init_weights())
    }
}

/// Token ids in, one `hidden_size` feature vector per token out.
#[derive(Module, Debug)]
pub struct TextualStream<B: Backend> {
    embedding: WordAndPositionalEmbedding<B>,
    encoder: DirectionalEncoder<B>,
    vocab_size: usize,
    hidden_size: usize,
}

impl<B: Backend> TextualStream<B> {
    /// Width of the per-token features, equal to the configured hidden size.
    pub fn textual_feature_size(&self) -> usize {
        self.hidden_size
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn padding_idx(&self) -> usize {
        self.embedding.padding_idx()
    }

    pub fn direction(&self) -> Directionality {
        self.encoder.direction()
    }

    pub fn embedding(&self) -> &WordAndPositionalEmbedding<B> {
        &self.embedding
    }

    pub fn encoder(&self) -> &DirectionalEncoder<B> {
        &self.encoder
    }

    /// Checks a host-side batch against the vocabulary and positional table before running it.
    pub fn encode(&self, batch: &TokenBatch) -> Result<Tensor<B, 3>, ShapeError> {
        batch.check_vocabulary(self.vocab_size)?;

        let max = self.embedding.max_sequence_length();
        if batch.seq_len() > max {
            return Err(ShapeError::SequenceTooLong {
                length: batch.seq_len(),
                max,
            });
        }

        trace!(batch_size = batch.batch_size(), seq_len = batch.seq_len(), "encoding batch");

        Ok(self.forward(batch.to_tensor(&self.embedding.device())))
    }

    /// batch x seq token ids -> batch x seq x hidden features
    ///
    /// Positions holding the padding index are never attended to, and with a directional encoder a
    /// position only sees the side of the sequence its direction allows.
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let padding_mask = padding_mask(tokens.clone(), self.embedding.padding_idx());

        let embeddings = self.embedding.forward(tokens);
        let features = self
            .encoder
            .forward(to_sequence_major(embeddings), padding_mask);

        to_batch_major(features)
    }

    /// Redraws every weight from N(0, 0.02), zeroes biases and the padding row.
    pub fn init_weights(self) -> Self {
        let stream = self.visit_params(&mut NormalInit::default());
        debug!(std = NormalInit::default().std, "initialized textual stream weights");

        stream
    }
}

impl<B: Backend> VisitParams<B> for TextualStream<B> {
    fn visit_params<V: ParamVisitor<B>>(mut self, visitor: &mut V) -> Self {
        self.embedding = self.embedding.visit_params(visitor);
        self.encoder = self.encoder.visit_params(visitor);
        self
    }
}

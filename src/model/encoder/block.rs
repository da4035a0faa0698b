use burn::config::Config;
use burn::module::{Ignored, Module};
use burn::nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear, LinearConfig};
use burn::prelude::Backend;
use burn::tensor::activation::{gelu, relu};
use burn::tensor::{Bool, Tensor};

use crate::config::{ActivationKind, NormPlacement};
use crate::init::{ParamVisitor, VisitParams};
use crate::model::encoder::attention::{SelfAttention, SelfAttentionConfig};

#[derive(Module, Debug)]
pub struct FeedForward<B: Backend> {
    dense: Linear<B>,
    activation: Ignored<ActivationKind>,
    dropout: Dropout,
    output_dense: Linear<B>,
}

#[derive(Config)]
pub struct FeedForwardConfig {
    hidden_size: usize,
    intermediate_size: usize,
    activation: ActivationKind,
    dropout: f64,
}

impl FeedForwardConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> FeedForward<B> {
        FeedForward {
            dense: LinearConfig::new(self.hidden_size, self.intermediate_size).init(device),
            activation: Ignored(self.activation),
            dropout: DropoutConfig::new(self.dropout).init(),
            output_dense: LinearConfig::new(self.intermediate_size, self.hidden_size).init(device),
        }
    }
}

impl<B: Backend> FeedForward<B> {
    pub fn forward(&self, hidden: Tensor<B, 3>) -> Tensor<B, 3> {
        let hidden = self.dense.forward(hidden);
        let hidden = match self.activation.0 {
            ActivationKind::Gelu => gelu(hidden),
            ActivationKind::Relu => relu(hidden),
        };
        let hidden = self.dropout.forward(hidden);
        self.output_dense.forward(hidden)
    }
}

impl<B: Backend> VisitParams<B> for FeedForward<B> {
    fn visit_params<V: ParamVisitor<B>>(mut self, visitor: &mut V) -> Self {
        self.dense = visitor.dense(self.dense);
        self.output_dense = visitor.dense(self.output_dense);
        self
    }
}

/// One self-attention + feed-forward block. Width, heads, activation and norm placement are the
/// same for every block of a stream; each block owns its own parameters.
#[derive(Config, Debug)]
pub struct EncoderBlockConfig {
    pub hidden_size: usize,
    pub num_heads: usize,
    pub feedforward_size: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
    #[config(default = "ActivationKind::Gelu")]
    pub activation: ActivationKind,
    #[config(default = "NormPlacement::PreNorm")]
    pub norm_type: NormPlacement,
}

impl EncoderBlockConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        EncoderBlock {
            self_attention: SelfAttentionConfig::new(self.hidden_size, self.num_heads)
                .with_dropout(self.dropout)
                .init(device),
            attention_norm: LayerNormConfig::new(self.hidden_size).init(device),
            attention_dropout: DropoutConfig::new(self.dropout).init(),
            feed_forward: FeedForwardConfig::new(
                self.hidden_size,
                self.feedforward_size,
                self.activation,
                self.dropout,
            )
            .init(device),
            feed_forward_norm: LayerNormConfig::new(self.hidden_size).init(device),
            feed_forward_dropout: DropoutConfig::new(self.dropout).init(),
            norm_type: Ignored(self.norm_type),
        }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    self_attention: SelfAttention<B>,
    attention_norm: LayerNorm<B>,
    attention_dropout: Dropout,
    feed_forward: FeedForward<B>,
    feed_forward_norm: LayerNorm<B>,
    feed_forward_dropout: Dropout,
    norm_type: Ignored<NormPlacement>,
}

impl<B: Backend> EncoderBlock<B> {
    /// `hidden` is seq x batch x hidden, `ignore_mask` is batch x query x key.
    pub fn forward(&self, hidden: Tensor<B, 3>, ignore_mask: Tensor<B, 3, Bool>) -> Tensor<B, 3> {
        match self.norm_type.0 {
            NormPlacement::PreNorm => self.forward_pre_norm(hidden, ignore_mask),
            NormPlacement::PostNorm => self.forward_post_norm(hidden, ignore_mask),
        }
    }

    pub fn norm_type(&self) -> NormPlacement {
        self.norm_type.0
    }

    fn forward_pre_norm(&self, hidden: Tensor<B, 3>, ignore_mask: Tensor<B, 3, Bool>) -> Tensor<B, 3> {
        let residual = hidden.clone();
        let hidden = self.attention_norm.forward(hidden);
        let hidden = self.self_attention.forward(hidden, ignore_mask);
        let hidden = residual + self.attention_dropout.forward(hidden);

        let residual = hidden.clone();
        let hidden = self.feed_forward.forward(self.feed_forward_norm.forward(hidden));
        residual + self.feed_forward_dropout.forward(hidden)
    }

    fn forward_post_norm(&self, hidden: Tensor<B, 3>, ignore_mask: Tensor<B, 3, Bool>) -> Tensor<B, 3> {
        let attended = self.self_attention.forward(hidden.clone(), ignore_mask);
        let hidden = self
            .attention_norm
            .forward(hidden + self.attention_dropout.forward(attended));

        let transformed = self.feed_forward.forward(hidden.clone());
        self.feed_forward_norm
            .forward(hidden + self.feed_forward_dropout.forward(transformed))
    }
}

impl<B: Backend> VisitParams<B> for EncoderBlock<B> {
    fn visit_params<V: ParamVisitor<B>>(mut self, visitor: &mut V) -> Self {
        self.self_attention = self.self_attention.visit_params(visitor);
        self.feed_forward = self.feed_forward.visit_params(visitor);
        self
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::NdArray;
    use burn::prelude::Int;
    use burn::tensor::Distribution;

    use super::*;
    use crate::mask::attention_ignore_mask;

    fn run(config: EncoderBlockConfig) -> Vec<f32> {
        let device = NdArrayDevice::Cpu;
        let block = config.init::<NdArray>(&device);

        let hidden = Tensor::<NdArray, 3>::random([6, 3, 16], Distribution::Default, &device);
        let padding = Tensor::<NdArray, 2, Int>::zeros([3, 6], &device).bool();

        let output = block.forward(hidden, attention_ignore_mask(padding, None));
        assert_eq!(output.dims(), [6, 3, 16]);

        output.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn every_norm_and_activation_combination_keeps_shape() {
        for norm_type in [NormPlacement::PreNorm, NormPlacement::PostNorm] {
            for activation in [ActivationKind::Gelu, ActivationKind::Relu] {
                let config = EncoderBlockConfig::new(16, 4, 32)
                    .with_norm_type(norm_type)
                    .with_activation(activation);

                let output = run(config);
                assert!(output.iter().all(|v| v.is_finite()));
            }
        }
    }

    #[test]
    fn post_norm_output_is_normalized_per_position() {
        let output = run(EncoderBlockConfig::new(16, 4, 32).with_norm_type(NormPlacement::PostNorm));

        for position in output.chunks(16) {
            let mean = position.iter().sum::<f32>() / 16.0;
            assert!(mean.abs() < 1e-4, "mean {mean}");
        }
    }

    #[test]
    fn block_config_records_norm_placement() {
        let device = NdArrayDevice::Cpu;
        let block = EncoderBlockConfig::new(8, 2, 16)
            .with_norm_type(NormPlacement::PostNorm)
            .init::<NdArray>(&device);

        assert_eq!(block.norm_type(), NormPlacement::PostNorm);
    }
}

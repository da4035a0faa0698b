use burn::config::Config;
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::prelude::Backend;
use burn::tensor::activation::softmax;
use burn::tensor::{Bool, Tensor};
use num_traits::float::Float;

use crate::init::{ParamVisitor, VisitParams};

#[derive(Config)]
pub struct SelfAttentionConfig {
    embed_dim: usize,
    num_heads: usize,
    #[config(default = 0.0)]
    dropout: f64,
}

impl SelfAttentionConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SelfAttention<B> {
        let embed_dim = self.embed_dim;

        SelfAttention {
            embed_dim,
            num_heads: self.num_heads,
            head_dim: embed_dim / self.num_heads,
            q_proj: LinearConfig::new(embed_dim, embed_dim).init(device),
            k_proj: LinearConfig::new(embed_dim, embed_dim).init(device),
            v_proj: LinearConfig::new(embed_dim, embed_dim).init(device),
            out_proj: LinearConfig::new(embed_dim, embed_dim).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct SelfAttention<B: Backend> {
    embed_dim: usize,
    num_heads: usize,
    head_dim: usize,
    q_proj: Linear<B>,
    k_proj: Linear<B>,
    v_proj: Linear<B>,
    out_proj: Linear<B>,
    dropout: Dropout,
}

impl<B: Backend> SelfAttention<B> {
    // batch x seq x hidden -> batch x heads x seq x head_dim
    fn split_heads(&self, tensor: Tensor<B, 3>) -> Tensor<B, 4> {
        let [batch, seq, _] = tensor.dims();

        tensor
            .reshape([batch, seq, self.num_heads, self.head_dim])
            .swap_dims(1, 2)
    }

    /// `hidden` is seq x batch x hidden, `ignore_mask` is batch x query x key with `true` marking
    /// keys a query must not attend to.
    pub fn forward(&self, hidden: Tensor<B, 3>, ignore_mask: Tensor<B, 3, Bool>) -> Tensor<B, 3> {
        let hidden = hidden.swap_dims(0, 1);
        let [batch, seq, _] = hidden.dims();

        let scaling = f32::powf(self.head_dim as f32, -0.5);

        let query_states = self.split_heads(self.q_proj.forward(hidden.clone()) * scaling);
        let key_states = self.split_heads(self.k_proj.forward(hidden.clone()));
        let value_states = self.split_heads(self.v_proj.forward(hidden));

        // batch x heads x query x key
        let attention_weights = query_states.matmul(key_states.transpose());

        let ignore_mask = ignore_mask
            .int()
            .unsqueeze_dim::<4>(1)
            .expand([batch, self.num_heads, seq, seq])
            .bool();
        let attention_weights = attention_weights.mask_fill(ignore_mask, f32::neg_infinity());

        let attention_weights = softmax(attention_weights, 3);
        let attention_probs = self.dropout.forward(attention_weights);

        let attention_output = attention_probs
            .matmul(value_states)
            .swap_dims(1, 2)
            .reshape([batch, seq, self.embed_dim]);
        let attention_output = self.out_proj.forward(attention_output);

        attention_output.swap_dims(0, 1)
    }
}

impl<B: Backend> VisitParams<B> for SelfAttention<B> {
    fn visit_params<V: ParamVisitor<B>>(mut self, visitor: &mut V) -> Self {
        self.q_proj = visitor.attention_projection(self.q_proj);
        self.k_proj = visitor.attention_projection(self.k_proj);
        self.v_proj = visitor.attention_projection(self.v_proj);
        self.out_proj = visitor.attention_projection(self.out_proj);
        self
    }
}

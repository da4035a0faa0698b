//! Weight initialization as an explicit walk over the parameter categories a stream owns.
//!
//! Every module implements [`VisitParams`] by handing each of its parameterized children to the
//! matching [`ParamVisitor`] method. The visitor decides what to do with them; [`NormalInit`] draws
//! fresh N(0, 0.02) weights and zero biases, and keeps the padding row of token tables at zero.

use burn::nn::{Embedding, Linear};
use burn::prelude::Backend;

use crate::ops::{normal_like, zero_row};

/// Standard deviation of every initialized weight.
pub const INIT_STD: f64 = 0.02;

pub trait ParamVisitor<B: Backend> {
    /// Feed-forward projection.
    fn dense(&mut self, linear: Linear<B>) -> Linear<B>;

    /// Query, key, value or output projection of self-attention.
    fn attention_projection(&mut self, linear: Linear<B>) -> Linear<B>;

    /// Lookup table, with the row reserved for padding if there is one.
    fn embedding_table(&mut self, embedding: Embedding<B>, padding_idx: Option<usize>) -> Embedding<B>;
}

pub trait VisitParams<B: Backend>: Sized {
    fn visit_params<V: ParamVisitor<B>>(self, visitor: &mut V) -> Self;
}

#[derive(Debug, Clone, Copy)]
pub struct NormalInit {
    pub std: f64,
}

impl Default for NormalInit {
    fn default() -> Self {
        Self { std: INIT_STD }
    }
}

impl<B: Backend> ParamVisitor<B> for NormalInit {
    fn dense(&mut self, linear: Linear<B>) -> Linear<B> {
        init_dense(linear, self.std)
    }

    fn attention_projection(&mut self, linear: Linear<B>) -> Linear<B> {
        init_attention_projection(linear, self.std)
    }

    fn embedding_table(&mut self, embedding: Embedding<B>, padding_idx: Option<usize>) -> Embedding<B> {
        init_embedding(embedding, padding_idx, self.std)
    }
}

// keeps parameter ids
fn init_projection<B: Backend>(mut linear: Linear<B>, std: f64) -> Linear<B> {
    linear.weight = linear.weight.map(|weight| normal_like(&weight, std));
    linear.bias = linear.bias.map(|bias| bias.map(|bias| bias.zeros_like()));
    linear
}

pub fn init_dense<B: Backend>(linear: Linear<B>, std: f64) -> Linear<B> {
    init_projection(linear, std)
}

pub fn init_attention_projection<B: Backend>(linear: Linear<B>, std: f64) -> Linear<B> {
    init_projection(linear, std)
}

pub fn init_embedding<B: Backend>(
    mut embedding: Embedding<B>,
    padding_idx: Option<usize>,
    std: f64,
) -> Embedding<B> {
    embedding.weight = embedding.weight.map(|weight| {
        let weight = normal_like(&weight, std);
        match padding_idx {
            Some(padding_idx) => zero_row(weight, padding_idx),
            None => weight,
        }
    });
    embedding
}
